//! Sampler seed policy.
//!
//! A seed supplied by the caller is passed through unchanged as long as
//! it lies inside [`MIN_SEED`]..=[`MAX_SEED`]. When no seed is supplied a
//! fresh one is drawn from the same range.

use rand::Rng;

use crate::error::CoreError;

/// Smallest seed accepted by the generation graphs.
pub const MIN_SEED: i64 = 1;

/// Largest seed accepted by the generation graphs.
pub const MAX_SEED: i64 = 999_999_999_999_999;

/// Check that `seed` lies inside the accepted range.
pub fn validate_seed(seed: i64) -> Result<i64, CoreError> {
    if (MIN_SEED..=MAX_SEED).contains(&seed) {
        Ok(seed)
    } else {
        Err(CoreError::InvalidSeed {
            seed,
            min: MIN_SEED,
            max: MAX_SEED,
        })
    }
}

/// Draw a uniformly random seed from the accepted range.
pub fn random_seed() -> i64 {
    rand::rng().random_range(MIN_SEED..=MAX_SEED)
}

/// Resolve the seed a graph should carry.
///
/// `Some(seed)` is validated and returned unchanged; `None` draws a new
/// random seed.
pub fn resolve_seed(seed: Option<i64>) -> Result<i64, CoreError> {
    match seed {
        Some(seed) => validate_seed(seed),
        None => Ok(random_seed()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn seeds_inside_range_pass_through() {
        for seed in [MIN_SEED, 42, 1_000_000, 123_456_789_012, MAX_SEED] {
            assert_eq!(resolve_seed(Some(seed)).unwrap(), seed);
        }
    }

    #[test]
    fn zero_is_rejected() {
        assert_matches!(
            resolve_seed(Some(0)),
            Err(CoreError::InvalidSeed { seed: 0, .. })
        );
    }

    #[test]
    fn negative_seed_is_rejected() {
        assert_matches!(validate_seed(-7), Err(CoreError::InvalidSeed { seed: -7, .. }));
    }

    #[test]
    fn seed_above_max_is_rejected() {
        assert_matches!(
            validate_seed(MAX_SEED + 1),
            Err(CoreError::InvalidSeed { .. })
        );
        assert_matches!(validate_seed(i64::MAX), Err(CoreError::InvalidSeed { .. }));
    }

    #[test]
    fn random_seeds_stay_in_range() {
        for _ in 0..1_000 {
            let seed = resolve_seed(None).unwrap();
            assert!((MIN_SEED..=MAX_SEED).contains(&seed), "seed {seed} out of range");
        }
    }
}
