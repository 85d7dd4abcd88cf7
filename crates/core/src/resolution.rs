//! Upscale target lookup for video generation.
//!
//! The upscale stage resizes decoded frames to one of a small set of
//! fixed resolutions chosen by the aspect ratio of the base resolution.
//! Portrait sources get the same targets with the axes swapped.

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Named constants
-------------------------------------------------------------------------- */

/// Maximum difference between two aspect ratios that still counts as a match.
pub const ASPECT_TOLERANCE: f64 = 0.01;

/// Maximum dimension (width or height) allowed.
const MAX_DIMENSION: u32 = 7680;

/// A fixed upscale target, expressed for landscape orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct UpscaleTarget {
    ratio: f64,
    long_side: u32,
    short_side: u32,
}

/// Known aspect ratios and their landscape targets, checked in order.
const UPSCALE_TARGETS: &[UpscaleTarget] = &[
    UpscaleTarget {
        ratio: 16.0 / 9.0,
        long_side: 1920,
        short_side: 1080,
    },
    UpscaleTarget {
        ratio: 4.0 / 3.0,
        long_side: 1600,
        short_side: 1200,
    },
    UpscaleTarget {
        ratio: 1.0,
        long_side: 1440,
        short_side: 1440,
    },
];

/// Target used when the aspect ratio matches nothing in [`UPSCALE_TARGETS`].
const FALLBACK_TARGET: UpscaleTarget = UpscaleTarget {
    ratio: 16.0 / 9.0,
    long_side: 1920,
    short_side: 1080,
};

/* --------------------------------------------------------------------------
Lookup
-------------------------------------------------------------------------- */

/// Choose the `(width, height)` an upscale stage should produce for a
/// base resolution of `width` x `height`.
///
/// The ratio is taken as long side over short side, so `848x480` and
/// `480x848` both match 16:9. The result keeps the source orientation:
/// when `height > width` the returned pair is transposed.
pub fn upscale_resolution(width: u32, height: u32) -> (u32, u32) {
    let long = width.max(height);
    let short = width.min(height);

    let target = if short == 0 {
        FALLBACK_TARGET
    } else {
        let ratio = f64::from(long) / f64::from(short);
        UPSCALE_TARGETS
            .iter()
            .copied()
            .find(|t| (ratio - t.ratio).abs() < ASPECT_TOLERANCE)
            .unwrap_or(FALLBACK_TARGET)
    };

    if height > width {
        (target.short_side, target.long_side)
    } else {
        (target.long_side, target.short_side)
    }
}

/// Validate that width and height are positive and within bounds.
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), CoreError> {
    if width == 0 || height == 0 {
        return Err(CoreError::Validation(
            "Width and height must be greater than 0".to_string(),
        ));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CoreError::Validation(format!(
            "Dimensions must not exceed {MAX_DIMENSION}px (got {width}x{height})"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
