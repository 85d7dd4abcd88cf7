#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Seed {seed} is outside the accepted range {min}..={max}")]
    InvalidSeed { seed: i64, min: i64, max: i64 },
}
