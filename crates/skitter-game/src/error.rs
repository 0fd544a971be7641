use thiserror::Error;

/// Errors found while validating movement tuning
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be non-negative, got {value}")]
    NegativeSpeed { name: &'static str, value: f32 },

    #[error("{name} must be negative (downward), got {value}")]
    NotDownward { name: &'static str, value: f32 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("glide fall speed {glide} must be slower than terminal fall speed {terminal}")]
    GlideFasterThanFall { glide: f32, terminal: f32 },

    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
}
