use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    #[error("tick period must be greater than zero")]
    ZeroTickPeriod,
    #[error("{name} duration must be greater than zero")]
    ZeroDuration { name: &'static str },
    #[error("max increment must be a positive finite number of MB, got {0}")]
    InvalidMaxIncrement(f64),
    #[error("initial total must be a non-negative finite number of MB, got {0}")]
    InvalidInitialTotal(f64),
    #[error("failed to read generator config '{path}': {message}")]
    ConfigFile { path: String, message: String },
}
