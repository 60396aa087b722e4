use thiserror::Error;

/// A result type for mixture of GP algorithm
pub type Result<T> = std::result::Result<T, MoeError>;

/// An error when building the surrogate
#[derive(Error, Debug)]
pub enum MoeError {
    /// When a GP expert fit fails
    #[error(transparent)]
    GpError(#[from] sego_gp::GpError),
    /// When a value is invalid
    #[error("Invalid value: {0}")]
    InvalidValueError(String),
    /// When no trend/kernel pair could be fitted
    #[error("No expert fitted: {0}")]
    NoExpertFitted(String),
    /// When error in linfa framework
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}
