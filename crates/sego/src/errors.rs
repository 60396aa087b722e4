use thiserror::Error;

/// A result type for SEGO optimizer
pub type Result<T> = std::result::Result<T, SegoError>;

/// An error for SEGO optimizer
#[derive(Error, Debug)]
pub enum SegoError {
    /// When the optimizer configuration is invalid
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// When a surrogate model cannot be factorized even with a nugget
    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),
    /// When no new point can be added to the training data
    #[error("Acquisition stall: {0}")]
    AcquisitionStall(String),
    /// When likelihood optimization does not give any valid hyperparameters
    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),
    /// When surrogate builder fails
    #[error(transparent)]
    MoeError(#[from] sego_moe::MoeError),
    /// When gaussian process fails
    #[error(transparent)]
    GpError(#[from] sego_gp::GpError),
    /// When argmin framework fails
    #[error(transparent)]
    ArgminError(#[from] argmin::core::Error),
}
