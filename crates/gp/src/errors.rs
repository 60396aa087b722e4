use linfa_linalg::LinalgError;
use thiserror::Error;

/// A result type for GP regression algorithm
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when using [`GaussianProcess`](crate::GaussianProcess) algorithm
#[derive(Error, Debug)]
pub enum GpError {
    /// When the correlation matrix cannot be factorized even with the largest nugget
    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),
    /// When no hyperparameter value gives a finite likelihood
    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),
    /// When likelihood computation fails
    #[error("Likelihood computation error: {0}")]
    LikelihoodComputationError(String),
    /// When a value is invalid
    #[error("Invalid value: {0}")]
    InvalidValueError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] LinalgError),
    /// When error in linfa framework
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}
