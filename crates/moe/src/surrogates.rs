use crate::errors::Result;
use ndarray::{Array1, ArrayView2};
use std::fmt::Display;

/// A trait for surrogate models predicting a scalar output with its uncertainty
pub trait GpSurrogate: Display + Send + Sync {
    /// Input and output dimensions of the surrogate
    fn dims(&self) -> (usize, usize);
    /// Predict output values at n points given as a (n, nx) matrix.
    fn predict(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>>;
    /// Predict variance values at n points given as a (n, nx) matrix.
    fn predict_var(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>>;
}
