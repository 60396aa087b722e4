//! This library implements Gaussian Process regression, also known as Kriging models,
//! used as surrogates of expensive functions by the SEGO optimizer.
//!
//! It is a port of [SMT Kriging](https://smt.readthedocs.io/en/latest/_src_docs/surrogate_models/krg.html)
//! style models using the linfa framework conventions:
//! parameters are checked with [`linfa::ParamGuard`] and models are trained with [`linfa::traits::Fit`].
//!
//! A GP is specified by a regression model (aka trend) and a correlation model (aka kernel):
//! * [`RegressionModel`]: `Constant`, `Linear` or `Quadratic`,
//! * [`CorrelationModel`]: `SquaredExponential`, `AbsoluteExponential`, `Matern32` or `Matern52`.
//!
//! Kernel hyperparameters `theta` are either fixed or optimized (see [`ThetaTuning`])
//! by maximizing the reduced likelihood with a multistart COBYLA optimizer.
//! When the correlation matrix cannot be factorized, a nugget is added to its diagonal
//! and increased until factorization succeeds.
//!
//! ```no_run
//! use sego_gp::{CorrelationModel, GaussianProcess, RegressionModel};
//! use linfa::prelude::*;
//! use ndarray::{Array1, Array2, arr2};
//!
//! // one-dimensional test function to approximate
//! fn xsinx(x: &Array2<f64>) -> Array1<f64> {
//!     x.column(0).mapv(|v| (v - 3.5) * f64::sin((v - 3.5) / std::f64::consts::PI))
//! }
//!
//! let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
//! let yt = xsinx(&xt);
//!
//! let gp = GaussianProcess::params(RegressionModel::Constant, CorrelationModel::SquaredExponential)
//!     .fit(&Dataset::new(xt, yt))
//!     .expect("GP fit error");
//!
//! let xtest = arr2(&[[3.], [13.]]);
//! let ytest = gp.predict(&xtest).expect("prediction error");
//! let yvar = gp.predict_var(&xtest).expect("prediction error");
//! println!("y = {ytest}, variance = {yvar}");
//! ```
mod algorithm;
pub mod correlation_models;
mod errors;
pub mod mean_models;
mod parameters;
mod utils;

pub use algorithm::*;
pub use correlation_models::CorrelationModel;
pub use errors::*;
pub use mean_models::RegressionModel;
pub use parameters::*;
pub use utils::{DistanceMatrix, NormalizedMatrix, NormalizedVector, pairwise_differences};
