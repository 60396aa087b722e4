//! This library builds the surrogate models used by the SEGO optimizer.
//!
//! For a given training dataset, a gaussian process is fitted for every enabled pair
//! of regression model (see [`RegressionSpec`]) and correlation model (see [`CorrelationSpec`]).
//! Pairs are fitted in parallel and the one with the lowest k-fold cross-validation
//! error is retained as the [`GpMixture`] surrogate. A pair which cannot be fitted
//! (e.g. too few points for a quadratic trend) is skipped.
//!
//! ```no_run
//! use sego_moe::{CorrelationSpec, GpMixture, RegressionSpec};
//! use linfa::ParamGuard;
//! use ndarray::array;
//!
//! let xt = array![[0.], [5.], [10.], [15.], [18.], [20.], [25.]];
//! let yt = xt.column(0).mapv(|v| (v - 3.5) * f64::sin((v - 3.5) / std::f64::consts::PI));
//! let moe = GpMixture::params()
//!     .regression_spec(RegressionSpec::CONSTANT | RegressionSpec::LINEAR)
//!     .correlation_spec(CorrelationSpec::ALL)
//!     .check()
//!     .expect("valid parameters")
//!     .train(&xt, &yt)
//!     .expect("surrogate trained");
//! println!("{moe}");
//! ```
mod algorithm;
mod errors;
mod parameters;
mod specs;
mod surrogate_builder;
mod surrogates;

pub use algorithm::*;
pub use errors::*;
pub use parameters::*;
pub use specs::*;
pub use surrogate_builder::*;
pub use surrogates::*;

pub use sego_gp::{CorrelationModel, GaussianProcess, RegressionModel, ThetaTuning};
