//! This library implements a Surrogate-based Efficient Global Optimization (SEGO)
//! method for the minimization of expensive black-box functions subject to
//! expensive inequality constraints `g_k(x) <= tol_k`.
//!
//! Starting from an initial design of experiments (Latin hypercube sampling),
//! gaussian process surrogates are fitted on the objective and on each constraint.
//! The next point to evaluate is obtained by maximizing an infill criterion
//! (Expected Improvement, WB2 or scaled WB2) on the design space,
//! where constraints are handled either with the probability of feasibility
//! of their surrogates or by enforcing their predicted mean to be feasible.
//! Several points may be added per iteration with q-EI heuristics.
//!
//! The optimizer is implemented as an [argmin](https://www.argmin-rs.org/) solver
//! [`SegoSolver`] and can be used through the [`SegoBuilder`] front door.
//!
//! # Examples
//!
//! ## Constrained optimization
//!
//! ```no_run
//! use ndarray::{Array2, ArrayView2, Zip, array};
//! use sego::SegoBuilder;
//!
//! // Function G24: 1 global optimum y_opt = -5.5080 at x_opt = (2.3295, 3.1785)
//! fn g24(x: &ArrayView2<f64>) -> Array2<f64> {
//!     let mut y = Array2::zeros((x.nrows(), 3));
//!     Zip::from(y.rows_mut()).and(x.rows()).for_each(|mut yi, xi| {
//!         let (x1, x2) = (xi[0], xi[1]);
//!         yi[0] = -x1 - x2;
//!         yi[1] = -2.0 * x1.powi(4) + 8.0 * x1.powi(3) - 8.0 * x1.powi(2) + x2 - 2.0;
//!         yi[2] = -4.0 * x1.powi(4) + 32.0 * x1.powi(3) - 88.0 * x1.powi(2) + 96.0 * x1 + x2
//!             - 36.0;
//!     });
//!     y
//! }
//!
//! let res = SegoBuilder::optimize(g24)
//!     .configure(|config| config.n_cstr(2).max_iters(40).seed(42))
//!     .min_within(&array![[0., 3.], [0., 4.]])
//!     .expect("valid configuration")
//!     .run()
//!     .expect("g24 minimized");
//! println!("G24 min result = {} (feasible: {})", res.y_opt, res.feasible);
//! ```
//!
//! # Logging
//!
//! The optimizer logs its progress with the `log` crate. When no logger is set,
//! an `env_logger` is initialized and the level can be set with the
//! [`SEGO_LOG`] environment variable (default `info`), e.g. `SEGO_LOG=debug`.
//!
//! # Implementation notes
//!
//! * Surrogates are mixtures of gaussian processes selected by cross-validation
//!   (see the `sego-moe` crate) trained on the whole history of evaluations.
//! * The infill criterion is optimized in the unit hypercube with a multistart
//!   COBYLA optimizer, starts being run in parallel.
//! * When the expected improvement vanishes on the whole design space, the
//!   predicted objective mean is minimized instead.
//! * Training failures are retried with the previous surrogate and the optimizer
//!   falls back to an exploration point when no new point can be selected.
//!
pub mod criteria;
mod errors;
pub mod feasibility;
mod sego;
mod solver;
mod types;
mod utils;

pub use crate::errors::*;
pub use crate::sego::*;
pub use crate::solver::*;
pub use crate::types::*;
pub use crate::utils::{SEGO_LOG, find_best_result_index, is_feasible};

pub use sego_moe::{
    CorrelationSpec, GpMixture, GpMixtureParams, RegressionSpec, SurrogateBuilder, ThetaTuning,
};
