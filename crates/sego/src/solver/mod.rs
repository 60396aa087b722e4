//! # Solver Module - SEGO Optimizer Implementation
//!
//! This module contains the core implementation of the Surrogate-based Efficient Global
//! Optimization (SEGO) algorithm using the argmin optimization framework.
//!
//! - [`SegoSolver`] - Main optimizer implementing `argmin::Solver` trait
//! - [`SegoState`] - Optimizer state implementing `argmin::State` trait
//! - [`SegoConfig`] / [`ValidSegoConfig`] - Configuration builder and validated config
//!
//! Internally, `solver_impl` holds the iteration logic (surrogates training and point addition),
//! `solver_computations` the infill criterion computation and scalings and
//! `solver_infill_optim` the multistart optimization of the infill criterion.
//!
//! ## Usage with argmin
//!
//! ```no_run
//! use argmin::core::{Executor, State};
//! use ndarray::{Array2, ArrayView2, array};
//! use sego::{GpMixtureParams, ObjFunc, SegoConfig, SegoSolver};
//!
//! fn xsinx(x: &ArrayView2<f64>) -> Array2<f64> {
//!     (x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())
//! }
//!
//! let config = SegoConfig::default()
//!     .xlimits(&array![[0., 25.]])
//!     .check()
//!     .expect("valid config");
//! let solver: SegoSolver<GpMixtureParams> = SegoSolver::new(config);
//! let res = Executor::new(ObjFunc::new(xsinx), solver)
//!     .configure(|state| state.max_iters(10))
//!     .run()
//!     .expect("optimization run");
//! println!("best cost = {}", res.state().get_best_cost());
//! ```

mod sego_config;
mod sego_solver;
mod sego_state;
mod solver_computations;
mod solver_impl;
mod solver_infill_optim;

pub use sego_config::*;
pub use sego_solver::*;
pub use sego_state::*;
