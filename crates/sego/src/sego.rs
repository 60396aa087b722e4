//! Sego optimizer builder and front door.
//!
//! ```no_run
//! use ndarray::{Array2, ArrayView2, array};
//! use sego::{InfillStrategy, SegoBuilder};
//!
//! // Six-Hump Camel back function
//! fn six_humps(x: &ArrayView2<f64>) -> Array2<f64> {
//!     let mut y = Array2::zeros((x.nrows(), 1));
//!     for (i, xi) in x.rows().into_iter().enumerate() {
//!         let (x1, x2) = (xi[0], xi[1]);
//!         y[[i, 0]] = (4. - 2.1 * x1 * x1 + x1.powi(4) / 3.) * x1 * x1
//!             + x1 * x2
//!             + (-4. + 4. * x2 * x2) * x2 * x2;
//!     }
//!     y
//! }
//!
//! let res = SegoBuilder::optimize(six_humps)
//!     .configure(|config| config.infill_strategy(InfillStrategy::WB2).max_iters(30).seed(42))
//!     .min_within(&array![[-3., 3.], [-2., 2.]])
//!     .expect("valid configuration")
//!     .run()
//!     .expect("optimization run");
//! println!("Six humps min f={} at {}", res.y_opt, res.x_opt);
//! ```
use crate::errors::{Result, SegoError};
use crate::solver::{SegoConfig, SegoSolver, SegoState, ValidSegoConfig};
use crate::types::*;
use crate::utils::find_best_result_index;

use argmin::core::{Executor, State};
use log::info;
use ndarray::{ArrayBase, Data, Ix2};
use sego_moe::{GpMixtureParams, SurrogateBuilder};
use std::marker::PhantomData;

/// Sego optimizer builder allowing to specify the function to be minimized
/// and the configuration of the optimizer
pub struct SegoBuilder<O: GroupFunc> {
    fobj: O,
    config: SegoConfig,
}

impl<O: GroupFunc> SegoBuilder<O> {
    /// Function to be minimized domain should be basically R^nx -> R^ny
    /// where nx is the dimension of input x and ny the output dimension
    /// equal to 1 (obj) + n (cstrs).
    /// But function has to be able to evaluate several points in one go
    /// hence take an (p, nx) matrix and return an (p, ny) matrix
    pub fn optimize(fobj: O) -> Self {
        SegoBuilder {
            fobj,
            config: SegoConfig::default(),
        }
    }

    /// Configure the optimizer with the given `init` closure
    pub fn configure<F: FnOnce(SegoConfig) -> SegoConfig>(mut self, init: F) -> Self {
        self.config = init(self.config);
        self
    }

    /// Build a Sego optimizer minimizing the function within
    /// the continuous `xlimits` specified as [[lower, upper], nx]
    /// using the default gaussian processes surrogate builder.
    ///
    /// Fails with a configuration error when bounds or configuration are invalid.
    pub fn min_within(
        self,
        xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<Sego<O, GpMixtureParams>> {
        self.min_within_with_builder(xlimits)
    }

    /// Build a Sego optimizer within `xlimits` using a custom surrogate builder type
    pub fn min_within_with_builder<SB: SurrogateBuilder>(
        self,
        xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<Sego<O, SB>> {
        let config = self.config.xlimits(&xlimits.to_owned()).check()?;
        Ok(Sego {
            fobj: ObjFunc::new(self.fobj),
            config,
            phantom: PhantomData,
        })
    }
}

/// Sego optimizer structure used to parameterize the underlying `argmin::Solver`
/// and trigger the optimization using `argmin::Executor`.
#[derive(Clone)]
pub struct Sego<O: GroupFunc, SB: SurrogateBuilder> {
    fobj: ObjFunc<O>,
    config: ValidSegoConfig,
    phantom: PhantomData<SB>,
}

impl<O: GroupFunc, SB: SurrogateBuilder> Sego<O, SB> {
    /// The validated configuration of the optimizer
    pub fn config(&self) -> &ValidSegoConfig {
        &self.config
    }

    /// Runs the optimization of the function with the configured budget
    ///
    /// The optimization result is the best point found over the whole history:
    /// the feasible point with the minimal objective, otherwise the point with the
    /// minimal constraints violation flagged as infeasible.
    pub fn run(&self) -> Result<OptimResult> {
        self.run_with(self.config.clone())
    }

    /// Runs the optimization with `n_iter` iterations, overriding the number
    /// of constraints when `n_cstr` is given
    pub fn minimize(&self, n_iter: usize, n_cstr: Option<usize>) -> Result<OptimResult> {
        let mut config = SegoConfig::from(self.config.clone()).max_iters(n_iter);
        if let Some(n_cstr) = n_cstr {
            config = config.n_cstr(n_cstr);
        }
        self.run_with(config.check()?)
    }

    fn run_with(&self, config: ValidSegoConfig) -> Result<OptimResult> {
        let max_iters = config.max_iters as u64;
        let solver: SegoSolver<SB> = SegoSolver::new(config);
        let result = Executor::new(self.fobj.clone(), solver)
            .configure(|state| state.max_iters(max_iters))
            .run()
            .map_err(|err| match err.downcast::<SegoError>() {
                Ok(err) => err,
                Err(err) => SegoError::ArgminError(err),
            })?;
        let state: SegoState = result.state().clone();
        info!("{}", result);

        let (x_data, y_data) = state.surrogate.data.clone().ok_or_else(|| {
            SegoError::ConfigurationError("no data available after optimization".to_string())
        })?;
        let (best_index, feasible) = find_best_result_index(&y_data, &state.doe.cstr_tol);
        let res = OptimResult {
            x_opt: x_data.row(best_index).to_owned(),
            y_opt: y_data.row(best_index).to_owned(),
            x_doe: x_data,
            y_doe: y_data,
            n_doe: state.doe.doe_size,
            feasible,
            state,
        };
        info!(
            "Optim Result: min f(x)={} at x={}{} after {} iteration(s)",
            res.y_opt,
            res.x_opt,
            if res.feasible { "" } else { " (infeasible)" },
            res.state.get_iter()
        );
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, ArrayView2, array};

    fn quadratic(x: &ArrayView2<f64>) -> Array2<f64> {
        x.map_axis(ndarray::Axis(1), |xi| xi.mapv(|v| (v - 0.3) * (v - 0.3)).sum())
            .insert_axis(ndarray::Axis(1))
    }

    #[test]
    fn test_min_within_rejects_bad_bounds() {
        let res = SegoBuilder::optimize(quadratic).min_within(&array![[1., 0.]]);
        assert!(matches!(res, Err(SegoError::ConfigurationError(_))));
        let res = SegoBuilder::optimize(quadratic).min_within(&Array2::<f64>::zeros((0, 2)));
        assert!(matches!(res, Err(SegoError::ConfigurationError(_))));
    }

    #[test]
    fn test_minimize_overrides() {
        let sego = SegoBuilder::optimize(quadratic)
            .configure(|config| config.n_doe(5).seed(1))
            .min_within(&array![[-1., 1.]])
            .expect("valid configuration");
        let res = sego.minimize(0, None).expect("doe evaluated");
        assert_eq!(res.state.get_iter(), 0);
        assert_eq!(res.x_doe.nrows(), 5);
        // objective returns a single column
        let res = sego.minimize(1, Some(1));
        assert!(matches!(res, Err(SegoError::ConfigurationError(_))));
    }

    #[test]
    fn test_wrong_cstr_tol_with_override() {
        let sego = SegoBuilder::optimize(quadratic)
            .configure(|config| config.n_cstr(1).cstr_tol(array![0.1]))
            .min_within(&array![[-1., 1.]])
            .expect("valid configuration");
        assert!(matches!(
            sego.minimize(1, Some(2)),
            Err(SegoError::ConfigurationError(_))
        ));
    }
}
