//! Implementation of the argmin `Solver` trait for the SEGO optimizer.
//!
//! `Solver::init` evaluates the initial design of experiments, then each
//! `Solver::next_iter` fits the surrogates, maximizes the infill criterion,
//! evaluates the selected point(s) and updates the training data.
use crate::errors::{Result, SegoError};
use crate::solver::{SegoState, ValidSegoConfig};
use crate::utils::{SEGO_LOG, find_best_result_index, update_data};

use argmin::core::{
    CostFunction, KV, Problem, Solver, State, TerminationReason, TerminationStatus,
};
use env_logger::{Builder, Env};
use log::info;
use ndarray::Array2;
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use sego_doe::{Lhs, LhsKind, SamplingMethod};
use sego_moe::SurrogateBuilder;

/// Implementation of the SEGO algorithm as an argmin `Solver`
/// for the minimization of expensive constrained functions.
#[derive(Clone)]
pub struct SegoSolver<SB: SurrogateBuilder> {
    /// Validated configuration
    pub(crate) config: ValidSegoConfig,
    /// Design space as a (nx, 2) matrix of bounds
    pub(crate) xlimits: Array2<f64>,
    /// Builder of the surrogates of objective and constraints
    pub(crate) surrogate_builder: SB,
}

impl<SB: SurrogateBuilder> SegoSolver<SB> {
    /// Constructor of the optimizer from a validated configuration.
    ///
    /// Logging is initialized with the `SEGO_LOG` environment variable (default to `info`).
    pub fn new(config: ValidSegoConfig) -> Self {
        let env = Env::new().filter_or(SEGO_LOG, "info");
        let mut builder = Builder::from_env(env);
        let builder = builder.target(env_logger::Target::Stdout);
        builder.try_init().ok();
        let xlimits = config.xlimits.to_owned();
        let mut surrogate_builder = SB::new_with_xlimits(&xlimits);
        surrogate_builder.set_regression_spec(config.gp.regression_spec);
        surrogate_builder.set_correlation_spec(config.gp.correlation_spec);
        surrogate_builder.set_theta_tuning(config.gp.theta_tuning.clone());
        surrogate_builder.set_optim_params(config.gp.n_start, config.gp.max_eval);
        SegoSolver {
            config,
            xlimits,
            surrogate_builder,
        }
    }

    /// The configuration of the solver
    pub fn config(&self) -> &ValidSegoConfig {
        &self.config
    }

    /// Evaluates the objective function on `x` points and checks the output shape
    pub(crate) fn eval_obj<O: CostFunction<Param = Array2<f64>, Output = Array2<f64>>>(
        &self,
        problem: &mut Problem<O>,
        x: &Array2<f64>,
    ) -> Result<Array2<f64>> {
        let y = problem.cost(x)?;
        if y.nrows() != x.nrows() || y.ncols() != 1 + self.config.n_cstr {
            return Err(SegoError::ConfigurationError(format!(
                "objective function should return a ({}, {}) matrix ([obj, {} cstr] rows), got ({}, {})",
                x.nrows(),
                1 + self.config.n_cstr,
                self.config.n_cstr,
                y.nrows(),
                y.ncols()
            )));
        }
        Ok(y)
    }

    /// Initial design of experiments: either the given doe or an optimized LHS
    fn initial_doe(&self, rng: &mut Xoshiro256Plus) -> Array2<f64> {
        match self.config.doe.as_ref() {
            Some(doe) => doe.to_owned(),
            None => {
                let sub_rng = Xoshiro256Plus::seed_from_u64(rng.r#gen());
                Lhs::new(&self.xlimits)
                    .kind(LhsKind::Optimized)
                    .with_rng(sub_rng)
                    .sample(self.config.n_doe())
            }
        }
    }
}

impl<O, SB> Solver<O, SegoState> for SegoSolver<SB>
where
    O: CostFunction<Param = Array2<f64>, Output = Array2<f64>>,
    SB: SurrogateBuilder,
{
    const NAME: &'static str = "Sego";

    fn init(
        &mut self,
        problem: &mut Problem<O>,
        state: SegoState,
    ) -> std::result::Result<(SegoState, Option<KV>), argmin::core::Error> {
        let mut rng = match self.config.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };
        let doe = self.initial_doe(&mut rng);
        info!("Evaluate initial DOE of {} points", doe.nrows());
        let y_doe = self.eval_obj(problem, &doe)?;

        let n_out = 1 + self.config.n_cstr;
        let mut x_data = Array2::zeros((0, self.xlimits.nrows()));
        let mut y_data = Array2::zeros((0, n_out));
        let added = update_data(&mut x_data, &mut y_data, &doe, &y_doe);
        if added == 0 {
            return Err(SegoError::ConfigurationError(
                "every evaluation of the initial DOE failed (NaN)".to_string(),
            )
            .into());
        }

        let cstr_tol = self.config.cstr_tol();
        let (best_index, feasible) = find_best_result_index(&y_data, &cstr_tol);
        info!(
            "Initial best point {} with {}{}",
            x_data.row(best_index),
            y_data.row(best_index),
            if feasible { "" } else { " (infeasible)" }
        );
        let mut initial_state = state
            .param(x_data.row(best_index).to_owned())
            .cost(y_data.row(best_index).to_owned())
            .models(vec![None; n_out])
            .theta_inits(vec![None; n_out])
            .rng(rng)
            .count_added_points(added)
            .best_index(best_index)
            .data((x_data, y_data));
        initial_state.doe.doe_size = added;
        initial_state.doe.cstr_tol = cstr_tol;
        initial_state.feasibility = feasible;
        Ok((initial_state, None))
    }

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: SegoState,
    ) -> std::result::Result<(SegoState, Option<KV>), argmin::core::Error> {
        info!(
            "********* Start iteration {}/{}",
            state.get_iter() + 1,
            state.get_max_iters()
        );
        let new_state = self.sego_step(problem, state)?;
        Ok((new_state, None))
    }

    fn terminate(&mut self, state: &SegoState) -> TerminationStatus {
        let best_obj = match (state.surrogate.data.as_ref(), state.surrogate.best_index) {
            (Some((_, y_data)), Some(index)) => y_data[[index, 0]],
            _ => state.get_best_cost(),
        };
        if let Some(target) = self.config.target
            && state.feasibility
            && best_obj <= target.value + target.tolerance
        {
            info!(
                "Expected optimum {} reached (tolerance {})",
                target.value, target.tolerance
            );
            return TerminationStatus::Terminated(TerminationReason::TargetCostReached);
        }
        if let Some(n_iters) = self.config.no_improvement_iters
            && state.get_iter() >= state.get_last_best_iter() + n_iters
        {
            info!("No improvement of best point within {n_iters} iterations");
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }
        TerminationStatus::NotTerminated
    }
}
