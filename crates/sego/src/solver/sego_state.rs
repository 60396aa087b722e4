//! # SegoState - Optimizer State Implementation
//!
//! This module implements the [`SegoState`] struct which tracks all state information
//! during SEGO optimization. It implements the `argmin::State` trait for integration
//! with the argmin optimization framework.
//!
//! The state is decomposed into two sub-states:
//!
//! - [`DoeState`] - Design of Experiments management (sizes, constraints tolerances)
//! - [`SurrogateState`] - training data, last fitted surrogates and hyperparameters

use crate::utils::find_best_result_index;

use argmin::core::{Problem, State, TerminationReason, TerminationStatus};
use ndarray::{Array1, Array2};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use sego_moe::GpMixture;
use std::collections::HashMap;

/// State related to Design of Experiments (DOE) management.
#[derive(Clone, Debug)]
pub struct DoeState {
    /// Initial doe size
    pub doe_size: usize,
    /// Number of added points
    pub added: usize,
    /// Previous number of added points
    pub prev_added: usize,
    /// Constraint tolerance cstr < cstr_tol.
    /// It used to assess the validity of the param point and hence the corresponding cost
    pub cstr_tol: Array1<f64>,
}

impl Default for DoeState {
    fn default() -> Self {
        DoeState {
            doe_size: 0,
            added: 0,
            prev_added: 0,
            cstr_tol: Array1::zeros(0),
        }
    }
}

/// State related to surrogate models management.
#[derive(Clone, Debug)]
pub struct SurrogateState {
    /// Last fitted surrogates of objective and constraints, reused when a refit fails
    pub models: Option<Vec<Option<GpMixture>>>,
    /// Theta hyperparameters of the last optimized surrogates, reused when
    /// the q_optmod configuration does not trigger hyperparameters optimization
    pub theta_inits: Option<Vec<Option<Array1<f64>>>>,
    /// Historic data (params, objective and constraints values)
    pub data: Option<(Array2<f64>, Array2<f64>)>,
    /// Previous index of best result in data
    pub prev_best_index: Option<usize>,
    /// index of best result in data
    pub best_index: Option<usize>,
    /// Number of consecutive iterations where a surrogate could not be fitted
    pub fit_failures: usize,
    /// Infill criterion value
    pub infill_value: f64,
}

impl Default for SurrogateState {
    fn default() -> Self {
        SurrogateState {
            models: None,
            theta_inits: None,
            data: None,
            prev_best_index: None,
            best_index: None,
            fit_failures: 0,
            infill_value: f64::INFINITY,
        }
    }
}

/// Maintains the state from iteration to iteration of the [crate::SegoSolver].
///
/// This struct is passed from one iteration of an algorithm to the next.
#[derive(Clone, Debug)]
pub struct SegoState {
    /// Current parameter vector
    pub param: Option<Array1<f64>>,
    /// Previous parameter vector
    pub prev_param: Option<Array1<f64>>,
    /// Current best parameter vector
    pub best_param: Option<Array1<f64>>,
    /// Previous best parameter vector
    pub prev_best_param: Option<Array1<f64>>,
    /// Best point satisfies the constraints
    pub feasibility: bool,

    /// Current cost function value
    /// The first component is the actual cost value
    /// while the remaining ones are the constraints values
    pub cost: Option<Array1<f64>>,
    /// Previous cost function value
    pub prev_cost: Option<Array1<f64>>,
    /// Current best cost function value
    pub best_cost: Option<Array1<f64>>,
    /// Previous best cost function value
    pub prev_best_cost: Option<Array1<f64>>,
    /// Target cost function value
    pub target_cost: f64,

    /// Current iteration
    pub iter: u64,
    /// Iteration number of last best cost
    pub last_best_iter: u64,
    /// Maximum number of iterations
    pub max_iters: u64,
    /// Evaluation counts
    pub counts: HashMap<String, u64>,
    /// Time required so far
    pub time: Option<web_time::Duration>,
    /// Optimization status
    pub termination_status: TerminationStatus,

    /// DOE-related state
    pub doe: DoeState,
    /// Surrogate models related state
    pub surrogate: SurrogateState,

    /// Random number generator for reproducibility
    pub rng: Option<Xoshiro256Plus>,
}

impl SegoState {
    /// Set parameter vector. This shifts the stored parameter vector to the previous parameter
    /// vector.
    #[must_use]
    pub fn param(mut self, param: Array1<f64>) -> Self {
        std::mem::swap(&mut self.prev_param, &mut self.param);
        self.param = Some(param);
        self
    }

    /// Set target cost.
    ///
    /// When this cost is reached, the algorithm will stop. The default is
    /// `f64::NEG_INFINITY`.
    #[must_use]
    pub fn target_cost(mut self, target_cost: f64) -> Self {
        self.target_cost = target_cost;
        self
    }

    /// Set maximum number of iterations
    ///
    /// ```
    /// # use sego::SegoState;
    /// # use argmin::core::State;
    /// let state = SegoState::new().max_iters(10);
    /// assert_eq!(state.get_max_iters(), 10);
    /// ```
    #[must_use]
    pub fn max_iters(mut self, iters: u64) -> Self {
        self.max_iters = iters;
        self
    }

    /// Set the current cost function value. This shifts the stored cost function value to the
    /// previous cost function value.
    #[must_use]
    pub fn cost(mut self, cost: Array1<f64>) -> Self {
        std::mem::swap(&mut self.prev_cost, &mut self.cost);
        self.cost = Some(cost);
        self
    }

    /// Set best index pointing to best cost found so far.
    /// This shifts the stored best index to the previous best index.
    #[must_use]
    pub fn best_index(mut self, best_index: usize) -> Self {
        self.surrogate.prev_best_index = self.surrogate.best_index;
        self.surrogate.best_index = Some(best_index);
        self
    }

    /// Adds the given nb of added point to the total added points.
    /// This shifts the total added points value to the previous total added points value.
    #[must_use]
    pub fn count_added_points(mut self, nb: usize) -> Self {
        self.doe.prev_added = self.doe.added;
        self.doe.added += nb;
        self
    }

    /// Set the last fitted surrogate models (objective first, then constraints)
    #[must_use]
    pub fn models(mut self, models: Vec<Option<GpMixture>>) -> Self {
        self.surrogate.models = Some(models);
        self
    }

    /// Moves the last fitted models out and replaces it internally with `None`.
    pub fn take_models(&mut self) -> Option<Vec<Option<GpMixture>>> {
        self.surrogate.models.take()
    }

    /// Set the current theta init value used by surrogate models
    #[must_use]
    pub fn theta_inits(mut self, theta_inits: Vec<Option<Array1<f64>>>) -> Self {
        self.surrogate.theta_inits = Some(theta_inits);
        self
    }

    /// Moves the current theta inits out and replaces it internally with `None`.
    pub fn take_theta_inits(&mut self) -> Option<Vec<Option<Array1<f64>>>> {
        self.surrogate.theta_inits.take()
    }

    /// Set the current data points as training points for the surrogate models
    /// These points are gradually selected by the SEGO algorithm regarding an infill criterion.
    /// Data is expressed as a pair (xdata, ydata) where :
    /// * xdata is a (p, nx) matrix,
    /// * ydata is a (p, 1 + nb of cstr) matrix and ydata_i = fobj(xdata_i) for i in [1, p].
    #[must_use]
    pub fn data(mut self, data: (Array2<f64>, Array2<f64>)) -> Self {
        self.surrogate.data = Some(data);
        self
    }

    /// Moves the current data out and replaces it internally with `None`.
    pub fn take_data(&mut self) -> Option<(Array2<f64>, Array2<f64>)> {
        self.surrogate.data.take()
    }

    /// Set the random number generator used to draw random points
    #[must_use]
    pub fn rng(mut self, rng: Xoshiro256Plus) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Moves the current random number generator out and replaces it internally with `None`.
    pub fn take_rng(&mut self) -> Option<Xoshiro256Plus> {
        self.rng.take()
    }

    /// Set the infill criterion value
    #[must_use]
    pub fn infill_value(mut self, value: f64) -> Self {
        self.surrogate.infill_value = value;
        self
    }

    /// Returns the infill criterion value
    pub fn get_infill_value(&self) -> f64 {
        self.surrogate.infill_value
    }

    /// Returns current cost (ie objective) function and constraint values.
    pub fn get_full_cost(&self) -> Option<&Array1<f64>> {
        self.cost.as_ref()
    }

    /// Returns best cost (ie objective) function and constraint values.
    pub fn get_full_best_cost(&self) -> Option<&Array1<f64>> {
        self.best_cost.as_ref()
    }
}

impl State for SegoState {
    /// Type of parameter vector
    type Param = Array1<f64>;
    /// Floating point precision
    type Float = f64;

    /// Create new `SegoState` instance
    fn new() -> Self {
        SegoState {
            param: None,
            prev_param: None,
            best_param: None,
            prev_best_param: None,
            feasibility: false,

            cost: None,
            prev_cost: None,
            best_cost: None,
            prev_best_cost: None,
            target_cost: f64::NEG_INFINITY,

            iter: 0,
            last_best_iter: 0,
            max_iters: u64::MAX,
            counts: HashMap::new(),
            time: Some(web_time::Duration::new(0, 0)),
            termination_status: TerminationStatus::NotTerminated,

            doe: DoeState::default(),
            surrogate: SurrogateState::default(),

            rng: Some(Xoshiro256Plus::from_entropy()),
        }
    }

    /// Checks if the current parameter vector is better than the previous best parameter value.
    /// Best values are taken from the data using the best index computed by the solver.
    fn update(&mut self) {
        if let Some((x_data, y_data)) = self.surrogate.data.as_ref() {
            let best_index = self
                .surrogate
                .best_index
                .unwrap_or_else(|| find_best_result_index(y_data, &self.doe.cstr_tol).0);

            let param = x_data.row(best_index).to_owned();
            std::mem::swap(&mut self.prev_best_param, &mut self.best_param);
            self.best_param = Some(param);

            let cost = y_data.row(best_index).to_owned();
            std::mem::swap(&mut self.prev_best_cost, &mut self.best_cost);
            self.best_cost = Some(cost);

            // best point in doe => last_best_iter remains 0
            if let Some(prev_best_index) = self.surrogate.prev_best_index
                && best_index != prev_best_index
            {
                self.last_best_iter = self.iter + 1;
            }
        }
    }

    fn get_param(&self) -> Option<&Array1<f64>> {
        self.param.as_ref()
    }

    fn get_best_param(&self) -> Option<&Array1<f64>> {
        self.best_param.as_ref()
    }

    fn terminate_with(mut self, reason: TerminationReason) -> Self {
        self.termination_status = TerminationStatus::Terminated(reason);
        self
    }

    fn time(&mut self, time: Option<web_time::Duration>) -> &mut Self {
        self.time = time;
        self
    }

    fn get_cost(&self) -> Self::Float {
        match self.cost.as_ref() {
            Some(c) => *(c.get(0).unwrap_or(&f64::INFINITY)),
            None => f64::INFINITY,
        }
    }

    fn get_best_cost(&self) -> Self::Float {
        match self.best_cost.as_ref() {
            Some(c) => *(c.get(0).unwrap_or(&f64::INFINITY)),
            None => f64::INFINITY,
        }
    }

    fn get_target_cost(&self) -> Self::Float {
        self.target_cost
    }

    fn get_iter(&self) -> u64 {
        self.iter
    }

    fn get_last_best_iter(&self) -> u64 {
        self.last_best_iter
    }

    fn get_max_iters(&self) -> u64 {
        self.max_iters
    }

    fn get_termination_status(&self) -> &TerminationStatus {
        &self.termination_status
    }

    fn get_termination_reason(&self) -> Option<&TerminationReason> {
        match &self.termination_status {
            TerminationStatus::Terminated(reason) => Some(reason),
            TerminationStatus::NotTerminated => None,
        }
    }

    fn get_time(&self) -> Option<web_time::Duration> {
        self.time
    }

    fn increment_iter(&mut self) {
        self.iter += 1;
    }

    /// Set all function evaluation counts to the evaluation counts of another `Problem`.
    fn func_counts<O>(&mut self, problem: &Problem<O>) {
        for (k, &v) in problem.counts.iter() {
            let count = self.counts.entry(k.to_string()).or_insert(0);
            *count = v
        }
    }

    fn get_func_counts(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    /// Returns whether the current parameter vector is also the best parameter vector found so
    /// far.
    fn is_best(&self) -> bool {
        // last_best_iter is 1-based while iter is 0-based
        self.last_best_iter == self.iter + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_update_best() {
        let mut state = SegoState::new().data((
            array![[1.0], [2.0], [3.0]],
            array![[10.0], [5.0], [0.5]],
        ));
        state.iter = 2;
        state.surrogate.prev_best_index = Some(0);
        state.surrogate.best_index = Some(2);
        state.param = Some(array![3.0]);
        state.cost = Some(array![0.5]);
        state.update();
        assert_eq!(state.best_param, Some(array![3.0]));
        assert_eq!(state.get_best_cost(), 0.5);
        assert!(state.is_best());
    }

    #[test]
    fn test_update_best_without_index() {
        let mut state = SegoState::new().data((
            array![[1.0], [2.0], [3.0]],
            array![[10.0, 1.], [5.0, -1.], [0.5, 2.]],
        ));
        state.doe.cstr_tol = array![0.];
        state.update();
        assert_eq!(state.best_param, Some(array![2.0]));
        assert_eq!(state.get_last_best_iter(), 0);
    }

    #[test]
    fn test_param_and_cost_shift() {
        let state = SegoState::new()
            .param(array![1.0])
            .cost(array![4.0])
            .param(array![2.0])
            .cost(array![3.0]);
        assert_eq!(state.prev_param, Some(array![1.0]));
        assert_eq!(state.get_cost(), 3.0);
        assert_eq!(state.prev_cost, Some(array![4.0]));
        let state = state.count_added_points(3).count_added_points(2);
        assert_eq!(state.doe.added, 5);
        assert_eq!(state.doe.prev_added, 3);
    }
}
