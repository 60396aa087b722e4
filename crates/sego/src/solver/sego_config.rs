//! SEGO optimizer configuration.
use crate::errors::{Result, SegoError};
use crate::types::*;
use linfa::ParamGuard;
use ndarray::{Array1, Array2};
use sego_gp::{GpParams, MAX_EVAL, N_START, ThetaTuning};
use sego_moe::{CorrelationSpec, RegressionSpec};
use serde::{Deserialize, Serialize};

/// Default number of iterations
pub const DEFAULT_MAX_ITERS: usize = 20;
/// Default number of starts of the infill criterion multistart optimization
pub const DEFAULT_N_START: usize = 20;
/// Default max number of evaluations of the infill criterion per start
pub const DEFAULT_N_OPTIM_EVAL: usize = 200;
/// Default tolerance on constraints: cstr <= cstr_tol
pub const DEFAULT_CSTR_TOL: f64 = 0.;

/// A structure to handle Qei strategy config
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QEiConfig {
    /// Number of points selected at each iteration (a.k.a q_points)
    pub batch: usize,
    /// Virtual point computation strategy
    pub strategy: QEiStrategy,
    /// Surrogate hyperparameters are optimized every `optmod` virtual points
    pub optmod: usize,
}

impl Default for QEiConfig {
    fn default() -> Self {
        QEiConfig {
            batch: 1,
            strategy: QEiStrategy::default(),
            optmod: 1,
        }
    }
}

/// Gaussian process surrogates configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpConfig {
    /// Regression models tested when building surrogates
    pub regression_spec: RegressionSpec,
    /// Correlation models tested when building surrogates
    pub correlation_spec: CorrelationSpec,
    /// Theta hyperparameters tuning used when hyperparameters are optimized
    pub theta_tuning: ThetaTuning,
    /// Number of likelihood optimization restarts
    pub n_start: usize,
    /// Max number of likelihood evaluations per restart
    pub max_eval: usize,
}

impl Default for GpConfig {
    fn default() -> Self {
        GpConfig {
            regression_spec: RegressionSpec::ALL,
            correlation_spec: CorrelationSpec::ALL,
            theta_tuning: ThetaTuning::default(),
            n_start: N_START,
            max_eval: MAX_EVAL,
        }
    }
}

impl GpConfig {
    /// Sets the allowed regression models used in gaussian processes.
    pub fn regression_spec(mut self, regression_spec: RegressionSpec) -> Self {
        self.regression_spec = regression_spec;
        self
    }

    /// Sets the allowed correlation models used in gaussian processes.
    pub fn correlation_spec(mut self, correlation_spec: CorrelationSpec) -> Self {
        self.correlation_spec = correlation_spec;
        self
    }

    /// Sets the theta hyperparameters tuning
    pub fn theta_tuning(mut self, theta_tuning: ThetaTuning) -> Self {
        self.theta_tuning = theta_tuning;
        self
    }

    /// Sets the number of likelihood optimization restarts
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.n_start = n_start;
        self
    }

    /// Sets the max number of likelihood evaluations per restart
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }
}

/// Valid Sego configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidSegoConfig {
    /// Design space as a (nx, 2) matrix of [lower, upper] bounds
    pub(crate) xlimits: Array2<f64>,
    /// Max number of iterations
    pub(crate) max_iters: usize,
    /// Number of starts for multistart approach used for infill criterion optimization
    pub(crate) n_start: usize,
    /// Max number of infill criterion evaluations per start
    pub(crate) n_optim_eval: usize,
    /// Number of constraints returned by the objective function after the objective value
    pub(crate) n_cstr: usize,
    /// Optional tolerances for constraints (default to 0)
    pub(crate) cstr_tol: Option<Array1<f64>>,
    /// Number of points of the initial LHS doe, default to 10 * nx
    pub(crate) n_doe: Option<usize>,
    /// Initial doe, takes precedence over `n_doe`
    pub(crate) doe: Option<Array2<f64>>,
    /// Multipoint strategy used to get several points to be evaluated at each iteration
    pub(crate) qei_config: QEiConfig,
    /// Criterion to select next point to evaluate
    pub(crate) infill_strategy: InfillStrategy,
    /// Handling of constraints within the infill criterion optimization
    pub(crate) constraint_strategy: ConstraintStrategy,
    /// Gaussian process surrogates configuration
    pub(crate) gp: GpConfig,
    /// Optional expected value used to stop the optimization early
    pub(crate) target: Option<ApproxValue>,
    /// Optional number of iterations without improvement of the best value to stop the optimization
    pub(crate) no_improvement_iters: Option<u64>,
    /// Seed of the random number generator
    pub(crate) seed: Option<u64>,
}

impl Default for ValidSegoConfig {
    fn default() -> Self {
        ValidSegoConfig {
            xlimits: Array2::zeros((0, 2)),
            max_iters: DEFAULT_MAX_ITERS,
            n_start: DEFAULT_N_START,
            n_optim_eval: DEFAULT_N_OPTIM_EVAL,
            n_cstr: 0,
            cstr_tol: None,
            n_doe: None,
            doe: None,
            qei_config: QEiConfig::default(),
            infill_strategy: InfillStrategy::default(),
            constraint_strategy: ConstraintStrategy::default(),
            gp: GpConfig::default(),
            target: None,
            no_improvement_iters: None,
            seed: None,
        }
    }
}

impl ValidSegoConfig {
    /// Design space bounds
    pub fn xlimits(&self) -> &Array2<f64> {
        &self.xlimits
    }

    /// Max number of iterations
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Number of constraints
    pub fn n_cstr(&self) -> usize {
        self.n_cstr
    }

    /// Constraints tolerances, one value per constraint
    pub fn cstr_tol(&self) -> Array1<f64> {
        self.cstr_tol
            .clone()
            .unwrap_or_else(|| Array1::from_elem(self.n_cstr, DEFAULT_CSTR_TOL))
    }

    /// Size of the initial design of experiments
    pub fn n_doe(&self) -> usize {
        match (&self.doe, self.n_doe) {
            (Some(doe), _) => doe.nrows(),
            (None, Some(n)) => n,
            (None, None) => {
                let nx = self.xlimits.nrows();
                (10 * nx).max(nx + 1)
            }
        }
    }

    /// Infill criterion
    pub fn infill_strategy(&self) -> InfillStrategy {
        self.infill_strategy
    }

    /// Seed of the random generator if any
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Sego optimizer configuration builder
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegoConfig(pub(crate) ValidSegoConfig);

impl SegoConfig {
    /// Sets the design space given as a (nx, 2) matrix of [lower, upper] bounds
    pub fn xlimits(mut self, xlimits: &Array2<f64>) -> Self {
        self.0.xlimits = xlimits.to_owned();
        self
    }

    /// Sets max number of iterations to optimize the objective function
    pub fn max_iters(mut self, max_iters: usize) -> Self {
        self.0.max_iters = max_iters;
        self
    }

    /// Sets the number of runs of infill strategy optimizations (best result taken)
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.0.n_start = n_start;
        self
    }

    /// Sets max number of evaluations of the infill criterion per optimization run
    pub fn n_optim_eval(mut self, n_optim_eval: usize) -> Self {
        self.0.n_optim_eval = n_optim_eval;
        self
    }

    /// Sets the number of constraint functions
    pub fn n_cstr(mut self, n_cstr: usize) -> Self {
        self.0.n_cstr = n_cstr;
        self
    }

    /// Sets the tolerance on constraints violation (`cstr < tol`), one value per constraint
    pub fn cstr_tol(mut self, tol: Array1<f64>) -> Self {
        self.0.cstr_tol = Some(tol);
        self
    }

    /// Sets the number of samples of the initial LHS sampling,
    /// used when no initial doe is given
    pub fn n_doe(mut self, n_doe: usize) -> Self {
        self.0.n_doe = Some(n_doe);
        self
    }

    /// Sets an initial DOE `doe` containing `ns` samples.
    /// Specified doe takes precedence over `n_doe`.
    /// The x points are evaluated by the optimizer before the first iteration.
    pub fn doe(mut self, doe: &Array2<f64>) -> Self {
        self.0.doe = Some(doe.to_owned());
        self
    }

    /// Sets the number of points returned by the optimizer per iteration (q-EI strategy)
    pub fn q_points(mut self, q_points: usize) -> Self {
        self.0.qei_config.batch = q_points;
        self
    }

    /// Sets the strategy to compute virtual points when several points are returned per iteration
    pub fn qei_strategy(mut self, strategy: QEiStrategy) -> Self {
        self.0.qei_config.strategy = strategy;
        self
    }

    /// Sets the period of surrogates hyperparameters optimization in virtual points counts
    pub fn q_optmod(mut self, optmod: usize) -> Self {
        self.0.qei_config.optmod = optmod;
        self
    }

    /// Sets the infill strategy
    pub fn infill_strategy(mut self, infill: InfillStrategy) -> Self {
        self.0.infill_strategy = infill;
        self
    }

    /// Sets the handling of constraints surrogates during infill optimization
    pub fn constraint_strategy(mut self, strategy: ConstraintStrategy) -> Self {
        self.0.constraint_strategy = strategy;
        self
    }

    /// Sets the allowed regression models used in gaussian processes.
    pub fn regression_spec(mut self, regression_spec: RegressionSpec) -> Self {
        self.0.gp.regression_spec = regression_spec;
        self
    }

    /// Sets the allowed correlation models used in gaussian processes.
    pub fn correlation_spec(mut self, correlation_spec: CorrelationSpec) -> Self {
        self.0.gp.correlation_spec = correlation_spec;
        self
    }

    /// Configure gaussian process surrogates
    pub fn configure_gp<F: FnOnce(GpConfig) -> GpConfig>(mut self, init: F) -> Self {
        self.0.gp = init(self.0.gp);
        self
    }

    /// Sets a known target minimum to be used as a stopping criterion.
    pub fn target(mut self, value: f64, tolerance: f64) -> Self {
        self.0.target = Some(ApproxValue { value, tolerance });
        self
    }

    /// Stops the optimization after `n_iters` iterations without improvement of the best point
    pub fn no_improvement_iters(mut self, n_iters: u64) -> Self {
        self.0.no_improvement_iters = Some(n_iters);
        self
    }

    /// Allow to specify a seed for random number generator to allow
    /// reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = Some(seed);
        self
    }

    /// Check configuration and return a validated configuration.
    pub fn check(self) -> Result<ValidSegoConfig> {
        let config = self.0;
        let xlimits = &config.xlimits;
        if xlimits.nrows() == 0 {
            return Err(SegoError::ConfigurationError(
                "design space bounds are missing".to_string(),
            ));
        }
        if xlimits.ncols() != 2 {
            return Err(SegoError::ConfigurationError(format!(
                "bounds should be a (nx, 2) matrix, got ({}, {})",
                xlimits.nrows(),
                xlimits.ncols()
            )));
        }
        for (i, row) in xlimits.rows().into_iter().enumerate() {
            if !(row[0].is_finite() && row[1].is_finite()) {
                return Err(SegoError::ConfigurationError(format!(
                    "bounds of x[{i}] should be finite, got [{}, {}]",
                    row[0], row[1]
                )));
            }
            if row[0] >= row[1] {
                return Err(SegoError::ConfigurationError(format!(
                    "lower bound should be less than upper bound for x[{i}], got [{}, {}]",
                    row[0], row[1]
                )));
            }
        }
        if config.n_doe == Some(0) {
            return Err(SegoError::ConfigurationError(
                "n_doe should be greater than 0".to_string(),
            ));
        }
        if let Some(doe) = config.doe.as_ref() {
            if doe.ncols() != xlimits.nrows() {
                return Err(SegoError::ConfigurationError(format!(
                    "initial doe should have {} columns, got {}",
                    xlimits.nrows(),
                    doe.ncols()
                )));
            }
            if doe.nrows() == 0 {
                return Err(SegoError::ConfigurationError(
                    "initial doe should not be empty".to_string(),
                ));
            }
            for (i, row) in doe.rows().into_iter().enumerate() {
                let outside = row
                    .iter()
                    .zip(xlimits.rows())
                    .any(|(v, lim)| !(v.is_finite() && lim[0] <= *v && *v <= lim[1]));
                if outside {
                    return Err(SegoError::ConfigurationError(format!(
                        "initial doe point #{i} {row} should lie within bounds"
                    )));
                }
            }
        }
        if config.qei_config.batch == 0 {
            return Err(SegoError::ConfigurationError(
                "q_points should be greater than 0".to_string(),
            ));
        }
        if config.qei_config.optmod == 0 {
            return Err(SegoError::ConfigurationError(
                "q_optmod should be greater than 0".to_string(),
            ));
        }
        if config.n_start == 0 {
            return Err(SegoError::ConfigurationError(
                "n_start should be greater than 0".to_string(),
            ));
        }
        if config.n_optim_eval == 0 {
            return Err(SegoError::ConfigurationError(
                "n_optim_eval should be greater than 0".to_string(),
            ));
        }
        if config.gp.regression_spec.is_empty() || config.gp.correlation_spec.is_empty() {
            return Err(SegoError::ConfigurationError(
                "regression and correlation specs should enable at least one model".to_string(),
            ));
        }
        let theta_tuning = &config.gp.theta_tuning;
        GpParams::default()
            .theta_tuning(theta_tuning.clone())
            .check_ref()
            .map_err(|err| SegoError::ConfigurationError(format!("gp theta tuning: {err}")))?;
        let nx = xlimits.nrows();
        let theta_len_ok = |len: usize| len == 1 || len == nx;
        if !theta_len_ok(theta_tuning.init().len())
            || !theta_tuning.bounds().is_none_or(|b| theta_len_ok(b.len()))
        {
            return Err(SegoError::ConfigurationError(format!(
                "gp theta tuning should hold 1 or {nx} values, got {theta_tuning:?}"
            )));
        }
        if config.gp.max_eval == 0 {
            return Err(SegoError::ConfigurationError(
                "gp max_eval should be greater than 0".to_string(),
            ));
        }
        if let Some(tol) = config.cstr_tol.as_ref() {
            if tol.len() != config.n_cstr {
                return Err(SegoError::ConfigurationError(format!(
                    "cstr_tol should hold {} values, got {}",
                    config.n_cstr,
                    tol.len()
                )));
            }
            if tol.iter().any(|t| !t.is_finite() || *t < 0.) {
                return Err(SegoError::ConfigurationError(format!(
                    "cstr_tol values should be finite and positive, got {tol}"
                )));
            }
        }
        if let Some(target) = config.target.as_ref()
            && !(target.value.is_finite() && target.tolerance.is_finite() && target.tolerance >= 0.)
        {
            return Err(SegoError::ConfigurationError(format!(
                "invalid target {target:?}"
            )));
        }
        Ok(config)
    }
}

impl From<ValidSegoConfig> for SegoConfig {
    fn from(item: ValidSegoConfig) -> Self {
        SegoConfig(item)
    }
}
