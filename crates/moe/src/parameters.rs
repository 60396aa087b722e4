use crate::errors::{MoeError, Result};
use crate::specs::{CorrelationSpec, RegressionSpec};
use linfa::ParamGuard;
use sego_gp::{MAX_EVAL, N_START, ThetaTuning};
use serde::{Deserialize, Serialize};

/// Surrogate builder checked parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpMixtureValidParams {
    /// Specification of GP regression models to be tested
    regression_spec: RegressionSpec,
    /// Specification of GP correlation models to be tested
    correlation_spec: CorrelationSpec,
    /// Theta hyperparameter tuning
    theta_tuning: ThetaTuning,
    /// Number of GP hyperparameters optimization restarts
    n_start: usize,
    /// Max number of likelihood evaluations per restart
    max_eval: usize,
    /// Seed of hyperparameters optimization starting points
    seed: u64,
}

impl Default for GpMixtureValidParams {
    fn default() -> GpMixtureValidParams {
        GpMixtureValidParams {
            regression_spec: RegressionSpec::ALL,
            correlation_spec: CorrelationSpec::ALL,
            theta_tuning: ThetaTuning::default(),
            n_start: N_START,
            max_eval: MAX_EVAL,
            seed: 42,
        }
    }
}

impl GpMixtureValidParams {
    /// The allowed GP regression models
    pub fn regression_spec(&self) -> RegressionSpec {
        self.regression_spec
    }

    /// The allowed GP correlation models
    pub fn correlation_spec(&self) -> CorrelationSpec {
        self.correlation_spec
    }

    /// The specified tuning of theta hyperparameter
    pub fn theta_tuning(&self) -> &ThetaTuning {
        &self.theta_tuning
    }

    /// The number of hyperparameters optimization restarts
    pub fn n_start(&self) -> usize {
        self.n_start
    }

    /// The max number of likelihood evaluations per restart
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Surrogate builder parameters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GpMixtureParams(GpMixtureValidParams);

impl GpMixtureParams {
    /// Constructor of surrogate builder parameters testing every trend/kernel pair.
    pub fn new() -> GpMixtureParams {
        Self::default()
    }

    /// Sets the regression models to be tested.
    ///
    /// Only GP models with regression models allowed by this specification
    /// will be fitted.
    pub fn regression_spec(mut self, regression_spec: RegressionSpec) -> Self {
        self.0.regression_spec = regression_spec;
        self
    }

    /// Sets the correlation models to be tested.
    ///
    /// Only GP models with correlation models allowed by this specification
    /// will be fitted.
    pub fn correlation_spec(mut self, correlation_spec: CorrelationSpec) -> Self {
        self.0.correlation_spec = correlation_spec;
        self
    }

    /// Set theta hyper parameter tuning
    pub fn theta_tuning(mut self, theta_tuning: ThetaTuning) -> Self {
        self.0.theta_tuning = theta_tuning;
        self
    }

    /// Sets the number of hyperparameters optimization restarts
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.0.n_start = n_start;
        self
    }

    /// Sets the max number of likelihood evaluations per restart
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = max_eval;
        self
    }

    /// Sets the seed of hyperparameters optimization starting points
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl ParamGuard for GpMixtureParams {
    type Checked = GpMixtureValidParams;
    type Error = MoeError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.regression_spec.is_empty() {
            return Err(MoeError::InvalidValueError(
                "regression spec should enable at least one model".to_string(),
            ));
        }
        if self.0.correlation_spec.is_empty() {
            return Err(MoeError::InvalidValueError(
                "correlation spec should enable at least one model".to_string(),
            ));
        }
        if self.0.max_eval == 0 {
            return Err(MoeError::InvalidValueError(
                "`max_eval` cannot be 0!".to_string(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl From<GpMixtureValidParams> for GpMixtureParams {
    fn from(item: GpMixtureValidParams) -> Self {
        GpMixtureParams(item)
    }
}
