use crate::correlation_models::CorrelationModel;
use crate::errors::{GpError, Result};
use crate::mean_models::RegressionModel;
use linfa::ParamGuard;
use ndarray::{Array1, array};
use serde::{Deserialize, Serialize};

/// Default lower and upper bounds of theta hyperparameters
pub const THETA_BOUNDS: (f64, f64) = (1e-6, 1e2);
/// Default initial value of theta hyperparameters
pub const THETA_INIT: f64 = 1e-2;
/// Default number of likelihood optimization starts
pub const N_START: usize = 10;
/// Default max number of likelihood evaluations per optimization start
pub const MAX_EVAL: usize = 50;

/// A structure to specify how theta hyperparameters are tuned
/// when fitting the gaussian process
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ThetaTuning {
    /// Theta is fixed to the given value
    Fixed(Array1<f64>),
    /// Theta is optimized from `init` within `bounds`.
    /// Both arrays hold either one value (used for every component) or one value per component.
    Full {
        init: Array1<f64>,
        bounds: Array1<(f64, f64)>,
    },
}

impl Default for ThetaTuning {
    fn default() -> ThetaTuning {
        ThetaTuning::Full {
            init: array![THETA_INIT],
            bounds: array![THETA_BOUNDS],
        }
    }
}

impl ThetaTuning {
    /// Initial (or fixed) theta value
    pub fn init(&self) -> &Array1<f64> {
        match self {
            ThetaTuning::Fixed(init) => init,
            ThetaTuning::Full { init, .. } => init,
        }
    }

    /// Search bounds when theta is optimized
    pub fn bounds(&self) -> Option<&Array1<(f64, f64)>> {
        match self {
            ThetaTuning::Fixed(_) => None,
            ThetaTuning::Full { bounds, .. } => Some(bounds),
        }
    }
}

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpValidParams {
    /// Regression model representing the mean(x)
    pub(crate) regression: RegressionModel,
    /// Correlation model representing the spatial correlation between errors at e(x) and e(x')
    pub(crate) correlation: CorrelationModel,
    /// Theta hyperparameter tuning
    pub(crate) theta_tuning: ThetaTuning,
    /// Number of likelihood optimization starts
    pub(crate) n_start: usize,
    /// Max number of likelihood evaluations per start
    pub(crate) max_eval: usize,
    /// Seed of the generator of the multistart starting points
    pub(crate) seed: u64,
}

impl Default for GpValidParams {
    fn default() -> GpValidParams {
        GpValidParams {
            regression: RegressionModel::Constant,
            correlation: CorrelationModel::SquaredExponential,
            theta_tuning: ThetaTuning::default(),
            n_start: N_START,
            max_eval: MAX_EVAL,
            seed: 42,
        }
    }
}

impl GpValidParams {
    /// Get mean model
    pub fn regression(&self) -> RegressionModel {
        self.regression
    }

    /// Get correlation model
    pub fn correlation(&self) -> CorrelationModel {
        self.correlation
    }

    /// Get theta tuning
    pub fn theta_tuning(&self) -> &ThetaTuning {
        &self.theta_tuning
    }

    /// Get number of likelihood optimization starts
    pub fn n_start(&self) -> usize {
        self.n_start
    }

    /// Get max number of likelihood evaluations per start
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }

    /// Get the multistart seed
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](crate::GaussianProcess).
pub struct GpParams(GpValidParams);

impl Default for GpParams {
    fn default() -> GpParams {
        GpParams(GpValidParams::default())
    }
}

impl GpParams {
    /// A constructor for GP parameters given regression and correlation models
    /// * `regression` is the trend of the GP
    /// * `correlation` is the kernel used to model spatial correlation
    pub fn new(regression: RegressionModel, correlation: CorrelationModel) -> GpParams {
        Self(GpValidParams {
            regression,
            correlation,
            ..GpValidParams::default()
        })
    }

    /// Set mean model.
    pub fn regression_model(mut self, regression: RegressionModel) -> Self {
        self.0.regression = regression;
        self
    }

    /// Set correlation model.
    pub fn correlation_model(mut self, correlation: CorrelationModel) -> Self {
        self.0.correlation = correlation;
        self
    }

    /// Set initial value of theta, optimization starts from it.
    /// When theta is fixed, set its constant value.
    pub fn theta_init(mut self, theta_init: Array1<f64>) -> Self {
        self.0.theta_tuning = match self.0.theta_tuning {
            ThetaTuning::Full { bounds, .. } => ThetaTuning::Full {
                init: theta_init,
                bounds,
            },
            ThetaTuning::Fixed(_) => ThetaTuning::Fixed(theta_init),
        };
        self
    }

    /// Set theta hyperparameter search space, no-op when theta is fixed
    pub fn theta_bounds(mut self, theta_bounds: Array1<(f64, f64)>) -> Self {
        self.0.theta_tuning = match self.0.theta_tuning {
            ThetaTuning::Full { init, .. } => ThetaTuning::Full {
                init,
                bounds: theta_bounds,
            },
            ThetaTuning::Fixed(f) => ThetaTuning::Fixed(f),
        };
        self
    }

    /// Set theta tuning
    pub fn theta_tuning(mut self, theta_tuning: ThetaTuning) -> Self {
        self.0.theta_tuning = theta_tuning;
        self
    }

    /// Set number of likelihood optimization starts
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.0.n_start = n_start;
        self
    }

    /// Set max number of likelihood evaluations per start
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = max_eval;
        self
    }

    /// Set the seed used to draw likelihood optimization starting points
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl ParamGuard for GpParams {
    type Checked = GpValidParams;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let init = self.0.theta_tuning.init();
        if init.is_empty() {
            return Err(GpError::InvalidValueError(
                "theta must hold at least one value".to_string(),
            ));
        }
        if init.iter().any(|t| !t.is_finite() || *t <= 0.) {
            return Err(GpError::InvalidValueError(format!(
                "theta must be strictly positive, got {init}"
            )));
        }
        if let Some(bounds) = self.0.theta_tuning.bounds() {
            if bounds.is_empty() {
                return Err(GpError::InvalidValueError(
                    "theta bounds must hold at least one interval".to_string(),
                ));
            }
            if bounds
                .iter()
                .any(|(lo, up)| !(lo.is_finite() && up.is_finite() && *lo > 0. && lo < up))
            {
                return Err(GpError::InvalidValueError(format!(
                    "theta bounds must be positive ordered intervals, got {bounds:?}"
                )));
            }
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl From<GpValidParams> for GpParams {
    fn from(item: GpValidParams) -> Self {
        GpParams(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = GpParams::default().check().expect("valid default");
        assert_eq!(params.regression(), RegressionModel::Constant);
        assert_eq!(params.correlation(), CorrelationModel::SquaredExponential);
        assert_eq!(params.theta_tuning().init(), &array![THETA_INIT]);
        assert_eq!(params.n_start(), N_START);
    }

    #[test]
    fn test_invalid_theta() {
        let params = GpParams::default().theta_init(array![-1.]);
        assert!(matches!(
            params.check_ref(),
            Err(GpError::InvalidValueError(_))
        ));
        let params = GpParams::default().theta_bounds(array![(1., 0.1)]);
        assert!(matches!(params.check(), Err(GpError::InvalidValueError(_))));
    }

    #[test]
    fn test_fixed_theta_ignores_bounds() {
        let params = GpParams::default()
            .theta_tuning(ThetaTuning::Fixed(array![0.5]))
            .theta_bounds(array![(1., 0.1)])
            .check()
            .expect("valid fixed theta");
        assert_eq!(params.theta_tuning(), &ThetaTuning::Fixed(array![0.5]));
    }
}
