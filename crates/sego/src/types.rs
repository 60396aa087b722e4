use crate::solver::SegoState;
use argmin::core::CostFunction;
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Optimization result
#[derive(Clone, Debug)]
pub struct OptimResult {
    /// Optimum x value
    pub x_opt: Array1<f64>,
    /// Optimum y value (e.g. f(x) followed by constraints values)
    pub y_opt: Array1<f64>,
    /// History of x values
    pub x_doe: Array2<f64>,
    /// History of y values (e.g. f(x_doe))
    pub y_doe: Array2<f64>,
    /// Number of points of the initial design of experiments
    pub n_doe: usize,
    /// Whether the optimum satisfies every constraint within tolerance
    pub feasible: bool,
    /// The final optimizer state
    pub state: SegoState,
}

/// Infill criterion used to select next promising point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfillStrategy {
    /// Expected Improvement
    #[default]
    EI,
    /// Locating the regional extreme
    WB2,
    /// Scaled WB2
    WB2S,
}

/// Strategy to choose several points at each iteration
/// to benefit from parallel evaluation of the objective function
/// (The Multi-points Expected Improvement (q-EI) Criterion)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QEiStrategy {
    /// Take the mean of the kriging predictor for q points
    #[default]
    KrigingBeliever,
    /// Take the minimum of kriging predictor for q points
    KrigingBelieverLowerBound,
    /// Take the maximum kriging value for q points
    KrigingBelieverUpperBound,
    /// Take the current minimum of the function found so far
    ConstantLiarMinimum,
}

/// Strategy to take into account constraints models when optimizing the infill criterion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintStrategy {
    /// The infill criterion is weighted by the probability of feasibility
    #[default]
    ProbabilityOfFeasibility,
    /// Predicted constraints means are used as constraints of the infill optimization
    MeanConstraint,
}

/// A value with a tolerance used to stop the optimization
/// when the best feasible objective value is close enough
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApproxValue {
    pub value: f64,
    pub tolerance: f64,
}

/// An interface for objective function to be optimized
///
/// The function is expected to return a matrix allowing nrows evaluations at once.
/// A row of the output matrix is expected to contain [objective, cstr_1, ... cstr_n] values.
pub trait GroupFunc: Send + Sync + 'static + Clone + Fn(&ArrayView2<f64>) -> Array2<f64> {}
impl<T> GroupFunc for T where T: Send + Sync + 'static + Clone + Fn(&ArrayView2<f64>) -> Array2<f64> {}

/// A structure to handle the objective and constraints functions for implementing
/// `argmin::CostFunction` to be used with argmin framework.
#[derive(Clone)]
pub struct ObjFunc<O: GroupFunc> {
    fobj: O,
}

impl<O: GroupFunc> ObjFunc<O> {
    pub fn new(fobj: O) -> Self {
        ObjFunc { fobj }
    }
}

impl<O: GroupFunc> CostFunction for ObjFunc<O> {
    /// Type of the parameter vector
    type Param = Array2<f64>;
    /// Type of the return value computed by the cost function
    type Output = Array2<f64>;

    /// Apply the cost function to a parameter `p`
    fn cost(&self, p: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        Ok((self.fobj)(&p.view()))
    }
}

/// Data used by internal infill criteria optimization
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InfillObjData {
    /// Current minimum of the objective
    pub fmin: f64,
    /// Current best point
    pub xbest: Vec<f64>,
    /// Scaling factor of the infill objective
    pub scale_infill_obj: f64,
    /// Scaling factors of the constraints
    pub scale_cstr: Option<Array1<f64>>,
    /// Scaling factor of the WB2 criterion
    pub scale_wb2: f64,
    /// When set, the predicted objective mean is minimized instead of
    /// maximizing the infill criterion
    pub exploitation: bool,
}

impl Default for InfillObjData {
    fn default() -> Self {
        Self {
            fmin: f64::INFINITY,
            xbest: vec![],
            scale_infill_obj: 1.,
            scale_cstr: None,
            scale_wb2: 1.,
            exploitation: false,
        }
    }
}
