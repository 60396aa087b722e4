//! Infill criteria used to select the next point to evaluate.
//!
//! Criteria are maximized and computed from the objective surrogate prediction
//! (mean and variance) at a given point `x`.
mod ei;
mod wb2;

pub use ei::*;
pub use wb2::*;

use crate::types::InfillStrategy;
use ndarray::ArrayView2;
use sego_moe::GpSurrogate;

/// Predicted mean and standard deviation of the `model` at the point `x`
pub(crate) fn predict_at(x: &[f64], model: &dyn GpSurrogate) -> Option<(f64, f64)> {
    let pt = ArrayView2::from_shape((1, x.len()), x).ok()?;
    let mean = model.predict(&pt).ok()?[0];
    let var = model.predict_var(&pt).ok()?[0];
    Some((mean, var.max(0.).sqrt()))
}

impl InfillStrategy {
    /// Name of the infill criterion
    pub fn name(&self) -> &'static str {
        match self {
            InfillStrategy::EI => "EI",
            InfillStrategy::WB2 => "WB2",
            InfillStrategy::WB2S => "WB2S",
        }
    }

    /// Value of the infill criterion at `x` given the current minimum `fmin`.
    /// `scale` is only used by WB2 criteria (see [`compute_wb2s_scale`]).
    /// Returns NaN when the surrogate prediction fails.
    pub fn value(&self, x: &[f64], obj_model: &dyn GpSurrogate, fmin: f64, scale: f64) -> f64 {
        match self {
            InfillStrategy::EI => ei(x, obj_model, fmin),
            InfillStrategy::WB2 => wb2s(x, obj_model, fmin, 1.),
            InfillStrategy::WB2S => wb2s(x, obj_model, fmin, scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;
    use std::fmt;

    /// Surrogate predicting `x0^2` with a constant standard deviation
    struct Parabola {
        sigma: f64,
    }

    impl fmt::Display for Parabola {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Parabola(sigma={})", self.sigma)
        }
    }

    impl GpSurrogate for Parabola {
        fn dims(&self) -> (usize, usize) {
            (1, 1)
        }

        fn predict(&self, x: &ArrayView2<f64>) -> sego_moe::Result<Array1<f64>> {
            Ok(x.column(0).mapv(|v| v * v))
        }

        fn predict_var(&self, x: &ArrayView2<f64>) -> sego_moe::Result<Array1<f64>> {
            Ok(Array1::from_elem(x.nrows(), self.sigma * self.sigma))
        }
    }

    #[test]
    fn test_criteria_on_any_surrogate() {
        let model = Parabola { sigma: 0.5 };
        assert_eq!(predict_at(&[2.], &model), Some((4., 0.5)));
        assert_abs_diff_eq!(
            InfillStrategy::EI.value(&[1.], &model, 0., 1.),
            expected_improvement(1., 0.5, 0.),
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            InfillStrategy::WB2S.value(&[1.], &model, 0., 10.),
            10. * expected_improvement(1., 0.5, 0.) - 1.,
            epsilon = 1e-15
        );
        let exact = Parabola { sigma: 0. };
        assert_eq!(InfillStrategy::EI.value(&[1.], &exact, 2., 1.), 0.);
        assert_eq!(InfillStrategy::WB2.value(&[1.], &exact, 2., 1.), -1.);
    }
}
