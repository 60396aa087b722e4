use super::{ei, predict_at};
use ndarray::{Array1, ArrayView2, Axis};
use ndarray_stats::QuantileExt;
use sego_moe::GpSurrogate;

/// Ratio applied to the WB2S scaling factor
const WB2S_RATIO: f64 = 100.;

/// WB2 criterion scaled by `scale`: `scale * EI(x) - mean(x)`.
pub fn wb2s(x: &[f64], obj_model: &dyn GpSurrogate, fmin: f64, scale: f64) -> f64 {
    let Some((mean, _)) = predict_at(x, obj_model) else {
        return f64::NAN;
    };
    scale * ei(x, obj_model, fmin) - mean
}

/// Computes the scaling factor of the WB2S criterion from the EI maximizer `x*`
/// among the given `x` samples: `100 * |mean(x*)| / EI(x*)`.
/// Falls back to 1 when the EI maximum is not positive.
pub fn compute_wb2s_scale(x: &ArrayView2<f64>, obj_model: &dyn GpSurrogate, fmin: f64) -> f64 {
    let ei_x: Array1<f64> = x
        .axis_iter(Axis(0))
        .map(|xi| {
            let v = ei(&xi.to_vec(), obj_model, fmin);
            if v.is_finite() { v } else { 0. }
        })
        .collect();
    let Ok(i_max) = ei_x.argmax() else {
        return 1.;
    };
    let ei_max = ei_x[i_max];
    if ei_max > 100. * f64::EPSILON {
        match predict_at(&x.row(i_max).to_vec(), obj_model) {
            Some((mean, _)) if mean.abs() > f64::EPSILON => WB2S_RATIO * mean.abs() / ei_max,
            _ => 1.,
        }
    } else {
        1.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::array;
    use sego_moe::{CorrelationSpec, GpMixture, RegressionSpec, ThetaTuning};

    fn model() -> GpMixture {
        let xt = array![[0.], [1.], [2.], [3.], [4.]];
        let yt = array![0., 1., 1.5, 0.5, 1.];
        GpMixture::params()
            .regression_spec(RegressionSpec::CONSTANT)
            .correlation_spec(CorrelationSpec::SQUARED_EXPONENTIAL)
            .theta_tuning(ThetaTuning::Fixed(array![1.]))
            .check()
            .expect("valid params")
            .train(&xt, &yt)
            .expect("surrogate trained")
    }

    #[test]
    fn test_wb2() {
        let gp = model();
        let x = [2.5];
        let (mean, _) = predict_at(&x, &gp).expect("prediction");
        assert_abs_diff_eq!(wb2s(&x, &gp, 0., 1.), ei(&x, &gp, 0.) - mean, epsilon = 1e-12);
        // EI vanishes at training points
        assert_abs_diff_eq!(wb2s(&[3.], &gp, 0.5, 10.), -0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_wb2s_scale() {
        let gp = model();
        let xs = array![[0.5], [1.5], [2.5], [3.5]];
        let scale = compute_wb2s_scale(&xs.view(), &gp, 0.);
        assert!(scale.is_finite() && scale > 0.);
        // no improvement possible
        let xs = array![[1.], [3.]];
        assert_eq!(compute_wb2s_scale(&xs.view(), &gp, -1e6), 1.);
    }
}
