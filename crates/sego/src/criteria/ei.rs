use super::predict_at;
use crate::utils::{norm_cdf, norm_pdf};
use sego_moe::GpSurrogate;

/// Below this standard deviation the prediction is considered exact
pub(crate) const SIGMA_MIN: f64 = 1e-12;

/// Expected improvement of the objective below `fmin` given its
/// predicted mean and standard deviation
pub fn expected_improvement(mean: f64, sigma: f64, fmin: f64) -> f64 {
    if sigma < SIGMA_MIN {
        return 0.;
    }
    let z = (fmin - mean) / sigma;
    (fmin - mean) * norm_cdf(z) + sigma * norm_pdf(z)
}

/// Expected improvement criterion at `x`
pub fn ei(x: &[f64], obj_model: &dyn GpSurrogate, fmin: f64) -> f64 {
    match predict_at(x, obj_model) {
        Some((mean, sigma)) => expected_improvement(mean, sigma, fmin),
        None => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_expected_improvement() {
        assert_eq!(expected_improvement(1., 0., 0.), 0.);
        assert_eq!(expected_improvement(-1., 0., 0.), 0.);
        // z = 0: EI = sigma * pdf(0)
        assert_abs_diff_eq!(
            expected_improvement(0., 2., 0.),
            2. * 0.3989422804014327,
            epsilon = 1e-12
        );
        let low = expected_improvement(1., 0.5, 0.);
        let high = expected_improvement(-1., 0.5, 0.);
        assert!(0. < low && low < high);
        assert!(high > 1.);
    }
}
