//! Constraints handling using the probability of feasibility of the constraints surrogates.
use crate::criteria::predict_at;
use crate::criteria::SIGMA_MIN;
use crate::utils::norm_cdf;
use ndarray::{ArrayBase, Data, Ix1};
use sego_moe::GpSurrogate;

/// Probability that a constraint predicted with `mean` and standard deviation `sigma`
/// is below the tolerance `tol`
pub fn probability_of_feasibility(mean: f64, sigma: f64, tol: f64) -> f64 {
    if sigma < SIGMA_MIN || !sigma.is_finite() {
        if mean <= tol { 1. } else { 0. }
    } else {
        norm_cdf((tol - mean) / sigma)
    }
}

/// Feasibility factor at `x`: product of the probabilities of feasibility of every
/// constraint surrogate. Without constraints the factor is 1.
pub fn feasibility_factor<S: GpSurrogate>(
    x: &[f64],
    cstr_models: &[S],
    cstr_tol: &ArrayBase<impl Data<Elem = f64>, Ix1>,
) -> f64 {
    cstr_models
        .iter()
        .zip(cstr_tol.iter())
        .map(|(model, tol)| match predict_at(x, model) {
            Some((mean, sigma)) => probability_of_feasibility(mean, sigma, *tol),
            None => 0.,
        })
        .product()
}

/// Weights the infill `merit` with the feasibility factor `pof`.
/// A negative merit is made worse when feasibility is unlikely.
pub fn weighted_merit(merit: f64, pof: f64) -> f64 {
    if merit >= 0. {
        merit * pof
    } else {
        merit * (2. - pof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::{Array1, array};
    use sego_moe::{CorrelationSpec, GpMixture, RegressionSpec, ThetaTuning};

    #[test]
    fn test_probability_of_feasibility() {
        assert_eq!(probability_of_feasibility(-1., 0., 0.), 1.);
        assert_eq!(probability_of_feasibility(0., 0., 0.), 1.);
        assert_eq!(probability_of_feasibility(1., 0., 0.), 0.);
        assert_abs_diff_eq!(probability_of_feasibility(0., 1., 0.), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(probability_of_feasibility(1., 1., 1.), 0.5, epsilon = 1e-12);
        assert!(probability_of_feasibility(-2., 1., 0.) > 0.97);
    }

    #[test]
    fn test_no_constraint_factor() {
        let models: [GpMixture; 0] = [];
        assert_eq!(feasibility_factor(&[0.3, 0.2], &models, &Array1::zeros(0)), 1.);
    }

    #[test]
    fn test_feasibility_factor() {
        let xt = array![[0.], [1.], [2.], [3.], [4.]];
        // constraint feasible for x < 2
        let ct = xt.column(0).mapv(|v| v - 2.);
        let cstr = GpMixture::params()
            .regression_spec(RegressionSpec::LINEAR)
            .correlation_spec(CorrelationSpec::SQUARED_EXPONENTIAL)
            .theta_tuning(ThetaTuning::Fixed(array![0.5]))
            .check()
            .expect("valid params")
            .train(&xt, &ct)
            .expect("surrogate trained");
        let models = vec![cstr];
        let tol = array![0.];
        assert!(feasibility_factor(&[0.], &models, &tol) > 0.99);
        assert!(feasibility_factor(&[4.], &models, &tol) < 0.01);
        let with_tol = feasibility_factor(&[2.5], &models, &array![1.]);
        assert!(with_tol > feasibility_factor(&[2.5], &models, &tol));
    }

    #[test]
    fn test_weighted_merit() {
        assert_eq!(weighted_merit(2., 0.5), 1.);
        assert_eq!(weighted_merit(-2., 0.5), -3.);
        assert_eq!(weighted_merit(-2., 1.), -2.);
    }

    #[test]
    fn test_weighted_merit_non_decreasing_in_pof() {
        for merit in [-3., -0.5, 0., 0.5, 3.] {
            let values: Vec<f64> = [0., 0.25, 0.5, 1.]
                .iter()
                .map(|pof| weighted_merit(merit, *pof))
                .collect();
            assert!(values.windows(2).all(|w| w[0] <= w[1]), "{merit}: {values:?}");
            assert_eq!(weighted_merit(merit, 1.), merit);
        }
    }
}
