use crate::errors::{MoeError, Result};
use crate::parameters::{GpMixtureParams, GpMixtureValidParams};
use crate::surrogates::GpSurrogate;

use linfa::dataset::{Dataset, DatasetBase};
use linfa::traits::Fit;
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2};
use rayon::prelude::*;
use sego_gp::{CorrelationModel, GaussianProcess, GpError, RegressionModel, ThetaTuning};
use std::fmt;

/// Max number of folds of the cross-validation used to select the best expert
const MAX_FOLDS: usize = 5;

/// A surrogate made of the best gaussian process among the tested
/// regression/correlation models pairs.
///
/// Every enabled pair is fitted, then the pair with the lowest k-fold
/// cross-validation error is retained. When cross-validation is not
/// possible the pair with the best likelihood is retained.
#[derive(Clone, Debug)]
pub struct GpMixture {
    /// The retained gaussian process
    expert: GaussianProcess,
    /// Cross-validation error of the retained expert (infinite when not computed)
    cv_error: f64,
    /// Number of fitted candidates
    n_candidates: usize,
}

impl GpMixture {
    /// Surrogate builder parameters constructor
    pub fn params() -> GpMixtureParams {
        GpMixtureParams::new()
    }

    /// The retained gaussian process
    pub fn expert(&self) -> &GaussianProcess {
        &self.expert
    }

    /// The theta hyperparameters of the retained expert
    pub fn theta(&self) -> &Array1<f64> {
        self.expert.theta()
    }

    /// Cross-validation error of the retained expert
    pub fn cv_error(&self) -> f64 {
        self.cv_error
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
        Ok(self.expert.predict(x)?)
    }

    /// Predict variance values at n given `x` points of nx components specified as a (n, nx) matrix.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
        Ok(self.expert.predict_var(x)?)
    }
}

impl GpSurrogate for GpMixture {
    fn dims(&self) -> (usize, usize) {
        self.expert.dims()
    }

    fn predict(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>> {
        GpMixture::predict(self, x)
    }

    fn predict_var(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>> {
        GpMixture::predict_var(self, x)
    }
}

impl fmt::Display for GpMixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (best of {}, cv error = {})",
            self.expert, self.n_candidates, self.cv_error
        )
    }
}

impl Fit<Array2<f64>, Array1<f64>, MoeError> for GpMixtureValidParams {
    type Object = GpMixture;

    /// Fit every enabled trend/kernel pair and select the best one
    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<f64>>) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        let pairs: Vec<(RegressionModel, CorrelationModel)> = self
            .regression_spec()
            .models()
            .into_iter()
            .flat_map(|r| {
                self.correlation_spec()
                    .models()
                    .into_iter()
                    .map(move |c| (r, c))
            })
            .collect();
        if pairs.is_empty() {
            return Err(MoeError::InvalidValueError(
                "no regression/correlation models pair enabled".to_string(),
            ));
        }

        let fitted: Vec<sego_gp::Result<GaussianProcess>> = pairs
            .par_iter()
            .map(|(regression, correlation)| {
                GaussianProcess::params(*regression, *correlation)
                    .theta_tuning(self.theta_tuning().clone())
                    .n_start(self.n_start())
                    .max_eval(self.max_eval())
                    .seed(self.seed())
                    .fit(dataset)
            })
            .collect();

        let mut first_error: Option<GpError> = None;
        let mut experts = vec![];
        for ((regression, correlation), res) in pairs.iter().zip(fitted) {
            match res {
                Ok(gp) => experts.push(gp),
                Err(err) => {
                    debug!("GP {regression}/{correlation} skipped: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }
        if experts.is_empty() {
            return Err(match first_error {
                Some(err) => MoeError::GpError(err),
                None => MoeError::NoExpertFitted("every GP fit failed".to_string()),
            });
        }

        let n_candidates = experts.len();
        let cv_errors: Vec<f64> = if n_candidates > 1 {
            experts
                .par_iter()
                .map(|gp| cross_validation_error(gp, x, y))
                .collect()
        } else {
            vec![f64::INFINITY]
        };

        let best = if cv_errors.iter().any(|e| e.is_finite()) {
            cv_errors
                .iter()
                .enumerate()
                .filter(|(_, e)| e.is_finite())
                .fold((0, f64::INFINITY), |(ibest, ebest), (i, e)| {
                    if *e < ebest { (i, *e) } else { (ibest, ebest) }
                })
                .0
        } else {
            experts
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(ibest, lbest), (i, gp)| {
                    if gp.likelihood() > lbest {
                        (i, gp.likelihood())
                    } else {
                        (ibest, lbest)
                    }
                })
                .0
        };
        let cv_error = cv_errors.get(best).copied().unwrap_or(f64::INFINITY);
        let expert = experts.swap_remove(best);
        info!(
            "Best expert {}/{} (cv error = {cv_error}) among {n_candidates}",
            expert.regression(),
            expert.correlation()
        );
        Ok(GpMixture {
            expert,
            cv_error,
            n_candidates,
        })
    }
}

impl GpMixtureValidParams {
    /// Train the surrogate with given training dataset (x, y)
    pub fn train(
        &self,
        xt: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        yt: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<GpMixture> {
        self.fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
    }
}

/// Mean squared error of k-fold cross-validation of the given expert.
/// Hyperparameters are kept fixed to the ones of the expert.
/// Returns infinity when the folds cannot be fitted.
fn cross_validation_error(gp: &GaussianProcess, x: &Array2<f64>, y: &Array1<f64>) -> f64 {
    let n = x.nrows();
    if n < 3 {
        return f64::INFINITY;
    }
    let k = n.min(MAX_FOLDS);
    let mut sse = 0.;
    for fold in 0..k {
        let (test, train): (Vec<usize>, Vec<usize>) = (0..n).partition(|i| i % k == fold);
        let params = GaussianProcess::params(gp.regression(), gp.correlation())
            .theta_tuning(ThetaTuning::Fixed(gp.theta().to_owned()));
        let xtrain = x.select(Axis(0), &train);
        let ytrain = y.select(Axis(0), &train);
        let Ok(fold_gp) = params.fit(&Dataset::new(xtrain, ytrain)) else {
            return f64::INFINITY;
        };
        let Ok(pred) = fold_gp.predict(&x.select(Axis(0), &test)) else {
            return f64::INFINITY;
        };
        sse += (&pred - &y.select(Axis(0), &test)).mapv(|v| v * v).sum();
    }
    sse / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::{CorrelationSpec, RegressionSpec};
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use sego_doe::{Lhs, SamplingMethod};

    fn xsinx(x: &Array2<f64>) -> Array1<f64> {
        x.column(0)
            .mapv(|v| (v - 3.5) * f64::sin((v - 3.5) / std::f64::consts::PI))
    }

    #[test]
    fn test_best_of_all_pairs() {
        let xt = array![[0.], [5.], [10.], [15.], [18.], [20.], [25.]];
        let yt = xsinx(&xt);
        let moe = GpMixture::params()
            .check()
            .expect("valid params")
            .train(&xt, &yt)
            .expect("surrogate fitted");
        assert!(moe.cv_error().is_finite());
        let ypred = moe.predict(&xt).expect("prediction");
        assert_abs_diff_eq!(ypred, yt, epsilon = 1e-2);
        let xtest = array![[1.], [12.], [22.]];
        let ypred = moe.predict(&xtest).expect("prediction");
        assert!(ypred.iter().all(|v| v.is_finite()));
        let yvar = moe.predict_var(&xtest).expect("prediction");
        assert!(yvar.iter().all(|v| *v >= 0.));
        assert_eq!(moe.dims(), (1, 1));
    }

    #[test]
    fn test_single_pair() {
        let xlimits = array![[-1., 1.], [-1., 1.]];
        let xt = Lhs::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(0))
            .sample(15);
        let yt = xt.map_axis(Axis(1), |x| x[0] * x[0] + x[1] * x[1]);
        let moe = GpMixture::params()
            .regression_spec(RegressionSpec::QUADRATIC)
            .correlation_spec(CorrelationSpec::SQUARED_EXPONENTIAL)
            .check()
            .expect("valid params")
            .train(&xt, &yt)
            .expect("surrogate fitted");
        assert_eq!(moe.expert().regression(), RegressionModel::Quadratic);
        assert_eq!(
            moe.expert().correlation(),
            CorrelationModel::SquaredExponential
        );
        let ypred = moe.predict(&array![[0.2, -0.3]]).expect("prediction");
        assert_abs_diff_eq!(ypred[0], 0.13, epsilon = 1e-2);
    }

    #[test]
    fn test_skips_unfittable_trends() {
        // 3 points in 2D: quadratic and linear trends cannot all be fitted
        let xt = array![[0., 0.], [1., 0.], [0., 1.]];
        let yt = array![0., 1., 2.];
        let moe = GpMixture::params()
            .check()
            .expect("valid params")
            .train(&xt, &yt)
            .expect("surrogate fitted");
        assert_ne!(moe.expert().regression(), RegressionModel::Quadratic);
    }

    #[test]
    fn test_no_expert_fitted() {
        let xt = array![[0., 0.], [1., 0.]];
        let yt = array![0., 1.];
        let res = GpMixture::params()
            .regression_spec(RegressionSpec::QUADRATIC)
            .check()
            .expect("valid params")
            .train(&xt, &yt);
        assert!(matches!(res, Err(MoeError::GpError(_))));
    }

    #[test]
    fn test_cross_validation_error() {
        let xt = array![[0.], [1.], [2.], [3.], [4.], [5.]];
        let yt = xt.column(0).mapv(|v| 2. * v + 1.);
        let gp = GaussianProcess::params(RegressionModel::Linear, CorrelationModel::Matern32)
            .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
            .expect("GP fitted");
        let err = cross_validation_error(&gp, &xt, &yt);
        assert!(err < 1e-6, "cv error = {err}");
        assert!(cross_validation_error(&gp, &array![[0.], [1.]], &array![1., 3.]).is_infinite());
    }
}
