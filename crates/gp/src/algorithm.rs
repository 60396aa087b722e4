use crate::correlation_models::CorrelationModel;
use crate::errors::{GpError, Result};
use crate::mean_models::RegressionModel;
use crate::parameters::{GpParams, GpValidParams, ThetaTuning};
use crate::utils::{DistanceMatrix, NormalizedMatrix, NormalizedVector, pairwise_differences};

use cobyla::{Func, RhoBeg, StopTols};
use linfa::dataset::DatasetBase;
use linfa::traits::Fit;
use linfa_linalg::{cholesky::*, triangular::*};
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2, s};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use sego_doe::{Lhs, LhsKind, SamplingMethod};
use std::fmt;

/// Smallest nugget added to the diagonal of the correlation matrix
const NUGGET_MIN: f64 = 100. * f64::EPSILON;
/// Largest nugget tried before declaring the fit degenerated
const NUGGET_MAX: f64 = 1e-2;
/// Conditioning threshold of the regression matrix
const FT_COND_MIN: f64 = 1e-8;

/// Internal parameters computed at training time and used at prediction
#[derive(Clone, Debug, Default)]
pub(crate) struct GpInnerParams {
    /// Gaussian process variance (normalized output scale)
    sigma2: f64,
    /// Generalized least-squares regression weights
    beta: Array2<f64>,
    /// Gaussian Process weights
    gamma: Array2<f64>,
    /// Cholesky decomposition of the correlation matrix \[R\]
    r_chol: Array2<f64>,
    /// Solution of the linear equation system : \[R\] x Ft = F
    ft: Array2<f64>,
    /// Cholesky decomposition of Ft^T.Ft
    g_chol: Array2<f64>,
}

/// A gaussian process regression model also known as Kriging
///
/// `GP(x) = mean(x) + e(x)` where the mean is a regression model (constant, linear, quadratic)
/// and the error `e(x)` is a centered gaussian process whose covariance is
/// `sigma2 * corr(x, x')` with `corr` an anisotropic kernel parameterized by `theta`.
///
/// Hyperparameters `theta` are found by maximizing the reduced likelihood
/// using a multistart COBYLA optimization in log10 space.
///
/// Inputs and output are normalized (zero mean, unit variance) before training.
///
/// ```no_run
/// use sego_gp::{GaussianProcess, RegressionModel, CorrelationModel};
/// use linfa::prelude::*;
/// use ndarray::array;
///
/// let xt = array![[0.5], [1.2], [2.0], [3.0], [4.0]];
/// let yt = array![0.0, 1.0, 1.5, 0.5, 1.0];
/// let gp = GaussianProcess::params(RegressionModel::Constant, CorrelationModel::SquaredExponential)
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP fitted");
/// let y = gp.predict(&array![[1.0], [2.1]]).expect("prediction");
/// ```
#[derive(Clone, Debug)]
pub struct GaussianProcess {
    /// Parameter of the autocorrelation model
    theta: Array1<f64>,
    /// Reduced likelihood value of the fitted hyperparameters
    likelihood: f64,
    /// Nugget actually used to factorize the correlation matrix
    nugget: f64,
    /// Regression model
    regression: RegressionModel,
    /// Correlation kernel
    correlation: CorrelationModel,
    /// Gaussian process internal fitted params
    inner_params: GpInnerParams,
    /// Normalized training inputs
    xt_norm: NormalizedMatrix,
    /// Normalized training outputs
    yt_norm: NormalizedVector,
}

impl GaussianProcess {
    /// Gp parameters constructor
    pub fn params(regression: RegressionModel, correlation: CorrelationModel) -> GpParams {
        GpParams::new(regression, correlation)
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n predicted values.
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
        self.check_input(x)?;
        let xnorm = self.xt_norm.apply(x);
        let corr = self.compute_correlation(&xnorm);
        let f = self.regression.value(&xnorm);
        let y_ = f.dot(&self.inner_params.beta) + corr.dot(&self.inner_params.gamma);
        Ok(self.yt_norm.denormalize(&y_.column(0)))
    }

    /// Predict variance values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n variance values, clamped to be non negative.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
        self.check_input(x)?;
        let inners = &self.inner_params;
        let xnorm = self.xt_norm.apply(x);
        let corr = self.compute_correlation(&xnorm);
        let f = self.regression.value(&xnorm);

        let rt = inners.r_chol.solve_triangular(&corr.t(), UPLO::Lower)?;
        let lhs = inners.ft.t().dot(&rt) - f.t();
        let u = inners.g_chol.solve_triangular(&lhs, UPLO::Lower)?;

        let b = 1.0 - rt.mapv(|v| v * v).sum_axis(Axis(0)) + u.mapv(|v| v * v).sum_axis(Axis(0));
        let sigma2 = inners.sigma2 * self.yt_norm.std * self.yt_norm.std;
        // Mean Squared Error might be slightly negative depending on
        // machine precision: set to zero in that case
        Ok(b.mapv(|v| (sigma2 * v).max(0.)))
    }

    /// Optimized theta hyperparameters
    pub fn theta(&self) -> &Array1<f64> {
        &self.theta
    }

    /// Reduced likelihood of the fitted model
    pub fn likelihood(&self) -> f64 {
        self.likelihood
    }

    /// Nugget used to regularize the correlation matrix
    pub fn nugget(&self) -> f64 {
        self.nugget
    }

    /// Process variance in output units
    pub fn variance(&self) -> f64 {
        self.inner_params.sigma2 * self.yt_norm.std * self.yt_norm.std
    }

    pub fn regression(&self) -> RegressionModel {
        self.regression
    }

    pub fn correlation(&self) -> CorrelationModel {
        self.correlation
    }

    /// Input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.xt_norm.ncols(), 1)
    }

    fn check_input(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<()> {
        if x.ncols() != self.xt_norm.ncols() {
            return Err(GpError::InvalidValueError(format!(
                "Bad input dimension: expected {}, got {}",
                self.xt_norm.ncols(),
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Correlations between normalized `xnorm` points and training points as a (n, nt) matrix
    fn compute_correlation(&self, xnorm: &Array2<f64>) -> Array2<f64> {
        let dx = pairwise_differences(xnorm, &self.xt_norm.data);
        self.correlation.matrix(&dx, &self.theta, xnorm.nrows())
    }
}

impl fmt::Display for GaussianProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GP(mean={}, corr={}, theta={}, variance={}, likelihood={})",
            self.regression,
            self.correlation,
            self.theta,
            self.variance(),
            self.likelihood
        )
    }
}

impl Fit<Array2<f64>, Array1<f64>, GpError> for GpValidParams {
    type Object = GaussianProcess;

    /// Fit GP parameters using maximum likelihood
    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<f64>>) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        let (n, nx) = x.dim();
        if n == 0 || nx == 0 {
            return Err(GpError::InvalidValueError(format!(
                "Cannot fit a GP on an empty training set ({n}, {nx})"
            )));
        }
        if y.len() != n {
            return Err(GpError::InvalidValueError(format!(
                "Training inputs and outputs mismatch: {n} vs {}",
                y.len()
            )));
        }
        let n_terms = self.regression().n_terms(nx);
        if n < n_terms {
            return Err(GpError::InvalidValueError(format!(
                "{} regression requires at least {n_terms} points, got {n}",
                self.regression()
            )));
        }

        let xtrain = NormalizedMatrix::new(x);
        let ytrain = NormalizedVector::new(y);
        let x_distances = DistanceMatrix::new(&xtrain.data);
        let fx = self.regression().value(&xtrain.data);
        let lkh = LikelihoodContext {
            fx: &fx,
            correlation: self.correlation(),
            x_distances: &x_distances,
            ytrain: &ytrain,
        };

        let theta0 = broadcast(self.theta_tuning().init(), nx)?;
        let theta = match self.theta_tuning() {
            ThetaTuning::Fixed(_) => theta0,
            ThetaTuning::Full { bounds, .. } => {
                let bounds = broadcast(bounds, nx)?;
                self.optimize_theta(&lkh, &theta0, &bounds)
            }
        };
        let (likelihood, inner_params, nugget) = lkh.with_nugget_escalation(&theta)?;

        Ok(GaussianProcess {
            theta,
            likelihood,
            nugget,
            regression: self.regression(),
            correlation: self.correlation(),
            inner_params,
            xt_norm: xtrain,
            yt_norm: ytrain,
        })
    }
}

impl GpValidParams {
    /// Maximizes the reduced likelihood with multistart COBYLA in log10(theta) space.
    /// Falls back to `theta0` when no start gives a finite likelihood.
    fn optimize_theta(
        &self,
        lkh: &LikelihoodContext,
        theta0: &Array1<f64>,
        bounds: &Array1<(f64, f64)>,
    ) -> Array1<f64> {
        let nx = theta0.len();
        let nugget = lkh
            .with_nugget_escalation(theta0)
            .map(|(_, _, nugget)| nugget)
            .unwrap_or(NUGGET_MIN);
        let log_bounds: Vec<(f64, f64)> =
            bounds.iter().map(|(lo, up)| (lo.log10(), up.log10())).collect();

        let n_start = self.n_start().max(1);
        let mut starts = Array2::zeros((n_start, nx));
        for (j, (lo, up)) in log_bounds.iter().enumerate() {
            starts[[0, j]] = theta0[j].log10().clamp(*lo, *up);
        }
        if n_start > 1 {
            let xlimits = Array2::from_shape_fn((nx, 2), |(i, j)| {
                if j == 0 { log_bounds[i].0 } else { log_bounds[i].1 }
            });
            let lhs = Lhs::new(&xlimits)
                .kind(LhsKind::Maximin)
                .with_rng(Xoshiro256Plus::seed_from_u64(self.seed()));
            starts.slice_mut(s![1.., ..]).assign(&lhs.sample(n_start - 1));
        }

        let objfn = |x: &[f64], _u: &mut ()| -> f64 {
            let theta = Array1::from_iter(x.iter().map(|v| 10f64.powf(*v)));
            match lkh.reduced_likelihood(&theta, nugget) {
                Ok((r, _)) => -r,
                Err(_) => f64::INFINITY,
            }
        };

        let results: Vec<(f64, Array1<f64>)> = (0..n_start)
            .into_par_iter()
            .map(|i| {
                let x0 = starts.row(i).to_vec();
                let cons: Vec<&dyn Func<()>> = vec![];
                let (x, y) = match cobyla::minimize(
                    objfn,
                    &x0,
                    &log_bounds,
                    &cons,
                    (),
                    self.max_eval(),
                    RhoBeg::All(0.5),
                    Some(StopTols {
                        ftol_rel: 1e-4,
                        ..StopTols::default()
                    }),
                ) {
                    Ok((_, x, y)) | Err((_, x, y)) => (x, y),
                };
                (-y, Array1::from(x))
            })
            .collect();

        best_theta(results, theta0).unwrap_or_else(|err| {
            warn!(
                "{err} for GP {}/{}, keep theta = {theta0}",
                self.regression(),
                self.correlation()
            );
            theta0.to_owned()
        })
    }
}

/// Selects the theta of the start with the best finite likelihood among
/// `(likelihood, log10(theta))` results
fn best_theta(results: Vec<(f64, Array1<f64>)>, theta0: &Array1<f64>) -> Result<Array1<f64>> {
    let best = results
        .into_iter()
        .filter(|(value, _)| value.is_finite())
        .fold(None, |best: Option<(f64, Array1<f64>)>, (value, x)| match best {
            Some((best_value, _)) if best_value >= value => best,
            _ => Some((value, x)),
        });
    match best {
        Some((value, log_theta)) => {
            let theta = log_theta.mapv(|v| 10f64.powf(v));
            debug!("theta = {theta} (likelihood = {value})");
            Ok(theta)
        }
        None => Err(GpError::InvalidHyperparameter(format!(
            "no finite likelihood found starting from theta = {theta0}"
        ))),
    }
}

/// Calls `f` with a nugget increased by a factor 10 from `NUGGET_MIN` up to `NUGGET_MAX`
/// while it fails with a degenerate fit error. Returns the result and the nugget used.
fn escalate_nugget<T>(mut f: impl FnMut(f64) -> Result<T>) -> Result<(T, f64)> {
    let mut nugget = NUGGET_MIN;
    while nugget <= NUGGET_MAX {
        match f(nugget) {
            Ok(res) => return Ok((res, nugget)),
            Err(GpError::DegenerateFit(msg)) => {
                debug!("{msg} with nugget {nugget:e}, retry with larger nugget");
                nugget *= 10.;
            }
            Err(err) => return Err(err),
        }
    }
    Err(GpError::DegenerateFit(format!(
        "matrix cannot be factorized even with nugget {NUGGET_MAX:e}"
    )))
}

/// Training data needed to compute the reduced likelihood
struct LikelihoodContext<'a> {
    fx: &'a Array2<f64>,
    correlation: CorrelationModel,
    x_distances: &'a DistanceMatrix,
    ytrain: &'a NormalizedVector,
}

impl LikelihoodContext<'_> {
    /// Computes reduced likelihood, retrying with a nugget increased by a factor 10
    /// while the correlation matrix cannot be factorized
    fn with_nugget_escalation(&self, theta: &Array1<f64>) -> Result<(f64, GpInnerParams, f64)> {
        let ((lkh, params), nugget) =
            escalate_nugget(|nugget| self.reduced_likelihood(theta, nugget)).map_err(|err| {
                match err {
                    GpError::DegenerateFit(msg) => {
                        GpError::DegenerateFit(format!("{msg} (theta = {theta})"))
                    }
                    err => err,
                }
            })?;
        Ok((lkh, params, nugget))
    }

    /// Reduced likelihood `-(n ln(sigma2) + ln(det R))` of normalized training data
    fn reduced_likelihood(&self, theta: &Array1<f64>, nugget: f64) -> Result<(f64, GpInnerParams)> {
        let n_obs = self.x_distances.n_obs;
        let r = self.correlation.value(&self.x_distances.d, theta);
        let mut r_mx: Array2<f64> = Array2::eye(n_obs) * (1. + nugget);
        for (i, ij) in self.x_distances.d_indices.outer_iter().enumerate() {
            r_mx[[ij[0], ij[1]]] = r[i];
            r_mx[[ij[1], ij[0]]] = r[i];
        }
        let r_chol = r_mx.cholesky().map_err(|e| {
            GpError::DegenerateFit(format!("correlation matrix factorization failed ({e})"))
        })?;
        if r_chol.iter().any(|v| !v.is_finite()) {
            return Err(GpError::DegenerateFit(
                "correlation matrix factorization failed".to_string(),
            ));
        }

        let ft = r_chol.solve_triangular(self.fx, UPLO::Lower)?;
        let g = ft.t().dot(&ft);
        let g_chol = g.cholesky().map_err(|_| {
            GpError::LikelihoodComputationError(
                "F is too ill conditioned, poor combination of regression model and observations"
                    .to_string(),
            )
        })?;
        let (dmin, dmax) = g_chol
            .diag()
            .iter()
            .fold((f64::INFINITY, 0f64), |(lo, up), v| (lo.min(v.abs()), up.max(v.abs())));
        if !(dmax > 0. && dmin / dmax >= FT_COND_MIN) {
            return Err(GpError::LikelihoodComputationError(
                "Ft is too ill conditioned, try another theta".to_string(),
            ));
        }

        let y = self.ytrain.data.view().insert_axis(Axis(1));
        let yt = r_chol.solve_triangular(&y, UPLO::Lower)?;
        let z = g_chol.solve_triangular(&ft.t().dot(&yt), UPLO::Lower)?;
        let beta = g_chol.t().solve_triangular(&z, UPLO::Upper)?;
        let rho = &yt - &ft.dot(&beta);
        let gamma = r_chol.t().solve_triangular(&rho, UPLO::Upper)?;

        // The determinant of r_mx is equal to the squared product of the diagonal
        // elements of its Cholesky decomposition r_chol
        let log_det_r: f64 = 2. * r_chol.diag().mapv(f64::ln).sum();
        // process variance is floored by the nugget so that an exact trend
        // still predicts a non zero uncertainty away from training points
        let sigma2 = (rho.mapv(|v| v * v).sum() / n_obs as f64).max(nugget);
        let lkh = -(n_obs as f64 * sigma2.ln() + log_det_r);
        if !lkh.is_finite() {
            return Err(GpError::LikelihoodComputationError(format!(
                "non finite likelihood with theta = {theta}"
            )));
        }
        Ok((
            lkh,
            GpInnerParams {
                sigma2,
                beta,
                gamma,
                r_chol,
                ft,
                g_chol,
            },
        ))
    }
}

/// Expands a one-element array to `n` elements, otherwise checks that it holds `n` elements
fn broadcast<T: Clone>(values: &Array1<T>, n: usize) -> Result<Array1<T>> {
    match values.len() {
        1 => Ok(Array1::from_elem(n, values[0].clone())),
        l if l == n => Ok(values.to_owned()),
        l => Err(GpError::InvalidValueError(format!(
            "theta tuning holds {l} values, expected 1 or {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use linfa::Dataset;
    use linfa::ParamGuard;
    use ndarray::{Zip, array};

    fn xt_1d() -> (Array2<f64>, Array1<f64>) {
        (
            array![[0.5], [1.2], [2.0], [3.0], [4.0]],
            array![0.0, 1.0, 1.5, 0.5, 1.0],
        )
    }

    #[test]
    fn test_gp_interpolates_training_points() {
        let (xt, yt) = xt_1d();
        let gp = GaussianProcess::params(
            RegressionModel::Constant,
            CorrelationModel::SquaredExponential,
        )
        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
        .expect("GP fit error");
        let theta = gp.theta()[0];
        assert!((1e-6..=1e2).contains(&theta), "theta = {theta}");
        assert!(gp.likelihood().is_finite());

        let ypred = gp.predict(&xt).expect("prediction error");
        assert_abs_diff_eq!(ypred, yt, epsilon = 1e-3);
        let yvars = gp.predict_var(&xt).expect("prediction error");
        assert!(yvars.iter().all(|v| *v >= 0. && *v < 1e-4), "{yvars}");
    }

    #[test]
    fn test_gp_variance_between_points() {
        let (xt, yt) = xt_1d();
        let gp = GaussianProcess::params(
            RegressionModel::Constant,
            CorrelationModel::SquaredExponential,
        )
        .fit(&Dataset::new(xt, yt))
        .expect("GP fit error");
        let ypred = gp.predict(&array![[1.0], [2.1]]).expect("prediction error");
        assert!(ypred.iter().all(|v| (-0.5..2.0).contains(v)), "{ypred}");
        let yvars = gp
            .predict_var(&array![[1.0], [2.5], [3.5]])
            .expect("prediction error");
        assert!(yvars.iter().all(|v| *v > 0.), "{yvars}");
    }

    #[test]
    fn test_all_kernels_and_trends() {
        let xt = array![[0.], [1.], [2.], [3.], [4.], [5.], [6.]];
        let yt = xt.column(0).mapv(|x| (x - 3.5) * f64::sin(x - 3.5));
        for regression in [
            RegressionModel::Constant,
            RegressionModel::Linear,
            RegressionModel::Quadratic,
        ] {
            for correlation in [
                CorrelationModel::SquaredExponential,
                CorrelationModel::AbsoluteExponential,
                CorrelationModel::Matern32,
                CorrelationModel::Matern52,
            ] {
                let gp = GaussianProcess::params(regression, correlation)
                    .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                    .unwrap_or_else(|err| panic!("{regression}/{correlation} fit: {err}"));
                let ypred = gp.predict(&xt).expect("prediction");
                assert_abs_diff_eq!(ypred, yt, epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn test_quadratic_2d() {
        let xlimits = array![[-1., 1.], [-1., 1.]];
        let xt = Lhs::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(20);
        let f = |x: &Array2<f64>| {
            let mut y = Array1::zeros(x.nrows());
            Zip::from(&mut y)
                .and(x.rows())
                .for_each(|y, x| *y = x[0] * x[0] + x[1]);
            y
        };
        let yt = f(&xt);
        let gp = GaussianProcess::params(
            RegressionModel::Quadratic,
            CorrelationModel::SquaredExponential,
        )
        .fit(&Dataset::new(xt, yt))
        .expect("GP fit error");
        let xtest = array![[0.1, 0.2], [-0.5, 0.3], [0.7, -0.6]];
        let ypred = gp.predict(&xtest).expect("prediction");
        assert_abs_diff_eq!(ypred, f(&xtest), epsilon = 1e-2);
        assert_eq!(gp.dims(), (2, 1));
    }

    #[test]
    fn test_fixed_theta() {
        let (xt, yt) = xt_1d();
        let gp = GaussianProcess::params(RegressionModel::Linear, CorrelationModel::Matern52)
            .theta_tuning(ThetaTuning::Fixed(array![0.3]))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        assert_abs_diff_eq!(gp.theta(), &array![0.3]);
    }

    #[test]
    fn test_constant_output() {
        let xt = array![[0.], [1.], [2.]];
        let yt = array![3., 3., 3.];
        let gp = GaussianProcess::params(
            RegressionModel::Constant,
            CorrelationModel::SquaredExponential,
        )
        .fit(&Dataset::new(xt, yt))
        .expect("GP fit error");
        let ypred = gp.predict(&array![[0.5], [1.5]]).expect("prediction");
        assert_abs_diff_eq!(ypred, array![3., 3.], epsilon = 1e-6);
    }

    #[test]
    fn test_too_few_points_for_trend() {
        let xt = array![[0., 0.], [1., 0.], [0., 1.]];
        let yt = array![0., 1., 2.];
        let res = GaussianProcess::params(
            RegressionModel::Quadratic,
            CorrelationModel::SquaredExponential,
        )
        .fit(&Dataset::new(xt, yt));
        assert!(matches!(res, Err(GpError::InvalidValueError(_))));
    }

    #[test]
    fn test_bad_input_dimension() {
        let (xt, yt) = xt_1d();
        let gp = GaussianProcess::params(
            RegressionModel::Constant,
            CorrelationModel::AbsoluteExponential,
        )
        .check()
        .expect("valid params")
        .fit(&Dataset::new(xt, yt))
        .expect("GP fit error");
        assert!(gp.predict(&array![[1., 2.]]).is_err());
        assert!(gp.predict_var(&array![[1., 2.]]).is_err());
    }

    #[test]
    fn test_nugget_escalation() {
        let (res, nugget) = escalate_nugget(|nugget| {
            if nugget < 1e-8 {
                Err(GpError::DegenerateFit("not positive definite".to_string()))
            } else {
                Ok(nugget * 2.)
            }
        })
        .expect("factorized with larger nugget");
        assert_abs_diff_eq!(nugget, NUGGET_MIN * 1e6, epsilon = 1e-20);
        assert_abs_diff_eq!(res, 2. * nugget);

        let res: Result<(f64, f64)> =
            escalate_nugget(|_| Err(GpError::DegenerateFit("always".to_string())));
        assert!(matches!(res, Err(GpError::DegenerateFit(_))));

        let mut calls = 0;
        let res: Result<(f64, f64)> = escalate_nugget(|_| {
            calls += 1;
            Err(GpError::LikelihoodComputationError("ill conditioned".to_string()))
        });
        assert!(matches!(res, Err(GpError::LikelihoodComputationError(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_duplicate_training_points() {
        let xt = array![[0.], [1.], [1.], [2.], [3.], [3.]];
        let yt = array![0., 1., 1., 0.5, 2., 2.];
        let gp = GaussianProcess::params(
            RegressionModel::Constant,
            CorrelationModel::SquaredExponential,
        )
        .theta_tuning(ThetaTuning::Fixed(array![1.]))
        .fit(&Dataset::new(xt, yt))
        .expect("GP fit with nugget");
        assert!((NUGGET_MIN..=NUGGET_MAX).contains(&gp.nugget()), "{}", gp.nugget());
        assert_abs_diff_eq!(gp.theta(), &array![1.]);
        let ypred = gp.predict(&array![[1.], [3.]]).expect("prediction");
        assert!(ypred.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_theta0_kept_without_finite_likelihood() {
        let theta0 = array![0.01, 0.02];
        let results = vec![
            (f64::NEG_INFINITY, array![0., 0.]),
            (f64::NAN, array![1., 1.]),
        ];
        assert!(matches!(
            best_theta(results, &theta0),
            Err(GpError::InvalidHyperparameter(_))
        ));

        let results = vec![
            (f64::NAN, array![1., 1.]),
            (-3., array![0., -1.]),
            (-5., array![1., 1.]),
        ];
        let theta = best_theta(results, &theta0).expect("best theta");
        assert_abs_diff_eq!(theta, array![1., 0.1], epsilon = 1e-12);
    }

    #[test]
    fn test_exact_trend_keeps_uncertainty() {
        let xt = array![[0.], [1.], [2.], [3.], [4.]];
        let yt = xt.column(0).mapv(|x| 2. * x + 1.);
        let gp = GaussianProcess::params(RegressionModel::Linear, CorrelationModel::SquaredExponential)
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let ypred = gp.predict(&array![[2.5]]).expect("prediction");
        assert_abs_diff_eq!(ypred[0], 6., epsilon = 1e-6);
        assert!(gp.variance() >= gp.nugget());
        let yvar = gp.predict_var(&array![[2.5], [10.]]).expect("prediction");
        assert!(yvar.iter().all(|v| v.sqrt() > 1e-12), "{yvar}");
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(broadcast(&array![1.], 3).unwrap(), array![1., 1., 1.]);
        assert_eq!(broadcast(&array![1., 2.], 2).unwrap(), array![1., 2.]);
        assert!(broadcast(&array![1., 2.], 3).is_err());
    }
}
