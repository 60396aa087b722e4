//! A module for correlation models (aka kernels) with anisotropic hyperparameters `theta`.
//!
//! The following kernels are implemented:
//! * squared exponential,
//! * absolute exponential,
//! * matern 3/2,
//! * matern 5/2.

use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation model of the gaussian process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationModel {
    /// `r(d) = exp(-sum_i theta_i d_i^2)`
    SquaredExponential,
    /// `r(d) = exp(-sum_i theta_i |d_i|)`
    AbsoluteExponential,
    /// `r(d) = prod_i (1 + sqrt(3) theta_i |d_i|) exp(-sqrt(3) sum_i theta_i |d_i|)`
    Matern32,
    /// `r(d) = prod_i (1 + sqrt(5) theta_i |d_i| + 5/3 theta_i^2 d_i^2) exp(-sqrt(5) sum_i theta_i |d_i|)`
    Matern52,
}

impl CorrelationModel {
    /// Computes correlation values given componentwise differences `d` (one row per pair)
    /// and hyperparameters `theta` (one per component)
    pub fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        theta: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Array1<f64> {
        let mut r = Array1::zeros(d.nrows());
        match self {
            CorrelationModel::SquaredExponential => {
                Zip::from(&mut r).and(d.rows()).for_each(|r, d| {
                    let s: f64 = d.iter().zip(theta).map(|(d, t)| t * d * d).sum();
                    *r = (-s).exp();
                });
            }
            CorrelationModel::AbsoluteExponential => {
                Zip::from(&mut r).and(d.rows()).for_each(|r, d| {
                    let s: f64 = d.iter().zip(theta).map(|(d, t)| t * d.abs()).sum();
                    *r = (-s).exp();
                });
            }
            CorrelationModel::Matern32 => {
                let sqrt3 = 3f64.sqrt();
                Zip::from(&mut r).and(d.rows()).for_each(|r, d| {
                    let (prod, s) = d.iter().zip(theta).fold((1., 0.), |(p, s), (d, t)| {
                        let a = sqrt3 * t * d.abs();
                        (p * (1. + a), s + a)
                    });
                    *r = prod * (-s).exp();
                });
            }
            CorrelationModel::Matern52 => {
                let sqrt5 = 5f64.sqrt();
                Zip::from(&mut r).and(d.rows()).for_each(|r, d| {
                    let (prod, s) = d.iter().zip(theta).fold((1., 0.), |(p, s), (d, t)| {
                        let a = sqrt5 * t * d.abs();
                        (p * (1. + a + a * a / 3.), s + a)
                    });
                    *r = prod * (-s).exp();
                });
            }
        }
        r
    }

    /// Same as [`CorrelationModel::value`], reshaped as a `(n, m)` matrix
    /// where `d` holds `n * m` rows
    pub fn matrix(
        &self,
        d: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        theta: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        n: usize,
    ) -> Array2<f64> {
        let r = self.value(d, theta);
        let m = if n == 0 { 0 } else { r.len() / n };
        r.into_shape_with_order((n, m))
            .unwrap_or_else(|_| Array2::zeros((n, m)))
    }
}

impl fmt::Display for CorrelationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CorrelationModel::SquaredExponential => "SquaredExponential",
            CorrelationModel::AbsoluteExponential => "AbsoluteExponential",
            CorrelationModel::Matern32 => "Matern32",
            CorrelationModel::Matern52 => "Matern52",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_squared_exponential() {
        let d = array![[0., 0.], [1., 2.]];
        let theta = array![0.5, 0.25];
        let r = CorrelationModel::SquaredExponential.value(&d, &theta);
        assert_abs_diff_eq!(r, array![1., (-1.5f64).exp()], epsilon = 1e-12);
    }

    #[test]
    fn test_absolute_exponential() {
        let d = array![[-1., 2.]];
        let theta = array![0.5, 0.25];
        let r = CorrelationModel::AbsoluteExponential.value(&d, &theta);
        assert_abs_diff_eq!(r, array![(-1f64).exp()], epsilon = 1e-12);
    }

    #[test]
    fn test_matern_kernels() {
        let d = array![[0.5]];
        let theta = array![2.];
        let a3 = 3f64.sqrt();
        let r32 = CorrelationModel::Matern32.value(&d, &theta);
        assert_abs_diff_eq!(r32[0], (1. + a3) * (-a3).exp(), epsilon = 1e-12);
        let a5 = 5f64.sqrt();
        let r52 = CorrelationModel::Matern52.value(&d, &theta);
        assert_abs_diff_eq!(r52[0], (1. + a5 + 5. / 3.) * (-a5).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_kernels_are_one_at_zero_and_decreasing() {
        for corr in [
            CorrelationModel::SquaredExponential,
            CorrelationModel::AbsoluteExponential,
            CorrelationModel::Matern32,
            CorrelationModel::Matern52,
        ] {
            let r = corr.value(&array![[0.], [0.5], [1.], [2.]], &array![1.]);
            assert_abs_diff_eq!(r[0], 1., epsilon = 1e-12);
            assert!(r.windows(2).into_iter().all(|w| w[1] < w[0]));
        }
    }

    #[test]
    fn test_matrix_shape() {
        let d = array![[0.], [1.], [2.], [3.], [4.], [5.]];
        let r = CorrelationModel::SquaredExponential.matrix(&d, &array![1.], 2);
        assert_eq!(r.dim(), (2, 3));
        assert_abs_diff_eq!(r[[1, 0]], (-9f64).exp(), epsilon = 1e-12);
    }
}
