//! A module for regression models (aka trend) of the gaussian process.
//!
//! The following models are implemented:
//! * constant,
//! * linear,
//! * quadratic

use ndarray::{Array2, ArrayBase, Axis, Data, Ix2, concatenate, s};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regression model representing the mean of the GP, `GP(x) = mean(x) + e(x)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegressionModel {
    /// `mean(x) = b`
    Constant,
    /// `mean(x) = b + sum_i a_i x_i`
    Linear,
    /// `mean(x) = b + sum_i a_i x_i + sum_{i<=j} c_ij x_i x_j`
    Quadratic,
}

impl RegressionModel {
    /// Number of regression terms for inputs of dimension `nx`
    pub fn n_terms(&self, nx: usize) -> usize {
        match self {
            RegressionModel::Constant => 1,
            RegressionModel::Linear => nx + 1,
            RegressionModel::Quadratic => (nx + 1) * (nx + 2) / 2,
        }
    }

    /// Evaluates regression terms at given points, returns a `(n, n_terms)` matrix
    pub fn value(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array2<f64> {
        let n = x.nrows();
        let ones = Array2::ones((n, 1));
        match self {
            RegressionModel::Constant => ones,
            RegressionModel::Linear => concatenate![Axis(1), ones, x.to_owned()],
            RegressionModel::Quadratic => {
                let nx = x.ncols();
                let mut res = Array2::zeros((n, self.n_terms(nx)));
                res.column_mut(0).fill(1.);
                res.slice_mut(s![.., 1..nx + 1]).assign(x);
                let mut k = nx + 1;
                for i in 0..nx {
                    for j in i..nx {
                        let prod = &x.column(i) * &x.column(j);
                        res.column_mut(k).assign(&prod);
                        k += 1;
                    }
                }
                res
            }
        }
    }
}

impl fmt::Display for RegressionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegressionModel::Constant => "Constant",
            RegressionModel::Linear => "Linear",
            RegressionModel::Quadratic => "Quadratic",
        };
        write!(f, "{name}")
    }
}
