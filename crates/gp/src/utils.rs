use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, s};
use serde::{Deserialize, Serialize};

/// A structure to retain normalization related data of a matrix
/// (each column is scaled to zero mean and unit variance)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMatrix {
    /// data normalized
    pub data: Array2<f64>,
    /// mean of each column
    pub mean: Array1<f64>,
    /// standard deviation of each column (1 when data is constant)
    pub std: Array1<f64>,
}

impl NormalizedMatrix {
    /// Constructor of the normalized data
    pub fn new(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> NormalizedMatrix {
        let (data, mean, std) = normalize(x);
        NormalizedMatrix { data, mean, std }
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Applies the normalization of this matrix to new points
    pub fn apply(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array2<f64> {
        (x - &self.mean) / &self.std
    }
}

/// Normalized scalar outputs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVector {
    pub data: Array1<f64>,
    pub mean: f64,
    pub std: f64,
}

impl NormalizedVector {
    pub fn new(y: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> NormalizedVector {
        let n = y.len().max(1) as f64;
        let mean = y.sum() / n;
        let var = y.mapv(|v| (v - mean) * (v - mean)).sum() / n;
        let std = if var.sqrt() > f64::EPSILON {
            var.sqrt()
        } else {
            1.
        };
        NormalizedVector {
            data: y.mapv(|v| (v - mean) / std),
            mean,
            std,
        }
    }

    /// Maps normalized values back to the original output scale
    pub fn denormalize(&self, y: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Array1<f64> {
        y.mapv(|v| v * self.std + self.mean)
    }
}

fn normalize(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
    let nx = x.ncols();
    if x.nrows() == 0 {
        return (x.to_owned(), Array1::zeros(nx), Array1::ones(nx));
    }
    let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(nx));
    let std = x
        .std_axis(Axis(0), 0.)
        .mapv(|v| if v > f64::EPSILON { v } else { 1. });
    let xnorm = (x - &mean) / &std;
    (xnorm, mean, std)
}

/// Componentwise differences between distinct pairs of rows of a matrix
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    /// differences `x_i - x_j` for `i < j`, one row per pair
    pub d: Array2<f64>,
    /// `(i, j)` indices of each pair
    pub d_indices: Array2<usize>,
    /// number of rows of the original matrix
    pub n_obs: usize,
}

impl DistanceMatrix {
    pub fn new(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> DistanceMatrix {
        let (d, d_indices) = Self::cross_distances(x);
        DistanceMatrix {
            d,
            d_indices,
            n_obs: x.nrows(),
        }
    }

    fn cross_distances(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> (Array2<f64>, Array2<usize>) {
        let n_obs = x.nrows();
        let n_features = x.ncols();
        let n_non_zero_cross_dist = n_obs * n_obs.saturating_sub(1) / 2;
        let mut indices = Array2::<usize>::zeros((n_non_zero_cross_dist, 2));
        let mut d = Array2::zeros((n_non_zero_cross_dist, n_features));
        let mut ll_1 = 0;
        for k in 0..n_obs.saturating_sub(1) {
            let ll_0 = ll_1;
            ll_1 = ll_0 + n_obs - k - 1;
            indices
                .slice_mut(s![ll_0..ll_1, 0])
                .assign(&Array1::from_elem(n_obs - k - 1, k));
            indices
                .slice_mut(s![ll_0..ll_1, 1])
                .assign(&Array1::from_iter(k + 1..n_obs));
            d.slice_mut(s![ll_0..ll_1, ..])
                .assign(&(&x.slice(s![k..k + 1, ..]) - &x.slice(s![k + 1..n_obs, ..])));
        }
        (d, indices)
    }
}

/// Computes differences between each row of `x` and each row of `y`.
/// Returns a `(x.nrows() * y.nrows(), nx)` matrix, the `y` index varying fastest.
pub fn pairwise_differences(
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    y: &ArrayBase<impl Data<Elem = f64>, Ix2>,
) -> Array2<f64> {
    let (nx, ny, nf) = (x.nrows(), y.nrows(), x.ncols());
    let mut dx = Array2::zeros((nx * ny, nf));
    for (i, xrow) in x.rows().into_iter().enumerate() {
        dx.slice_mut(s![i * ny..(i + 1) * ny, ..])
            .assign(&(&xrow - y));
    }
    dx
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_normalized_matrix() {
        let x = array![[1., 2.], [3., 2.]];
        let xnorm = NormalizedMatrix::new(&x);
        assert_abs_diff_eq!(xnorm.mean, array![2., 2.]);
        assert_abs_diff_eq!(xnorm.std, array![1., 1.]);
        assert_abs_diff_eq!(xnorm.data, array![[-1., 0.], [1., 0.]]);
        assert_abs_diff_eq!(xnorm.apply(&array![[4., 5.]]), array![[2., 3.]]);
    }

    #[test]
    fn test_normalized_vector() {
        let y = array![1., 3., 5., 7.];
        let ynorm = NormalizedVector::new(&y);
        assert_abs_diff_eq!(ynorm.mean, 4.);
        assert_abs_diff_eq!(ynorm.data.sum(), 0., epsilon = 1e-12);
        assert_abs_diff_eq!(ynorm.denormalize(&ynorm.data), y, epsilon = 1e-12);
        let cst = NormalizedVector::new(&array![2., 2.]);
        assert_abs_diff_eq!(cst.std, 1.);
    }

    #[test]
    fn test_distance_matrix() {
        let x = array![[0., 0., 0.], [1., 2., 3.], [4., 5., 6.]];
        let dm = DistanceMatrix::new(&x);
        assert_eq!(dm.d_indices, array![[0, 1], [0, 2], [1, 2]]);
        assert_abs_diff_eq!(
            dm.d,
            array![[-1., -2., -3.], [-4., -5., -6.], [-3., -3., -3.]]
        );
        assert_eq!(DistanceMatrix::new(&array![[1., 1.]]).d.nrows(), 0);
    }

    #[test]
    fn test_pairwise_differences() {
        let x = array![[-0.9486833], [-0.82219219]];
        let y = array![[-1.26491106], [-0.63245553], [0.], [0.63245553], [1.26491106]];
        let d = pairwise_differences(&x, &y);
        assert_eq!(d.dim(), (10, 1));
        assert_abs_diff_eq!(d[[0, 0]], 0.31622776, epsilon = 1e-8);
        assert_abs_diff_eq!(d[[9, 0]], -2.08710325, epsilon = 1e-8);
    }
}
