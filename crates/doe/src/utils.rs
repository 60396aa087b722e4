use ndarray::{ArrayBase, Data, Ix2};
use ndarray_stats::DeviationExt;

/// Default exponent of the phi_p criterion
pub(crate) const PHI_P_EXPONENT: i32 = 10;

/// Computes the phi_p space-filling criterion of the given sample `x`.
///
/// `phi_p(x) = (sum_{i<j} d_ij^-p)^(1/p)` where `d_ij` is the euclidean
/// distance between points i and j. The lower the better: minimizing phi_p
/// tends to maximize the minimum pairwise distance.
pub fn phi_p(x: &ArrayBase<impl Data<Elem = f64>, Ix2>, p: i32) -> f64 {
    let n = x.nrows();
    let mut sum = 0.;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = x.row(i).l2_dist(&x.row(j)).unwrap_or(0.);
            sum += d.powi(-p);
        }
    }
    sum.powf(1. / p as f64)
}

/// Returns the minimum euclidean distance between two points of `x`,
/// infinity when `x` holds less than two points.
pub fn min_pairwise_distance(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> f64 {
    let n = x.nrows();
    let mut dmin = f64::INFINITY;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = x.row(i).l2_dist(&x.row(j)).unwrap_or(0.);
            dmin = dmin.min(d);
        }
    }
    dmin
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_phi_p() {
        let x = array![[0., 0.], [1., 0.], [0., 2.]];
        let expected = (1f64 + 2f64.powi(-10) + 5f64.sqrt().powi(-10)).powf(0.1);
        assert_abs_diff_eq!(expected, phi_p(&x, 10), epsilon = 1e-12);
    }

    #[test]
    fn test_min_pairwise_distance() {
        let x = array![[0., 0.], [3., 4.], [0., 2.]];
        assert_abs_diff_eq!(2., min_pairwise_distance(&x));
        assert!(min_pairwise_distance(&array![[1., 1.]]).is_infinite());
    }
}
