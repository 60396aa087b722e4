use ndarray::{ArrayBase, ArrayView1, Data, Ix1, Ix2};

/// Total violation of the constraints values `c` regarding tolerances `cstr_tol`
pub fn cstr_violation(
    c: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    cstr_tol: &ArrayBase<impl Data<Elem = f64>, Ix1>,
) -> f64 {
    c.iter()
        .zip(cstr_tol.iter())
        .map(|(ci, tol)| (ci - tol).max(0.))
        .sum()
}

/// Check whether the constraints values of a `y` row `[obj, cstr_1, ..., cstr_n]`
/// are within tolerances
pub fn is_feasible(y: &ArrayView1<f64>, cstr_tol: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> bool {
    y.iter()
        .skip(1)
        .zip(cstr_tol.iter())
        .all(|(c, tol)| *c <= *tol)
}

/// Find the index of the best result in `y_data` where each row is `[obj, cstr_1, ..., cstr_n]`.
///
/// The best result is the feasible one with the minimal objective value.
/// When no row is feasible, the row with the minimal total constraints violation
/// is returned (objective value used to break ties).
/// Returns the index and whether the corresponding result is feasible.
pub fn find_best_result_index(
    y_data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    cstr_tol: &ArrayBase<impl Data<Elem = f64>, Ix1>,
) -> (usize, bool) {
    let mut best_feasible: Option<(usize, f64)> = None;
    let mut least_violating: Option<(usize, f64, f64)> = None;
    for (i, row) in y_data.rows().into_iter().enumerate() {
        let obj = row[0];
        if obj.is_nan() {
            continue;
        }
        if is_feasible(&row, cstr_tol) {
            if best_feasible.is_none_or(|(_, fbest)| obj < fbest) {
                best_feasible = Some((i, obj));
            }
        } else {
            let viol = cstr_violation(&row.slice(ndarray::s![1..]), cstr_tol);
            if least_violating
                .is_none_or(|(_, vbest, fbest)| viol < vbest || (viol == vbest && obj < fbest))
            {
                least_violating = Some((i, viol, obj));
            }
        }
    }
    match (best_feasible, least_violating) {
        (Some((i, _)), _) => (i, true),
        (None, Some((i, _, _))) => (i, false),
        (None, None) => (0, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    #[test]
    fn test_find_best_unconstrained() {
        let ydata = array![[1.], [-3.], [0.5], [-3.]];
        assert_eq!(find_best_result_index(&ydata, &Array1::zeros(0)), (1, true));
    }

    #[test]
    fn test_find_best_feasible_point() {
        // obj, c1, c2
        let ydata = array![
            [-10., 1., -1.],
            [-2., -0.5, -1.],
            [-4., 0., -2.],
            [-20., -1., 0.5]
        ];
        let tol = array![0., 0.];
        assert_eq!(find_best_result_index(&ydata, &tol), (2, true));
        let tol = array![0., 0.6];
        assert_eq!(find_best_result_index(&ydata, &tol), (3, true));
    }

    #[test]
    fn test_find_best_infeasible_point() {
        let ydata = array![[-10., 1., 0.5], [-2., 0.2, 0.1], [-4., 3., 0.]];
        let tol = array![0., 0.];
        assert_eq!(find_best_result_index(&ydata, &tol), (1, false));
        assert!(!is_feasible(&ydata.row(1), &tol));
        assert_abs_diff_eq!(cstr_violation(&array![0.2, 0.1], &tol), 0.3, epsilon = 1e-12);
    }
}
