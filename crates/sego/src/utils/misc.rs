use libm::erfc;
use log::info;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2, Zip, concatenate};
use ndarray_stats::{DeviationExt, QuantileExt};
use rayon::prelude::*;
use sego_moe::GpMixture;

const SQRT_2PI: f64 = 2.5066282746310007;

/// Computes scaling factors used to scale constraint functions values.
pub fn compute_cstr_scales(x: &ArrayView2<f64>, cstr_models: &[GpMixture]) -> Array1<f64> {
    let scales: Vec<f64> = cstr_models
        .par_iter()
        .map(|cstr_model| {
            let preds: Array1<f64> = cstr_model
                .predict(x)
                .unwrap_or_else(|_| Array1::ones(1))
                .into_iter()
                .filter(|v| v.is_finite())
                .map(|v| v.abs())
                .collect();
            match preds.max() {
                Ok(&m) if m > f64::EPSILON => m,
                _ => 1.0,
            }
        })
        .collect();
    Array1::from_vec(scales)
}

/// Cumulative distribution function of Standard Normal at x
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Probability density function of Standard Normal at x
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / SQRT_2PI
}

// DOE handling functions
///////////////////////////////////////////////////////////////////////////////

const MIN_DISTANCE: f64 = 1e-10;

/// Check if new point is not too close to previous ones `x_data`
pub fn is_update_ok(
    x_data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    x_new: &ArrayBase<impl Data<Elem = f64>, Ix1>,
) -> bool {
    for row in x_data.rows() {
        if row.l1_dist(x_new).unwrap_or(f64::INFINITY) < MIN_DISTANCE {
            log::debug!("Point {} too close to existing data point {}", x_new, row);
            return false;
        }
    }
    true
}

/// Returns the indices of usable points in `x_new` not too close to `x_data` points
/// nor to previous points of `x_new`
pub fn usable_data(
    x_data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    x_new: &ArrayBase<impl Data<Elem = f64>, Ix2>,
) -> Vec<usize> {
    let mut appended = vec![];
    Zip::indexed(x_new.rows()).for_each(|idx, x| {
        if is_update_ok(x_data, &x) && is_update_ok(&x_new.select(Axis(0), &appended), &x) {
            appended.push(idx);
        }
    });
    appended
}

/// Returns the indices of valid (not containing NaN) and invalid rows in `ydata`
pub fn filter_nans(ydata: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> (Vec<usize>, Vec<usize>) {
    let mut valid_idxs = vec![];
    let mut invalid_idxs = vec![];
    for (i, yrow) in ydata.rows().into_iter().enumerate() {
        if yrow.iter().all(|v| !v.is_nan()) {
            valid_idxs.push(i);
        } else {
            invalid_idxs.push(i);
        }
    }
    (valid_idxs, invalid_idxs)
}

/// Append `x_new` (resp. `y_new`) to `x_data` (resp. `y_data`)
/// for the rows of `y_new` which do not contain NaN values.
/// Returns the number of added points
pub fn update_data(
    x_data: &mut Array2<f64>,
    y_data: &mut Array2<f64>,
    x_new: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    y_new: &ArrayBase<impl Data<Elem = f64>, Ix2>,
) -> usize {
    let (valid_idx, invalid_idx) = filter_nans(y_new);
    if !invalid_idx.is_empty() {
        info!(
            "{} point(s) resulted in NaN during evaluation: {}",
            invalid_idx.len(),
            x_new.select(Axis(0), &invalid_idx)
        );
    }
    let x_valid = x_new.select(Axis(0), &valid_idx);
    let y_valid = y_new.select(Axis(0), &valid_idx);
    *x_data = concatenate![Axis(0), x_data.view(), x_valid.view()];
    *y_data = concatenate![Axis(0), y_data.view(), y_valid.view()];
    valid_idx.len()
}

/// Returns the index of the candidate point with the largest distance
/// to its nearest neighbour in `x_data`
pub fn farthest_point_index(
    x_data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    candidates: &ArrayBase<impl Data<Elem = f64>, Ix2>,
) -> usize {
    let min_dists: Array1<f64> = candidates
        .rows()
        .into_iter()
        .map(|c| {
            x_data
                .rows()
                .into_iter()
                .map(|x| x.l2_dist(&c).unwrap_or(f64::INFINITY))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    min_dists.argmax().unwrap_or(0)
}
