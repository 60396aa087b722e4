use crate::criteria::predict_at;
use crate::solver::SegoSolver;
use crate::types::*;

use cobyla::{Func, RhoBeg, StopTols};
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1};
use ndarray_stats::DeviationExt;
use rayon::prelude::*;
use sego_moe::{GpMixture, SurrogateBuilder};

/// Relative tolerance under which two infill objective values are considered equal
const TIE_TOL: f64 = 1e-12;

/// Result of one start of the infill criterion optimization (point in unit space, value)
type StartResult = (Array1<f64>, f64);

impl<SB: SurrogateBuilder> SegoSolver<SB> {
    /// Infill objective to be minimized at a point `x` of the unit hypercube
    fn infill_obj(
        &self,
        x: &[f64],
        obj_model: &GpMixture,
        cstr_models: &[GpMixture],
        cstr_tol: &Array1<f64>,
        infill_data: &InfillObjData,
    ) -> f64 {
        let x = self.from_unit(x);
        -self.infill_merit(&x, obj_model, cstr_models, cstr_tol, infill_data)
            / infill_data.scale_infill_obj
    }

    /// Optimizes the infill criterion with a multistart COBYLA optimizer.
    ///
    /// `starts` are starting points given in the unit hypercube and `xbest`
    /// is the current best point given in the design space.
    /// Returns the infill objective value (minimized) and the optimum point
    /// in the design space. When no start gives a finite value, `xbest` is returned.
    pub(crate) fn optimize_infill_criterion(
        &self,
        obj_model: &GpMixture,
        cstr_models: &[GpMixture],
        cstr_tol: &Array1<f64>,
        infill_data: &InfillObjData,
        starts: &Array2<f64>,
        xbest: &Array1<f64>,
    ) -> (f64, Array1<f64>) {
        let nx = self.xlimits.nrows();
        let bounds = vec![(0., 1.); nx];
        let mean_cstr = self.config.constraint_strategy == ConstraintStrategy::MeanConstraint;
        let scale_cstr = infill_data
            .scale_cstr
            .clone()
            .unwrap_or_else(|| Array1::ones(cstr_models.len()));

        let obj = |x: &[f64], _u: &mut ()| -> f64 {
            let v = self.infill_obj(x, obj_model, cstr_models, cstr_tol, infill_data);
            if v.is_finite() { v } else { f64::MAX }
        };

        let results: Vec<StartResult> = starts
            .outer_iter()
            .into_par_iter()
            .map(|x0| {
                let cstrs: Vec<_> = if mean_cstr {
                    (0..cstr_models.len())
                        .map(|k| {
                            let scale_cstr = &scale_cstr;
                            move |x: &[f64], _u: &mut ()| -> f64 {
                                let x = self.from_unit(x);
                                match predict_at(&x, &cstr_models[k]) {
                                    Some((mean, _)) => (cstr_tol[k] - mean) / scale_cstr[k],
                                    None => -1.,
                                }
                            }
                        })
                        .collect()
                } else {
                    vec![]
                };
                let cons: Vec<&dyn Func<()>> = cstrs.iter().map(|c| c as &dyn Func<()>).collect();
                let (x_opt, _) = match cobyla::minimize(
                    obj,
                    &x0.to_vec(),
                    &bounds,
                    &cons,
                    (),
                    self.config.n_optim_eval,
                    RhoBeg::All(0.5),
                    Some(StopTols {
                        ftol_rel: 1e-4,
                        ..StopTols::default()
                    }),
                ) {
                    Ok((_, x, y)) | Err((_, x, y)) => (x, y),
                };
                let x_opt = Array1::from_vec(x_opt).mapv(|v| v.clamp(0., 1.));
                let value = self.infill_obj(
                    &x_opt.to_vec(),
                    obj_model,
                    cstr_models,
                    cstr_tol,
                    infill_data,
                );
                let feasible = !mean_cstr
                    || cstrs
                        .iter()
                        .all(|c| c(&x_opt.to_vec(), &mut ()) >= -1e-6);
                let value = if feasible { value } else { f64::NAN };
                (x_opt, value)
            })
            .collect();

        let xbest_unit = self.to_unit(&xbest.view().insert_axis(ndarray::Axis(0)));
        match select_best_start(&results, &xbest_unit.row(0)) {
            Some((x_opt, value)) => {
                debug!("Infill optimum {value} at {x_opt} (unit space)");
                (value, Array1::from_vec(self.from_unit(&x_opt.to_vec())))
            }
            None => {
                warn!("Infill optimization failed on every start, fallback to best point");
                let value = self.infill_obj(
                    &xbest_unit.row(0).to_vec(),
                    obj_model,
                    cstr_models,
                    cstr_tol,
                    infill_data,
                );
                (value, xbest.to_owned())
            }
        }
    }
}

/// Selects the start result with the lowest finite value, ties are broken
/// by choosing the point closest to `xbest`. Results are visited in order
/// so the selection is deterministic.
fn select_best_start(results: &[StartResult], xbest: &ArrayView1<f64>) -> Option<StartResult> {
    let mut best: Option<&StartResult> = None;
    for res in results.iter().filter(|(_, v)| v.is_finite()) {
        best = match best {
            None => Some(res),
            Some(current) => {
                let tie = (res.1 - current.1).abs() <= TIE_TOL * current.1.abs().max(res.1.abs());
                if tie {
                    let d_res = res.0.l2_dist(xbest).unwrap_or(f64::INFINITY);
                    let d_cur = current.0.l2_dist(xbest).unwrap_or(f64::INFINITY);
                    if d_res < d_cur { Some(res) } else { Some(current) }
                } else if res.1 < current.1 {
                    Some(res)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.cloned()
}
