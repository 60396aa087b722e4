use crate::criteria::{compute_wb2s_scale, predict_at};
use crate::feasibility::{feasibility_factor, weighted_merit};
use crate::solver::SegoSolver;
use crate::types::*;
use crate::utils::compute_cstr_scales;

use log::debug;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};
use ndarray_rand::rand::Rng;
use ndarray_stats::QuantileExt;
use sego_doe::{Lhs, SamplingMethod};
use sego_moe::{GpMixture, SurrogateBuilder};

/// Number of samples per dimension used to compute the criteria scaling factors
pub(crate) const N_SCALING_SAMPLES: usize = 100;

impl<SB: SurrogateBuilder> SegoSolver<SB> {
    /// Maps a point of the unit hypercube to the design space
    pub(crate) fn from_unit(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.xlimits.rows())
            .map(|(v, lim)| lim[0] + v * (lim[1] - lim[0]))
            .collect()
    }

    /// Maps points of the design space to the unit hypercube
    pub(crate) fn to_unit(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array2<f64> {
        let mut xu = x.to_owned();
        Zip::from(xu.columns_mut())
            .and(self.xlimits.rows())
            .for_each(|mut col, lim| col.mapv_inplace(|v| (v - lim[0]) / (lim[1] - lim[0])));
        xu
    }

    /// Infill merit (to be maximized) at `x` given in the design space.
    /// With the probability of feasibility strategy, the infill criterion
    /// is weighted by the feasibility factor of the constraints surrogates.
    /// In exploitation mode the criterion is the opposite of the predicted objective.
    pub(crate) fn infill_merit(
        &self,
        x: &[f64],
        obj_model: &GpMixture,
        cstr_models: &[GpMixture],
        cstr_tol: &Array1<f64>,
        infill_data: &InfillObjData,
    ) -> f64 {
        let crit = if infill_data.exploitation {
            predict_at(x, obj_model).map_or(f64::NAN, |(mean, _)| -mean)
        } else {
            self.config.infill_strategy.value(
                x,
                obj_model,
                infill_data.fmin,
                infill_data.scale_wb2,
            )
        };
        match self.config.constraint_strategy {
            ConstraintStrategy::ProbabilityOfFeasibility if !cstr_models.is_empty() => {
                weighted_merit(crit, feasibility_factor(x, cstr_models, cstr_tol))
            }
            _ => crit,
        }
    }

    /// Computes the scaling factors of the infill objective, of the constraints
    /// and of the WB2S criterion from a LHS sampling of the design space.
    pub(crate) fn compute_scaling<R: Rng + Clone>(
        &self,
        sampling: &Lhs<R>,
        obj_model: &GpMixture,
        cstr_models: &[GpMixture],
        cstr_tol: &Array1<f64>,
        fmin: f64,
        exploitation: bool,
    ) -> (f64, Array1<f64>, f64) {
        let npts = N_SCALING_SAMPLES * self.xlimits.nrows();
        debug!("Use {npts} points to evaluate scalings");
        let scaling_points = sampling.sample(npts);
        let scale_wb2 = if self.config.infill_strategy == InfillStrategy::WB2S {
            compute_wb2s_scale(&scaling_points.view(), obj_model, fmin)
        } else {
            1.
        };
        let scale_cstr = compute_cstr_scales(&scaling_points.view(), cstr_models);

        let infill_data = InfillObjData {
            fmin,
            scale_wb2,
            exploitation,
            ..InfillObjData::default()
        };
        let merits: Array1<f64> = scaling_points
            .axis_iter(Axis(0))
            .map(|x| {
                self.infill_merit(&x.to_vec(), obj_model, cstr_models, cstr_tol, &infill_data)
                    .abs()
            })
            .filter(|v| v.is_finite())
            .collect();
        let scale_infill_obj = match merits.max() {
            Ok(&m) if m >= f64::EPSILON => m,
            _ => 1.,
        };
        (scale_infill_obj, scale_cstr, scale_wb2)
    }

    /// Computes the virtual values `[obj, cstr_1, ..., cstr_n]` at `xk`
    /// regarding the q-EI strategy to be appended as a known point.
    pub(crate) fn compute_virtual_point(
        &self,
        xk: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        y_data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        obj_model: &GpMixture,
        cstr_models: &[GpMixture],
    ) -> crate::errors::Result<Vec<f64>> {
        let mut res: Vec<f64> = Vec::with_capacity(1 + cstr_models.len());
        if self.config.qei_config.strategy == QEiStrategy::ConstantLiarMinimum {
            let index_min = y_data.column(0).argmin().unwrap_or(0);
            res.push(y_data[[index_min, 0]]);
            for ic in 1..y_data.ncols() {
                res.push(y_data[[index_min, ic]]);
            }
        } else {
            let x = &xk.view().insert_axis(Axis(0));
            let pred = obj_model.predict(x)?[0];
            let var = obj_model.predict_var(x)?[0];
            let conf = match self.config.qei_config.strategy {
                QEiStrategy::KrigingBelieverLowerBound => -3.,
                QEiStrategy::KrigingBelieverUpperBound => 3.,
                _ => 0.,
            };
            res.push(pred + conf * var.max(0.).sqrt());
            for cstr_model in cstr_models {
                res.push(cstr_model.predict(x)?[0]);
            }
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SegoConfig;
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::array;
    use sego_moe::{CorrelationSpec, GpMixtureParams, RegressionSpec};

    fn linear_model(xt: &Array2<f64>, yt: &Array1<f64>) -> GpMixture {
        GpMixture::params()
            .regression_spec(RegressionSpec::LINEAR)
            .correlation_spec(CorrelationSpec::SQUARED_EXPONENTIAL)
            .check()
            .expect("valid params")
            .train(xt, yt)
            .expect("surrogate trained")
    }

    #[test]
    fn test_exploitation_merit() {
        let xlimits = array![[0., 3.], [0., 4.]];
        let sego: SegoSolver<GpMixtureParams> = SegoSolver::new(
            SegoConfig::default()
                .xlimits(&xlimits)
                .n_cstr(1)
                .check()
                .expect("valid config"),
        );
        let xt = array![[0., 0.], [3., 0.], [0., 4.], [3., 4.], [1.5, 2.], [1., 3.]];
        let obj = linear_model(&xt, &xt.map_axis(Axis(1), |x| -x[0] - x[1]));
        // feasible for x0 <= 2
        let cstrs = vec![linear_model(&xt, &xt.column(0).mapv(|v| v - 2.))];
        let tol = array![0.];
        let data = InfillObjData {
            fmin: -7.,
            exploitation: true,
            ..InfillObjData::default()
        };

        let x = [1., 1.];
        let merit = sego.infill_merit(&x, &obj, &cstrs, &tol, &data);
        let pof = feasibility_factor(&x, &cstrs, &tol);
        assert_abs_diff_eq!(merit, weighted_merit(2., pof), epsilon = 1e-6);
        let better = sego.infill_merit(&[1.5, 3.5], &obj, &cstrs, &tol, &data);
        assert!(better > merit);
        // lowest mean but infeasible
        let infeasible = sego.infill_merit(&[3., 4.], &obj, &cstrs, &tol, &data);
        assert!(infeasible < better);

        // exact trend: the expected improvement is not the predicted mean
        let ei_data = InfillObjData {
            exploitation: false,
            ..data
        };
        assert!(sego.infill_merit(&x, &obj, &cstrs, &tol, &ei_data) >= 0.);
    }
}
