use crate::errors::{Result, SegoError};
use crate::solver::{SegoSolver, SegoState};
use crate::solver::solver_computations::N_SCALING_SAMPLES;
use crate::types::{InfillObjData, InfillStrategy};
use crate::utils::{farthest_point_index, find_best_result_index, update_data, usable_data};

use argmin::argmin_error_closure;
use argmin::core::{CostFunction, Problem, State};
use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, concatenate};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use sego_doe::{Lhs, LhsKind, SamplingMethod};
use sego_gp::{GpError, THETA_BOUNDS, ThetaTuning};
use sego_moe::{GpMixture, MoeError, SurrogateBuilder};

/// Number of consecutive iterations without surrogates above which a warning is emitted
pub(crate) const MAX_CONSECUTIVE_FIT_FAILURES: usize = 3;

/// Maps surrogate training errors to optimizer errors
fn fit_error(err: MoeError) -> SegoError {
    match err {
        MoeError::GpError(GpError::DegenerateFit(msg)) => SegoError::DegenerateFit(msg),
        MoeError::GpError(GpError::InvalidHyperparameter(msg)) => {
            SegoError::InvalidHyperparameter(msg)
        }
        err => SegoError::MoeError(err),
    }
}

impl<SB: SurrogateBuilder> SegoSolver<SB> {
    /// Trains the surrogate of the `name` output.
    ///
    /// Hyperparameters are optimized starting from the previous ones when
    /// `optimize_theta` is true otherwise they are kept fixed to the previous ones.
    fn make_surrogate(
        &self,
        name: &str,
        xt: &ArrayView2<f64>,
        yt: &ArrayView1<f64>,
        optimize_theta: bool,
        theta_init: Option<&Array1<f64>>,
        seed: u64,
    ) -> Result<GpMixture> {
        let mut builder = self.surrogate_builder.clone();
        builder.set_seed(seed);
        let tuning = match (&self.config.gp.theta_tuning, theta_init) {
            (ThetaTuning::Fixed(_), _) | (_, None) => self.config.gp.theta_tuning.clone(),
            (ThetaTuning::Full { bounds, .. }, Some(init)) => {
                if optimize_theta {
                    debug!("{name} model hyperparameters optim init >>> {init}");
                    ThetaTuning::Full {
                        init: init.to_owned(),
                        bounds: if bounds.is_empty() {
                            ndarray::array![THETA_BOUNDS]
                        } else {
                            bounds.to_owned()
                        },
                    }
                } else {
                    info!("{name} model hyperparameters reused >>> {init}");
                    ThetaTuning::Fixed(init.to_owned())
                }
            }
        };
        builder.set_theta_tuning(tuning);
        let model = builder.train(xt.view(), yt.view()).map_err(fit_error)?;
        debug!("{name} surrogate: {model}");
        Ok(model)
    }

    /// Exploration point: the LHS candidate farthest from the known points
    fn exploration_point(&self, x_data: &Array2<f64>, rng: &mut Xoshiro256Plus) -> Array2<f64> {
        let sub_rng = Xoshiro256Plus::seed_from_u64(rng.r#gen());
        let candidates = Lhs::new(&self.xlimits)
            .kind(LhsKind::Classic)
            .with_rng(sub_rng)
            .sample(N_SCALING_SAMPLES * self.xlimits.nrows());
        let index = farthest_point_index(x_data, &candidates);
        candidates.select(Axis(0), &[index])
    }

    /// One iteration of the SEGO algorithm: surrogates training, infill point(s) selection,
    /// evaluation of the objective function and update of the training data.
    pub(crate) fn sego_step<O: CostFunction<Param = Array2<f64>, Output = Array2<f64>>>(
        &mut self,
        problem: &mut Problem<O>,
        state: SegoState,
    ) -> Result<SegoState> {
        let mut new_state = state.clone();
        let mut models = new_state
            .take_models()
            .ok_or_else(argmin_error_closure!(PotentialBug, "SegoSolver: No models!"))?;
        let mut theta_inits = new_state
            .take_theta_inits()
            .ok_or_else(argmin_error_closure!(
                PotentialBug,
                "SegoSolver: No theta inits!"
            ))?;
        let mut rng = new_state
            .take_rng()
            .ok_or_else(argmin_error_closure!(PotentialBug, "SegoSolver: No rng!"))?;
        let (mut x_data, mut y_data) = new_state
            .take_data()
            .ok_or_else(argmin_error_closure!(PotentialBug, "SegoSolver: No data!"))?;
        let best_index = state
            .surrogate
            .best_index
            .ok_or_else(argmin_error_closure!(PotentialBug, "SegoSolver: No best index!"))?;
        let cstr_tol = state.doe.cstr_tol.clone();

        let (x_dat, infill_value) = match self.select_next_points(
            state.get_iter(),
            &mut models,
            &mut theta_inits,
            &x_data,
            &y_data,
            &cstr_tol,
            best_index,
            &mut rng,
        ) {
            Ok(res) => {
                new_state.surrogate.fit_failures = 0;
                res
            }
            Err(err) => {
                new_state.surrogate.fit_failures += 1;
                warn!("Surrogate training failed: {err}, fallback to exploration");
                if new_state.surrogate.fit_failures >= MAX_CONSECUTIVE_FIT_FAILURES {
                    warn!(
                        "{} consecutive iterations without surrogate",
                        new_state.surrogate.fit_failures
                    );
                }
                (self.exploration_point(&x_data, &mut rng), f64::NAN)
            }
        };
        info!(
            "Infill criterion {} max found = {}",
            self.config.infill_strategy.name(),
            infill_value
        );

        let usable_indices = usable_data(&x_data, &x_dat);
        for i in 0..x_dat.nrows() {
            let accepted = usable_indices.contains(&i);
            let msg = format!("  {} {}", if accepted { "A" } else { "R" }, x_dat.row(i));
            if accepted {
                debug!("{msg}");
            } else {
                info!("{msg}")
            }
        }
        let rejected_count = x_dat.nrows() - usable_indices.len();
        if rejected_count > 0 {
            info!(
                "Reject {}/{} point{} too close to previous ones",
                rejected_count,
                x_dat.nrows(),
                if rejected_count > 1 { "s" } else { "" }
            );
        }
        let x_dat = if usable_indices.is_empty() {
            let stall = SegoError::AcquisitionStall(format!(
                "no point added among {} proposed",
                x_dat.nrows()
            ));
            warn!("{stall}, fallback to exploration");
            self.exploration_point(&x_data, &mut rng)
        } else {
            x_dat.select(Axis(0), &usable_indices)
        };

        let y_actual = self.eval_obj(problem, &x_dat)?;
        let add_count = update_data(&mut x_data, &mut y_data, &x_dat, &y_actual);
        info!("+{} point(s), total: {} points", add_count, x_data.nrows());

        let (best_index, feasible) = find_best_result_index(&y_data, &cstr_tol);
        info!(
            "Current best point {} with {}{}",
            x_data.row(best_index),
            y_data.row(best_index),
            if feasible { "" } else { " (infeasible)" }
        );
        new_state = new_state
            .models(models)
            .theta_inits(theta_inits)
            .rng(rng)
            .infill_value(infill_value)
            .param(x_dat.row(0).to_owned())
            .cost(y_actual.row(0).to_owned())
            .count_added_points(add_count)
            .best_index(best_index)
            .data((x_data, y_data));
        new_state.feasibility = feasible;
        Ok(new_state)
    }

    /// Returns next promising x points regarding the infill criterion
    /// (several points when the q-EI strategy is used) together with the infill criterion value.
    ///
    /// `models` and `theta_inits` are updated with the trained surrogates. When a surrogate
    /// cannot be trained the previous one is reused, an error is returned if there is none.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn select_next_points(
        &self,
        iter: u64,
        models: &mut [Option<GpMixture>],
        theta_inits: &mut [Option<Array1<f64>>],
        x_data: &Array2<f64>,
        y_data: &Array2<f64>,
        cstr_tol: &Array1<f64>,
        best_index: usize,
        rng: &mut Xoshiro256Plus,
    ) -> Result<(Array2<f64>, f64)> {
        let nx = x_data.ncols();
        let n_out = 1 + self.config.n_cstr;
        let q = self.config.qei_config.batch;
        let mut x_dat = Array2::zeros((0, nx));
        let mut y_dat = Array2::zeros((0, n_out));
        let mut infill_val = f64::NAN;

        for i in 0..q {
            let (xt, yt) = if i == 0 {
                (x_data.to_owned(), y_data.to_owned())
            } else {
                (
                    concatenate![Axis(0), x_data.view(), x_dat.view()],
                    concatenate![Axis(0), y_data.view(), y_dat.view()],
                )
            };

            info!("Train surrogates with {} points...", xt.nrows());
            let optimize_theta =
                (iter as usize * q + i).is_multiple_of(self.config.qei_config.optmod);
            let inits = &*theta_inits;
            let seeds: Vec<u64> = (0..n_out).map(|_| rng.r#gen()).collect();
            let trained: Vec<Result<GpMixture>> = (0..n_out)
                .into_par_iter()
                .map(|k| {
                    let name = if k == 0 {
                        "Objective".to_string()
                    } else {
                        format!("Constraint[{k}]")
                    };
                    self.make_surrogate(
                        &name,
                        &xt.view(),
                        &yt.column(k),
                        optimize_theta,
                        inits[k].as_ref(),
                        seeds[k],
                    )
                })
                .collect();
            for (k, res) in trained.into_iter().enumerate() {
                match res {
                    Ok(model) => {
                        theta_inits[k] = Some(model.theta().to_owned());
                        models[k] = Some(model);
                    }
                    Err(err) if models[k].is_some() => {
                        warn!("Surrogate[{k}] training failed: {err}, reuse previous one");
                    }
                    Err(err) => return Err(err),
                }
            }
            let current: Vec<GpMixture> = models.iter().flatten().cloned().collect();
            let (obj_model, cstr_models) = current
                .split_first()
                .ok_or_else(argmin_error_closure!(PotentialBug, "SegoSolver: No model!"))?;
            debug!("... surrogates trained");

            // fmin and xbest are kept the same for all q points
            let fmin = y_data[[best_index, 0]];
            let xbest = x_data.row(best_index).to_owned();

            let sub_rng = Xoshiro256Plus::seed_from_u64(rng.r#gen());
            let sampling = Lhs::new(&self.xlimits)
                .kind(LhsKind::Maximin)
                .with_rng(sub_rng);
            let (scale_infill_obj, scale_cstr, scale_wb2) =
                self.compute_scaling(&sampling, obj_model, cstr_models, cstr_tol, fmin, false);
            let infill_data = InfillObjData {
                fmin,
                xbest: xbest.to_vec(),
                scale_infill_obj,
                scale_cstr: Some(scale_cstr),
                scale_wb2,
                exploitation: false,
            };

            // n_start - 1 LHS starts completed by the current best point
            let xbest_unit = self.to_unit(&xbest.view().insert_axis(Axis(0)));
            let starts = if self.config.n_start > 1 {
                let sub_rng = Xoshiro256Plus::seed_from_u64(rng.r#gen());
                let unit_limits = Array2::from_shape_fn((nx, 2), |(_, j)| j as f64);
                let lhs_starts = Lhs::new(&unit_limits)
                    .kind(LhsKind::Maximin)
                    .with_rng(sub_rng)
                    .sample(self.config.n_start - 1);
                concatenate![Axis(0), lhs_starts.view(), xbest_unit.view()]
            } else {
                xbest_unit
            };

            let (mut infill_obj, mut xk) = self.optimize_infill_criterion(
                obj_model,
                cstr_models,
                cstr_tol,
                &infill_data,
                &starts,
                &xbest,
            );
            let mut scale_infill_obj = scale_infill_obj;
            let ei_max = -infill_obj * scale_infill_obj;
            if self.config.infill_strategy == InfillStrategy::EI
                && (ei_max.is_nan() || ei_max <= f64::EPSILON)
            {
                info!("EI vanishes on the design space, minimize objective surrogate mean");
                let (scale_exploit, _, _) =
                    self.compute_scaling(&sampling, obj_model, cstr_models, cstr_tol, fmin, true);
                let exploit_data = InfillObjData {
                    scale_infill_obj: scale_exploit,
                    exploitation: true,
                    ..infill_data.clone()
                };
                (infill_obj, xk) = self.optimize_infill_criterion(
                    obj_model,
                    cstr_models,
                    cstr_tol,
                    &exploit_data,
                    &starts,
                    &xbest,
                );
                scale_infill_obj = scale_exploit;
            }
            debug!("+++++++  xk = {xk}");
            x_dat = concatenate![Axis(0), x_dat, xk.view().insert_axis(Axis(0))];
            // infill objective was minimized while infill criterion itself
            // is expected to be maximized hence the negative sign here
            infill_val = -infill_obj * scale_infill_obj;

            if i + 1 < q {
                match self.compute_virtual_point(&xk, y_data, obj_model, cstr_models) {
                    Ok(yk) => {
                        y_dat = concatenate![
                            Axis(0),
                            y_dat,
                            Array1::from_vec(yk).insert_axis(Axis(0))
                        ];
                    }
                    Err(err) => {
                        info!("Error while getting virtual point: {err}");
                        break;
                    }
                }
            }
        }
        Ok((x_dat, infill_val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SegoConfig;
    use crate::types::{InfillStrategy, QEiStrategy};
    use ndarray::array;
    use sego_moe::GpMixtureParams;

    fn solver(config: SegoConfig) -> SegoSolver<GpMixtureParams> {
        SegoSolver::new(config.check().expect("valid config"))
    }

    fn xsinx(x: &Array2<f64>) -> Array2<f64> {
        (x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())
    }

    #[test]
    fn test_select_next_points_in_bounds() {
        let xlimits = array![[0., 25.]];
        let sego = solver(
            SegoConfig::default()
                .xlimits(&xlimits)
                .infill_strategy(InfillStrategy::WB2S),
        );
        let x_data = array![[0.], [7.], [15.], [25.]];
        let y_data = xsinx(&x_data);
        let mut models = vec![None];
        let mut theta_inits = vec![None];
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let (x_dat, infill_value) = sego
            .select_next_points(
                0,
                &mut models,
                &mut theta_inits,
                &x_data,
                &y_data,
                &Array1::zeros(0),
                3,
                &mut rng,
            )
            .expect("points selected");
        assert_eq!(x_dat.nrows(), 1);
        assert!((0. ..=25.).contains(&x_dat[[0, 0]]));
        assert!(infill_value.is_finite());
        assert!(models[0].is_some());
        assert!(theta_inits[0].is_some());
    }

    #[test]
    fn test_select_next_points_seeded() {
        let sego = solver(SegoConfig::default().xlimits(&array![[0., 25.]]));
        let x_data = array![[0.], [7.], [15.], [25.]];
        let y_data = xsinx(&x_data);
        let select = |seed| {
            let mut theta_inits = vec![None];
            let mut rng = Xoshiro256Plus::seed_from_u64(seed);
            let (x_dat, _) = sego
                .select_next_points(
                    0,
                    &mut [None],
                    &mut theta_inits,
                    &x_data,
                    &y_data,
                    &Array1::zeros(0),
                    3,
                    &mut rng,
                )
                .expect("points selected");
            (x_dat, theta_inits)
        };
        let (x1, theta1) = select(11);
        let (x2, theta2) = select(11);
        assert_eq!(x1, x2);
        assert_eq!(theta1, theta2);
    }

    #[test]
    fn test_select_q_points() {
        let xlimits = array![[0., 25.]];
        let sego = solver(
            SegoConfig::default()
                .xlimits(&xlimits)
                .q_points(3)
                .qei_strategy(QEiStrategy::KrigingBelieverUpperBound)
                .q_optmod(2),
        );
        let x_data = array![[0.], [7.], [15.], [25.]];
        let y_data = xsinx(&x_data);
        let mut models = vec![None];
        let mut theta_inits = vec![None];
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let (x_dat, _) = sego
            .select_next_points(
                1,
                &mut models,
                &mut theta_inits,
                &x_data,
                &y_data,
                &Array1::zeros(0),
                3,
                &mut rng,
            )
            .expect("points selected");
        assert_eq!(x_dat.nrows(), 3);
        assert!(x_dat.iter().all(|x| (0. ..=25.).contains(x)));
    }

    #[test]
    fn test_select_point_with_exact_trend() {
        let xlimits = array![[0., 3.], [0., 4.]];
        let sego = solver(
            SegoConfig::default()
                .xlimits(&xlimits)
                .n_cstr(1)
                .regression_spec(sego_moe::RegressionSpec::LINEAR)
                .correlation_spec(sego_moe::CorrelationSpec::SQUARED_EXPONENTIAL),
        );
        // objective and constraint are exactly reproduced by a linear trend
        let x_data = array![[0., 0.], [3., 0.], [0., 4.], [3., 4.], [1.5, 2.], [1., 1.]];
        let y_data = Array2::from_shape_fn((x_data.nrows(), 2), |(i, j)| {
            let (x0, x1) = (x_data[[i, 0]], x_data[[i, 1]]);
            if j == 0 { -x0 - x1 } else { x0 - 2. }
        });
        let (best_index, _) = find_best_result_index(&y_data, &array![0.]);
        assert_eq!(best_index, 2);
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let (x_dat, infill_value) = sego
            .select_next_points(
                0,
                &mut [None, None],
                &mut [None, None],
                &x_data,
                &y_data,
                &array![0.],
                best_index,
                &mut rng,
            )
            .expect("points selected");
        assert!(infill_value.is_finite() && infill_value > 0., "{infill_value}");
        assert_eq!(usable_data(&x_data, &x_dat), vec![0]);
        // improvement is expected in the feasible domain x0 <= 2
        let (x0, x1) = (x_dat[[0, 0]], x_dat[[0, 1]]);
        assert!(x0 <= 2. + 1e-3, "{x_dat}");
        assert!(-x0 - x1 < -4., "{x_dat}");
    }

    #[test]
    fn test_training_failure_without_previous_model() {
        let xlimits = array![[0., 1.], [0., 1.]];
        let sego = solver(
            SegoConfig::default()
                .xlimits(&xlimits)
                .regression_spec(sego_moe::RegressionSpec::QUADRATIC),
        );
        // too few points for a quadratic trend in 2D
        let x_data = array![[0., 0.], [1., 0.], [0., 1.]];
        let y_data = array![[0.], [1.], [2.]];
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let res = sego.select_next_points(
            0,
            &mut [None],
            &mut [None],
            &x_data,
            &y_data,
            &Array1::zeros(0),
            0,
            &mut rng,
        );
        assert!(res.is_err());
        let x_explo = sego.exploration_point(&x_data, &mut rng);
        assert_eq!(x_explo.dim(), (1, 2));
        assert!(x_explo.iter().all(|x| (0. ..=1.).contains(x)));
    }

    #[test]
    fn test_fit_error_mapping() {
        let err = fit_error(MoeError::GpError(GpError::DegenerateFit("chol".to_string())));
        assert!(matches!(err, SegoError::DegenerateFit(_)));
        let err = fit_error(MoeError::NoExpertFitted("none".to_string()));
        assert!(matches!(err, SegoError::MoeError(_)));
    }
}
