//! Surrogate model builder trait
//!
//! This module defines the `SurrogateBuilder` trait which is used by the SEGO optimizer
//! to create, configure and train surrogate models of objective and constraints.

use crate::{CorrelationSpec, GpMixture, GpMixtureParams, RegressionSpec, errors::Result};
use linfa::ParamGuard;
use ndarray::{Array2, ArrayView1, ArrayView2};
use sego_gp::ThetaTuning;

/// A trait for gp surrogate builder (aka gp configuration and training).
pub trait SurrogateBuilder: Clone + Sync {
    /// Constructor from domain space specified as a (nx, 2) matrix of bounds.
    fn new_with_xlimits(xlimits: &Array2<f64>) -> Self;

    /// Sets the allowed regression models used in gaussian processes.
    fn set_regression_spec(&mut self, regression_spec: RegressionSpec);

    /// Sets the allowed correlation models used in gaussian processes.
    fn set_correlation_spec(&mut self, correlation_spec: CorrelationSpec);

    /// Sets the hyperparameters tuning strategy
    fn set_theta_tuning(&mut self, theta_tuning: ThetaTuning);

    /// Set likelihood optimization parameters
    fn set_optim_params(&mut self, n_start: usize, max_eval: usize);

    /// Set the seed of the random generator used during training
    fn set_seed(&mut self, seed: u64);

    /// Train the surrogate with given training dataset (x, y)
    fn train(&self, xt: ArrayView2<f64>, yt: ArrayView1<f64>) -> Result<GpMixture>;
}

impl SurrogateBuilder for GpMixtureParams {
    /// Constructor from domain space, every bounded continuous domain is accepted
    fn new_with_xlimits(_xlimits: &Array2<f64>) -> Self {
        GpMixtureParams::new()
    }

    fn set_regression_spec(&mut self, regression_spec: RegressionSpec) {
        *self = self.clone().regression_spec(regression_spec);
    }

    fn set_correlation_spec(&mut self, correlation_spec: CorrelationSpec) {
        *self = self.clone().correlation_spec(correlation_spec);
    }

    /// Sets the theta tuning used by every tested gaussian process during training.
    fn set_theta_tuning(&mut self, theta_tuning: ThetaTuning) {
        *self = self.clone().theta_tuning(theta_tuning);
    }

    fn set_optim_params(&mut self, n_start: usize, max_eval: usize) {
        *self = self.clone().n_start(n_start).max_eval(max_eval);
    }

    fn set_seed(&mut self, seed: u64) {
        *self = self.clone().seed(seed);
    }

    fn train(&self, xt: ArrayView2<f64>, yt: ArrayView1<f64>) -> Result<GpMixture> {
        let checked = self.check_ref()?;
        checked.train(&xt, &yt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_builder_train_with_fixed_theta() {
        let xlimits = array![[0., 4.]];
        let mut builder = GpMixtureParams::new_with_xlimits(&xlimits);
        builder.set_regression_spec(RegressionSpec::CONSTANT);
        builder.set_correlation_spec(CorrelationSpec::MATERN52);
        builder.set_theta_tuning(ThetaTuning::Fixed(array![0.7]));
        builder.set_optim_params(2, 10);
        let xt = array![[0.5], [1.2], [2.0], [3.0], [4.0]];
        let yt = array![0.0, 1.0, 1.5, 0.5, 1.0];
        let moe = builder.train(xt.view(), yt.view()).expect("trained");
        assert_eq!(moe.theta(), &array![0.7]);
    }

    #[test]
    fn test_builder_seed() {
        let xt = array![[0.5], [1.2], [2.0], [3.0], [4.0]];
        let yt = array![0.0, 1.0, 1.5, 0.5, 1.0];
        let mut builder = GpMixtureParams::new();
        builder.set_regression_spec(RegressionSpec::CONSTANT);
        builder.set_correlation_spec(CorrelationSpec::SQUARED_EXPONENTIAL);
        builder.set_seed(7);
        assert_eq!(builder.check_ref().expect("valid params").seed(), 7);
        let moe1 = builder.train(xt.view(), yt.view()).expect("trained");
        let moe2 = builder.train(xt.view(), yt.view()).expect("trained");
        assert_eq!(moe1.theta(), moe2.theta());
    }

    #[test]
    fn test_builder_rejects_empty_spec() {
        let mut builder = GpMixtureParams::new();
        builder.set_regression_spec(RegressionSpec::empty());
        let xt = array![[0.5], [1.2]];
        let yt = array![0.0, 1.0];
        assert!(builder.train(xt.view(), yt.view()).is_err());
    }
}
