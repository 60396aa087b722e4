use ndarray::{Array2, Axis};

/// Sampling method allowing to generate a DOE in a given sample space
pub trait SamplingMethod {
    /// Returns the bounds of the sample space
    ///
    /// # Returns
    ///
    /// * A (nx, 2) matrix where nx is the dimension of the sample space.
    ///   the ith row is the [lower_bound, upper_bound] of xi, the ith component of a sample x
    fn sampling_space(&self) -> &Array2<f64>;

    /// Generates a (ns, nx)-shaped array of samples belonging to `[0., 1.]^nx`
    ///
    /// # Parameters
    ///
    /// * `ns`: number of samples
    fn normalized_sample(&self, ns: usize) -> Array2<f64>;

    /// Generates a (ns, nx)-shaped array of samples belonging to the sample space
    ///
    /// # Parameters
    ///
    /// * `ns`: number of samples
    fn sample(&self, ns: usize) -> Array2<f64> {
        let xlimits = self.sampling_space();
        let lower = xlimits.column(0);
        let scaling = &xlimits.column(1) - &lower;
        let mut doe = self.normalized_sample(ns);
        doe.axis_iter_mut(Axis(0)).for_each(|mut row| {
            row *= &scaling;
            row += &lower;
        });
        doe
    }
}
