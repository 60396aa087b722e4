use crate::SamplingMethod;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand::{Rng, SeedableRng};
use ndarray_rand::rand_distr::Uniform;
use rand_xoshiro::Xoshiro256Plus;
use std::sync::{Arc, RwLock};

/// The Random design consists in drawing samples randomly.
#[derive(Clone, Debug)]
pub struct Random<R: Rng + Clone> {
    /// Sampling space definition as a (nx, 2) matrix
    xlimits: Array2<f64>,
    /// Random generator used for reproducibility
    rng: Arc<RwLock<R>>,
}

impl Random<Xoshiro256Plus> {
    /// Constructor given a design space given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<R: Rng + Clone> Random<R> {
    /// Constructor given a design space and a random generator
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new_with_rng(xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>, rng: R) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Random {
            xlimits: xlimits.to_owned(),
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Sets the random generator
    pub fn with_rng<R2: Rng + Clone>(self, rng: R2) -> Random<R2> {
        Random {
            xlimits: self.xlimits,
            rng: Arc::new(RwLock::new(rng)),
        }
    }
}

impl<R: Rng + Clone> SamplingMethod for Random<R> {
    fn sampling_space(&self) -> &Array2<f64> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<f64> {
        let mut rng = self.rng.write().unwrap();
        let nx = self.xlimits.nrows();
        Array2::random_using((ns, nx), Uniform::new(0., 1.), &mut *rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_random_within_bounds() {
        let xlimits = array![[5., 10.], [0., 1.]];
        let doe = Random::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(20);
        assert_eq!(doe.dim(), (20, 2));
        assert!(doe.column(0).iter().all(|v| (5. ..10.).contains(v)));
        assert!(doe.column(1).iter().all(|v| (0. ..1.).contains(v)));
    }

    #[test]
    fn test_random_seeded_reproducibility() {
        let xlimits = array![[-1., 1.]];
        let doe1 = Random::new_with_rng(&xlimits, Xoshiro256Plus::seed_from_u64(3)).sample(5);
        let doe2 = Random::new_with_rng(&xlimits, Xoshiro256Plus::seed_from_u64(3)).sample(5);
        assert_eq!(doe1, doe2);
    }
}
