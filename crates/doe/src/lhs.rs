use crate::SamplingMethod;
use crate::utils::{PHI_P_EXPONENT, min_pairwise_distance, phi_p};
use ndarray::{Array, Array2, ArrayBase, Data, Ix2, s};
use ndarray_rand::rand::seq::SliceRandom;
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Number of candidate designs drawn by maximin kinds
const MAXIMIN_ITERATIONS: usize = 5;
/// Number of exchanges tried at each ESE inner iteration
const ESE_EXCHANGES: usize = 20;
/// Threshold used to decide ESE outer iteration improvement
const ESE_TOL: f64 = 1e-3;

/// Kinds of Latin Hypercube Design
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LhsKind {
    /// sample is choosen randomly within its latin hypercube interval
    Classic,
    /// sample is the middle of its latin hypercube interval
    Centered,
    /// samples locations is optimized by maximizing minimum distance between sample points
    Maximin,
    /// sample is the middle of its latin hypercube interval and
    /// minimum distance between points is maximized
    CenteredMaximin,
    /// samples locations is optimized using the Enhanced Stochastic Evolutionary algorithm (ESE)
    /// See Jin, R. and Chen, W. and Sudjianto, A. (2005):
    /// An efficient algorithm for constructing optimal design of computer experiments.
    /// Journal of Statistical Planning and Inference, 134:268-287.
    #[default]
    Optimized,
}

/// The LHS design is built as follows: each dimension space is divided into ns sections
/// where ns is the number of sampling points, and one point is selected in each section.
/// The selection method gives different kind of LHS (see [LhsKind])
#[derive(Clone, Debug)]
pub struct Lhs<R: Rng + Clone> {
    /// Sampling space definition as a (nx, 2) matrix
    /// The ith row is the [lower_bound, upper_bound] of xi, the ith component of x
    xlimits: Array2<f64>,
    /// The requested kind of LHS
    kind: LhsKind,
    /// Random generator used for reproducibility (not used in case of Centered LHS)
    rng: Arc<RwLock<R>>,
}

impl Lhs<Xoshiro256Plus> {
    /// Constructor given a design space given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<R: Rng + Clone> Lhs<R> {
    /// Constructor with given design space and random generator.
    /// * `xlimits`: (nx, 2) matrix where nx is the dimension of the samples and the ith row
    ///   is the definition interval of the ith component of x.
    /// * `rng`: random generator used for [LhsKind::Classic] and [LhsKind::Optimized] LHS
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new_with_rng(xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>, rng: R) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Lhs {
            xlimits: xlimits.to_owned(),
            kind: LhsKind::default(),
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Sets the kind of LHS
    pub fn kind(mut self, kind: LhsKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the random generator
    pub fn with_rng<R2: Rng + Clone>(self, rng: R2) -> Lhs<R2> {
        Lhs {
            xlimits: self.xlimits,
            kind: self.kind,
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    fn normalized_lhs(&self, ns: usize, centered: bool) -> Array2<f64> {
        let nx = self.xlimits.nrows();
        let mut rng = self.rng.write().unwrap();
        let mut doe = Array2::zeros((ns, nx));
        let mut perm: Vec<usize> = (0..ns).collect();
        for j in 0..nx {
            perm.shuffle(&mut *rng);
            for (i, &p) in perm.iter().enumerate() {
                let offset = if centered { 0.5 } else { rng.r#gen::<f64>() };
                doe[[i, j]] = (p as f64 + offset) / ns as f64;
            }
        }
        doe
    }

    fn maximin_lhs(&self, ns: usize, centered: bool) -> Array2<f64> {
        let mut best = self.normalized_lhs(ns, centered);
        let mut best_dist = min_pairwise_distance(&best);
        for _ in 1..MAXIMIN_ITERATIONS {
            let candidate = self.normalized_lhs(ns, centered);
            let dist = min_pairwise_distance(&candidate);
            if dist > best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }

    fn optimized_lhs(&self, ns: usize) -> Array2<f64> {
        let x0 = self.normalized_lhs(ns, false);
        if ns < 2 {
            return x0;
        }
        let nx = self.xlimits.nrows();
        let outer_loop = ((1.5 * nx as f64) as usize).clamp(1, 30);
        let inner_loop = (20 * nx).min(100);
        self.maximin_ese(&x0, outer_loop, inner_loop)
    }

    /// Swaps two randomly chosen elements of the column `k` of `x`
    fn exchange(&self, x: &mut Array2<f64>, k: usize) {
        let ns = x.nrows();
        let mut rng = self.rng.write().unwrap();
        let i1 = rng.gen_range(0..ns);
        let mut i2 = rng.gen_range(0..ns);
        while i2 == i1 {
            i2 = rng.gen_range(0..ns);
        }
        let mut col = x.slice_mut(s![.., k]);
        col.swap(i1, i2);
    }

    fn maximin_ese(&self, x: &Array2<f64>, outer_loop: usize, inner_loop: usize) -> Array2<f64> {
        let nx = x.ncols();
        let mut x_ = x.to_owned();
        let mut phip = phi_p(&x_, PHI_P_EXPONENT);
        let mut x_best = x_.to_owned();
        let mut phip_best = phip;
        let mut t = 0.005 * phip;

        for _ in 0..outer_loop {
            let phip_oldbest = phip_best;
            let mut n_acpt = 0;
            let mut n_imp = 0;

            for i in 0..inner_loop {
                let k = (i + 1) % nx;
                let mut x_try = x_.to_owned();
                let mut phip_try = f64::INFINITY;
                for _ in 0..ESE_EXCHANGES {
                    let mut x_exch = x_.to_owned();
                    self.exchange(&mut x_exch, k);
                    let phip_exch = phi_p(&x_exch, PHI_P_EXPONENT);
                    if phip_exch < phip_try {
                        phip_try = phip_exch;
                        x_try = x_exch;
                    }
                }

                let threshold = t * self.rng.write().unwrap().r#gen::<f64>();
                if phip_try - phip <= threshold {
                    phip = phip_try;
                    n_acpt += 1;
                    x_ = x_try;
                    if phip < phip_best {
                        x_best = x_.to_owned();
                        n_imp += 1;
                        phip_best = phip;
                    }
                }
            }

            let p_accpt = n_acpt as f64 / inner_loop as f64;
            let p_imp = n_imp as f64 / inner_loop as f64;
            if phip_best - phip_oldbest < ESE_TOL {
                if p_accpt >= 0.1 && p_imp < p_accpt {
                    t *= 0.8;
                } else if !(p_accpt >= 0.1 && p_imp == p_accpt) {
                    t /= 0.8;
                }
            } else if p_accpt <= 0.1 {
                t /= 0.7;
            } else {
                t *= 0.9;
            }
        }
        log::debug!("ESE optimized LHS phi_p = {phip_best}");
        x_best
    }
}

impl<R: Rng + Clone> SamplingMethod for Lhs<R> {
    fn sampling_space(&self) -> &Array2<f64> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<f64> {
        if ns == 0 {
            return Array::zeros((0, self.xlimits.nrows()));
        }
        match self.kind {
            LhsKind::Classic => self.normalized_lhs(ns, false),
            LhsKind::Centered => self.normalized_lhs(ns, true),
            LhsKind::Maximin => self.maximin_lhs(ns, false),
            LhsKind::CenteredMaximin => self.maximin_lhs(ns, true),
            LhsKind::Optimized => self.optimized_lhs(ns),
        }
    }
}
