//! Design of experiments used to draw the initial sample of the SEGO optimizer
//! and the starting points of its internal multistart optimizations.
//!
//! The following sampling methods are available:
//! * [`Lhs`]: Latin Hypercube sampling with several flavours (see [`LhsKind`]),
//!   the `Optimized` kind minimizes the phi_p pairwise-distance criterion
//!   using an Enhanced Stochastic Evolutionary (ESE) algorithm,
//! * [`Random`]: uniform random sampling.
//!
//! Each sampling method implements the [`SamplingMethod`] trait which
//! generates points in the unit hypercube then scales them to the sampling space
//! given as a `(nx, 2)` matrix of `[lower, upper]` bounds.
//!
//! ```
//! use sego_doe::{Lhs, LhsKind, SamplingMethod};
//! use ndarray::array;
//! use ndarray_rand::rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let xlimits = array![[0., 25.], [-1., 1.]];
//! let doe = Lhs::new(&xlimits)
//!     .kind(LhsKind::Optimized)
//!     .with_rng(Xoshiro256Plus::seed_from_u64(42))
//!     .sample(10);
//! assert_eq!(doe.dim(), (10, 2));
//! ```
mod lhs;
mod random;
mod traits;
mod utils;

pub use lhs::*;
pub use random::*;
pub use traits::*;
pub use utils::{min_pairwise_distance, phi_p};
