pub mod estimator;
pub mod weights;

pub use estimator::{estimate, estimate_with_scheme};
pub use weights::{normalized_weights, weighted_mean, WeightScheme};
