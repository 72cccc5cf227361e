//! Distance metric implementations (spec component C7).
//!
//! Grounded on `examples/original_source/kche-tree/metrics.h`'s `EuclideanMetric` /
//! `MahalanobisMetric` functor pair, re-expressed as [`crate::distance_metric::Metric`]
//! implementations that carry instance state rather than being template parameters.
pub mod euclidean;
pub mod mahalanobis;

pub use euclidean::Euclidean;
pub use mahalanobis::Mahalanobis;
