#![warn(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]

//! # spatial_knn
//!
//! A generic in-memory [k-d tree](https://en.wikipedia.org/wiki/K-d_tree) for exact k-nearest-
//! neighbour and range search over static, moderate-to-high-dimensional numeric vectors.
//!
//! spatial_knn provides:
//! - [`KdTree`], a bucketed kd-tree over `[T; D]` points supporting [`KdTree::knn`] and
//!   [`KdTree::all_in_range`] queries under a pluggable [`Metric`](distance_metric::Metric)
//!   ([`Euclidean`](metrics::euclidean::Euclidean) and
//!   [`Mahalanobis`](metrics::mahalanobis::Mahalanobis) out of the box);
//! - [`DataSet`] / [`LabeledDataSet`](dataset::LabeledDataSet), the permutation-tracking owner of
//!   the points a tree is built over;
//! - a self-describing, endianness-aware binary format for both, via
//!   [`KdTree::serialize`]/[`KdTree::deserialize`].
//!
//! Once built, a tree is immutable and can be queried concurrently from any number of threads
//! (see the crate's concurrency notes on [`KdTree`]).
//!
//! ## Usage
//! ```rust
//! use spatial_knn::{DataSet, KdTree, Euclidean};
//!
//! let points = DataSet::<f64, 2>::from_vectors(vec![
//!     [0.0, 0.0],
//!     [1.0, 0.0],
//!     [0.0, 1.0],
//!     [1.0, 1.0],
//!     [2.0, 2.0],
//! ]);
//! let tree = KdTree::build(&points, 1).unwrap();
//!
//! let metric = Euclidean;
//! let nearest = tree.knn(&[0.9, 0.1], 2, &metric, 0.0, false);
//! assert_eq!(nearest[0].index, 1);
//! ```

pub mod best_k;
pub mod dataset;
pub mod distance_metric;
pub mod endian;
pub mod error;
pub mod hyperrect;
pub(crate) mod indirect_heap;
pub mod kdtree;
pub mod metrics;
pub mod nearest_neighbour;
pub mod persistence;
pub mod symmetric_matrix;
pub mod traits;
pub mod tree;
pub mod types;

pub use dataset::{DataSet, LabeledDataSet};
pub use distance_metric::Metric;
pub use error::{BuildError, DeserializationError, InvariantError, MetricError};
pub use kdtree::KdTree;
pub use metrics::{Euclidean, Mahalanobis};
pub use nearest_neighbour::Neighbor;
