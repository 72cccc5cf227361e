//! Error taxonomy. Four fallible enums, one per non-trivial failure class; everything else
//! (`K = 0`, `r <= 0`) clamps to an empty result rather than signalling failure.
use thiserror::Error;

/// Failures from [`crate::kdtree::KdTree::build`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("cannot build a tree over an empty data set")]
    EmptyDataSet,
    #[error("bucket_size must be at least 1, got {0}")]
    ZeroBucketSize(usize),
}

/// Failures from deserializing a tree or a standalone data set.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("stream ended after {read} bytes, expected at least {needed}")]
    TruncatedStream { read: usize, needed: usize },
    #[error("unrecognised endianness tag byte {0:#04x}")]
    BadEndiannessTag(u8),
    #[error("unsupported format version {major}.{minor}, expected 1.0")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("type tag mismatch: stream has {found:?}, expected {expected:?}")]
    TypeTagMismatch { found: String, expected: &'static str },
    #[error("dimension mismatch: stream has D={found}, expected D={expected}")]
    DimensionMismatch { found: u32, expected: u32 },
    #[error("element count must be at least 1, got {0}")]
    EmptyElementCount(u32),
    #[error("trailing signature mismatch: found {found:#06x}, expected 0xCAFE")]
    BadSignature { found: u16 },
    #[error("covariance matrix is singular and has no diagonal fallback applied")]
    SingularCovariance,
}

/// Returned by [`crate::kdtree::KdTree::verify`] when a structural invariant is violated.
/// Never returned from a query path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantError {
    #[error("node at preorder position {node} on axis {axis}: point at permuted index {point} with value {value:?} violates split {split:?} on the {side} side")]
    SplitViolation {
        node: usize,
        axis: usize,
        point: usize,
        value: String,
        split: String,
        side: &'static str,
    },
    #[error("leaf at preorder position {node} has {count} elements, outside 1..={bucket_size}")]
    LeafCountViolation {
        node: usize,
        count: usize,
        bucket_size: usize,
    },
    #[error("leaf slices do not cover [0, {n}) without overlap: {detail}")]
    CoverageGap { n: usize, detail: String },
}

/// Failures constructing a Mahalanobis metric from an explicit inverse covariance matrix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricError {
    #[error("supplied covariance matrix is singular and cannot be inverted")]
    SingularCovariance,
    #[error("matrix dimension {found} does not match the metric's dimension {expected}")]
    DimensionMismatch { found: usize, expected: usize },
}
