//! The trait implemented by any distance metric usable in a query.
use crate::traits::Element;

/// A distance metric over `D`-dimensional points of element type `T`.
///
/// Unlike a metric chosen purely by dispatch on `T`, a [`Metric`] instance can carry its own
/// state — this is what lets [`crate::metrics::mahalanobis::Mahalanobis`] hold an inverse
/// covariance matrix rather than being a zero-sized dispatch tag. Every metric must also expose
/// an early-exit, upper-bounded variant: the search path never needs the exact distance once it
/// is known to exceed the current worst admitted candidate, only a value that is provably `>=`
/// the true one.
pub trait Metric<T: Element, const D: usize> {
    /// Exact squared distance between two points.
    fn distance(&self, a: &[T; D], b: &[T; D]) -> T::Distance;

    /// Squared distance between two points, with permission to return early once the running
    /// sum is known to be `>= bound`. The returned value equals the true distance whenever it
    /// is `<= bound`; otherwise it is merely `>= bound` and must not be used for anything but
    /// pruning (spec property P8).
    fn distance_bounded(&self, a: &[T; D], b: &[T; D], bound: T::Distance) -> T::Distance;

    /// Per-axis weight applied to the incremental hyperrect update (spec §4.8): `1` for
    /// Euclidean, `Σ⁻¹[axis, axis]` for a diagonal Mahalanobis matrix. Only meaningful when
    /// [`Self::supports_incremental_bounds`] is true.
    fn axis_scale(&self, axis: usize) -> T::Distance;

    /// Whether the per-axis decomposition the incremental hyperrect updater relies on is
    /// available for this metric instance. True for Euclidean and for Mahalanobis with a
    /// diagonal inverse covariance; false for a full (non-diagonal) Mahalanobis matrix, where
    /// the quadratic form does not decompose axis-by-axis and the bounding-box distance must be
    /// treated as unknown (zero) during descent, falling back to exact evaluation at leaves.
    fn supports_incremental_bounds(&self) -> bool {
        true
    }
}
