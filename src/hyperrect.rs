//! Incremental per-axis bounding-box distance maintained during tree descent (spec §4.8,
//! component C8).
//!
//! The updater tracks, for the query point currently being searched, the closest point of the
//! *current* bounding box on each axis (`nearest[axis]`) and the running squared distance from
//! the query to that box (`hyperrect_distance`). Entering a child only ever tightens the box
//! along one axis, so the update and its reversal on exit are both O(1) — this is what lets
//! `intersect` prune a subtree without ever recomputing a full per-dimension bounding-box
//! distance.
use crate::distance_metric::Metric;
use crate::traits::Element;

/// Per-query incremental state for the hyperrect/hypersphere intersection test.
pub struct HyperrectState<T: Element, const D: usize> {
    query: [T; D],
    /// Closest point of the current bounding box to `query`, per axis.
    nearest: [T; D],
    /// Squared distance from `query` to the current bounding box under the active metric.
    pub distance: T::Distance,
}

/// A saved `(axis, previous_nearest, previous_distance)` triple, returned by
/// [`HyperrectState::enter`] and required by [`HyperrectState::exit`] to undo exactly the
/// update that was applied.
pub struct HyperrectUndo<T> {
    axis: usize,
    previous_nearest: T,
    applied: bool,
}

impl<T: Element, const D: usize> HyperrectState<T, D> {
    /// Starts a query with `hyperrect_distance = epsilon_squared` (spec §4.10's epsilon slack)
    /// and the box's nearest point equal to the query itself (the box is unbounded at the
    /// root).
    pub fn new(query: [T; D], epsilon_squared: T::Distance) -> Self {
        Self {
            nearest: query,
            query,
            distance: epsilon_squared,
        }
    }

    pub fn query(&self) -> &[T; D] {
        &self.query
    }

    /// Applies the update for descending into a child on `axis` across split value `s`, under
    /// `metric`, only when `s` lies on the far side of the query along this axis (i.e. the
    /// child being entered is the far child). Returns an undo token; the caller must call
    /// [`Self::exit`] with it when leaving this child, regardless of whether an update was
    /// actually applied.
    ///
    /// `entering_far_side` is true exactly when the recursion is entering the child that does
    /// *not* contain `query[axis]` relative to `s` (spec §4.9 step 4, "recurse into the far
    /// side").
    pub fn enter<M: Metric<T, D>>(
        &mut self,
        axis: usize,
        split: T,
        entering_far_side: bool,
        metric: &M,
    ) -> HyperrectUndo<T> {
        if !entering_far_side || !metric.supports_incremental_bounds() {
            return HyperrectUndo {
                axis,
                previous_nearest: self.nearest[axis],
                applied: false,
            };
        }
        let n = self.nearest[axis];
        let s = split;
        let p_k = self.query[axis];

        // hyperrect_distance += scale * (s - n) * (n + s - 2*p_k)
        let s_minus_n = s.sub_as_distance(n);
        let two_p = p_k.sub_as_distance(T::default()) + p_k.sub_as_distance(T::default());
        let n_plus_s = n.sub_as_distance(T::default()) + s.sub_as_distance(T::default());
        let delta = metric.axis_scale(axis) * s_minus_n * (n_plus_s - two_p);

        let previous_nearest = self.nearest[axis];
        self.nearest[axis] = s;
        self.distance = self.distance + delta;
        HyperrectUndo {
            axis,
            previous_nearest,
            applied: true,
        }
    }

    /// Reverses exactly the update `token` represents, restoring `nearest[axis]` and
    /// `hyperrect_distance` to their state before the matching `enter` call. Must be matched
    /// with `enter` is LIFO (recursion-order) fashion, since each undo only knows how to
    /// subtract its own contribution relative to its immediate predecessor state.
    pub fn exit<M: Metric<T, D>>(&mut self, token: HyperrectUndo<T>, metric: &M) {
        if !token.applied {
            return;
        }
        let axis = token.axis;
        let s = self.nearest[axis];
        let n = token.previous_nearest;
        let p_k = self.query[axis];

        let s_minus_n = s.sub_as_distance(n);
        let two_p = p_k.sub_as_distance(T::default()) + p_k.sub_as_distance(T::default());
        let n_plus_s = n.sub_as_distance(T::default()) + s.sub_as_distance(T::default());
        let delta = metric.axis_scale(axis) * s_minus_n * (n_plus_s - two_p);

        self.distance = self.distance - delta;
        self.nearest[axis] = n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::euclidean::Euclidean;

    #[test]
    fn enter_then_exit_is_identity() {
        let query = [0.5f64, 0.5];
        let mut state = HyperrectState::<f64, 2>::new(query, 0.0);
        let metric = Euclidean;
        let before = state.distance;
        let token = state.enter(0, 1.0, true, &metric);
        assert!(state.distance > before);
        state.exit(token, &metric);
        assert_eq!(state.distance, before);
    }

    #[test]
    fn near_side_entry_does_not_change_distance() {
        let query = [0.5f64, 0.5];
        let mut state = HyperrectState::<f64, 2>::new(query, 0.0);
        let metric = Euclidean;
        let before = state.distance;
        let token = state.enter(0, 1.0, false, &metric);
        assert_eq!(state.distance, before);
        state.exit(token, &metric);
        assert_eq!(state.distance, before);
    }

    #[test]
    fn matches_brute_force_bounding_box_distance() {
        // query at origin, box tightened to [1, inf) on axis 0 -> distance should be 1^2 = 1.
        let query = [0.0f64, 0.0];
        let mut state = HyperrectState::<f64, 2>::new(query, 0.0);
        let metric = Euclidean;
        let _token = state.enter(0, 1.0, true, &metric);
        assert!((state.distance - 1.0).abs() < 1e-9);
    }
}
