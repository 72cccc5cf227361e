//! The sole result record produced by a query.
use std::cmp::Ordering;

/// An `(original_index, squared_distance)` pair, the sole result record produced by
/// [`crate::kdtree::KdTree::knn`] and [`crate::kdtree::KdTree::all_in_range`].
///
/// Ordered by distance only; ties are broken by insertion order wherever a container needs a
/// strict order (see [`crate::best_k`]), never by `index`.
#[derive(Debug, Copy, Clone)]
pub struct Neighbor<D> {
    /// Index of this neighbour in the caller's original, unpermuted data set.
    pub index: u32,
    /// Squared distance from the query point under whichever metric produced this result.
    pub distance: D,
}

impl<D: PartialOrd> Ord for Neighbor<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

#[allow(clippy::non_canonical_partial_ord_impl)]
impl<D: PartialOrd> PartialOrd for Neighbor<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.distance.partial_cmp(&other.distance)
    }
}

impl<D: PartialEq> Eq for Neighbor<D> {}

impl<D: PartialEq> PartialEq for Neighbor<D> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.index == other.index
    }
}

impl<D> From<Neighbor<D>> for (u32, D) {
    fn from(n: Neighbor<D>) -> Self {
        (n.index, n.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tuple() {
        let pair: (u32, f32) = Neighbor {
            index: 1,
            distance: 1.0f32,
        }
        .into();
        assert_eq!(pair, (1, 1.0f32));
    }

    #[test]
    fn ordered_by_distance_only() {
        let near = Neighbor {
            index: 10,
            distance: 1.0f32,
        };
        let far = Neighbor {
            index: 5,
            distance: 2.0f32,
        };
        assert_eq!(near.partial_cmp(&far).unwrap(), Ordering::Less);
    }
}
