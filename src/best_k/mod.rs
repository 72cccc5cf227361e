//! Fixed-capacity "best-K" neighbour containers (spec component C5).
//!
//! Two implementations share one contract: [`BestKVector`] for small K (insertion-sort, O(K)
//! per push) and [`BestKHeap`] for larger K (two [`crate::indirect_heap::IndirectHeap`]s,
//! O(log K) per push). Both are chosen by the caller per query, mirroring kiddo's
//! `float::kdtree::KdTree::nearest_n` picking a `MinHeap`-style container versus a plain
//! sorted buffer depending on K.
pub mod heap;
pub mod vector;

pub use heap::BestKHeap;
pub use vector::BestKVector;

use crate::nearest_neighbour::Neighbor;
use crate::traits::ElementDistance;

/// Shared contract for a fixed-capacity container of the K best (smallest-distance)
/// neighbours seen so far.
pub trait BestK<D: ElementDistance> {
    fn capacity(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }
    /// Current worst (largest) admitted distance, or `None` if empty.
    fn worst_distance(&self) -> Option<D>;
    /// Admits `candidate` if the container is not full, or if `candidate` is strictly closer
    /// than the current worst admitted distance (in which case the worst is evicted).
    fn push(&mut self, candidate: Neighbor<D>);
    /// Drains the container into a vector sorted ascending by distance (nearest first).
    fn into_sorted_vec(self) -> Vec<Neighbor<D>>;
}
