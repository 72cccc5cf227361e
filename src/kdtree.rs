//! Public facade tying the data set, tree arena, metrics, and search together (spec component
//! C10). `KdTree` is the only type most callers touch directly.
use crate::best_k::{BestK, BestKHeap, BestKVector};
use crate::dataset::DataSet;
use crate::distance_metric::Metric;
use crate::error::{BuildError, DeserializationError, InvariantError};
use crate::hyperrect::HyperrectState;
use crate::nearest_neighbour::Neighbor;
use crate::persistence;
use crate::traits::{Element, ElementDistance};
use crate::tree::build::build_tree;
use crate::tree::node::TreeArena;
use crate::tree::search::{knn_search, range_search};
use crate::types::ChildRef;
use std::io::{Read, Write};
use tracing::{info_span, trace_span, warn};

/// Default bucket size used by [`KdTree::build`] when the caller doesn't pick one (spec §4.10).
pub const DEFAULT_BUCKET_SIZE: usize = 32;

/// Above this K, [`KdTree::knn`] switches from [`BestKVector`]'s O(K) insertion sort to
/// [`BestKHeap`]'s O(log K) heap operations.
const HEAP_CONTAINER_THRESHOLD: usize = 32;

/// A built, immutable kd-tree over `N` points of `D`-dimensional `T` elements.
///
/// Once built, a `KdTree` is read-only: `knn` and `all_in_range` take `&self` and allocate their
/// own search state per call, so the same tree can be queried concurrently from multiple threads
/// (spec §5) as long as nothing is still mutating it — which nothing can, since there is no
/// mutating method post-`build`.
#[derive(Debug, Clone)]
pub struct KdTree<T: Element, const D: usize> {
    arena: TreeArena<T>,
    dataset: DataSet<T, D>,
    bucket_size: usize,
}

impl<T: Element, const D: usize> KdTree<T, D> {
    /// Builds a tree over `train_set` with the given bucket size. Fails if `train_set` is empty
    /// or `bucket_size` is zero; every other input is accepted (spec §4.10, §7).
    pub fn build(train_set: &DataSet<T, D>, bucket_size: usize) -> Result<Self, BuildError> {
        if train_set.is_empty() {
            return Err(BuildError::EmptyDataSet);
        }
        if bucket_size == 0 {
            return Err(BuildError::ZeroBucketSize(bucket_size));
        }
        let span = info_span!("build", n = train_set.size(), bucket_size);
        let _enter = span.enter();
        let (arena, dataset) = build_tree(train_set, bucket_size);
        Ok(Self {
            arena,
            dataset,
            bucket_size,
        })
    }

    pub fn size(&self) -> usize {
        self.dataset.size()
    }

    pub fn dataset(&self) -> &DataSet<T, D> {
        &self.dataset
    }

    /// Finds the `k` nearest neighbours of `query` under `metric`, sorted nearest-to-farthest.
    ///
    /// `epsilon` relaxes pruning by admitting subtrees up to `epsilon^2` farther than the exact
    /// bound (spec property P5/S5: every returned distance is within `epsilon^2` of the true
    /// k-th distance; `epsilon = T::Distance::zero()` is exact). `ignore_self` drops any match
    /// at exactly zero distance, for querying with a point already present in the tree (spec
    /// §4.9's ignore-self contract).
    ///
    /// `k = 0` returns an empty vector without touching the tree.
    pub fn knn<M: Metric<T, D>>(
        &self,
        query: &[T; D],
        k: usize,
        metric: &M,
        epsilon: T::Distance,
        ignore_self: bool,
    ) -> Vec<Neighbor<T::Distance>> {
        if k == 0 {
            return Vec::new();
        }
        let span = trace_span!("knn", k, ignore_self);
        let _enter = span.enter();
        let epsilon_squared = epsilon * epsilon;
        let mut hstate = HyperrectState::new(*query, epsilon_squared);
        if k > HEAP_CONTAINER_THRESHOLD {
            let best = BestKHeap::new(k);
            knn_search(&self.arena, &self.dataset, metric, &mut hstate, best, ignore_self)
                .into_sorted_vec()
        } else {
            let best = BestKVector::new(k);
            knn_search(&self.arena, &self.dataset, metric, &mut hstate, best, ignore_self)
                .into_sorted_vec()
        }
    }

    /// Returns every point within squared distance `r * r` of `query`, unordered (spec §4.10,
    /// property P6). Implemented as an intersect-only pass with the pruning threshold held fixed
    /// at `r^2` rather than shrinking as results are admitted.
    pub fn all_in_range<M: Metric<T, D>>(
        &self,
        query: &[T; D],
        r: T::Distance,
        metric: &M,
        ignore_self: bool,
    ) -> Vec<Neighbor<T::Distance>> {
        if r <= T::Distance::zero() {
            return Vec::new();
        }
        let span = trace_span!("all_in_range");
        let _enter = span.enter();
        let r_squared = r * r;
        let mut hstate = HyperrectState::new(*query, T::Distance::zero());
        range_search(&self.arena, &self.dataset, metric, &mut hstate, r_squared, ignore_self)
    }

    /// Top-down structural check of the split/leaf-size/coverage invariants (spec §4.10,
    /// optional; the three distinct failure shapes follow
    /// `examples/original_source/tools/verification_tool.h` rather than a single opaque error).
    pub fn verify(&self) -> Result<(), InvariantError> {
        let mut covered = vec![false; self.dataset.size()];
        self.verify_node(self.arena.root_ref(), 0, &mut Vec::new(), &mut covered)?;
        if let Some(gap) = covered.iter().position(|&c| !c) {
            return Err(InvariantError::CoverageGap {
                n: self.dataset.size(),
                detail: format!("permuted position {gap} is not covered by any leaf"),
            });
        }
        Ok(())
    }

    fn verify_node(
        &self,
        node: ChildRef,
        preorder: usize,
        ancestors: &mut Vec<(usize, T, bool)>,
        covered: &mut [bool],
    ) -> Result<usize, InvariantError> {
        match node {
            ChildRef::Leaf(i) => {
                let leaf = self.arena.leaves[i as usize];
                let count = leaf.num_elements as usize;
                if count == 0 || count > self.bucket_size {
                    return Err(InvariantError::LeafCountViolation {
                        node: preorder,
                        count,
                        bucket_size: self.bucket_size,
                    });
                }
                for p in leaf.first_index..(leaf.first_index + leaf.num_elements) {
                    let point = self.dataset.get_permuted(p);
                    for &(axis, split, is_left) in ancestors.iter() {
                        let value = point[axis];
                        let ok = if is_left { value <= split } else { value >= split };
                        if !ok {
                            return Err(InvariantError::SplitViolation {
                                node: preorder,
                                axis,
                                point: p as usize,
                                value: format!("{value:?}"),
                                split: format!("{split:?}"),
                                side: if is_left { "left" } else { "right" },
                            });
                        }
                    }
                    if covered[p as usize] {
                        return Err(InvariantError::CoverageGap {
                            n: self.dataset.size(),
                            detail: format!("permuted position {p} covered by more than one leaf"),
                        });
                    }
                    covered[p as usize] = true;
                }
                Ok(preorder + 1)
            }
            ChildRef::Stem(i) => {
                let stem = self.arena.stems[i as usize];
                let axis = stem.axis as usize;
                let mut next = preorder + 1;

                ancestors.push((axis, stem.split_value, true));
                next = self.verify_node(stem.left_ref(), next, ancestors, covered)?;
                ancestors.pop();

                ancestors.push((axis, stem.split_value, false));
                next = self.verify_node(stem.right_ref(), next, ancestors, covered)?;
                ancestors.pop();

                Ok(next)
            }
        }
    }

    /// Writes this tree's data set and topology in the self-describing binary format (spec §6).
    pub fn serialize<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        persistence::serialize_tree(out, &self.dataset, &self.arena)
    }

    /// Reads a tree previously written by [`Self::serialize`].
    pub fn deserialize<R: Read>(input: &mut R) -> Result<Self, DeserializationError> {
        let (dataset, arena) = persistence::deserialize_tree(input)?;
        let bucket_size = arena
            .leaves
            .iter()
            .map(|leaf| leaf.num_elements as usize)
            .max()
            .unwrap_or(DEFAULT_BUCKET_SIZE);
        Ok(Self {
            arena,
            dataset,
            bucket_size,
        })
    }

    /// Replaces `self` with a tree read from `input`, leaving `self` untouched if deserialization
    /// fails (spec §5's two-phase build-temporary-then-swap idiom).
    pub fn deserialize_into<R: Read>(&mut self, input: &mut R) -> Result<(), DeserializationError> {
        match Self::deserialize(input) {
            Ok(replacement) => {
                *self = replacement;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "tree deserialization failed, keeping existing tree");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::euclidean::Euclidean;

    fn sample_tree() -> KdTree<f64, 2> {
        let ds = DataSet::<f64, 2>::from_vectors(vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [2.0, 2.0],
        ]);
        KdTree::build(&ds, 1).unwrap()
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let ds = DataSet::<f64, 2>::empty();
        assert_eq!(KdTree::build(&ds, 1).unwrap_err(), BuildError::EmptyDataSet);
    }

    #[test]
    fn zero_bucket_size_is_rejected() {
        let ds = DataSet::<f64, 2>::from_vectors(vec![[0.0, 0.0]]);
        assert_eq!(
            KdTree::build(&ds, 0).unwrap_err(),
            BuildError::ZeroBucketSize(0)
        );
    }

    #[test]
    fn scenario_s1_tiny_deterministic_knn() {
        let tree = sample_tree();
        let metric = Euclidean;
        let result = tree.knn(&[0.9, 0.1], 2, &metric, 0.0, false);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].index, 1);
        assert!((result[0].distance - 0.02).abs() < 1e-9);
        assert_eq!(result[1].index, 3);
        assert!((result[1].distance - 0.82).abs() < 1e-9);
    }

    #[test]
    fn scenario_s2_all_in_range() {
        // r = 1.5, r^2 = 2.25: train[3] = (1,1) has d^2 = 2.0 <= 2.25 and is included by
        // P5's inclusive bound, alongside train[0..2]; train[4] = (2,2) has d^2 = 8 and is
        // the only point excluded.
        let tree = sample_tree();
        let metric = Euclidean;
        let mut result = tree.all_in_range(&[0.0, 0.0], 1.5, &metric, false);
        result.sort_by_key(|n| n.index);
        let pairs: Vec<(u32, f64)> = result.iter().map(|n| (n.index, n.distance)).collect();
        assert_eq!(pairs, vec![(0, 0.0), (1, 1.0), (2, 1.0), (3, 2.0)]);
    }

    #[test]
    fn scenario_s3_ignore_self() {
        let tree = sample_tree();
        let metric = Euclidean;
        let result = tree.knn(&[1.0, 1.0], 1, &metric, 0.0, true);
        assert_eq!(result.len(), 1);
        assert_ne!(result[0].index, 3);
        assert!(result[0].distance > 0.0);
    }

    #[test]
    fn knn_zero_returns_empty() {
        let tree = sample_tree();
        let metric = Euclidean;
        assert!(tree.knn(&[0.0, 0.0], 0, &metric, 0.0, false).is_empty());
    }

    #[test]
    fn verify_accepts_a_well_formed_tree() {
        let tree = sample_tree();
        assert!(tree.verify().is_ok());
    }

    #[test]
    fn large_k_uses_heap_container_and_agrees_with_small_k() {
        let mut vectors = Vec::new();
        for i in 0..100u32 {
            vectors.push([i as f64, (i * 7 % 13) as f64]);
        }
        let ds = DataSet::<f64, 2>::from_vectors(vectors);
        let tree = KdTree::build(&ds, 4).unwrap();
        let metric = Euclidean;
        let small = tree.knn(&[50.0, 5.0], 10, &metric, 0.0, false);
        let large = tree.knn(&[50.0, 5.0], 40, &metric, 0.0, false);
        assert!(large.len() > HEAP_CONTAINER_THRESHOLD - 10);
        let small_distances: Vec<f64> = small.iter().map(|n| n.distance).collect();
        let large_prefix: Vec<f64> = large.iter().take(10).map(|n| n.distance).collect();
        assert_eq!(small_distances, large_prefix);
    }
}
