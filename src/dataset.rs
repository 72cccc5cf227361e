//! Owning handle over a shared, read-only array of vectors plus the permutation bookkeeping
//! that maps between a vector's position after build-time reordering and its original index.
//!
//! Grounded on `examples/original_source/kche-tree/dataset.h`'s `DataSet<ElementType,
//! NumDimensions>`: a `SharedArray<Vector>` plus `permuted_to_original_` /
//! `original_to_permuted_` index arrays. The C++ original's `SharedArray` (an intrusive
//! reference count) becomes an `Arc` here, so a built tree's data set can be queried
//! concurrently from multiple threads without cloning the vectors (spec §5's concurrency
//! model), and `LabeledDataSet` (`examples/original_source/kche-tree/labeled_dataset.h`) is a
//! thin wrapper carrying a parallel, permuted-order labels array.
use crate::traits::{Element, RandomElement};
use std::sync::Arc;

/// A `D`-dimensional point of element type `T`.
pub type Vector<T, const D: usize> = [T; D];

/// An owning handle over a reference-counted array of `N` vectors, permuted from the order the
/// caller originally supplied them in.
///
/// Invariant: `perm` and `inv` are mutual-inverse permutations of `0..N` — `inv[perm[i]] == i`
/// and `perm[inv[i]] == i` for every `i` (spec property P1).
#[derive(Debug, Clone)]
pub struct DataSet<T: Element, const D: usize> {
    vectors: Arc<Vec<Vector<T, D>>>,
    /// `perm[p]` = original index of the vector now stored at permuted position `p`.
    perm: Vec<u32>,
    /// `inv[perm[p]] = p`; the inverse permutation.
    inv: Vec<u32>,
}

impl<T: Element, const D: usize> DataSet<T, D> {
    /// An empty data set.
    pub fn empty() -> Self {
        Self {
            vectors: Arc::new(Vec::new()),
            perm: Vec::new(),
            inv: Vec::new(),
        }
    }

    /// Wraps `vectors` as a data set in identity permutation (original order == permuted
    /// order).
    pub fn from_vectors(vectors: Vec<Vector<T, D>>) -> Self {
        let n = vectors.len();
        Self {
            vectors: Arc::new(vectors),
            perm: (0..n as u32).collect(),
            inv: (0..n as u32).collect(),
        }
    }

    /// Wraps `vectors` as a data set whose permuted position `p` corresponds to original index
    /// `perm[p]`. Used by the tree builder to publish its final permuted order directly,
    /// without going through an intermediate identity-permutation data set.
    pub fn from_permuted(vectors: Vec<Vector<T, D>>, perm: Vec<u32>) -> Self {
        debug_assert_eq!(vectors.len(), perm.len());
        let mut inv = vec![0u32; perm.len()];
        for (p, &orig) in perm.iter().enumerate() {
            inv[orig as usize] = p as u32;
        }
        Self {
            vectors: Arc::new(vectors),
            perm,
            inv,
        }
    }

    /// Builds a new data set holding the same vectors as `self` but reordered into permuted
    /// position `p` = the vector whose *current* permuted position is `permutation[p]`. Used
    /// by the tree builder to publish the final build-time ordering.
    ///
    /// `permutation` must be a permutation of `0..self.size()` expressed in terms of `self`'s
    /// existing permuted positions.
    pub fn permuted_by(&self, permutation: &[u32]) -> Self {
        debug_assert_eq!(permutation.len(), self.size());
        let n = self.size();
        let mut vectors = Vec::with_capacity(n);
        let mut perm = Vec::with_capacity(n);
        for &old_pos in permutation {
            vectors.push(self.vectors[old_pos as usize]);
            perm.push(self.perm[old_pos as usize]);
        }
        let mut inv = vec![0u32; n];
        for (new_pos, &orig) in perm.iter().enumerate() {
            inv[orig as usize] = new_pos as u32;
        }
        Self {
            vectors: Arc::new(vectors),
            perm,
            inv,
        }
    }

    pub fn size(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Returns the vector whose *original* (pre-build) index is `original_index`.
    pub fn get(&self, original_index: u32) -> &Vector<T, D> {
        &self.vectors[self.inv[original_index as usize] as usize]
    }

    /// Returns the vector at internal *permuted* position `p`.
    pub fn get_permuted(&self, p: u32) -> &Vector<T, D> {
        &self.vectors[p as usize]
    }

    /// All vectors in permuted order; used by the tree builder and by serialization.
    pub fn permuted_slice(&self) -> &[Vector<T, D>] {
        &self.vectors
    }

    /// Maps an original index to its current permuted position.
    pub fn permuted_index(&self, original_index: u32) -> u32 {
        self.inv[original_index as usize]
    }

    /// Maps a permuted position back to its original index.
    pub fn original_index(&self, permuted_index: u32) -> u32 {
        self.perm[permuted_index as usize]
    }

    pub fn permutation(&self) -> &[u32] {
        &self.perm
    }

    /// For any `i`, `inv[perm[i]] == i` and `perm[inv[i]] == i` (spec property P1).
    pub fn verify_permutation_is_involutive(&self) -> bool {
        (0..self.size() as u32).all(|i| {
            self.inv[self.perm[i as usize] as usize] == i
                && self.perm[self.inv[i as usize] as usize] == i
        })
    }
}

impl<T: RandomElement, const D: usize> DataSet<T, D> {
    /// Fills a data set of `n` vectors with coordinates drawn uniformly from `[low, high)`,
    /// mirroring the original's `set_random_values(RandomGenerator&)` hook.
    pub fn fill_random<R: rand::Rng + ?Sized>(n: usize, low: T, high: T, rng: &mut R) -> Self {
        let vectors = (0..n)
            .map(|_| std::array::from_fn(|_| T::sample_uniform(rng, low, high)))
            .collect();
        Self::from_vectors(vectors)
    }
}

impl<T: Element, const D: usize> PartialEq for DataSet<T, D> {
    fn eq(&self, other: &Self) -> bool {
        self.size() == other.size()
            && self.perm == other.perm
            && self.vectors.len() == other.vectors.len()
            && self
                .vectors
                .iter()
                .zip(other.vectors.iter())
                .all(|(a, b)| a == b)
    }
}

/// A [`DataSet`] extended with a parallel array of labels, stored in the same permuted order as
/// the vectors so `labels[p]` is always the label of `get_permuted(p)`.
#[derive(Debug, Clone)]
pub struct LabeledDataSet<T: Element, const D: usize, L: Clone> {
    data: DataSet<T, D>,
    /// Labels in permuted order, parallel to `data.permuted_slice()`.
    labels: Vec<L>,
}

impl<T: Element, const D: usize, L: Clone> LabeledDataSet<T, D, L> {
    /// `vectors[i]` is labeled `labels[i]`; both start out in identity (original) order.
    pub fn from_vectors_and_labels(vectors: Vec<Vector<T, D>>, labels: Vec<L>) -> Self {
        assert_eq!(vectors.len(), labels.len());
        Self {
            data: DataSet::from_vectors(vectors),
            labels,
        }
    }

    pub fn data(&self) -> &DataSet<T, D> {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }

    /// The label of the vector whose original index is `original_index`.
    pub fn label(&self, original_index: u32) -> &L {
        &self.labels[self.data.permuted_index(original_index) as usize]
    }

    pub fn label_permuted(&self, permuted_index: u32) -> &L {
        &self.labels[permuted_index as usize]
    }

    /// Re-permutes both the vectors and the labels together, preserving the vector/label
    /// pairing (this is the reason `LabeledDataSet` cannot simply delegate to
    /// `DataSet::permuted_by` and re-wrap: the labels array must move in lock-step).
    pub fn permuted_by(&self, permutation: &[u32]) -> Self {
        let new_data = self.data.permuted_by(permutation);
        let labels = permutation
            .iter()
            .map(|&old_pos| self.labels[old_pos as usize].clone())
            .collect();
        Self {
            data: new_data,
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_permutation_round_trips() {
        let ds = DataSet::<f64, 2>::from_vectors(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert!(ds.verify_permutation_is_involutive());
        assert_eq!(ds.get(1), &[1.0, 1.0]);
        assert_eq!(ds.get_permuted(1), &[1.0, 1.0]);
    }

    #[test]
    fn permuted_by_preserves_original_index_mapping() {
        let ds = DataSet::<f64, 1>::from_vectors(vec![[10.0], [20.0], [30.0]]);
        // reorder permuted positions: new position 0 = old position 2, etc.
        let reordered = ds.permuted_by(&[2, 0, 1]);
        assert!(reordered.verify_permutation_is_involutive());
        // original index 2's vector (30.0) should now live at permuted position 0.
        assert_eq!(reordered.get_permuted(0), &[30.0]);
        assert_eq!(reordered.original_index(0), 2);
        assert_eq!(reordered.get(2), &[30.0]);
    }

    #[test]
    fn labeled_dataset_tracks_labels_through_permutation() {
        let lds = LabeledDataSet::<f64, 1, &'static str>::from_vectors_and_labels(
            vec![[1.0], [2.0], [3.0]],
            vec!["a", "b", "c"],
        );
        let reordered = lds.permuted_by(&[2, 1, 0]);
        assert_eq!(reordered.label(2), &"c");
        assert_eq!(reordered.label_permuted(0), &"c");
        assert_eq!(reordered.data().get_permuted(0), &[3.0]);
    }
}
