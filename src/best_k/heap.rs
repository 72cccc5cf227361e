//! Large-K best-K container: two [`IndirectHeap`]s (one max, one min) over a shared backing
//! array of records (spec §4.5). The max-heap's root is always the current worst admitted
//! neighbour (eviction candidate); the min-heap's root is the current best.
use super::BestK;
use crate::indirect_heap::{HeapCompare, IndirectHeap};
use crate::nearest_neighbour::Neighbor;
use crate::traits::ElementDistance;

struct MaxByDistance;
impl<D: ElementDistance> HeapCompare<Neighbor<D>> for MaxByDistance {
    fn before(&self, a: &Neighbor<D>, b: &Neighbor<D>) -> bool {
        a.distance > b.distance
    }
}

struct MinByDistance;
impl<D: ElementDistance> HeapCompare<Neighbor<D>> for MinByDistance {
    fn before(&self, a: &Neighbor<D>, b: &Neighbor<D>) -> bool {
        a.distance < b.distance
    }
}

pub struct BestKHeap<D: ElementDistance> {
    capacity: usize,
    records: Vec<Neighbor<D>>,
    max_heap: IndirectHeap<Neighbor<D>, MaxByDistance>,
    min_heap: IndirectHeap<Neighbor<D>, MinByDistance>,
}

impl<D: ElementDistance> BestKHeap<D> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Vec::with_capacity(capacity),
            max_heap: IndirectHeap::new(capacity, MaxByDistance),
            min_heap: IndirectHeap::new(capacity, MinByDistance),
        }
    }
}

impl<D: ElementDistance> BestK<D> for BestKHeap<D> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn worst_distance(&self) -> Option<D> {
        self.max_heap
            .top_index()
            .map(|i| self.records[i as usize].distance)
    }

    fn push(&mut self, candidate: Neighbor<D>) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() < self.capacity {
            let idx = self.records.len() as u32;
            self.records.push(candidate);
            self.max_heap.push(idx, &self.records);
            self.min_heap.push(idx, &self.records);
            return;
        }
        let worst_idx = match self.max_heap.top_index() {
            Some(i) => i,
            None => return,
        };
        if candidate.distance >= self.records[worst_idx as usize].distance {
            return;
        }
        self.max_heap.remove(worst_idx, &self.records);
        self.min_heap.remove(worst_idx, &self.records);
        self.records[worst_idx as usize] = candidate;
        self.max_heap.push(worst_idx, &self.records);
        self.min_heap.push(worst_idx, &self.records);
    }

    fn into_sorted_vec(self) -> Vec<Neighbor<D>> {
        let mut items = self.records;
        items.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        items
    }
}
