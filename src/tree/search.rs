//! Recursive explore/intersect search (spec §4.9 "Explore"/"Intersect") driven by the
//! incremental hyperrect updater (C8).
use crate::best_k::BestK;
use crate::dataset::DataSet;
use crate::distance_metric::Metric;
use crate::hyperrect::HyperrectState;
use crate::nearest_neighbour::Neighbor;
use crate::traits::{Element, ElementDistance};
use crate::tree::node::TreeArena;
use crate::types::ChildRef;

/// Runs a bounded-K search from the root, filling `best` with the closest neighbours to
/// `hstate`'s query point. Returns `best` once the whole tree has been visited or pruned away.
///
/// The explore/intersect distinction in the spec is a description of behaviour, not a separate
/// code path here: at every stem, whether a child's descent is pruning-checked ("intersect") or
/// unconditional ("explore") is decided fresh by whether `best` is currently full, exactly as
/// spec §4.9 describes ("depending on whether the container is full").
pub fn knn_search<T, const D: usize, M, C>(
    arena: &TreeArena<T>,
    dataset: &DataSet<T, D>,
    metric: &M,
    hstate: &mut HyperrectState<T, D>,
    mut best: C,
    ignore_self: bool,
) -> C
where
    T: Element,
    M: Metric<T, D>,
    C: BestK<T::Distance>,
{
    visit(arena, dataset, metric, hstate, &mut best, ignore_self, arena.root_ref());
    best
}

fn visit<T, const D: usize, M, C>(
    arena: &TreeArena<T>,
    dataset: &DataSet<T, D>,
    metric: &M,
    hstate: &mut HyperrectState<T, D>,
    best: &mut C,
    ignore_self: bool,
    node: ChildRef,
) where
    T: Element,
    M: Metric<T, D>,
    C: BestK<T::Distance>,
{
    match node {
        ChildRef::Leaf(i) => {
            visit_leaf(arena, dataset, metric, hstate.query(), best, ignore_self, i);
        }
        ChildRef::Stem(i) => {
            let stem = &arena.stems[i as usize];
            let axis = stem.axis as usize;
            let split = stem.split_value;
            let query_coord = hstate.query()[axis];

            let (near, far) = if query_coord <= split {
                (stem.left, stem.right)
            } else {
                (stem.right, stem.left)
            };

            let near_token = hstate.enter(axis, split, false, metric);
            descend(arena, dataset, metric, hstate, best, ignore_self, ChildRef::from_raw(near));
            hstate.exit(near_token, metric);

            let far_token = hstate.enter(axis, split, true, metric);
            descend(arena, dataset, metric, hstate, best, ignore_self, ChildRef::from_raw(far));
            hstate.exit(far_token, metric);
        }
    }
}

fn descend<T, const D: usize, M, C>(
    arena: &TreeArena<T>,
    dataset: &DataSet<T, D>,
    metric: &M,
    hstate: &mut HyperrectState<T, D>,
    best: &mut C,
    ignore_self: bool,
    node: ChildRef,
) where
    T: Element,
    M: Metric<T, D>,
    C: BestK<T::Distance>,
{
    if best.is_full() {
        // Intersect mode: prune the whole subtree if its bounding box is already no closer
        // than the current worst admitted candidate.
        if let Some(worst) = best.worst_distance() {
            if hstate.distance >= worst {
                return;
            }
        }
    }
    visit(arena, dataset, metric, hstate, best, ignore_self, node);
}

fn visit_leaf<T, const D: usize, M, C>(
    arena: &TreeArena<T>,
    dataset: &DataSet<T, D>,
    metric: &M,
    query: &[T; D],
    best: &mut C,
    ignore_self: bool,
    leaf_index: u32,
) where
    T: Element,
    M: Metric<T, D>,
    C: BestK<T::Distance>,
{
    let leaf = arena.leaves[leaf_index as usize];
    for p in leaf.first_index..(leaf.first_index + leaf.num_elements) {
        let point = dataset.get_permuted(p);
        let bound = best.worst_distance().unwrap_or_else(T::Distance::max_value);
        let distance = metric.distance_bounded(query, point, bound);
        if best.is_full() && distance >= bound {
            continue;
        }
        if ignore_self && distance.is_zero() {
            continue;
        }
        best.push(Neighbor {
            index: dataset.original_index(p),
            distance,
        });
    }
}

/// Collects every point within squared radius `r_squared` of the query (spec §4.9's
/// all-in-range: a search fixed to intersect-style pruning from the root, with the pruning
/// threshold held constant at `r_squared` instead of shrinking to the current worst admitted
/// candidate). Output is unordered (spec §4.10). A leaf point at exactly `distance ==
/// r_squared` is included (spec property P5's `<=`), matching
/// `examples/original_source/trunk/kd-tree.cpp`'s `kd_leaf::intersect`, which keeps equality
/// deliberately for this operation; the coarser subtree-level prune above stays strict (`>=`),
/// same as the original's `kd_node::intersect`, since only the final per-point check needs the
/// boundary case.
pub fn range_search<T, const D: usize, M>(
    arena: &TreeArena<T>,
    dataset: &DataSet<T, D>,
    metric: &M,
    hstate: &mut HyperrectState<T, D>,
    r_squared: T::Distance,
    ignore_self: bool,
) -> Vec<Neighbor<T::Distance>>
where
    T: Element,
    M: Metric<T, D>,
{
    let mut out = Vec::new();
    range_visit(
        arena,
        dataset,
        metric,
        hstate,
        r_squared,
        ignore_self,
        arena.root_ref(),
        &mut out,
    );
    out
}

fn range_visit<T, const D: usize, M>(
    arena: &TreeArena<T>,
    dataset: &DataSet<T, D>,
    metric: &M,
    hstate: &mut HyperrectState<T, D>,
    r_squared: T::Distance,
    ignore_self: bool,
    node: ChildRef,
    out: &mut Vec<Neighbor<T::Distance>>,
) where
    T: Element,
    M: Metric<T, D>,
{
    if hstate.distance >= r_squared {
        return;
    }
    match node {
        ChildRef::Leaf(i) => {
            let leaf = arena.leaves[i as usize];
            let query = *hstate.query();
            for p in leaf.first_index..(leaf.first_index + leaf.num_elements) {
                let point = dataset.get_permuted(p);
                let distance = metric.distance_bounded(&query, point, r_squared);
                if distance > r_squared {
                    continue;
                }
                if ignore_self && distance.is_zero() {
                    continue;
                }
                out.push(Neighbor {
                    index: dataset.original_index(p),
                    distance,
                });
            }
        }
        ChildRef::Stem(i) => {
            let stem = arena.stems[i as usize];
            let axis = stem.axis as usize;
            let split = stem.split_value;
            let query_coord = hstate.query()[axis];
            let (near, far) = if query_coord <= split {
                (stem.left, stem.right)
            } else {
                (stem.right, stem.left)
            };

            let near_token = hstate.enter(axis, split, false, metric);
            range_visit(
                arena,
                dataset,
                metric,
                hstate,
                r_squared,
                ignore_self,
                ChildRef::from_raw(near),
                out,
            );
            hstate.exit(near_token, metric);

            let far_token = hstate.enter(axis, split, true, metric);
            range_visit(
                arena,
                dataset,
                metric,
                hstate,
                r_squared,
                ignore_self,
                ChildRef::from_raw(far),
                out,
            );
            hstate.exit(far_token, metric);
        }
    }
}
