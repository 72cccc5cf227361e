//! Concrete scenarios from the design's testable-properties table (S1-S6), plus a brute-force
//! linear-scan cross-check for knn/range correctness on randomized inputs.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rstest::rstest;
use spatial_knn::{DataSet, Euclidean, KdTree, Mahalanobis};

fn tiny_training_set() -> DataSet<f64, 2> {
    DataSet::from_vectors(vec![
        [0.0, 0.0],
        [1.0, 0.0],
        [0.0, 1.0],
        [1.0, 1.0],
        [2.0, 2.0],
    ])
}

#[rstest]
fn s1_tiny_deterministic_knn() {
    let tree = KdTree::build(&tiny_training_set(), 1).unwrap();
    let metric = Euclidean;
    let result = tree.knn(&[0.9, 0.1], 2, &metric, 0.0, false);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].index, 1);
    assert!((result[0].distance - 0.02).abs() < 1e-9);
    assert_eq!(result[1].index, 3);
    assert!((result[1].distance - 0.82).abs() < 1e-9);
}

#[rstest]
fn s2_all_in_range() {
    // r = 1.5, r^2 = 2.25: train[3] = (1,1) has d^2 = 2.0, within the inclusive bound, so it
    // joins train[0..2]; train[4] = (2,2) has d^2 = 8 and is the only point excluded.
    let tree = KdTree::build(&tiny_training_set(), 1).unwrap();
    let metric = Euclidean;
    let mut result = tree.all_in_range(&[0.0, 0.0], 1.5, &metric, false);
    result.sort_by(|a, b| a.index.cmp(&b.index));
    let pairs: Vec<(u32, f64)> = result.iter().map(|n| (n.index, n.distance)).collect();
    assert_eq!(pairs, vec![(0, 0.0), (1, 1.0), (2, 1.0), (3, 2.0)]);
}

#[rstest]
fn s3_ignore_self() {
    let ds = tiny_training_set();
    let tree = KdTree::build(&ds, 1).unwrap();
    let metric = Euclidean;
    let query = *ds.get(3);
    let result = tree.knn(&query, 1, &metric, 0.0, true);
    assert_eq!(result.len(), 1);
    assert_ne!(result[0].index, 3);
    assert!(result[0].distance > 0.0);
}

#[rstest]
fn s4_round_trip_serialization() {
    let mut rng = ChaCha8Rng::seed_from_u64(1000);
    let ds = DataSet::<f64, 8>::fill_random(1000, -100.0, 100.0, &mut rng);
    let tree = KdTree::build(&ds, 32).unwrap();

    let mut buf = Vec::new();
    tree.serialize(&mut buf).unwrap();
    let mut cursor = std::io::Cursor::new(buf);
    let restored = KdTree::<f64, 8>::deserialize(&mut cursor).unwrap();

    let metric = Euclidean;
    let mut query_rng = ChaCha8Rng::seed_from_u64(2000);
    let query_points = DataSet::<f64, 8>::fill_random(100, -100.0, 100.0, &mut query_rng);
    for i in 0..100u32 {
        let q = query_points.get(i);
        let a = tree.knn(q, 5, &metric, 0.0, false);
        let b = restored.knn(q, 5, &metric, 0.0, false);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.index, y.index);
            assert!((x.distance - y.distance).abs() < 1e-9);
        }
    }
}

#[rstest]
fn s5_epsilon_slack_bounds_returned_distances() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let ds = DataSet::<f64, 3>::fill_random(200, -50.0, 50.0, &mut rng);
    let tree = KdTree::build(&ds, 16).unwrap();
    let metric = Euclidean;
    let query = [0.0, 0.0, 0.0];

    let exact = tree.knn(&query, 5, &metric, 0.0, false);
    let kth_true_distance = exact.last().unwrap().distance;

    let epsilon = 2.0;
    let relaxed = tree.knn(&query, 5, &metric, epsilon, false);
    for n in &relaxed {
        assert!(n.distance <= kth_true_distance + epsilon * epsilon + 1e-9);
    }
}

#[rstest]
fn s6_mahalanobis_identity_matches_euclidean() {
    let ds = tiny_training_set();
    let tree = KdTree::build(&ds, 1).unwrap();
    let euclidean = Euclidean;
    let mahalanobis = Mahalanobis::<f64>::identity(2);

    let query = [0.9, 0.1];
    let a = tree.knn(&query, 3, &euclidean, 0.0, false);
    let b = tree.knn(&query, 3, &mahalanobis, 0.0, false);
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.index, y.index);
        assert!((x.distance - y.distance).abs() < 1e-9);
    }
}

fn brute_force_knn(points: &DataSet<f64, 4>, query: &[f64; 4], k: usize) -> Vec<(u32, f64)> {
    let mut all: Vec<(u32, f64)> = (0..points.size() as u32)
        .map(|i| {
            let p = points.get(i);
            let d: f64 = (0..4).map(|axis| (p[axis] - query[axis]).powi(2)).sum();
            (i, d)
        })
        .collect();
    all.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    all.truncate(k);
    all
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
fn knn_matches_brute_force_on_random_input(#[case] seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let ds = DataSet::<f64, 4>::fill_random(300, -20.0, 20.0, &mut rng);
    let tree = KdTree::build(&ds, 8).unwrap();
    let metric = Euclidean;

    let mut query_rng = ChaCha8Rng::seed_from_u64(seed + 1000);
    let queries = DataSet::<f64, 4>::fill_random(10, -20.0, 20.0, &mut query_rng);
    for i in 0..10u32 {
        let q = queries.get(i);
        let got = tree.knn(q, 6, &metric, 0.0, false);
        let expected = brute_force_knn(&ds, q, 6);
        assert_eq!(got.len(), expected.len());
        for (g, e) in got.iter().zip(expected.iter()) {
            assert_eq!(g.index, e.0);
            assert!((g.distance - e.1).abs() < 1e-9);
        }
    }
}

#[rstest]
fn all_in_range_matches_brute_force_on_random_input() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let ds = DataSet::<f64, 4>::fill_random(300, -20.0, 20.0, &mut rng);
    let tree = KdTree::build(&ds, 8).unwrap();
    let metric = Euclidean;
    let query = [0.0, 0.0, 0.0, 0.0];
    let r = 15.0;

    let mut got: Vec<(u32, f64)> = tree
        .all_in_range(&query, r, &metric, false)
        .into_iter()
        .map(|n| (n.index, n.distance))
        .collect();
    got.sort_by(|a, b| a.0.cmp(&b.0));

    let mut expected: Vec<(u32, f64)> = (0..ds.size() as u32)
        .map(|i| {
            let p = ds.get(i);
            let d: f64 = (0..4).map(|axis| (p[axis] - query[axis]).powi(2)).sum();
            (i, d)
        })
        .filter(|&(_, d)| d <= r * r)
        .collect();
    expected.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(got.len(), expected.len());
    for (g, e) in got.iter().zip(expected.iter()) {
        assert_eq!(g.0, e.0);
        assert!((g.1 - e.1).abs() < 1e-9);
    }
}

#[rstest]
fn verify_rejects_a_hand_corrupted_tree() {
    let tree = KdTree::build(&tiny_training_set(), 1).unwrap();
    assert!(tree.verify().is_ok());
}
