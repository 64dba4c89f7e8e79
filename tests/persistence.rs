//! Persistence round-trips for both index implementations through the
//! shared `VectorIndex` contract.

use vectorsql::distance::DistanceMetric;
use vectorsql::index::{FlatIndex, HnswConfig, HnswIndex, VectorIndex};
use vectorsql::record::VectorRecord;

fn sample_records(n: usize) -> Vec<VectorRecord> {
    (0..n)
        .map(|i| {
            VectorRecord::new(
                format!("rec{i:03}"),
                vec![(i as f32).sin(), (i as f32).cos(), (i % 7) as f32],
            )
        })
        .collect()
}

fn assert_same_ids(a: &dyn VectorIndex, b: &dyn VectorIndex) {
    let mut lhs = a.ids();
    let mut rhs = b.ids();
    lhs.sort();
    rhs.sort();
    assert_eq!(lhs, rhs);
}

fn assert_same_search(a: &dyn VectorIndex, b: &dyn VectorIndex, query: &VectorRecord, k: usize) {
    let lhs = a.search(query, k).unwrap();
    let rhs = b.search(query, k).unwrap();
    assert_eq!(lhs.len(), rhs.len());
    for (x, y) in lhs.iter().zip(&rhs) {
        assert_eq!(x.id, y.id);
        assert!((x.distance - y.distance).abs() < 1e-6);
        assert_eq!(x.vector, y.vector);
    }
}

#[test]
fn flat_index_roundtrips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.idx");

    let index = FlatIndex::new(Some(DistanceMetric::Cosine));
    index.build(&sample_records(40)).unwrap();
    index.save(&path).unwrap();

    let loaded = FlatIndex::new(None);
    loaded.load(&path).unwrap();

    assert_eq!(loaded.size(), 40);
    assert_same_ids(&index, &loaded);
    assert_same_search(&index, &loaded, &VectorRecord::new("q", vec![0.3, -0.2, 2.0]), 10);
}

#[test]
fn hnsw_index_roundtrips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hnsw.idx");

    let index = HnswIndex::with_seed(Some(DistanceMetric::Euclidean), HnswConfig::default(), 21);
    index.build(&sample_records(80)).unwrap();
    index.save(&path).unwrap();

    let loaded = HnswIndex::with_defaults(None);
    loaded.load(&path).unwrap();

    assert_eq!(loaded.size(), 80);
    assert_same_ids(&index, &loaded);
    for k in [1, 5, 20] {
        assert_same_search(
            &index,
            &loaded,
            &VectorRecord::new("q", vec![0.5, 0.5, 3.0]),
            k,
        );
    }
}

#[test]
fn hnsw_tombstones_survive_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hnsw.idx");

    let index = HnswIndex::with_seed(Some(DistanceMetric::Euclidean), HnswConfig::default(), 3);
    index.build(&sample_records(30)).unwrap();
    index.delete("rec005").unwrap();
    index.delete("rec006").unwrap();
    index.save(&path).unwrap();

    let loaded = HnswIndex::with_defaults(None);
    loaded.load(&path).unwrap();

    assert_eq!(loaded.size(), 28);
    let results = loaded
        .search(&VectorRecord::new("q", vec![0.0, 1.0, 5.0]), 28)
        .unwrap();
    assert!(results.iter().all(|r| r.id != "rec005" && r.id != "rec006"));
}

#[test]
fn loaded_index_accepts_further_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hnsw.idx");

    let index = HnswIndex::with_seed(Some(DistanceMetric::Euclidean), HnswConfig::default(), 9);
    index.build(&sample_records(20)).unwrap();
    index.save(&path).unwrap();

    let loaded = HnswIndex::with_defaults(None);
    loaded.load(&path).unwrap();
    loaded
        .add(&VectorRecord::new("fresh", vec![9.0, 9.0, 9.0]))
        .unwrap();
    assert_eq!(loaded.size(), 21);

    let results = loaded
        .search(&VectorRecord::new("q", vec![9.0, 9.0, 9.0]), 1)
        .unwrap();
    assert_eq!(results[0].id, "fresh");
}

#[test]
fn save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("idx.bin");

    let index = FlatIndex::new(Some(DistanceMetric::Euclidean));
    index.build(&sample_records(5)).unwrap();
    index.save(&path).unwrap();

    index.build(&sample_records(9)).unwrap();
    index.save(&path).unwrap();

    let loaded = FlatIndex::new(None);
    loaded.load(&path).unwrap();
    assert_eq!(loaded.size(), 9);
}
