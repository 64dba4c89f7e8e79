//! Flat (brute-force) nearest neighbor index.
//!
//! Keeps a copy of every record and answers searches by computing the
//! distance to all of them. Exact and simple; the baseline the HNSW index
//! is measured against.

use crate::distance::DistanceMetric;
use crate::error::{Result, VectorDbError};
use crate::index::{blob, SearchResult, VectorIndex};
use crate::record::VectorRecord;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default)]
struct FlatInner {
    records: HashMap<String, VectorRecord>,
    metric: Option<DistanceMetric>,
}

/// Serialized form of the index: records plus the metric tag.
#[derive(Serialize, Deserialize)]
struct FlatSnapshot {
    records: HashMap<String, VectorRecord>,
    metric: Option<DistanceMetric>,
}

/// Exhaustive-scan index over copies of the stored records.
#[derive(Debug, Default)]
pub struct FlatIndex {
    inner: RwLock<FlatInner>,
}

impl FlatIndex {
    /// Creates an empty index with the given metric (or none).
    pub fn new(metric: Option<DistanceMetric>) -> Self {
        Self {
            inner: RwLock::new(FlatInner {
                records: HashMap::new(),
                metric,
            }),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn build(&self, records: &[VectorRecord]) -> Result<()> {
        let mut inner = self.inner.write();
        inner.records.clear();
        for record in records {
            inner.records.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    fn add(&self, record: &VectorRecord) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.records.contains_key(&record.id) {
            return Err(VectorDbError::VectorAlreadyExists(record.id.clone()));
        }
        inner.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.records.remove(id).is_none() {
            return Err(VectorDbError::VectorNotFound(id.to_string()));
        }
        Ok(())
    }

    fn search(&self, query: &VectorRecord, k: usize) -> Result<Vec<SearchResult>> {
        let inner = self.inner.read();
        if inner.records.is_empty() {
            return Err(VectorDbError::EmptyIndex);
        }
        if k < 1 {
            return Err(VectorDbError::InvalidK(k));
        }
        let metric = inner.metric.ok_or(VectorDbError::MetricRequired)?;

        let mut results = Vec::with_capacity(inner.records.len());
        for (id, record) in &inner.records {
            let distance = metric.distance(query, record)?;
            results.push(SearchResult {
                id: id.clone(),
                vector: record.clone(),
                distance,
            });
        }

        // Ties broken by id so repeated queries are deterministic.
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(k.min(results.len()));
        Ok(results)
    }

    fn size(&self) -> usize {
        self.inner.read().records.len()
    }

    fn ids(&self) -> Vec<String> {
        self.inner.read().records.keys().cloned().collect()
    }

    fn save(&self, path: &Path) -> Result<()> {
        let inner = self.inner.read();
        let snapshot = FlatSnapshot {
            records: inner.records.clone(),
            metric: inner.metric,
        };
        let payload = bincode::serialize(&snapshot)
            .map_err(|e| VectorDbError::corrupted(format!("flat index serialize: {e}")))?;
        blob::write(path, &payload)
    }

    fn load(&self, path: &Path) -> Result<()> {
        let payload = blob::read(path)?;
        let snapshot: FlatSnapshot = bincode::deserialize(&payload)
            .map_err(|e| VectorDbError::corrupted(format!("flat index deserialize: {e}")))?;

        let mut inner = self.inner.write();
        inner.records = snapshot.records;
        // The persisted metric only applies when the caller has not set one.
        if inner.metric.is_none() {
            inner.metric = snapshot.metric;
        }
        Ok(())
    }

    fn set_metric(&self, metric: DistanceMetric) {
        self.inner.write().metric = Some(metric);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, values: &[f32]) -> VectorRecord {
        VectorRecord::new(id, values.to_vec())
    }

    fn euclidean_index(records: &[VectorRecord]) -> FlatIndex {
        let index = FlatIndex::new(Some(DistanceMetric::Euclidean));
        index.build(records).unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = euclidean_index(&[
            rec("v1", &[1.0, 0.0, 0.0]),
            rec("v2", &[2.0, 0.0, 0.0]),
            rec("v3", &[3.0, 0.0, 0.0]),
        ]);

        let results = index.search(&rec("q", &[0.0, 0.0, 0.0]), 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "v1");
        assert!((results[0].distance - 1.0).abs() < 1e-6);
        assert_eq!(results[1].id, "v2");
        assert!((results[1].distance - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_full_sort_prefix_property() {
        let records: Vec<_> = (0..20)
            .map(|i| rec(&format!("v{i:02}"), &[(i as f32) * 0.5, 1.0]))
            .collect();
        let index = euclidean_index(&records);
        let query = rec("q", &[3.0, 0.0]);

        let full = index.search(&query, records.len()).unwrap();
        assert_eq!(full.len(), records.len());
        for w in full.windows(2) {
            assert!(w[0].distance <= w[1].distance);
        }
        for k in [1, 3, 7, 20] {
            let prefix = index.search(&query, k).unwrap();
            assert_eq!(prefix.len(), k.min(full.len()));
            for (a, b) in prefix.iter().zip(&full) {
                assert_eq!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_search_k_larger_than_size() {
        let index = euclidean_index(&[rec("only", &[1.0])]);
        let results = index.search(&rec("q", &[0.0]), 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_search_empty_index() {
        let index = FlatIndex::new(Some(DistanceMetric::Euclidean));
        assert!(matches!(
            index.search(&rec("q", &[1.0]), 1).unwrap_err(),
            VectorDbError::EmptyIndex
        ));
    }

    #[test]
    fn test_search_invalid_k() {
        let index = euclidean_index(&[rec("v1", &[1.0])]);
        assert!(matches!(
            index.search(&rec("q", &[1.0]), 0).unwrap_err(),
            VectorDbError::InvalidK(0)
        ));
    }

    #[test]
    fn test_search_without_metric() {
        let index = FlatIndex::new(None);
        index.build(&[rec("v1", &[1.0])]).unwrap();
        assert!(matches!(
            index.search(&rec("q", &[1.0]), 1).unwrap_err(),
            VectorDbError::MetricRequired
        ));
    }

    #[test]
    fn test_search_dimension_mismatch_propagates() {
        let index = euclidean_index(&[rec("v1", &[1.0, 2.0])]);
        assert!(matches!(
            index.search(&rec("q", &[1.0]), 1).unwrap_err(),
            VectorDbError::InvalidDimension { .. }
        ));
    }

    #[test]
    fn test_build_is_destructive() {
        let index = euclidean_index(&[rec("old", &[1.0])]);
        index.build(&[rec("new", &[2.0])]).unwrap();
        assert_eq!(index.size(), 1);
        assert_eq!(index.ids(), vec!["new"]);
    }

    #[test]
    fn test_add_delete() {
        let index = FlatIndex::new(Some(DistanceMetric::Euclidean));
        index.add(&rec("v1", &[1.0])).unwrap();
        assert!(matches!(
            index.add(&rec("v1", &[1.0])).unwrap_err(),
            VectorDbError::VectorAlreadyExists(_)
        ));
        index.delete("v1").unwrap();
        assert!(index.delete("v1").unwrap_err().is_not_found());
        assert_eq!(index.size(), 0);
    }

    #[test]
    fn test_results_are_copies() {
        let index = euclidean_index(&[rec("v1", &[1.0, 2.0])]);
        let mut results = index.search(&rec("q", &[0.0, 0.0]), 1).unwrap();
        results[0].vector.values[0] = 42.0;
        let fresh = index.search(&rec("q", &[0.0, 0.0]), 1).unwrap();
        assert_eq!(fresh[0].vector.values[0], 1.0);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.idx");

        let index = euclidean_index(&[rec("a", &[1.0, 0.0]), rec("b", &[0.0, 1.0])]);
        index.save(&path).unwrap();

        let loaded = FlatIndex::new(None);
        loaded.load(&path).unwrap();
        assert_eq!(loaded.size(), 2);
        let mut ids = loaded.ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        // Metric adopted from the blob since none was set
        let results = loaded.search(&rec("q", &[1.0, 0.0]), 2).unwrap();
        assert_eq!(results[0].id, "a");
    }

    #[test]
    fn test_load_keeps_caller_metric() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.idx");

        let index = euclidean_index(&[rec("a", &[1.0, 0.0])]);
        index.save(&path).unwrap();

        let loaded = FlatIndex::new(Some(DistanceMetric::Manhattan));
        loaded.load(&path).unwrap();
        let results = loaded.search(&rec("q", &[0.0, 2.0]), 1).unwrap();
        // Manhattan distance (1 + 2), not euclidean sqrt(5)
        assert!((results[0].distance - 3.0).abs() < 1e-6);
    }
}
