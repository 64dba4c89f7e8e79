//! HNSW search: single-layer best-first frontier and multi-layer k-NN.

use crate::error::{Result, VectorDbError};
use crate::index::hnsw::graph::{HnswIndex, HnswInner};
use crate::index::SearchResult;
use crate::record::VectorRecord;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// A graph node paired with its distance from the query.
#[derive(Debug, Clone)]
pub(crate) struct Neighbor {
    pub id: String,
    pub distance: f32,
}

impl HnswInner {
    /// Best-first search within one layer.
    ///
    /// Maintains a min-heap of candidates and a bounded max-heap of the `ef`
    /// closest live results. Stops once the nearest remaining candidate is
    /// farther than the worst result. Tombstoned nodes are neither expanded
    /// nor returned. Falls back to any live node when `entry` is missing or
    /// tombstoned; returns empty when none exists.
    pub(crate) fn search_layer(
        &self,
        query: &VectorRecord,
        entry: &str,
        ef: usize,
        layer: usize,
    ) -> Result<Vec<Neighbor>> {
        if self.nodes.is_empty() {
            return Ok(Vec::new());
        }
        let metric = self.metric()?;

        let entry_id = match self.nodes.get(entry) {
            Some(node) if !node.deleted => entry.to_string(),
            _ => {
                // Deterministic fallback: lowest live id.
                match self
                    .nodes
                    .iter()
                    .filter(|(_, n)| !n.deleted)
                    .map(|(id, _)| id)
                    .min()
                {
                    Some(id) => id.clone(),
                    None => return Ok(Vec::new()),
                }
            }
        };

        let entry_dist = metric.distance(query, &self.nodes[&entry_id].record)?;

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(entry_id.clone());

        // Min-heap by distance (ties by id) via Reverse.
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat<f32>, String)>> = BinaryHeap::new();
        candidates.push(Reverse((OrderedFloat(entry_dist), entry_id.clone())));

        // Bounded max-heap of the ef best results seen so far.
        let mut results: BinaryHeap<(OrderedFloat<f32>, String)> = BinaryHeap::new();
        results.push((OrderedFloat(entry_dist), entry_id));

        while let Some(Reverse((OrderedFloat(current_dist), current_id))) = candidates.pop() {
            let worst = results.peek().map_or(f32::MAX, |(d, _)| d.0);
            if current_dist > worst {
                break;
            }

            let Some(current) = self.nodes.get(&current_id) else {
                continue;
            };
            if current.deleted || layer > current.level {
                continue;
            }

            for neighbor_id in current.edges[layer].keys() {
                if !visited.insert(neighbor_id.clone()) {
                    continue;
                }
                let Some(neighbor) = self.nodes.get(neighbor_id) else {
                    continue;
                };
                if neighbor.deleted {
                    continue;
                }

                let dist = metric.distance(query, &neighbor.record)?;
                let worst = results.peek().map_or(f32::MAX, |(d, _)| d.0);
                if results.len() < ef || dist < worst {
                    candidates.push(Reverse((OrderedFloat(dist), neighbor_id.clone())));
                    results.push((OrderedFloat(dist), neighbor_id.clone()));
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<Neighbor> = results
            .into_iter()
            .map(|(dist, id)| Neighbor {
                id,
                distance: dist.0,
            })
            .collect();
        out.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(out)
    }
}

impl HnswIndex {
    /// Multi-layer k-nearest-neighbor search.
    ///
    /// Descends from the top layer with a frontier of one, then widens to
    /// `max(k, ef_search)` at layer 0. When the entry point is tombstoned,
    /// the shared lock is dropped and briefly upgraded to repair it.
    pub(crate) fn knn_search(
        &self,
        query: &VectorRecord,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let mut inner = self.inner.read();

        if inner.live_count() == 0 {
            return Err(VectorDbError::EmptyIndex);
        }
        if k < 1 {
            return Err(VectorDbError::InvalidK(k));
        }
        inner.metric()?;

        let entry_dead = match inner.entry_point.as_deref() {
            Some(ep) => inner.nodes.get(ep).map_or(true, |n| n.deleted),
            None => true,
        };
        if entry_dead {
            drop(inner);
            {
                let mut writer = self.inner.write();
                writer.update_entry_point();
            }
            inner = self.inner.read();
            if inner.entry_point.is_none() {
                return Err(VectorDbError::EmptyIndex);
            }
        }

        let mut ep = inner
            .entry_point
            .clone()
            .expect("entry point present after repair");

        for layer in (1..=inner.max_level).rev() {
            let found = inner.search_layer(query, &ep, 1, layer)?;
            if let Some(nearest) = found.first() {
                ep = nearest.id.clone();
            }
        }

        let ef = inner.config.ef_search.max(k);
        let found = inner.search_layer(query, &ep, ef, 0)?;

        let results = found
            .into_iter()
            .filter(|n| inner.nodes.get(&n.id).is_some_and(|node| !node.deleted))
            .take(k)
            .map(|n| SearchResult {
                vector: inner.nodes[&n.id].record.clone(),
                id: n.id,
                distance: n.distance,
            })
            .collect();
        Ok(results)
    }
}
