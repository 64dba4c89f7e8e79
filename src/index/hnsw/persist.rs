//! HNSW persistence: the whole graph as a single checksummed blob.

use crate::error::{Result, VectorDbError};
use crate::index::blob;
use crate::index::hnsw::graph::{HnswConfig, HnswIndex, HnswInner, HnswNode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Serialized form of the index. Tombstoned nodes and their edges are kept
/// verbatim so a loaded graph searches identically to the saved one.
#[derive(Serialize, Deserialize)]
struct HnswSnapshot {
    nodes: HashMap<String, HnswNode>,
    entry_point: Option<String>,
    max_level: usize,
    config: HnswConfig,
    metric: Option<crate::distance::DistanceMetric>,
    seed: u64,
}

impl HnswIndex {
    pub(crate) fn save_to(&self, path: &Path) -> Result<()> {
        let inner = self.inner.read();
        let snapshot = HnswSnapshot {
            nodes: inner.nodes.clone(),
            entry_point: inner.entry_point.clone(),
            max_level: inner.max_level,
            config: inner.config.clone(),
            metric: inner.metric,
            seed: inner.seed,
        };
        let payload = bincode::serialize(&snapshot)
            .map_err(|e| VectorDbError::corrupted(format!("hnsw index serialize: {e}")))?;
        blob::write(path, &payload)
    }

    pub(crate) fn load_from(&self, path: &Path) -> Result<()> {
        let payload = blob::read(path)?;
        let snapshot: HnswSnapshot = bincode::deserialize(&payload)
            .map_err(|e| VectorDbError::corrupted(format!("hnsw index deserialize: {e}")))?;

        let mut inner = self.inner.write();
        let candidate = HnswInner {
            nodes: snapshot.nodes,
            entry_point: snapshot.entry_point,
            max_level: snapshot.max_level,
            config: snapshot.config,
            // The persisted metric only applies when the caller has not set one.
            metric: inner.metric.or(snapshot.metric),
            seed: snapshot.seed,
            rng: StdRng::seed_from_u64(snapshot.seed),
        };
        candidate
            .validate()
            .map_err(|e| VectorDbError::corrupted(format!("snapshot {path:?}: {e}")))?;

        tracing::info!(
            "loaded hnsw index from {:?}: {} nodes, max level {}",
            path,
            candidate.nodes.len(),
            candidate.max_level
        );
        *inner = candidate;
        Ok(())
    }
}
