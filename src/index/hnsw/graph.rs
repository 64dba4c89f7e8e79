//! HNSW graph structure, configuration, and the index contract implementation.

use crate::config;
use crate::distance::DistanceMetric;
use crate::error::{Result, VectorDbError};
use crate::index::{SearchResult, VectorIndex};
use crate::record::VectorRecord;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration parameters for an HNSW index.
///
/// Controls the trade-off between build speed, search speed, and recall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Target number of bidirectional links per node above layer 0
    /// (layer 0 allows `2 * m`).
    pub m: usize,
    /// Candidate list size during insertion.
    pub ef_construction: usize,
    /// Candidate list size during search at layer 0.
    pub ef_search: usize,
    /// Hard cap on node levels. When 0, `build` computes `⌊ln N / ln M⌋`
    /// from the initial batch (1 for an empty build).
    pub max_level: usize,
    /// Geometric probability for level assignment.
    pub level_mult: f64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        let m = config::HNSW_DEFAULT_M;
        Self {
            m,
            ef_construction: config::HNSW_DEFAULT_EF_CONSTRUCTION,
            ef_search: config::HNSW_DEFAULT_EF_SEARCH,
            max_level: 0,
            level_mult: 1.0 / (m as f64).ln(),
        }
    }
}

/// A node in the proximity graph.
///
/// `edges[layer]` maps neighbor id to the precomputed distance. Every edge
/// target must be a node whose level is at least `layer`; targets may be
/// tombstoned, and readers skip them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct HnswNode {
    pub record: VectorRecord,
    pub level: usize,
    pub edges: Vec<HashMap<String, f32>>,
    pub deleted: bool,
}

impl HnswNode {
    pub(crate) fn new(record: VectorRecord, level: usize) -> Self {
        Self {
            record,
            level,
            edges: vec![HashMap::new(); level + 1],
            deleted: false,
        }
    }
}

/// Mutable index state, guarded by the outer lock.
pub(crate) struct HnswInner {
    pub nodes: HashMap<String, HnswNode>,
    pub entry_point: Option<String>,
    /// Highest occupied level in the graph.
    pub max_level: usize,
    pub config: HnswConfig,
    pub metric: Option<DistanceMetric>,
    /// Seed captured at construction; the RNG is reseeded from it on load.
    pub seed: u64,
    pub rng: StdRng,
}

impl HnswInner {
    /// Draws a level for a new node: geometric with ratio `level_mult`,
    /// capped at `config.max_level`.
    pub(crate) fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level < self.config.max_level && self.rng.gen::<f64>() < self.config.level_mult {
            level += 1;
        }
        level
    }

    pub(crate) fn metric(&self) -> Result<DistanceMetric> {
        self.metric.ok_or(VectorDbError::MetricRequired)
    }

    /// Number of non-tombstoned nodes.
    pub(crate) fn live_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.deleted).count()
    }

    /// Validates internal invariants after deserialization.
    ///
    /// Checks that the entry point refers to a live node at the current
    /// maximum level, that each node's edge table covers exactly its
    /// levels, and that every edge targets an existing node of
    /// sufficient level.
    pub(crate) fn validate(&self) -> Result<()> {
        match &self.entry_point {
            Some(ep) => {
                let node = self.nodes.get(ep).ok_or_else(|| {
                    VectorDbError::corrupted(format!("entry point '{ep}' is not in the graph"))
                })?;
                if node.deleted {
                    return Err(VectorDbError::corrupted(format!(
                        "entry point '{ep}' is tombstoned"
                    )));
                }
                if node.level != self.max_level {
                    return Err(VectorDbError::corrupted(format!(
                        "entry point '{ep}' has level {} but max level is {}",
                        node.level, self.max_level
                    )));
                }
            }
            None => {
                if self.live_count() > 0 {
                    return Err(VectorDbError::corrupted(
                        "graph has live nodes but no entry point",
                    ));
                }
            }
        }

        for (id, node) in &self.nodes {
            if node.edges.len() != node.level + 1 {
                return Err(VectorDbError::corrupted(format!(
                    "node '{id}' has {} edge layers for level {}",
                    node.edges.len(),
                    node.level
                )));
            }
            if node.record.id != *id {
                return Err(VectorDbError::corrupted(format!(
                    "node '{id}' wraps a record with id '{}'",
                    node.record.id
                )));
            }
            for (layer, edges) in node.edges.iter().enumerate() {
                for neighbor_id in edges.keys() {
                    let neighbor = self.nodes.get(neighbor_id).ok_or_else(|| {
                        VectorDbError::corrupted(format!(
                            "node '{id}' links to missing node '{neighbor_id}' at layer {layer}"
                        ))
                    })?;
                    if neighbor.level < layer {
                        return Err(VectorDbError::corrupted(format!(
                            "node '{id}' links to '{neighbor_id}' at layer {layer}, \
                             which only reaches level {}",
                            neighbor.level
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Recomputes the entry point as the highest-level live node
    /// (ties broken by id). Clears it when every node is tombstoned.
    pub(crate) fn update_entry_point(&mut self) {
        let best = self
            .nodes
            .iter()
            .filter(|(_, n)| !n.deleted)
            .max_by(|(a_id, a), (b_id, b)| a.level.cmp(&b.level).then(b_id.cmp(a_id)));
        match best {
            Some((id, node)) => {
                self.entry_point = Some(id.clone());
                self.max_level = node.level;
            }
            None => {
                self.entry_point = None;
                self.max_level = 0;
            }
        }
    }
}

/// Point-in-time shape of the graph, for diagnostics and verbose output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HnswStats {
    /// Total nodes, tombstoned ones included.
    pub nodes: usize,
    /// Nodes that answer searches.
    pub live: usize,
    /// Tombstoned nodes awaiting a rebuild.
    pub tombstones: usize,
    /// Highest occupied level.
    pub max_level: usize,
    /// Directed edge count summed over all layers.
    pub edges: usize,
    /// Node count per level, index 0 = level 0 (every node).
    pub nodes_per_level: Vec<usize>,
}

/// Hierarchical navigable small-world index.
///
/// One reader/writer lock guards the whole graph: build/add/delete/set_metric
/// take it exclusively, search/size/ids take it shared. The search path may
/// briefly upgrade to exclusive to repair a tombstoned entry point.
pub struct HnswIndex {
    pub(crate) inner: RwLock<HnswInner>,
}

impl HnswIndex {
    /// Creates an empty index with the given metric and configuration.
    /// The RNG seed is drawn once here and kept for the index's lifetime.
    pub fn new(metric: Option<DistanceMetric>, config: HnswConfig) -> Self {
        Self::with_seed(metric, config, rand::random())
    }

    /// Creates an empty index with default configuration.
    pub fn with_defaults(metric: Option<DistanceMetric>) -> Self {
        Self::new(metric, HnswConfig::default())
    }

    /// Creates an index with an explicit RNG seed, making level assignment
    /// (and therefore graph shape) reproducible.
    pub fn with_seed(metric: Option<DistanceMetric>, config: HnswConfig, seed: u64) -> Self {
        Self {
            inner: RwLock::new(HnswInner {
                nodes: HashMap::new(),
                entry_point: None,
                max_level: 0,
                config,
                metric,
                seed,
                rng: StdRng::seed_from_u64(seed),
            }),
        }
    }

    /// Snapshot of graph shape counters.
    pub fn stats(&self) -> HnswStats {
        let inner = self.inner.read();
        let live = inner.live_count();
        let mut edges = 0usize;
        let mut nodes_per_level = vec![0usize; inner.max_level + 1];
        for node in inner.nodes.values() {
            for layer_edges in &node.edges {
                edges += layer_edges.len();
            }
            for level in 0..=node.level.min(inner.max_level) {
                nodes_per_level[level] += 1;
            }
        }
        HnswStats {
            nodes: inner.nodes.len(),
            live,
            tombstones: inner.nodes.len() - live,
            max_level: inner.max_level,
            edges,
            nodes_per_level,
        }
    }
}

impl VectorIndex for HnswIndex {
    fn name(&self) -> &'static str {
        "hnsw"
    }

    fn build(&self, records: &[VectorRecord]) -> Result<()> {
        let mut inner = self.inner.write();
        inner.nodes.clear();
        inner.entry_point = None;
        inner.max_level = 0;

        if inner.config.max_level == 0 {
            let n = records.len();
            inner.config.max_level = if n > 0 {
                ((n as f64).ln() / (inner.config.m as f64).ln()).floor() as usize
            } else {
                1
            };
        }

        for record in records {
            inner.insert_record(record.clone())?;
        }
        tracing::debug!(
            "built hnsw index: {} nodes, max level {}",
            inner.nodes.len(),
            inner.max_level
        );
        Ok(())
    }

    fn add(&self, record: &VectorRecord) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.nodes.contains_key(&record.id) {
            return Err(VectorDbError::VectorAlreadyExists(record.id.clone()));
        }
        inner.insert_record(record.clone())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| VectorDbError::VectorNotFound(id.to_string()))?;
        node.deleted = true;

        if inner.entry_point.as_deref() == Some(id) {
            inner.update_entry_point();
        }
        Ok(())
    }

    fn search(&self, query: &VectorRecord, k: usize) -> Result<Vec<SearchResult>> {
        self.knn_search(query, k)
    }

    fn size(&self) -> usize {
        self.inner.read().live_count()
    }

    fn ids(&self) -> Vec<String> {
        self.inner
            .read()
            .nodes
            .iter()
            .filter(|(_, n)| !n.deleted)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.save_to(path)
    }

    fn load(&self, path: &Path) -> Result<()> {
        self.load_from(path)
    }

    fn set_metric(&self, metric: DistanceMetric) {
        self.inner.write().metric = Some(metric);
    }
}
