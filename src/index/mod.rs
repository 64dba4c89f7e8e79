//! Searchable index structures built over vector records.
//!
//! Two implementations share the [`VectorIndex`] contract: [`FlatIndex`]
//! scans every record, [`HnswIndex`] walks a hierarchical proximity graph.
//! The query engine builds one of them per vector search, selected by
//! [`IndexKind`].

mod blob;
pub mod flat;
pub mod hnsw;

pub use flat::FlatIndex;
pub use hnsw::{HnswConfig, HnswIndex, HnswStats};

use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::record::VectorRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A single k-NN search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Id of the matched record.
    pub id: String,
    /// Copy of the matched record.
    pub vector: VectorRecord,
    /// Distance from the query under the index's metric.
    pub distance: f32,
}

/// Which index implementation the engine builds for vector searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exhaustive linear scan. Exact, O(n) per query.
    Flat,
    /// Hierarchical navigable small-world graph. Approximate, sublinear.
    #[default]
    Hnsw,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Flat => f.write_str("flat"),
            IndexKind::Hnsw => f.write_str("hnsw"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = crate::error::VectorDbError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "flat" => Ok(IndexKind::Flat),
            "hnsw" => Ok(IndexKind::Hnsw),
            other => Err(crate::error::VectorDbError::invalid_query(format!(
                "unsupported index type: {other}"
            ))),
        }
    }
}

/// Contract shared by all index implementations.
///
/// All operations are thread-safe; each implementation guards its state with
/// a single reader/writer lock (build/add/delete/set_metric exclusive,
/// search/size/ids shared).
pub trait VectorIndex: Send + Sync {
    /// Short name of the implementation ("flat", "hnsw").
    fn name(&self) -> &'static str;

    /// Replaces any prior state with an index over `records`.
    fn build(&self, records: &[VectorRecord]) -> Result<()>;

    /// Adds one record. Fails with vector-already-exists on id collision.
    fn add(&self, record: &VectorRecord) -> Result<()>;

    /// Removes the record with the given id.
    fn delete(&self, id: &str) -> Result<()>;

    /// Returns up to `k` nearest records, ascending by distance.
    fn search(&self, query: &VectorRecord, k: usize) -> Result<Vec<SearchResult>>;

    /// Number of live records.
    fn size(&self) -> usize;

    /// Ids of all live records. Order is unspecified.
    fn ids(&self) -> Vec<String>;

    /// Persists the index to a single file.
    fn save(&self, path: &Path) -> Result<()>;

    /// Replaces in-memory state with the persisted index at `path`.
    fn load(&self, path: &Path) -> Result<()>;

    /// Installs the distance metric used for subsequent operations.
    fn set_metric(&self, metric: DistanceMetric);
}
