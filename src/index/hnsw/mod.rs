//! HNSW (Hierarchical Navigable Small World) approximate nearest neighbor index.
//!
//! A multi-layer proximity graph: layer 0 contains every node, higher layers
//! thin out geometrically. Searches enter at the top layer and greedily
//! descend toward the query, then run a best-first frontier at layer 0.
//! Deletes tombstone nodes in place; traversal skips them.

mod graph;
mod insert;
mod persist;
mod search;

pub use graph::{HnswConfig, HnswIndex, HnswStats};
