//! # vectorsql
//!
//! An embeddable vector database with a SQL-like query surface.
//!
//! ## Features
//!
//! - **Vector records** with string ids and string key/value metadata,
//!   persisted one file per record in a self-describing byte codec
//! - **Four distance metrics**: euclidean, cosine, negative dot product,
//!   and manhattan
//! - **Two indexes** behind one contract: an exact flat scan and an HNSW
//!   proximity graph with tombstoned deletes
//! - **SQL-like queries**: point reads, inserts, deletes, metadata filters
//!   (`=`, `!=`, `LIKE`), and a `NEAREST TO` similarity clause
//! - **Durable storage**: write-through file store plus checksummed index
//!   snapshots with atomic replacement
//!
//! ## Architecture
//!
//! ```text
//! SQL text → tokenizer → parser → planner ─┬─ ID_LOOKUP      → store.get
//!                                          ├─ FULL_SCAN      → store.list + filter
//!                                          └─ VECTOR_SEARCH  → index.build + search
//! Storage: MemoryStore | FileStore (<id>.vec files, write-through)
//! Indexes: FlatIndex | HnswIndex (single blob snapshots, CRC32 footer)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vectorsql::distance::DistanceMetric;
//! use vectorsql::index::IndexKind;
//! use vectorsql::sql::QueryEngine;
//! use vectorsql::store::FileStore;
//!
//! let store = Arc::new(FileStore::open("./data")?);
//! let engine = QueryEngine::new(store, IndexKind::Hnsw, DistanceMetric::Euclidean);
//!
//! engine.execute("INSERT INTO vectors (id, vector) VALUES ('doc1', [0.1, 0.9, 0.0])")?;
//! let result = engine.execute(
//!     "SELECT id, distance FROM vectors NEAREST TO [0.0, 1.0, 0.0] USING cosine LIMIT 5",
//! )?;
//! println!("{}", result.render());
//! # Ok::<(), vectorsql::error::VectorDbError>(())
//! ```

/// Compile-time tuning constants.
pub mod config;
/// Top-level open/execute/close database handle.
pub mod db;
/// Distance metrics: euclidean, cosine, dot product, manhattan.
pub mod distance;
/// Error taxonomy and the crate-wide `Result` alias.
pub mod error;
/// Flat and HNSW index implementations behind the `VectorIndex` contract.
pub mod index;
/// Vector records and their byte codec.
pub mod record;
/// Runtime settings loaded from a TOML document.
pub mod settings;
/// Tokenizer, parser, planner, and executor for the SQL surface.
pub mod sql;
/// In-memory and file-backed vector stores.
pub mod store;

pub use db::VectorDb;
pub use distance::DistanceMetric;
pub use error::{Result, VectorDbError};
pub use index::{FlatIndex, HnswConfig, HnswIndex, IndexKind, SearchResult, VectorIndex};
pub use record::VectorRecord;
pub use settings::Settings;
pub use sql::{QueryEngine, ResultSet};
pub use store::{FileStore, MemoryStore, VectorStore};
