//! Global tuning constants for vectorsql.
//!
//! Compile-time defaults for the HNSW index, query engine, and input limits.
//! Runtime configuration is handled by [`crate::settings::Settings`].

/// Default number of bidirectional links per HNSW node above layer 0.
///
/// Layer 0 allows `2 * M` links. Higher values improve recall but increase
/// memory and build time. Typical range: 8–64.
pub const HNSW_DEFAULT_M: usize = 16;

/// Default ef parameter during HNSW index construction.
///
/// Controls the size of the dynamic candidate list during insertion.
/// Higher values produce a better graph but slow down build time.
pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default ef parameter during HNSW search.
///
/// Controls the size of the dynamic candidate list at layer 0.
/// Higher values improve recall at the cost of latency.
pub const HNSW_DEFAULT_EF_SEARCH: usize = 50;

/// Default embedding dimension when none is configured.
pub const DEFAULT_DIMENSION: usize = 128;

/// Default number of rows returned by a NEAREST TO query without a LIMIT.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Maximum allowed vector dimension.
pub const MAX_DIMENSION: usize = i32::MAX as usize;

/// File extension for persisted vector records.
pub const VECTOR_FILE_EXT: &str = "vec";

/// Default host the outer server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port the outer server binds to.
pub const DEFAULT_PORT: u16 = 8080;

/// Default directory for vector record files and index blobs.
pub const DEFAULT_DATA_DIR: &str = "./data";
