//! Top-level database handle.
//!
//! [`VectorDb`] wires a store and a [`QueryEngine`] together from
//! [`Settings`], giving embedders a single open/execute/close surface.
//! The CLI and any other front-end stay thin: they parse arguments, build
//! settings, and forward statements here.

use crate::error::Result;
use crate::settings::Settings;
use crate::sql::{QueryEngine, ResultSet};
use crate::store::{FileStore, MemoryStore, VectorStore};
use std::sync::Arc;

/// An opened vector database: a store plus a query engine over it.
pub struct VectorDb {
    store: Arc<dyn VectorStore>,
    engine: QueryEngine,
}

impl VectorDb {
    /// Opens a file-backed database as described by `settings`
    /// (data directory, index kind).
    pub fn open(settings: &Settings) -> Result<Self> {
        let store: Arc<dyn VectorStore> = Arc::new(FileStore::open(&settings.storage.data_dir)?);
        let engine = QueryEngine::from_settings(Arc::clone(&store), settings);
        tracing::info!(
            "opened vector database at {} ({} index)",
            settings.storage.data_dir,
            settings.indexing.kind
        );
        Ok(Self { store, engine })
    }

    /// Opens a volatile in-memory database with the given settings.
    pub fn in_memory(settings: &Settings) -> Self {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        let engine = QueryEngine::from_settings(Arc::clone(&store), settings);
        Self { store, engine }
    }

    /// Executes one SQL statement.
    pub fn execute(&self, sql: &str) -> Result<ResultSet> {
        self.engine.execute(sql)
    }

    /// Returns the execution plan for a statement without running it.
    pub fn explain(&self, sql: &str) -> Result<String> {
        self.engine.explain(sql)
    }

    /// Direct access to the underlying store for programmatic callers.
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Closes the database. Writes are already durable; this releases the
    /// store's resources.
    pub fn close(&self) -> Result<()> {
        self.store.close()
    }
}
