//! In-memory vector store.

use crate::error::{Result, VectorDbError};
use crate::record::VectorRecord;
use crate::store::VectorStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Volatile store backed by a `HashMap`.
///
/// Mutations take the write lock; `get`/`list`/`count` take the read lock.
/// Records are cloned on the way in and out so callers never alias stored
/// state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    vectors: RwLock<HashMap<String, VectorRecord>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryStore {
    fn insert(&self, record: &VectorRecord) -> Result<()> {
        let mut vectors = self.vectors.write();
        if vectors.contains_key(&record.id) {
            return Err(VectorDbError::VectorAlreadyExists(record.id.clone()));
        }
        vectors.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<VectorRecord> {
        self.vectors
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| VectorDbError::VectorNotFound(id.to_string()))
    }

    fn update(&self, record: &VectorRecord) -> Result<()> {
        let mut vectors = self.vectors.write();
        if !vectors.contains_key(&record.id) {
            return Err(VectorDbError::VectorNotFound(record.id.clone()));
        }
        vectors.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut vectors = self.vectors.write();
        if vectors.remove(id).is_none() {
            return Err(VectorDbError::VectorNotFound(id.to_string()));
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.vectors.read().keys().cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.vectors.read().len())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
