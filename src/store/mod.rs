//! Vector storage: a durable keyed collection of vector records.
//!
//! Two implementations share the [`VectorStore`] contract: [`MemoryStore`]
//! keeps everything in a map, [`FileStore`] additionally writes one
//! `<id>.vec` file per record under a base directory.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::record::VectorRecord;

/// Keyed collection of vector records.
///
/// Records cross the boundary by value: `insert`/`update` store a copy of
/// the argument and `get` returns an independent copy. All operations are
/// thread-safe; implementations guard their state with a single
/// reader/writer lock (mutations exclusive, reads shared).
pub trait VectorStore: Send + Sync {
    /// Adds a new record. Fails with vector-already-exists when the id is taken.
    fn insert(&self, record: &VectorRecord) -> Result<()>;

    /// Retrieves a copy of the record with the given id.
    fn get(&self, id: &str) -> Result<VectorRecord>;

    /// Replaces the values and metadata of an existing record.
    fn update(&self, record: &VectorRecord) -> Result<()>;

    /// Removes the record with the given id.
    fn delete(&self, id: &str) -> Result<()>;

    /// Returns all record ids. Order is unspecified.
    fn list(&self) -> Result<Vec<String>>;

    /// Number of records in the store.
    fn count(&self) -> Result<usize>;

    /// Releases any resources held by the store.
    fn close(&self) -> Result<()>;
}
