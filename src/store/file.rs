//! File-backed vector store.
//!
//! One `<id>.vec` file per record under a base directory, using the codec in
//! [`crate::record`]. The full directory is read into memory lazily on the
//! first operation; afterwards reads are served from memory and mutations are
//! written through. File writes go through a temp file and an atomic rename,
//! so a record file is always either the old or the new bytes, never a
//! partial write.
//!
//! The in-memory map is mutated before the file write, so a disk failure
//! leaves memory ahead of disk; the error still surfaces to the caller.

use crate::config::VECTOR_FILE_EXT;
use crate::error::{Result, VectorDbError};
use crate::record::VectorRecord;
use crate::store::VectorStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct FileStoreInner {
    vectors: HashMap<String, VectorRecord>,
    loaded: bool,
}

/// Durable store with one file per record, write-through on every mutation.
///
/// No two `FileStore` instances should point at the same directory
/// concurrently; the lock only excludes threads within one instance.
#[derive(Debug)]
pub struct FileStore {
    base_dir: PathBuf,
    inner: RwLock<FileStoreInner>,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `base_dir`.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            inner: RwLock::new(FileStoreInner::default()),
        })
    }

    /// Directory the store writes into.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{id}.{VECTOR_FILE_EXT}"))
    }

    /// Populates the in-memory map from every `*.vec` file in the directory.
    /// Holds the write lock; later callers see `loaded` and return early.
    fn ensure_loaded(&self) -> Result<()> {
        if self.inner.read().loaded {
            return Ok(());
        }

        let mut inner = self.inner.write();
        if inner.loaded {
            return Ok(());
        }

        let mut count = 0usize;
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VECTOR_FILE_EXT) {
                continue;
            }
            let data = fs::read(&path)?;
            let record = VectorRecord::decode(&data).map_err(|e| {
                VectorDbError::corrupted(format!("record file {path:?}: {e}"))
            })?;
            inner.vectors.insert(record.id.clone(), record);
            count += 1;
        }

        inner.loaded = true;
        tracing::info!(
            "loaded {} vector records from {:?}",
            count,
            self.base_dir
        );
        Ok(())
    }

    /// Writes a record's bytes to its file via temp file + rename.
    fn write_record(&self, record: &VectorRecord) -> Result<()> {
        let path = self.record_path(&record.id);
        let tmp = path.with_extension(format!("{VECTOR_FILE_EXT}.tmp"));
        fs::write(&tmp, record.encode())?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl VectorStore for FileStore {
    fn insert(&self, record: &VectorRecord) -> Result<()> {
        self.ensure_loaded()?;

        let mut inner = self.inner.write();
        if inner.vectors.contains_key(&record.id) {
            return Err(VectorDbError::VectorAlreadyExists(record.id.clone()));
        }
        inner.vectors.insert(record.id.clone(), record.clone());
        self.write_record(record)
    }

    fn get(&self, id: &str) -> Result<VectorRecord> {
        self.ensure_loaded()?;
        self.inner
            .read()
            .vectors
            .get(id)
            .cloned()
            .ok_or_else(|| VectorDbError::VectorNotFound(id.to_string()))
    }

    fn update(&self, record: &VectorRecord) -> Result<()> {
        self.ensure_loaded()?;

        let mut inner = self.inner.write();
        if !inner.vectors.contains_key(&record.id) {
            return Err(VectorDbError::VectorNotFound(record.id.clone()));
        }
        inner.vectors.insert(record.id.clone(), record.clone());
        self.write_record(record)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.ensure_loaded()?;

        let mut inner = self.inner.write();
        if inner.vectors.remove(id).is_none() {
            return Err(VectorDbError::VectorNotFound(id.to_string()));
        }
        fs::remove_file(self.record_path(id))?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        self.ensure_loaded()?;
        Ok(self.inner.read().vectors.keys().cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        self.ensure_loaded()?;
        Ok(self.inner.read().vectors.len())
    }

    fn close(&self) -> Result<()> {
        // Every mutation is already durable; nothing to flush.
        Ok(())
    }
}
