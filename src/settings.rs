//! Runtime settings loaded from a TOML document.
//!
//! Every field has a default, so a partial file (or no file at all) yields a
//! usable configuration. The recognized layout:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [storage]
//! data_dir = "./data"
//!
//! [vector]
//! default_dimension = 128
//!
//! [indexing]
//! type = "hnsw"            # "hnsw" or "flat"
//! hnsw_max_links = 16
//! hnsw_ef_construct = 200
//! ```

use crate::config;
use crate::error::{Result, VectorDbError};
use crate::index::IndexKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address for the outer front-end.
    #[serde(default)]
    pub server: ServerSettings,
    /// On-disk storage location.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Vector defaults.
    #[serde(default)]
    pub vector: VectorSettings,
    /// Index selection and tuning.
    #[serde(default)]
    pub indexing: IndexingSettings,
}

/// Host and port for the outer server front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Data directory for vector record files and index blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Vector-level defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSettings {
    #[serde(default = "default_dimension")]
    pub default_dimension: usize,
}

/// Index selection and HNSW tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingSettings {
    /// Which index the query engine builds for NEAREST TO queries.
    #[serde(rename = "type", default)]
    pub kind: IndexKind,
    #[serde(default = "default_max_links")]
    pub hnsw_max_links: usize,
    #[serde(default = "default_ef_construct")]
    pub hnsw_ef_construct: usize,
}

fn default_host() -> String {
    config::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    config::DEFAULT_PORT
}

fn default_data_dir() -> String {
    config::DEFAULT_DATA_DIR.to_string()
}

fn default_dimension() -> usize {
    config::DEFAULT_DIMENSION
}

fn default_max_links() -> usize {
    config::HNSW_DEFAULT_M
}

fn default_ef_construct() -> usize {
    config::HNSW_DEFAULT_EF_CONSTRUCTION
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self {
            default_dimension: default_dimension(),
        }
    }
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            kind: IndexKind::default(),
            hnsw_max_links: default_max_links(),
            hnsw_ef_construct: default_ef_construct(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// A missing file yields the defaults; a file that exists but fails to
    /// parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("settings file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&raw)
            .map_err(|e| VectorDbError::corrupted(format!("settings file {path:?}: {e}")))?;
        tracing::info!("loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Serialize settings to a TOML string.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).expect("settings serialize to TOML")
    }
}
