//! Metadata backends that live in the application crate.
//!
//! The SQLite store lives in `webpforge-db`; this module adds the lightweight
//! backends and picks one from configuration:
//!
//! - [`NoMetadata`] -- every lookup misses, so only main artifacts are produced.
//! - [`InMemoryMetadata`] -- a `HashMap`, used by tests and embedders.
//! - [`JsonMetadataFile`] -- a JSON object keyed by relative path, read once.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};
use webpforge_common::{AttachmentMetadata, MetadataProvider};
use webpforge_db::SqliteMetadataStore;

use crate::config::{MetadataBackend, MetadataConfig};

/// Provider for installs without attachment metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataProvider for NoMetadata {
    fn lookup(&self, _relative_path: &str) -> webpforge_common::Result<Option<AttachmentMetadata>> {
        Ok(None)
    }
}

/// Metadata held in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetadata {
    entries: RwLock<HashMap<String, AttachmentMetadata>>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) metadata for `relative_path`.
    pub fn insert(&self, relative_path: impl Into<String>, metadata: AttachmentMetadata) {
        let relative_path = relative_path.into();
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(relative_path, metadata);
            }
            Err(_) => debug!("Metadata lock poisoned, dropping record for {}", relative_path),
        }
    }

    /// Forget `relative_path`. Returns whether it was present.
    pub fn remove(&self, relative_path: &str) -> bool {
        match self.entries.write() {
            Ok(mut entries) => entries.remove(relative_path).is_some(),
            Err(_) => {
                debug!("Metadata lock poisoned, cannot remove {}", relative_path);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Into<String>> FromIterator<(K, AttachmentMetadata)> for InMemoryMetadata {
    fn from_iter<I: IntoIterator<Item = (K, AttachmentMetadata)>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl MetadataProvider for InMemoryMetadata {
    fn lookup(&self, relative_path: &str) -> webpforge_common::Result<Option<AttachmentMetadata>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| webpforge_common::Error::database("metadata lock poisoned"))?;
        Ok(entries.get(relative_path).cloned())
    }
}

/// Metadata read from a JSON file of the form `{"2024/05/photo.jpg": {"sizes": {...}}}`.
#[derive(Debug)]
pub struct JsonMetadataFile {
    path: PathBuf,
    entries: InMemoryMetadata,
}

impl JsonMetadataFile {
    /// Read and parse `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let map = load_json_map(path)?;
        info!("Loaded metadata for {} attachments from {:?}", map.len(), path);
        Ok(Self {
            path: path.to_path_buf(),
            entries: map.into_iter().collect(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataProvider for JsonMetadataFile {
    fn lookup(&self, relative_path: &str) -> webpforge_common::Result<Option<AttachmentMetadata>> {
        self.entries.lookup(relative_path)
    }
}

/// Parse a JSON metadata map keyed by relative path.
pub fn load_json_map(path: &Path) -> Result<BTreeMap<String, AttachmentMetadata>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse metadata file: {:?}", path))
}

/// Open the backend selected by `config`.
pub fn open_provider(config: &MetadataConfig) -> Result<Box<dyn MetadataProvider>> {
    match config.backend {
        MetadataBackend::None => Ok(Box::new(NoMetadata)),
        MetadataBackend::Sqlite => {
            let path = require_path(config)?;
            let store = SqliteMetadataStore::open(path)
                .with_context(|| format!("Failed to open metadata database: {:?}", path))?;
            info!("Using SQLite metadata store at {:?}", path);
            Ok(Box::new(store))
        }
        MetadataBackend::Json => {
            let path = require_path(config)?;
            Ok(Box::new(JsonMetadataFile::load(path)?))
        }
    }
}

fn require_path(config: &MetadataConfig) -> Result<&Path> {
    config
        .path
        .as_deref()
        .with_context(|| format!("Metadata backend {:?} requires metadata.path", config.backend))
}
