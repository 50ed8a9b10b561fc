//! Cache-backed JSON file store
//!
//! One pretty-printed JSON file holds the entire document. Reads serve a
//! cached copy for up to five minutes; writes validate, persist, and
//! refresh the cache so a write is never followed by a stale read.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use roster_api::Document;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{normalize, validate, StoreResult};

/// How long a cached document is served before the file is re-read.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache introspection for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    pub cached: bool,
    /// Age of the cached copy, `None` when the cache is empty.
    pub age: Option<Duration>,
}

struct CachedDocument {
    doc: Document,
    loaded_at: Instant,
}

/// The persistent store. Cheap to share behind an `Arc`; all methods take
/// `&self`.
pub struct JsonStore {
    path: PathBuf,
    cache: Mutex<Option<CachedDocument>>,
}

impl JsonStore {
    /// Open the store at `path`, creating the file with default contents if
    /// it does not exist, or validating and persisting any pending schema
    /// migrations if it does.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self {
            path: path.into(),
            cache: Mutex::new(None),
        };
        store.init().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn init(&self) -> StoreResult<()> {
        if tokio::fs::try_exists(&self.path).await? {
            // Re-persist so legacy field names and repaired values land on
            // disk once, instead of being re-migrated on every read.
            let doc = self.read(true).await;
            if !self.save(&doc).await {
                warn!(path = %self.path.display(), "Could not persist migrated document");
            }
            info!(path = %self.path.display(), "Opened data file");
        } else {
            if let Some(parent) = self.path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let doc = Document::default();
            let json = serde_json::to_string_pretty(&doc)?;
            tokio::fs::write(&self.path, json).await?;
            *self.cache.lock().await = Some(CachedDocument {
                doc,
                loaded_at: Instant::now(),
            });
            info!(path = %self.path.display(), "Created data file with defaults");
        }
        Ok(())
    }

    /// Read the document. Serves the cache when fresh unless `force_refresh`
    /// is set. Never fails: an unreadable or corrupt file degrades to the
    /// default document, which is installed as the cache so repeated reads
    /// do not hammer a broken disk.
    pub async fn read(&self, force_refresh: bool) -> Document {
        let mut cache = self.cache.lock().await;

        if !force_refresh
            && let Some(cached) = cache.as_ref()
            && cached.loaded_at.elapsed() < CACHE_TTL
        {
            debug!("Serving cached document");
            return cached.doc.clone();
        }

        let doc = match self.load_from_disk().await {
            Ok(doc) => doc,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read data file, using defaults");
                Document::default()
            }
        };

        *cache = Some(CachedDocument {
            doc: doc.clone(),
            loaded_at: Instant::now(),
        });
        doc
    }

    async fn load_from_disk(&self) -> StoreResult<Document> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let raw: Value = serde_json::from_str(&contents)?;
        Ok(validate(&raw))
    }

    /// Normalize and persist the document, then refresh the cache. Returns
    /// whether the write succeeded; a failed write leaves the cache
    /// untouched.
    pub async fn save(&self, doc: &Document) -> bool {
        let doc = normalize(doc.clone());

        let json = match serde_json::to_string_pretty(&doc) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize document");
                return false;
            }
        };

        let mut cache = self.cache.lock().await;
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            error!(path = %self.path.display(), error = %e, "Failed to write data file");
            return false;
        }

        *cache = Some(CachedDocument {
            doc,
            loaded_at: Instant::now(),
        });
        debug!(path = %self.path.display(), "Document saved");
        true
    }

    /// Drop the cached copy so the next read hits the disk.
    pub async fn invalidate_cache(&self) {
        *self.cache.lock().await = None;
        debug!("Cache invalidated");
    }

    pub async fn cache_status(&self) -> CacheStatus {
        let cache = self.cache.lock().await;
        CacheStatus {
            cached: cache.is_some(),
            age: cache.as_ref().map(|c| c.loaded_at.elapsed()),
        }
    }
}
