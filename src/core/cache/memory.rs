//! In-memory cache backend.

use super::{CacheEntry, CacheStats, FingerprintCache};
use crate::error::CacheError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

/// Volatile cache backed by a HashMap. Used in tests and for runs where
/// persistence is disabled.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl InMemoryCache {
    /// Create an empty in-memory cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl FingerprintCache for InMemoryCache {
    fn get(
        &self,
        path: &Path,
        current_size: u64,
        current_modified: SystemTime,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(entries
            .get(path)
            .filter(|entry| entry.is_valid_for(current_size, current_modified))
            .cloned())
    }

    fn set(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        entries.insert(entry.path.clone(), entry);
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        entries.remove(path);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        entries.clear();
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(CacheStats {
            total_entries: entries.len(),
            total_size_bytes: entries.values().map(|e| e.fingerprint.len() as u64).sum(),
            oldest_entry: entries.values().map(|e| e.cached_at).min(),
            newest_entry: entries.values().map(|e| e.cached_at).max(),
        })
    }

    fn prune_orphans(&self) -> Result<usize, CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        let before = entries.len();
        entries.retain(|path, _| path.exists());
        Ok(before - entries.len())
    }
}
