//! Cache backend trait definition.

use super::{CacheEntry, CacheStats};
use crate::error::CacheError;
use std::path::Path;
use std::time::SystemTime;

/// Trait for fingerprint cache backends
pub trait FingerprintCache: Send + Sync {
    /// Get a cached fingerprint if it exists and is still valid.
    ///
    /// The entry is only returned when the file's current size and
    /// modification time match what was recorded at hashing time.
    fn get(
        &self,
        path: &Path,
        current_size: u64,
        current_modified: SystemTime,
    ) -> Result<Option<CacheEntry>, CacheError>;

    /// Store a fingerprint in the cache
    fn set(&self, entry: CacheEntry) -> Result<(), CacheError>;

    /// Store multiple fingerprints at once.
    ///
    /// Backends with transactions override this to batch the writes.
    fn set_batch(&self, entries: &[CacheEntry]) -> Result<(), CacheError> {
        for entry in entries {
            self.set(entry.clone())?;
        }
        Ok(())
    }

    /// Remove a specific entry
    fn remove(&self, path: &Path) -> Result<(), CacheError>;

    /// Clear all cached entries
    fn clear(&self) -> Result<(), CacheError>;

    /// Get cache statistics
    fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Remove entries for files that no longer exist.
    ///
    /// Returns the number of entries removed.
    fn prune_orphans(&self) -> Result<usize, CacheError>;
}
