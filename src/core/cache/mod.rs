//! # Fingerprint Cache Module
//!
//! Persists computed fingerprints so unchanged files are never re-hashed.
//!
//! ## Backends
//! - [`SqliteCache`] - persistent, WAL mode, for real runs
//! - [`InMemoryCache`] - volatile, for tests and one-shot runs
//!
//! Entries are keyed by path and validated against the file's current
//! size and modification time; a mismatch is treated as a miss. The
//! engine additionally discards entries whose algorithm or fingerprint
//! width differs from the run's configuration, then overwrites them.
//! The engine takes a cache handle explicitly, there are no globals.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryCache;
pub use sqlite::SqliteCache;
pub use traits::FingerprintCache;

use crate::core::hasher::HashAlgorithmKind;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A single cached fingerprint
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// File this fingerprint belongs to
    pub path: PathBuf,
    /// Raw fingerprint bytes
    pub fingerprint: Vec<u8>,
    /// Algorithm that produced the fingerprint
    pub algorithm: HashAlgorithmKind,
    /// File size at the time of hashing
    pub file_size: u64,
    /// File modification time at the time of hashing
    pub file_modified: SystemTime,
    /// When this entry was written
    pub cached_at: SystemTime,
}

impl CacheEntry {
    /// Whether this entry is still valid for the file's current metadata.
    ///
    /// Modification times are compared at second precision because SQLite
    /// stores them as Unix timestamps.
    pub fn is_valid_for(&self, current_size: u64, current_modified: SystemTime) -> bool {
        if self.file_size != current_size {
            return false;
        }

        let cached_secs = Self::as_secs(self.file_modified);
        let current_secs = Self::as_secs(current_modified);

        cached_secs == current_secs
    }

    fn as_secs(time: SystemTime) -> u64 {
        time.duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// Cache statistics for reporting
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of entries in the cache
    pub total_entries: usize,
    /// Total size of stored fingerprint bytes
    pub total_size_bytes: u64,
    /// Oldest entry timestamp
    pub oldest_entry: Option<SystemTime>,
    /// Newest entry timestamp
    pub newest_entry: Option<SystemTime>,
}
