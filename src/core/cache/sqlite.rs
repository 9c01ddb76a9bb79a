//! SQLite cache backend for persistent storage.

use super::{CacheEntry, CacheStats, FingerprintCache};
use crate::core::hasher::HashAlgorithmKind;
use crate::error::CacheError;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// SQLite-backed persistent cache.
///
/// Uses WAL (Write-Ahead Logging) mode so readers can proceed while
/// writes are happening.
pub struct SqliteCache {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteCache {
    /// Open or create a cache database at the given path
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| CacheError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS fingerprints (
                path TEXT PRIMARY KEY,
                fingerprint BLOB NOT NULL,
                algorithm TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                file_modified INTEGER NOT NULL,
                cached_at INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    fn to_timestamp(time: SystemTime) -> i64 {
        time.duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs() as i64
    }

    fn from_timestamp(timestamp: i64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(timestamp.max(0) as u64)
    }

    fn algorithm_to_string(algo: HashAlgorithmKind) -> &'static str {
        match algo {
            HashAlgorithmKind::Average => "average",
            HashAlgorithmKind::Difference => "difference",
            HashAlgorithmKind::Perceptual => "perceptual",
        }
    }

    fn string_to_algorithm(s: &str) -> HashAlgorithmKind {
        match s {
            "difference" => HashAlgorithmKind::Difference,
            "perceptual" => HashAlgorithmKind::Perceptual,
            _ => HashAlgorithmKind::Average,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Corrupted {
            path: self.db_path.clone(),
        })
    }
}

impl FingerprintCache for SqliteCache {
    fn get(
        &self,
        path: &Path,
        current_size: u64,
        current_modified: SystemTime,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let conn = self.lock()?;
        let path_str = path.to_string_lossy();

        let result: Result<CacheEntry, _> = conn.query_row(
            "SELECT fingerprint, algorithm, file_size, file_modified, cached_at
             FROM fingerprints WHERE path = ?",
            [&path_str],
            |row| {
                Ok(CacheEntry {
                    path: path.to_path_buf(),
                    fingerprint: row.get(0)?,
                    algorithm: Self::string_to_algorithm(&row.get::<_, String>(1)?),
                    file_size: row.get::<_, i64>(2)? as u64,
                    file_modified: Self::from_timestamp(row.get(3)?),
                    cached_at: Self::from_timestamp(row.get(4)?),
                })
            },
        );

        match result {
            Ok(entry) => {
                if entry.is_valid_for(current_size, current_modified) {
                    Ok(Some(entry))
                } else {
                    Ok(None)
                }
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CacheError::QueryFailed(e.to_string())),
        }
    }

    fn set(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let conn = self.lock()?;
        let path_str = entry.path.to_string_lossy();

        conn.execute(
            "INSERT OR REPLACE INTO fingerprints
             (path, fingerprint, algorithm, file_size, file_modified, cached_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                path_str,
                entry.fingerprint,
                Self::algorithm_to_string(entry.algorithm),
                entry.file_size as i64,
                Self::to_timestamp(entry.file_modified),
                Self::to_timestamp(entry.cached_at),
            ],
        )
        .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn set_batch(&self, entries: &[CacheEntry]) -> Result<(), CacheError> {
        let mut conn = self.lock()?;

        let tx = conn
            .transaction()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        for entry in entries {
            let path_str = entry.path.to_string_lossy();
            tx.execute(
                "INSERT OR REPLACE INTO fingerprints
                 (path, fingerprint, algorithm, file_size, file_modified, cached_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    path_str,
                    entry.fingerprint,
                    Self::algorithm_to_string(entry.algorithm),
                    entry.file_size as i64,
                    Self::to_timestamp(entry.file_modified),
                    Self::to_timestamp(entry.cached_at),
                ],
            )
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), CacheError> {
        let conn = self.lock()?;
        let path_str = path.to_string_lossy();

        conn.execute("DELETE FROM fingerprints WHERE path = ?", [&path_str])
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM fingerprints", [])
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.lock()?;

        let total_entries: usize = conn
            .query_row("SELECT COUNT(*) FROM fingerprints", [], |row| {
                row.get::<_, i64>(0).map(|v| v as usize)
            })
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        let total_size_bytes: u64 = conn
            .query_row(
                "SELECT COALESCE(SUM(LENGTH(fingerprint)), 0) FROM fingerprints",
                [],
                |row| row.get::<_, i64>(0).map(|v| v as u64),
            )
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        let oldest_entry: Option<SystemTime> = conn
            .query_row("SELECT MIN(cached_at) FROM fingerprints", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?
            .map(Self::from_timestamp);

        let newest_entry: Option<SystemTime> = conn
            .query_row("SELECT MAX(cached_at) FROM fingerprints", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?
            .map(Self::from_timestamp);

        Ok(CacheStats {
            total_entries,
            total_size_bytes,
            oldest_entry,
            newest_entry,
        })
    }

    fn prune_orphans(&self) -> Result<usize, CacheError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT path FROM fingerprints")
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        let paths: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        drop(stmt);

        let mut count = 0;
        for path in paths {
            if !Path::new(&path).exists() {
                conn.execute("DELETE FROM fingerprints WHERE path = ?", [&path])
                    .map_err(|e| CacheError::QueryFailed(e.to_string()))?;
                count += 1;
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_entry(path: &str) -> CacheEntry {
        // Truncate to seconds so the round-trip through SQLite matches
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let now = UNIX_EPOCH + Duration::from_secs(now_secs);

        CacheEntry {
            path: PathBuf::from(path),
            fingerprint: vec![0xDE, 0xAD, 0xBE, 0xEF],
            algorithm: HashAlgorithmKind::Average,
            file_size: 1000,
            file_modified: now,
            cached_at: now,
        }
    }

    #[test]
    fn creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cache.db");

        let cache = SqliteCache::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(cache.stats().unwrap().total_entries, 0);
    }

    #[test]
    fn stores_and_retrieves() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&temp_dir.path().join("cache.db")).unwrap();

        let entry = create_entry("/test.jpg");
        let modified = entry.file_modified;

        cache.set(entry).unwrap();

        let result = cache.get(Path::new("/test.jpg"), 1000, modified).unwrap();
        assert!(result.is_some());

        let entry = result.unwrap();
        assert_eq!(entry.fingerprint, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(entry.algorithm, HashAlgorithmKind::Average);
    }

    #[test]
    fn invalidates_on_modification() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&temp_dir.path().join("cache.db")).unwrap();

        let entry = create_entry("/test.jpg");
        let modified = entry.file_modified;

        cache.set(entry).unwrap();

        let later = modified + Duration::from_secs(60);
        let result = cache.get(Path::new("/test.jpg"), 1000, later).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn batch_insert_stores_all() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&temp_dir.path().join("cache.db")).unwrap();

        let entries = vec![
            create_entry("/a.jpg"),
            create_entry("/b.jpg"),
            create_entry("/c.jpg"),
        ];

        cache.set_batch(&entries).unwrap();

        assert_eq!(cache.stats().unwrap().total_entries, 3);
    }

    #[test]
    fn clears_all_entries() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&temp_dir.path().join("cache.db")).unwrap();

        cache.set(create_entry("/a.jpg")).unwrap();
        cache.set(create_entry("/b.jpg")).unwrap();

        cache.clear().unwrap();

        assert_eq!(cache.stats().unwrap().total_entries, 0);
    }

    #[test]
    fn prunes_entries_for_deleted_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&temp_dir.path().join("cache.db")).unwrap();

        // A file that exists and one that does not
        let real_path = temp_dir.path().join("real.jpg");
        std::fs::write(&real_path, b"data").unwrap();

        cache
            .set(create_entry(&real_path.to_string_lossy()))
            .unwrap();
        cache.set(create_entry("/no/such/file.jpg")).unwrap();

        let pruned = cache.prune_orphans().unwrap();

        assert_eq!(pruned, 1);
        assert_eq!(cache.stats().unwrap().total_entries, 1);
    }

    #[test]
    fn reopens_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cache.db");

        let entry = create_entry("/persist.jpg");
        let modified = entry.file_modified;

        {
            let cache = SqliteCache::open(&db_path).unwrap();
            cache.set(entry).unwrap();
        }

        let cache = SqliteCache::open(&db_path).unwrap();
        let result = cache.get(Path::new("/persist.jpg"), 1000, modified).unwrap();

        assert!(result.is_some());
    }
}
