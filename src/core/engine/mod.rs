//! # Engine Module
//!
//! Orchestrates a full detection run: scan, hash in batches, group,
//! partition, relocate. The engine owns the phase ordering and the
//! cancellation points; the per-phase work lives in the scanner, hasher,
//! index, and relocate modules.

mod runner;

use crate::core::cache::{FingerprintCache, InMemoryCache};
use crate::core::hasher::HashAlgorithmKind;
use crate::core::index::{
    DuplicateGroup, GroupingStrategy, DEFAULT_THRESHOLD, MAX_THRESHOLD, MIN_THRESHOLD,
};
use crate::core::relocate::RelocateAction;
use crate::core::scanner::{MediaFile, ScanConfig};
use crate::error::{EngineError, RelocationFailure};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default number of images hashed per batch
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// How aggressively the engine uses the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceMode {
    /// Single worker, minimal interference with other work
    Low,
    /// Half the available cores
    #[default]
    Medium,
    /// Every available core
    High,
}

impl ResourceMode {
    /// Number of hashing workers for this mode
    pub fn worker_count(self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        match self {
            ResourceMode::Low => 1,
            ResourceMode::Medium => (available / 2).max(1),
            ResourceMode::High => available,
        }
    }
}

/// Cooperative cancellation flag, checked between batches.
///
/// Cancelling mid-batch lets in-flight hashes finish; relocation is
/// skipped entirely on a cancelled run.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Configuration for an engine run
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Folder to scan
    pub root: PathBuf,
    /// Destination for relocated files; required unless `dry_run`
    pub output_dir: Option<PathBuf>,
    /// Hamming distance threshold (1..=20)
    pub threshold: u32,
    /// Images per hashing batch
    pub batch_size: usize,
    /// Worker pool sizing
    pub resource_mode: ResourceMode,
    /// Copy or move unique files (duplicates and videos always move)
    pub action: RelocateAction,
    /// Clustering strategy
    pub strategy: GroupingStrategy,
    /// Fingerprint algorithm
    pub algorithm: HashAlgorithmKind,
    /// Fingerprint grid size (8 = 64 bits)
    pub hash_size: u32,
    /// Scanner options
    pub scan: ScanConfig,
    /// Compute the partition without touching any files
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            output_dir: None,
            threshold: DEFAULT_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            resource_mode: ResourceMode::default(),
            action: RelocateAction::default(),
            strategy: GroupingStrategy::default(),
            algorithm: HashAlgorithmKind::Average,
            hash_size: 8,
            scan: ScanConfig::default(),
            dry_run: false,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration before any work starts.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&self.threshold) {
            return Err(EngineError::Config(format!(
                "threshold must be between {} and {}, got {}",
                MIN_THRESHOLD, MAX_THRESHOLD, self.threshold
            )));
        }

        if self.batch_size == 0 {
            return Err(EngineError::Config(
                "batch size must be greater than zero".to_string(),
            ));
        }

        if self.hash_size == 0 {
            return Err(EngineError::Config(
                "hash size must be greater than zero".to_string(),
            ));
        }

        if !self.root.is_dir() {
            return Err(EngineError::Config(format!(
                "root folder does not exist or is not a directory: {}",
                self.root.display()
            )));
        }

        if !self.dry_run && self.output_dir.is_none() {
            return Err(EngineError::Config(
                "an output directory is required unless running dry".to_string(),
            ));
        }

        Ok(())
    }
}

/// Run statistics for reporting
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Files discovered by the scan (all kinds)
    pub files_scanned: usize,
    /// Images considered for hashing
    pub images: usize,
    /// Videos separated
    pub videos: usize,
    /// Unsupported files skipped
    pub skipped: usize,
    /// Fingerprints served from cache
    pub cache_hits: usize,
    /// Images that could not be decoded
    pub unreadable: usize,
    /// Total run duration in milliseconds
    pub duration_ms: u64,
}

/// Result of a full engine run.
///
/// `uniques`, the members of `groups`, and `videos` are pairwise
/// disjoint, and together they cover every classifiable input file.
/// Skipped and unreadable files sit outside the partition.
#[derive(Debug, Default)]
pub struct ProcessingResult {
    /// Images that matched no group
    pub uniques: Vec<MediaFile>,
    /// Duplicate groups (keeper + redundant members)
    pub groups: Vec<DuplicateGroup>,
    /// Videos, separated without hashing
    pub videos: Vec<MediaFile>,
    /// Unsupported files, excluded from all partitions
    pub skipped: Vec<MediaFile>,
    /// Images excluded because they could not be decoded
    pub unreadable: Vec<(PathBuf, String)>,
    /// Non-fatal scan errors, as messages
    pub scan_errors: Vec<String>,
    /// Files successfully relocated (0 on dry runs)
    pub relocated: usize,
    /// Per-file relocation failures
    pub relocation_failures: Vec<RelocationFailure>,
    /// Whether the run was cancelled before completing
    pub cancelled: bool,
    /// Timing and counters
    pub stats: RunStats,
}

impl ProcessingResult {
    /// Total redundant (non-keeper) files across all groups
    pub fn redundant_count(&self) -> usize {
        self.groups.iter().map(|g| g.redundant.len()).sum()
    }

    /// Unique files including group keepers
    pub fn unique_count(&self) -> usize {
        self.uniques.len() + self.groups.len()
    }
}

/// Builder for the detection engine
pub struct EngineBuilder {
    config: EngineConfig,
    cache: Option<Box<dyn FingerprintCache>>,
}

impl EngineBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            cache: None,
        }
    }

    /// Set the full configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the folder to scan
    pub fn root(mut self, root: PathBuf) -> Self {
        self.config.root = root;
        self
    }

    /// Set the output directory
    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.config.output_dir = Some(dir);
        self
    }

    /// Set the similarity threshold
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Compute the partition without relocating anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Set the fingerprint cache backend
    pub fn cache(mut self, cache: Box<dyn FingerprintCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the engine. Falls back to an in-memory cache when none is set.
    pub fn build(self) -> Engine {
        Engine {
            config: self.config,
            cache: self.cache.unwrap_or_else(|| Box::new(InMemoryCache::new())),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The duplicate detection engine
pub struct Engine {
    config: EngineConfig,
    cache: Box<dyn FingerprintCache>,
}

impl Engine {
    /// Create a new engine builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
