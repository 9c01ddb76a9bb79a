//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the detection engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Hashing phase events
    Hash(HashEvent),
    /// Grouping phase events
    Group(GroupEvent),
    /// Relocation phase events
    Relocate(RelocateEvent),
    /// Engine-level events
    Engine(EngineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed {
        images: usize,
        videos: usize,
        skipped: usize,
    },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of files found so far
    pub files_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events during the hashing phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Hashing has started
    Started { total_images: usize },
    /// Progress update during hashing
    Progress(HashProgress),
    /// A fingerprint was loaded from cache (no rehashing needed)
    CacheHit { path: PathBuf },
    /// A file could not be decoded; it is excluded from grouping
    Unreadable { path: PathBuf, message: String },
    /// A batch of files finished hashing
    BatchCompleted { batch: usize, total_batches: usize },
    /// Hashing completed
    Completed {
        total_hashed: usize,
        cache_hits: usize,
        unreadable: usize,
    },
}

/// Progress information during hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Number of images hashed so far
    pub completed: usize,
    /// Total number of images to hash
    pub total: usize,
    /// Current image being hashed
    pub current_path: PathBuf,
    /// Number of cache hits
    pub cache_hits: usize,
}

/// Events during the grouping phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEvent {
    /// Grouping has started
    Started { total_fingerprints: usize },
    /// Grouping completed
    Completed {
        total_groups: usize,
        total_redundant: usize,
    },
}

/// Events during the relocation phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RelocateEvent {
    /// Relocation has started
    Started { total_files: usize },
    /// A file was relocated
    FileRelocated {
        source: PathBuf,
        destination: PathBuf,
    },
    /// A file failed to relocate; the run continues
    Error {
        source: PathBuf,
        message: String,
    },
    /// Relocation completed
    Completed { relocated: usize, failed: usize },
}

/// Engine-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Engine run has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: EnginePhase },
    /// Engine run completed successfully
    Completed { summary: RunSummary },
    /// Engine run was cancelled between batches
    Cancelled,
}

/// Phases of an engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    Scanning,
    Hashing,
    Grouping,
    Relocating,
}

/// Summary of an engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total files discovered by the scan
    pub total_files: usize,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Total number of redundant files (excluding keepers)
    pub redundant_count: usize,
    /// Number of videos separated
    pub videos: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnginePhase::Scanning => write!(f, "Scanning"),
            EnginePhase::Hashing => write!(f, "Hashing"),
            EnginePhase::Grouping => write!(f, "Grouping"),
            EnginePhase::Relocating => write!(f, "Relocating"),
        }
    }
}
