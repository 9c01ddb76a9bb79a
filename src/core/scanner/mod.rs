//! # Scanner Module
//!
//! Discovers media files under a root folder.
//!
//! The walk is partial-failure tolerant: unreadable entries are recorded
//! and skipped, never aborting the scan. Each discovered file is classified
//! at scan time, so a [`MediaFile`] is immutable after discovery.

mod walker;

pub use walker::{ScanConfig, WalkDirScanner};

use crate::core::classifier::MediaKind;
use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A media file discovered during the scan.
///
/// Created once at scan time and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
    /// Classified media kind
    pub kind: MediaKind,
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanOutcome {
    /// Image files eligible for fingerprinting
    pub images: Vec<MediaFile>,
    /// Video files, separated from duplicate detection
    pub videos: Vec<MediaFile>,
    /// Unsupported files, excluded from all partitions
    pub skipped: Vec<MediaFile>,
    /// Per-entry errors recorded during the walk (non-fatal)
    pub errors: Vec<ScanError>,
}

impl ScanOutcome {
    /// Total number of classifiable files (images + videos)
    pub fn classifiable_count(&self) -> usize {
        self.images.len() + self.videos.len()
    }
}

/// Trait for folder scanners
///
/// Implement this trait to create custom scanners (e.g., for testing).
pub trait FolderScanner: Send + Sync {
    /// Scan the root folder and return classified files
    fn scan(&self, root: &PathBuf) -> Result<ScanOutcome, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(
        &self,
        root: &PathBuf,
        events: &EventSender,
    ) -> Result<ScanOutcome, ScanError>;
}
