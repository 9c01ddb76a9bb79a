//! # Error Module
//!
//! Error types for the picture finder engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Per-file failures are not fatal** - scan, hash, and relocation errors
//!   are collected into the run result instead of aborting the run
//! - **Fail fast only on configuration** - a bad threshold or missing root
//!   folder is rejected before any work begins

use std::path::PathBuf;
use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while walking the input folder.
///
/// All of these are per-entry: the scan records them and continues.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Path not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read entry {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur during fingerprint computation
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Unreadable image {path}: {reason}")]
    UnreadableImage { path: PathBuf, reason: String },

    #[error("Invalid hasher configuration: {0}")]
    Configuration(String),

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur with the fingerprint cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to open cache database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Cache corruption detected at {path}. Delete this file and try again.")]
    Corrupted { path: PathBuf },
}

/// A single failed copy/move, recorded in the result rather than thrown.
///
/// Relocation is not transactional: each file either lands or is recorded
/// here, and the run as a whole never fails because of one file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RelocationFailure {
    /// File that failed to relocate
    pub source: PathBuf,
    /// Destination that was attempted
    pub destination: PathBuf,
    /// What went wrong
    pub reason: String,
}

impl std::fmt::Display for RelocationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to relocate {} to {}: {}",
            self.source.display(),
            self.destination.display(),
            self.reason
        )
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
