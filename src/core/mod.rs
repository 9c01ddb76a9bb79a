//! Core detection engine.
//!
//! The pipeline runs in phases: [`scanner`] discovers and classifies
//! files, [`hasher`] computes perceptual fingerprints (consulting
//! [`cache`]), [`index`] clusters near-duplicates, and [`relocate`]
//! applies the partition to disk. [`engine`] orchestrates the phases.

pub mod cache;
pub mod classifier;
pub mod engine;
pub mod hasher;
pub mod index;
pub mod relocate;
pub mod scanner;

pub use cache::{FingerprintCache, InMemoryCache, SqliteCache};
pub use classifier::{MediaClassifier, MediaKind};
pub use engine::{
    CancellationToken, Engine, EngineBuilder, EngineConfig, ProcessingResult, ResourceMode,
    RunStats,
};
pub use hasher::{Fingerprint, HashAlgorithm, HashAlgorithmKind, HasherConfig};
pub use index::{DuplicateGroup, GroupingStrategy, SimilarityIndex};
pub use relocate::{RelocateAction, Relocator};
pub use scanner::{FolderScanner, MediaFile, ScanConfig, ScanOutcome, WalkDirScanner};
