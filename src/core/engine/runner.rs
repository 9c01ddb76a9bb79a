//! Engine run loop: scan, batched hashing, grouping, relocation.

use super::{CancellationToken, Engine, ProcessingResult, RunStats};
use crate::core::cache::CacheEntry;
use crate::core::classifier::MediaClassifier;
use crate::core::hasher::{Fingerprint, HasherConfig};
use crate::core::index::{HashedFile, SimilarityIndex};
use crate::core::relocate::Relocator;
use crate::core::scanner::{FolderScanner, MediaFile, WalkDirScanner};
use crate::error::Result;
use crate::events::{
    EnginePhase, Event, EventSender, EngineEvent, GroupEvent, HashEvent, HashProgress, RunSummary,
    null_sender,
};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};

impl Engine {
    /// Run without progress reporting or cancellation
    pub fn run(&self) -> Result<ProcessingResult> {
        self.run_with_events(&null_sender(), &CancellationToken::new())
    }

    /// Run with event reporting and cooperative cancellation.
    ///
    /// Cancellation is honored between batches: in-flight hashes finish,
    /// the partition is computed over whatever was hashed, and relocation
    /// is skipped entirely.
    pub fn run_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ProcessingResult> {
        let config = self.config();
        config.validate()?;

        let start = Instant::now();
        events.send(Event::Engine(EngineEvent::Started));

        // Phase 1: scan
        events.send(Event::Engine(EngineEvent::PhaseChanged {
            phase: EnginePhase::Scanning,
        }));
        info!(root = %config.root.display(), "scanning");

        let scanner = WalkDirScanner::new(config.scan.clone(), MediaClassifier::new());
        let outcome = scanner.scan_with_events(&config.root, events)?;

        let mut result = ProcessingResult {
            videos: outcome.videos,
            skipped: outcome.skipped,
            scan_errors: outcome.errors.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        };
        result.stats.files_scanned =
            outcome.images.len() + result.videos.len() + result.skipped.len();
        result.stats.images = outcome.images.len();
        result.stats.videos = result.videos.len();
        result.stats.skipped = result.skipped.len();

        info!(
            images = result.stats.images,
            videos = result.stats.videos,
            skipped = result.stats.skipped,
            errors = result.scan_errors.len(),
            "scan complete"
        );

        // Phase 2: hash in batches
        events.send(Event::Engine(EngineEvent::PhaseChanged {
            phase: EnginePhase::Hashing,
        }));

        let images = outcome.images;
        events.send(Event::Hash(HashEvent::Started {
            total_images: images.len(),
        }));

        let mut index = SimilarityIndex::new(config.threshold, config.strategy);
        let hashing = self.hash_batches(&images, &mut index, events, cancel)?;

        result.unreadable = hashing.unreadable;
        result.stats.cache_hits = hashing.cache_hits;
        result.stats.unreadable = result.unreadable.len();
        result.cancelled = cancel.is_cancelled();

        events.send(Event::Hash(HashEvent::Completed {
            total_hashed: index.len(),
            cache_hits: result.stats.cache_hits,
            unreadable: result.stats.unreadable,
        }));

        // Phase 3: group
        events.send(Event::Engine(EngineEvent::PhaseChanged {
            phase: EnginePhase::Grouping,
        }));
        events.send(Event::Group(GroupEvent::Started {
            total_fingerprints: index.len(),
        }));

        let grouping = index.into_groups();
        result.uniques = grouping.uniques;
        result.groups = grouping.groups;

        events.send(Event::Group(GroupEvent::Completed {
            total_groups: result.groups.len(),
            total_redundant: result.redundant_count(),
        }));
        info!(
            groups = result.groups.len(),
            redundant = result.redundant_count(),
            uniques = result.uniques.len(),
            "grouping complete"
        );

        // Phase 4: relocate, only with a final partition on an
        // uncancelled, non-dry run
        if result.cancelled {
            events.send(Event::Engine(EngineEvent::Cancelled));
            info!("run cancelled, skipping relocation");
        } else if !config.dry_run {
            if let Some(output_dir) = &config.output_dir {
                events.send(Event::Engine(EngineEvent::PhaseChanged {
                    phase: EnginePhase::Relocating,
                }));

                // Keepers belong with the uniques in the output layout
                let mut to_unique_dir = result.uniques.clone();
                to_unique_dir.extend(result.groups.iter().map(|g| g.keeper.clone()));

                let relocator = Relocator::new(output_dir.clone(), config.action);
                let report =
                    relocator.relocate(&to_unique_dir, &result.groups, &result.videos, events);

                result.relocated = report.relocated;
                result.relocation_failures = report.failures;

                info!(
                    relocated = result.relocated,
                    failed = result.relocation_failures.len(),
                    "relocation complete"
                );
            }
        }

        result.stats.duration_ms = start.elapsed().as_millis() as u64;

        if !result.cancelled {
            events.send(Event::Engine(EngineEvent::Completed {
                summary: RunSummary {
                    total_files: result.stats.files_scanned,
                    duplicate_groups: result.groups.len(),
                    redundant_count: result.redundant_count(),
                    videos: result.videos.len(),
                    duration_ms: result.stats.duration_ms,
                },
            }));
        }

        Ok(result)
    }

    fn hash_batches(
        &self,
        images: &[MediaFile],
        index: &mut SimilarityIndex,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<HashingOutcome> {
        let config = self.config();

        let hasher = HasherConfig::new()
            .algorithm(config.algorithm)
            .hash_size(config.hash_size)
            .build()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.resource_mode.worker_count())
            .build()
            .map_err(|e| crate::error::EngineError::Config(e.to_string()))?;

        let total = images.len();
        let total_batches = total.div_ceil(config.batch_size).max(1);
        let completed = AtomicUsize::new(0);
        let cache_hit_count = AtomicUsize::new(0);

        let mut outcome = HashingOutcome::default();

        for (batch_number, batch) in images.chunks(config.batch_size).enumerate() {
            if cancel.is_cancelled() {
                debug!(batch = batch_number, "cancellation requested, stopping");
                break;
            }

            let batch_results: Vec<BatchItem> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|file| {
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                        if let Ok(Some(entry)) =
                            self.cache.get(&file.path, file.size, file.modified)
                        {
                            // An entry written under a different algorithm
                            // or grid size must not enter this run's index;
                            // recomputing below overwrites it
                            if entry.algorithm == config.algorithm
                                && entry.fingerprint.len() == hasher.fingerprint_len()
                            {
                                cache_hit_count.fetch_add(1, Ordering::SeqCst);
                                events.send(Event::Hash(HashEvent::CacheHit {
                                    path: file.path.clone(),
                                }));

                                return BatchItem::Cached(HashedFile {
                                    file: file.clone(),
                                    fingerprint: Fingerprint::from_bytes(
                                        &entry.fingerprint,
                                        entry.algorithm,
                                    ),
                                });
                            }
                        }

                        match hasher.hash_file(&file.path) {
                            Ok(fingerprint) => {
                                events.send(Event::Hash(HashEvent::Progress(HashProgress {
                                    completed: done,
                                    total,
                                    current_path: file.path.clone(),
                                    cache_hits: cache_hit_count.load(Ordering::SeqCst),
                                })));

                                BatchItem::Computed(HashedFile {
                                    file: file.clone(),
                                    fingerprint,
                                })
                            }
                            Err(e) => {
                                warn!(path = %file.path.display(), error = %e, "unreadable image");
                                events.send(Event::Hash(HashEvent::Unreadable {
                                    path: file.path.clone(),
                                    message: e.to_string(),
                                }));
                                BatchItem::Unreadable(file.path.clone(), e.to_string())
                            }
                        }
                    })
                    .collect()
            });

            // Persist freshly computed fingerprints in one transaction
            let new_entries: Vec<CacheEntry> = batch_results
                .iter()
                .filter_map(|item| match item {
                    BatchItem::Computed(hashed) => Some(CacheEntry {
                        path: hashed.file.path.clone(),
                        fingerprint: hashed.fingerprint.as_bytes().to_vec(),
                        algorithm: config.algorithm,
                        file_size: hashed.file.size,
                        file_modified: hashed.file.modified,
                        cached_at: SystemTime::now(),
                    }),
                    _ => None,
                })
                .collect();

            if !new_entries.is_empty() {
                if let Err(e) = self.cache.set_batch(&new_entries) {
                    warn!(error = %e, "failed to persist fingerprints to cache");
                }
            }

            // Deterministic insertion order regardless of worker timing:
            // size descending, then path ascending
            let mut hashed: Vec<HashedFile> = Vec::with_capacity(batch_results.len());
            for item in batch_results {
                match item {
                    BatchItem::Cached(h) | BatchItem::Computed(h) => hashed.push(h),
                    BatchItem::Unreadable(path, message) => {
                        outcome.unreadable.push((path, message));
                    }
                }
            }
            hashed.sort_by(|a, b| {
                b.file
                    .size
                    .cmp(&a.file.size)
                    .then_with(|| a.file.path.cmp(&b.file.path))
            });

            for entry in hashed {
                index.insert(entry);
            }

            events.send(Event::Hash(HashEvent::BatchCompleted {
                batch: batch_number + 1,
                total_batches,
            }));
        }

        outcome.cache_hits = cache_hit_count.load(Ordering::SeqCst);
        Ok(outcome)
    }
}

enum BatchItem {
    Cached(HashedFile),
    Computed(HashedFile),
    Unreadable(PathBuf, String),
}

#[derive(Default)]
struct HashingOutcome {
    cache_hits: usize,
    unreadable: Vec<(PathBuf, String)>,
}
