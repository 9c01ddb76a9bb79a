//! # Relocation Module
//!
//! Moves or copies files into the output layout after the partition is
//! final:
//!
//! ```text
//! output/
//!   unique_photos/      keepers and non-duplicates (copied or moved)
//!   duplicates/
//!     group_<id>/       redundant members of each group (always moved)
//!   videos/             videos (always moved)
//! ```
//!
//! Destination names never overwrite: an existing `name.ext` becomes
//! `name_YYYYMMDD_HHMMSS.ext`, and further collisions within the same
//! second append a counter. Per-file failures are accumulated, never
//! fatal. Cross-filesystem moves fall back to copy plus size
//! verification before the source is deleted.

use crate::core::index::DuplicateGroup;
use crate::core::scanner::MediaFile;
use crate::error::RelocationFailure;
use crate::events::{Event, EventSender, RelocateEvent};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Output subdirectory for keepers and non-duplicates
pub const UNIQUE_DIR: &str = "unique_photos";
/// Output subdirectory for redundant duplicates, one folder per group
pub const DUPLICATES_DIR: &str = "duplicates";
/// Output subdirectory for videos
pub const VIDEOS_DIR: &str = "videos";

/// What to do with unique files. Redundant duplicates and videos are
/// always moved regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelocateAction {
    /// Copy uniques, leaving the originals in place
    #[default]
    Copy,
    /// Move uniques out of the source folder
    Move,
}

/// Outcome of a relocation pass
#[derive(Debug, Default)]
pub struct RelocationReport {
    /// Number of files successfully relocated
    pub relocated: usize,
    /// Per-file failures, in encounter order
    pub failures: Vec<RelocationFailure>,
}

/// Relocates partitioned files into the output layout
pub struct Relocator {
    output_dir: PathBuf,
    action: RelocateAction,
}

impl Relocator {
    /// Create a relocator writing under the given output directory
    pub fn new(output_dir: PathBuf, action: RelocateAction) -> Self {
        Self { output_dir, action }
    }

    /// Relocate the full partition: uniques, duplicate groups, videos.
    pub fn relocate(
        &self,
        uniques: &[MediaFile],
        groups: &[DuplicateGroup],
        videos: &[MediaFile],
        events: &EventSender,
    ) -> RelocationReport {
        let redundant_total: usize = groups.iter().map(|g| g.redundant.len()).sum();
        let total_files = uniques.len() + redundant_total + videos.len();

        events.send(Event::Relocate(RelocateEvent::Started { total_files }));

        let mut report = RelocationReport::default();

        let unique_dir = self.output_dir.join(UNIQUE_DIR);
        for file in uniques {
            self.transfer(&file.path, &unique_dir, self.action, events, &mut report);
        }

        for group in groups {
            let group_dir = self.output_dir.join(DUPLICATES_DIR).join(group.folder_name());
            for member in &group.redundant {
                self.transfer(&member.path, &group_dir, RelocateAction::Move, events, &mut report);
            }
        }

        let video_dir = self.output_dir.join(VIDEOS_DIR);
        for video in videos {
            self.transfer(&video.path, &video_dir, RelocateAction::Move, events, &mut report);
        }

        events.send(Event::Relocate(RelocateEvent::Completed {
            relocated: report.relocated,
            failed: report.failures.len(),
        }));

        report
    }

    fn transfer(
        &self,
        source: &Path,
        dest_dir: &Path,
        action: RelocateAction,
        events: &EventSender,
        report: &mut RelocationReport,
    ) {
        let file_name = match source.file_name() {
            Some(name) => name,
            None => {
                report.failures.push(RelocationFailure {
                    source: source.to_path_buf(),
                    destination: dest_dir.to_path_buf(),
                    reason: "source path has no file name".to_string(),
                });
                return;
            }
        };

        if let Err(e) = fs::create_dir_all(dest_dir) {
            report.failures.push(RelocationFailure {
                source: source.to_path_buf(),
                destination: dest_dir.to_path_buf(),
                reason: format!("failed to create destination directory: {}", e),
            });
            return;
        }

        let destination = unique_target_path(&dest_dir.join(file_name));

        let result = match action {
            RelocateAction::Copy => fs::copy(source, &destination).map(|_| ()),
            RelocateAction::Move => move_file(source, &destination),
        };

        match result {
            Ok(()) => {
                debug!(source = %source.display(), destination = %destination.display(), "relocated");
                events.send(Event::Relocate(RelocateEvent::FileRelocated {
                    source: source.to_path_buf(),
                    destination: destination.clone(),
                }));
                report.relocated += 1;
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "relocation failed");
                events.send(Event::Relocate(RelocateEvent::Error {
                    source: source.to_path_buf(),
                    message: e.to_string(),
                }));
                report.failures.push(RelocationFailure {
                    source: source.to_path_buf(),
                    destination,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Move a file, falling back to copy + verify + delete when rename fails
/// (typically across filesystems).
fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    fs::rename(source, destination).or_else(|_| {
        let source_size = fs::metadata(source)?.len();
        fs::copy(source, destination)?;

        let dest_size = fs::metadata(destination)?.len();
        if dest_size != source_size {
            // Incomplete copy: keep the source, remove the partial file
            let _ = fs::remove_file(destination);
            return Err(std::io::Error::other(format!(
                "copy verification failed: source {} bytes, destination {} bytes",
                source_size, dest_size
            )));
        }

        fs::remove_file(source)
    })
}

/// Return a destination path that does not collide with an existing file.
///
/// An existing `name.ext` becomes `name_YYYYMMDD_HHMMSS.ext`; repeated
/// collisions within the same second append `_1`, `_2`, and so on.
fn unique_target_path(desired: &Path) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = desired
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = desired.parent().unwrap_or_else(|| Path::new(""));

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    let candidate = parent.join(format!("{}_{}{}", stem, timestamp, extension));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1;
    loop {
        let candidate = parent.join(format!("{}_{}_{}{}", stem, timestamp, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
