//! Directory walking implementation using walkdir.

use super::{FolderScanner, MediaFile, ScanOutcome};
use crate::core::classifier::{MediaClassifier, MediaKind};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            max_depth: None,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    classifier: MediaClassifier,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration and classifier
    pub fn new(config: ScanConfig, classifier: MediaClassifier) -> Self {
        Self { config, classifier }
    }

    fn is_hidden(path: &std::path::Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
    }

    fn walk(
        &self,
        root: &PathBuf,
        events: Option<&EventSender>,
    ) -> Result<ScanOutcome, ScanError> {
        if !root.exists() || !root.is_dir() {
            return Err(ScanError::PathNotFound { path: root.clone() });
        }

        let mut outcome = ScanOutcome {
            images: Vec::new(),
            videos: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        };
        let mut directories_scanned = 0;
        let mut files_found = 0;

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    let path = entry.path();

                    if path.is_dir() {
                        directories_scanned += 1;

                        if let Some(sender) = events {
                            sender.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                                directories_scanned,
                                files_found,
                                current_path: path.to_path_buf(),
                            })));
                        }
                        continue;
                    }

                    if !self.config.include_hidden && Self::is_hidden(path) {
                        continue;
                    }

                    match fs::metadata(path) {
                        Ok(metadata) => {
                            files_found += 1;

                            let kind = self.classifier.classify(path, metadata.len());
                            let file = MediaFile {
                                path: path.to_path_buf(),
                                size: metadata.len(),
                                modified: metadata
                                    .modified()
                                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
                                kind,
                            };

                            match kind {
                                MediaKind::Image => outcome.images.push(file),
                                MediaKind::Video => outcome.videos.push(file),
                                MediaKind::Unsupported => outcome.skipped.push(file),
                            }
                        }
                        Err(e) => {
                            let error = if e.kind() == std::io::ErrorKind::PermissionDenied {
                                ScanError::PermissionDenied {
                                    path: path.to_path_buf(),
                                }
                            } else {
                                ScanError::ReadEntry {
                                    path: path.to_path_buf(),
                                    source: e,
                                }
                            };

                            if let Some(sender) = events {
                                sender.send(Event::Scan(ScanEvent::Error {
                                    path: path.to_path_buf(),
                                    message: error.to_string(),
                                }));
                            }

                            outcome.errors.push(error);
                        }
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();

                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadEntry {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    if let Some(sender) = events {
                        sender.send(Event::Scan(ScanEvent::Error {
                            path,
                            message: error.to_string(),
                        }));
                    }

                    outcome.errors.push(error);
                }
            }
        }

        // Hidden directories are pruned after the fact so walkdir can still
        // report per-entry errors inside them when configured to descend.
        if !self.config.include_hidden {
            let root = root.clone();
            let under_hidden = |f: &MediaFile| {
                f.path
                    .strip_prefix(&root)
                    .ok()
                    .map(|rel| rel.components().any(|c| c.as_os_str().to_string_lossy().starts_with('.')))
                    .unwrap_or(false)
            };
            outcome.images.retain(|f| !under_hidden(f));
            outcome.videos.retain(|f| !under_hidden(f));
            outcome.skipped.retain(|f| !under_hidden(f));
        }

        Ok(outcome)
    }
}

impl FolderScanner for WalkDirScanner {
    fn scan(&self, root: &PathBuf) -> Result<ScanOutcome, ScanError> {
        self.walk(root, None)
    }

    fn scan_with_events(
        &self,
        root: &PathBuf,
        events: &EventSender,
    ) -> Result<ScanOutcome, ScanError> {
        events.send(Event::Scan(ScanEvent::Started { root: root.clone() }));

        let outcome = self.walk(root, Some(events))?;

        events.send(Event::Scan(ScanEvent::Completed {
            images: outcome.images.len(),
            videos: outcome.videos.len(),
            skipped: outcome.skipped.len(),
        }));

        Ok(outcome)
    }
}
