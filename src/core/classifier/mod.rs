//! # Classifier Module
//!
//! Partitions discovered files into images, videos, and unsupported files.
//!
//! ## Rules
//! - **Video**: extension matches the video set, or the file is larger than
//!   the video size threshold (default 50 MB)
//! - **Image**: extension matches the image set
//! - **Unsupported**: everything else - excluded from all partitions and
//!   surfaced in the result as skipped
//!
//! Classification is a pure function of (path, size); it never touches
//! the filesystem.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Large-file threshold above which a file is treated as a video (50 MB)
pub const DEFAULT_VIDEO_SIZE_THRESHOLD: u64 = 50 * 1024 * 1024;

/// The kind of media a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Classifies files by extension and size
#[derive(Debug, Clone)]
pub struct MediaClassifier {
    image_extensions: HashSet<String>,
    video_extensions: HashSet<String>,
    video_size_threshold: u64,
}

impl MediaClassifier {
    /// Create a classifier with the default extension sets and size threshold
    pub fn new() -> Self {
        Self {
            image_extensions: [
                "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            video_extensions: [
                "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v", "3gp", "ogv",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            video_size_threshold: DEFAULT_VIDEO_SIZE_THRESHOLD,
        }
    }

    /// Override the image extension set
    pub fn with_image_extensions(mut self, extensions: Vec<String>) -> Self {
        self.image_extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Override the video extension set
    pub fn with_video_extensions(mut self, extensions: Vec<String>) -> Self {
        self.video_extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Override the byte threshold above which files are treated as videos
    pub fn with_video_size_threshold(mut self, bytes: u64) -> Self {
        self.video_size_threshold = bytes;
        self
    }

    /// Classify a file by its path and size.
    ///
    /// The size rule runs before the image extension check, so a file
    /// above the threshold lands in the video partition even when it
    /// carries an image extension, and is never hashed.
    pub fn classify(&self, path: &Path, size: u64) -> MediaKind {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        if let Some(ref ext) = ext {
            if self.video_extensions.contains(ext) {
                return MediaKind::Video;
            }
        }

        if size > self.video_size_threshold {
            return MediaKind::Video;
        }

        match ext {
            Some(ext) if self.image_extensions.contains(&ext) => MediaKind::Image,
            _ => MediaKind::Unsupported,
        }
    }
}

impl Default for MediaClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_images_by_extension() {
        let classifier = MediaClassifier::new();
        assert_eq!(
            classifier.classify(Path::new("/photos/a.jpg"), 1024),
            MediaKind::Image
        );
        assert_eq!(
            classifier.classify(Path::new("/photos/b.PNG"), 1024),
            MediaKind::Image
        );
        assert_eq!(
            classifier.classify(Path::new("/photos/IMG_1234.HEIC"), 1024),
            MediaKind::Image
        );
    }

    #[test]
    fn classifies_videos_by_extension() {
        let classifier = MediaClassifier::new();
        assert_eq!(
            classifier.classify(Path::new("/media/clip.mp4"), 1024),
            MediaKind::Video
        );
        assert_eq!(
            classifier.classify(Path::new("/media/clip.MOV"), 1024),
            MediaKind::Video
        );
    }

    #[test]
    fn large_files_classify_as_videos() {
        let classifier = MediaClassifier::new();
        let over = DEFAULT_VIDEO_SIZE_THRESHOLD + 1;
        assert_eq!(
            classifier.classify(Path::new("/media/huge.bin"), over),
            MediaKind::Video
        );
    }

    #[test]
    fn oversized_image_extension_is_still_a_video() {
        let classifier = MediaClassifier::new();
        let over = DEFAULT_VIDEO_SIZE_THRESHOLD + 1;
        assert_eq!(
            classifier.classify(Path::new("/photos/panorama.jpg"), over),
            MediaKind::Video
        );
    }

    #[test]
    fn size_exactly_at_threshold_is_not_video() {
        let classifier = MediaClassifier::new();
        assert_eq!(
            classifier.classify(Path::new("/media/at_limit.dat"), DEFAULT_VIDEO_SIZE_THRESHOLD),
            MediaKind::Unsupported
        );
    }

    #[test]
    fn unknown_extensions_are_unsupported() {
        let classifier = MediaClassifier::new();
        assert_eq!(
            classifier.classify(Path::new("/docs/readme.txt"), 1024),
            MediaKind::Unsupported
        );
        assert_eq!(
            classifier.classify(Path::new("/docs/no_extension"), 1024),
            MediaKind::Unsupported
        );
    }

    #[test]
    fn custom_size_threshold_is_respected() {
        let classifier = MediaClassifier::new().with_video_size_threshold(100);
        assert_eq!(
            classifier.classify(Path::new("/a.dat"), 101),
            MediaKind::Video
        );
        assert_eq!(
            classifier.classify(Path::new("/a.jpg"), 99),
            MediaKind::Image
        );
    }
}
