//! End-to-end tests for the detection engine.
//!
//! These tests build real folders with real PNG images, run the full
//! engine, and check the partition and the on-disk output layout.

use image::{ImageBuffer, Rgb};
use picture_finder::core::cache::InMemoryCache;
use picture_finder::core::relocate::{DUPLICATES_DIR, UNIQUE_DIR, VIDEOS_DIR};
use picture_finder::core::{Engine, EngineConfig, HashAlgorithmKind, RelocateAction};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Seeds below 128 produce a left-to-right brightness ramp, higher seeds
/// the inverted ramp, so seeds on opposite sides of 128 fingerprint far
/// apart.
fn ramp_image(seed: u8) -> image::DynamicImage {
    let img = ImageBuffer::from_fn(32, 32, |x, _| {
        let ramp = (x * 255 / 31) as u8;
        let v = if seed < 128 { ramp } else { 255 - ramp };
        Rgb([v, v, seed])
    });
    image::DynamicImage::ImageRgb8(img)
}

/// Write a ramp image; the encoder is picked from the file extension.
fn save_image(dir: &Path, name: &str, seed: u8) -> PathBuf {
    let path = dir.join(name);
    ramp_image(seed).save(&path).unwrap();
    path
}

fn dry_config(root: &Path) -> EngineConfig {
    EngineConfig {
        root: root.to_path_buf(),
        dry_run: true,
        ..Default::default()
    }
}

fn relocating_config(root: &Path, output: &Path, action: RelocateAction) -> EngineConfig {
    EngineConfig {
        root: root.to_path_buf(),
        output_dir: Some(output.to_path_buf()),
        action,
        dry_run: false,
        ..Default::default()
    }
}

#[test]
fn identical_copies_group_with_deterministic_keeper() {
    let source = TempDir::new().unwrap();
    let original = save_image(source.path(), "a.png", 40);
    fs::copy(&original, source.path().join("a_copy.png")).unwrap();
    fs::write(source.path().join("b.mp4"), vec![0u8; 1024]).unwrap();
    save_image(source.path(), "c.png", 220);

    let engine = Engine::builder().config(dry_config(source.path())).build();
    let result = engine.run().unwrap();

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].len(), 2);
    // Same size, so the lexicographically smaller path is kept
    assert!(result.groups[0].keeper.path.ends_with("a.png"));
    assert!(result.groups[0].redundant[0].path.ends_with("a_copy.png"));

    assert_eq!(result.videos.len(), 1);
    assert!(result.videos[0].path.ends_with("b.mp4"));

    assert_eq!(result.uniques.len(), 1);
    assert!(result.uniques[0].path.ends_with("c.png"));
}

#[test]
fn re_encoded_copy_joins_the_original_group() {
    let source = TempDir::new().unwrap();
    // Same pixel content through two encoders: lossless PNG and lossy JPEG
    save_image(source.path(), "shot.png", 40);
    save_image(source.path(), "shot.jpg", 40);
    save_image(source.path(), "other.png", 220);

    let engine = Engine::builder().config(dry_config(source.path())).build();
    let result = engine.run().unwrap();

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].len(), 2);
    assert_eq!(result.uniques.len(), 1);
    assert!(result.uniques[0].path.ends_with("other.png"));
}

#[test]
fn partition_is_disjoint_and_covers_classifiable_input() {
    let source = TempDir::new().unwrap();
    let original = save_image(source.path(), "one.png", 15);
    fs::copy(&original, source.path().join("one_copy.png")).unwrap();
    save_image(source.path(), "two.png", 120);
    save_image(source.path(), "three.png", 250);
    fs::write(source.path().join("movie.mkv"), b"x").unwrap();
    fs::write(source.path().join("notes.txt"), b"not media").unwrap();

    let engine = Engine::builder().config(dry_config(source.path())).build();
    let result = engine.run().unwrap();

    let mut partitioned: Vec<PathBuf> = Vec::new();
    partitioned.extend(result.uniques.iter().map(|f| f.path.clone()));
    for group in &result.groups {
        partitioned.push(group.keeper.path.clone());
        partitioned.extend(group.redundant.iter().map(|f| f.path.clone()));
    }
    partitioned.extend(result.videos.iter().map(|f| f.path.clone()));

    // No file appears twice across partitions
    let mut sorted = partitioned.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), partitioned.len());

    // Union covers every classifiable file: 4 images + 1 video
    assert_eq!(partitioned.len(), 5);

    // The text file is skipped, outside the partition
    assert_eq!(result.skipped.len(), 1);
    assert!(result.skipped[0].path.ends_with("notes.txt"));
}

#[test]
fn partition_is_idempotent_across_runs() {
    let source = TempDir::new().unwrap();
    let original = save_image(source.path(), "img.png", 33);
    fs::copy(&original, source.path().join("img_dup.png")).unwrap();
    save_image(source.path(), "other.png", 200);

    let collect = |result: &picture_finder::core::ProcessingResult| {
        let mut groups: Vec<(PathBuf, Vec<PathBuf>)> = result
            .groups
            .iter()
            .map(|g| {
                (
                    g.keeper.path.clone(),
                    g.redundant.iter().map(|m| m.path.clone()).collect(),
                )
            })
            .collect();
        groups.sort();
        let mut uniques: Vec<PathBuf> = result.uniques.iter().map(|f| f.path.clone()).collect();
        uniques.sort();
        (groups, uniques)
    };

    let first = {
        let engine = Engine::builder().config(dry_config(source.path())).build();
        collect(&engine.run().unwrap())
    };
    let second = {
        let engine = Engine::builder().config(dry_config(source.path())).build();
        collect(&engine.run().unwrap())
    };

    assert_eq!(first, second);
}

#[test]
fn run_relocates_into_output_layout() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let original = save_image(source.path(), "a.png", 40);
    fs::copy(&original, source.path().join("a_copy.png")).unwrap();
    save_image(source.path(), "c.png", 220);
    fs::write(source.path().join("clip.mp4"), vec![1u8; 64]).unwrap();

    let engine = Engine::builder()
        .config(relocating_config(
            source.path(),
            output.path(),
            RelocateAction::Copy,
        ))
        .build();
    let result = engine.run().unwrap();

    assert_eq!(result.relocated, 4);
    assert!(result.relocation_failures.is_empty());

    // Keeper and the non-duplicate land in unique_photos (copied)
    let unique_dir = output.path().join(UNIQUE_DIR);
    assert!(unique_dir.join("a.png").exists());
    assert!(unique_dir.join("c.png").exists());
    assert!(original.exists());

    // The redundant copy was moved into its group folder
    assert!(!source.path().join("a_copy.png").exists());
    let group_folder = output
        .path()
        .join(DUPLICATES_DIR)
        .join(result.groups[0].folder_name());
    assert!(group_folder.join("a_copy.png").exists());

    // The video was moved
    assert!(!source.path().join("clip.mp4").exists());
    assert!(output.path().join(VIDEOS_DIR).join("clip.mp4").exists());
}

#[test]
fn move_action_empties_the_source_folder() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    save_image(source.path(), "solo.png", 77);

    let engine = Engine::builder()
        .config(relocating_config(
            source.path(),
            output.path(),
            RelocateAction::Move,
        ))
        .build();
    let result = engine.run().unwrap();

    assert_eq!(result.relocated, 1);
    assert!(!source.path().join("solo.png").exists());
    assert!(output.path().join(UNIQUE_DIR).join("solo.png").exists());
}

#[test]
fn destination_collision_never_overwrites() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    save_image(source.path(), "photo.png", 90);

    // Plant a different file at the destination name
    let unique_dir = output.path().join(UNIQUE_DIR);
    fs::create_dir_all(&unique_dir).unwrap();
    fs::write(unique_dir.join("photo.png"), b"pre-existing").unwrap();

    let engine = Engine::builder()
        .config(relocating_config(
            source.path(),
            output.path(),
            RelocateAction::Copy,
        ))
        .build();
    let result = engine.run().unwrap();

    assert_eq!(result.relocated, 1);
    assert_eq!(
        fs::read(unique_dir.join("photo.png")).unwrap(),
        b"pre-existing"
    );

    // The new file landed under a timestamp-suffixed name
    let suffixed: Vec<String> = fs::read_dir(&unique_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n != "photo.png")
        .collect();
    assert_eq!(suffixed.len(), 1);
    assert!(suffixed[0].starts_with("photo_"));
    assert!(suffixed[0].ends_with(".png"));
}

#[test]
fn unreadable_image_is_excluded_but_reported() {
    let source = TempDir::new().unwrap();
    save_image(source.path(), "fine.png", 50);
    fs::write(source.path().join("junk.jpg"), b"garbage bytes").unwrap();

    let engine = Engine::builder().config(dry_config(source.path())).build();
    let result = engine.run().unwrap();

    assert_eq!(result.unreadable.len(), 1);
    assert!(result.unreadable[0].0.ends_with("junk.jpg"));
    assert_eq!(result.uniques.len(), 1);
    assert!(result.groups.is_empty());
}

#[test]
fn cancelled_run_touches_no_files() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let original = save_image(source.path(), "a.png", 40);
    fs::copy(&original, source.path().join("a_copy.png")).unwrap();

    let engine = Engine::builder()
        .config(relocating_config(
            source.path(),
            output.path(),
            RelocateAction::Move,
        ))
        .build();

    let token = picture_finder::core::CancellationToken::new();
    token.cancel();

    let result = engine
        .run_with_events(&picture_finder::events::null_sender(), &token)
        .unwrap();

    assert!(result.cancelled);
    assert_eq!(result.relocated, 0);
    assert!(original.exists());
    assert!(source.path().join("a_copy.png").exists());
    assert!(!output.path().join(UNIQUE_DIR).exists());
}

#[test]
fn explicit_cache_backend_is_used_across_runs() {
    let source = TempDir::new().unwrap();
    save_image(source.path(), "a.png", 40);
    save_image(source.path(), "b.png", 160);

    let cache = std::sync::Arc::new(InMemoryCache::new());

    // Two engines sharing one backend via separate handles
    let first = Engine::builder()
        .config(dry_config(source.path()))
        .cache(Box::new(SharedCache(cache.clone())))
        .build()
        .run()
        .unwrap();
    assert_eq!(first.stats.cache_hits, 0);

    let second = Engine::builder()
        .config(dry_config(source.path()))
        .cache(Box::new(SharedCache(cache)))
        .build()
        .run()
        .unwrap();
    assert_eq!(second.stats.cache_hits, 2);
}

#[test]
fn changed_hasher_configuration_misses_the_cache() {
    let source = TempDir::new().unwrap();
    save_image(source.path(), "a.png", 40);
    save_image(source.path(), "b.png", 160);

    let cache = std::sync::Arc::new(InMemoryCache::new());

    let run_with = |algorithm, hash_size| {
        Engine::builder()
            .config(EngineConfig {
                algorithm,
                hash_size,
                ..dry_config(source.path())
            })
            .cache(Box::new(SharedCache(cache.clone())))
            .build()
            .run()
            .unwrap()
    };

    let first = run_with(HashAlgorithmKind::Average, 8);
    assert_eq!(first.stats.cache_hits, 0);

    // Fingerprints stored under aHash must not be served to a pHash run
    let second = run_with(HashAlgorithmKind::Perceptual, 8);
    assert_eq!(second.stats.cache_hits, 0);

    // Nor across grid sizes under the same algorithm
    let third = run_with(HashAlgorithmKind::Average, 16);
    assert_eq!(third.stats.cache_hits, 0);

    // Each run overwrites the stale entries, so a matching rerun hits
    let fourth = run_with(HashAlgorithmKind::Average, 16);
    assert_eq!(fourth.stats.cache_hits, 2);
}

/// Adapter that lets two engines share one in-memory cache.
struct SharedCache(std::sync::Arc<InMemoryCache>);

impl picture_finder::core::FingerprintCache for SharedCache {
    fn get(
        &self,
        path: &Path,
        current_size: u64,
        current_modified: std::time::SystemTime,
    ) -> Result<Option<picture_finder::core::cache::CacheEntry>, picture_finder::error::CacheError>
    {
        self.0.get(path, current_size, current_modified)
    }

    fn set(
        &self,
        entry: picture_finder::core::cache::CacheEntry,
    ) -> Result<(), picture_finder::error::CacheError> {
        self.0.set(entry)
    }

    fn remove(&self, path: &Path) -> Result<(), picture_finder::error::CacheError> {
        self.0.remove(path)
    }

    fn clear(&self) -> Result<(), picture_finder::error::CacheError> {
        self.0.clear()
    }

    fn stats(
        &self,
    ) -> Result<picture_finder::core::cache::CacheStats, picture_finder::error::CacheError> {
        self.0.stats()
    }

    fn prune_orphans(&self) -> Result<usize, picture_finder::error::CacheError> {
        self.0.prune_orphans()
    }
}
