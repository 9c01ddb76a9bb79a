//! # CLI Module
//!
//! Command-line interface for the picture finder engine.
//!
//! ## Usage
//! ```bash
//! # Detect duplicates without touching any files
//! picture-finder scan ~/Photos
//!
//! # Detect and relocate into an output folder
//! picture-finder run ~/Photos --output-dir ~/Sorted --action move
//!
//! # Stricter matching, JSON output
//! picture-finder scan ~/Photos --threshold 5 --format json
//!
//! # Cache maintenance
//! picture-finder cache stats
//! picture-finder cache prune
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use picture_finder::core::cache::{FingerprintCache, SqliteCache};
use picture_finder::core::{
    Engine, EngineConfig, GroupingStrategy, HashAlgorithmKind, ProcessingResult, RelocateAction,
    ResourceMode, ScanConfig,
};
use picture_finder::error::Result;
use picture_finder::events::{EngineEvent, Event, EventChannel, HashEvent, ScanEvent};
use std::path::PathBuf;
use std::thread;

/// Picture Finder - sort the keepers from the copies
#[derive(Parser, Debug)]
#[command(name = "picture-finder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect duplicates without touching any files
    Scan {
        /// Folder to scan
        root: PathBuf,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Detect duplicates and relocate files into an output folder
    Run {
        /// Folder to scan
        root: PathBuf,

        /// Destination folder for relocated files
        #[arg(short, long)]
        output_dir: PathBuf,

        /// What to do with unique files (duplicates and videos always move)
        #[arg(long, default_value = "copy")]
        action: Action,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Fingerprint cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,

        /// Cache database path
        #[arg(long)]
        cache: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Show cache statistics
    Stats,
    /// Remove all cached fingerprints
    Clear,
    /// Remove entries for files that no longer exist
    Prune,
}

/// Detection flags shared by `scan` and `run`
#[derive(Args, Debug)]
struct DetectionArgs {
    /// Similarity threshold (1-20, lower = stricter)
    #[arg(short, long, default_value = "10")]
    threshold: u32,

    /// Fingerprint algorithm
    #[arg(short, long, default_value = "average")]
    algorithm: Algorithm,

    /// Grouping strategy
    #[arg(long, default_value = "representative")]
    strategy: Strategy,

    /// Resource usage mode
    #[arg(long, default_value = "medium")]
    mode: Mode,

    /// Images per hashing batch
    #[arg(long, default_value = "500")]
    batch_size: usize,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Maximum folder depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Verbose progress
    #[arg(short, long)]
    verbose: bool,

    /// Cache database path
    #[arg(long)]
    cache: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Average Hash - fast, good for exact duplicates (default)
    Average,
    /// Difference Hash - robust to brightness shifts
    Difference,
    /// Perceptual Hash - most robust to edits
    Perceptual,
}

impl From<Algorithm> for HashAlgorithmKind {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Average => HashAlgorithmKind::Average,
            Algorithm::Difference => HashAlgorithmKind::Difference,
            Algorithm::Perceptual => HashAlgorithmKind::Perceptual,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Compare against each cluster's first member (fast)
    Representative,
    /// All-pairs with transitive grouping (small batches)
    Exhaustive,
}

impl From<Strategy> for GroupingStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Representative => GroupingStrategy::Representative,
            Strategy::Exhaustive => GroupingStrategy::Exhaustive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Single worker
    Low,
    /// Half the available cores (default)
    Medium,
    /// All available cores
    High,
}

impl From<Mode> for ResourceMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Low => ResourceMode::Low,
            Mode::Medium => ResourceMode::Medium,
            Mode::High => ResourceMode::High,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Action {
    /// Copy unique files, leaving originals in place
    Copy,
    /// Move unique files out of the source folder
    Move,
}

impl From<Action> for RelocateAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Copy => RelocateAction::Copy,
            Action::Move => RelocateAction::Move,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (redundant paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { root, detection } => run_engine(root, None, Action::Copy, detection),
        Commands::Run {
            root,
            output_dir,
            action,
            detection,
        } => run_engine(root, Some(output_dir), action, detection),
        Commands::Cache { command, cache } => run_cache(command, cache),
    }
}

fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("picture-finder")
        .join("fingerprints.db")
}

fn run_engine(
    root: PathBuf,
    output_dir: Option<PathBuf>,
    action: Action,
    args: DetectionArgs,
) -> Result<()> {
    let term = Term::stderr();
    let dry_run = output_dir.is_none();

    if matches!(args.format, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Picture Finder").bold().cyan(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let cache_path = args.cache.clone().unwrap_or_else(default_cache_path);
    let cache = SqliteCache::open(&cache_path)?;

    let config = EngineConfig {
        root,
        output_dir,
        threshold: args.threshold,
        batch_size: args.batch_size,
        resource_mode: args.mode.into(),
        action: action.into(),
        strategy: args.strategy.into(),
        algorithm: args.algorithm.into(),
        scan: ScanConfig {
            include_hidden: args.include_hidden,
            max_depth: args.max_depth,
            ..Default::default()
        },
        dry_run,
        ..Default::default()
    };

    let engine = Engine::builder().config(config).cache(Box::new(cache)).build();

    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(args.format, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = args.verbose;

    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Engine(EngineEvent::PhaseChanged { phase }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_message(phase.to_string());
                    }
                }
                Event::Scan(ScanEvent::Completed { images, .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_length(images as u64);
                    }
                }
                Event::Hash(HashEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.completed as u64);
                        if verbose {
                            pb.set_message(format!(
                                "{} (cache: {})",
                                p.current_path
                                    .file_name()
                                    .unwrap_or_default()
                                    .to_string_lossy(),
                                p.cache_hits
                            ));
                        }
                    }
                }
                Event::Engine(EngineEvent::Completed { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    let cancel = picture_finder::core::CancellationToken::new();
    let result = engine.run_with_events(&sender, &cancel)?;

    drop(sender);
    event_thread.join().ok();

    match args.format {
        OutputFormat::Pretty => print_pretty(&term, &result, dry_run, args.verbose),
        OutputFormat::Json => print_json(&result),
        OutputFormat::Minimal => print_minimal(&result),
    }

    Ok(())
}

fn run_cache(command: CacheCommands, cache_path: Option<PathBuf>) -> Result<()> {
    let term = Term::stderr();
    let path = cache_path.unwrap_or_else(default_cache_path);
    let cache = SqliteCache::open(&path)?;

    match command {
        CacheCommands::Stats => {
            let stats = cache.stats()?;
            term.write_line(&format!(
                "  {} entries, {} of fingerprint data",
                style(stats.total_entries).cyan(),
                style(format_bytes(stats.total_size_bytes)).cyan()
            ))
            .ok();
        }
        CacheCommands::Clear => {
            cache.clear()?;
            term.write_line(&format!("  {} cache cleared", style("✓").green()))
                .ok();
        }
        CacheCommands::Prune => {
            let removed = cache.prune_orphans()?;
            term.write_line(&format!(
                "  {} removed {} orphaned entries",
                style("✓").green(),
                style(removed).cyan()
            ))
            .ok();
        }
    }

    Ok(())
}

fn print_pretty(term: &Term, result: &ProcessingResult, dry_run: bool, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Run Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files scanned in {:.1}s",
        style(result.stats.files_scanned).cyan(),
        result.stats.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} duplicate groups, {} redundant files",
        style(result.groups.len()).cyan(),
        style(result.redundant_count()).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} unique photos, {} videos separated",
        style(result.unique_count()).cyan(),
        style(result.videos.len()).cyan()
    ))
    .ok();

    if result.stats.cache_hits > 0 {
        term.write_line(&format!(
            "  {} cache hits",
            style(result.stats.cache_hits).dim()
        ))
        .ok();
    }

    if !result.unreadable.is_empty() {
        term.write_line(&format!(
            "  {} unreadable files excluded",
            style(result.unreadable.len()).yellow()
        ))
        .ok();
    }

    if !dry_run {
        term.write_line(&format!(
            "  {} files relocated, {} failed",
            style(result.relocated).cyan(),
            style(result.relocation_failures.len()).yellow()
        ))
        .ok();
    }

    term.write_line("").ok();

    if result.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
    } else {
        term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, group) in result.groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} ({} photos)",
                style(format!("Group {}:", i + 1)).bold(),
                group.len()
            ))
            .ok();

            term.write_line(&format!(
                "    {} {}",
                style("★").green(),
                group.keeper.path.display()
            ))
            .ok();
            for member in &group.redundant {
                term.write_line(&format!(
                    "    {} {}",
                    style("○").dim(),
                    member.path.display()
                ))
                .ok();
            }

            term.write_line("").ok();
        }
    }

    if verbose {
        for failure in &result.relocation_failures {
            term.write_line(&format!("  {} {}", style("!").red(), failure)).ok();
        }
        for error in &result.scan_errors {
            term.write_line(&format!("  {} {}", style("!").yellow(), error))
                .ok();
        }
    }

    if dry_run {
        term.write_line(&format!(
            "{}",
            style("Dry run: no files were touched. Use `run` to relocate.").dim()
        ))
        .ok();
    }
}

fn print_json(result: &ProcessingResult) {
    let output = serde_json::json!({
        "files_scanned": result.stats.files_scanned,
        "duplicate_groups": result.groups.len(),
        "redundant_count": result.redundant_count(),
        "unique_count": result.unique_count(),
        "videos": result.videos.iter().map(|v| &v.path).collect::<Vec<_>>(),
        "skipped": result.skipped.len(),
        "unreadable": result.unreadable.iter().map(|(path, reason)| {
            serde_json::json!({ "path": path, "reason": reason })
        }).collect::<Vec<_>>(),
        "relocated": result.relocated,
        "relocation_failures": result.relocation_failures,
        "scan_errors": result.scan_errors,
        "cancelled": result.cancelled,
        "duration_ms": result.stats.duration_ms,
        "cache_hits": result.stats.cache_hits,
        "groups": result.groups.iter().map(|g| {
            serde_json::json!({
                "id": g.id.to_string(),
                "keeper": g.keeper.path,
                "redundant": g.redundant.iter().map(|m| &m.path).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to serialize results: {}", e),
    }
}

fn print_minimal(result: &ProcessingResult) {
    for group in &result.groups {
        for member in &group.redundant {
            println!("{}", member.path.display());
        }
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
