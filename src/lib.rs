//! # Picture Finder
//!
//! A duplicate photo detection engine built on perceptual fingerprints.
//!
//! ## Core Philosophy
//! - **Never destroy data** - collisions get new names, sources are only
//!   deleted after a verified copy
//! - **Per-file failures are not fatal** - unreadable images, permission
//!   errors, and failed moves are recorded in the result, not thrown
//! - **Deterministic** - the same inputs produce the same partition and
//!   the same keeper choices, regardless of thread timing
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - scanning, fingerprinting, grouping, relocation
//! - `events` - event-driven progress reporting
//! - `error` - error types, per subsystem
//!
//! ## Example
//! ```rust,ignore
//! use picture_finder::core::{Engine, EngineConfig};
//!
//! let engine = Engine::builder()
//!     .root("/photos".into())
//!     .dry_run(true)
//!     .build();
//!
//! let result = engine.run()?;
//! println!("{} duplicate groups", result.groups.len());
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{EngineError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
