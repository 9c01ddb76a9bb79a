//! # picture-finder CLI
//!
//! Command-line interface for the duplicate picture engine.
//!
//! ## Usage
//! ```bash
//! picture-finder scan ~/Photos --threshold 10
//! picture-finder run ~/Photos --output-dir ~/Sorted --action move
//! ```

mod cli;

use picture_finder::Result;

fn main() -> Result<()> {
    picture_finder::init_tracing();
    cli::run()
}
