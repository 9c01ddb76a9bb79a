//! # Hasher Module
//!
//! Computes perceptual fingerprints for images.
//!
//! ## Supported Algorithms
//! - **aHash (Average Hash)** - Fastest, good for exact duplicates (default)
//! - **dHash (Difference Hash)** - Gradient-based, robust to brightness shifts
//! - **pHash (Perceptual Hash)** - Most robust, handles edits well
//!
//! ## How It Works
//! 1. Resize image to a small grid (8x8 by default)
//! 2. Convert to grayscale
//! 3. Compute fingerprint bits from pixel relationships
//! 4. Compare fingerprints using Hamming distance
//!
//! ## Performance Optimizations
//! - Uses `zune-jpeg` for 1.5-2x faster JPEG decoding
//! - Uses `fast_image_resize` for 5-14x faster SIMD-accelerated resizing
//!
//! ## Example
//! ```rust,ignore
//! use picture_finder::core::hasher::{HasherConfig, HashAlgorithmKind};
//!
//! let hasher = HasherConfig::new()
//!     .algorithm(HashAlgorithmKind::Difference)
//!     .hash_size(16)
//!     .build()?;
//!
//! let fingerprint = hasher.hash_file(&path)?;
//! ```

mod algorithms;
pub mod fast_decode;
pub mod fast_resize;
mod traits;

pub use algorithms::{AverageHasher, DifferenceHasher, PerceptualHasher};
pub use traits::{Fingerprint, HashAlgorithm, HashAlgorithmKind};

use crate::error::HashError;

/// Configuration builder for hashers
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Hash size (8, 16, or 32)
    hash_size: u32,
    /// Algorithm to use
    algorithm: HashAlgorithmKind,
}

impl HasherConfig {
    /// Create a new hasher configuration with defaults
    pub fn new() -> Self {
        Self {
            hash_size: 8,
            algorithm: HashAlgorithmKind::Average,
        }
    }

    /// Set the hash size (8, 16, or 32)
    ///
    /// Larger sizes are more accurate but slower.
    /// - 8: 64 bits, fast, good for most uses
    /// - 16: 256 bits, more accurate
    /// - 32: 1024 bits, very accurate, slower
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size;
        self
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the hasher
    pub fn build(self) -> Result<Box<dyn HashAlgorithm>, HashError> {
        if self.hash_size == 0 {
            return Err(HashError::Configuration(
                "hash size must be greater than zero".to_string(),
            ));
        }

        match self.algorithm {
            HashAlgorithmKind::Average => Ok(Box::new(AverageHasher::new(self.hash_size))),
            HashAlgorithmKind::Difference => Ok(Box::new(DifferenceHasher::new(self.hash_size))),
            HashAlgorithmKind::Perceptual => Ok(Box::new(PerceptualHasher::new(self.hash_size))),
        }
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}
