//! Fingerprint type and hash algorithm trait.

use super::fast_decode::FastDecoder;
use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Available fingerprint algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithmKind {
    /// Average Hash (aHash) - compares pixels to mean brightness
    Average,
    /// Difference Hash (dHash) - compares brightness gradients
    Difference,
    /// Perceptual Hash (pHash) - DCT-based, most robust to edits
    Perceptual,
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Average => write!(f, "aHash"),
            HashAlgorithmKind::Difference => write!(f, "dHash"),
            HashAlgorithmKind::Perceptual => write!(f, "pHash"),
        }
    }
}

/// A fixed-width bit-vector fingerprint of one image's visual content.
///
/// Computed once per file per run; compared with Hamming distance.
/// Deterministic: the same pixel data always yields the same fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    bytes: Vec<u8>,
    algorithm: HashAlgorithmKind,
}

impl Fingerprint {
    /// Create a new fingerprint from raw bytes
    pub fn new(bytes: Vec<u8>, algorithm: HashAlgorithmKind) -> Self {
        Self { bytes, algorithm }
    }

    /// Restore a fingerprint from cached bytes
    pub fn from_bytes(bytes: &[u8], algorithm: HashAlgorithmKind) -> Self {
        Self {
            bytes: bytes.to_vec(),
            algorithm,
        }
    }

    /// Hamming distance: the number of bits that differ.
    ///
    /// Lower distance = more similar images. Fingerprints of unequal
    /// width never compare close: every surplus bit of the wider
    /// fingerprint counts as differing.
    pub fn distance(&self, other: &Self) -> u32 {
        let shared = self.bytes.len().min(other.bytes.len());
        let surplus = (self.bytes.len().max(other.bytes.len()) - shared) * 8;

        let differing: u32 = self.bytes[..shared]
            .iter()
            .zip(&other.bytes[..shared])
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();

        differing + surplus as u32
    }

    /// Raw fingerprint bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total number of bits in this fingerprint
    pub fn bit_count(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Hexadecimal representation
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// The algorithm that produced this fingerprint
    pub fn algorithm(&self) -> HashAlgorithmKind {
        self.algorithm
    }
}

/// Trait for fingerprint algorithm implementations
pub trait HashAlgorithm: Send + Sync {
    /// Compute a fingerprint from an already-decoded image
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError>;

    /// Compute a fingerprint directly from a file path.
    ///
    /// Uses the fast decode path (zune-jpeg for JPEGs, image crate
    /// fallback for everything else).
    fn hash_file(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let image = FastDecoder::decode(path)?;
        self.hash_image(&image)
    }

    /// Get the algorithm kind
    fn kind(&self) -> HashAlgorithmKind;

    /// Width in bytes of the fingerprints this hasher produces
    fn fingerprint_len(&self) -> usize;
}
