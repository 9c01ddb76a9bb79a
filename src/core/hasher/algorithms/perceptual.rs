//! Perceptual Hash (pHash) implementation.
//!
//! pHash extracts frequency information from the image, which makes it
//! more robust to scaling, minor rotations, brightness and contrast
//! changes, and compression artifacts.
//!
//! Uses the image_hasher crate, which provides a well-tested
//! implementation.

use super::super::traits::{Fingerprint, HashAlgorithm, HashAlgorithmKind};
use crate::error::HashError;
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig as ImageHasherConfig};

/// Perceptual Hash (pHash) implementation
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
    fingerprint_len: usize,
}

impl PerceptualHasher {
    /// Create a new pHash hasher
    pub fn new(hash_size: u32) -> Self {
        let hasher = ImageHasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::DoubleGradient)
            .to_hasher();

        // The output width for DoubleGradient is an internal detail of
        // image_hasher; measure it once on a minimal image
        let fingerprint_len = hasher
            .hash_image(&DynamicImage::new_luma8(1, 1))
            .as_bytes()
            .len();

        Self {
            hasher,
            fingerprint_len,
        }
    }
}

impl HashAlgorithm for PerceptualHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let hash = self.hasher.hash_image(image);

        Ok(Fingerprint::new(
            hash.as_bytes().to_vec(),
            HashAlgorithmKind::Perceptual,
        ))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Perceptual
    }

    fn fingerprint_len(&self) -> usize {
        self.fingerprint_len
    }
}
