//! Difference Hash (dHash) implementation.
//!
//! dHash tracks horizontal brightness gradients:
//! 1. Resize the image to (hash_size + 1) x hash_size
//! 2. Convert to grayscale
//! 3. For each row, compare adjacent pixels: left > right sets the bit
//!
//! Gradients survive brightness and contrast shifts better than
//! absolute pixel values, so dHash tolerates re-encodes well while
//! staying nearly as fast as aHash.

use super::super::fast_resize::resize_to_grayscale;
use super::super::traits::{Fingerprint, HashAlgorithm, HashAlgorithmKind};
use crate::error::HashError;
use image::DynamicImage;

/// Difference Hash (dHash) implementation
pub struct DifferenceHasher {
    /// Width and height of the gradient grid
    hash_size: u32,
}

impl DifferenceHasher {
    /// Create a new dHash hasher
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for DifferenceHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        // One extra column so every output bit has a right neighbour
        let gray = resize_to_grayscale(image, self.hash_size + 1, self.hash_size)?;

        let mut hash_bytes =
            Vec::with_capacity((self.hash_size * self.hash_size).div_ceil(8) as usize);
        let mut current_byte: u8 = 0;
        let mut bit_position = 0;

        for y in 0..self.hash_size {
            for x in 0..self.hash_size {
                let left = gray.get_pixel(x, y)[0];
                let right = gray.get_pixel(x + 1, y)[0];

                if left > right {
                    current_byte |= 1 << (7 - bit_position);
                }

                bit_position += 1;

                if bit_position == 8 {
                    hash_bytes.push(current_byte);
                    current_byte = 0;
                    bit_position = 0;
                }
            }
        }

        if bit_position > 0 {
            hash_bytes.push(current_byte);
        }

        Ok(Fingerprint::new(hash_bytes, HashAlgorithmKind::Difference))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Difference
    }

    fn fingerprint_len(&self) -> usize {
        (self.hash_size * self.hash_size).div_ceil(8) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_gradient_image() -> DynamicImage {
        let img = ImageBuffer::from_fn(100, 100, |x, _| {
            let v = (x * 255 / 100) as u8;
            Rgb([v, v, v])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn create_reverse_gradient_image() -> DynamicImage {
        let img = ImageBuffer::from_fn(100, 100, |x, _| {
            let v = 255 - (x * 255 / 100) as u8;
            Rgb([v, v, v])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn identical_images_produce_identical_fingerprint() {
        let hasher = DifferenceHasher::new(8);
        let image = create_gradient_image();

        let fp1 = hasher.hash_image(&image).unwrap();
        let fp2 = hasher.hash_image(&image).unwrap();

        assert_eq!(fp1.distance(&fp2), 0);
    }

    #[test]
    fn opposite_gradients_are_maximally_distant() {
        let hasher = DifferenceHasher::new(8);

        let fp1 = hasher.hash_image(&create_gradient_image()).unwrap();
        let fp2 = hasher.hash_image(&create_reverse_gradient_image()).unwrap();

        assert_eq!(fp1.distance(&fp2), 64);
    }

    #[test]
    fn brightness_shift_preserves_fingerprint() {
        let hasher = DifferenceHasher::new(8);

        let base = create_gradient_image();
        let brighter = ImageBuffer::from_fn(100, 100, |x, _| {
            let v = ((x * 255 / 100) as u8).saturating_add(30);
            Rgb([v, v, v])
        });
        let brighter = DynamicImage::ImageRgb8(brighter);

        let fp1 = hasher.hash_image(&base).unwrap();
        let fp2 = hasher.hash_image(&brighter).unwrap();

        // Gradients are direction-preserving under a uniform shift
        assert!(fp1.distance(&fp2) <= 8);
    }

    #[test]
    fn default_size_yields_64_bits() {
        let hasher = DifferenceHasher::new(8);
        let fp = hasher.hash_image(&create_gradient_image()).unwrap();

        assert_eq!(fp.bit_count(), 64);
    }

    #[test]
    fn kind_returns_difference() {
        let hasher = DifferenceHasher::new(8);
        assert_eq!(hasher.kind(), HashAlgorithmKind::Difference);
    }
}
