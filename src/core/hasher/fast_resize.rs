//! Fast SIMD-accelerated image resizing.
//!
//! Uses fast_image_resize which is 5-14x faster than image crate's resize
//! and automatically uses AVX2/NEON SIMD when available. Downsampling to a
//! tiny grayscale grid is the first step of every fingerprint algorithm.

use crate::error::HashError;
use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::path::PathBuf;

/// Fast image resizer using SIMD acceleration
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    /// Create a new fast resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize an image to the specified dimensions and convert to grayscale.
    pub fn resize_to_grayscale(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, HashError> {
        // Grayscale first: resizing a single channel is cheaper than RGB
        let gray = image.to_luma8();

        let src_width = gray.width();
        let src_height = gray.height();

        if src_width == 0 || src_height == 0 || width == 0 || height == 0 {
            return Err(HashError::UnreadableImage {
                path: PathBuf::new(),
                reason: "zero-sized image dimensions".to_string(),
            });
        }

        let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
            .map_err(|e| HashError::UnreadableImage {
                path: PathBuf::new(),
                reason: format!("failed to create source image: {}", e),
            })?;

        let mut dst_image = Image::new(width, height, PixelType::U8);

        // Bilinear is a good balance of speed and quality for hashing
        let options = ResizeOptions::new().resize_alg(fast_image_resize::ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| HashError::UnreadableImage {
                path: PathBuf::new(),
                reason: format!("resize failed: {}", e),
            })?;

        let result_buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
                HashError::UnreadableImage {
                    path: PathBuf::new(),
                    reason: "failed to create result buffer".to_string(),
                }
            })?;

        Ok(result_buffer)
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-off resizing
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    let mut resizer = FastResizer::new();
    resizer.resize_to_grayscale(image, width, height)
}
