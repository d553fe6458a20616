//! Lossy image codec capability
//!
//! The packet layer only needs "compress at a quality" and "decompress";
//! any codec that provides both can be plugged in.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

use super::{FrameError, FrameResult};

/// A lossy image codec
pub trait ImageCodec: Send + Sync {
    /// Compress `image` at `quality` (1-100)
    fn compress(&self, image: &RgbImage, quality: u8) -> FrameResult<Vec<u8>>;

    /// Decompress bytes previously produced by [`ImageCodec::compress`]
    fn decompress(&self, data: &[u8]) -> FrameResult<RgbImage>;
}

/// Baseline JPEG, the format cameras and stations agree on
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl ImageCodec for JpegCodec {
    fn compress(&self, image: &RgbImage, quality: u8) -> FrameResult<Vec<u8>> {
        let mut data = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut data, quality.clamp(1, 100));
        encoder
            .encode_image(image)
            .map_err(|e| FrameError::Encode(e.to_string()))?;
        Ok(data)
    }

    fn decompress(&self, data: &[u8]) -> FrameResult<RgbImage> {
        let image = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|e| FrameError::Decode(e.to_string()))?;
        Ok(image.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_jpeg_signature() {
        let image = RgbImage::from_pixel(16, 16, Rgb([200, 10, 10]));
        let data = JpegCodec.compress(&image, 90).unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let image = RgbImage::from_fn(128, 128, |x, y| {
            Rgb([(x * 2) as u8, (y * 2) as u8, ((x ^ y) * 2) as u8])
        });
        let high = JpegCodec.compress(&image, 95).unwrap();
        let low = JpegCodec.compress(&image, 40).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_color_survives_roundtrip() {
        let image = RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]));
        let data = JpegCodec.compress(&image, 90).unwrap();
        let decoded = JpegCodec.decompress(&data).unwrap();
        assert_eq!(decoded.dimensions(), (32, 32));
        assert!(decoded.get_pixel(16, 16).0.iter().all(|&c| c > 240));
    }
}
