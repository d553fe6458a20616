//! Frame module - Compression of camera frames for stream packets
//!
//! Handles:
//! - Scaling a frame into the box of a resolution tier
//! - Lossy compression at a tier-derived quality
//! - Placeholder frames for when no camera image exists

mod codec;
mod placeholder;

pub use codec::{ImageCodec, JpegCodec};
pub use placeholder::{placeholder, NO_IMAGE_TEXT};

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use thiserror::Error;

use crate::protocol::{dimensions_for, ResolutionTier};

/// Lowest JPEG quality handed to the codec
pub const MIN_QUALITY: u8 = 40;

/// Frame codec errors
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Compression quality for a tier: coarser tiers get higher quality
pub fn quality_for(tier: ResolutionTier) -> u8 {
    let quality = (10 - (tier.index() + 1)) * 10;
    quality.max(MIN_QUALITY as i32) as u8
}

/// Scale `image` to fit inside the tier's box, keeping its aspect ratio
pub fn scale_to_tier(image: &RgbImage, tier: ResolutionTier) -> RgbImage {
    match dimensions_for(tier) {
        Some((width, height)) => DynamicImage::ImageRgb8(image.clone())
            .resize(width, height, FilterType::Nearest)
            .to_rgb8(),
        None => image.clone(),
    }
}

/// Scale and compress a frame for the given tier
///
/// Returns an empty buffer when the frame has no pixels.
pub fn compress<C>(codec: &C, image: &RgbImage, tier: ResolutionTier) -> FrameResult<Vec<u8>>
where
    C: ImageCodec + ?Sized,
{
    if image.width() == 0 || image.height() == 0 {
        return Ok(Vec::new());
    }

    let scaled = scale_to_tier(image, tier);
    let bytes = codec.compress(&scaled, quality_for(tier))?;

    tracing::trace!(
        tier = %tier,
        width = scaled.width(),
        height = scaled.height(),
        bytes = bytes.len(),
        "compressed frame"
    );

    Ok(bytes)
}

/// Decompress a frame, rejecting data that does not yield a usable image
pub fn decompress<C>(codec: &C, data: &[u8]) -> FrameResult<RgbImage>
where
    C: ImageCodec + ?Sized,
{
    if data.is_empty() {
        return Err(FrameError::EmptyImage);
    }

    let image = codec.decompress(data)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(FrameError::EmptyImage);
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_quality_curve() {
        let expected = [90, 80, 70, 60, 50, 40, 40, 40];
        for (tier, quality) in ResolutionTier::ALL.iter().zip(expected) {
            assert_eq!(quality_for(*tier), quality, "tier {tier}");
        }
    }

    #[test]
    fn test_scale_keeps_aspect_ratio() {
        let scaled = scale_to_tier(&gradient(640, 480), ResolutionTier::Qcif);
        assert_eq!(scaled.dimensions(), (176, 132));

        let scaled = scale_to_tier(&gradient(640, 480), ResolutionTier::Hd720);
        assert_eq!(scaled.dimensions(), (960, 720));
    }

    #[test]
    fn test_original_is_not_scaled() {
        let scaled = scale_to_tier(&gradient(123, 45), ResolutionTier::Original);
        assert_eq!(scaled.dimensions(), (123, 45));
    }

    #[test]
    fn test_compress_decompress() {
        let codec = JpegCodec;
        let bytes = compress(&codec, &gradient(320, 240), ResolutionTier::Qcif).unwrap();
        assert!(!bytes.is_empty());

        let image = decompress(&codec, &bytes).unwrap();
        assert_eq!(image.dimensions(), (176, 132));
    }

    #[test]
    fn test_compress_empty_image() {
        let bytes = compress(&JpegCodec, &RgbImage::new(0, 0), ResolutionTier::Cif).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_decompress_garbage() {
        assert!(matches!(
            decompress(&JpegCodec, &[]),
            Err(FrameError::EmptyImage)
        ));
        assert!(matches!(
            decompress(&JpegCodec, b"definitely not a jpeg"),
            Err(FrameError::Decode(_))
        ));
    }
}
