//! Placeholder frames
//!
//! Solid black frames with centered white text, shown when a camera has no
//! image to send or a station lost its camera.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

/// Text of the frame carried by a freshly initialized stream packet
pub const NO_IMAGE_TEXT: &str = "NO CAMERA IMAGE";

const GLYPH_SIZE: u32 = 8;
const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const FOREGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Render `text` centered in white on a black `width` x `height` frame
///
/// Lines are split on `\n`. Glyphs are scaled up by an integer factor so the
/// widest line covers roughly 60% of the frame; anything that does not fit is
/// clipped.
pub fn placeholder(width: u32, height: u32, text: &str) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    let lines: Vec<&str> = text.lines().collect();
    let columns = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
    if columns == 0 || width == 0 || height == 0 {
        return image;
    }

    let rows = lines.len() as u32;
    let scale = (width * 3 / 5 / (columns * GLYPH_SIZE))
        .min(height / (rows * GLYPH_SIZE * 6).max(1))
        .max(1);
    let glyph = GLYPH_SIZE * scale;
    let line_height = glyph + scale * 2;

    let block_height = rows * line_height - scale * 2;
    let top = (height as i64 - block_height as i64) / 2;

    for (row, line) in lines.iter().enumerate() {
        let line_width = line.chars().count() as u32 * glyph;
        let left = (width as i64 - line_width as i64) / 2;
        let y = top + row as i64 * line_height as i64;

        for (col, c) in line.chars().enumerate() {
            let x = left + col as i64 * glyph as i64;
            draw_glyph(&mut image, c, x, y, scale);
        }
    }

    image
}

fn draw_glyph(image: &mut RgbImage, c: char, x: i64, y: i64, scale: u32) {
    let Some(bitmap) = BASIC_FONTS.get(c) else {
        return;
    };

    let (width, height) = (image.width() as i64, image.height() as i64);
    let scale = scale as i64;

    for (gy, bits) in bitmap.iter().enumerate() {
        for gx in 0..GLYPH_SIZE as i64 {
            if bits & (1 << gx) == 0 {
                continue;
            }

            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + gx * scale + dx;
                    let py = y + gy as i64 * scale + dy;
                    if (0..width).contains(&px) && (0..height).contains(&py) {
                        image.put_pixel(px as u32, py as u32, FOREGROUND);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_bounds(image: &RgbImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in image.enumerate_pixels() {
            if *pixel == FOREGROUND {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    #[test]
    fn test_size_and_background() {
        let image = placeholder(640, 480, NO_IMAGE_TEXT);
        assert_eq!(image.dimensions(), (640, 480));
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*image.get_pixel(639, 479), BACKGROUND);
    }

    #[test]
    fn test_text_is_centered() {
        let image = placeholder(640, 480, NO_IMAGE_TEXT);
        let (x0, y0, x1, y1) = lit_bounds(&image).expect("text should be drawn");

        let center_x = (x0 + x1) / 2;
        let center_y = (y0 + y1) / 2;
        assert!((300..=340).contains(&center_x), "center x {center_x}");
        assert!((220..=260).contains(&center_y), "center y {center_y}");
    }

    #[test]
    fn test_empty_text_is_black() {
        let image = placeholder(64, 48, "");
        assert!(lit_bounds(&image).is_none());
    }

    #[test]
    fn test_tiny_frame_clips() {
        let image = placeholder(4, 4, "DISCONNECTED");
        assert_eq!(image.dimensions(), (4, 4));
    }
}
