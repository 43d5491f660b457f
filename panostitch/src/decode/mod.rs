//! Tile decoding.
//!
//! Decoding is isolated from fetching so diagnostics can tell "server gave
//! us garbage" apart from "server never answered". All tiles are normalized
//! to RGBA at the decode boundary; sources mixing RGB and RGBA tiles (or
//! grayscale thumbnails) land in one uniform pixel format deterministically.

use image::RgbaImage;
use thiserror::Error;

/// Number of channels every decoded buffer carries.
pub const CHANNELS: u8 = 4;

/// Errors that can occur decoding tile bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("tile payload is empty")]
    EmptyInput,

    #[error("image decode failed: {0}")]
    InvalidImage(String),

    #[error("decoded tile has zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },
}

/// A decoded tile: RGBA pixels with explicit dimensions.
///
/// The buffer is validated on construction, so consumers can rely on
/// nonzero dimensions and a fixed channel count without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    fn new(image: RgbaImage) -> Result<Self, DecodeError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::ZeroDimension {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn channels(&self) -> u8 {
        CHANNELS
    }

    /// Borrow the underlying RGBA image.
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    #[cfg(test)]
    pub(crate) fn from_image_for_test(image: RgbaImage) -> Self {
        Self::new(image).expect("test image must have nonzero dimensions")
    }
}

/// Decode raw tile bytes into a [`PixelBuffer`].
///
/// The container format is sniffed from the bytes, so a cache or server
/// mixing JPEG and PNG tiles decodes uniformly.
pub fn decode_tile(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| DecodeError::InvalidImage(e.to_string()))?
        .to_rgba8();

    PixelBuffer::new(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        buffer
    }

    #[test]
    fn test_decode_png_roundtrip() {
        let img = RgbaImage::from_fn(16, 8, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        let buffer = decode_tile(&png_bytes(&img)).unwrap();

        assert_eq!(buffer.width(), 16);
        assert_eq!(buffer.height(), 8);
        assert_eq!(buffer.channels(), CHANNELS);
        assert_eq!(buffer.as_image().get_pixel(3, 2), &Rgba([3, 2, 7, 255]));
    }

    #[test]
    fn test_rgb_jpeg_normalized_to_rgba() {
        let img = RgbImage::from_pixel(32, 32, Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut bytes);
        img.write_to(&mut cursor, image::ImageFormat::Jpeg).unwrap();

        let buffer = decode_tile(&bytes).unwrap();
        assert_eq!(buffer.channels(), CHANNELS);
        // JPEG is lossy; only the alpha padding is exact
        assert_eq!(buffer.as_image().get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(decode_tile(&[]), Err(DecodeError::EmptyInput)));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = decode_tile(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidImage(_)));
    }
}
