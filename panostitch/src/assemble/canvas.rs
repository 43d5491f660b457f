//! Output canvas.

use crate::decode::PixelBuffer;
use crate::grid::TileRegion;
use image::{Rgba, RgbaImage};

/// Fill for tiles that could not be fetched or decoded.
///
/// Magenta: visually unmistakable in the composite and absent from real
/// imagery.
pub const PLACEHOLDER: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// The single mutable pixel buffer tiles are composited into.
///
/// Owned exclusively by the assembly engine; each write touches one tile's
/// disjoint region.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Copy a decoded tile into its region.
    ///
    /// Oversized buffers are clipped to the region; undersized buffers fill
    /// what they cover and leave the rest of the region untouched.
    pub fn place(&mut self, region: TileRegion, buffer: &PixelBuffer) {
        let source = buffer.as_image();
        let copy_width = region.width.min(buffer.width());
        let copy_height = region.height.min(buffer.height());

        for y in 0..copy_height {
            for x in 0..copy_width {
                let pixel = source.get_pixel(x, y);
                self.image.put_pixel(region.x + x, region.y + y, *pixel);
            }
        }
    }

    /// Fill a region with the placeholder color.
    pub fn fill_placeholder(&mut self, region: TileRegion) {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                self.image.put_pixel(x, y, PLACEHOLDER);
            }
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(width: u32, height: u32, pixel: Rgba<u8>) -> PixelBuffer {
        PixelBuffer::from_image_for_test(RgbaImage::from_pixel(width, height, pixel))
    }

    fn region(x: u32, y: u32, width: u32, height: u32) -> TileRegion {
        TileRegion {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_place_exact_fit() {
        let mut canvas = Canvas::new(16, 16);
        canvas.place(region(8, 8, 8, 8), &buffer(8, 8, Rgba([7, 7, 7, 255])));

        assert_eq!(*canvas.as_image().get_pixel(8, 8), Rgba([7, 7, 7, 255]));
        assert_eq!(*canvas.as_image().get_pixel(15, 15), Rgba([7, 7, 7, 255]));
        // Outside the region is untouched
        assert_eq!(*canvas.as_image().get_pixel(7, 8), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_place_clips_oversized_buffer() {
        let mut canvas = Canvas::new(16, 16);
        // Edge region narrower than the uniform tile
        canvas.place(region(12, 0, 4, 4), &buffer(8, 8, Rgba([9, 9, 9, 255])));

        assert_eq!(*canvas.as_image().get_pixel(15, 3), Rgba([9, 9, 9, 255]));
        // Nothing spilled past the region
        assert_eq!(*canvas.as_image().get_pixel(12, 4), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_place_undersized_buffer_fills_what_it_covers() {
        let mut canvas = Canvas::new(16, 16);
        canvas.place(region(0, 0, 8, 8), &buffer(4, 4, Rgba([5, 5, 5, 255])));

        assert_eq!(*canvas.as_image().get_pixel(3, 3), Rgba([5, 5, 5, 255]));
        assert_eq!(*canvas.as_image().get_pixel(4, 4), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_fill_placeholder() {
        let mut canvas = Canvas::new(16, 16);
        canvas.fill_placeholder(region(8, 0, 8, 8));

        assert_eq!(*canvas.as_image().get_pixel(8, 0), PLACEHOLDER);
        assert_eq!(*canvas.as_image().get_pixel(15, 7), PLACEHOLDER);
        assert_eq!(*canvas.as_image().get_pixel(7, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*canvas.as_image().get_pixel(8, 8), Rgba([0, 0, 0, 0]));
    }
}
