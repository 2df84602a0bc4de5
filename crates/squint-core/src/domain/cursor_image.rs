//! Fixed-size cursor bitmap used by the cursor overlay.
//!
//! The overlay surface is always [`CURSOR_SIZE`]² pixels.  Bigger cursors are
//! cropped to the top-left corner.  The overlay's shape comes from a 1-bit
//! mask built from the alpha channel: a pixel is visible when its alpha is
//! non-zero.  Mask rows are `CURSOR_SIZE / 8` bytes, least significant bit
//! first, which is the layout an XY bitmap upload expects.

use super::geometry::Point;

/// Edge length of the overlay, in pixels.
pub const CURSOR_SIZE: usize = 64;

/// Bytes per mask row.
pub const MASK_STRIDE: usize = CURSOR_SIZE / 8;

#[derive(Clone, PartialEq, Eq)]
pub struct CursorImage {
    /// Premultiplied ARGB pixels, row-major, `CURSOR_SIZE * CURSOR_SIZE`.
    pixels: Vec<u32>,
    /// Shape mask, `MASK_STRIDE * CURSOR_SIZE` bytes.
    mask: Vec<u8>,
    width: usize,
    height: usize,
    hotspot: Point,
}

impl CursorImage {
    /// Builds the overlay buffers from a platform cursor image of
    /// `width × height` ARGB pixels.
    ///
    /// Returns `None` if `argb` is shorter than `width * height`.
    pub fn from_argb(width: usize, height: usize, hotspot: Point, argb: &[u32]) -> Option<Self> {
        if argb.len() < width * height {
            return None;
        }
        let w = width.min(CURSOR_SIZE);
        let h = height.min(CURSOR_SIZE);

        let mut pixels = vec![0u32; CURSOR_SIZE * CURSOR_SIZE];
        let mut mask = vec![0u8; MASK_STRIDE * CURSOR_SIZE];
        for y in 0..h {
            for x in 0..w {
                let px = argb[y * width + x];
                pixels[y * CURSOR_SIZE + x] = px;
                if px >> 24 != 0 {
                    mask[y * MASK_STRIDE + x / 8] |= 1 << (x % 8);
                }
            }
        }

        Some(Self {
            pixels,
            mask,
            width: w,
            height: h,
            hotspot,
        })
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn hotspot(&self) -> Point {
        self.hotspot
    }
}

impl std::fmt::Debug for CursorImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("hotspot", &self.hotspot)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(img: &CursorImage, x: usize, y: usize) -> bool {
        img.mask()[y * MASK_STRIDE + x / 8] & (1 << (x % 8)) != 0
    }

    #[test]
    fn test_mask_bit_set_only_for_non_transparent_pixels() {
        // Arrange: 3×2 cursor, alternating opaque / transparent
        let argb = [
            0xff00_0000, 0x0000_0000, 0x80ff_ffff, //
            0x0012_3456, 0x01ff_ffff, 0x0000_0000,
        ];

        // Act
        let img = CursorImage::from_argb(3, 2, Point::new(1, 1), &argb).expect("image");

        // Assert
        assert!(opaque(&img, 0, 0));
        assert!(!opaque(&img, 1, 0));
        assert!(opaque(&img, 2, 0));
        assert!(!opaque(&img, 0, 1));
        assert!(opaque(&img, 1, 1));
        assert_eq!(img.mask()[0], 0b101);
        assert_eq!(img.mask()[MASK_STRIDE], 0b010);
        assert_eq!(img.pixels()[CURSOR_SIZE + 1], 0x01ff_ffff);
    }

    #[test]
    fn test_oversized_cursor_is_cropped() {
        let argb = vec![0xffff_ffffu32; 100 * 70];
        let img = CursorImage::from_argb(100, 70, Point::new(50, 35), &argb).expect("image");
        assert_eq!(img.width, CURSOR_SIZE);
        assert_eq!(img.height, CURSOR_SIZE);
        assert!(opaque(&img, 63, 63));
        assert_eq!(img.mask().len(), MASK_STRIDE * CURSOR_SIZE);
        assert_eq!(img.hotspot(), Point::new(50, 35));
    }

    #[test]
    fn test_short_pixel_buffer_is_rejected() {
        assert!(CursorImage::from_argb(4, 4, Point::default(), &[0; 15]).is_none());
    }
}
