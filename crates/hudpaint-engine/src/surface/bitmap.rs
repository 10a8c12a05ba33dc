use image::{Rgba, RgbaImage};

use crate::coords::PixelRect;
use crate::paint::Color;

use super::Content;

/// Largest width or height a bitmap may have.
pub const MAX_DIMENSION: u32 = 32_767;

/// Straight-alpha RGBA8 pixel storage.
///
/// Straight alpha keeps PNG export/import byte-faithful; compositing converts
/// to premultiplied `f32` per pixel and back.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pixels: RgbaImage,
}

impl Bitmap {
    /// Transparent bitmap. Dimensions are clamped to `1..=MAX_DIMENSION`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(
                width.clamp(1, MAX_DIMENSION),
                height.clamp(1, MAX_DIMENSION),
            ),
        }
    }

    /// Wraps decoded pixels; `None` unless both sides are in `1..=MAX_DIMENSION`.
    pub fn from_image(pixels: RgbaImage) -> Option<Self> {
        if !dimensions_supported(pixels.width(), pixels.height()) {
            return None;
        }
        Some(Self { pixels })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::of_size(self.width(), self.height())
    }

    #[inline]
    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    #[inline]
    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Raw straight-alpha bytes, row-major, 4 bytes per pixel.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Pixel color; out-of-range coordinates read as transparent.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        match self.pixels.get_pixel_checked(x, y) {
            Some(p) => Color::from_rgba8(p[0], p[1], p[2], p[3]),
            None => Color::transparent(),
        }
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(p) = self.pixels.get_pixel_mut_checked(x, y) {
            *p = Rgba(color.to_rgba8());
        }
    }

    /// Premultiplied `f32` pixel; out-of-range coordinates read as transparent.
    #[inline]
    pub fn premul_at(&self, x: u32, y: u32) -> [f32; 4] {
        match self.pixels.get_pixel_checked(x, y) {
            Some(p) => premultiply_rgba8(p.0),
            None => [0.0; 4],
        }
    }

    #[inline]
    pub fn store_premul(&mut self, x: u32, y: u32, value: [f32; 4]) {
        if let Some(p) = self.pixels.get_pixel_mut_checked(x, y) {
            *p = Rgba(unpremultiply_to_rgba8(value));
        }
    }

    /// Fills every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        let rgba = Rgba(color.to_rgba8());
        for p in self.pixels.pixels_mut() {
            *p = rgba;
        }
    }

    /// Drops the channels `content` does not keep: alpha-only bitmaps lose
    /// their color, color-only bitmaps become opaque.
    pub fn restrict_to(&mut self, content: Content) {
        match content {
            Content::ColorAlpha => {}
            Content::Alpha => {
                for p in self.pixels.pixels_mut() {
                    p.0 = [0, 0, 0, p.0[3]];
                }
            }
            Content::Color => {
                for p in self.pixels.pixels_mut() {
                    p.0[3] = 255;
                }
            }
        }
    }

    /// Copies `region` (clamped to the bitmap) out as premultiplied RGBA8 rows.
    pub fn read_region_premul_rgba8(&self, region: PixelRect) -> Vec<u8> {
        let mut out = Vec::with_capacity(region.area() * 4);
        for y in 0..region.height {
            for x in 0..region.width {
                let px = region.x as i64 + x as i64;
                let py = region.y as i64 + y as i64;
                let p = if px >= 0 && py >= 0 {
                    self.premul_at(px as u32, py as u32)
                } else {
                    [0.0; 4]
                };
                out.extend(p.iter().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
            }
        }
        out
    }

    /// Writes premultiplied RGBA8 rows (as produced by
    /// [`read_region_premul_rgba8`](Self::read_region_premul_rgba8)) back into `region`.
    pub fn write_region_premul_rgba8(&mut self, region: PixelRect, data: &[u8]) {
        let expected = region.area() * 4;
        if data.len() < expected {
            log::warn!(
                "Bitmap::write_region_premul_rgba8: {} bytes supplied for {} expected; ignored",
                data.len(),
                expected
            );
            return;
        }
        for y in 0..region.height {
            for x in 0..region.width {
                let px = region.x as i64 + x as i64;
                let py = region.y as i64 + y as i64;
                if px < 0 || py < 0 {
                    continue;
                }
                let i = ((y * region.width + x) * 4) as usize;
                let v = [
                    data[i] as f32 / 255.0,
                    data[i + 1] as f32 / 255.0,
                    data[i + 2] as f32 / 255.0,
                    data[i + 3] as f32 / 255.0,
                ];
                self.store_premul(px as u32, py as u32, v);
            }
        }
    }
}

#[inline]
fn premultiply_rgba8(p: [u8; 4]) -> [f32; 4] {
    let a = p[3] as f32 / 255.0;
    [
        p[0] as f32 / 255.0 * a,
        p[1] as f32 / 255.0 * a,
        p[2] as f32 / 255.0 * a,
        a,
    ]
}

#[inline]
fn unpremultiply_to_rgba8(v: [f32; 4]) -> [u8; 4] {
    Color::from_premultiplied(v).to_rgba8()
}

#[inline]
pub fn dimensions_supported(width: u32, height: u32) -> bool {
    (1..=MAX_DIMENSION).contains(&width) && (1..=MAX_DIMENSION).contains(&height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_clamp_to_one() {
        let b = Bitmap::new(0, 0);
        assert_eq!((b.width(), b.height()), (1, 1));
    }

    #[test]
    fn oversized_dimensions_are_refused() {
        let b = Bitmap::new(MAX_DIMENSION + 5, 1);
        assert_eq!(b.width(), MAX_DIMENSION);
        assert!(Bitmap::from_image(RgbaImage::new(MAX_DIMENSION + 1, 1)).is_none());
        assert!(Bitmap::from_image(RgbaImage::new(0, 3)).is_none());
        assert!(Bitmap::from_image(RgbaImage::new(MAX_DIMENSION, 1)).is_some());
    }

    #[test]
    fn restrict_to_drops_unkept_channels() {
        let mut b = Bitmap::new(1, 1);
        b.set_pixel(0, 0, Color::from_rgba8(200, 100, 50, 128));
        let mut alpha = b.clone();
        alpha.restrict_to(Content::Alpha);
        assert_eq!(alpha.as_raw(), &[0, 0, 0, 128]);
        b.restrict_to(Content::Color);
        assert_eq!(b.as_raw(), &[200, 100, 50, 255]);
    }

    #[test]
    fn out_of_range_reads_transparent() {
        let b = Bitmap::new(2, 2);
        assert_eq!(b.pixel(5, 5), Color::transparent());
        assert_eq!(b.premul_at(2, 0), [0.0; 4]);
    }

    #[test]
    fn premul_store_round_trips_opaque_pixels() {
        let mut b = Bitmap::new(1, 1);
        b.store_premul(0, 0, Color::from_rgba8(10, 20, 30, 255).premultiplied());
        assert_eq!(b.pixel(0, 0).to_rgba8(), [10, 20, 30, 255]);
    }

    #[test]
    fn region_read_write_round_trip() {
        let mut b = Bitmap::new(4, 4);
        b.fill(Color::from_rgba8(255, 0, 0, 255));
        let region = PixelRect::new(1, 1, 2, 2);
        let mut data = b.read_region_premul_rgba8(region);
        assert_eq!(data.len(), 16);
        for px in data.chunks_mut(4) {
            px.copy_from_slice(&[0, 0, 255, 255]);
        }
        b.write_region_premul_rgba8(region, &data);
        assert_eq!(b.pixel(1, 1).to_rgba8(), [0, 0, 255, 255]);
        assert_eq!(b.pixel(0, 0).to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(b.pixel(3, 3).to_rgba8(), [255, 0, 0, 255]);
    }
}
