//! RGBA float pixel buffers for slices and the packed atlas.
//!
//! Buffers are stored row by row starting with the bottom scanline, the
//! convention of the host image system.

use super::AtlasLayout;
use crate::error::{BakeError, Result};
use image::ImageEncoder;

/// One rendered slice: `width x height` texels, 4 channels each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceImage {
    pub width: u32,
    pub height: u32,
    /// RGBA values, 4 per texel.
    pub pixels: Vec<f32>,
}

impl SliceImage {
    /// A transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0.0; 4])
    }

    /// An image with every texel set to `color`.
    pub fn filled(width: u32, height: u32, color: [f32; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: color.iter().copied().cycle().take(count * 4).collect(),
        }
    }

    /// Wrap an existing buffer. The length is not checked here; the packer
    /// verifies it.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<f32>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Number of values a well-formed buffer of this size holds.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Get a pixel at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Set a pixel at (x, y).
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    /// Iterate over texels as RGBA arrays.
    pub fn texels(&self) -> impl Iterator<Item = [f32; 4]> + '_ {
        self.pixels
            .chunks_exact(4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// The packed sprite-sheet encoding all slices.
#[derive(Debug, Clone)]
pub struct VolumeAtlas {
    /// Width of the atlas in pixels.
    pub width: u32,
    /// Height of the atlas in pixels.
    pub height: u32,
    /// RGBA values, 4 per texel, bottom scanline first.
    pub pixels: Vec<f32>,
    /// Grid the slices are packed in.
    pub layout: AtlasLayout,
}

impl VolumeAtlas {
    /// Create a zeroed atlas sized for `layout`.
    pub fn new(layout: AtlasLayout) -> Self {
        let len = layout.atlas_width as usize * layout.atlas_height as usize * 4;
        Self {
            width: layout.atlas_width,
            height: layout.atlas_height,
            pixels: vec![0.0; len],
            layout,
        }
    }

    /// Reuse this atlas for a new layout, resizing the buffer and clearing it.
    pub fn resize(&mut self, layout: AtlasLayout) {
        let len = layout.atlas_width as usize * layout.atlas_height as usize * 4;
        self.pixels.clear();
        self.pixels.resize(len, 0.0);
        self.width = layout.atlas_width;
        self.height = layout.atlas_height;
        self.layout = layout;
    }

    /// Get a pixel at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Quantize to 8-bit RGBA in top-down row order.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let row_len = self.width as usize * 4;
        if row_len == 0 {
            return Vec::new();
        }

        self.pixels
            .chunks_exact(row_len)
            .rev()
            .flatten()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    /// Export the atlas as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let cursor = std::io::Cursor::new(&mut bytes);
        let encoder = image::codecs::png::PngEncoder::new(cursor);

        encoder
            .write_image(
                &self.to_rgba8(),
                self.width,
                self.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| BakeError::PackingFailure(format!("Failed to encode PNG: {}", e)))?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_slice() {
        let slice = SliceImage::filled(3, 2, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(slice.pixels.len(), slice.expected_len());
        assert!(slice.texels().all(|t| t == [0.1, 0.2, 0.3, 1.0]));
    }

    #[test]
    fn test_get_set_pixel() {
        let mut slice = SliceImage::new(2, 2);
        slice.set_pixel(1, 0, [1.0, 0.0, 0.0, 1.0]);
        slice.set_pixel(0, 1, [0.0, 0.0, 1.0, 1.0]);

        assert_eq!(slice.get_pixel(1, 0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(slice.get_pixel(0, 1), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(slice.pixels[4..8], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_atlas_resize_clears() {
        let mut atlas = VolumeAtlas::new(AtlasLayout::for_slices(4, 2, 2).unwrap());
        atlas.pixels.iter_mut().for_each(|v| *v = 1.0);

        atlas.resize(AtlasLayout::for_slices(6, 2, 2).unwrap());
        assert_eq!((atlas.width, atlas.height), (6, 4));
        assert_eq!(atlas.pixels.len(), 6 * 4 * 4);
        assert!(atlas.pixels.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rgba8_flips_rows() {
        let mut atlas = VolumeAtlas::new(AtlasLayout::for_slices(1, 1, 2).unwrap());
        // Bottom scanline red, top scanline blue.
        atlas.pixels[..4].copy_from_slice(&[1.0, 0.0, 0.0, 1.0]);
        atlas.pixels[4..].copy_from_slice(&[0.0, 0.0, 1.0, 0.5]);

        assert_eq!(atlas.to_rgba8(), vec![0, 0, 255, 128, 255, 0, 0, 255]);
    }

    #[test]
    fn test_png_roundtrip_dimensions() {
        let atlas = VolumeAtlas::new(AtlasLayout::for_slices(6, 4, 3).unwrap());
        let png = atlas.to_png().unwrap();

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 12);
        assert_eq!(decoded.height(), 6);
    }
}
