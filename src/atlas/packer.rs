//! Copies slice buffers into their blocks of the atlas.

use super::{SliceImage, VolumeAtlas};
use crate::error::{BakeError, Result};
use log::warn;

/// Outcome of a packing pass.
#[derive(Debug, Default)]
pub struct PackReport {
    /// Slice indices copied into the atlas.
    pub packed: Vec<usize>,
    /// Slices skipped because their buffer had the wrong size.
    pub skipped: Vec<BakeError>,
}

impl PackReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Packs slices into an atlas one at a time.
pub struct AtlasPacker<'a> {
    atlas: &'a mut VolumeAtlas,
    report: PackReport,
}

impl<'a> AtlasPacker<'a> {
    /// Start packing into `atlas`. Fails if the buffer does not match its layout.
    pub fn new(atlas: &'a mut VolumeAtlas) -> Result<Self> {
        let layout = atlas.layout;
        let expected = layout.atlas_width as usize * layout.atlas_height as usize * 4;
        if atlas.pixels.len() != expected
            || atlas.width != layout.atlas_width
            || atlas.height != layout.atlas_height
        {
            return Err(BakeError::PackingFailure(format!(
                "atlas buffer holds {} values, layout needs {}x{}",
                atlas.pixels.len(),
                layout.atlas_width,
                layout.atlas_height
            )));
        }

        Ok(Self {
            atlas,
            report: PackReport::default(),
        })
    }

    /// Copy slice `index` into its block.
    ///
    /// A wrongly sized slice is logged and skipped, leaving its block
    /// untouched. An index outside the layout is a packing failure.
    pub fn add_slice(&mut self, index: usize, slice: &SliceImage) -> Result<()> {
        match copy_slice(self.atlas, index, slice) {
            Ok(()) => {
                self.report.packed.push(index);
                Ok(())
            }
            Err(err @ BakeError::SizeMismatch { .. }) => {
                warn!("Skipping slice {}: {}", index, err);
                self.report.skipped.push(err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn finish(self) -> PackReport {
        self.report
    }
}

/// Copy one slice into the atlas, row by row.
///
/// Slice `i` goes to grid cell `(i / cols, i % cols)`, with the block row
/// inverted so slice 0 lands in the last block row. Rows inside a block keep
/// the slice's own order.
fn copy_slice(atlas: &mut VolumeAtlas, index: usize, slice: &SliceImage) -> Result<()> {
    let layout = atlas.layout;
    if index >= layout.num_slices() {
        return Err(BakeError::PackingFailure(format!(
            "slice {} does not fit a {}x{} layout",
            index, layout.rows, layout.cols
        )));
    }

    let slice_width = layout.slice_width as usize;
    let slice_height = layout.slice_height as usize;
    let expected = slice_width * slice_height * 4;
    if slice.width != layout.slice_width
        || slice.height != layout.slice_height
        || slice.pixels.len() != slice.expected_len()
    {
        return Err(BakeError::SizeMismatch {
            slice: index,
            expected,
            actual: slice.pixels.len(),
        });
    }

    let (block_x, block_y) = layout.block_origin(index);
    let atlas_width = layout.atlas_width as usize;

    for y in 0..slice_height {
        let src_start = y * slice_width * 4;
        let dst_start = ((block_y as usize + y) * atlas_width + block_x as usize) * 4;
        let len = slice_width * 4;

        atlas.pixels[dst_start..dst_start + len]
            .copy_from_slice(&slice.pixels[src_start..src_start + len]);
    }

    Ok(())
}

/// Read slice `index` back out of the atlas.
pub fn unpack_slice(atlas: &VolumeAtlas, index: usize) -> Result<SliceImage> {
    let layout = atlas.layout;
    if index >= layout.num_slices() {
        return Err(BakeError::PackingFailure(format!(
            "slice {} does not fit a {}x{} layout",
            index, layout.rows, layout.cols
        )));
    }

    let slice_width = layout.slice_width as usize;
    let (block_x, block_y) = layout.block_origin(index);
    let atlas_width = layout.atlas_width as usize;
    let mut pixels = Vec::with_capacity(slice_width * layout.slice_height as usize * 4);

    for y in 0..layout.slice_height as usize {
        let start = ((block_y as usize + y) * atlas_width + block_x as usize) * 4;
        pixels.extend_from_slice(&atlas.pixels[start..start + slice_width * 4]);
    }

    Ok(SliceImage::from_pixels(
        layout.slice_width,
        layout.slice_height,
        pixels,
    ))
}
