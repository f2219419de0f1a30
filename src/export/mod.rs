//! Writing the baked atlas to disk.
//!
//! The atlas goes out as an 8-bit RGBA PNG. A JSON sidecar records the grid
//! so shader code can address slice `i` at
//! `u = (i % cols) / cols + u_local / cols`.

use crate::atlas::{AtlasLayout, VolumeAtlas};
use crate::error::Result;
use crate::types::BakeMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Grid description written next to the atlas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasMetadata {
    pub rows: u32,
    pub cols: u32,
    pub slice_width: u32,
    pub slice_height: u32,
    pub slices: u32,
    pub width: u32,
    pub height: u32,
    pub bake_mode: BakeMode,
}

impl AtlasMetadata {
    pub fn new(layout: &AtlasLayout, bake_mode: BakeMode) -> Self {
        Self {
            rows: layout.rows,
            cols: layout.cols,
            slice_width: layout.slice_width,
            slice_height: layout.slice_height,
            slices: layout.rows * layout.cols,
            width: layout.atlas_width,
            height: layout.atlas_height,
            bake_mode,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write the atlas as PNG.
pub fn write_png<P: AsRef<Path>>(atlas: &VolumeAtlas, path: P) -> Result<usize> {
    let png = atlas.to_png()?;
    fs::write(path, &png)?;
    Ok(png.len())
}

/// Write the JSON sidecar.
pub fn write_metadata<P: AsRef<Path>>(metadata: &AtlasMetadata, path: P) -> Result<()> {
    fs::write(path, metadata.to_json()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json() {
        let layout = AtlasLayout::for_slices(12, 32, 16).unwrap();
        let metadata = AtlasMetadata::new(&layout, BakeMode::Normal);
        let json = metadata.to_json().unwrap();

        assert!(json.contains("\"bake_mode\": \"NORMAL\""));
        let parsed: AtlasMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
        assert_eq!((parsed.rows, parsed.cols, parsed.width, parsed.height), (3, 4, 128, 48));
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = AtlasLayout::for_slices(4, 2, 2).unwrap();
        let atlas = VolumeAtlas::new(layout);

        let png_path = dir.path().join("volume.png");
        let written = write_png(&atlas, &png_path).unwrap();
        assert_eq!(std::fs::metadata(&png_path).unwrap().len() as usize, written);

        let json_path = dir.path().join("volume.json");
        write_metadata(&AtlasMetadata::new(&layout, BakeMode::Other), &json_path).unwrap();
        assert!(std::fs::read_to_string(&json_path).unwrap().contains("\"cols\": 2"));
    }
}
