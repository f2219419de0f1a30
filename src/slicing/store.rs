//! Scoped storage for rendered slices between rendering and packing.
//!
//! The temp-dir store writes each slice to `slice_NNN.rgbaf` inside a
//! directory that is deleted when the store is dropped, on every exit path.

use crate::atlas::SliceImage;
use crate::error::{BakeError, Result};
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MAGIC: &[u8; 4] = b"SLC1";
const HEADER_LEN: u64 = 4 + 4 + 4 + 8;

/// Where intermediate slices live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceStorage {
    /// A scoped temporary directory on disk.
    #[default]
    TempDir,
    /// Kept in memory.
    Memory,
}

/// Rendered slices keyed by slice index.
#[derive(Debug)]
pub enum SliceStore {
    Memory(Vec<Option<SliceImage>>),
    Disk { dir: TempDir, files: Vec<Option<PathBuf>> },
}

impl SliceStore {
    /// Create a store for `num_slices` slices. A disk store lives in the
    /// system temp directory.
    pub fn new(storage: SliceStorage, num_slices: usize) -> Result<Self> {
        Self::new_in(storage, num_slices, None)
    }

    /// Like [`SliceStore::new`], but a disk store is created under `root`
    /// when one is given.
    pub fn new_in(storage: SliceStorage, num_slices: usize, root: Option<&Path>) -> Result<Self> {
        Ok(match storage {
            SliceStorage::Memory => SliceStore::Memory(vec![None; num_slices]),
            SliceStorage::TempDir => {
                let mut builder = tempfile::Builder::new();
                builder.prefix("texture3d-slices");
                let dir = match root {
                    Some(root) => builder.tempdir_in(root)?,
                    None => builder.tempdir()?,
                };
                SliceStore::Disk {
                    dir,
                    files: vec![None; num_slices],
                }
            }
        })
    }

    /// Directory backing the store, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SliceStore::Memory(_) => None,
            SliceStore::Disk { dir, .. } => Some(dir.path()),
        }
    }

    /// Store slice `index`, replacing any previous image.
    pub fn put(&mut self, index: usize, image: SliceImage) -> Result<()> {
        match self {
            SliceStore::Memory(slices) => {
                let slot = slices.get_mut(index).ok_or_else(|| out_of_range(index))?;
                *slot = Some(image);
            }
            SliceStore::Disk { dir, files } => {
                let slot = files.get_mut(index).ok_or_else(|| out_of_range(index))?;
                let path = dir.path().join(format!("slice_{:03}.rgbaf", index));
                write_slice(&path, &image)?;
                *slot = Some(path);
            }
        }
        Ok(())
    }

    /// Number of stored slices.
    pub fn len(&self) -> usize {
        match self {
            SliceStore::Memory(slices) => slices.iter().flatten().count(),
            SliceStore::Disk { files, .. } => files.iter().flatten().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take slice `index` out of the store. `None` if it was never stored.
    pub fn take(&mut self, index: usize) -> Result<Option<SliceImage>> {
        match self {
            SliceStore::Memory(slices) => Ok(slices.get_mut(index).and_then(Option::take)),
            SliceStore::Disk { files, .. } => match files.get_mut(index).and_then(Option::take) {
                Some(path) => {
                    let image = read_slice(&path)?;
                    fs::remove_file(&path)?;
                    Ok(Some(image))
                }
                None => Ok(None),
            },
        }
    }
}

fn out_of_range(index: usize) -> BakeError {
    BakeError::PackingFailure(format!("slice {} is outside the slice store", index))
}

/// Header: magic, then width, height and value count as native-endian words.
/// The payload is the raw f32 texel buffer. Files never outlive the process.
fn write_slice(path: &Path, image: &SliceImage) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_all(bytemuck::bytes_of(&[image.width, image.height]))?;
    writer.write_all(bytemuck::bytes_of(&(image.pixels.len() as u64)))?;
    writer.write_all(bytemuck::cast_slice(&image.pixels))?;
    writer.flush()?;
    Ok(())
}

fn read_slice(path: &Path) -> Result<SliceImage> {
    let file = fs::File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(BakeError::PackingFailure(format!(
            "{} is not a slice file",
            path.display()
        )));
    }

    let mut dims = [0u32; 2];
    reader.read_exact(bytemuck::bytes_of_mut(&mut dims))?;
    let mut count = 0u64;
    reader.read_exact(bytemuck::bytes_of_mut(&mut count))?;

    if count.checked_mul(4).and_then(|n| n.checked_add(HEADER_LEN)) != Some(file_len) {
        return Err(BakeError::PackingFailure(format!(
            "{} is truncated",
            path.display()
        )));
    }

    let mut pixels = vec![0.0f32; count as usize];
    reader.read_exact(bytemuck::cast_slice_mut(&mut pixels))?;

    Ok(SliceImage::from_pixels(dims[0], dims[1], pixels))
}
