//! Volume atlas layout and packing.
//!
//! Slices are laid out in a near-square grid of `rows x cols` blocks. Slice 0
//! occupies the last block row of the buffer, and increasing slice indices
//! walk left to right, then towards the first block row.

mod image;
mod layout;
mod packer;

pub use image::{SliceImage, VolumeAtlas};
pub use layout::{solve_factors, AtlasLayout};
pub use packer::{unpack_slice, AtlasPacker, PackReport};
