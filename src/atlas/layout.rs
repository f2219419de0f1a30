//! Near-square grid layout for a slice count.

use crate::error::{BakeError, Result};
use serde::{Deserialize, Serialize};

/// Grid layout of slices inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub rows: u32,
    pub cols: u32,
    pub slice_width: u32,
    pub slice_height: u32,
    pub atlas_width: u32,
    pub atlas_height: u32,
}

/// Find `(rows, cols)` with `rows * cols == n` minimizing `rows² + cols²`.
///
/// Divisors are scanned from `n` down to 1 and a pair replaces the current
/// best unless it is strictly worse, so among equally square pairs the one
/// with fewer rows wins (12 gives 3 x 4). Returns `(1, n)` if nothing
/// qualifies, which can only happen for `n == 0`.
pub fn solve_factors(n: u32) -> (u32, u32) {
    let mut best: Option<(u32, u32)> = None;

    for d in (1..=n).rev() {
        if n % d != 0 {
            continue;
        }
        let c = n / d;
        let score = sum_of_squares(d, c);

        if let Some((rows, cols)) = best {
            if score > sum_of_squares(rows, cols) {
                continue;
            }
        }
        best = Some((d, c));
    }

    best.unwrap_or((1, n))
}

fn sum_of_squares(a: u32, b: u32) -> u64 {
    let (a, b) = (a as u64, b as u64);
    a * a + b * b
}

impl AtlasLayout {
    /// Layout for `num_slices` slices of `slice_width x slice_height` pixels.
    ///
    /// Fails when an atlas side does not fit in a `u32`.
    pub fn for_slices(num_slices: u32, slice_width: u32, slice_height: u32) -> Result<Self> {
        let (rows, cols) = solve_factors(num_slices);
        let too_large = || {
            BakeError::InvalidConfig(format!(
                "{} slices of {}x{} need a {} x {} atlas, which is too large",
                num_slices, slice_width, slice_height, cols, rows
            ))
        };

        Ok(Self {
            rows,
            cols,
            slice_width,
            slice_height,
            atlas_width: slice_width.checked_mul(cols).ok_or_else(too_large)?,
            atlas_height: slice_height.checked_mul(rows).ok_or_else(too_large)?,
        })
    }

    pub fn num_slices(&self) -> usize {
        (self.rows * self.cols) as usize
    }

    /// Grid cell `(row, col)` of a slice in index order, before the row inversion.
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let cols = self.cols as usize;
        ((index / cols) as u32, (index % cols) as u32)
    }

    /// Pixel offset `(x, y)` of a slice's block in the atlas buffer.
    pub fn block_origin(&self, index: usize) -> (u32, u32) {
        let (row, col) = self.cell(index);
        (
            col * self.slice_width,
            (self.rows - 1 - row) * self.slice_height,
        )
    }

    /// Map slice-local texture coordinates into atlas coordinates.
    ///
    /// `v` is measured along buffer rows, like `u` along columns.
    pub fn slice_uv(&self, index: usize, u: f32, v: f32) -> [f32; 2] {
        let (row, col) = self.cell(index);
        let cols = self.cols as f32;
        let rows = self.rows as f32;
        [
            col as f32 / cols + u / cols,
            (rows - 1.0 - row as f32) / rows + v / rows,
        ]
    }
}
