//! Shared types used throughout the library.

mod camera;

pub use camera::{ClipRange, OrthoCamera};
pub use glam::Vec3;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// World-space axis-aligned bounds of an evaluated mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl MeshBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Per-axis min/max over a set of points. `None` if there are no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;

        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// True when any extent is zero (a flat or point-like mesh).
    pub fn is_degenerate(&self) -> bool {
        let d = self.dimensions();
        d.x == 0.0 || d.y == 0.0 || d.z == 0.0
    }
}

/// Which quantity a bake captures per slice.
///
/// Mirrors the host renderer's bake-type setting: anything that is not
/// `DIFFUSE` or `NORMAL` bakes the combined color output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BakeMode {
    Diffuse,
    Normal,
    #[default]
    Other,
}

impl From<String> for BakeMode {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(mode) => mode,
            Err(never) => match never {},
        }
    }
}

impl From<BakeMode> for String {
    fn from(mode: BakeMode) -> Self {
        mode.to_string()
    }
}

impl FromStr for BakeMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "DIFFUSE" => BakeMode::Diffuse,
            "NORMAL" => BakeMode::Normal,
            _ => BakeMode::Other,
        })
    }
}

impl fmt::Display for BakeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BakeMode::Diffuse => "DIFFUSE",
            BakeMode::Normal => "NORMAL",
            BakeMode::Other => "OTHER",
        };
        f.write_str(name)
    }
}
