//! Bake configuration.

use crate::error::{BakeError, Result};
use crate::types::BakeMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_size() -> u32 {
    256
}

/// Immutable input to a bake run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeConfig {
    /// Slice width in pixels.
    #[serde(default = "default_size")]
    pub size_x: u32,
    /// Slice height in pixels.
    #[serde(default = "default_size")]
    pub size_y: u32,
    /// Number of depth slices.
    #[serde(default = "default_size")]
    pub size_z: u32,
    /// Which quantity to capture.
    #[serde(default)]
    pub bake_mode: BakeMode,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            size_x: default_size(),
            size_y: default_size(),
            size_z: default_size(),
            bake_mode: BakeMode::default(),
        }
    }
}

impl BakeConfig {
    pub fn new(size_x: u32, size_y: u32, size_z: u32, bake_mode: BakeMode) -> Self {
        Self {
            size_x,
            size_y,
            size_z,
            bake_mode,
        }
    }

    /// Set the bake mode.
    pub fn with_mode(mut self, bake_mode: BakeMode) -> Self {
        self.bake_mode = bake_mode;
        self
    }

    /// Number of slices rendered.
    pub fn num_slices(&self) -> usize {
        self.size_z as usize
    }

    /// All sizes must be at least 1.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("size_x", self.size_x),
            ("size_y", self.size_y),
            ("size_z", self.size_z),
        ] {
            if value == 0 {
                return Err(BakeError::InvalidConfig(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
