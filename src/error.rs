//! Error types for the volume texture baker.

use thiserror::Error;

/// Result type alias using BakeError.
pub type Result<T> = std::result::Result<T, BakeError>;

/// Main error type for bake operations.
#[derive(Error, Debug)]
pub enum BakeError {
    /// No usable mesh selection, or the evaluated mesh is empty.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Bake configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The renderer reported failure for a slice. Aborts the whole bake.
    #[error("Render failed on slice {slice}: {reason}")]
    RenderFailure { slice: usize, reason: String },

    /// A slice buffer did not have the expected dimensions.
    #[error("Slice {slice} has {actual} values, expected {expected}")]
    SizeMismatch {
        slice: usize,
        expected: usize,
        actual: usize,
    },

    /// Unexpected failure while copying slices into the atlas.
    #[error("Packing failed: {0}")]
    PackingFailure(String),

    /// The bake was cancelled between slices.
    #[error("Bake cancelled after {completed} slice(s)")]
    Cancelled { completed: usize },

    /// Malformed or unreadable OBJ file.
    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),

    /// Failed to encode or decode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Failed to parse JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
