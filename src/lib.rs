//! # Texture 3D Baker
//!
//! Bakes a mesh into a volumetric texture stored as a 2D sprite-sheet atlas.
//!
//! ## Overview
//!
//! The mesh's bounds are sliced into `size_z` thin depth slabs. Each slab is
//! rendered through an orthographic camera looking down -Z, encoded (raw
//! diffuse color, encoded normals, or the combined output) and copied into
//! its block of a near-square `rows x cols` atlas.
//!
//! Rendering is delegated to a [`Renderer`]; [`SoftwareRenderer`] is a CPU
//! reference implementation.
//!
//! ## Quick Start
//!
//! ```ignore
//! use texture3d_baker::{load_obj, BakeConfig, BakeMode, Baker, CancelToken, NoProgress, SoftwareRenderer};
//!
//! let mesh = load_obj("model.obj")?;
//! let mut renderer = SoftwareRenderer::new(mesh.clone());
//!
//! let baker = Baker::new(BakeConfig::new(64, 64, 64, BakeMode::Diffuse));
//! let output = baker.bake(&mesh, &mut renderer, &mut NoProgress, &CancelToken::new())?;
//!
//! std::fs::write("volume.png", output.atlas.to_png()?)?;
//! ```

pub mod atlas;
pub mod baker;
pub mod config;
pub mod encoding;
pub mod error;
pub mod export;
pub mod mesh;
pub mod progress;
pub mod render;
pub mod slicing;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use atlas::{solve_factors, AtlasLayout, SliceImage, VolumeAtlas};
pub use baker::{BakeOutput, Baker};
pub use config::BakeConfig;
pub use encoding::{CompositeGraph, Encoding};
pub use error::{BakeError, Result};
pub use export::AtlasMetadata;
pub use mesh::{select_mesh, EvaluatedMesh, ObjectKind, SceneObject, TriangleMesh};
pub use progress::{CancelToken, LogProgress, NoProgress, ProgressSink};
pub use render::{RenderOutput, RenderSettings, Renderer, SoftwareRenderer};
pub use slicing::{SlicePlan, SliceSpec, SliceStorage};
pub use types::{BakeMode, MeshBounds, OrthoCamera};

/// Load a Wavefront OBJ file as a triangle mesh.
pub fn load_obj<P: AsRef<std::path::Path>>(path: P) -> Result<TriangleMesh> {
    mesh::obj::load_obj(path)
}
