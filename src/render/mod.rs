//! The renderer capability the baker drives.
//!
//! The baker never rasterizes anything itself. It places a temporary camera,
//! configures clip planes, resolution and auxiliary passes, then asks the
//! renderer for one synchronous render per slice.

mod software;

pub use software::SoftwareRenderer;

use crate::atlas::SliceImage;
use crate::encoding::CompositeGraph;
use crate::types::{ClipRange, OrthoCamera};
use std::ops::{Deref, DerefMut};
use thiserror::Error;

/// Failure reported by a renderer.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct RenderError(pub String);

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Handle to a camera owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraId(pub u64);

/// Auxiliary passes to produce alongside the combined output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPasses {
    pub diffuse_color: bool,
    pub normal: bool,
}

/// Per-slice render configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub clip: ClipRange,
    pub width: u32,
    pub height: u32,
    pub passes: RenderPasses,
}

/// Buffers produced by one render.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    /// The default combined color output (RGBA).
    pub combined: SliceImage,
    /// Diffuse color pass, if requested and available.
    pub diffuse_color: Option<SliceImage>,
    /// Normal pass (XYZ in RGB), if requested and available.
    pub normal: Option<SliceImage>,
    /// Native alpha, one value per texel.
    pub alpha: Option<Vec<f32>>,
    /// Final image when the renderer realized the compositing graph itself.
    pub composited: Option<SliceImage>,
}

impl RenderOutput {
    pub fn new(combined: SliceImage) -> Self {
        Self {
            combined,
            ..Self::default()
        }
    }
}

/// An offline renderer that can be driven slice by slice.
pub trait Renderer {
    /// Create a camera and make it the active one.
    fn add_camera(&mut self, camera: &OrthoCamera) -> Result<CameraId, RenderError>;

    /// Remove a camera created by `add_camera`. Unknown ids are ignored.
    fn remove_camera(&mut self, id: CameraId);

    /// Apply clip planes, resolution and pass requests for the next render.
    fn configure(&mut self, camera: CameraId, settings: &RenderSettings) -> Result<(), RenderError>;

    /// Offer the per-pixel encoding as a compositing graph.
    ///
    /// Return `true` if the renderer will apply it and fill
    /// [`RenderOutput::composited`]; the baker then skips its own evaluation.
    fn install_compositor(&mut self, _graph: &CompositeGraph) -> bool {
        false
    }

    /// Render the active camera synchronously.
    fn render(&mut self) -> Result<RenderOutput, RenderError>;
}

/// A temporary camera that is removed from the renderer when dropped.
pub struct CameraGuard<'r, R: Renderer + ?Sized> {
    renderer: &'r mut R,
    id: CameraId,
}

impl<'r, R: Renderer + ?Sized> CameraGuard<'r, R> {
    pub fn new(renderer: &'r mut R, camera: &OrthoCamera) -> Result<Self, RenderError> {
        let id = renderer.add_camera(camera)?;
        Ok(Self { renderer, id })
    }

    pub fn id(&self) -> CameraId {
        self.id
    }
}

impl<R: Renderer + ?Sized> Deref for CameraGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> DerefMut for CameraGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> Drop for CameraGuard<'_, R> {
    fn drop(&mut self) {
        self.renderer.remove_camera(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    #[derive(Default)]
    struct CameraLedger {
        live: Vec<CameraId>,
        next: u64,
    }

    impl Renderer for CameraLedger {
        fn add_camera(&mut self, _camera: &OrthoCamera) -> Result<CameraId, RenderError> {
            self.next += 1;
            let id = CameraId(self.next);
            self.live.push(id);
            Ok(id)
        }

        fn remove_camera(&mut self, id: CameraId) {
            self.live.retain(|&c| c != id);
        }

        fn configure(&mut self, _camera: CameraId, _settings: &RenderSettings) -> Result<(), RenderError> {
            Ok(())
        }

        fn render(&mut self) -> Result<RenderOutput, RenderError> {
            Err(RenderError::new("nothing to render"))
        }
    }

    #[test]
    fn test_camera_guard_removes_on_drop() {
        let mut renderer = CameraLedger::default();
        let camera = OrthoCamera::new(Vec3::Z, 1.0);
        {
            let mut guard = CameraGuard::new(&mut renderer, &camera).unwrap();
            assert_eq!(guard.live, vec![guard.id()]);
            assert!(guard.render().is_err());
        }
        assert!(renderer.live.is_empty());
    }

    #[test]
    fn test_camera_guard_removes_on_early_return() {
        fn fails(renderer: &mut CameraLedger) -> Result<(), RenderError> {
            let mut guard = CameraGuard::new(renderer, &OrthoCamera::new(Vec3::Z, 1.0))?;
            guard.render()?;
            Ok(())
        }

        let mut renderer = CameraLedger::default();
        assert!(fails(&mut renderer).is_err());
        assert!(renderer.live.is_empty());
        assert_eq!(renderer.next, 1);
    }
}
