//! A scripted renderer for pipeline tests.

use crate::atlas::SliceImage;
use crate::encoding::CompositeGraph;
use crate::progress::CancelToken;
use crate::render::{CameraId, RenderError, RenderOutput, RenderSettings, Renderer};
use crate::types::OrthoCamera;

/// Combined color returned for the `n`th render.
pub fn slice_color(n: usize) -> [f32; 4] {
    [(n + 1) as f32 * 0.1, 0.25, 0.5, 1.0]
}

/// Returns a constant color per render and records what it was asked to do.
#[derive(Default)]
pub struct MockRenderer {
    pub cameras_added: Vec<OrthoCamera>,
    pub live_cameras: Vec<CameraId>,
    pub settings: Vec<RenderSettings>,
    pub renders: usize,
    /// Fail the render with this index.
    pub fail_on: Option<usize>,
    /// Return a buffer one texel too wide for this render.
    pub wrong_size_on: Option<usize>,
    /// Cancel this token once this render has finished.
    pub cancel_after: Option<(usize, CancelToken)>,
    /// Claim to realize compositing graphs, filling `composited` with white.
    pub composites: bool,
    pub installed_graph: Option<CompositeGraph>,
}

impl Renderer for MockRenderer {
    fn add_camera(&mut self, camera: &OrthoCamera) -> Result<CameraId, RenderError> {
        self.cameras_added.push(*camera);
        let id = CameraId(self.cameras_added.len() as u64);
        self.live_cameras.push(id);
        Ok(id)
    }

    fn remove_camera(&mut self, id: CameraId) {
        self.live_cameras.retain(|&c| c != id);
    }

    fn configure(&mut self, camera: CameraId, settings: &RenderSettings) -> Result<(), RenderError> {
        if !self.live_cameras.contains(&camera) {
            return Err(RenderError::new("unknown camera"));
        }
        self.settings.push(*settings);
        Ok(())
    }

    fn install_compositor(&mut self, graph: &CompositeGraph) -> bool {
        self.installed_graph = Some(graph.clone());
        self.composites
    }

    fn render(&mut self) -> Result<RenderOutput, RenderError> {
        let n = self.renders;
        self.renders += 1;

        if self.fail_on == Some(n) {
            return Err(RenderError::new("device lost"));
        }

        let settings = self
            .settings
            .last()
            .copied()
            .ok_or_else(|| RenderError::new("render before configure"))?;
        let width = if self.wrong_size_on == Some(n) {
            settings.width + 1
        } else {
            settings.width
        };

        let mut output = RenderOutput::new(SliceImage::filled(width, settings.height, slice_color(n)));
        if settings.passes.normal {
            output.normal = Some(SliceImage::filled(width, settings.height, [0.0, 0.0, 1.0, 1.0]));
        }
        if settings.passes.diffuse_color {
            output.diffuse_color = Some(SliceImage::filled(width, settings.height, [0.8, 0.6, 0.4, 1.0]));
        }
        output.alpha = Some(vec![1.0; width as usize * settings.height as usize]);
        if self.composites {
            output.composited = Some(SliceImage::filled(width, settings.height, [1.0; 4]));
        }

        if let Some((after, token)) = &self.cancel_after {
            if *after == n {
                token.cancel();
            }
        }

        Ok(output)
    }
}
