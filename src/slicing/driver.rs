//! Renders every slice of a plan, one blocking render at a time.

use super::planner::SlicePlan;
use super::store::SliceStore;
use crate::encoding::SliceEncoder;
use crate::error::{BakeError, Result};
use crate::progress::{CancelToken, ProgressSink};
use crate::render::{CameraId, RenderSettings, Renderer};
use log::{debug, warn};

/// Drives the renderer through a slice plan.
pub struct SliceRenderDriver<'a> {
    plan: &'a SlicePlan,
    width: u32,
    height: u32,
    encoder: &'a SliceEncoder,
}

impl<'a> SliceRenderDriver<'a> {
    pub fn new(plan: &'a SlicePlan, width: u32, height: u32, encoder: &'a SliceEncoder) -> Self {
        Self {
            plan,
            width,
            height,
            encoder,
        }
    }

    /// Render all slices in index order into `store`.
    ///
    /// Cancellation is checked before each slice. Any renderer failure aborts
    /// the run. `progress.end()` is called on every exit path.
    pub fn run<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        camera: CameraId,
        store: &mut SliceStore,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<()> {
        progress.begin(self.plan.num_slices());
        let result = self.render_all(renderer, camera, store, progress, cancel);
        if result.is_ok() {
            progress.update(1.0);
        }
        progress.end();
        result
    }

    fn render_all<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        camera: CameraId,
        store: &mut SliceStore,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<()> {
        let total = self.plan.num_slices();
        let source = self.encoder.graph().source;

        for slice in &self.plan.slices {
            if cancel.is_cancelled() {
                return Err(BakeError::Cancelled {
                    completed: slice.index,
                });
            }
            progress.update(slice.index as f32 / total as f32);

            let settings = RenderSettings {
                clip: slice.clip(),
                width: self.width,
                height: self.height,
                passes: self.encoder.encoding().required_passes(),
            };
            debug!(
                "Rendering slice {} at depth {:.4} (clip {:.4}..{:.4})",
                slice.index, slice.depth, slice.clip_near, slice.clip_far
            );

            let output = renderer
                .configure(camera, &settings)
                .and_then(|_| renderer.render())
                .map_err(|e| BakeError::RenderFailure {
                    slice: slice.index,
                    reason: e.to_string(),
                })?;

            if slice.index == 0 && self.encoder.is_missing_pass(&output) {
                warn!(
                    "Renderer did not produce the {:?} pass, falling back to the combined output",
                    source
                );
            }

            store.put(slice.index, self.encoder.encode(output))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Encoding;
    use crate::render::CameraGuard;
    use crate::slicing::{plan_slices, SliceStorage};
    use crate::testing::{slice_color, MockRenderer};
    use crate::types::{MeshBounds, Vec3};

    fn plan(num_slices: usize) -> SlicePlan {
        plan_slices(MeshBounds::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 2.0)), num_slices)
    }

    #[test]
    fn test_renders_in_order_with_progress() {
        let plan = plan(4);
        let encoder = SliceEncoder::new(Encoding::Combined);
        let driver = SliceRenderDriver::new(&plan, 3, 2, &encoder);
        let mut store = SliceStore::new(SliceStorage::Memory, 4).unwrap();
        let mut renderer = MockRenderer::default();
        let mut fractions = Vec::new();

        {
            let mut guard = CameraGuard::new(&mut renderer, &plan.camera).unwrap();
            let camera = guard.id();
            driver
                .run(&mut *guard, camera, &mut store, &mut |f: f32| fractions.push(f), &CancelToken::new())
                .unwrap();
        }

        assert_eq!(fractions, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(renderer.renders, 4);
        assert!(renderer.live_cameras.is_empty());

        let clips: Vec<_> = renderer.settings.iter().map(|s| s.clip).collect();
        let expected: Vec<_> = plan.slices.iter().map(|s| s.clip()).collect();
        assert_eq!(clips, expected);
        assert!(renderer.settings.iter().all(|s| s.width == 3 && s.height == 2));

        for i in 0..4 {
            assert_eq!(store.take(i).unwrap().unwrap().get_pixel(0, 0), slice_color(i));
        }
    }

    #[test]
    fn test_requests_normal_pass() {
        let plan = plan(1);
        let encoder = SliceEncoder::new(Encoding::Normal);
        let driver = SliceRenderDriver::new(&plan, 1, 1, &encoder);
        let mut store = SliceStore::new(SliceStorage::Memory, 1).unwrap();
        let mut renderer = MockRenderer::default();
        let camera = renderer.add_camera(&plan.camera).unwrap();

        driver
            .run(&mut renderer, camera, &mut store, &mut crate::progress::NoProgress, &CancelToken::new())
            .unwrap();

        assert!(renderer.settings[0].passes.normal);
        assert!(!renderer.settings[0].passes.diffuse_color);
        assert_eq!(store.take(0).unwrap().unwrap().get_pixel(0, 0), [0.5, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn test_render_failure_aborts() {
        let plan = plan(5);
        let encoder = SliceEncoder::new(Encoding::Combined);
        let driver = SliceRenderDriver::new(&plan, 2, 2, &encoder);
        let mut store = SliceStore::new(SliceStorage::Memory, 5).unwrap();
        let mut renderer = MockRenderer {
            fail_on: Some(1),
            ..Default::default()
        };
        let camera = renderer.add_camera(&plan.camera).unwrap();
        let mut ended = false;

        struct EndFlag<'a>(&'a mut bool);
        impl ProgressSink for EndFlag<'_> {
            fn update(&mut self, _fraction: f32) {}
            fn end(&mut self) {
                *self.0 = true;
            }
        }

        let err = driver
            .run(&mut renderer, camera, &mut store, &mut EndFlag(&mut ended), &CancelToken::new())
            .unwrap_err();

        assert!(matches!(err, BakeError::RenderFailure { slice: 1, .. }));
        assert_eq!(renderer.renders, 2);
        assert!(ended);
    }

    #[test]
    fn test_cancel_before_start() {
        let plan = plan(3);
        let encoder = SliceEncoder::new(Encoding::Combined);
        let driver = SliceRenderDriver::new(&plan, 2, 2, &encoder);
        let mut store = SliceStore::new(SliceStorage::Memory, 3).unwrap();
        let mut renderer = MockRenderer::default();
        let camera = renderer.add_camera(&plan.camera).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = driver
            .run(&mut renderer, camera, &mut store, &mut crate::progress::NoProgress, &cancel)
            .unwrap_err();
        assert!(matches!(err, BakeError::Cancelled { completed: 0 }));
        assert_eq!(renderer.renders, 0);
    }
}
