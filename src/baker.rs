//! Top-level bake sequencing.
//!
//! validate → plan → place camera → render slices → pack → release.
//! The temporary camera and slice storage are scoped values, so they are
//! released on every exit path, including failure and cancellation.

use crate::atlas::{AtlasLayout, AtlasPacker, PackReport, VolumeAtlas};
use crate::config::BakeConfig;
use crate::encoding::{Encoding, SliceEncoder};
use crate::error::{BakeError, Result};
use crate::mesh::{select_mesh, EvaluatedMesh, SceneObject};
use crate::progress::{CancelToken, ProgressSink};
use crate::render::{CameraGuard, Renderer};
use crate::slicing::{
    compute_bounds, plan_slices, SlicePlan, SliceRenderDriver, SliceStorage, SliceStore,
};
use log::{error, info};
use std::path::PathBuf;

/// Result of a successful bake.
#[derive(Debug)]
pub struct BakeOutput {
    /// The packed atlas.
    pub atlas: VolumeAtlas,
    /// Bounds, camera and slice depths used.
    pub plan: SlicePlan,
    /// Which slices were packed and which were skipped.
    pub report: PackReport,
}

impl BakeOutput {
    pub fn layout(&self) -> AtlasLayout {
        self.atlas.layout
    }

    /// Non-fatal problems (wrongly sized slices).
    pub fn warnings(&self) -> &[BakeError] {
        &self.report.skipped
    }
}

/// Bakes meshes into volume atlases.
#[derive(Debug, Clone)]
pub struct Baker {
    config: BakeConfig,
    storage: SliceStorage,
    scratch_dir: Option<PathBuf>,
}

impl Baker {
    pub fn new(config: BakeConfig) -> Self {
        Self {
            config,
            storage: SliceStorage::default(),
            scratch_dir: None,
        }
    }

    /// Choose where intermediate slices are kept.
    pub fn with_storage(mut self, storage: SliceStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Create disk slice storage under `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    /// Validate a selection and bake its mesh.
    pub fn bake_selection<R: Renderer + ?Sized>(
        &self,
        selected: &[SceneObject],
        renderer: &mut R,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<BakeOutput> {
        let mesh = select_mesh(selected)?;
        self.bake(mesh, renderer, progress, cancel)
    }

    /// Bake a mesh into a new atlas.
    pub fn bake<R: Renderer + ?Sized>(
        &self,
        mesh: &dyn EvaluatedMesh,
        renderer: &mut R,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<BakeOutput> {
        self.bake_into(mesh, renderer, progress, cancel, None)
    }

    /// Bake a mesh, reusing `atlas` if given. A reused atlas is resized and
    /// cleared to the new layout.
    pub fn bake_into<R: Renderer + ?Sized>(
        &self,
        mesh: &dyn EvaluatedMesh,
        renderer: &mut R,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
        atlas: Option<VolumeAtlas>,
    ) -> Result<BakeOutput> {
        self.config.validate()?;
        if !mesh.is_valid() {
            return Err(BakeError::InvalidInput(
                "Selected object is not a realized mesh".to_string(),
            ));
        }

        let bounds = compute_bounds(mesh)?;
        let plan = plan_slices(bounds, self.config.num_slices());
        let layout =
            AtlasLayout::for_slices(self.config.size_z, self.config.size_x, self.config.size_y)?;
        info!(
            "Baking {} slices of {}x{} ({} mode), bounds {:?}..{:?}",
            plan.num_slices(),
            self.config.size_x,
            self.config.size_y,
            self.config.bake_mode,
            bounds.min,
            bounds.max
        );

        let mut encoder = SliceEncoder::new(Encoding::from(self.config.bake_mode));
        let mut store =
            SliceStore::new_in(self.storage, plan.num_slices(), self.scratch_dir.as_deref())?;

        let mut camera = CameraGuard::new(renderer, &plan.camera).map_err(|e| {
            BakeError::RenderFailure {
                slice: 0,
                reason: format!("failed to create slice camera: {}", e),
            }
        })?;
        let composites = camera.install_compositor(encoder.graph());
        encoder.set_renderer_composites(composites);

        let camera_id = camera.id();
        SliceRenderDriver::new(&plan, self.config.size_x, self.config.size_y, &encoder).run(
            &mut *camera,
            camera_id,
            &mut store,
            progress,
            cancel,
        )?;

        let mut atlas = match atlas {
            Some(mut atlas) => {
                atlas.resize(layout);
                atlas
            }
            None => VolumeAtlas::new(layout),
        };
        let report = pack_from_store(&mut atlas, &mut store).map_err(|e| {
            error!("Failed to create 3D texture: {}", e);
            match e {
                BakeError::PackingFailure(_) => e,
                other => BakeError::PackingFailure(other.to_string()),
            }
        })?;
        drop(camera);

        info!(
            "3D texture packed: {} cols, {} rows, {}x{}",
            layout.cols, layout.rows, layout.atlas_width, layout.atlas_height
        );

        Ok(BakeOutput {
            atlas,
            plan,
            report,
        })
    }
}

fn pack_from_store(atlas: &mut VolumeAtlas, store: &mut SliceStore) -> Result<PackReport> {
    let num_slices = atlas.layout.num_slices();
    let mut packer = AtlasPacker::new(atlas)?;

    for index in 0..num_slices {
        let slice = store.take(index)?.ok_or_else(|| {
            BakeError::PackingFailure(format!("slice {} was never rendered", index))
        })?;
        packer.add_slice(index, &slice)?;
    }

    Ok(packer.finish())
}
