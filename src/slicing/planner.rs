//! Bounds computation and per-slice camera planning.

use crate::error::{BakeError, Result};
use crate::mesh::EvaluatedMesh;
use crate::types::{ClipRange, MeshBounds, OrthoCamera, Vec3};
use log::warn;

/// Height of the camera above the top of the bounds.
pub const Z_OFFSET: f32 = 1.0;
/// Clip slab extent in front of the slice depth (towards the camera).
pub const CLIP_BEHIND: f32 = 0.01;
/// Clip slab extent beyond the slice depth.
pub const CLIP_AHEAD: f32 = 0.1;

/// One depth sample of the bake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceSpec {
    pub index: usize,
    pub depth: f32,
    pub clip_near: f32,
    pub clip_far: f32,
}

impl SliceSpec {
    pub fn clip(&self) -> ClipRange {
        ClipRange::new(self.clip_near, self.clip_far)
    }
}

/// Camera placement and slice depths for a bake.
#[derive(Debug, Clone)]
pub struct SlicePlan {
    pub bounds: MeshBounds,
    pub camera: OrthoCamera,
    pub slices: Vec<SliceSpec>,
}

impl SlicePlan {
    pub fn num_slices(&self) -> usize {
        self.slices.len()
    }
}

/// Compute world-space bounds of an evaluated mesh.
///
/// Flat bounds are accepted but logged, since slices along a zero extent
/// can come out empty.
pub fn compute_bounds(mesh: &dyn EvaluatedMesh) -> Result<MeshBounds> {
    let bounds = MeshBounds::from_points(mesh.world_vertices()).ok_or_else(|| {
        BakeError::InvalidInput("Selected object is not a realized mesh".to_string())
    })?;
    if bounds.is_degenerate() {
        warn!("Mesh bounds are flat: extent {:?}", bounds.dimensions());
    }
    Ok(bounds)
}

/// `count` evenly spaced samples from `start` to `end`, both inclusive.
///
/// A single sample yields `start`.
pub fn linspace(start: f32, end: f32, count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end as f64 - start as f64) / (count - 1) as f64;
            let mut samples: Vec<f32> = (0..count)
                .map(|i| ((start as f64 + i as f64 * step) as f32).min(end))
                .collect();
            samples[count - 1] = end;
            samples
        }
    }
}

/// Place the camera and derive clip slabs for `num_slices` depth samples.
///
/// The camera sits at the world origin in X/Y, `Z_OFFSET` above `max.z`,
/// looking down -Z. Its orthographic scale covers the larger horizontal
/// extent, so non-square footprints are not framed tightly.
pub fn plan_slices(bounds: MeshBounds, num_slices: usize) -> SlicePlan {
    let extent = bounds.dimensions();
    let camera = OrthoCamera::new(
        Vec3::new(0.0, 0.0, bounds.max.z + Z_OFFSET),
        extent.x.max(extent.y),
    );

    let slices = linspace(bounds.min.z, bounds.max.z, num_slices)
        .into_iter()
        .enumerate()
        .map(|(index, depth)| SliceSpec {
            index,
            depth,
            clip_near: Z_OFFSET + depth - CLIP_BEHIND,
            clip_far: Z_OFFSET + depth + CLIP_AHEAD,
        })
        .collect();

    SlicePlan {
        bounds,
        camera,
        slices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriangleMesh;

    #[test]
    fn test_linspace_endpoints() {
        for count in 2..64 {
            let samples = linspace(-0.37, 2.91, count);
            assert_eq!(samples.len(), count);
            assert_eq!(samples[0], -0.37);
            assert_eq!(samples[count - 1], 2.91);
            assert!(samples.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_linspace_single() {
        assert_eq!(linspace(1.5, 4.0, 1), vec![1.5]);
        assert!(linspace(1.5, 4.0, 0).is_empty());
    }

    #[test]
    fn test_linspace_degenerate_range() {
        assert_eq!(linspace(2.0, 2.0, 3), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_compute_bounds_empty_mesh() {
        let mesh = TriangleMesh::new();
        assert!(matches!(
            compute_bounds(&mesh),
            Err(BakeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_compute_bounds_accepts_flat_mesh() {
        let mut mesh = TriangleMesh::new();
        mesh.points = vec![Vec3::new(-1.0, 0.0, 0.5), Vec3::new(1.0, 2.0, 0.5)];

        let bounds = compute_bounds(&mesh).unwrap();
        assert!(bounds.is_degenerate());
        assert_eq!(bounds.dimensions(), Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn test_plan_camera() {
        let bounds = MeshBounds::new(Vec3::new(-1.0, -3.0, 0.0), Vec3::new(2.0, 1.0, 2.0));
        let plan = plan_slices(bounds, 3);

        assert_eq!(plan.camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(plan.camera.ortho_scale, 4.0);
        assert_eq!(plan.num_slices(), 3);
    }

    #[test]
    fn test_plan_clip_planes() {
        let bounds = MeshBounds::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 2.0));
        let plan = plan_slices(bounds, 3);

        let depths: Vec<f32> = plan.slices.iter().map(|s| s.depth).collect();
        assert_eq!(depths, vec![0.0, 1.0, 2.0]);

        let last = plan.slices[2];
        assert_eq!(last.index, 2);
        assert!((last.clip_near - 2.99).abs() < 1e-6);
        assert!((last.clip_far - 3.1).abs() < 1e-6);
        assert!(last.clip().contains(3.0));
    }
}
