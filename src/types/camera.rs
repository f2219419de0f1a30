//! Orthographic slice camera.

use glam::Vec3;

/// Near/far clip distances measured from the camera along its view direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    pub near: f32,
    pub far: f32,
}

impl ClipRange {
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Check whether a view distance falls inside the slab.
    pub fn contains(&self, distance: f32) -> bool {
        distance >= self.near && distance <= self.far
    }
}

/// An orthographic camera with a fixed orientation looking down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    /// World-space camera position.
    pub position: Vec3,
    /// World-space width covered by the larger viewport axis.
    pub ortho_scale: f32,
}

impl OrthoCamera {
    pub fn new(position: Vec3, ortho_scale: f32) -> Self {
        Self {
            position,
            ortho_scale,
        }
    }

    /// The camera is never rotated.
    pub fn view_direction(&self) -> Vec3 {
        Vec3::NEG_Z
    }

    /// Distance from the camera plane to a world-space point along the view direction.
    pub fn view_distance(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.view_direction())
    }
}
