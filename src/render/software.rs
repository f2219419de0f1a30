//! CPU reference renderer.
//!
//! Rasterizes a triangle mesh through an orthographic camera, keeping only
//! fragments whose view distance lies inside the configured clip slab.
//! Faces seen exactly edge-on cover no pixels, as with any rasterizer.

use super::{CameraId, RenderError, RenderOutput, RenderSettings, Renderer};
use crate::atlas::SliceImage;
use crate::mesh::{TriangleMesh, WorldVertex};
use crate::types::OrthoCamera;
use glam::{Vec2, Vec3};
use std::collections::HashMap;

/// Background color used when the film is not transparent.
const WORLD_COLOR: [f32; 4] = [0.05, 0.05, 0.05, 1.0];

/// Renders one mesh with a single directional light.
pub struct SoftwareRenderer {
    mesh: TriangleMesh,
    cameras: HashMap<CameraId, OrthoCamera>,
    next_id: u64,
    active: Option<(CameraId, RenderSettings)>,
    light_direction: Vec3,
    ambient: f32,
    film_transparent: bool,
}

/// Output buffers for one render.
struct Framebuffer {
    width: usize,
    depth: Vec<f32>,
    combined: Vec<f32>,
    diffuse: Option<Vec<f32>>,
    normal: Option<Vec<f32>>,
    alpha: Vec<f32>,
}

impl SoftwareRenderer {
    pub fn new(mesh: TriangleMesh) -> Self {
        Self {
            mesh,
            cameras: HashMap::new(),
            next_id: 0,
            active: None,
            light_direction: Vec3::new(0.3, 0.4, 1.0).normalize(),
            ambient: 0.2,
            film_transparent: true,
        }
    }

    /// Render the background as transparent (alpha 0) or as the world color.
    pub fn with_film_transparent(mut self, transparent: bool) -> Self {
        self.film_transparent = transparent;
        self
    }

    /// Number of cameras currently alive.
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    fn rasterize(
        &self,
        tri: &[WorldVertex; 3],
        camera: &OrthoCamera,
        settings: &RenderSettings,
        pixel_size: f32,
        fb: &mut Framebuffer,
    ) {
        let half = Vec2::new(settings.width as f32, settings.height as f32) * 0.5;
        let to_screen = |p: Vec3| {
            Vec2::new(p.x - camera.position.x, p.y - camera.position.y) / pixel_size + half
        };
        let s = [
            to_screen(tri[0].position),
            to_screen(tri[1].position),
            to_screen(tri[2].position),
        ];
        let area = edge(s[0], s[1], s[2]);
        if area.abs() < f32::EPSILON {
            return;
        }

        let dist = tri.map(|v| camera.view_distance(v.position));
        let lo = s[0].min(s[1]).min(s[2]).floor().max(Vec2::ZERO);
        let hi = s[0]
            .max(s[1])
            .max(s[2])
            .ceil()
            .min(Vec2::new(settings.width as f32, settings.height as f32));
        if lo.x >= hi.x || lo.y >= hi.y {
            return;
        }

        for py in lo.y as usize..hi.y as usize {
            for px in lo.x as usize..hi.x as usize {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let w = [
                    edge(s[1], s[2], p) / area,
                    edge(s[2], s[0], p) / area,
                    edge(s[0], s[1], p) / area,
                ];
                if w.iter().any(|&b| b < 0.0) {
                    continue;
                }

                let idx = py * fb.width + px;
                let distance = w[0] * dist[0] + w[1] * dist[1] + w[2] * dist[2];
                if !settings.clip.contains(distance) || distance >= fb.depth[idx] {
                    continue;
                }
                fb.depth[idx] = distance;

                let normal = (tri[0].normal * w[0] + tri[1].normal * w[1] + tri[2].normal * w[2])
                    .normalize_or_zero();
                let mut color = [0.0f32; 4];
                for (c, value) in color.iter_mut().enumerate() {
                    *value = tri[0].color[c] * w[0] + tri[1].color[c] * w[1] + tri[2].color[c] * w[2];
                }

                // Two-sided lighting: cut-open interiors face away from the camera.
                let shade = self.ambient + (1.0 - self.ambient) * normal.dot(self.light_direction).abs();
                let texel = idx * 4..idx * 4 + 4;
                fb.combined[texel.clone()]
                    .copy_from_slice(&[color[0] * shade, color[1] * shade, color[2] * shade, 1.0]);
                fb.alpha[idx] = 1.0;
                if let Some(diffuse) = fb.diffuse.as_mut() {
                    diffuse[texel.clone()].copy_from_slice(&[color[0], color[1], color[2], 1.0]);
                }
                if let Some(normals) = fb.normal.as_mut() {
                    normals[texel].copy_from_slice(&[normal.x, normal.y, normal.z, 1.0]);
                }
            }
        }
    }
}

/// Twice the signed area of triangle (a, b, p).
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl Renderer for SoftwareRenderer {
    fn add_camera(&mut self, camera: &OrthoCamera) -> Result<CameraId, RenderError> {
        self.next_id += 1;
        let id = CameraId(self.next_id);
        self.cameras.insert(id, *camera);
        Ok(id)
    }

    fn remove_camera(&mut self, id: CameraId) {
        self.cameras.remove(&id);
        if matches!(self.active, Some((active, _)) if active == id) {
            self.active = None;
        }
    }

    fn configure(&mut self, camera: CameraId, settings: &RenderSettings) -> Result<(), RenderError> {
        if !self.cameras.contains_key(&camera) {
            return Err(RenderError::new(format!("unknown camera {:?}", camera)));
        }
        self.active = Some((camera, *settings));
        Ok(())
    }

    fn render(&mut self) -> Result<RenderOutput, RenderError> {
        let (id, settings) = self
            .active
            .ok_or_else(|| RenderError::new("no active camera"))?;
        let camera = *self
            .cameras
            .get(&id)
            .ok_or_else(|| RenderError::new(format!("camera {:?} was removed", id)))?;

        let width = settings.width as usize;
        let height = settings.height as usize;
        let texels = width * height;
        let background = if self.film_transparent {
            [0.0; 4]
        } else {
            WORLD_COLOR
        };

        let mut fb = Framebuffer {
            width,
            depth: vec![f32::INFINITY; texels],
            combined: background.iter().copied().cycle().take(texels * 4).collect(),
            diffuse: settings.passes.diffuse_color.then(|| vec![0.0; texels * 4]),
            normal: settings.passes.normal.then(|| vec![0.0; texels * 4]),
            alpha: vec![if self.film_transparent { 0.0 } else { 1.0 }; texels],
        };

        if camera.ortho_scale > 0.0 && texels > 0 {
            let pixel_size = camera.ortho_scale / width.max(height) as f32;
            for tri in self.mesh.world_triangles() {
                self.rasterize(&tri, &camera, &settings, pixel_size, &mut fb);
            }
        }

        let image = |pixels: Vec<f32>| SliceImage::from_pixels(settings.width, settings.height, pixels);
        Ok(RenderOutput {
            combined: image(fb.combined),
            diffuse_color: fb.diffuse.map(image),
            normal: fb.normal.map(image),
            alpha: Some(fb.alpha),
            composited: None,
        })
    }
}
