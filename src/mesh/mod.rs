//! Evaluated mesh input.
//!
//! The baker only needs world-space vertex positions to plan slices; the
//! reference renderer additionally walks the triangles. Scene objects wrap a
//! mesh with the metadata used to validate a selection.

pub mod obj;

use crate::error::{BakeError, Result};
use glam::{Affine3A, Mat3A, Vec3, Vec3A};

/// A vertex in object space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in object space.
    pub position: Vec3,
    /// Normal vector in object space.
    pub normal: Vec3,
    /// Vertex color (RGBA), used as the diffuse color.
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            color: [1.0, 1.0, 1.0, 1.0], // White by default
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// A vertex after the object's world transform has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: [f32; 4],
}

/// An indexed triangle mesh with an object-to-world transform.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Triangle indices (3 per triangle).
    pub indices: Vec<u32>,
    /// Loose positions that belong to no triangle. They count toward the
    /// bounds but are never rendered.
    pub points: Vec<Vec3>,
    /// Object-to-world transform.
    pub transform: Affine3A,
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            points: Vec::new(),
            transform: Affine3A::IDENTITY,
        }
    }
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the object-to-world transform.
    pub fn with_transform(mut self, transform: Affine3A) -> Self {
        self.transform = transform;
        self
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle by vertex indices.
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.extend_from_slice(&[i0, i1, i2]);
    }

    /// An axis-aligned box with 8 shared corners and 12 triangles.
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let mut mesh = Self::new();
        let center = (min + max) * 0.5;

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            );
            let normal = (corner - center).normalize_or_zero();
            mesh.add_vertex(Vertex::new(corner, normal));
        }

        // Two triangles per face, wound CCW seen from outside.
        const FACES: [[u32; 4]; 6] = [
            [0, 2, 3, 1], // -Z
            [4, 5, 7, 6], // +Z
            [0, 1, 5, 4], // -Y
            [2, 6, 7, 3], // +Y
            [0, 4, 6, 2], // -X
            [1, 3, 7, 5], // +X
        ];
        for [a, b, c, d] in FACES {
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(a, c, d);
        }

        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when there are neither vertices nor loose points.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.points.is_empty()
    }

    /// Transform a single vertex into world space.
    pub fn world_vertex(&self, vertex: &Vertex) -> WorldVertex {
        self.to_world(vertex, self.normal_matrix())
    }

    /// Iterate over triangles in world space. Out-of-range indices are skipped.
    pub fn world_triangles(&self) -> impl Iterator<Item = [WorldVertex; 3]> + '_ {
        let normal_matrix = self.normal_matrix();

        self.indices.chunks_exact(3).filter_map(move |tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([
                self.to_world(a, normal_matrix),
                self.to_world(b, normal_matrix),
                self.to_world(c, normal_matrix),
            ])
        })
    }

    fn normal_matrix(&self) -> Mat3A {
        self.transform.matrix3.inverse().transpose()
    }

    fn to_world(&self, vertex: &Vertex, normal_matrix: Mat3A) -> WorldVertex {
        WorldVertex {
            position: self.transform.transform_point3(vertex.position),
            normal: (normal_matrix * Vec3A::from(vertex.normal))
                .normalize_or_zero()
                .into(),
            color: vertex.color,
        }
    }
}

/// An evaluated mesh as provided by the scene.
pub trait EvaluatedMesh {
    /// World-space vertex positions, in vertex order.
    fn world_vertices(&self) -> Box<dyn Iterator<Item = Vec3> + '_>;

    /// A mesh is usable when it has at least one vertex.
    fn is_valid(&self) -> bool {
        self.world_vertices().next().is_some()
    }
}

impl EvaluatedMesh for TriangleMesh {
    fn world_vertices(&self) -> Box<dyn Iterator<Item = Vec3> + '_> {
        Box::new(
            self.vertices
                .iter()
                .map(|v| v.position)
                .chain(self.points.iter().copied())
                .map(|p| self.transform.transform_point3(p)),
        )
    }

    fn is_valid(&self) -> bool {
        !self.is_empty()
    }
}

/// Kind of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    Camera,
    Light,
    Empty,
}

/// A selectable scene object.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    /// The evaluated mesh, present for mesh objects that evaluated successfully.
    pub mesh: Option<TriangleMesh>,
}

impl SceneObject {
    pub fn mesh(name: impl Into<String>, mesh: TriangleMesh) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Mesh,
            mesh: Some(mesh),
        }
    }

    pub fn other(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mesh: None,
        }
    }
}

/// Pick the mesh to bake from a selection.
///
/// The selection must contain exactly one mesh-type object, and its evaluated
/// mesh must have vertices.
pub fn select_mesh(selected: &[SceneObject]) -> Result<&TriangleMesh> {
    if selected.is_empty() {
        return Err(BakeError::InvalidInput("No valid object selected".to_string()));
    }

    let mut meshes = selected.iter().filter(|o| o.kind == ObjectKind::Mesh);
    let object = match (meshes.next(), meshes.next()) {
        (Some(object), None) => object,
        (None, _) => {
            return Err(BakeError::InvalidInput(
                "Selection contains no mesh object".to_string(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(BakeError::InvalidInput(
                "Selection contains more than one mesh object".to_string(),
            ))
        }
    };

    match &object.mesh {
        Some(mesh) if mesh.is_valid() => Ok(mesh),
        _ => Err(BakeError::InvalidInput(format!(
            "Selected object '{}' is not a realized mesh",
            object.name
        ))),
    }
}
