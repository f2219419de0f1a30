//! Wavefront OBJ import.
//!
//! Parsing and triangulation are done by `tobj`. All models in the file are
//! merged into one mesh. Triangles without normals get their face normal, and
//! `v` positions no face references are kept as loose points so they still
//! count toward the bounds.

use super::{TriangleMesh, Vertex};
use crate::error::{BakeError, Result};
use glam::Vec3;
use std::collections::HashSet;
use std::path::Path;

/// Load an OBJ file from disk. Material libraries are not read.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let content = std::fs::read_to_string(path)?;
    parse_obj(&content)
}

/// Parse OBJ text into a triangle mesh.
pub fn parse_obj(content: &str) -> Result<TriangleMesh> {
    let (models, _materials) = tobj::load_obj_buf(
        &mut content.as_bytes(),
        &tobj::GPU_LOAD_OPTIONS,
        |_| Err(tobj::LoadError::OpenFileFailed),
    )?;

    let mut mesh = TriangleMesh::new();
    for model in &models {
        append_model(&mut mesh, &model.mesh)?;
    }

    let used: HashSet<[u32; 3]> = mesh.vertices.iter().map(|v| bits(v.position)).collect();
    mesh.points = obj_positions(content)
        .filter(|p| !used.contains(&bits(*p)))
        .collect();

    Ok(mesh)
}

/// Append one `tobj` model. With single-index loading, normals and colors
/// share the position indices.
fn append_model(mesh: &mut TriangleMesh, model: &tobj::Mesh) -> Result<()> {
    let count = model.positions.len() / 3;
    let position = |i: usize| {
        Vec3::new(
            model.positions[3 * i],
            model.positions[3 * i + 1],
            model.positions[3 * i + 2],
        )
    };
    let color = |i: usize| match model.vertex_color.get(3 * i..3 * i + 3) {
        Some(c) => [c[0], c[1], c[2], 1.0],
        None => [1.0, 1.0, 1.0, 1.0],
    };

    if model.indices.iter().any(|&i| i as usize >= count) {
        return Err(BakeError::Obj(tobj::LoadError::FaceVertexOutOfBounds));
    }

    if model.normals.len() == model.positions.len() {
        let base = mesh.vertex_count() as u32;
        for i in 0..count {
            let n = &model.normals[3 * i..3 * i + 3];
            let normal = Vec3::new(n[0], n[1], n[2]);
            mesh.add_vertex(Vertex::new(position(i), normal).with_color(color(i)));
        }
        for tri in model.indices.chunks_exact(3) {
            mesh.add_triangle(base + tri[0], base + tri[1], base + tri[2]);
        }
    } else {
        // Flat shading: corners are not shared so each keeps its face normal.
        for tri in model.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
            let normal = (position(b) - position(a))
                .cross(position(c) - position(a))
                .normalize_or_zero();
            let first = mesh.vertex_count() as u32;
            for i in [a, b, c] {
                mesh.add_vertex(Vertex::new(position(i), normal).with_color(color(i)));
            }
            mesh.add_triangle(first, first + 1, first + 2);
        }
    }

    Ok(())
}

/// Every `v` position in file order.
fn obj_positions(content: &str) -> impl Iterator<Item = Vec3> + '_ {
    content.lines().filter_map(|line| {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("v") {
            return None;
        }
        let mut xyz = tokens.map(|t| t.parse::<f32>().ok());
        Some(Vec3::new(xyz.next()??, xyz.next()??, xyz.next()??))
    })
}

fn bits(p: Vec3) -> [u32; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::EvaluatedMesh;
    use crate::types::MeshBounds;

    const QUAD: &str = "\
# unit quad
o Quad
v 0 0 0 1 1 1
v 1 0 0 1 1 1
v 1 1 0 1 0 0
v 0 1 0 1 1 1
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

    #[test]
    fn test_parse_quad() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertices[2].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[0].normal, Vec3::Z);
        assert!(mesh.points.is_empty());
    }

    #[test]
    fn test_face_normal_fallback() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.vertices.iter().all(|v| v.normal == Vec3::Z));
        assert!(mesh.vertices.iter().all(|v| v.color == [1.0; 4]));
    }

    #[test]
    fn test_negative_and_textured_indices() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf -3/1 -2/1 -1/1\n").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices[2].position, Vec3::Y);
    }

    #[test]
    fn test_bounds_from_obj() {
        let mesh = parse_obj(QUAD).unwrap();
        let bounds = MeshBounds::from_points(mesh.world_vertices()).unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_loose_vertices_extend_bounds() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nv 5 5 5\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.points, vec![Vec3::splat(5.0)]);

        let bounds = MeshBounds::from_points(mesh.world_vertices()).unwrap();
        assert_eq!(bounds.max, Vec3::splat(5.0));
    }

    #[test]
    fn test_point_only_obj_is_valid() {
        let mesh = parse_obj("v 0 0 0\nv 1 2 3\n").unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.points.len(), 2);
        assert!(mesh.is_valid());

        let bounds = MeshBounds::from_points(mesh.world_vertices()).unwrap();
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_malformed_obj_is_rejected() {
        assert!(matches!(parse_obj("v 0 0 0\nf 1 2 3\n"), Err(BakeError::Obj(_))));
        assert!(matches!(parse_obj("v 0 zero 0\n"), Err(BakeError::Obj(_))));
    }

    #[test]
    fn test_load_obj_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        std::fs::write(&path, QUAD).unwrap();
        assert_eq!(load_obj(&path).unwrap().triangle_count(), 2);
    }
}
