// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge, vertex and face bevels

use super::inset::inset_ring;
use super::{require_finite, require_unit_open, select_edges, select_vertices, EditResult, EditTracker};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{EdgeKey, FaceId, Mesh, VertexId};
use crate::utils::math::{any_perpendicular, try_normalize};
use ahash::AHashMap;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeBevelOptions {
    /// Ribbon width across the edge
    pub width: f64,
    /// Number of strips in the ribbon
    pub segments: usize,
}

impl Default for EdgeBevelOptions {
    fn default() -> Self {
        Self {
            width: 0.1,
            segments: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexBevelOptions {
    /// Fraction of each incident edge cut away, strictly between 0 and 1
    pub ratio: f64,
}

impl Default for VertexBevelOptions {
    fn default() -> Self {
        Self { ratio: 0.25 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceBevelOptions {
    /// Inset fraction towards the centroid, strictly between 0 and 1
    pub inset: f64,
    /// Offset of the inner face along the face normal
    pub depth: f64,
}

impl Default for FaceBevelOptions {
    fn default() -> Self {
        Self {
            inset: 0.2,
            depth: 0.1,
        }
    }
}

/// Bevel each selected edge into a ribbon of `segments` quads.
///
/// The ribbon runs between two copies of the edge pushed `width / 2` to
/// either side and `width / 2` below it, bulging back up to the edge at its
/// middle. On a right-angle edge the two outer rows land on the adjacent
/// faces, where a chamfer would cut them.
///
/// Limitation: the ribbon is not stitched in. Adjacent faces are left as
/// they are, so the ribbon's borders stay open edges and a single-segment
/// ribbon lies below the surface it cuts across.
pub fn bevel_edges(mesh: &mut Mesh, edges: &[EdgeKey], options: &EdgeBevelOptions) -> MeshResult<EditResult> {
    require_finite("width", options.width)?;
    if options.width <= 0.0 {
        return Err(MeshError::invalid_parameter(
            "width",
            format!("must be positive, got {}", options.width),
        ));
    }
    if options.segments == 0 {
        return Err(MeshError::invalid_parameter("segments", "must be at least 1"));
    }
    let selected = select_edges(mesh, edges)?;

    let incident = mesh.edge_faces();
    let mut frames = Vec::with_capacity(selected.len());
    for key in &selected {
        let (a, b) = (key.lo(), key.hi());
        let dir = try_normalize(&(mesh.position(b) - mesh.position(a)))
            .ok_or_else(|| MeshError::degenerate(format!("edge {key} has zero length")))?;
        let faces = incident.get(key).map(Vec::as_slice).unwrap_or(&[]);
        let normal = averaged_normal(mesh, faces, &dir);
        let side = try_normalize(&dir.cross(&normal)).unwrap_or_else(|| any_perpendicular(&dir));
        let material = faces
            .first()
            .map(|f| mesh.faces()[f.index()].material_index)
            .unwrap_or(0);
        frames.push((*key, normal, side, material));
    }

    let tracker = EditTracker::start(mesh);
    let half = options.width * 0.5;
    let segments = options.segments;
    let mut ribbons = Vec::new();
    for (key, normal, side, material) in frames {
        let (a, b) = (key.lo(), key.hi());
        let va = mesh.vertices()[a.index()].clone();
        let vb = mesh.vertices()[b.index()].clone();

        let mut rows: Vec<(VertexId, VertexId)> = Vec::with_capacity(segments + 1);
        for k in 0..=segments {
            let t = k as f64 / segments as f64;
            let offset = side * (half - options.width * t) - normal * half + normal * half * (PI * t).sin();
            let ra = mesh.add_vertex(va.moved_to(va.position + offset));
            let rb = mesh.add_vertex(vb.moved_to(vb.position + offset));
            rows.push((ra, rb));
        }
        for pair in rows.windows(2) {
            let ((la, lb), (ra, rb)) = (pair[0], pair[1]);
            ribbons.push(mesh.add_face(&[la, lb, rb, ra], material)?);
        }
    }

    let result = tracker.finish(mesh, ribbons);
    debug!(
        "Bevelled {} edges into {} ribbon faces",
        selected.len(),
        result.new_faces.len()
    );
    Ok(result)
}

fn averaged_normal(mesh: &Mesh, faces: &[FaceId], dir: &Vector3<f64>) -> Vector3<f64> {
    let sum = faces
        .iter()
        .filter_map(|&f| mesh.face_normal(f))
        .fold(Vector3::zeros(), |acc, n| acc + n);
    try_normalize(&sum).unwrap_or_else(|| any_perpendicular(dir))
}

/// Cut each selected vertex off its incident faces.
///
/// A ring vertex is placed on every incident edge at `ratio` of its length;
/// each face swaps the vertex for the two ring vertices it touches, and a fan
/// of triangles from the vertex (moved to the ring centroid) closes the hole.
pub fn bevel_vertices(
    mesh: &mut Mesh,
    vertices: &[VertexId],
    options: &VertexBevelOptions,
) -> MeshResult<EditResult> {
    require_unit_open("ratio", options.ratio)?;
    let selected = select_vertices(mesh, vertices)?;
    for &v in &selected {
        if mesh.faces_around_vertex(v).is_empty() {
            return Err(MeshError::invalid_selection(format!(
                "vertex {v} has no incident faces to bevel"
            )));
        }
    }

    let tracker = EditTracker::start(mesh);
    let mut fans = Vec::new();
    let mut cut_edges = Vec::new();
    for v in selected {
        fans.extend(bevel_one_vertex(mesh, v, options.ratio, &mut cut_edges)?);
    }

    let result = tracker.finish(mesh, fans);
    // Edges from a bevelled vertex to its old neighbours no longer bound any face
    let still_used = mesh.edge_faces();
    cut_edges.retain(|key| !still_used.contains_key(key));
    let pruned = mesh.remove_edges(&cut_edges);
    debug!(
        "Bevelled vertices: +{} vertices, +{} fan faces, -{} edges",
        result.new_vertices.len(),
        result.new_faces.len(),
        pruned
    );
    Ok(result)
}

fn bevel_one_vertex(
    mesh: &mut Mesh,
    v: VertexId,
    ratio: f64,
    cut_edges: &mut Vec<EdgeKey>,
) -> MeshResult<Vec<FaceId>> {
    let origin = mesh.vertices()[v.index()].clone();
    let mut ring: AHashMap<VertexId, VertexId> = AHashMap::new();
    let mut ring_order: Vec<VertexId> = Vec::new();
    let mut fan_plans = Vec::new();

    for face_id in mesh.faces_around_vertex(v) {
        let face = mesh.faces()[face_id.index()].clone();
        let n = face.len();
        let Some(corner) = face.vertices.iter().position(|&x| x == v) else {
            continue;
        };
        let prev = face.vertices[(corner + n - 1) % n];
        let next = face.vertices[(corner + 1) % n];
        if prev == v || next == v {
            continue;
        }

        let mut ring_vertex = |neighbour: VertexId, mesh: &mut Mesh| -> VertexId {
            *ring.entry(neighbour).or_insert_with(|| {
                let target = mesh.vertices()[neighbour.index()].clone();
                let id = mesh.add_vertex(origin.lerp(&target, ratio));
                ring_order.push(id);
                id
            })
        };
        let r_prev = ring_vertex(prev, mesh);
        let r_next = ring_vertex(next, mesh);

        let mut new_loop = Vec::with_capacity(n + 1);
        new_loop.extend_from_slice(&face.vertices[..corner]);
        new_loop.push(r_prev);
        new_loop.push(r_next);
        new_loop.extend_from_slice(&face.vertices[corner + 1..]);
        mesh.replace_face_loop(face_id, new_loop)?;

        fan_plans.push(([v, r_next, r_prev], face.material_index));
    }

    if ring_order.is_empty() {
        return Err(MeshError::degenerate(format!("vertex {v} has no usable corners")));
    }
    cut_edges.extend(ring.keys().map(|&neighbour| EdgeKey::new(v, neighbour)));
    let ring_positions = mesh.positions_of(&ring_order);
    let centre = crate::geometry::centroid(&ring_positions);
    if let Some(vertex) = mesh.vertex_mut(v) {
        vertex.position = centre;
    }

    let mut fans = Vec::with_capacity(fan_plans.len());
    for (tri, material) in fan_plans {
        fans.push(mesh.add_face(&tri, material)?);
    }
    Ok(fans)
}

/// Bevel faces: inset towards the centroid and lift along the normal
pub fn bevel_faces(mesh: &mut Mesh, faces: &[FaceId], options: &FaceBevelOptions) -> MeshResult<EditResult> {
    require_unit_open("inset", options.inset)?;
    let result = inset_ring(mesh, faces, options.inset, options.depth)?;
    debug!(
        "Bevelled {} faces (inset {}, depth {})",
        result.top_faces.len(),
        options.inset,
        options.depth
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::{unit_cube, unit_quad};
    use crate::geometry::Vertex;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_bevel_edge_ribbon() {
        let mut mesh = unit_cube();
        // Edge between the +Z and +X faces
        let key = EdgeKey::new(VertexId::new(5), VertexId::new(6));
        let options = EdgeBevelOptions {
            width: 0.2,
            segments: 2,
        };
        let result = bevel_edges(&mut mesh, &[key], &options).unwrap();

        assert_eq!(result.new_vertices.len(), 6);
        assert_eq!(result.new_faces.len(), 2);
        assert_eq!(result.top_faces, result.new_faces);
        assert_eq!(mesh.face_count(), 8);

        // The middle row sits on the original edge
        let middle = mesh.vertices()[result.new_vertices[2].index()].position;
        assert_relative_eq!(middle, Point3::new(1.0, 0.0, 1.0), epsilon = 1e-12);

        // Ribbon faces look away from the solid
        let outward = Vector3::new(1.0, 0.0, 1.0).normalize();
        for &face in &result.new_faces {
            assert!(mesh.face_normal(face).unwrap().dot(&outward) > 0.0);
        }
    }

    #[test]
    fn test_bevel_edge_single_segment_is_detached_chamfer() {
        let mut mesh = unit_cube();
        let loops_before: Vec<_> = mesh.faces().iter().map(|f| f.vertices.clone()).collect();
        let key = EdgeKey::new(VertexId::new(5), VertexId::new(6));
        let options = EdgeBevelOptions {
            width: 0.2,
            segments: 1,
        };
        let result = bevel_edges(&mut mesh, &[key], &options).unwrap();

        assert_eq!(result.new_vertices.len(), 4);
        assert_eq!(result.new_faces.len(), 1);
        for (i, loop_before) in loops_before.iter().enumerate() {
            assert_eq!(&mesh.faces()[i].vertices, loop_before);
        }

        // Outer rows sit on the +X and +Z faces respectively
        let position = |i: usize| mesh.vertices()[result.new_vertices[i].index()].position;
        let inset = 0.1 * std::f64::consts::SQRT_2;
        assert_relative_eq!(position(0), Point3::new(1.0, 0.0, 1.0 - inset), epsilon = 1e-12);
        assert_relative_eq!(position(2), Point3::new(1.0 - inset, 0.0, 1.0), epsilon = 1e-12);

        // Nothing joins the ribbon to the cube
        let incident = mesh.edge_faces();
        let ribbon = &mesh.faces()[result.new_faces[0].index()];
        for i in 0..ribbon.len() {
            let edge = EdgeKey::new(ribbon.vertices[i], ribbon.vertices[(i + 1) % ribbon.len()]);
            assert_eq!(incident[&edge].len(), 1);
        }
    }

    #[test]
    fn test_bevel_edge_rejects_unknown_edge() {
        let mut mesh = unit_cube();
        let diagonal = EdgeKey::new(VertexId::new(0), VertexId::new(6));
        assert!(matches!(
            bevel_edges(&mut mesh, &[diagonal], &EdgeBevelOptions::default()),
            Err(MeshError::InvalidSelection { .. })
        ));
        let key = EdgeKey::new(VertexId::new(0), VertexId::new(1));
        let zero = EdgeBevelOptions {
            segments: 0,
            ..Default::default()
        };
        assert!(bevel_edges(&mut mesh, &[key], &zero).is_err());
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn test_bevel_cube_corner() {
        let mut mesh = unit_cube();
        let corner = VertexId::new(6);
        let result = bevel_vertices(&mut mesh, &[corner], &VertexBevelOptions { ratio: 0.5 }).unwrap();

        assert_eq!(result.new_vertices.len(), 3);
        assert_eq!(result.new_faces.len(), 3);
        assert_eq!(mesh.vertex_count(), 11);
        assert_eq!(mesh.face_count(), 9);

        // The three touching quads became pentagons
        for face in mesh.faces_around_vertex(corner) {
            if !result.new_faces.contains(&face) {
                panic!("face {face} still uses the bevelled corner");
            }
        }
        let pentagons = mesh.faces().iter().filter(|f| f.len() == 5).count();
        assert_eq!(pentagons, 3);
        // 12 cube edges minus 3 cut away, plus 3 stubs, 3 rim edges and 3 spokes
        assert_eq!(mesh.edge_count(), 18);
        assert!(mesh.edge_by_key(EdgeKey::new(corner, VertexId::new(5))).is_none());

        // The corner is now the centre of the cut
        let p = mesh.vertices()[corner.index()].position;
        let expected = (0.5 + 1.0 + 1.0) / 3.0;
        assert_relative_eq!(p, Point3::new(expected, expected, expected), epsilon = 1e-12);

        // Fan triangles face away from the cube
        let centre = Point3::new(0.5, 0.5, 0.5);
        for &face in &result.new_faces {
            let n = mesh.face_normal(face).unwrap();
            assert!(n.dot(&(mesh.face_centroid(face).unwrap() - centre)) > 0.0);
        }
    }

    #[test]
    fn test_bevel_vertex_needs_faces() {
        let mut mesh = unit_quad();
        let loose = mesh.add_vertex(Vertex::from_coords(3.0, 3.0, 3.0));
        assert!(matches!(
            bevel_vertices(&mut mesh, &[loose], &VertexBevelOptions::default()),
            Err(MeshError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_bevel_face_lifts_inner_face() {
        let mut mesh = unit_quad();
        let options = FaceBevelOptions {
            inset: 0.5,
            depth: 0.25,
        };
        let result = bevel_faces(&mut mesh, &[FaceId::new(0)], &options).unwrap();
        assert_eq!(result.new_faces.len(), 4);
        assert_relative_eq!(
            mesh.face_centroid(FaceId::new(0)).unwrap(),
            Point3::new(0.5, 0.5, 0.25),
            epsilon = 1e-12
        );
        assert_relative_eq!(mesh.face_area(FaceId::new(0)).unwrap(), 0.25, epsilon = 1e-12);
    }
}
