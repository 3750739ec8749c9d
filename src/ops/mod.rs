// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology operators.
//!
//! Extrude, inset, bevel, bridge, vertex merge and triangulation mutate the
//! mesh they are given and report what they created, so a caller can select
//! the new faces and chain another operator. Subdivision, smoothing and shape
//! interpolation leave their input untouched and return a new [`Mesh`].
//!
//! Every operator takes an explicit options struct; all fields have defaults.

mod bevel;
mod bridge;
mod extrude;
mod inset;
mod merge;
mod morph;
mod smooth;
mod subdivide;

pub use bevel::{bevel_edges, bevel_faces, bevel_vertices, EdgeBevelOptions, FaceBevelOptions, VertexBevelOptions};
pub use bridge::{bridge_edges, bridge_loops, ordered_loop, BridgeOptions, EdgeLoop};
pub use extrude::{extrude_faces, ExtrudeOptions};
pub use inset::{inset_faces, InsetOptions};
pub use merge::{collapse_vertices, merge_vertices, MergeReport};
pub use morph::{interpolate_shapes, morph_positions};
pub use smooth::{smooth, SmoothingOptions};
pub use subdivide::{subdivide_faces, subdivide_surface, SubdivideOptions, SubdivisionResult, SubdivisionScheme};

pub use crate::geometry::triangulate_faces;

use crate::error::{MeshError, MeshResult};
use crate::geometry::{EdgeKey, FaceId, Mesh, VertexId};

/// Elements created by an in-place operator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditResult {
    /// Vertices appended to the mesh
    pub new_vertices: Vec<VertexId>,
    /// Faces appended to the mesh
    pub new_faces: Vec<FaceId>,
    /// Canonical keys of edges registered by the operation
    pub new_edges: Vec<EdgeKey>,
    /// Faces that continue the edited region (extrude caps, inset inner
    /// faces, bevel ribbons and fans). Some of them may be existing ids that
    /// were rewritten in place.
    pub top_faces: Vec<FaceId>,
}

/// Snapshot of element counts taken before an in-place edit
pub(crate) struct EditTracker {
    vertices: usize,
    faces: usize,
    edges: usize,
}

impl EditTracker {
    pub(crate) fn start(mesh: &Mesh) -> Self {
        Self {
            vertices: mesh.vertex_count(),
            faces: mesh.face_count(),
            edges: mesh.edge_count(),
        }
    }

    pub(crate) fn finish(self, mesh: &Mesh, top_faces: Vec<FaceId>) -> EditResult {
        EditResult {
            new_vertices: (self.vertices..mesh.vertex_count()).map(VertexId::new).collect(),
            new_faces: (self.faces..mesh.face_count()).map(FaceId::new).collect(),
            new_edges: mesh.edges()[self.edges..].iter().map(|e| e.key()).collect(),
            top_faces,
        }
    }
}

/// Validate a face selection: non-empty, in range, well formed. Duplicates
/// are dropped, order is kept.
pub(crate) fn select_faces(mesh: &Mesh, faces: &[FaceId]) -> MeshResult<Vec<FaceId>> {
    if faces.is_empty() {
        return Err(MeshError::invalid_selection("face selection is empty"));
    }
    let mut seen = vec![false; mesh.face_count()];
    let mut selected = Vec::with_capacity(faces.len());
    for &id in faces {
        let face = mesh.face(id).ok_or_else(|| {
            MeshError::invalid_selection(format!(
                "face {} is out of range (mesh has {} faces)",
                id,
                mesh.face_count()
            ))
        })?;
        if face.len() < 3 {
            return Err(MeshError::invalid_selection(format!(
                "face {id} has fewer than 3 vertices"
            )));
        }
        for &v in &face.vertices {
            mesh.check_vertex(v)?;
        }
        if !seen[id.index()] {
            seen[id.index()] = true;
            selected.push(id);
        }
    }
    Ok(selected)
}

/// Validate a vertex selection: non-empty and in range; duplicates dropped
pub(crate) fn select_vertices(mesh: &Mesh, vertices: &[VertexId]) -> MeshResult<Vec<VertexId>> {
    if vertices.is_empty() {
        return Err(MeshError::invalid_selection("vertex selection is empty"));
    }
    let mut seen = vec![false; mesh.vertex_count()];
    let mut selected = Vec::with_capacity(vertices.len());
    for &id in vertices {
        if id.index() >= mesh.vertex_count() {
            return Err(MeshError::invalid_selection(format!(
                "vertex {} is out of range (mesh has {} vertices)",
                id,
                mesh.vertex_count()
            )));
        }
        if !seen[id.index()] {
            seen[id.index()] = true;
            selected.push(id);
        }
    }
    Ok(selected)
}

/// Validate an edge selection: non-empty, every key a known edge
pub(crate) fn select_edges(mesh: &Mesh, edges: &[EdgeKey]) -> MeshResult<Vec<EdgeKey>> {
    if edges.is_empty() {
        return Err(MeshError::invalid_selection("edge selection is empty"));
    }
    let mut selected: Vec<EdgeKey> = Vec::with_capacity(edges.len());
    for &key in edges {
        if key.hi().index() >= mesh.vertex_count() || key.lo() == key.hi() {
            return Err(MeshError::invalid_selection(format!("edge {key} is invalid")));
        }
        if mesh.edge_by_key(key).is_none() {
            return Err(MeshError::invalid_selection(format!(
                "edge {key} does not exist in the mesh"
            )));
        }
        if !selected.contains(&key) {
            selected.push(key);
        }
    }
    Ok(selected)
}

pub(crate) fn require_finite(name: &'static str, value: f64) -> MeshResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MeshError::invalid_parameter(name, format!("must be finite, got {value}")))
    }
}

/// Open interval (0, 1)
pub(crate) fn require_unit_open(name: &'static str, value: f64) -> MeshResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(MeshError::invalid_parameter(name, format!("must be in (0, 1), got {value}")))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::geometry::Mesh;
    use nalgebra::Point3;

    /// Axis-aligned unit cube with outward-wound quads.
    /// Face 0 is the +Z face.
    pub fn unit_cube() -> Mesh {
        cube_at(Point3::origin(), 1.0)
    }

    pub fn cube_at(min: Point3<f64>, size: f64) -> Mesh {
        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (x0 + size, y0 + size, z0 + size);
        let positions = [
            Point3::new(x0, y0, z0),
            Point3::new(x1, y0, z0),
            Point3::new(x1, y1, z0),
            Point3::new(x0, y1, z0),
            Point3::new(x0, y0, z1),
            Point3::new(x1, y0, z1),
            Point3::new(x1, y1, z1),
            Point3::new(x0, y1, z1),
        ];
        let loops = vec![
            vec![4, 5, 6, 7], // +Z
            vec![0, 3, 2, 1], // -Z
            vec![1, 2, 6, 5], // +X
            vec![0, 4, 7, 3], // -X
            vec![3, 7, 6, 2], // +Y
            vec![0, 1, 5, 4], // -Y
        ];
        Mesh::from_polygons(&positions, &loops).expect("cube loops are valid")
    }

    pub fn unit_quad() -> Mesh {
        Mesh::from_polygons(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[vec![0, 1, 2, 3]],
        )
        .expect("quad loop is valid")
    }
}
