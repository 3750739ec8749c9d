// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face inset

use super::{require_finite, require_unit_open, select_faces, EditResult, EditTracker};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{Face, FaceId, Mesh, VertexId};
use crate::utils::math::lerp_point;
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsetOptions {
    /// Fraction of the way from each corner towards the face centroid,
    /// strictly between 0 and 1
    pub factor: f64,
}

impl Default for InsetOptions {
    fn default() -> Self {
        Self { factor: 0.25 }
    }
}

/// Inset each selected face: an inner copy of the loop replaces the face and
/// a ring of quads joins it to the original boundary.
pub fn inset_faces(mesh: &mut Mesh, faces: &[FaceId], options: &InsetOptions) -> MeshResult<EditResult> {
    require_unit_open("factor", options.factor)?;
    let result = inset_ring(mesh, faces, options.factor, 0.0)?;
    debug!(
        "Inset {} faces by {}: +{} vertices, +{} faces",
        result.top_faces.len(),
        options.factor,
        result.new_vertices.len(),
        result.new_faces.len()
    );
    Ok(result)
}

/// Shared core of inset and face bevel: new corners at
/// `lerp(v_i, centroid, factor) + normal * depth`.
pub(crate) fn inset_ring(
    mesh: &mut Mesh,
    faces: &[FaceId],
    factor: f64,
    depth: f64,
) -> MeshResult<EditResult> {
    require_finite("depth", depth)?;
    let selected = select_faces(mesh, faces)?;

    let mut plans: Vec<(FaceId, Face, Point3<f64>, Vector3<f64>)> = Vec::with_capacity(selected.len());
    for id in selected {
        let source = mesh.faces()[id.index()].clone();
        let centroid = mesh.loop_centroid(&source.vertices);
        let offset = if depth == 0.0 {
            Vector3::zeros()
        } else {
            let normal = mesh.loop_normal(&source.vertices).ok_or_else(|| {
                MeshError::degenerate(format!("face {id} has no normal to offset along"))
            })?;
            normal * depth
        };
        plans.push((id, source, centroid, offset));
    }

    let tracker = EditTracker::start(mesh);
    let mut inner_faces = Vec::with_capacity(plans.len());
    for (id, source, centroid, offset) in plans {
        let inner: Vec<VertexId> = source
            .vertices
            .iter()
            .map(|&v| {
                let vertex = &mesh.vertices()[v.index()];
                let position = lerp_point(&vertex.position, &centroid, factor) + offset;
                let copy = vertex.moved_to(position);
                mesh.add_vertex(copy)
            })
            .collect();

        let n = inner.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let side = source.with_loop(vec![source.vertices[i], source.vertices[j], inner[j], inner[i]]);
            mesh.add_face_with(side)?;
        }

        let mut core = source.with_loop(inner);
        core.normal = source.normal;
        core.uvs = source.uvs.as_ref().map(|uvs| shrink_uvs(uvs, factor));
        mesh.replace_face(id, core)?;
        inner_faces.push(id);
    }

    Ok(tracker.finish(mesh, inner_faces))
}

/// Pull per-corner UVs towards their centroid the same way the corners move
fn shrink_uvs(uvs: &[Vector2<f64>], factor: f64) -> Vec<Vector2<f64>> {
    if uvs.is_empty() {
        return Vec::new();
    }
    let centre = uvs.iter().fold(Vector2::zeros(), |acc, uv| acc + uv) / uvs.len() as f64;
    uvs.iter().map(|uv| uv.lerp(&centre, factor)).collect()
}
