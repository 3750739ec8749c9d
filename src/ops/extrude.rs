// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face extrusion

use super::{require_finite, select_faces, EditResult, EditTracker};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{Face, FaceId, Mesh, VertexId};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrudeOptions {
    /// Offset along the face normal; negative values push inwards
    pub distance: f64,
    /// Scale of the cap about its own centroid
    pub scale: f64,
    /// Keep the source face as a bottom lid (wound inwards) and append
    /// the cap as a new face
    pub keep_original: bool,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            distance: 1.0,
            scale: 1.0,
            keep_original: false,
        }
    }
}

struct Plan {
    face: FaceId,
    source: Face,
    normal: Vector3<f64>,
    centroid: Point3<f64>,
}

/// Extrude each selected face along its own normal.
///
/// Every face gets a ring of side quads `(v_i, v_{i+1}, w_{i+1}, w_i)` and a
/// cap over the new vertices `w_i`. The cap keeps the source winding, so its
/// normal equals the source normal. Without `keep_original` the cap takes
/// over the source face's id.
pub fn extrude_faces(
    mesh: &mut Mesh,
    faces: &[FaceId],
    options: &ExtrudeOptions,
) -> MeshResult<EditResult> {
    require_finite("distance", options.distance)?;
    if !(options.scale.is_finite() && options.scale > 0.0) {
        return Err(MeshError::invalid_parameter(
            "scale",
            format!("must be positive, got {}", options.scale),
        ));
    }
    let selected = select_faces(mesh, faces)?;

    // Plan everything before touching the mesh so a bad face leaves it intact
    let mut plans = Vec::with_capacity(selected.len());
    for id in selected {
        let source = mesh.faces()[id.index()].clone();
        let normal = mesh.loop_normal(&source.vertices).ok_or_else(|| {
            MeshError::degenerate(format!("face {id} has no area to extrude along"))
        })?;
        let centroid = mesh.loop_centroid(&source.vertices);
        plans.push(Plan {
            face: id,
            source,
            normal,
            centroid,
        });
    }

    let tracker = EditTracker::start(mesh);
    let mut caps = Vec::with_capacity(plans.len());
    for plan in plans {
        caps.push(extrude_one(mesh, plan, options)?);
    }

    let result = tracker.finish(mesh, caps);
    debug!(
        "Extruded {} faces: +{} vertices, +{} faces",
        result.top_faces.len(),
        result.new_vertices.len(),
        result.new_faces.len()
    );
    Ok(result)
}

fn extrude_one(mesh: &mut Mesh, plan: Plan, options: &ExtrudeOptions) -> MeshResult<FaceId> {
    let Plan {
        face,
        source,
        normal,
        centroid,
    } = plan;
    let offset = normal * options.distance;
    let cap_centre = centroid + offset;

    let ring: Vec<VertexId> = source
        .vertices
        .iter()
        .map(|&v| {
            let vertex = &mesh.vertices()[v.index()];
            let moved = vertex.position + offset;
            let scaled = cap_centre + (moved - cap_centre) * options.scale;
            let copy = vertex.moved_to(scaled);
            mesh.add_vertex(copy)
        })
        .collect();

    let n = ring.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let side = source.with_loop(vec![source.vertices[i], source.vertices[j], ring[j], ring[i]]);
        mesh.add_face_with(side)?;
    }

    let mut cap = source.with_loop(ring);
    cap.uvs = source.uvs.clone();
    cap.normal = source.normal;

    if options.keep_original {
        mesh.replace_face(face, source.flipped())?;
        mesh.add_face_with(cap)
    } else {
        mesh.replace_face(face, cap)?;
        Ok(face)
    }
}
