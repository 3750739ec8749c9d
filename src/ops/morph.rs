// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shape interpolation between meshes that share a vertex layout

use super::require_finite;
use crate::error::{MeshError, MeshResult};
use crate::geometry::Mesh;
use crate::utils::math::lerp_point;
use nalgebra::Point3;

/// Blend two meshes with the same vertex count: `from` at `t = 0`, `to`
/// at `t = 1`. Topology and face attributes come from `from`.
pub fn interpolate_shapes(from: &Mesh, to: &Mesh, t: f64) -> MeshResult<Mesh> {
    require_finite("t", t)?;
    if from.vertex_count() != to.vertex_count() {
        return Err(MeshError::VertexCountMismatch {
            expected: from.vertex_count(),
            actual: to.vertex_count(),
        });
    }
    let mut result = from.clone();
    for (vertex, target) in result.vertices_mut().iter_mut().zip(to.vertices()) {
        *vertex = vertex.lerp(target, t);
    }
    Ok(result)
}

/// Move every vertex `weight` of the way towards its target position
pub fn morph_positions(mesh: &mut Mesh, targets: &[Point3<f64>], weight: f64) -> MeshResult<()> {
    require_finite("weight", weight)?;
    if targets.len() != mesh.vertex_count() {
        return Err(MeshError::VertexCountMismatch {
            expected: mesh.vertex_count(),
            actual: targets.len(),
        });
    }
    for (vertex, target) in mesh.vertices_mut().iter_mut().zip(targets) {
        vertex.position = lerp_point(&vertex.position, target, weight);
    }
    Ok(())
}
