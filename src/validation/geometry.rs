// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Position-level checks: non-finite coordinates, duplicates, zero area

use super::config::ValidationConfig;
use super::types::{CheckPass, PassFindings};
use crate::geometry::{Mesh, VertexId};
use crate::utils::math::is_finite_vector;
use ahash::AHashMap;
use nalgebra::Point3;

/// Grid cell of a position at the configured tolerance
pub(crate) fn quantize(p: &Point3<f64>, tolerance: f64) -> [i64; 3] {
    let step = if tolerance > 0.0 { tolerance } else { 1e-9 };
    [
        (p.x / step).round() as i64,
        (p.y / step).round() as i64,
        (p.z / step).round() as i64,
    ]
}

pub fn check_geometry(mesh: &Mesh, config: &ValidationConfig) -> PassFindings {
    let mut findings = PassFindings::new(CheckPass::Geometry);

    let mut first_at: AHashMap<[i64; 3], VertexId> = AHashMap::new();
    let mut finite = vec![true; mesh.vertex_count()];
    for (i, vertex) in mesh.vertices().iter().enumerate() {
        let p = vertex.position;
        if !is_finite_vector(&[p.x, p.y, p.z]) {
            findings.error(format!("vertex {i} has a non-finite position"));
            finite[i] = false;
            continue;
        }
        let key = quantize(&p, config.position_tolerance);
        match first_at.get(&key) {
            Some(first) => findings.warning(format!("vertex {i} duplicates the position of vertex {first}")),
            None => {
                first_at.insert(key, VertexId::new(i));
            }
        }
    }

    for (i, face) in mesh.faces().iter().enumerate() {
        let in_range = face.vertices.iter().all(|v| v.index() < mesh.vertex_count());
        if !in_range || face.len() < 3 || face.vertices.iter().any(|v| !finite[v.index()]) {
            // Reported by the topology pass or above
            continue;
        }
        let area = mesh.loop_area_vector(&face.vertices).norm() * 0.5;
        if area < config.area_epsilon {
            if face.len() == 3 {
                findings.warning(format!("face {i} is a degenerate triangle (area {area:.3e})"));
            } else {
                findings.warning(format!("face {i} has zero area ({} vertices)", face.len()));
            }
        }
    }

    findings
}
