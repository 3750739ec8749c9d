// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Best-effort repair of the problems the validator reports

use crate::error::{MeshError, MeshResult};
use crate::geometry::Mesh;
use crate::ops::merge_vertices;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairOptions {
    /// Weld vertices closer than this; `None` disables welding
    pub weld_tolerance: Option<f64>,
    /// Faces with less area than this are dropped
    pub area_epsilon: f64,
    pub remove_orphans: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            weld_tolerance: Some(1e-6),
            area_epsilon: 1e-12,
            remove_orphans: true,
        }
    }
}

/// Counts of every fix a repair pass applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub faces_out_of_range: usize,
    pub repeated_corners: usize,
    pub degenerate_faces: usize,
    pub invalid_edges: usize,
    pub cleared_normals: usize,
    pub cleared_uvs: usize,
    pub welded_vertices: usize,
    pub orphans_removed: usize,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.faces_out_of_range
            + self.repeated_corners
            + self.degenerate_faces
            + self.invalid_edges
            + self.cleared_normals
            + self.cleared_uvs
            + self.welded_vertices
            + self.orphans_removed
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Repair a mesh in place. Ids are re-indexed when elements are dropped.
pub fn repair(mesh: &mut Mesh, options: &RepairOptions) -> MeshResult<RepairReport> {
    if !(options.area_epsilon.is_finite() && options.area_epsilon >= 0.0) {
        return Err(MeshError::invalid_parameter(
            "area_epsilon",
            format!("must be a non-negative finite value, got {}", options.area_epsilon),
        ));
    }
    let mut report = RepairReport::default();
    let vertex_count = mesh.vertex_count();

    let out_of_range = mesh.retain_faces(|_, face| face.vertices.iter().all(|v| v.index() < vertex_count));
    report.faces_out_of_range = out_of_range.removed.len();

    for face in mesh.faces_mut().iter_mut() {
        let before = face.len();
        face.collapse_repeats();
        report.repeated_corners += before - face.len();
    }

    let epsilon = options.area_epsilon;
    let positions: Vec<_> = mesh.vertices().iter().map(|v| v.position).collect();
    let degenerate = mesh.retain_faces(|_, face| {
        if face.is_degenerate() {
            return false;
        }
        let points: Vec<_> = face.vertices.iter().map(|v| positions[v.index()]).collect();
        let area = crate::geometry::newell_vector(&points).norm() * 0.5;
        // NaN areas stay; the validator keeps reporting their positions
        area.is_nan() || area >= epsilon
    });
    report.degenerate_faces = degenerate.removed.len();

    let edges_before = mesh.edge_count();
    mesh.edges_mut()
        .retain(|e| e.v1 != e.v2 && e.v1.index() < vertex_count && e.v2.index() < vertex_count);
    report.invalid_edges = edges_before - mesh.edge_count();
    if report.invalid_edges > 0 {
        mesh.reindex_edges();
        mesh.bump_revision();
    }

    report.cleared_normals = clear_bad_normals(mesh);
    report.cleared_uvs = clear_bad_uvs(mesh);

    if let Some(tolerance) = options.weld_tolerance {
        let merge = merge_vertices(mesh, tolerance)?;
        report.welded_vertices = merge.merged;
        report.degenerate_faces += merge.faces.removed.len();
    }
    if options.remove_orphans {
        report.orphans_removed = mesh.remove_orphaned_vertices();
    }
    mesh.sync_edges();

    info!(
        "Repair applied {} fixes ({} faces dropped, {} vertices welded)",
        report.total(),
        report.faces_out_of_range + report.degenerate_faces,
        report.welded_vertices
    );
    Ok(report)
}

fn usable_normal(n: &nalgebra::Vector3<f64>) -> bool {
    n.iter().all(|c| c.is_finite()) && n.norm() >= 1e-12
}

fn clear_bad_normals(mesh: &mut Mesh) -> usize {
    let mut cleared = 0;
    for vertex in mesh.vertices_mut().iter_mut() {
        if vertex.normal.as_ref().map_or(false, |n| !usable_normal(n)) {
            vertex.normal = None;
            cleared += 1;
        }
    }
    for face in mesh.faces_mut().iter_mut() {
        if face.normal.as_ref().map_or(false, |n| !usable_normal(n)) {
            face.normal = None;
            cleared += 1;
        }
    }
    cleared
}

fn clear_bad_uvs(mesh: &mut Mesh) -> usize {
    let mut cleared = 0;
    for vertex in mesh.vertices_mut().iter_mut() {
        if vertex.uv.map_or(false, |uv| !(uv.x.is_finite() && uv.y.is_finite())) {
            vertex.uv = None;
            cleared += 1;
        }
    }
    for face in mesh.faces_mut().iter_mut() {
        let corners = face.len();
        let bad = face.uvs.as_ref().map_or(false, |uvs| {
            uvs.len() != corners || uvs.iter().any(|uv| !(uv.x.is_finite() && uv.y.is_finite()))
        });
        if bad {
            face.uvs = None;
            cleared += 1;
        }
    }
    cleared
}
