// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Vertex welding

use super::select_vertices;
use crate::error::{MeshError, MeshResult};
use crate::geometry::{centroid, FaceRemap, Mesh, VertexId};
use ahash::AHashMap;
use nalgebra::Point3;
use tracing::debug;

/// Outcome of a vertex merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    /// Old vertex index -> id of the surviving vertex in the compacted mesh
    pub vertex_remap: Vec<VertexId>,
    /// Number of vertices folded into another one
    pub merged: usize,
    /// Face re-indexing; faces that collapsed below three distinct vertices
    /// are listed in `faces.removed`
    pub faces: FaceRemap,
}

impl MergeReport {
    fn unchanged(mesh: &Mesh) -> Self {
        Self {
            vertex_remap: mesh.vertex_ids().collect(),
            merged: 0,
            faces: FaceRemap {
                remap: mesh.face_ids().map(Some).collect(),
                removed: Vec::new(),
            },
        }
    }
}

/// Weld vertices closer than `threshold` to each other.
///
/// Vertices are visited in index order; each one joins the first
/// representative within the threshold or becomes a representative itself.
/// A threshold of zero merges exact duplicates only.
pub fn merge_vertices(mesh: &mut Mesh, threshold: f64) -> MeshResult<MergeReport> {
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(MeshError::invalid_parameter(
            "threshold",
            format!("must be a non-negative finite distance, got {threshold}"),
        ));
    }
    mesh.check_indices()?;

    let representative = if threshold == 0.0 {
        exact_representatives(mesh)
    } else {
        grid_representatives(mesh, threshold)
    };
    let merged = representative
        .iter()
        .enumerate()
        .filter(|(i, r)| r.index() != *i)
        .count();
    if merged == 0 {
        return Ok(MergeReport::unchanged(mesh));
    }

    let report = apply_representatives(mesh, &representative, merged);
    debug!(
        "Merged {} vertices (threshold {}), dropped {} faces",
        merged,
        threshold,
        report.faces.removed.len()
    );
    Ok(report)
}

/// Merge the selected vertices into one vertex at their centroid
pub fn collapse_vertices(mesh: &mut Mesh, vertices: &[VertexId]) -> MeshResult<MergeReport> {
    let mut selected = select_vertices(mesh, vertices)?;
    if selected.len() < 2 {
        return Err(MeshError::invalid_selection(
            "collapsing needs at least two distinct vertices",
        ));
    }
    mesh.check_indices()?;
    selected.sort_unstable();

    let target = selected[0];
    let centre = centroid(&mesh.positions_of(&selected));
    if let Some(vertex) = mesh.vertex_mut(target) {
        vertex.position = centre;
    }

    let mut representative: Vec<VertexId> = mesh.vertex_ids().collect();
    for &v in &selected[1..] {
        representative[v.index()] = target;
    }
    let report = apply_representatives(mesh, &representative, selected.len() - 1);
    debug!(
        "Collapsed {} vertices into {}",
        selected.len(),
        report.vertex_remap[target.index()]
    );
    Ok(report)
}

fn exact_representatives(mesh: &Mesh) -> Vec<VertexId> {
    let mut seen: AHashMap<[u64; 3], VertexId> = AHashMap::new();
    mesh.vertices()
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let p = v.position;
            // -0.0 and 0.0 are the same place
            let key = [p.x + 0.0, p.y + 0.0, p.z + 0.0].map(f64::to_bits);
            *seen.entry(key).or_insert(VertexId::new(i))
        })
        .collect()
}

fn grid_representatives(mesh: &Mesh, threshold: f64) -> Vec<VertexId> {
    let cell_of = |p: &Point3<f64>| -> [i64; 3] {
        [
            (p.x / threshold).floor() as i64,
            (p.y / threshold).floor() as i64,
            (p.z / threshold).floor() as i64,
        ]
    };
    let limit = threshold * threshold;
    let mut grid: AHashMap<[i64; 3], Vec<VertexId>> = AHashMap::new();
    let mut representative = Vec::with_capacity(mesh.vertex_count());

    for (i, vertex) in mesh.vertices().iter().enumerate() {
        let p = vertex.position;
        let cell = cell_of(&p);
        let mut best: Option<VertexId> = None;
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                for dz in -1i64..=1 {
                    let key = [
                        cell[0].saturating_add(dx),
                        cell[1].saturating_add(dy),
                        cell[2].saturating_add(dz),
                    ];
                    let Some(bucket) = grid.get(&key) else {
                        continue;
                    };
                    for &candidate in bucket {
                        let q = mesh.vertices()[candidate.index()].position;
                        if (q - p).norm_squared() <= limit && best.map_or(true, |b| candidate < b) {
                            best = Some(candidate);
                        }
                    }
                }
            }
        }
        match best {
            Some(rep) => representative.push(rep),
            None => {
                let id = VertexId::new(i);
                grid.entry(cell).or_default().push(id);
                representative.push(id);
            }
        }
    }
    representative
}

/// Point every vertex at its representative, then drop the non-representatives
fn apply_representatives(mesh: &mut Mesh, representative: &[VertexId], merged: usize) -> MergeReport {
    let faces = mesh.remap_vertices(|v| representative.get(v.index()).copied());
    let keep: Vec<bool> = representative
        .iter()
        .enumerate()
        .map(|(i, r)| r.index() == i)
        .collect();
    let (compacted, _) = mesh.compact_vertices(&keep);

    let vertex_remap = representative
        .iter()
        .map(|r| compacted[r.index()].unwrap_or(*r))
        .collect();
    MergeReport {
        vertex_remap,
        merged,
        faces,
    }
}
