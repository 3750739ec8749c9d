// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bridging two vertex loops with a band of faces

use super::{select_edges, EditResult, EditTracker};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{EdgeKey, Mesh, VertexId};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeOptions {
    /// Loops wrap around (last vertex joins the first)
    pub closed: bool,
    /// Rotate the second closed loop so it starts at the vertex nearest the
    /// first loop's start
    pub align: bool,
    /// Material of the band; defaults to the material of a face touching the
    /// first loop
    pub material_index: Option<usize>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            closed: true,
            align: true,
            material_index: None,
        }
    }
}

/// Vertices of an edge chain in walking order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLoop {
    pub vertices: Vec<VertexId>,
    pub closed: bool,
}

/// Order a set of edges into a single chain.
///
/// Open chains start at one of their two ends; closed loops start at the
/// lowest endpoint of the first edge and follow that edge first.
pub fn ordered_loop(edges: &[EdgeKey]) -> MeshResult<EdgeLoop> {
    if edges.is_empty() {
        return Err(MeshError::invalid_selection("edge loop is empty"));
    }
    let mut adjacency: AHashMap<VertexId, Vec<VertexId>> = AHashMap::new();
    let mut unique = AHashSet::new();
    for &key in edges {
        if !unique.insert(key) {
            continue;
        }
        adjacency.entry(key.lo()).or_default().push(key.hi());
        adjacency.entry(key.hi()).or_default().push(key.lo());
    }
    if adjacency.values().any(|n| n.len() > 2) {
        return Err(MeshError::invalid_selection(
            "edges branch: a vertex is shared by more than two edges",
        ));
    }

    let mut ends: Vec<VertexId> = adjacency
        .iter()
        .filter(|(_, n)| n.len() == 1)
        .map(|(&v, _)| v)
        .collect();
    ends.sort_unstable();
    let closed = ends.is_empty();
    let start = if closed { edges[0].lo() } else { ends[0] };

    let mut vertices = vec![start];
    let mut previous: Option<VertexId> = None;
    let mut current = start;
    loop {
        let next = adjacency.get(&current).and_then(|neighbours| {
            neighbours
                .iter()
                .copied()
                .filter(|&n| Some(n) != previous)
                // First step of a closed loop follows the first edge
                .find(|&n| !(closed && previous.is_none() && n != edges[0].hi()))
        });
        match next {
            Some(n) if n == start => break,
            Some(n) => {
                vertices.push(n);
                previous = Some(current);
                current = n;
            }
            None => break,
        }
    }

    let walked_edges = if closed { vertices.len() } else { vertices.len() - 1 };
    if walked_edges != unique.len() {
        return Err(MeshError::invalid_selection(format!(
            "edges are not connected: walked {} of {}",
            walked_edges,
            unique.len()
        )));
    }
    Ok(EdgeLoop { vertices, closed })
}

/// Join two vertex loops with a band of faces.
///
/// Loops of equal length are joined pairwise with quads
/// `(a_i, a_{i+1}, b_{i+1}, b_i)`. Loops of different lengths are walked
/// proportionally and joined with triangles, so every vertex of both loops
/// is used. Both loops should run in the same direction.
pub fn bridge_loops(
    mesh: &mut Mesh,
    loop_a: &[VertexId],
    loop_b: &[VertexId],
    options: &BridgeOptions,
) -> MeshResult<EditResult> {
    let min_len = if options.closed { 3 } else { 2 };
    for (name, vertices) in [("first", loop_a), ("second", loop_b)] {
        if vertices.len() < min_len {
            return Err(MeshError::invalid_selection(format!(
                "{name} loop has {} vertices, need at least {min_len}",
                vertices.len()
            )));
        }
        let mut seen = AHashSet::new();
        for &v in vertices {
            if v.index() >= mesh.vertex_count() {
                return Err(MeshError::invalid_selection(format!(
                    "{name} loop references missing vertex {v}"
                )));
            }
            if !seen.insert(v) {
                return Err(MeshError::invalid_selection(format!(
                    "{name} loop visits vertex {v} twice"
                )));
            }
        }
    }
    let in_a: AHashSet<VertexId> = loop_a.iter().copied().collect();
    if let Some(shared) = loop_b.iter().find(|v| in_a.contains(v)) {
        return Err(MeshError::invalid_selection(format!(
            "loops share vertex {shared}"
        )));
    }

    let a = loop_a.to_vec();
    let mut b = loop_b.to_vec();
    if options.closed && options.align {
        let origin = mesh.position(a[0]);
        let nearest = b
            .iter()
            .enumerate()
            .min_by(|(_, x), (_, y)| {
                let dx = (mesh.position(**x) - origin).norm_squared();
                let dy = (mesh.position(**y) - origin).norm_squared();
                dx.total_cmp(&dy)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        b.rotate_left(nearest);
    }

    let material = options.material_index.unwrap_or_else(|| {
        mesh.faces_around_vertex(a[0])
            .first()
            .map(|f| mesh.faces()[f.index()].material_index)
            .unwrap_or(0)
    });

    let tracker = EditTracker::start(mesh);
    let (n, m) = (a.len(), b.len());
    let (spans_a, spans_b) = if options.closed { (n, m) } else { (n - 1, m - 1) };
    let mut band = Vec::with_capacity(spans_a + spans_b);

    if n == m {
        for i in 0..spans_a {
            let j = (i + 1) % n;
            band.push(mesh.add_face(&[a[i], a[j], b[j], b[i]], material)?);
        }
    } else {
        let (mut i, mut j) = (0usize, 0usize);
        while i < spans_a || j < spans_b {
            // Advance whichever loop lags behind in parameter space
            let next_a = (i + 1) as f64 / spans_a as f64;
            let next_b = (j + 1) as f64 / spans_b as f64;
            if i < spans_a && (j >= spans_b || next_a <= next_b) {
                band.push(mesh.add_face(&[a[i], a[(i + 1) % n], b[j % m]], material)?);
                i += 1;
            } else {
                band.push(mesh.add_face(&[a[i % n], b[(j + 1) % m], b[j]], material)?);
                j += 1;
            }
        }
    }

    let result = tracker.finish(mesh, band);
    debug!(
        "Bridged loops of {} and {} vertices with {} faces",
        n,
        m,
        result.new_faces.len()
    );
    Ok(result)
}

/// Bridge two edge loops given as edge selections
pub fn bridge_edges(
    mesh: &mut Mesh,
    edges_a: &[EdgeKey],
    edges_b: &[EdgeKey],
    options: &BridgeOptions,
) -> MeshResult<EditResult> {
    select_edges(mesh, edges_a)?;
    select_edges(mesh, edges_b)?;
    let loop_a = ordered_loop(edges_a)?;
    let loop_b = ordered_loop(edges_b)?;
    if loop_a.closed != loop_b.closed {
        return Err(MeshError::invalid_selection(
            "cannot bridge a closed loop with an open chain",
        ));
    }
    let options = BridgeOptions {
        closed: loop_a.closed,
        ..*options
    };
    bridge_loops(mesh, &loop_a.vertices, &loop_b.vertices, &options)
}
