// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Index-level checks: face sizes, index ranges, repeated corners, edges

use super::config::ValidationConfig;
use super::types::{CheckPass, PassFindings};
use crate::geometry::Mesh;
use ahash::AHashMap;

pub fn check_topology(mesh: &Mesh, config: &ValidationConfig) -> PassFindings {
    let mut findings = PassFindings::new(CheckPass::Topology);
    let vertex_count = mesh.vertex_count();

    for (i, face) in mesh.faces().iter().enumerate() {
        if face.len() < 3 {
            findings.error(format!("face {i} has {} vertices, need at least 3", face.len()));
        }
        for &v in &face.vertices {
            if v.index() >= vertex_count {
                findings.error(format!(
                    "face {i} references vertex {v} (mesh has {vertex_count} vertices)"
                ));
            }
        }
        let n = face.len();
        if n >= 2 {
            for k in 0..n {
                if face.vertices[k] == face.vertices[(k + 1) % n] {
                    findings.error(format!(
                        "face {i} repeats vertex {} at consecutive corners",
                        face.vertices[k]
                    ));
                }
            }
        }
        if let Some(uvs) = face.uvs.as_ref() {
            if uvs.len() != n {
                findings.error(format!(
                    "face {i} has {} corner uvs for {n} corners",
                    uvs.len()
                ));
            }
        }
    }

    for (i, edge) in mesh.edges().iter().enumerate() {
        if edge.v1.index() >= vertex_count || edge.v2.index() >= vertex_count {
            findings.error(format!(
                "edge {i} ({}-{}) references a vertex out of range",
                edge.v1, edge.v2
            ));
        } else if edge.v1 == edge.v2 {
            findings.error(format!("edge {i} connects vertex {} to itself", edge.v1));
        }
    }

    // Informal manifold check: an edge bounding more than two faces
    let mut uses: AHashMap<_, usize> = AHashMap::new();
    for face in mesh.faces() {
        for key in face.edge_keys() {
            *uses.entry(key).or_default() += 1;
        }
    }
    let mut crowded: Vec<_> = uses.into_iter().filter(|(_, count)| *count > 2).collect();
    crowded.sort_unstable();
    for (key, count) in crowded {
        findings.warning(format!("edge {key} is shared by {count} faces"));
    }

    if config.warn_orphans {
        for (i, used) in mesh.used_vertices().iter().enumerate() {
            if !used {
                findings.warning(format!("vertex {i} is orphaned"));
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Edge, Face, Vertex, VertexId};

    fn ids(raw: &[usize]) -> Vec<VertexId> {
        raw.iter().copied().map(VertexId::new).collect()
    }

    #[test]
    fn test_broken_faces_and_edges() {
        let vertices = (0..3).map(|i| Vertex::from_coords(i as f64, 0.0, 0.0)).collect();
        let faces = vec![
            Face::new(ids(&[0, 1]), 0),
            Face::new(ids(&[0, 1, 7]), 0),
            Face::new(ids(&[0, 1, 1, 2]), 0),
        ];
        let edges = vec![Edge::new(VertexId::new(2), VertexId::new(2))];
        let mesh = Mesh::from_raw_parts(vertices, edges, faces);

        let findings = check_topology(&mesh, &ValidationConfig::default());
        assert_eq!(findings.errors.len(), 4);
        assert!(findings.errors[0].contains("face 0 has 2 vertices"));
        assert!(findings.errors[1].contains("references vertex 7"));
        assert!(findings.errors[2].contains("consecutive"));
        assert!(findings.errors[3].contains("to itself"));
    }

    #[test]
    fn test_orphans_are_warnings() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Vertex::from_coords(0.0, 0.0, 0.0));
        let findings = check_topology(&mesh, &ValidationConfig::default());
        assert!(findings.errors.is_empty());
        assert_eq!(findings.warnings, vec!["[topology] vertex 0 is orphaned".to_string()]);

        let quiet = ValidationConfig {
            warn_orphans: false,
            ..Default::default()
        };
        assert!(check_topology(&mesh, &quiet).warnings.is_empty());
    }
}
