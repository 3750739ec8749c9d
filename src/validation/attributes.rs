// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Attribute checks: texture coordinates and normals

use super::config::ValidationConfig;
use super::types::{CheckPass, PassFindings};
use crate::geometry::Mesh;
use nalgebra::{Vector2, Vector3};

const MIN_NORMAL_LENGTH: f64 = 1e-12;

fn uv_in_unit_square(uv: &Vector2<f64>) -> bool {
    (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)
}

fn normal_problem(n: &Vector3<f64>) -> Option<&'static str> {
    if !n.iter().all(|c| c.is_finite()) {
        Some("is not finite")
    } else if n.norm() < MIN_NORMAL_LENGTH {
        Some("has zero length")
    } else {
        None
    }
}

pub fn check_uvs(mesh: &Mesh, config: &ValidationConfig) -> PassFindings {
    let mut findings = PassFindings::new(CheckPass::Uv);

    let mut missing = 0;
    for (i, vertex) in mesh.vertices().iter().enumerate() {
        let Some(uv) = vertex.uv else {
            missing += 1;
            continue;
        };
        if !(uv.x.is_finite() && uv.y.is_finite()) {
            findings.error(format!("vertex {i} has a non-finite uv"));
        } else if config.check_uv_bounds && !uv_in_unit_square(&uv) {
            findings.warning(format!("vertex {i} uv ({:.3}, {:.3}) is outside [0, 1]", uv.x, uv.y));
        }
    }
    if config.warn_missing_attributes && missing > 0 && missing < mesh.vertex_count() {
        findings.warning(format!("{missing} of {} vertices have no uv", mesh.vertex_count()));
    }

    for (i, face) in mesh.faces().iter().enumerate() {
        let Some(uvs) = face.uvs.as_ref() else {
            continue;
        };
        if uvs.iter().any(|uv| !(uv.x.is_finite() && uv.y.is_finite())) {
            findings.error(format!("face {i} has a non-finite corner uv"));
        } else if config.check_uv_bounds && !uvs.iter().all(uv_in_unit_square) {
            findings.warning(format!("face {i} has corner uvs outside [0, 1]"));
        }
    }

    findings
}

pub fn check_normals(mesh: &Mesh, config: &ValidationConfig) -> PassFindings {
    let mut findings = PassFindings::new(CheckPass::Normals);

    let mut missing = 0;
    for (i, vertex) in mesh.vertices().iter().enumerate() {
        match vertex.normal {
            Some(n) => {
                if let Some(problem) = normal_problem(&n) {
                    findings.error(format!("vertex {i} normal {problem}"));
                }
            }
            None => missing += 1,
        }
    }
    if config.warn_missing_attributes && missing > 0 && missing < mesh.vertex_count() {
        findings.warning(format!("{missing} of {} vertices have no normal", mesh.vertex_count()));
    }

    for (i, face) in mesh.faces().iter().enumerate() {
        if let Some(problem) = face.normal.as_ref().and_then(normal_problem) {
            findings.error(format!("face {i} normal {problem}"));
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FaceId, VertexId};
    use crate::ops::test_support::unit_quad;

    #[test]
    fn test_uv_findings() {
        let mut mesh = unit_quad();
        mesh.vertex_mut(VertexId::new(0)).unwrap().uv = Some(Vector2::new(0.5, 0.5));
        mesh.vertex_mut(VertexId::new(1)).unwrap().uv = Some(Vector2::new(1.5, 0.5));
        mesh.vertex_mut(VertexId::new(2)).unwrap().uv = Some(Vector2::new(f64::INFINITY, 0.0));

        let findings = check_uvs(&mesh, &ValidationConfig::default());
        assert_eq!(findings.errors.len(), 1);
        assert!(findings.errors[0].contains("vertex 2"));
        assert_eq!(findings.warnings.len(), 1);
        assert!(findings.warnings[0].contains("vertex 1"));

        let strict = check_uvs(&mesh, &ValidationConfig::strict());
        assert!(strict.warnings.iter().any(|w| w.contains("1 of 4 vertices have no uv")));

        let relaxed = ValidationConfig {
            check_uv_bounds: false,
            ..Default::default()
        };
        assert!(check_uvs(&mesh, &relaxed).warnings.is_empty());
    }

    #[test]
    fn test_normal_findings() {
        let mut mesh = unit_quad();
        mesh.recompute_normals();
        assert!(check_normals(&mesh, &ValidationConfig::default()).errors.is_empty());

        mesh.vertex_mut(VertexId::new(3)).unwrap().normal = Some(Vector3::zeros());
        mesh.face_mut(FaceId::new(0)).unwrap().normal = Some(Vector3::new(f64::NAN, 0.0, 1.0));
        let findings = check_normals(&mesh, &ValidationConfig::default());
        assert_eq!(
            findings.errors,
            vec![
                "[normals] vertex 3 normal has zero length".to_string(),
                "[normals] face 0 normal is not finite".to_string(),
            ]
        );
    }
}
