// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation and repair
//!
//! Validation runs four independent passes (topology, geometry, uv, normals)
//! over an immutable mesh and unions their findings. Repair mutates the mesh
//! to clear what the passes report.

pub mod attributes;
pub mod config;
pub mod geometry;
pub mod repair;
pub mod reporter;
pub mod topology;
pub mod types;

pub use config::ValidationConfig;
pub use repair::{repair, RepairOptions, RepairReport};
pub use reporter::ValidationReporter;
pub use types::{CheckPass, PassFindings, ValidationReport};

use crate::geometry::Mesh;
use tracing::debug;

/// Runs every check pass with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct MeshValidator {
    config: ValidationConfig,
}

impl MeshValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate(&self, mesh: &Mesh) -> ValidationReport {
        let (vertices, edges, faces) = mesh.counts();
        let mut report = ValidationReport::new(vertices, edges, faces);
        for pass in CheckPass::ALL {
            report.absorb(self.run_pass(pass, mesh));
        }
        debug!(
            "Validated mesh ({vertices} vertices, {faces} faces): {} errors, {} warnings",
            report.errors.len(),
            report.warnings.len()
        );
        report
    }

    /// Run a single pass
    pub fn run_pass(&self, pass: CheckPass, mesh: &Mesh) -> PassFindings {
        match pass {
            CheckPass::Topology => topology::check_topology(mesh, &self.config),
            CheckPass::Geometry => geometry::check_geometry(mesh, &self.config),
            CheckPass::Uv => attributes::check_uvs(mesh, &self.config),
            CheckPass::Normals => attributes::check_normals(mesh, &self.config),
        }
    }
}

/// Validate with the default configuration
pub fn validate(mesh: &Mesh) -> ValidationReport {
    MeshValidator::default().validate(mesh)
}

pub fn validate_with(mesh: &Mesh, config: &ValidationConfig) -> ValidationReport {
    MeshValidator::new(config.clone()).validate(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Face, Vertex, VertexId};
    use crate::ops::test_support::unit_cube;
    use nalgebra::Vector2;

    #[test]
    fn test_cube_is_valid() {
        let report = validate(&unit_cube());
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(!report.has_warnings(), "{:?}", report.warnings);
        assert_eq!(
            (report.vertex_count, report.edge_count, report.face_count),
            (8, 12, 6)
        );
    }

    #[test]
    fn test_validation_is_pure_and_deterministic() {
        let cube = unit_cube();
        let mut vertices = cube.vertices().to_vec();
        vertices[0].uv = Some(Vector2::new(2.0, 0.0));
        vertices.push(Vertex::from_coords(1.0, 1.0, 1.0));
        let mut faces = cube.faces().to_vec();
        faces.push(Face::new(vec![VertexId::new(0), VertexId::new(1)], 0));
        let mesh = Mesh::from_raw_parts(vertices, cube.edges().to_vec(), faces);
        let before = serde_json::to_string(&mesh).unwrap();

        let first = validate(&mesh);
        let second = validate(&mesh);
        assert_eq!(first, second);
        assert_eq!(serde_json::to_string(&mesh).unwrap(), before);
        assert!(!first.is_valid);
        for pass in [CheckPass::Topology, CheckPass::Geometry, CheckPass::Uv] {
            assert!(!first.findings_for(pass).is_empty(), "{pass:?}");
        }
    }

    #[test]
    fn test_run_single_pass() {
        let validator = MeshValidator::new(ValidationConfig::strict());
        let findings = validator.run_pass(CheckPass::Normals, &unit_cube());
        assert_eq!(findings.pass, CheckPass::Normals);
        assert!(findings.errors.is_empty());
    }
}
