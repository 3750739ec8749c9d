// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Validation, repair and configuration round trips

mod common;

use common::unit_cube;
use nalgebra::Vector2;
use polyedit::validation::{validate_with, CheckPass, RepairOptions, ValidationReporter};
use polyedit::{repair, validate, Face, KernelConfig, Mesh, ValidationConfig, Vertex, VertexId};

fn ids(raw: &[usize]) -> Vec<VertexId> {
    raw.iter().copied().map(VertexId::new).collect()
}

/// Cube plus a dangling vertex, a degenerate sliver and a duplicate corner
fn messy_cube() -> Mesh {
    let cube = unit_cube();
    let mut vertices = cube.vertices().to_vec();
    vertices.push(Vertex::from_coords(4.0, 4.0, 4.0));
    vertices.push(Vertex::from_coords(1.0, 1.0, 1.0));
    let mut faces = cube.faces().to_vec();
    faces.push(Face::new(ids(&[0, 1, 1]), 0));
    faces.push(Face::new(ids(&[0, 1, 42]), 0));
    Mesh::from_raw_parts(vertices, cube.edges().to_vec(), faces)
}

#[test]
fn test_validation_is_stable() {
    let cube = unit_cube();
    let first = validate(&cube);
    assert!(first.is_valid);
    for _ in 0..3 {
        assert_eq!(validate(&cube), first);
    }
}

#[test]
fn test_findings_are_grouped_by_pass() {
    let report = validate(&messy_cube());
    assert!(!report.is_valid);
    assert!(report.errors.iter().all(|e| e.starts_with("[topology]")));
    assert!(report
        .findings_for(CheckPass::Geometry)
        .iter()
        .any(|w| w.contains("duplicates the position of vertex 6")));
    assert!(report
        .findings_for(CheckPass::Topology)
        .iter()
        .any(|w| w.contains("vertex 8 is orphaned")));
}

#[test]
fn test_repair_then_validate() {
    let mut mesh = messy_cube();
    let report = repair(&mut mesh, &RepairOptions::default()).unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.faces_out_of_range, 1);
    assert_eq!(report.welded_vertices, 1);
    assert_eq!(report.orphans_removed, 1);

    let after = validate(&mesh);
    assert!(after.is_valid, "{:?}", after.errors);
    assert!(!after.has_warnings(), "{:?}", after.warnings);
    assert_eq!((mesh.vertex_count(), mesh.face_count()), (8, 6));
}

#[test]
fn test_uv_bounds_policy() {
    let mut mesh = unit_cube();
    mesh.vertex_mut(VertexId::new(2)).unwrap().uv = Some(Vector2::new(1.25, 0.5));
    assert!(validate(&mesh).has_warnings());

    let relaxed = ValidationConfig {
        check_uv_bounds: false,
        ..Default::default()
    };
    let report = validate_with(&mesh, &relaxed);
    assert!(report.is_valid);
    assert!(!report.has_warnings());
}

#[test]
fn test_reports_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let report = validate(&messy_cube());

    let json = dir.path().join("report.json");
    let markdown = dir.path().join("report.md");
    ValidationReporter::write_json(&report, &json).unwrap();
    ValidationReporter::write_markdown(&report, "Messy cube", &markdown).unwrap();

    let text = std::fs::read_to_string(&markdown).unwrap();
    assert!(text.contains("# Messy cube"));
    assert!(text.contains("**Status:** invalid"));
    assert!(std::fs::read_to_string(&json).unwrap().contains("\"is_valid\": false"));
}

#[test]
fn test_mesh_json_round_trip() {
    let cube = unit_cube();
    let json = serde_json::to_string(&cube).unwrap();
    let restored: Mesh = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.counts(), cube.counts());
    assert_eq!(restored.faces(), cube.faces());
    // The edge lookup is rebuilt on load
    assert!(restored
        .edge_by_key(polyedit::EdgeKey::new(VertexId::new(4), VertexId::new(5)))
        .is_some());
}

#[test]
fn test_kernel_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("polyedit.toml");

    let mut config = KernelConfig::default();
    config.set_tolerance(1e-4);
    config.validation.warn_orphans = false;
    config.history.max_entries = 12;
    config.save(&path).unwrap();

    let loaded = KernelConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.csg.tolerance, 1e-4);
}
