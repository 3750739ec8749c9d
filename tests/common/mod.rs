// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared fixtures for integration tests

#![allow(dead_code)]

use nalgebra::Point3;
use polyedit::Mesh;

/// Axis-aligned cube with outward-wound quads.
///
/// Faces: 0 = +Z, 1 = -Z, 2 = +X, 3 = -X, 4 = +Y, 5 = -Y.
pub fn cube_at(min: Point3<f64>, size: f64) -> Mesh {
    let (x0, y0, z0) = (min.x, min.y, min.z);
    let (x1, y1, z1) = (x0 + size, y0 + size, z0 + size);
    let positions = [
        Point3::new(x0, y0, z0),
        Point3::new(x1, y0, z0),
        Point3::new(x1, y1, z0),
        Point3::new(x0, y1, z0),
        Point3::new(x0, y0, z1),
        Point3::new(x1, y0, z1),
        Point3::new(x1, y1, z1),
        Point3::new(x0, y1, z1),
    ];
    let loops = vec![
        vec![4, 5, 6, 7],
        vec![0, 3, 2, 1],
        vec![1, 2, 6, 5],
        vec![0, 4, 7, 3],
        vec![3, 7, 6, 2],
        vec![0, 1, 5, 4],
    ];
    Mesh::from_polygons(&positions, &loops).expect("cube loops are valid")
}

pub fn unit_cube() -> Mesh {
    cube_at(Point3::origin(), 1.0)
}

/// Centroids of all faces
pub fn face_centroids(mesh: &Mesh) -> Vec<Point3<f64>> {
    mesh.face_ids().filter_map(|id| mesh.face_centroid(id)).collect()
}

pub fn has_face_at(mesh: &Mesh, expected: Point3<f64>) -> bool {
    face_centroids(mesh).iter().any(|c| (c - expected).norm() < 1e-9)
}
