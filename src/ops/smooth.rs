// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Laplacian smoothing

use crate::error::{MeshError, MeshResult};
use crate::geometry::Mesh;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingOptions {
    pub iterations: usize,
    /// Step towards the neighbour average per iteration, in [0, 1]
    pub factor: f64,
    /// Leave vertices on open boundaries where they are
    pub preserve_boundary: bool,
}

impl Default for SmoothingOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            factor: 0.5,
            preserve_boundary: true,
        }
    }
}

/// Uniform Laplacian smoothing of every vertex; returns a new mesh
pub fn smooth(mesh: &Mesh, options: &SmoothingOptions) -> MeshResult<Mesh> {
    let movable = vec![true; mesh.vertex_count()];
    smooth_masked(mesh, &movable, options)
}

/// Smooth only the vertices flagged in `movable`
pub(crate) fn smooth_masked(mesh: &Mesh, movable: &[bool], options: &SmoothingOptions) -> MeshResult<Mesh> {
    if !(options.factor.is_finite() && (0.0..=1.0).contains(&options.factor)) {
        return Err(MeshError::invalid_parameter(
            "factor",
            format!("must be in [0, 1], got {}", options.factor),
        ));
    }
    mesh.check_indices()?;

    let mut result = mesh.clone();
    if options.iterations == 0 || options.factor == 0.0 {
        return Ok(result);
    }

    let neighbours = mesh.vertex_neighbors();
    let boundary = if options.preserve_boundary {
        mesh.boundary_vertices()
    } else {
        vec![false; mesh.vertex_count()]
    };

    let mut positions: Vec<Point3<f64>> = mesh.vertices().iter().map(|v| v.position).collect();
    for _ in 0..options.iterations {
        let previous = positions.clone();
        for (i, position) in positions.iter_mut().enumerate() {
            if !movable.get(i).copied().unwrap_or(false) || boundary[i] || neighbours[i].is_empty() {
                continue;
            }
            let sum = neighbours[i]
                .iter()
                .fold(Vector3::zeros(), |acc, n| acc + previous[n.index()].coords);
            let average = Point3::from(sum / neighbours[i].len() as f64);
            *position = previous[i] + (average - previous[i]) * options.factor;
        }
    }

    for (vertex, position) in result.vertices_mut().iter_mut().zip(positions) {
        vertex.position = position;
    }
    debug!(
        "Smoothed {} vertices over {} iterations",
        movable.iter().filter(|m| **m).count(),
        options.iterations
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::unit_cube;
    use approx::assert_relative_eq;

    fn grid() -> Mesh {
        // 3x3 vertex grid, centre vertex lifted
        let mut positions = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                let z = if x == 1 && y == 1 { 1.0 } else { 0.0 };
                positions.push(Point3::new(x as f64, y as f64, z));
            }
        }
        let quads = vec![vec![0, 1, 4, 3], vec![1, 2, 5, 4], vec![3, 4, 7, 6], vec![4, 5, 8, 7]];
        Mesh::from_polygons(&positions, &quads).unwrap()
    }

    #[test]
    fn test_smooth_flattens_spike_and_keeps_boundary() {
        let mesh = grid();
        let smoothed = smooth(&mesh, &SmoothingOptions::default()).unwrap();
        let centre = smoothed.vertices()[4].position;
        assert_relative_eq!(centre.z, 0.5, epsilon = 1e-12);
        for v in [0usize, 1, 2, 3, 5, 6, 7, 8] {
            assert_eq!(smoothed.vertices()[v].position, mesh.vertices()[v].position);
        }
        // Input untouched
        assert_eq!(mesh.vertices()[4].position.z, 1.0);
    }

    #[test]
    fn test_closed_cube_shrinks_towards_centre() {
        let mesh = unit_cube();
        let options = SmoothingOptions {
            iterations: 3,
            ..Default::default()
        };
        let smoothed = smooth(&mesh, &options).unwrap();
        let before = mesh.bounding_box().diagonal();
        let after = smoothed.bounding_box().diagonal();
        assert!(after < before);
        assert_relative_eq!(
            smoothed.bounding_box().center(),
            Point3::new(0.5, 0.5, 0.5),
            epsilon = 1e-12
        );
        assert_eq!(smoothed.face_count(), mesh.face_count());
        let corner = smoothed.vertices()[0].position;
        assert_relative_eq!(corner.x, corner.y, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_factor() {
        let options = SmoothingOptions {
            factor: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            smooth(&grid(), &options),
            Err(MeshError::InvalidParameter { name: "factor", .. })
        ));
    }
}
