// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ray casting against triangle soups and point-in-solid classification

use crate::error::MeshResult;
use crate::geometry::{triangulate_polygon, BoundingBox, Mesh};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Ray directions tried in order. Slightly skewed off the axes so that
/// centroids of axis-aligned faces do not run along triangle diagonals.
const RAY_DIRECTIONS: [[f64; 3]; 4] = [
    [1.0, 0.0137, 0.0093],
    [0.0119, 1.0, 0.0071],
    [0.0089, 0.0127, 1.0],
    [-1.0, 0.0113, -0.0157],
];

/// Where a point lies relative to a closed solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Inside,
    Outside,
    /// Every ray grazed a triangle border; callers treat this as outside
    Unknown,
}

impl Classification {
    pub fn is_inside(&self) -> bool {
        matches!(self, Classification::Inside)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// Barycentric detail of a ray hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f64,
    pub u: f64,
    pub v: f64,
}

impl TriangleHit {
    /// True when the hit lies within `tolerance` of a triangle border
    pub fn grazes(&self, tolerance: f64) -> bool {
        self.u < tolerance || self.v < tolerance || 1.0 - self.u - self.v < tolerance
    }
}

/// Möller–Trumbore ray/triangle test.
///
/// Rejects near-parallel rays (`|det| < tolerance`), hits at or behind the
/// origin and barycentrics outside the triangle.
pub fn intersect_triangle(ray: &Ray, triangle: &[Point3<f64>; 3], tolerance: f64) -> Option<TriangleHit> {
    let [v0, v1, v2] = triangle;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < tolerance {
        return None;
    }

    let inv = 1.0 / det;
    let s = ray.origin - v0;
    let u = inv * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&edge1);
    let v = inv * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = inv * edge2.dot(&q);
    (t > tolerance).then_some(TriangleHit { t, u, v })
}

/// Distance along the ray to the hit, if any
pub fn ray_hits(ray: &Ray, triangle: &[Point3<f64>; 3], tolerance: f64) -> Option<f64> {
    intersect_triangle(ray, triangle, tolerance).map(|hit| hit.t)
}

/// Triangulated copy of a mesh surface used as a ray-casting target
#[derive(Debug, Clone)]
pub struct TriangleSoup {
    triangles: Vec<[Point3<f64>; 3]>,
    bounds: BoundingBox,
}

impl Default for TriangleSoup {
    fn default() -> Self {
        Self {
            triangles: Vec::new(),
            bounds: BoundingBox::empty(),
        }
    }
}

impl TriangleSoup {
    /// Fails with `IndexInvalidated` when a face references a missing vertex
    pub fn from_mesh(mesh: &Mesh) -> MeshResult<Self> {
        mesh.check_indices()?;
        let mut triangles = Vec::with_capacity(mesh.face_count() * 2);
        let mut bounds = BoundingBox::empty();
        for face in mesh.faces() {
            if face.len() < 3 {
                continue;
            }
            let points = mesh.positions_of(&face.vertices);
            for p in &points {
                bounds.expand_to_include(p);
            }
            for [a, b, c] in triangulate_polygon(&points) {
                triangles.push([points[a], points[b], points[c]]);
            }
        }
        Ok(Self { triangles, bounds })
    }

    pub fn triangles(&self) -> &[[Point3<f64>; 3]] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Parity of the crossings along `ray`, or `None` when a crossing grazes
    /// a triangle border and the count cannot be trusted.
    fn crossing_parity(&self, ray: &Ray, tolerance: f64) -> Option<bool> {
        let mut crossings = 0usize;
        for triangle in &self.triangles {
            if let Some(hit) = intersect_triangle(ray, triangle, tolerance) {
                if hit.grazes(tolerance) {
                    return None;
                }
                crossings += 1;
            }
        }
        Some(crossings % 2 == 1)
    }

    /// Classify a point by casting rays and counting crossings; odd is inside
    pub fn classify_point(&self, point: &Point3<f64>, tolerance: f64) -> Classification {
        if self.is_empty() || !self.bounds.contains(point, tolerance) {
            return Classification::Outside;
        }
        for direction in RAY_DIRECTIONS {
            let ray = Ray::new(*point, Vector3::from(direction).normalize());
            if let Some(odd) = self.crossing_parity(&ray, tolerance) {
                return if odd {
                    Classification::Inside
                } else {
                    Classification::Outside
                };
            }
        }
        Classification::Unknown
    }
}

/// Point-in-solid test against a mesh
pub fn point_in_mesh(point: &Point3<f64>, mesh: &Mesh, tolerance: f64) -> MeshResult<Classification> {
    Ok(TriangleSoup::from_mesh(mesh)?.classify_point(point, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::unit_cube;
    use approx::assert_relative_eq;

    fn triangle() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_ray_hits_triangle() {
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = intersect_triangle(&ray, &triangle(), 1e-9).unwrap();
        assert_relative_eq!(hit.t, 1.0);
        assert_relative_eq!(ray.at(hit.t), Point3::new(0.25, 0.25, 0.0));
        assert!(!hit.grazes(1e-6));
    }

    #[test]
    fn test_ray_rejections() {
        let tri = triangle();
        // Behind the origin
        let behind = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(ray_hits(&behind, &tri, 1e-9).is_none());
        // Parallel to the plane
        let parallel = Ray::new(Point3::new(-1.0, 0.25, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(ray_hits(&parallel, &tri, 1e-9).is_none());
        // Outside the barycentric range
        let miss = Ray::new(Point3::new(0.8, 0.8, 1.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ray_hits(&miss, &tri, 1e-9).is_none());
    }

    #[test]
    fn test_border_hit_grazes() {
        let ray = Ray::new(Point3::new(0.5, 0.5, 1.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = intersect_triangle(&ray, &triangle(), 1e-9).unwrap();
        assert!(hit.grazes(1e-6));
    }

    #[test]
    fn test_point_in_cube() {
        let cube = unit_cube();
        let soup = TriangleSoup::from_mesh(&cube).unwrap();
        assert_eq!(soup.len(), 12);

        assert_eq!(soup.classify_point(&Point3::new(0.5, 0.5, 0.5), 1e-6), Classification::Inside);
        assert_eq!(soup.classify_point(&Point3::new(0.2, 0.7, 0.9), 1e-6), Classification::Inside);
        assert_eq!(soup.classify_point(&Point3::new(-0.5, 0.5, 0.5), 1e-6), Classification::Outside);
        assert_eq!(soup.classify_point(&Point3::new(5.0, 5.0, 5.0), 1e-6), Classification::Outside);
        assert_eq!(
            point_in_mesh(&Point3::new(0.5, 0.5, 0.5), &cube, 1e-6).unwrap(),
            Classification::Inside
        );
    }

    #[test]
    fn test_empty_soup_is_outside() {
        let soup = TriangleSoup::default();
        assert_eq!(soup.classify_point(&Point3::origin(), 1e-6), Classification::Outside);
    }
}
