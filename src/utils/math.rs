// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector3};

/// Linear interpolation between two points
pub fn lerp_point(a: &Point3<f64>, b: &Point3<f64>, t: f64) -> Point3<f64> {
    a + (b - a) * t
}

/// Normalize, or `None` for (near) zero vectors
pub fn try_normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    v.try_normalize(1e-12)
}

/// Any unit vector perpendicular to `v`
pub fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&helper).normalize()
}

/// Component-wise finiteness check
pub fn is_finite_vector(v: &[f64]) -> bool {
    v.iter().all(|c| c.is_finite())
}
