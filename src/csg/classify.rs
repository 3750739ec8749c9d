// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Whole-face classification against another solid

use super::ray::{Classification, TriangleSoup};
use crate::error::MeshResult;
use crate::geometry::Mesh;
use serde::{Deserialize, Serialize};

/// How many faces of one operand landed in each class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    pub inside: usize,
    pub outside: usize,
    pub unknown: usize,
}

impl ClassificationCounts {
    pub fn tally(classes: &[Classification]) -> Self {
        let mut counts = Self::default();
        for class in classes {
            match class {
                Classification::Inside => counts.inside += 1,
                Classification::Outside => counts.outside += 1,
                Classification::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.inside + self.outside + self.unknown
    }
}

/// Classify every face of `mesh` by testing its centroid against `other`.
///
/// A face straddling the other surface gets the class of its centroid; faces
/// are never split.
pub fn classify_faces(mesh: &Mesh, other: &TriangleSoup, tolerance: f64) -> Vec<Classification> {
    mesh.faces()
        .iter()
        .map(|face| {
            if face.is_empty() {
                return Classification::Unknown;
            }
            let centroid = mesh.loop_centroid(&face.vertices);
            other.classify_point(&centroid, tolerance)
        })
        .collect()
}

/// Index-checked variant taking the other operand as a mesh
pub fn classify_against(mesh: &Mesh, other: &Mesh, tolerance: f64) -> MeshResult<Vec<Classification>> {
    mesh.check_indices()?;
    let soup = TriangleSoup::from_mesh(other)?;
    Ok(classify_faces(mesh, &soup, tolerance))
}
