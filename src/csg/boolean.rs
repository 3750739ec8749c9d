// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face-level boolean operators.
//!
//! Faces are kept or discarded whole according to where their centroid lies
//! in the other operand; nothing is re-tessellated along the intersection
//! curve. Results are welded, stripped of degenerate and duplicate faces and
//! optionally validated.

use super::classify::{classify_faces, ClassificationCounts};
use super::ray::{Classification, TriangleSoup};
use super::CsgOptions;
use crate::error::MeshResult;
use crate::geometry::{Face, Mesh};
use crate::ops::merge_vertices;
use crate::validation::{validate, ValidationReport};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
    /// `difference(union(A, B), intersection(A, B))`
    Xor,
}

impl BooleanOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Intersection => "intersection",
            BooleanOp::Difference => "difference",
            BooleanOp::Xor => "xor",
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping of one boolean run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanStats {
    /// Classes of the left operand's faces against the right operand
    pub a: ClassificationCounts,
    /// Classes of the right operand's faces against the left operand
    pub b: ClassificationCounts,
    pub welded_vertices: usize,
    pub degenerate_faces: usize,
    pub duplicate_faces: usize,
}

#[derive(Debug, Clone)]
pub struct BooleanOutput {
    pub mesh: Mesh,
    /// Present when `CsgOptions::validate_result` is set
    pub report: Option<ValidationReport>,
    pub stats: BooleanStats,
}

/// Run `op` on two solids
pub fn boolean(a: &Mesh, b: &Mesh, op: BooleanOp, options: &CsgOptions) -> MeshResult<BooleanOutput> {
    options.check()?;
    let output = match op {
        BooleanOp::Xor => {
            let inner = CsgOptions {
                validate_result: false,
                ..options.clone()
            };
            let joined = combine(a, b, BooleanOp::Union, &inner)?;
            let common = combine(a, b, BooleanOp::Intersection, &inner)?;
            combine(&joined.mesh, &common.mesh, BooleanOp::Difference, options)?
        }
        _ => combine(a, b, op, options)?,
    };
    debug!(
        "{} produced {} faces from {} + {}",
        op,
        output.mesh.face_count(),
        a.face_count(),
        b.face_count()
    );
    Ok(output)
}

pub fn union(a: &Mesh, b: &Mesh, options: &CsgOptions) -> MeshResult<Mesh> {
    Ok(boolean(a, b, BooleanOp::Union, options)?.mesh)
}

pub fn intersection(a: &Mesh, b: &Mesh, options: &CsgOptions) -> MeshResult<Mesh> {
    Ok(boolean(a, b, BooleanOp::Intersection, options)?.mesh)
}

pub fn difference(a: &Mesh, b: &Mesh, options: &CsgOptions) -> MeshResult<Mesh> {
    Ok(boolean(a, b, BooleanOp::Difference, options)?.mesh)
}

/// Symmetric difference. Never fails: on error the failure is logged and a
/// copy of `a` is returned.
pub fn xor(a: &Mesh, b: &Mesh, options: &CsgOptions) -> Mesh {
    match boolean(a, b, BooleanOp::Xor, options) {
        Ok(output) => output.mesh,
        Err(err) => {
            warn!("xor failed, returning the left operand unchanged: {err}");
            a.clone()
        }
    }
}

fn select(mesh: &Mesh, classes: &[Classification], keep_inside: bool) -> Vec<Face> {
    mesh.faces()
        .iter()
        .zip(classes)
        .filter(|(_, class)| class.is_inside() == keep_inside)
        .map(|(face, _)| face.clone())
        .collect()
}

/// One pairwise step; `op` is never `Xor`
fn combine(a: &Mesh, b: &Mesh, op: BooleanOp, options: &CsgOptions) -> MeshResult<BooleanOutput> {
    a.check_indices()?;
    b.check_indices()?;
    let tolerance = options.tolerance;
    let mut stats = BooleanStats::default();

    let (faces_a, faces_b) = match op {
        BooleanOp::Union | BooleanOp::Xor => (a.faces().to_vec(), b.faces().to_vec()),
        BooleanOp::Intersection => {
            let classes_a = classify_faces(a, &TriangleSoup::from_mesh(b)?, tolerance);
            stats.a = ClassificationCounts::tally(&classes_a);
            let kept_b = if options.symmetric_intersection {
                let classes_b = classify_faces(b, &TriangleSoup::from_mesh(a)?, tolerance);
                stats.b = ClassificationCounts::tally(&classes_b);
                select(b, &classes_b, true)
            } else {
                Vec::new()
            };
            (select(a, &classes_a, true), kept_b)
        }
        BooleanOp::Difference => {
            let classes_a = classify_faces(a, &TriangleSoup::from_mesh(b)?, tolerance);
            stats.a = ClassificationCounts::tally(&classes_a);
            let cap = if options.cap_difference {
                let classes_b = classify_faces(b, &TriangleSoup::from_mesh(a)?, tolerance);
                stats.b = ClassificationCounts::tally(&classes_b);
                select(b, &classes_b, true).iter().map(Face::flipped).collect()
            } else {
                Vec::new()
            };
            (select(a, &classes_a, false), cap)
        }
    };

    let mut mesh = Mesh::from_raw_parts(a.vertices().to_vec(), Vec::new(), faces_a);
    mesh.merge(&Mesh::from_raw_parts(b.vertices().to_vec(), Vec::new(), faces_b));
    clean_up(&mut mesh, tolerance, &mut stats)?;

    let report = options.validate_result.then(|| validate(&mesh));
    if let Some(report) = report.as_ref().filter(|r| !r.is_valid) {
        warn!("{} result failed validation with {} errors", op, report.errors.len());
    }
    Ok(BooleanOutput { mesh, report, stats })
}

/// Weld, then drop degenerate and duplicate faces and unused vertices
fn clean_up(mesh: &mut Mesh, tolerance: f64, stats: &mut BooleanStats) -> MeshResult<()> {
    let merge = merge_vertices(mesh, tolerance)?;
    stats.welded_vertices = merge.merged;
    stats.degenerate_faces = merge.faces.removed.len();

    let min_area = tolerance * tolerance;
    let positions: Vec<_> = mesh.vertices().iter().map(|v| v.position).collect();
    let flat = mesh.retain_faces(|_, face| {
        let points: Vec<_> = face.vertices.iter().map(|v| positions[v.index()]).collect();
        crate::geometry::newell_vector(&points).norm() * 0.5 > min_area
    });
    stats.degenerate_faces += flat.removed.len();

    let mut seen = AHashSet::new();
    let duplicates = mesh.retain_faces(|_, face| seen.insert(face.canonical_cycle()));
    stats.duplicate_faces = duplicates.removed.len();

    mesh.remove_orphaned_vertices();
    mesh.sync_edges();
    Ok(())
}
