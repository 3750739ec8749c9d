// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyedit mesh kernel
//!
//! A headless, in-memory polygon mesh editing kernel: an indexed
//! vertex/edge/face store, topology operators (extrude, inset, bevel, bridge,
//! subdivision, vertex merge, triangulation), a heuristic face-level CSG
//! engine with an undo ledger, and validation and repair passes.

pub mod config;
pub mod csg;
pub mod error;
pub mod geometry;
pub mod ops;
pub mod utils;
pub mod validation;

pub use config::KernelConfig;
pub use csg::{BooleanEngine, BooleanOp, CsgOptions};
pub use error::{MeshError, MeshResult};
pub use geometry::{Edge, EdgeId, EdgeKey, Face, FaceId, Mesh, Vertex, VertexId};
pub use ops::EditResult;
pub use validation::{repair, validate, ValidationConfig, ValidationReport};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::unit_cube;
    use crate::ops::{bevel_faces, extrude_faces, ExtrudeOptions, FaceBevelOptions};

    #[test]
    fn test_operators_compose() {
        let mut mesh = unit_cube();
        let extruded = extrude_faces(&mut mesh, &[FaceId::new(0)], &ExtrudeOptions::default()).unwrap();
        bevel_faces(&mut mesh, &extruded.top_faces, &FaceBevelOptions::default()).unwrap();

        let report = validate(&mesh);
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(!report.has_warnings(), "{:?}", report.warnings);
    }
}
