// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Heuristic CSG: ray-cast face classification, boolean operators and the
//! history ledger that records them

pub mod boolean;
pub mod classify;
pub mod engine;
pub mod history;
pub mod ray;

pub use boolean::{boolean, difference, intersection, union, xor, BooleanOp, BooleanOutput, BooleanStats};
pub use classify::{classify_against, classify_faces, ClassificationCounts};
pub use engine::BooleanEngine;
pub use history::{BooleanHistory, HistoryConfig, HistoryEntry};
pub use ray::{intersect_triangle, point_in_mesh, ray_hits, Classification, Ray, TriangleHit, TriangleSoup};

use crate::error::{MeshError, MeshResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsgOptions {
    /// Weld distance and ray epsilon
    pub tolerance: f64,
    /// Intersection keeps faces of both operands instead of the left one only
    pub symmetric_intersection: bool,
    /// Difference closes the cut with the cutter's inside faces, reversed
    pub cap_difference: bool,
    pub validate_result: bool,
}

impl Default for CsgOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            symmetric_intersection: true,
            cap_difference: false,
            validate_result: false,
        }
    }
}

impl CsgOptions {
    pub fn check(&self) -> MeshResult<()> {
        if self.tolerance.is_finite() && self.tolerance >= 0.0 {
            Ok(())
        } else {
            Err(MeshError::invalid_parameter(
                "tolerance",
                format!("must be a non-negative finite value, got {}", self.tolerance),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_partial_toml() {
        let options: CsgOptions = toml::from_str("cap_difference = true").unwrap();
        assert!(options.cap_difference);
        assert_eq!(options.tolerance, 1e-6);
        assert!(options.symmetric_intersection);
        assert!(options.check().is_ok());
    }

    #[test]
    fn test_nan_tolerance_rejected() {
        let options = CsgOptions {
            tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(options.check().is_err());
    }
}
