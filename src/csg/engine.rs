// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean engine: CSG operators plus the history ledger

use super::boolean::{boolean, BooleanOp, BooleanOutput};
use super::history::{BooleanHistory, HistoryConfig, HistoryEntry};
use super::CsgOptions;
use crate::error::MeshResult;
use crate::geometry::Mesh;
use tracing::{info, warn};

/// Runs boolean operations and records every successful one
#[derive(Debug, Clone, Default)]
pub struct BooleanEngine {
    options: CsgOptions,
    history: BooleanHistory,
}

impl BooleanEngine {
    pub fn new(options: CsgOptions, history: &HistoryConfig) -> Self {
        Self {
            options,
            history: BooleanHistory::with_config(history),
        }
    }

    pub fn options(&self) -> &CsgOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CsgOptions) {
        self.options = options;
    }

    pub fn history(&self) -> &BooleanHistory {
        &self.history
    }

    /// Apply `op` and record the left operand and the result
    pub fn apply(&mut self, op: BooleanOp, a: &Mesh, b: &Mesh) -> MeshResult<BooleanOutput> {
        let output = boolean(a, b, op, &self.options)?;
        self.history
            .add_entry(HistoryEntry::new(op, a.clone(), output.mesh.clone(), self.options.clone()));
        info!(
            "Applied {} ({} faces), history holds {} entries",
            op,
            output.mesh.face_count(),
            self.history.len()
        );
        Ok(output)
    }

    pub fn union(&mut self, a: &Mesh, b: &Mesh) -> MeshResult<Mesh> {
        Ok(self.apply(BooleanOp::Union, a, b)?.mesh)
    }

    pub fn intersection(&mut self, a: &Mesh, b: &Mesh) -> MeshResult<Mesh> {
        Ok(self.apply(BooleanOp::Intersection, a, b)?.mesh)
    }

    pub fn difference(&mut self, a: &Mesh, b: &Mesh) -> MeshResult<Mesh> {
        Ok(self.apply(BooleanOp::Difference, a, b)?.mesh)
    }

    /// Symmetric difference. Never fails: on error the failure is logged,
    /// nothing is recorded and a copy of `a` is returned.
    pub fn xor(&mut self, a: &Mesh, b: &Mesh) -> Mesh {
        match self.apply(BooleanOp::Xor, a, b) {
            Ok(output) => output.mesh,
            Err(err) => {
                warn!("xor failed, returning the left operand unchanged: {err}");
                a.clone()
            }
        }
    }

    /// Left operand of the most recent operation, or `None` when there is
    /// nothing to undo
    pub fn undo(&mut self) -> Option<Mesh> {
        self.history.undo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Face, Vertex, VertexId};
    use crate::ops::test_support::{cube_at, unit_cube};
    use nalgebra::Point3;

    #[test]
    fn test_operations_are_recorded() {
        let mut engine = BooleanEngine::default();
        let a = unit_cube();
        let b = cube_at(Point3::new(0.6, -0.5, -0.5), 2.0);

        let cut = engine.difference(&a, &b).unwrap();
        assert_eq!(cut.face_count(), 5);
        let joined = engine.union(&cut, &b).unwrap();
        assert_eq!(joined.face_count(), 11);
        assert_eq!(engine.history().len(), 2);
        assert_eq!(engine.history().latest().unwrap().operation, BooleanOp::Union);

        assert_eq!(engine.undo().unwrap().face_count(), 5);
        assert_eq!(engine.undo().unwrap().face_count(), 6);
        assert!(engine.undo().is_none());
    }

    #[test]
    fn test_failures_are_not_recorded() {
        let mut engine = BooleanEngine::new(CsgOptions::default(), &HistoryConfig { max_entries: 2 });
        let broken = Mesh::from_raw_parts(
            vec![Vertex::from_coords(0.0, 0.0, 0.0)],
            Vec::new(),
            vec![Face::new(vec![VertexId::new(0), VertexId::new(1), VertexId::new(2)], 0)],
        );
        assert!(engine.intersection(&unit_cube(), &broken).is_err());
        assert!(engine.history().is_empty());

        for _ in 0..3 {
            engine.xor(&unit_cube(), &unit_cube());
        }
        assert_eq!(engine.history().len(), 2);
        engine.clear_history();
        assert!(engine.undo().is_none());
    }

    #[test]
    fn test_xor_falls_back_to_left_operand() {
        let mut engine = BooleanEngine::default();
        let broken = Mesh::from_raw_parts(
            vec![Vertex::from_coords(0.0, 0.0, 0.0)],
            Vec::new(),
            vec![Face::new(vec![VertexId::new(0), VertexId::new(1), VertexId::new(2)], 0)],
        );
        let cube = unit_cube();

        let result = engine.xor(&cube, &broken);
        assert_eq!(result.counts(), cube.counts());
        assert_eq!(serde_json::to_string(&result).unwrap(), serde_json::to_string(&cube).unwrap());
        assert!(engine.history().is_empty());
    }
}
