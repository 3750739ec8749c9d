// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounded ledger of boolean operations with single-step undo

use super::{BooleanOp, CsgOptions};
use crate::geometry::Mesh;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Oldest entries are evicted beyond this many
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 50 }
    }
}

/// One recorded operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub operation: BooleanOp,
    pub timestamp: DateTime<Utc>,
    /// Left operand before the operation
    pub original_mesh: Mesh,
    pub result_mesh: Mesh,
    pub options: CsgOptions,
}

impl HistoryEntry {
    pub fn new(operation: BooleanOp, original_mesh: Mesh, result_mesh: Mesh, options: CsgOptions) -> Self {
        Self {
            operation,
            timestamp: Utc::now(),
            original_mesh,
            result_mesh,
            options,
        }
    }
}

/// Append-only ring of the most recent boolean operations. No redo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredHistory")]
pub struct BooleanHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

/// Serialized form; capacity is enforced when it is turned back into a ledger
#[derive(Deserialize)]
struct StoredHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl From<StoredHistory> for BooleanHistory {
    fn from(stored: StoredHistory) -> Self {
        let mut history = Self::new(stored.max_entries);
        for entry in stored.entries {
            history.add_entry(entry);
        }
        history
    }
}

impl Default for BooleanHistory {
    fn default() -> Self {
        Self::with_config(&HistoryConfig::default())
    }
}

impl BooleanHistory {
    /// A capacity of zero records nothing
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries.min(64)),
            max_entries,
        }
    }

    pub fn with_config(config: &HistoryConfig) -> Self {
        Self::new(config.max_entries)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Append, evicting the oldest entries beyond capacity
    pub fn add_entry(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            if let Some(evicted) = self.entries.pop_front() {
                debug!("History full, evicted {} from {}", evicted.operation, evicted.timestamp);
            }
        }
    }

    /// Pop the newest entry and hand back the mesh it started from
    pub fn undo(&mut self) -> Option<Mesh> {
        self.entries.pop_back().map(|entry| entry.original_mesh)
    }

    pub fn clear_history(&mut self) {
        self.entries.clear();
    }

    /// Entries, oldest first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vertex;
    use crate::ops::test_support::unit_cube;

    fn marked(n: usize) -> Mesh {
        let mut mesh = Mesh::new();
        for i in 0..n {
            mesh.add_vertex(Vertex::from_coords(i as f64, 0.0, 0.0));
        }
        mesh
    }

    fn entry(original: Mesh) -> HistoryEntry {
        HistoryEntry::new(BooleanOp::Union, original, unit_cube(), CsgOptions::default())
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = BooleanHistory::new(3);
        for i in 1..=5 {
            history.add_entry(entry(marked(i)));
            assert!(history.len() <= 3);
        }
        assert_eq!(history.len(), 3);
        let sizes: Vec<usize> = history.history().map(|e| e.original_mesh.vertex_count()).collect();
        assert_eq!(sizes, vec![3, 4, 5]);
    }

    #[test]
    fn test_undo_pops_newest() {
        let mut history = BooleanHistory::default();
        assert_eq!(history.max_entries(), 50);
        history.add_entry(entry(marked(1)));
        history.add_entry(entry(marked(2)));

        assert_eq!(history.undo().map(|m| m.vertex_count()), Some(2));
        assert_eq!(history.undo().map(|m| m.vertex_count()), Some(1));
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let mut history = BooleanHistory::new(0);
        history.add_entry(entry(marked(1)));
        assert!(history.is_empty());

        let mut history = BooleanHistory::new(2);
        history.add_entry(entry(marked(1)));
        history.clear_history();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_json_dump() {
        let mut history = BooleanHistory::new(4);
        history.add_entry(entry(marked(2)));
        let json = history.to_json().unwrap();
        assert!(json.contains("\"operation\": \"union\""));

        let restored: BooleanHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 1);
        let latest = restored.latest().unwrap();
        assert_eq!(latest.original_mesh.vertex_count(), 2);
        assert_eq!(latest.result_mesh.face_count(), 6);
        assert_eq!(latest.timestamp, history.latest().unwrap().timestamp);
    }

    #[test]
    fn test_reload_enforces_capacity() {
        let mut history = BooleanHistory::new(4);
        for i in 1..=4 {
            history.add_entry(entry(marked(i)));
        }
        let mut value = serde_json::to_value(&history).unwrap();
        value["max_entries"] = serde_json::json!(2);

        let restored: BooleanHistory = serde_json::from_value(value).unwrap();
        assert_eq!(restored.max_entries(), 2);
        let sizes: Vec<usize> = restored.history().map(|e| e.original_mesh.vertex_count()).collect();
        assert_eq!(sizes, vec![3, 4]);
    }
}
