// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Validation result types

use serde::{Deserialize, Serialize};

/// The independent passes a validation run is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPass {
    Topology,
    Geometry,
    Uv,
    Normals,
}

impl CheckPass {
    pub const ALL: [CheckPass; 4] = [
        CheckPass::Topology,
        CheckPass::Geometry,
        CheckPass::Uv,
        CheckPass::Normals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckPass::Topology => "topology",
            CheckPass::Geometry => "geometry",
            CheckPass::Uv => "uv",
            CheckPass::Normals => "normals",
        }
    }
}

/// Errors and warnings collected by one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassFindings {
    pub pass: CheckPass,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl PassFindings {
    pub fn new(pass: CheckPass) -> Self {
        Self {
            pass,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(format!("[{}] {}", self.pass.as_str(), message.into()));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(format!("[{}] {}", self.pass.as_str(), message.into()));
    }
}

/// Outcome of validating a mesh. `is_valid` holds iff `errors` is empty;
/// warnings never fail a mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub vertex_count: usize,
    pub edge_count: usize,
    pub face_count: usize,
}

impl ValidationReport {
    pub fn new(vertex_count: usize, edge_count: usize, face_count: usize) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            vertex_count,
            edge_count,
            face_count,
        }
    }

    /// Union the findings of one pass into the report
    pub fn absorb(&mut self, findings: PassFindings) {
        self.errors.extend(findings.errors);
        self.warnings.extend(findings.warnings);
        self.is_valid = self.errors.is_empty();
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Findings of a single pass, errors first
    pub fn findings_for(&self, pass: CheckPass) -> Vec<&str> {
        let prefix = format!("[{}]", pass.as_str());
        self.errors
            .iter()
            .chain(&self.warnings)
            .filter(|m| m.starts_with(&prefix))
            .map(String::as_str)
            .collect()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}
