// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types shared by the mesh store, operators and CSG engine

use thiserror::Error;

/// Errors produced by mesh editing operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// A selection referenced an element that does not exist, or was empty
    /// where at least one element is required.
    #[error("invalid selection: {details}")]
    InvalidSelection {
        /// What was wrong with the selection
        details: String,
    },

    /// An id no longer refers to a live element of the mesh.
    #[error("{kind} index {index} is invalid (mesh has {len})")]
    IndexInvalidated {
        /// Element kind ("vertex", "face", "edge")
        kind: &'static str,
        /// Offending index
        index: usize,
        /// Number of live elements of that kind
        len: usize,
    },

    /// Two inputs that must have the same number of vertices do not.
    #[error("vertex count mismatch: expected {expected}, got {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },

    /// An option value is outside the domain the operator accepts.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Geometry an operator needs to reason about is degenerate.
    #[error("degenerate geometry: {details}")]
    DegenerateGeometry { details: String },
}

impl MeshError {
    pub fn invalid_selection(details: impl Into<String>) -> Self {
        Self::InvalidSelection {
            details: details.into(),
        }
    }

    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn degenerate(details: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            details: details.into(),
        }
    }
}

/// Result alias used throughout the library
pub type MeshResult<T> = Result<T, MeshError>;
