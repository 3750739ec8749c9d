// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh store, element types and triangulation

mod bbox;
mod mesh;
pub mod triangulate;
mod types;

pub use bbox::BoundingBox;
pub use mesh::{centroid, newell_vector, FaceRemap, Mesh, VertexRemoval};
pub use triangulate::{triangulate, triangulate_faces, triangulate_indices, triangulate_polygon};
pub use types::{Color, Edge, EdgeId, EdgeKey, Face, FaceId, Metadata, Vertex, VertexId};
