// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Element types stored by the mesh: vertices, edges, faces and their handles

use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form per-element metadata
pub type Metadata = BTreeMap<String, serde_json::Value>;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Position of the element in its mesh array
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a vertex of a [`Mesh`](super::Mesh)
    VertexId
);
define_id!(
    /// Handle to a face of a [`Mesh`](super::Mesh)
    FaceId
);
define_id!(
    /// Handle to an edge of a [`Mesh`](super::Mesh)
    EdgeId
);

/// RGBA vertex color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// Vertex with position and optional shading attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<Vector3<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<Vector2<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Vertex {
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
            uv: None,
            color: None,
            metadata: Metadata::new(),
        }
    }

    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    pub fn with_normal(mut self, normal: Vector3<f64>) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_uv(mut self, uv: Vector2<f64>) -> Self {
        self.uv = Some(uv);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Copy of this vertex moved to `position`, keeping every attribute
    pub fn moved_to(&self, position: Point3<f64>) -> Vertex {
        let mut vertex = self.clone();
        vertex.position = position;
        vertex
    }

    /// Interpolate position and attributes towards `other`.
    ///
    /// Attributes are only interpolated when both ends carry them; metadata is
    /// taken from `self`.
    pub fn lerp(&self, other: &Vertex, t: f64) -> Vertex {
        let position = self.position + (other.position - self.position) * t;
        let normal = match (self.normal, other.normal) {
            (Some(a), Some(b)) => {
                let n = a.lerp(&b, t);
                let len = n.norm();
                if len > 1e-12 {
                    Some(n / len)
                } else {
                    Some(a)
                }
            }
            _ => None,
        };
        let uv = match (self.uv, other.uv) {
            (Some(a), Some(b)) => Some(a.lerp(&b, t)),
            _ => None,
        };
        let color = match (self.color, other.color) {
            (Some(a), Some(b)) => Some(a.lerp(&b, t as f32)),
            _ => None,
        };

        Vertex {
            position,
            normal,
            uv,
            color,
            metadata: self.metadata.clone(),
        }
    }
}

/// Order-independent edge key: always `(min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    a: VertexId,
    b: VertexId,
}

impl EdgeKey {
    pub fn new(v1: VertexId, v2: VertexId) -> Self {
        if v1 <= v2 {
            Self { a: v1, b: v2 }
        } else {
            Self { a: v2, b: v1 }
        }
    }

    /// Lower endpoint
    pub fn lo(&self) -> VertexId {
        self.a
    }

    /// Higher endpoint
    pub fn hi(&self) -> VertexId {
        self.b
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.a == v || self.b == v
    }

    /// The endpoint opposite to `v`, if `v` is an endpoint
    pub fn other(&self, v: VertexId) -> Option<VertexId> {
        if self.a == v {
            Some(self.b)
        } else if self.b == v {
            Some(self.a)
        } else {
            None
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// Edge between two vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub v1: VertexId,
    pub v2: VertexId,
}

impl Edge {
    pub fn new(v1: VertexId, v2: VertexId) -> Self {
        Self { v1, v2 }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.v1, self.v2)
    }
}

/// Polygon face: an ordered loop of vertex ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: Vec<VertexId>,
    #[serde(default)]
    pub material_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<Vector3<f64>>,
    /// Per-corner UVs, parallel to `vertices`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<Vector2<f64>>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Face {
    pub fn new(vertices: Vec<VertexId>, material_index: usize) -> Self {
        Self {
            vertices,
            material_index,
            normal: None,
            uvs: None,
            metadata: Metadata::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Directed boundary edges in loop order, closing back to the first vertex
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges().map(|(a, b)| EdgeKey::new(a, b))
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    /// Number of distinct vertex ids in the loop
    pub fn distinct_count(&self) -> usize {
        let mut ids = self.vertices.clone();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// True when fewer than three distinct vertices remain
    pub fn is_degenerate(&self) -> bool {
        self.distinct_count() < 3
    }

    /// A face sharing this face's material and metadata but with a new loop.
    ///
    /// Per-corner UVs and the explicit normal do not survive a loop change.
    pub fn with_loop(&self, vertices: Vec<VertexId>) -> Face {
        Face {
            vertices,
            material_index: self.material_index,
            normal: None,
            uvs: None,
            metadata: self.metadata.clone(),
        }
    }

    /// Reverse the winding in place
    pub fn flip(&mut self) {
        self.vertices.reverse();
        if let Some(uvs) = self.uvs.as_mut() {
            uvs.reverse();
        }
        if let Some(normal) = self.normal.as_mut() {
            *normal = -*normal;
        }
    }

    pub fn flipped(&self) -> Face {
        let mut face = self.clone();
        face.flip();
        face
    }

    /// Remove consecutive repeats (including the wrap-around pair)
    pub fn collapse_repeats(&mut self) {
        let mut kept: Vec<usize> = Vec::with_capacity(self.vertices.len());
        for (i, v) in self.vertices.iter().enumerate() {
            if kept.last().map_or(true, |&k| self.vertices[k] != *v) {
                kept.push(i);
            }
        }
        while kept.len() > 1 && kept.last().map(|&k| self.vertices[k]) == Some(self.vertices[kept[0]]) {
            kept.pop();
        }
        if kept.len() == self.vertices.len() {
            return;
        }

        let uvs = match self.uvs.take() {
            Some(uvs) if uvs.len() == self.vertices.len() => {
                Some(kept.iter().map(|&k| uvs[k]).collect())
            }
            _ => None,
        };
        self.vertices = kept.iter().map(|&k| self.vertices[k]).collect();
        self.uvs = uvs;
    }

    /// Loop rotated so the smallest id comes first; equal for faces that are
    /// the same cycle starting at a different corner.
    pub fn canonical_cycle(&self) -> Vec<VertexId> {
        let Some((start, _)) = self.vertices.iter().enumerate().min_by_key(|(_, v)| **v) else {
            return Vec::new();
        };
        let n = self.vertices.len();
        (0..n).map(|i| self.vertices[(start + i) % n]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[usize]) -> Vec<VertexId> {
        raw.iter().copied().map(VertexId::new).collect()
    }

    #[test]
    fn test_edge_key_is_order_independent() {
        let a = EdgeKey::new(VertexId::new(5), VertexId::new(2));
        let b = EdgeKey::new(VertexId::new(2), VertexId::new(5));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2-5");
        assert_eq!(a.other(VertexId::new(2)), Some(VertexId::new(5)));
        assert_eq!(a.other(VertexId::new(9)), None);

        let keys = vec![a, EdgeKey::new(VertexId::new(7), VertexId::new(3))];
        let endpoints: Vec<_> = keys.into_iter().map(|key| (key.lo().index(), key.hi().index())).collect();
        assert_eq!(endpoints, vec![(2, 5), (3, 7)]);
    }

    #[test]
    fn test_collapse_repeats_with_wraparound() {
        let mut face = Face::new(ids(&[1, 1, 2, 3, 1]), 0);
        face.collapse_repeats();
        assert_eq!(face.vertices, ids(&[1, 2, 3]));

        let mut face = Face::new(ids(&[4, 4, 4]), 0);
        face.collapse_repeats();
        assert_eq!(face.vertices, ids(&[4]));
        assert!(face.is_degenerate());
    }

    #[test]
    fn test_canonical_cycle_ignores_rotation() {
        let a = Face::new(ids(&[3, 7, 1, 5]), 0);
        let b = Face::new(ids(&[1, 5, 3, 7]), 0);
        assert_eq!(a.canonical_cycle(), b.canonical_cycle());

        // Reversed winding is a different cycle
        let c = Face::new(ids(&[5, 1, 7, 3]), 0);
        assert_ne!(a.canonical_cycle(), c.canonical_cycle());
    }

    #[test]
    fn test_flip_reverses_uvs_and_normal() {
        let mut face = Face::new(ids(&[0, 1, 2]), 0);
        face.uvs = Some(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
        ]);
        face.normal = Some(Vector3::z());
        face.flip();
        assert_eq!(face.vertices, ids(&[2, 1, 0]));
        assert_eq!(face.uvs.as_ref().unwrap()[0], Vector2::new(0.0, 1.0));
        assert_eq!(face.normal, Some(-Vector3::z()));
    }

    #[test]
    fn test_vertex_lerp_only_blends_shared_attributes() {
        let a = Vertex::from_coords(0.0, 0.0, 0.0).with_uv(Vector2::new(0.0, 0.0));
        let b = Vertex::from_coords(2.0, 0.0, 0.0)
            .with_uv(Vector2::new(1.0, 1.0))
            .with_normal(Vector3::y());
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.position, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mid.uv, Some(Vector2::new(0.5, 0.5)));
        assert_eq!(mid.normal, None);
    }
}
