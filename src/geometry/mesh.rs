// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh store: owns vertices, edges and faces and keeps their cross references
//! consistent across removals.

use super::types::{Edge, EdgeId, EdgeKey, Face, FaceId, Vertex, VertexId};
use super::BoundingBox;
use crate::error::{MeshError, MeshResult};
use ahash::{AHashMap, AHashSet};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Below this Newell magnitude a loop has no usable normal
const NORMAL_EPSILON: f64 = 1e-12;

/// Indexed polygon mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "MeshRepr")]
pub struct Mesh {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    /// Bumped whenever elements are removed or re-indexed
    revision: u64,
    #[serde(skip)]
    edge_index: AHashMap<EdgeKey, EdgeId>,
}

#[derive(Deserialize)]
struct MeshRepr {
    vertices: Vec<Vertex>,
    #[serde(default)]
    edges: Vec<Edge>,
    faces: Vec<Face>,
    #[serde(default)]
    revision: u64,
}

impl From<MeshRepr> for Mesh {
    fn from(repr: MeshRepr) -> Self {
        let mut mesh = Mesh {
            vertices: repr.vertices,
            edges: repr.edges,
            faces: repr.faces,
            revision: repr.revision,
            edge_index: AHashMap::new(),
        };
        mesh.rebuild_edge_index();
        mesh
    }
}

/// Outcome of [`Mesh::remove_vertex`]
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRemoval {
    /// The removed vertex
    pub vertex: Vertex,
    /// Old vertex index -> new id (None for the removed vertex)
    pub vertex_remap: Vec<Option<VertexId>>,
    /// Faces dropped because they fell below three distinct vertices,
    /// as ids before the removal
    pub removed_faces: Vec<FaceId>,
}

/// Outcome of a compaction that may drop faces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceRemap {
    /// Old face index -> new id (None for dropped faces)
    pub remap: Vec<Option<FaceId>>,
    /// Ids of the dropped faces, as they were before compaction
    pub removed: Vec<FaceId>,
}

impl FaceRemap {
    pub fn get(&self, old: FaceId) -> Option<FaceId> {
        self.remap.get(old.index()).copied().flatten()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            edges: Vec::with_capacity(face_count * 2),
            faces: Vec::with_capacity(face_count),
            revision: 0,
            edge_index: AHashMap::new(),
        }
    }

    /// Assemble a mesh from raw parts without checking any invariant.
    ///
    /// Use [`validate`](crate::validation::validate) before trusting the result.
    pub fn from_raw_parts(vertices: Vec<Vertex>, edges: Vec<Edge>, faces: Vec<Face>) -> Self {
        let mut mesh = Self {
            vertices,
            edges,
            faces,
            revision: 0,
            edge_index: AHashMap::new(),
        };
        mesh.rebuild_edge_index();
        mesh
    }

    /// Build a mesh from positions and polygon loops given as raw indices
    pub fn from_polygons(positions: &[Point3<f64>], loops: &[Vec<usize>]) -> MeshResult<Self> {
        let mut mesh = Self::with_capacity(positions.len(), loops.len());
        for position in positions {
            mesh.add_vertex(Vertex::new(*position));
        }
        for face_loop in loops {
            let ids: Vec<VertexId> = face_loop.iter().copied().map(VertexId::new).collect();
            mesh.add_face(&ids, 0)?;
        }
        Ok(mesh)
    }

    // ------------------------------------------------------------------
    // Counts and lookup
    // ------------------------------------------------------------------

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    /// (vertices, edges, faces)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.vertices.len(), self.edges.len(), self.faces.len())
    }

    /// Structural revision; changes whenever ids may have been invalidated
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    /// Mutable access to vertex attributes. Positions may be edited freely;
    /// topology is unaffected.
    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.index())
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.index())
    }

    /// Mutable access to face attributes (material, normal, uvs, metadata).
    /// Use [`replace_face_loop`](Self::replace_face_loop) to change the loop.
    pub fn face_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.faces.get_mut(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn edge_by_key(&self, key: EdgeKey) -> Option<EdgeId> {
        self.edge_index.get(&key).copied()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len()).map(VertexId::new)
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(FaceId::new)
    }

    pub fn check_vertex(&self, id: VertexId) -> MeshResult<()> {
        if id.index() < self.vertices.len() {
            Ok(())
        } else {
            Err(MeshError::IndexInvalidated {
                kind: "vertex",
                index: id.index(),
                len: self.vertices.len(),
            })
        }
    }

    pub fn check_face(&self, id: FaceId) -> MeshResult<()> {
        if id.index() < self.faces.len() {
            Ok(())
        } else {
            Err(MeshError::IndexInvalidated {
                kind: "face",
                index: id.index(),
                len: self.faces.len(),
            })
        }
    }

    /// Check every face and edge index against the vertex array
    pub fn check_indices(&self) -> MeshResult<()> {
        for face in &self.faces {
            for &v in &face.vertices {
                self.check_vertex(v)?;
            }
        }
        for edge in &self.edges {
            self.check_vertex(edge.v1)?;
            self.check_vertex(edge.v2)?;
        }
        Ok(())
    }

    pub(crate) fn position(&self, id: VertexId) -> Point3<f64> {
        self.vertices[id.index()].position
    }

    pub(crate) fn positions_of(&self, ids: &[VertexId]) -> Vec<Point3<f64>> {
        ids.iter().map(|&id| self.position(id)).collect()
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Add a vertex and return its id
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(vertex);
        id
    }

    /// Add a face from a vertex loop; its boundary edges are registered
    pub fn add_face(&mut self, vertices: &[VertexId], material_index: usize) -> MeshResult<FaceId> {
        self.add_face_with(Face::new(vertices.to_vec(), material_index))
    }

    /// Add a fully specified face
    pub fn add_face_with(&mut self, face: Face) -> MeshResult<FaceId> {
        self.check_loop(&face.vertices)?;
        let id = FaceId::new(self.faces.len());
        self.register_loop_edges(&face.vertices);
        self.faces.push(face);
        Ok(id)
    }

    /// Add an edge; returns the existing id when the canonical key is known
    pub fn add_edge(&mut self, v1: VertexId, v2: VertexId) -> MeshResult<EdgeId> {
        self.check_vertex(v1)?;
        self.check_vertex(v2)?;
        if v1 == v2 {
            return Err(MeshError::invalid_selection(format!(
                "edge endpoints must differ (both are {v1})"
            )));
        }
        Ok(self.insert_edge(v1, v2))
    }

    /// Rewrite the loop of an existing face in place, keeping its id
    pub fn replace_face_loop(&mut self, id: FaceId, vertices: Vec<VertexId>) -> MeshResult<()> {
        self.check_face(id)?;
        self.check_loop(&vertices)?;
        self.register_loop_edges(&vertices);
        let face = &mut self.faces[id.index()];
        if face.uvs.as_ref().map_or(false, |uvs| uvs.len() != vertices.len()) {
            face.uvs = None;
        }
        face.normal = None;
        face.vertices = vertices;
        Ok(())
    }

    /// Replace a face wholesale, keeping its id
    pub fn replace_face(&mut self, id: FaceId, face: Face) -> MeshResult<()> {
        self.check_face(id)?;
        self.check_loop(&face.vertices)?;
        self.register_loop_edges(&face.vertices);
        self.faces[id.index()] = face;
        Ok(())
    }

    fn check_loop(&self, vertices: &[VertexId]) -> MeshResult<()> {
        if vertices.len() < 3 {
            return Err(MeshError::invalid_selection(format!(
                "a face needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        for &v in vertices {
            self.check_vertex(v)?;
        }
        Ok(())
    }

    fn insert_edge(&mut self, v1: VertexId, v2: VertexId) -> EdgeId {
        let key = EdgeKey::new(v1, v2);
        if let Some(&id) = self.edge_index.get(&key) {
            return id;
        }
        let id = EdgeId::new(self.edges.len());
        self.edges.push(Edge::new(v1, v2));
        self.edge_index.insert(key, id);
        id
    }

    fn register_loop_edges(&mut self, vertices: &[VertexId]) {
        let n = vertices.len();
        for i in 0..n {
            let (a, b) = (vertices[i], vertices[(i + 1) % n]);
            if a != b {
                self.insert_edge(a, b);
            }
        }
    }

    fn rebuild_edge_index(&mut self) {
        self.edge_index.clear();
        for (i, edge) in self.edges.iter().enumerate() {
            self.edge_index.entry(edge.key()).or_insert(EdgeId::new(i));
        }
    }

    /// Register every face edge that is missing from the edge list
    pub fn sync_edges(&mut self) {
        let loops: Vec<Vec<VertexId>> = self.faces.iter().map(|f| f.vertices.clone()).collect();
        for face_loop in &loops {
            self.register_loop_edges(face_loop);
        }
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove a face; later faces shift down by one. Edges are kept.
    pub fn remove_face(&mut self, id: FaceId) -> MeshResult<Face> {
        self.check_face(id)?;
        self.revision += 1;
        Ok(self.faces.remove(id.index()))
    }

    /// Remove several faces at once and return the face remap table
    pub fn remove_faces(&mut self, ids: &[FaceId]) -> MeshResult<FaceRemap> {
        for &id in ids {
            self.check_face(id)?;
        }
        let mut drop = vec![false; self.faces.len()];
        for &id in ids {
            drop[id.index()] = true;
        }
        Ok(self.retain_faces(|i, _| !drop[i]))
    }

    /// Keep the faces for which `keep(index, face)` holds, compacting the array
    pub(crate) fn retain_faces<F>(&mut self, mut keep: F) -> FaceRemap
    where
        F: FnMut(usize, &Face) -> bool,
    {
        let old_faces = std::mem::take(&mut self.faces);
        let mut remap = Vec::with_capacity(old_faces.len());
        let mut removed = Vec::new();
        for (i, face) in old_faces.into_iter().enumerate() {
            if keep(i, &face) {
                remap.push(Some(FaceId::new(self.faces.len())));
                self.faces.push(face);
            } else {
                remap.push(None);
                removed.push(FaceId::new(i));
            }
        }
        if !removed.is_empty() {
            self.revision += 1;
        }
        FaceRemap { remap, removed }
    }

    /// Remove edges by key; later edges shift down. Returns how many existed.
    pub fn remove_edges(&mut self, keys: &[EdgeKey]) -> usize {
        if keys.is_empty() {
            return 0;
        }
        let drop: AHashSet<EdgeKey> = keys.iter().copied().collect();
        let before = self.edges.len();
        self.edges.retain(|edge| !drop.contains(&edge.key()));
        let removed = before - self.edges.len();
        if removed > 0 {
            self.rebuild_edge_index();
            self.revision += 1;
        }
        removed
    }

    /// Remove a vertex, dropping it from every face loop and edge that uses it
    pub fn remove_vertex(&mut self, id: VertexId) -> MeshResult<VertexRemoval> {
        self.check_vertex(id)?;
        let vertex = self.vertices[id.index()].clone();
        let mut keep = vec![true; self.vertices.len()];
        keep[id.index()] = false;
        let (vertex_remap, faces) = self.compact_vertices(&keep);
        Ok(VertexRemoval {
            vertex,
            vertex_remap,
            removed_faces: faces.removed,
        })
    }

    /// Drop vertices whose `keep` flag is false and re-index everything.
    ///
    /// Faces lose the dropped corners and disappear once degenerate; edges
    /// touching a dropped vertex are removed.
    pub(crate) fn compact_vertices(&mut self, keep: &[bool]) -> (Vec<Option<VertexId>>, FaceRemap) {
        let mut remap = vec![None; self.vertices.len()];
        let mut next = 0;
        for (i, &k) in keep.iter().enumerate() {
            if k {
                remap[i] = Some(VertexId::new(next));
                next += 1;
            }
        }
        let remap_fn: Vec<Option<VertexId>> = remap.clone();
        let faces = self.remap_vertices(|v| remap_fn.get(v.index()).copied().flatten());

        let old_vertices = std::mem::take(&mut self.vertices);
        self.vertices = old_vertices
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep[*i])
            .map(|(_, v)| v)
            .collect();
        self.revision += 1;
        (remap, faces)
    }

    /// Rewrite every face and edge through `map`. Corners mapping to `None`
    /// are removed, consecutive repeats collapse, and faces left with fewer
    /// than three distinct vertices are dropped.
    pub(crate) fn remap_vertices<F>(&mut self, map: F) -> FaceRemap
    where
        F: Fn(VertexId) -> Option<VertexId>,
    {
        for face in &mut self.faces {
            let before = face.vertices.len();
            let mut kept_uvs = Vec::new();
            let mut vertices = Vec::with_capacity(before);
            for (corner, &v) in face.vertices.iter().enumerate() {
                if let Some(mapped) = map(v) {
                    vertices.push(mapped);
                    if let Some(uvs) = face.uvs.as_ref() {
                        if let Some(uv) = uvs.get(corner) {
                            kept_uvs.push(*uv);
                        }
                    }
                }
            }
            face.uvs = match face.uvs.take() {
                Some(uvs) if uvs.len() == before && kept_uvs.len() == vertices.len() => Some(kept_uvs),
                _ => None,
            };
            face.vertices = vertices;
            face.collapse_repeats();
        }
        let faces = self.retain_faces(|_, face| face.len() >= 3 && !face.is_degenerate());

        let old_edges = std::mem::take(&mut self.edges);
        self.edge_index.clear();
        for edge in old_edges {
            if let (Some(a), Some(b)) = (map(edge.v1), map(edge.v2)) {
                if a != b {
                    self.insert_edge(a, b);
                }
            }
        }
        self.revision += 1;
        faces
    }

    /// Remove vertices not referenced by any face or edge; returns the count
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        let used = self.used_vertices();
        let removed = used.iter().filter(|u| !**u).count();
        if removed > 0 {
            self.compact_vertices(&used);
        }
        removed
    }

    /// Per-vertex flag: referenced by at least one face or edge
    pub fn used_vertices(&self) -> Vec<bool> {
        let mut used = vec![false; self.vertices.len()];
        let mut mark = |v: VertexId| {
            if let Some(slot) = used.get_mut(v.index()) {
                *slot = true;
            }
        };
        for face in &self.faces {
            face.vertices.iter().for_each(|&v| mark(v));
        }
        for edge in &self.edges {
            mark(edge.v1);
            mark(edge.v2);
        }
        used
    }

    // ------------------------------------------------------------------
    // Geometry queries
    // ------------------------------------------------------------------

    /// Unnormalized Newell normal of a loop; its length is twice the area
    pub fn loop_area_vector(&self, vertices: &[VertexId]) -> Vector3<f64> {
        newell_vector(&self.positions_of(vertices))
    }

    /// Unit normal of a loop, `None` if the loop has no area
    pub fn loop_normal(&self, vertices: &[VertexId]) -> Option<Vector3<f64>> {
        let n = self.loop_area_vector(vertices);
        let len = n.norm();
        (len > NORMAL_EPSILON).then(|| n / len)
    }

    pub fn loop_centroid(&self, vertices: &[VertexId]) -> Point3<f64> {
        centroid(&self.positions_of(vertices))
    }

    /// Outward unit normal of a face by the right-hand rule on its loop
    pub fn face_normal(&self, id: FaceId) -> Option<Vector3<f64>> {
        self.face(id).and_then(|f| self.loop_normal(&f.vertices))
    }

    pub fn face_centroid(&self, id: FaceId) -> Option<Point3<f64>> {
        self.face(id).map(|f| self.loop_centroid(&f.vertices))
    }

    /// Area of a planar face
    pub fn face_area(&self, id: FaceId) -> Option<f64> {
        self.face(id)
            .map(|f| self.loop_area_vector(&f.vertices).norm() * 0.5)
    }

    /// Faces incident to each edge, in face order
    pub fn edge_faces(&self) -> AHashMap<EdgeKey, Vec<FaceId>> {
        let mut map: AHashMap<EdgeKey, Vec<FaceId>> = AHashMap::new();
        for (i, face) in self.faces.iter().enumerate() {
            for key in face.edge_keys() {
                let entry = map.entry(key).or_default();
                if entry.last() != Some(&FaceId::new(i)) {
                    entry.push(FaceId::new(i));
                }
            }
        }
        map
    }

    /// Neighbouring vertices through face edges, sorted and deduplicated
    pub fn vertex_neighbors(&self) -> Vec<Vec<VertexId>> {
        let mut neighbors: Vec<Vec<VertexId>> = vec![Vec::new(); self.vertices.len()];
        for face in &self.faces {
            for (a, b) in face.edges() {
                if a == b || a.index() >= neighbors.len() || b.index() >= neighbors.len() {
                    continue;
                }
                neighbors[a.index()].push(b);
                neighbors[b.index()].push(a);
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        neighbors
    }

    /// Faces whose loop contains `v`
    pub fn faces_around_vertex(&self, v: VertexId) -> Vec<FaceId> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.contains(v))
            .map(|(i, _)| FaceId::new(i))
            .collect()
    }

    /// Vertices on edges used by exactly one face
    pub fn boundary_vertices(&self) -> Vec<bool> {
        let mut boundary = vec![false; self.vertices.len()];
        for (key, faces) in self.edge_faces() {
            if faces.len() == 1 {
                for v in [key.lo(), key.hi()] {
                    if let Some(slot) = boundary.get_mut(v.index()) {
                        *slot = true;
                    }
                }
            }
        }
        boundary
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    // ------------------------------------------------------------------
    // Whole-mesh edits
    // ------------------------------------------------------------------

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        for vertex in &mut self.vertices {
            vertex.position = matrix.transform_point(&vertex.position);
            if let Some(normal) = vertex.normal.as_mut() {
                let n = normal_matrix.transform_vector(normal);
                if n.norm() > NORMAL_EPSILON {
                    *normal = n.normalize();
                }
            }
        }
        for face in &mut self.faces {
            if let Some(normal) = face.normal.as_mut() {
                let n = normal_matrix.transform_vector(normal);
                if n.norm() > NORMAL_EPSILON {
                    *normal = n.normalize();
                }
            }
        }
    }

    /// Append another mesh; returns the vertex offset applied to its ids
    pub fn merge(&mut self, other: &Mesh) -> usize {
        let offset = self.vertices.len();
        self.vertices.extend(other.vertices.iter().cloned());
        let shift = |v: VertexId| VertexId::new(v.index() + offset);
        for edge in &other.edges {
            self.insert_edge(shift(edge.v1), shift(edge.v2));
        }
        for face in &other.faces {
            let mut face = face.clone();
            for v in &mut face.vertices {
                *v = shift(*v);
            }
            self.faces.push(face);
        }
        offset
    }

    /// Recompute vertex normals from face geometry (area weighted)
    pub fn recompute_normals(&mut self) {
        let mut sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];
        for face in &self.faces {
            if face.vertices.iter().any(|v| v.index() >= self.vertices.len()) {
                continue;
            }
            let area_vector = self.loop_area_vector(&face.vertices);
            if area_vector.norm() <= NORMAL_EPSILON {
                continue;
            }
            for &v in &face.vertices {
                sums[v.index()] += area_vector;
            }
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            let len = sum.norm();
            vertex.normal = (len > NORMAL_EPSILON).then(|| sum / len);
        }
    }

    /// Clear all vertex normals
    pub fn clear_normals(&mut self) {
        for vertex in &mut self.vertices {
            vertex.normal = None;
        }
    }

    /// Vertex array for in-crate algorithms that rebuild geometry wholesale
    pub(crate) fn vertices_mut(&mut self) -> &mut Vec<Vertex> {
        &mut self.vertices
    }

    pub(crate) fn faces_mut(&mut self) -> &mut Vec<Face> {
        &mut self.faces
    }

    pub(crate) fn edges_mut(&mut self) -> &mut Vec<Edge> {
        &mut self.edges
    }

    /// Re-derive the edge lookup after in-crate code edited `edges_mut`
    pub(crate) fn reindex_edges(&mut self) {
        self.rebuild_edge_index();
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }
}

/// Newell's method: robust (unnormalized) normal for any simple polygon
pub fn newell_vector(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Arithmetic mean of a point set (origin for an empty set)
pub fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Mesh {
        Mesh::from_polygons(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_add_face_registers_edges() {
        let mesh = quad();
        assert_eq!(mesh.edge_count(), 4);
        let key = EdgeKey::new(VertexId::new(3), VertexId::new(0));
        assert!(mesh.edge_by_key(key).is_some());
    }

    #[test]
    fn test_add_face_rejects_bad_loops() {
        let mut mesh = quad();
        let short = [VertexId::new(0), VertexId::new(1)];
        assert!(matches!(
            mesh.add_face(&short, 0),
            Err(MeshError::InvalidSelection { .. })
        ));
        let out_of_range = [VertexId::new(0), VertexId::new(1), VertexId::new(9)];
        assert!(matches!(
            mesh.add_face(&out_of_range, 0),
            Err(MeshError::IndexInvalidated { index: 9, .. })
        ));
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let mut mesh = quad();
        let a = mesh.add_edge(VertexId::new(0), VertexId::new(2)).unwrap();
        let b = mesh.add_edge(VertexId::new(2), VertexId::new(0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(mesh.edge_count(), 5);
        assert!(mesh.add_edge(VertexId::new(1), VertexId::new(1)).is_err());
    }

    #[test]
    fn test_face_normal_and_area() {
        let mesh = quad();
        let normal = mesh.face_normal(FaceId::new(0)).unwrap();
        assert_relative_eq!(normal, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(mesh.face_area(FaceId::new(0)).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            mesh.face_centroid(FaceId::new(0)).unwrap(),
            Point3::new(0.5, 0.5, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_remove_vertex_updates_faces_and_edges() {
        let mut mesh = quad();
        let revision = mesh.revision();
        let removal = mesh.remove_vertex(VertexId::new(1)).unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.revision() > revision);
        assert_eq!(removal.vertex_remap[1], None);
        assert_eq!(removal.vertex_remap[2], Some(VertexId::new(1)));
        // The quad shrinks to a triangle over the remaining vertices
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(
            mesh.faces()[0].vertices,
            vec![VertexId::new(0), VertexId::new(1), VertexId::new(2)]
        );
        // Edges touching the removed vertex are gone, the rest are re-indexed
        assert!(mesh.check_indices().is_ok());
        assert_eq!(mesh.edge_count(), 2);
    }

    #[test]
    fn test_remove_vertex_drops_degenerate_face() {
        let mut mesh = Mesh::from_polygons(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[vec![0, 1, 2]],
        )
        .unwrap();
        let removal = mesh.remove_vertex(VertexId::new(0)).unwrap();
        assert_eq!(removal.removed_faces, vec![FaceId::new(0)]);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_remove_edges() {
        let mut mesh = quad();
        let key = EdgeKey::new(VertexId::new(0), VertexId::new(1));
        assert_eq!(mesh.remove_edges(&[key, key]), 1);
        assert_eq!(mesh.edge_count(), 3);
        assert!(mesh.edge_by_key(key).is_none());
        let other = EdgeKey::new(VertexId::new(1), VertexId::new(2));
        assert_eq!(mesh.edge(mesh.edge_by_key(other).unwrap()).unwrap().key(), other);
    }

    #[test]
    fn test_stale_ids_are_reported() {
        let mut mesh = quad();
        mesh.remove_face(FaceId::new(0)).unwrap();
        assert!(matches!(
            mesh.remove_face(FaceId::new(0)),
            Err(MeshError::IndexInvalidated { kind: "face", .. })
        ));
        assert!(mesh.vertex(VertexId::new(10)).is_none());
    }

    #[test]
    fn test_clone_is_deep() {
        let mut original = quad();
        original
            .vertex_mut(VertexId::new(0))
            .unwrap()
            .metadata
            .insert("tag".into(), serde_json::json!("a"));
        let mut copy = original.clone();
        copy.vertex_mut(VertexId::new(0))
            .unwrap()
            .metadata
            .insert("tag".into(), serde_json::json!("b"));
        copy.vertex_mut(VertexId::new(1)).unwrap().position.x = 42.0;

        assert_eq!(original.vertices()[0].metadata["tag"], serde_json::json!("a"));
        assert_eq!(original.vertices()[1].position.x, 1.0);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = quad();
        let b = quad();
        let offset = a.merge(&b);
        assert_eq!(offset, 4);
        assert_eq!(a.face_count(), 2);
        assert_eq!(a.faces()[1].vertices[0], VertexId::new(4));
        assert!(a.check_indices().is_ok());
    }

    #[test]
    fn test_remove_orphaned_vertices() {
        let mut mesh = quad();
        mesh.add_vertex(Vertex::from_coords(5.0, 5.0, 5.0));
        assert_eq!(mesh.remove_orphaned_vertices(), 1);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_serde_round_trip_rebuilds_edge_index() {
        let mesh = quad();
        let json = serde_json::to_string(&mesh).unwrap();
        let restored: Mesh = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.face_count(), 1);
        let key = EdgeKey::new(VertexId::new(0), VertexId::new(1));
        assert!(restored.edge_by_key(key).is_some());
    }

    #[test]
    fn test_recompute_normals() {
        let mut mesh = quad();
        mesh.recompute_normals();
        for vertex in mesh.vertices() {
            assert_relative_eq!(vertex.normal.unwrap(), Vector3::z(), epsilon = 1e-12);
        }
    }
}
