// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face subdivision

use super::select_faces;
use super::smooth::{smooth_masked, SmoothingOptions};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{EdgeKey, Face, FaceId, Mesh, Vertex, VertexId};
use ahash::AHashMap;
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Topological split rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubdivisionScheme {
    /// Every n-gon becomes n quads around its centroid
    #[default]
    CatmullClark,
    /// Triangles split into four at their edge midpoints; other polygons
    /// fall back to the quad split
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivideOptions {
    pub scheme: SubdivisionScheme,
    pub levels: u32,
    /// Optional Laplacian pass over the subdivided region
    pub smoothing: Option<SmoothingOptions>,
    /// Refuse to produce more faces than this
    pub max_faces: usize,
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self {
            scheme: SubdivisionScheme::CatmullClark,
            levels: 1,
            smoothing: None,
            max_faces: 4_000_000,
        }
    }
}

/// A subdivided copy and the faces that came out of the selection
#[derive(Debug, Clone)]
pub struct SubdivisionResult {
    pub mesh: Mesh,
    /// Ids (in `mesh`) of the faces produced from the selected faces
    pub faces: Vec<FaceId>,
}

/// Subdivide every face of the mesh
pub fn subdivide_surface(mesh: &Mesh, options: &SubdivideOptions) -> MeshResult<Mesh> {
    let all: Vec<FaceId> = mesh.face_ids().collect();
    Ok(subdivide_faces(mesh, &all, options)?.mesh)
}

/// Subdivide the selected faces into a new mesh.
///
/// Unselected faces that share an edge with the selection get the edge
/// midpoint inserted into their loop, so the result has no T-junctions.
pub fn subdivide_faces(mesh: &Mesh, faces: &[FaceId], options: &SubdivideOptions) -> MeshResult<SubdivisionResult> {
    if options.levels == 0 {
        return Err(MeshError::invalid_parameter("levels", "must be at least 1"));
    }
    mesh.check_indices()?;
    let selected = select_faces(mesh, faces)?;

    let mut flags = vec![false; mesh.face_count()];
    for id in &selected {
        flags[id.index()] = true;
    }

    let mut current = mesh.clone();
    for level in 0..options.levels {
        let projected = projected_face_count(&current, &flags, options.scheme);
        if projected > options.max_faces {
            return Err(MeshError::invalid_parameter(
                "levels",
                format!(
                    "level {} would produce {} faces (limit {})",
                    level + 1,
                    projected,
                    options.max_faces
                ),
            ));
        }
        let (next, next_flags) = subdivide_once(&current, &flags, options.scheme);
        debug!(
            "Subdivision level {}: {} -> {} faces",
            level + 1,
            current.face_count(),
            next.face_count()
        );
        current = next;
        flags = next_flags;
    }

    if let Some(smoothing) = options.smoothing.as_ref() {
        let movable = interior_of_selection(&current, &flags);
        current = smooth_masked(&current, &movable, smoothing)?;
    }

    let faces: Vec<FaceId> = flags
        .iter()
        .enumerate()
        .filter(|(_, f)| **f)
        .map(|(i, _)| FaceId::new(i))
        .collect();
    info!(
        "Subdivided {} faces over {} levels into {} faces",
        selected.len(),
        options.levels,
        faces.len()
    );
    Ok(SubdivisionResult { mesh: current, faces })
}

fn projected_face_count(mesh: &Mesh, flags: &[bool], scheme: SubdivisionScheme) -> usize {
    mesh.faces()
        .iter()
        .zip(flags)
        .map(|(face, &selected)| match (selected, scheme) {
            (false, _) => 1,
            (true, SubdivisionScheme::Loop) if face.len() == 3 => 4,
            (true, _) => face.len(),
        })
        .sum()
}

fn subdivide_once(mesh: &Mesh, flags: &[bool], scheme: SubdivisionScheme) -> (Mesh, Vec<bool>) {
    let mut vertices = mesh.vertices().to_vec();

    let mut midpoints: AHashMap<EdgeKey, VertexId> = AHashMap::new();
    for (face, _) in mesh.faces().iter().zip(flags).filter(|(_, f)| **f) {
        for key in face.edge_keys() {
            if key.lo() == key.hi() || midpoints.contains_key(&key) {
                continue;
            }
            let mid = vertices[key.lo().index()].lerp(&vertices[key.hi().index()], 0.5);
            midpoints.insert(key, VertexId::new(vertices.len()));
            vertices.push(mid);
        }
    }

    let mut faces = Vec::with_capacity(mesh.face_count() * 4);
    let mut child_flags = Vec::with_capacity(mesh.face_count() * 4);
    for (face, &selected) in mesh.faces().iter().zip(flags) {
        if selected {
            let children = match scheme {
                SubdivisionScheme::Loop if face.len() == 3 => split_triangle(face, &midpoints),
                _ => split_around_centre(face, &midpoints, &mut vertices),
            };
            child_flags.extend(std::iter::repeat(true).take(children.len()));
            faces.extend(children);
        } else {
            faces.push(with_midpoints(face, &midpoints));
            child_flags.push(false);
        }
    }

    let mut result = Mesh::from_raw_parts(vertices, Vec::new(), faces);
    result.sync_edges();
    (result, child_flags)
}

fn midpoint(midpoints: &AHashMap<EdgeKey, VertexId>, a: VertexId, b: VertexId) -> VertexId {
    midpoints.get(&EdgeKey::new(a, b)).copied().unwrap_or(a)
}

fn split_triangle(face: &Face, midpoints: &AHashMap<EdgeKey, VertexId>) -> Vec<Face> {
    let [a, b, c] = [face.vertices[0], face.vertices[1], face.vertices[2]];
    let ab = midpoint(midpoints, a, b);
    let bc = midpoint(midpoints, b, c);
    let ca = midpoint(midpoints, c, a);
    vec![
        face.with_loop(vec![a, ab, ca]),
        face.with_loop(vec![b, bc, ab]),
        face.with_loop(vec![c, ca, bc]),
        face.with_loop(vec![ab, bc, ca]),
    ]
}

fn split_around_centre(face: &Face, midpoints: &AHashMap<EdgeKey, VertexId>, vertices: &mut Vec<Vertex>) -> Vec<Face> {
    let corners: Vec<&Vertex> = face.vertices.iter().map(|v| &vertices[v.index()]).collect();
    let centre_vertex = average_vertex(&corners);
    let centre = VertexId::new(vertices.len());
    vertices.push(centre_vertex);

    let n = face.len();
    let mids: Vec<VertexId> = (0..n)
        .map(|i| midpoint(midpoints, face.vertices[i], face.vertices[(i + 1) % n]))
        .collect();
    (0..n)
        .map(|i| face.with_loop(vec![face.vertices[i], mids[i], centre, mids[(i + n - 1) % n]]))
        .collect()
}

/// Insert the midpoints of split edges into a face that is not subdivided
fn with_midpoints(face: &Face, midpoints: &AHashMap<EdgeKey, VertexId>) -> Face {
    let mut new_loop = Vec::with_capacity(face.len() * 2);
    for (a, b) in face.edges() {
        new_loop.push(a);
        if let Some(&mid) = midpoints.get(&EdgeKey::new(a, b)) {
            new_loop.push(mid);
        }
    }
    if new_loop.len() == face.len() {
        face.clone()
    } else {
        face.with_loop(new_loop)
    }
}

/// Average position; other attributes only when every corner has them
fn average_vertex(corners: &[&Vertex]) -> Vertex {
    let count = corners.len().max(1) as f64;
    let position = corners
        .iter()
        .fold(Vector3::zeros(), |acc, v| acc + v.position.coords)
        / count;
    let mut vertex = Vertex::new(Point3::from(position));

    if corners.iter().all(|v| v.normal.is_some()) {
        let sum = corners
            .iter()
            .filter_map(|v| v.normal)
            .fold(Vector3::zeros(), |acc, n| acc + n);
        vertex.normal = sum.try_normalize(1e-12);
    }
    if corners.iter().all(|v| v.uv.is_some()) {
        let sum = corners
            .iter()
            .filter_map(|v| v.uv)
            .fold(Vector2::zeros(), |acc, uv| acc + uv);
        vertex.uv = Some(sum / count);
    }
    if let Some(first) = corners.first().and_then(|v| v.color) {
        if corners.iter().all(|v| v.color.is_some()) {
            let mut color = first;
            for (i, c) in corners.iter().filter_map(|v| v.color).enumerate().skip(1) {
                color = color.lerp(&c, 1.0 / (i as f32 + 1.0));
            }
            vertex.color = Some(color);
        }
    }
    vertex
}

/// Vertices used only by faces that came out of the selection
fn interior_of_selection(mesh: &Mesh, flags: &[bool]) -> Vec<bool> {
    let mut inside = vec![false; mesh.vertex_count()];
    let mut outside = vec![false; mesh.vertex_count()];
    for (face, &selected) in mesh.faces().iter().zip(flags) {
        let target = if selected { &mut inside } else { &mut outside };
        for v in &face.vertices {
            target[v.index()] = true;
        }
    }
    inside.iter().zip(&outside).map(|(i, o)| *i && !*o).collect()
}
