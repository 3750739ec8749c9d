// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ear-clipping triangulation of polygon faces

use super::mesh::newell_vector;
use super::types::{Face, FaceId, VertexId};
use super::Mesh;
use crate::error::{MeshError, MeshResult};
use nalgebra::{Point2, Point3};
use tracing::debug;

/// Relative tolerance for degenerate ears and point-in-triangle tests
const EAR_EPSILON: f64 = 1e-10;

/// Triangulate a polygon given by its corner positions.
///
/// Returns `n - 2` triangles as local corner indices, wound like the input.
/// Fewer than three corners produce no triangles.
pub fn triangulate_polygon(points: &[Point3<f64>]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![[0, 1, 2]];
    }

    let projected = project_to_plane(points);
    let orientation = if signed_area(&projected) < 0.0 { -1.0 } else { 1.0 };
    let extent = extent_squared(&projected);
    let area_eps = EAR_EPSILON * extent.max(f64::MIN_POSITIVE);

    let mut active: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while active.len() > 3 {
        let m = active.len();
        let mut best: Option<(usize, f64)> = None;
        let mut first_convex: Option<usize> = None;

        for pos in 0..m {
            let prev = active[(pos + m - 1) % m];
            let cur = active[pos];
            let next = active[(pos + 1) % m];
            let (a, b, c) = (projected[prev], projected[cur], projected[next]);

            let cross = orientation * cross_2d(&a, &b, &c);
            if cross <= area_eps {
                continue; // reflex or degenerate
            }
            if first_convex.is_none() {
                first_convex = Some(pos);
            }

            let blocked = active.iter().any(|&other| {
                other != prev
                    && other != cur
                    && other != next
                    && point_in_triangle(&projected[other], &a, &b, &c, area_eps)
            });
            if blocked {
                continue;
            }

            let angle = interior_angle(&a, &b, &c);
            if best.map_or(true, |(_, best_angle)| angle > best_angle) {
                best = Some((pos, angle));
            }
        }

        // No clean ear: clip the first convex corner (or any corner)
        let pos = match best {
            Some((pos, _)) => pos,
            None => first_convex.unwrap_or(0),
        };
        let prev = active[(pos + m - 1) % m];
        let cur = active[pos];
        let next = active[(pos + 1) % m];
        triangles.push([prev, cur, next]);
        active.remove(pos);
    }

    triangles.push([active[0], active[1], active[2]]);
    triangles
}

/// Triangle corners of a mesh face, as vertex ids
pub fn triangulate_indices(mesh: &Mesh, face: FaceId) -> MeshResult<Vec<[VertexId; 3]>> {
    let face = checked_face(mesh, face)?;
    let points = mesh.positions_of(&face.vertices);
    Ok(triangulate_polygon(&points)
        .into_iter()
        .map(|[a, b, c]| [face.vertices[a], face.vertices[b], face.vertices[c]])
        .collect())
}

/// Decompose a face into triangles.
///
/// Triangles come back unchanged; n-gons yield `n - 2` faces that keep the
/// material, metadata and per-corner UVs of the source face.
pub fn triangulate(mesh: &Mesh, face: FaceId) -> MeshResult<Vec<Face>> {
    let source = checked_face(mesh, face)?;
    if source.len() == 3 {
        return Ok(vec![source.clone()]);
    }

    let points = mesh.positions_of(&source.vertices);
    let triangles = triangulate_polygon(&points)
        .into_iter()
        .map(|corners| {
            let mut tri = source.with_loop(corners.iter().map(|&c| source.vertices[c]).collect());
            tri.normal = source.normal;
            if let Some(uvs) = source.uvs.as_ref() {
                if uvs.len() == source.len() {
                    tri.uvs = Some(corners.iter().map(|&c| uvs[c]).collect());
                }
            }
            tri
        })
        .collect();
    Ok(triangles)
}

/// Triangulate the selected faces in place.
///
/// The first triangle of each face takes over the face's id; the rest are
/// appended. Returns the ids of every resulting triangle.
pub fn triangulate_faces(mesh: &mut Mesh, faces: &[FaceId]) -> MeshResult<Vec<FaceId>> {
    if faces.is_empty() {
        return Err(MeshError::invalid_selection("no faces selected for triangulation"));
    }
    for &id in faces {
        checked_face(mesh, id)?;
    }

    let mut result = Vec::new();
    for &id in faces {
        let mut triangles = triangulate(mesh, id)?.into_iter();
        if let Some(first) = triangles.next() {
            mesh.replace_face(id, first)?;
            result.push(id);
        }
        for tri in triangles {
            result.push(mesh.add_face_with(tri)?);
        }
    }
    debug!("Triangulated {} faces into {} triangles", faces.len(), result.len());
    Ok(result)
}

impl Mesh {
    /// Copy of this mesh with every face triangulated
    pub fn triangulated(&self) -> MeshResult<Mesh> {
        let mut faces = Vec::with_capacity(self.face_count() * 2);
        for id in self.face_ids() {
            faces.extend(triangulate(self, id)?);
        }
        let mut mesh = Mesh::from_raw_parts(self.vertices().to_vec(), self.edges().to_vec(), faces);
        mesh.sync_edges();
        Ok(mesh)
    }
}

fn checked_face(mesh: &Mesh, id: FaceId) -> MeshResult<&Face> {
    let face = mesh.face(id).ok_or_else(|| {
        MeshError::invalid_selection(format!(
            "face {} does not exist (mesh has {} faces)",
            id,
            mesh.face_count()
        ))
    })?;
    if face.len() < 3 {
        return Err(MeshError::invalid_selection(format!(
            "face {id} has only {} vertices",
            face.len()
        )));
    }
    for &v in &face.vertices {
        mesh.check_vertex(v)?;
    }
    Ok(face)
}

/// Drop the dominant axis of the polygon normal
pub(crate) fn project_to_plane(points: &[Point3<f64>]) -> Vec<Point2<f64>> {
    let normal = newell_vector(points).map(|x| x.abs());
    let axis = if normal.x > normal.y && normal.x > normal.z {
        0
    } else if normal.y > normal.z {
        1
    } else {
        2
    };
    // Keep the projected winding consistent with the 3D normal sign
    points
        .iter()
        .map(|p| match axis {
            0 => Point2::new(p.y, p.z),
            1 => Point2::new(p.z, p.x),
            _ => Point2::new(p.x, p.y),
        })
        .collect()
}

fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

fn extent_squared(points: &[Point2<f64>]) -> f64 {
    let (mut min, mut max) = (points[0], points[0]);
    for p in points {
        min = min.inf(p);
        max = max.sup(p);
    }
    (max - min).norm_squared()
}

/// z component of (b - a) x (c - b)
fn cross_2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let ab = b - a;
    let bc = c - b;
    ab.x * bc.y - ab.y * bc.x
}

/// Angle at `b` between `a` and `c`, in radians
fn interior_angle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let u = a - b;
    let v = c - b;
    let cross = u.x * v.y - u.y * v.x;
    cross.abs().atan2(u.dot(&v))
}

/// Barycentric containment; points on the border count as inside, points
/// coinciding with a corner do not.
pub(crate) fn point_in_triangle(
    p: &Point2<f64>,
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    eps: f64,
) -> bool {
    if [a, b, c].iter().any(|corner| (p - *corner).norm_squared() <= eps) {
        return false;
    }
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;
    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);
    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() <= f64::MIN_POSITIVE {
        return false;
    }
    let u = (dot11 * dot02 - dot01 * dot12) / denom;
    let v = (dot00 * dot12 - dot01 * dot02) / denom;
    let tol = 1e-12;
    u >= -tol && v >= -tol && u + v <= 1.0 + tol
}
