// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Input triangle and output mesh representations

use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// One input triangle: three integer-lattice corners and a unit outward
/// normal.
///
/// Integer coordinates give input vertices a canonical identity; all heavy
/// math runs on double-precision projections of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InputTriangle {
    /// The three corners on the integer lattice, counter-clockwise when
    /// seen from outside.
    pub corners: [Point3<i64>; 3],
    /// Unit outward normal.
    pub normal: Vector3<f64>,
}

impl InputTriangle {
    /// Build a triangle from lattice corners, deriving the outward normal
    /// from the winding.
    pub fn from_corners(corners: [Point3<i64>; 3]) -> Self {
        let p = corners.map(lattice_to_world);
        let cross = (p[1] - p[0]).cross(&(p[2] - p[0]));
        let norm = cross.norm();
        let normal = if norm > 0.0 {
            cross / norm
        } else {
            Vector3::zeros()
        };
        Self { corners, normal }
    }

    /// World-space position of corner `i`.
    pub fn point(&self, i: usize) -> Point3<f64> {
        lattice_to_world(self.corners[i])
    }

    /// All three corners in world space.
    pub fn points(&self) -> [Point3<f64>; 3] {
        self.corners.map(lattice_to_world)
    }

    /// Twice the world-space area (cross product norm).
    pub fn double_area(&self) -> f64 {
        let p = self.points();
        (p[1] - p[0]).cross(&(p[2] - p[0])).norm()
    }

    /// World-space centroid.
    pub fn centroid(&self) -> Point3<f64> {
        let p = self.points();
        Point3::from((p[0].coords + p[1].coords + p[2].coords) / 3.0)
    }

    /// Plane of the triangle as (unit normal, offset) with `n . x = offset`
    /// for points x on the plane. `None` for degenerate triangles.
    pub fn plane(&self) -> Option<(Vector3<f64>, f64)> {
        let p = self.points();
        let cross = (p[1] - p[0]).cross(&(p[2] - p[0]));
        let norm = cross.norm();
        if norm <= 0.0 {
            return None;
        }
        let n = cross / norm;
        Some((n, n.dot(&p[0].coords)))
    }
}

/// Project a lattice point to world space.
pub fn lattice_to_world(p: Point3<i64>) -> Point3<f64> {
    Point3::new(p.x as f64, p.y as f64, p.z as f64)
}

/// The assembled boolean result: deduplicated vertices plus an indexed
/// triangle list.
///
/// Kernel output guarantees: closed (every undirected edge used exactly
/// twice), no zero-area triangles, no two vertices within the welding
/// radius.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexedMesh {
    /// Deduplicated vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Triangles as vertex index triples, counter-clockwise from outside.
    pub triangles: Vec<[usize; 3]>,
}

impl IndexedMesh {
    /// An empty mesh.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when the mesh holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// World positions of triangle `t`.
    pub fn triangle_points(&self, t: usize) -> [Point3<f64>; 3] {
        self.triangles[t].map(|i| self.vertices[i])
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = tri.map(|i| self.vertices[i]);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Convert back into input triangles (lattice-rounded corners with
    /// derived normals). Used by callers that chain operations.
    pub fn to_input_triangles(&self) -> Vec<InputTriangle> {
        self.triangles
            .iter()
            .map(|tri| {
                let corners = tri.map(|i| {
                    let p = self.vertices[i];
                    Point3::new(p.x.round() as i64, p.y.round() as i64, p.z.round() as i64)
                });
                InputTriangle::from_corners(corners)
            })
            .collect()
    }
}

/// Canonical identity of an undirected mesh edge between two lattice
/// corners.
pub type LatticeEdgeKey = ((i64, i64, i64), (i64, i64, i64));

fn corner_key(p: Point3<i64>) -> (i64, i64, i64) {
    (p.x, p.y, p.z)
}

/// Key for the undirected edge opposite corner `opposite` of `tri`.
pub fn lattice_edge_key(tri: &InputTriangle, opposite: usize) -> LatticeEdgeKey {
    let a = corner_key(tri.corners[(opposite + 1) % 3]);
    let b = corner_key(tri.corners[(opposite + 2) % 3]);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Triangles incident to each undirected lattice edge of a mesh.
///
/// Closed manifold inputs have exactly two entries per edge; used to
/// propagate intersection vertices across shared mesh edges.
pub fn shared_edge_adjacency(triangles: &[InputTriangle]) -> AHashMap<LatticeEdgeKey, Vec<usize>> {
    let mut map: AHashMap<LatticeEdgeKey, Vec<usize>> = AHashMap::new();
    for (idx, tri) in triangles.iter().enumerate() {
        for opposite in 0..3 {
            map.entry(lattice_edge_key(tri, opposite))
                .or_default()
                .push(idx);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> InputTriangle {
        InputTriangle::from_corners([
            Point3::new(0, 0, 0),
            Point3::new(2, 0, 0),
            Point3::new(0, 2, 0),
        ])
    }

    #[test]
    fn test_derived_normal_points_along_winding() {
        let tri = unit_triangle();
        assert!((tri.normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert_eq!(tri.double_area(), 4.0);
    }

    #[test]
    fn test_plane_offset() {
        let tri = InputTriangle::from_corners([
            Point3::new(0, 0, 3),
            Point3::new(1, 0, 3),
            Point3::new(0, 1, 3),
        ]);
        let (n, d) = tri.plane().unwrap();
        assert!((n.z - 1.0).abs() < 1e-12);
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_triangle_has_no_plane() {
        let tri = InputTriangle::from_corners([
            Point3::new(0, 0, 0),
            Point3::new(1, 1, 1),
            Point3::new(2, 2, 2),
        ]);
        assert!(tri.plane().is_none());
    }

    #[test]
    fn test_shared_edge_adjacency_pairs_triangles() {
        let a = unit_triangle();
        let b = InputTriangle::from_corners([
            Point3::new(2, 0, 0),
            Point3::new(2, 2, 0),
            Point3::new(0, 2, 0),
        ]);
        let adjacency = shared_edge_adjacency(&[a, b]);
        // The diagonal edge (2,0,0)-(0,2,0) belongs to both triangles.
        let key = lattice_edge_key(&a, 0);
        assert_eq!(adjacency[&key], vec![0, 1]);
    }

    #[test]
    fn test_indexed_mesh_surface_area() {
        let mesh = IndexedMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
        };
        assert!((mesh.surface_area() - 2.0).abs() < 1e-12);
    }
}
