// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Closed integer-lattice fixture meshes for tests, benches, and demos

use super::InputTriangle;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};

/// Axis-aligned box with `origin` at its minimum corner.
pub fn box_mesh(origin: Point3<i64>, size: Vector3<i64>) -> Vec<InputTriangle> {
    let (x0, y0, z0) = (origin.x, origin.y, origin.z);
    let (x1, y1, z1) = (x0 + size.x, y0 + size.y, z0 + size.z);

    let corners = [
        Point3::new(x0, y0, z0),
        Point3::new(x1, y0, z0),
        Point3::new(x1, y1, z0),
        Point3::new(x0, y1, z0),
        Point3::new(x0, y0, z1),
        Point3::new(x1, y0, z1),
        Point3::new(x1, y1, z1),
        Point3::new(x0, y1, z1),
    ];

    // Two triangles per face, wound counter-clockwise from outside.
    let faces: [[usize; 3]; 12] = [
        // z+
        [4, 5, 6],
        [4, 6, 7],
        // z-
        [1, 0, 3],
        [1, 3, 2],
        // x+
        [5, 1, 2],
        [5, 2, 6],
        // x-
        [0, 4, 7],
        [0, 7, 3],
        // y+
        [7, 6, 2],
        [7, 2, 3],
        // y-
        [0, 1, 5],
        [0, 5, 4],
    ];

    faces
        .iter()
        .map(|f| InputTriangle::from_corners([corners[f[0]], corners[f[1]], corners[f[2]]]))
        .collect()
}

/// Tetrahedron over four lattice points, faces wound outward.
pub fn tetrahedron(points: [Point3<i64>; 4]) -> Vec<InputTriangle> {
    let face_indices: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    face_indices
        .iter()
        .map(|f| {
            let opposite = (0..4).find(|i| !f.contains(i)).unwrap();
            let mut corners = [points[f[0]], points[f[1]], points[f[2]]];
            let tri = InputTriangle::from_corners(corners);
            let to_opposite =
                super::lattice_to_world(points[opposite]) - super::lattice_to_world(corners[0]);
            // The outward normal faces away from the opposite vertex.
            if tri.normal.dot(&to_opposite) > 0.0 {
                corners.swap(1, 2);
            }
            InputTriangle::from_corners(corners)
        })
        .collect()
}

/// Icosphere: an icosahedron subdivided `level` times, radially projected
/// to `radius` around `center`, with vertices rounded to the lattice.
///
/// Shared vertices are rounded once, so the mesh stays closed. Radii below
/// ~10 units produce visible lattice distortion; the fixture is intended
/// for radii large against the lattice step.
pub fn icosphere(radius: i64, level: u32, center: Point3<i64>) -> Vec<InputTriangle> {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut vertices: Vec<Vector3<f64>> = vec![
        Vector3::new(-1.0, t, 0.0),
        Vector3::new(1.0, t, 0.0),
        Vector3::new(-1.0, -t, 0.0),
        Vector3::new(1.0, -t, 0.0),
        Vector3::new(0.0, -1.0, t),
        Vector3::new(0.0, 1.0, t),
        Vector3::new(0.0, -1.0, -t),
        Vector3::new(0.0, 1.0, -t),
        Vector3::new(t, 0.0, -1.0),
        Vector3::new(t, 0.0, 1.0),
        Vector3::new(-t, 0.0, -1.0),
        Vector3::new(-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|v| v.normalize())
    .collect();

    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..level {
        let mut midpoint_cache: AHashMap<(usize, usize), usize> = AHashMap::new();
        let mut next_faces = Vec::with_capacity(faces.len() * 4);
        for face in &faces {
            let mid = |cache: &mut AHashMap<(usize, usize), usize>,
                       vertices: &mut Vec<Vector3<f64>>,
                       a: usize,
                       b: usize| {
                let key = if a < b { (a, b) } else { (b, a) };
                *cache.entry(key).or_insert_with(|| {
                    let m = ((vertices[a] + vertices[b]) / 2.0).normalize();
                    vertices.push(m);
                    vertices.len() - 1
                })
            };
            let [a, b, c] = *face;
            let ab = mid(&mut midpoint_cache, &mut vertices, a, b);
            let bc = mid(&mut midpoint_cache, &mut vertices, b, c);
            let ca = mid(&mut midpoint_cache, &mut vertices, c, a);
            next_faces.push([a, ab, ca]);
            next_faces.push([b, bc, ab]);
            next_faces.push([c, ca, bc]);
            next_faces.push([ab, bc, ca]);
        }
        faces = next_faces;
    }

    let lattice: Vec<Point3<i64>> = vertices
        .iter()
        .map(|v| {
            let p = v * radius as f64;
            Point3::new(
                center.x + p.x.round() as i64,
                center.y + p.y.round() as i64,
                center.z + p.z.round() as i64,
            )
        })
        .collect();

    faces
        .iter()
        .map(|f| InputTriangle::from_corners([lattice[f[0]], lattice[f[1]], lattice[f[2]]]))
        .collect()
}
