// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Shared assertions for the integration suites

#![allow(dead_code)]

use trisect::geometry::validate::EdgeUseReport;
use trisect::{IndexedMesh, InputTriangle};

/// Signed volume via the divergence theorem; positive for outward-wound
/// closed meshes.
pub fn signed_volume(mesh: &IndexedMesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|tri| {
            let [a, b, c] = tri.map(|i| mesh.vertices[i]);
            a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
        })
        .sum()
}

/// Signed volume of an input triangle list.
pub fn input_volume(triangles: &[InputTriangle]) -> f64 {
    triangles
        .iter()
        .map(|tri| {
            let [a, b, c] = tri.points();
            a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
        })
        .sum()
}

/// Every undirected edge used exactly twice.
pub fn assert_closed(mesh: &IndexedMesh, label: &str) {
    let report = EdgeUseReport::for_mesh(mesh);
    assert!(
        report.is_closed(),
        "{label}: {} of {} edges not used twice, histogram {:?}",
        report.offending.len(),
        report.total_edges,
        report.histogram
    );
}

/// No zero-area triangles in the output.
pub fn assert_no_degenerate_triangles(mesh: &IndexedMesh, label: &str) {
    for (idx, tri) in mesh.triangles.iter().enumerate() {
        let [a, b, c] = tri.map(|i| mesh.vertices[i]);
        let area = (b - a).cross(&(c - a)).norm() * 0.5;
        assert!(area > 0.0, "{label}: triangle {idx} has zero area");
    }
}

/// Winding-preserving canonical form of the triangle multiset, on a fine
/// grid, for exact mesh comparisons.
pub fn canonical_triangles(mesh: &IndexedMesh) -> Vec<[[i64; 3]; 3]> {
    let quantize = |x: f64| (x * 1e6).round() as i64;
    let mut triangles: Vec<[[i64; 3]; 3]> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let corners =
                tri.map(|i| [quantize(mesh.vertices[i].x), quantize(mesh.vertices[i].y), quantize(mesh.vertices[i].z)]);
            let min_pos = (0..3).min_by_key(|&i| corners[i]).unwrap();
            [
                corners[min_pos],
                corners[(min_pos + 1) % 3],
                corners[(min_pos + 2) % 3],
            ]
        })
        .collect();
    triangles.sort_unstable();
    triangles
}

/// Canonical form of an input triangle list for comparisons against
/// operation results.
pub fn canonical_input_triangles(triangles: &[InputTriangle]) -> Vec<[[i64; 3]; 3]> {
    let quantize = |x: f64| (x * 1e6).round() as i64;
    let mut result: Vec<[[i64; 3]; 3]> = triangles
        .iter()
        .map(|tri| {
            let points = tri.points();
            let corners = [0, 1, 2].map(|i| {
                [
                    quantize(points[i].x),
                    quantize(points[i].y),
                    quantize(points[i].z),
                ]
            });
            let min_pos = (0..3).min_by_key(|&i| corners[i]).unwrap();
            [
                corners[min_pos],
                corners[(min_pos + 1) % 3],
                corners[(min_pos + 2) % 3],
            ]
        })
        .collect();
    result.sort_unstable();
    result
}
