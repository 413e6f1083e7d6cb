// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Per-triangle index of attached global intersection vertices

use super::graph::IntersectionGraph;
use super::intersect::IntersectionSet;
use crate::error::MeshSide;
use crate::geometry::barycentric::{barycentric_of, Barycentric};
use crate::geometry::{shared_edge_adjacency, lattice_edge_key, InputTriangle};
use crate::tolerances::Tolerances;

/// A global intersection vertex attached to one triangle, in that
/// triangle's barycentrics.
#[derive(Debug, Clone, Copy)]
pub struct TriangleVertexRef {
    /// Global vertex id in the intersection graph.
    pub global: usize,
    /// Barycentric on the owning triangle.
    pub bary: Barycentric,
}

/// For each triangle of one operand, the global vertices attached to it.
///
/// A vertex attaches to the triangles of the pairs that produced it, and
/// additionally to triangles across shared mesh edges so that both
/// triangles incident to a cut mesh edge subdivide consistently.
#[derive(Debug, Clone)]
pub struct TriangleIntersectionIndex {
    /// triangle index -> attached vertices.
    pub attached: Vec<Vec<TriangleVertexRef>>,
}

impl TriangleIntersectionIndex {
    /// Build the index for one operand.
    pub fn build(
        side: MeshSide,
        triangles: &[InputTriangle],
        set: &IntersectionSet,
        graph: &IntersectionGraph,
        tol: &Tolerances,
    ) -> Self {
        let mut attached: Vec<Vec<TriangleVertexRef>> = vec![Vec::new(); triangles.len()];

        for (pair_idx, features) in set.features.iter().enumerate() {
            let record = &set.intersections[pair_idx];
            let tri = match side {
                MeshSide::A => record.tri_a,
                MeshSide::B => record.tri_b,
            };
            for (local, vertex) in features.vertices.iter().enumerate() {
                let global = graph.pair_vertex_global[pair_idx][local];
                let bary = match side {
                    MeshSide::A => vertex.bary_a,
                    MeshSide::B => vertex.bary_b,
                };
                if bary.is_inside_inclusive(tol.barycentric_inside_epsilon) {
                    attach(&mut attached[tri], global, bary);
                }
            }
        }

        // Propagate across shared mesh edges: a vertex on a triangle side
        // also belongs to the neighbor sharing that side, even when the
        // neighbor participated in no intersection pair.
        let adjacency = shared_edge_adjacency(triangles);
        let snapshot: Vec<Vec<TriangleVertexRef>> = attached.clone();
        for (tri_idx, refs) in snapshot.iter().enumerate() {
            for vertex_ref in refs {
                for opposite in 0..3 {
                    let component = match opposite {
                        0 => vertex_ref.bary.u,
                        1 => vertex_ref.bary.v,
                        _ => vertex_ref.bary.w,
                    };
                    if component.abs() > tol.eps_side {
                        continue;
                    }
                    let key = lattice_edge_key(&triangles[tri_idx], opposite);
                    let Some(neighbors) = adjacency.get(&key) else {
                        continue;
                    };
                    for &neighbor in neighbors {
                        if neighbor == tri_idx {
                            continue;
                        }
                        let world = graph.vertices[vertex_ref.global];
                        let pts = triangles[neighbor].points();
                        let Some(bary) =
                            barycentric_of(&pts, &world, tol.triangle_predicate_epsilon)
                        else {
                            continue;
                        };
                        // The side tolerance, not the tight containment
                        // one: the vertex may sit just off the neighbor's
                        // side of the shared edge.
                        if bary.is_inside_inclusive(tol.eps_side) {
                            attach(&mut attached[neighbor], vertex_ref.global, bary);
                        }
                    }
                }
            }
        }

        Self { attached }
    }

    /// Attached vertices of triangle `tri`.
    pub fn vertices_of(&self, tri: usize) -> &[TriangleVertexRef] {
        &self.attached[tri]
    }
}

fn attach(list: &mut Vec<TriangleVertexRef>, global: usize, bary: Barycentric) {
    if !list.iter().any(|r| r.global == global) {
        list.push(TriangleVertexRef { global, bary });
    }
}
