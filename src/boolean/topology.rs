// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Per-mesh topology over the global intersection graph: which edges cut
//! which triangles, and the chains they form

use super::graph::IntersectionGraph;
use super::intersect::IntersectionSet;
use crate::error::MeshSide;
use ahash::AHashMap;

/// A walked sequence of global vertices; closed chains are loops.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Vertex ids in walk order. Closed chains do not repeat the seed at
    /// the end.
    pub vertices: Vec<usize>,
    /// True when the walk returned to its seed.
    pub closed: bool,
}

/// Intersection topology restricted to one operand.
///
/// A triangle's incident edges are the pieces of segments emitted by pairs
/// involving that triangle, not merely edges whose endpoints happen to lie
/// on it.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    /// triangle index -> incident global edge ids, ascending.
    pub triangle_edges: Vec<Vec<usize>>,
    /// All global edge ids touching this operand, ascending.
    pub edges: Vec<usize>,
    /// vertex id -> incident edge ids restricted to this operand,
    /// ascending.
    pub vertex_adjacency: AHashMap<usize, Vec<usize>>,
    /// Chains walked over the restricted edge graph.
    pub chains: Vec<Chain>,
}

impl MeshTopology {
    /// Build the topology of one operand.
    pub fn build(
        side: MeshSide,
        triangle_count: usize,
        set: &IntersectionSet,
        graph: &IntersectionGraph,
    ) -> Self {
        let mut triangle_edges: Vec<Vec<usize>> = vec![Vec::new(); triangle_count];

        for (pair_idx, record) in set.intersections.iter().enumerate() {
            let tri = match side {
                MeshSide::A => record.tri_a,
                MeshSide::B => record.tri_b,
            };
            for edge_ids in &graph.pair_segment_edges[pair_idx] {
                for &edge in edge_ids {
                    if !triangle_edges[tri].contains(&edge) {
                        triangle_edges[tri].push(edge);
                    }
                }
            }
        }
        for edges in &mut triangle_edges {
            edges.sort_unstable();
        }

        let mut edges: Vec<usize> = triangle_edges.iter().flatten().copied().collect();
        edges.sort_unstable();
        edges.dedup();

        let mut vertex_adjacency: AHashMap<usize, Vec<usize>> = AHashMap::new();
        for &edge in &edges {
            let (u, v) = graph.edges[edge];
            vertex_adjacency.entry(u).or_default().push(edge);
            vertex_adjacency.entry(v).or_default().push(edge);
        }
        for incident in vertex_adjacency.values_mut() {
            incident.sort_unstable();
        }

        let chains = walk_chains(&edges, &vertex_adjacency, graph);

        Self {
            triangle_edges,
            edges,
            vertex_adjacency,
            chains,
        }
    }

    /// Incident edges of triangle `tri`.
    pub fn edges_of(&self, tri: usize) -> &[usize] {
        &self.triangle_edges[tri]
    }
}

/// Extract chains by walking unused edges greedily: seed on the lowest
/// unused edge, keep following any unused incident edge, close when the
/// walk returns to its start, otherwise extend the open end.
fn walk_chains(
    edges: &[usize],
    vertex_adjacency: &AHashMap<usize, Vec<usize>>,
    graph: &IntersectionGraph,
) -> Vec<Chain> {
    let mut used: AHashMap<usize, bool> = edges.iter().map(|&e| (e, false)).collect();
    let mut chains = Vec::new();

    for &seed in edges {
        if used[&seed] {
            continue;
        }
        used.insert(seed, true);
        let (start, mut tip) = graph.edges[seed];
        let mut vertices = vec![start, tip];

        loop {
            let next = vertex_adjacency[&tip]
                .iter()
                .copied()
                .find(|e| !used[e]);
            let Some(next) = next else { break };
            used.insert(next, true);
            let (u, v) = graph.edges[next];
            tip = if u == tip { v } else { u };
            if tip == start {
                break;
            }
            vertices.push(tip);
        }

        let closed = tip == start && vertices.len() > 2;
        if !closed {
            // Extend the open end backwards from the seed.
            vertices.reverse();
            let mut back_tip = *vertices.last().unwrap();
            loop {
                let next = vertex_adjacency[&back_tip]
                    .iter()
                    .copied()
                    .find(|e| !used[e]);
                let Some(next) = next else { break };
                used.insert(next, true);
                let (u, v) = graph.edges[next];
                back_tip = if u == back_tip { v } else { u };
                vertices.push(back_tip);
            }
        }

        chains.push(Chain { vertices, closed });
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::candidate_pairs;
    use crate::geometry::primitives::box_mesh;
    use crate::tolerances::Tolerances;
    use nalgebra::{Point3, Vector3};

    fn topology_fixture() -> (MeshTopology, IntersectionGraph) {
        let tol = Tolerances::default();
        let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
        let b = box_mesh(Point3::new(5, 5, 5), Vector3::new(10, 10, 10));
        let pairs = candidate_pairs(&a, &b, tol.merge_epsilon);
        let set = IntersectionSet::build(&a, &b, &pairs, &tol);
        let graph = IntersectionGraph::build(&a, &set, &tol);
        let topo = MeshTopology::build(MeshSide::A, a.len(), &set, &graph);
        (topo, graph)
    }

    #[test]
    fn test_triangle_edges_touch_their_triangle() {
        let (topo, _) = topology_fixture();
        assert!(topo.triangle_edges.iter().any(|edges| !edges.is_empty()));
        // Flat list covers exactly the union of per-triangle lists.
        let mut all: Vec<usize> = topo.triangle_edges.iter().flatten().copied().collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all, topo.edges);
    }

    #[test]
    fn test_vertex_adjacency_is_consistent() {
        let (topo, graph) = topology_fixture();
        for (&vertex, incident) in &topo.vertex_adjacency {
            for &edge in incident {
                let (u, v) = graph.edges[edge];
                assert!(u == vertex || v == vertex);
            }
        }
    }

    #[test]
    fn test_chains_cover_all_edges_once() {
        let (topo, _) = topology_fixture();
        let edge_count: usize = topo.edges.len();
        let walked: usize = topo
            .chains
            .iter()
            .map(|c| {
                if c.closed {
                    c.vertices.len()
                } else {
                    c.vertices.len() - 1
                }
            })
            .sum();
        assert_eq!(edge_count, walked);
    }

    #[test]
    fn test_cut_loop_on_box_face_closes() {
        // The intersection curve of two overlapping boxes is a closed
        // loop; at least one chain must close.
        let (topo, _) = topology_fixture();
        assert!(topo.chains.iter().any(|c| c.closed));
    }
}
