// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Global intersection graph: pair-local features globalized into shared
//! vertex and edge identities

use super::intersect::IntersectionSet;
use crate::geometry::barycentric::point_from_barycentric;
use crate::geometry::InputTriangle;
use crate::tolerances::Tolerances;
use ahash::AHashMap;
use log::debug;
use nalgebra::Point3;

/// Parametric window outside which a vertex counts as an edge endpoint
/// rather than an interior point.
const T_EPSILON: f64 = 1e-9;

/// Quantized world-position key identifying a global vertex.
pub type QuantizedKey = (i64, i64, i64);

/// Quantize a world position on the grid with cell size `quantum`.
pub fn quantize(p: &Point3<f64>, quantum: f64) -> QuantizedKey {
    (
        (p.x / quantum).round() as i64,
        (p.y / quantum).round() as i64,
        (p.z / quantum).round() as i64,
    )
}

/// The deduplicated global vertex/edge graph of all pair intersections.
///
/// Immutable after construction. Dense integer ids index the `vertices`
/// and `edges` arrays; the per-pair mappings stay aligned 1:1 with the
/// intersection set.
#[derive(Debug, Clone, Default)]
pub struct IntersectionGraph {
    /// Global vertex positions, id -> world point.
    pub vertices: Vec<Point3<f64>>,
    /// Global undirected edges, id -> (min vertex id, max vertex id).
    pub edges: Vec<(usize, usize)>,
    /// pair index -> pair-local vertex id -> global vertex id.
    pub pair_vertex_global: Vec<Vec<usize>>,
    /// pair index -> pair-local segment index -> final edge ids covering
    /// that segment after interior-vertex splitting.
    pub pair_segment_edges: Vec<Vec<Vec<usize>>>,
    key_to_vertex: AHashMap<QuantizedKey, usize>,
    edge_ids: AHashMap<(usize, usize), usize>,
}

impl IntersectionGraph {
    /// Globalize the features of an intersection set.
    pub fn build(a: &[InputTriangle], set: &IntersectionSet, tol: &Tolerances) -> Self {
        let mut graph = Self::default();
        let quantum = tol.triangle_predicate_epsilon;

        // Vertex interning in pair order: reconstruct each pair vertex
        // from its A-side barycentric and key it on the quantization grid.
        for (pair_idx, features) in set.features.iter().enumerate() {
            let tri_a = set.intersections[pair_idx].tri_a;
            let pts_a = a[tri_a].points();
            let mut locals = Vec::with_capacity(features.vertices.len());
            for vertex in &features.vertices {
                let world = point_from_barycentric(&pts_a, &vertex.bary_a);
                let key = quantize(&world, quantum);
                let next_id = graph.vertices.len();
                let id = *graph.key_to_vertex.entry(key).or_insert(next_id);
                if id == next_id {
                    graph.vertices.push(world);
                }
                locals.push(id);
            }
            graph.pair_vertex_global.push(locals);
        }

        // Initial edges: normalized unordered pairs, deduplicated, with
        // degenerate (same-vertex) segments skipped.
        let mut initial_edges: Vec<(usize, usize)> = Vec::new();
        let mut initial_ids: AHashMap<(usize, usize), usize> = AHashMap::new();
        let mut pair_segment_initial: Vec<Vec<Option<usize>>> = Vec::with_capacity(set.len());
        for (pair_idx, features) in set.features.iter().enumerate() {
            let locals = &graph.pair_vertex_global[pair_idx];
            let mut segment_ids = Vec::with_capacity(features.segments.len());
            for segment in &features.segments {
                let ga = locals[segment.start];
                let gb = locals[segment.end];
                if ga == gb {
                    debug!("pair {pair_idx}: degenerate segment collapsed by quantization");
                    segment_ids.push(None);
                    continue;
                }
                let key = if ga < gb { (ga, gb) } else { (gb, ga) };
                let next_id = initial_edges.len();
                let id = *initial_ids.entry(key).or_insert(next_id);
                if id == next_id {
                    initial_edges.push(key);
                }
                segment_ids.push(Some(id));
            }
            pair_segment_initial.push(segment_ids);
        }

        // Split every edge through the vertices lying on its interior,
        // then re-deduplicate the pieces globally.
        let pieces = graph.split_edges(&initial_edges, tol);
        let mut piece_ids: Vec<Vec<usize>> = Vec::with_capacity(pieces.len());
        for edge_pieces in &pieces {
            let mut ids = Vec::with_capacity(edge_pieces.len());
            for &(u, v) in edge_pieces {
                let key = if u < v { (u, v) } else { (v, u) };
                let next_id = graph.edges.len();
                let id = *graph.edge_ids.entry(key).or_insert(next_id);
                if id == next_id {
                    graph.edges.push(key);
                }
                ids.push(id);
            }
            piece_ids.push(ids);
        }

        for segment_ids in &pair_segment_initial {
            let resolved = segment_ids
                .iter()
                .map(|initial| match initial {
                    Some(id) => piece_ids[*id].clone(),
                    None => Vec::new(),
                })
                .collect();
            graph.pair_segment_edges.push(resolved);
        }

        graph
    }

    /// For each initial edge, the ordered list of pieces after inserting
    /// interior vertices.
    fn split_edges(
        &self,
        initial_edges: &[(usize, usize)],
        tol: &Tolerances,
    ) -> Vec<Vec<(usize, usize)>> {
        let max_dist_sq = tol.edge_split_distance() * tol.edge_split_distance();
        initial_edges
            .iter()
            .map(|&(u, v)| {
                let pu = self.vertices[u];
                let pv = self.vertices[v];
                let axis = pv - pu;
                let len_sq = axis.norm_squared();
                if len_sq <= 0.0 {
                    return vec![(u, v)];
                }

                let mut interior: Vec<(f64, usize)> = Vec::new();
                for (w, pw) in self.vertices.iter().enumerate() {
                    if w == u || w == v {
                        continue;
                    }
                    let t = (pw - pu).dot(&axis) / len_sq;
                    if t <= T_EPSILON || t >= 1.0 - T_EPSILON {
                        continue;
                    }
                    let closest = pu + axis * t;
                    if (pw - closest).norm_squared() <= max_dist_sq {
                        interior.push((t, w));
                    }
                }
                if interior.is_empty() {
                    return vec![(u, v)];
                }
                interior
                    .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut pieces = Vec::with_capacity(interior.len() + 1);
                let mut prev = u;
                for &(_, w) in &interior {
                    if w != prev {
                        pieces.push((prev, w));
                        prev = w;
                    }
                }
                if prev != v {
                    pieces.push((prev, v));
                }
                pieces
            })
            .collect()
    }

    /// Number of global vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of global edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Global edge id for an unordered vertex pair, if present.
    pub fn edge_id(&self, a: usize, b: usize) -> Option<usize> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edge_ids.get(&key).copied()
    }

    /// True when the unordered pair is a graph edge.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edge_id(a, b).is_some()
    }

    /// Check the post-construction invariants; used by tests and the
    /// pipeline's debug assertions.
    pub fn invariants_hold(&self, tol: &Tolerances) -> bool {
        // No edge with coincident endpoints; unique unordered pairs.
        let mut seen = AHashMap::new();
        for &(u, v) in &self.edges {
            if u == v || seen.insert((u, v), ()).is_some() {
                return false;
            }
        }
        // No vertex strictly interior to any edge within tolerance.
        let max_dist_sq = tol.edge_split_distance() * tol.edge_split_distance();
        for &(u, v) in &self.edges {
            let pu = self.vertices[u];
            let pv = self.vertices[v];
            let axis = pv - pu;
            let len_sq = axis.norm_squared();
            for (w, pw) in self.vertices.iter().enumerate() {
                if w == u || w == v {
                    continue;
                }
                let t = (pw - pu).dot(&axis) / len_sq;
                if t <= T_EPSILON || t >= 1.0 - T_EPSILON {
                    continue;
                }
                let closest = pu + axis * t;
                if (pw - closest).norm_squared() <= max_dist_sq {
                    return false;
                }
            }
        }
        true
    }
}
