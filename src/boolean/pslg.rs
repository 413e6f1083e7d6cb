// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Planar straight-line graph in the barycentric chart of one triangle:
//! vertex normalization, boundary/interior edges, half-edge faces

use crate::geometry::barycentric::{
    point_in_ring_inclusive, ring_signed_area, ring_vertex_centroid,
};
use crate::tolerances::Tolerances;
use ahash::AHashMap;
use log::debug;
use nalgebra::Point2;

/// A subdivision vertex in the (u, v) chart.
#[derive(Debug, Clone, Copy)]
pub struct PslgVertex {
    /// Chart position.
    pub uv: Point2<f64>,
    /// Global intersection vertex this position came from, when any.
    pub global: Option<usize>,
    /// True for the three reference-triangle corners.
    pub is_corner: bool,
}

/// An undirected subdivision edge.
#[derive(Debug, Clone, Copy)]
pub struct PslgEdge {
    pub a: usize,
    pub b: usize,
    /// True for triangle-boundary pieces.
    pub boundary: bool,
}

/// One directed view of an edge. All cross-references are indices into
/// the owning arrays; the structure is cyclic by nature.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    pub from: usize,
    pub to: usize,
    /// Opposite direction view of the same edge.
    pub twin: usize,
    /// Next half-edge around the face, counter-clockwise.
    pub next: usize,
    /// Owning undirected edge.
    pub edge: usize,
}

/// A face of the subdivision: a counter-clockwise outer ring plus zero or
/// more hole rings, with the net signed chart area.
#[derive(Debug, Clone)]
pub struct PslgFace {
    /// Outer ring vertex ids, counter-clockwise.
    pub outer: Vec<usize>,
    /// Hole rings (counter-clockwise as stored).
    pub holes: Vec<Vec<usize>>,
    /// Signed area of the outer ring.
    pub outer_area: f64,
    /// Outer area minus the hole areas.
    pub net_area: f64,
}

/// The full subdivision state of one triangle's chart.
#[derive(Debug, Clone)]
pub struct Pslg {
    pub vertices: Vec<PslgVertex>,
    pub edges: Vec<PslgEdge>,
    pub half_edges: Vec<HalfEdge>,
    pub faces: Vec<PslgFace>,
    /// Faces selected as interior (bounded, non-negligible area).
    pub interior: Vec<usize>,
}

impl Pslg {
    /// Build the subdivision for one triangle.
    ///
    /// `points` are the attached intersection vertices as
    /// (global id, chart position); `segments` are interior chords as
    /// unordered global id pairs. Errors carry the violated invariant.
    pub fn build(
        points: &[(usize, Point2<f64>)],
        segments: &[(usize, usize)],
        tol: &Tolerances,
    ) -> Result<Pslg, String> {
        let mut pslg = Pslg {
            vertices: Vec::with_capacity(points.len() + 3),
            edges: Vec::new(),
            half_edges: Vec::new(),
            faces: Vec::new(),
            interior: Vec::new(),
        };

        let global_to_local = pslg.build_vertices(points, tol);
        pslg.build_edges(segments, &global_to_local, tol)?;
        pslg.verify_no_unvertexed_crossings(tol)?;
        pslg.prune_dangling_chords();
        pslg.build_half_edges();
        pslg.build_faces(tol)?;
        Ok(pslg)
    }

    /// Vertex phase: three corners, then normalized intersection points
    /// (clamp into the domain, snap to corners, merge near-duplicates).
    fn build_vertices(
        &mut self,
        points: &[(usize, Point2<f64>)],
        tol: &Tolerances,
    ) -> AHashMap<usize, usize> {
        let corners = [
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ];
        for uv in corners {
            self.vertices.push(PslgVertex {
                uv,
                global: None,
                is_corner: true,
            });
        }

        let mut global_to_local: AHashMap<usize, usize> = AHashMap::new();
        for &(global, raw_uv) in points {
            let mut u = raw_uv.x.max(0.0);
            let mut v = raw_uv.y.max(0.0);
            let sum = u + v;
            if sum > 1.0 {
                u /= sum;
                v /= sum;
            }
            let uv = Point2::new(u, v);

            // Snap to the nearest corner when close enough.
            let mut representative = None;
            for (corner, corner_uv) in corners.iter().enumerate() {
                if (uv - corner_uv).norm() <= tol.eps_corner {
                    representative = Some(corner);
                    break;
                }
            }
            // Merge with any existing vertex.
            if representative.is_none() {
                for (idx, vertex) in self.vertices.iter().enumerate() {
                    if (uv - vertex.uv).norm() <= tol.pslg_vertex_merge_epsilon {
                        representative = Some(idx);
                        break;
                    }
                }
            }

            let local = match representative {
                Some(idx) => {
                    if self.vertices[idx].global.is_none() {
                        self.vertices[idx].global = Some(global);
                    }
                    idx
                }
                None => {
                    self.vertices.push(PslgVertex {
                        uv,
                        global: Some(global),
                        is_corner: false,
                    });
                    self.vertices.len() - 1
                }
            };
            global_to_local.entry(global).or_insert(local);
        }
        global_to_local
    }

    /// Edge phase: split triangle sides at the vertices lying on them,
    /// then add interior chords mapped through the merge.
    fn build_edges(
        &mut self,
        segments: &[(usize, usize)],
        global_to_local: &AHashMap<usize, usize>,
        tol: &Tolerances,
    ) -> Result<(), String> {
        let mut edge_keys: AHashMap<(usize, usize), usize> = AHashMap::new();

        // Sides in cyclic orientation V0 -> V1 -> V2 -> V0. A vertex lies
        // on a side when the barycentric coordinate opposite that side
        // vanishes; the parameter orders it along the side.
        let on_side: [(fn(&Point2<f64>) -> f64, fn(&Point2<f64>) -> f64); 3] = [
            (|uv| uv.x + uv.y - 1.0, |uv| uv.y),
            (|uv| uv.x, |uv| 1.0 - uv.y),
            (|uv| uv.y, |uv| uv.x),
        ];

        for (test, param) in on_side {
            let mut on: Vec<(f64, usize)> = self
                .vertices
                .iter()
                .enumerate()
                .filter(|(_, vertex)| test(&vertex.uv).abs() <= tol.eps_side)
                .map(|(idx, vertex)| (param(&vertex.uv), idx))
                .collect();
            on.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            for window in on.windows(2) {
                let (a, b) = (window[0].1, window[1].1);
                if a != b {
                    add_edge(&mut self.edges, &mut edge_keys, a, b, true);
                }
            }
        }

        for &(gu, gv) in segments {
            let (Some(&a), Some(&b)) = (global_to_local.get(&gu), global_to_local.get(&gv)) else {
                debug!("segment endpoint not attached to triangle; skipping chord");
                continue;
            };
            if a == b {
                continue;
            }
            add_edge(&mut self.edges, &mut edge_keys, a, b, false);
        }
        Ok(())
    }

    /// Remove interior chords with an endpoint of degree one; they bound
    /// no region and would leave slits in the face walk.
    fn prune_dangling_chords(&mut self) {
        loop {
            let mut degree = vec![0usize; self.vertices.len()];
            for edge in &self.edges {
                degree[edge.a] += 1;
                degree[edge.b] += 1;
            }
            let before = self.edges.len();
            self.edges.retain(|edge| {
                edge.boundary || (degree[edge.a] > 1 && degree[edge.b] > 1)
            });
            if self.edges.len() == before {
                break;
            }
            debug!("pruned {} dangling chords", before - self.edges.len());
        }
    }

    /// No two edges may cross interior-to-interior without sharing a
    /// vertex, unless the crossing sits on an existing vertex.
    fn verify_no_unvertexed_crossings(&self, tol: &Tolerances) -> Result<(), String> {
        for i in 0..self.edges.len() {
            for j in (i + 1)..self.edges.len() {
                let (e1, e2) = (self.edges[i], self.edges[j]);
                if e1.a == e2.a || e1.a == e2.b || e1.b == e2.a || e1.b == e2.b {
                    continue;
                }
                let p1 = self.vertices[e1.a].uv;
                let p2 = self.vertices[e1.b].uv;
                let q1 = self.vertices[e2.a].uv;
                let q2 = self.vertices[e2.b].uv;
                let Some(crossing) = proper_crossing(&p1, &p2, &q1, &q2) else {
                    continue;
                };
                let near_vertex = self
                    .vertices
                    .iter()
                    .any(|v| (crossing - v.uv).norm() <= tol.pslg_vertex_merge_epsilon);
                if !near_vertex {
                    return Err(format!(
                        "PSLG requires no crossings without vertices: edges \
                         ({}, {}) and ({}, {}) cross at ({:.9}, {:.9})",
                        e1.a, e1.b, e2.a, e2.b, crossing.x, crossing.y
                    ));
                }
            }
        }
        Ok(())
    }

    /// Half-edge phase: two directed views per edge; `next` links follow
    /// the counter-clockwise order of outgoing directions at each vertex.
    fn build_half_edges(&mut self) {
        self.half_edges.clear();
        for (edge_idx, edge) in self.edges.iter().enumerate() {
            let forward = self.half_edges.len();
            self.half_edges.push(HalfEdge {
                from: edge.a,
                to: edge.b,
                twin: forward + 1,
                next: usize::MAX,
                edge: edge_idx,
            });
            self.half_edges.push(HalfEdge {
                from: edge.b,
                to: edge.a,
                twin: forward,
                next: usize::MAX,
                edge: edge_idx,
            });
        }

        // Outgoing half-edges per vertex, sorted by direction angle.
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.vertices.len()];
        for (idx, half_edge) in self.half_edges.iter().enumerate() {
            outgoing[half_edge.from].push(idx);
        }
        for (vertex, list) in outgoing.iter_mut().enumerate() {
            let origin = self.vertices[vertex].uv;
            list.sort_by(|&h1, &h2| {
                let d1 = self.vertices[self.half_edges[h1].to].uv - origin;
                let d2 = self.vertices[self.half_edges[h2].to].uv - origin;
                let a1 = d1.y.atan2(d1.x);
                let a2 = d2.y.atan2(d2.x);
                a1.partial_cmp(&a2).unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        // The half-edge arriving opposite outgoing `o_i` continues into
        // the outgoing edge preceding `o_i` in the sorted order.
        for list in &outgoing {
            for (pos, &out) in list.iter().enumerate() {
                let incoming = self.half_edges[out].twin;
                let prev = list[(pos + list.len() - 1) % list.len()];
                self.half_edges[incoming].next = prev;
            }
        }
    }

    /// Face phase: walk cycles, normalize to counter-clockwise, nest by
    /// centroid containment, deduplicate, and select interior faces.
    fn build_faces(&mut self, tol: &Tolerances) -> Result<(), String> {
        let mut visited = vec![false; self.half_edges.len()];
        let mut cycles: Vec<(Vec<usize>, f64)> = Vec::new();

        for start in 0..self.half_edges.len() {
            if visited[start] {
                continue;
            }
            let mut ring = Vec::new();
            let mut current = start;
            loop {
                if visited[current] {
                    if current != start {
                        return Err(format!(
                            "face walk from half-edge {start} re-entered {current} without closing"
                        ));
                    }
                    break;
                }
                visited[current] = true;
                ring.push(self.half_edges[current].from);
                current = self.half_edges[current].next;
                if current == usize::MAX {
                    return Err(format!("half-edge {start} has an unlinked next pointer"));
                }
            }
            if ring.len() < 3 {
                continue;
            }
            let uv_ring: Vec<Point2<f64>> = ring.iter().map(|&v| self.vertices[v].uv).collect();
            let area = ring_signed_area(&uv_ring);
            let mut ring = ring;
            if area < 0.0 {
                ring.reverse();
            }
            cycles.push((ring, area.abs()));
        }

        // Deduplicate cycles by canonical rotation of the vertex sequence.
        let mut seen: AHashMap<Vec<usize>, ()> = AHashMap::new();
        let mut unique: Vec<(Vec<usize>, f64)> = Vec::new();
        for (ring, area) in cycles {
            let key = canonical_rotation(&ring);
            if seen.insert(key, ()).is_none() {
                unique.push((ring, area));
            }
        }

        // Parent of a cycle: the smallest strictly larger cycle containing
        // its centroid. Children become holes of their parent.
        let mut parent: Vec<Option<usize>> = vec![None; unique.len()];
        for (child_idx, (child_ring, child_area)) in unique.iter().enumerate() {
            let child_uv: Vec<Point2<f64>> =
                child_ring.iter().map(|&v| self.vertices[v].uv).collect();
            let centroid = ring_vertex_centroid(&child_uv);
            let mut best: Option<(usize, f64)> = None;
            for (candidate_idx, (candidate_ring, candidate_area)) in unique.iter().enumerate() {
                if candidate_idx == child_idx || *candidate_area <= *child_area + tol.eps_area {
                    continue;
                }
                let candidate_uv: Vec<Point2<f64>> = candidate_ring
                    .iter()
                    .map(|&v| self.vertices[v].uv)
                    .collect();
                if !point_in_ring_inclusive(&candidate_uv, &centroid, tol.pslg_vertex_merge_epsilon)
                {
                    continue;
                }
                if best.is_none() || *candidate_area < best.unwrap().1 {
                    best = Some((candidate_idx, *candidate_area));
                }
            }
            parent[child_idx] = best.map(|(idx, _)| idx);
        }

        for (face_idx, (ring, area)) in unique.iter().enumerate() {
            let holes: Vec<Vec<usize>> = unique
                .iter()
                .enumerate()
                .filter(|(child_idx, _)| parent[*child_idx] == Some(face_idx))
                .map(|(_, (child_ring, _))| child_ring.clone())
                .collect();
            let hole_area: f64 = unique
                .iter()
                .enumerate()
                .filter(|(child_idx, _)| parent[*child_idx] == Some(face_idx))
                .map(|(_, (_, child_area))| child_area)
                .sum();
            let net_area = area - hole_area;
            if *area <= tol.eps_area {
                continue;
            }
            self.faces.push(PslgFace {
                outer: ring.clone(),
                holes,
                outer_area: *area,
                net_area,
            });
        }

        self.interior = self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, face)| face.net_area > tol.eps_area)
            .map(|(idx, _)| idx)
            .collect();
        Ok(())
    }
}

fn add_edge(
    edges: &mut Vec<PslgEdge>,
    edge_keys: &mut AHashMap<(usize, usize), usize>,
    a: usize,
    b: usize,
    boundary: bool,
) {
    let key = if a < b { (a, b) } else { (b, a) };
    if edge_keys.contains_key(&key) {
        return;
    }
    edge_keys.insert(key, edges.len());
    edges.push(PslgEdge { a, b, boundary });
}

/// Intersection point of two segments that properly cross (both
/// parameters strictly interior), `None` otherwise.
fn proper_crossing(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    q1: &Point2<f64>,
    q2: &Point2<f64>,
) -> Option<Point2<f64>> {
    const STRICT: f64 = 1e-12;
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() <= STRICT {
        return None;
    }
    let qp = q1 - p1;
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    if t <= STRICT || t >= 1.0 - STRICT || u <= STRICT || u >= 1.0 - STRICT {
        return None;
    }
    Some(p1 + r * t)
}

/// Rotate a ring so its smallest vertex id leads; used as the face
/// deduplication key.
fn canonical_rotation(ring: &[usize]) -> Vec<usize> {
    let min_pos = ring
        .iter()
        .enumerate()
        .min_by_key(|(_, &v)| v)
        .map(|(pos, _)| pos)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(ring.len());
    rotated.extend_from_slice(&ring[min_pos..]);
    rotated.extend_from_slice(&ring[..min_pos]);
    rotated
}
