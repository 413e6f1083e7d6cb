// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Patch classification against the opposite solid and region lifting by
//! cut-edge connectivity

use super::graph::IntersectionGraph;
use super::subdivide::{CoplanarOwner, TriangleSubdivision};
use crate::geometry::InputTriangle;
use crate::tolerances::Tolerances;
use ahash::AHashMap;
use log::warn;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Relation of a patch (or region) to the opposite solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Containment {
    /// Strictly inside the opposite solid.
    Inside,
    /// Strictly outside the opposite solid.
    Outside,
    /// Lying on the opposite solid's surface (coplanar overlap).
    On,
}

/// Point-in-solid predicate. The kernel treats this as a black box; the
/// default implementation is a tilted-ray crossing counter.
pub trait PointInSolid {
    /// True when `point` lies inside the solid.
    fn is_inside(&self, point: &Point3<f64>) -> bool;
}

/// Ray-casting point classifier over a closed triangle mesh.
///
/// The ray direction is slightly off-axis so lattice-aligned inputs do
/// not hit triangle edges exactly.
pub struct RayCastSolid<'a> {
    triangles: &'a [InputTriangle],
}

impl<'a> RayCastSolid<'a> {
    pub fn new(triangles: &'a [InputTriangle]) -> Self {
        Self { triangles }
    }
}

impl PointInSolid for RayCastSolid<'_> {
    fn is_inside(&self, point: &Point3<f64>) -> bool {
        let ray_dir = Vector3::new(1.0, 1e-7, 1.3e-7);
        let mut crossings = 0u32;
        for tri in self.triangles {
            let [v0, v1, v2] = tri.points();
            if ray_intersects_triangle(point, &ray_dir, &v0, &v1, &v2) {
                crossings += 1;
            }
        }
        crossings % 2 == 1
    }
}

/// Moller-Trumbore ray/triangle test counting only forward hits.
fn ray_intersects_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    v0: &Point3<f64>,
    v1: &Point3<f64>,
    v2: &Point3<f64>,
) -> bool {
    const EPS: f64 = 1e-12;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < EPS {
        return false;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = f * edge2.dot(&q);
    t > EPS
}

/// A connected component of patches under the share-a-non-cut-edge
/// adjacency, with its lifted classification.
#[derive(Debug, Clone)]
pub struct Region {
    /// Members as (triangle index, patch index) pairs, ascending.
    pub patches: Vec<(usize, usize)>,
    /// Total member area.
    pub area: f64,
    /// Area-weighted majority containment.
    pub containment: Containment,
    /// Owner inherited from member patches, `None` when no member is
    /// coplanar.
    pub coplanar_owner: CoplanarOwner,
}

/// Classification of one operand's subdivision.
#[derive(Debug, Clone)]
pub struct MeshClassification {
    /// Per triangle, per patch: raw containment.
    pub patch_containment: Vec<Vec<Containment>>,
    /// Per triangle, per patch: owning region id.
    pub patch_region: Vec<Vec<usize>>,
    /// Lifted regions.
    pub regions: Vec<Region>,
}

impl MeshClassification {
    /// Classify one operand's patches against the opposite solid and lift
    /// to regions.
    pub fn build(
        subdivision: &TriangleSubdivision,
        graph: &IntersectionGraph,
        inside_opposite: &dyn PointInSolid,
        tol: &Tolerances,
    ) -> Self {
        // Raw per-patch labels.
        let patch_containment: Vec<Vec<Containment>> = subdivision
            .patches
            .iter()
            .map(|patches| {
                patches
                    .iter()
                    .map(|patch| {
                        if patch.coplanar_owner != CoplanarOwner::None {
                            Containment::On
                        } else if inside_opposite.is_inside(&patch.centroid()) {
                            Containment::Inside
                        } else {
                            Containment::Outside
                        }
                    })
                    .collect()
            })
            .collect();

        // Flat patch ids in (triangle, patch) order.
        let mut flat: Vec<(usize, usize)> = Vec::new();
        for (tri, patches) in subdivision.patches.iter().enumerate() {
            for patch_idx in 0..patches.len() {
                flat.push((tri, patch_idx));
            }
        }

        let (edge_patches, cut_edges) = weld_and_collect_edges(subdivision, graph, tol);

        // Union-find across shared non-cut edges.
        let mut union_find = UnionFind::new(flat.len());
        let mut flat_of: AHashMap<(usize, usize), usize> = AHashMap::new();
        for (flat_idx, &key) in flat.iter().enumerate() {
            flat_of.insert(key, flat_idx);
        }
        let mut sorted_edges: Vec<(&(usize, usize), &Vec<(usize, usize)>)> =
            edge_patches.iter().collect();
        sorted_edges.sort_by_key(|(edge, _)| **edge);
        for (edge, members) in sorted_edges {
            if cut_edges.contains_key(edge) || members.len() < 2 {
                continue;
            }
            let first = flat_of[&members[0]];
            for member in &members[1..] {
                union_find.union(first, flat_of[member]);
            }
        }

        // Gather regions deterministically by smallest member.
        let mut region_ids: AHashMap<usize, usize> = AHashMap::new();
        let mut regions: Vec<Region> = Vec::new();
        let mut patch_region: Vec<Vec<usize>> = subdivision
            .patches
            .iter()
            .map(|patches| vec![usize::MAX; patches.len()])
            .collect();

        for (flat_idx, &(tri, patch_idx)) in flat.iter().enumerate() {
            let root = union_find.find(flat_idx);
            let next_region = regions.len();
            let region_id = *region_ids.entry(root).or_insert(next_region);
            if region_id == next_region {
                regions.push(Region {
                    patches: Vec::new(),
                    area: 0.0,
                    containment: Containment::Outside,
                    coplanar_owner: CoplanarOwner::None,
                });
            }
            regions[region_id].patches.push((tri, patch_idx));
            regions[region_id].area += subdivision.patches[tri][patch_idx].area();
            patch_region[tri][patch_idx] = region_id;
        }

        // Area-weighted vote per region, ties broken
        // Inside > Outside > On.
        for region in &mut regions {
            let mut votes = [0.0f64; 3];
            let mut owner_area: AHashMap<u8, f64> = AHashMap::new();
            for &(tri, patch_idx) in &region.patches {
                let area = subdivision.patches[tri][patch_idx].area();
                let label = patch_containment[tri][patch_idx];
                votes[label_index(label)] += area;
                let owner = subdivision.patches[tri][patch_idx].coplanar_owner;
                if owner != CoplanarOwner::None {
                    *owner_area.entry(owner_key(owner)).or_insert(0.0) += area;
                }
            }

            let populated = votes
                .iter()
                .filter(|&&area| area > tol.triangle_predicate_epsilon)
                .count();
            if populated > 1 {
                warn!(
                    "mixed region: inside {:.3e}, outside {:.3e}, on {:.3e}",
                    votes[0], votes[1], votes[2]
                );
            }

            // Ascending priority scan keeps Inside > Outside > On on ties.
            let mut best = Containment::On;
            let mut best_area = votes[2];
            for (label, area) in [(Containment::Outside, votes[1]), (Containment::Inside, votes[0])]
            {
                if area >= best_area {
                    best = label;
                    best_area = area;
                }
            }
            region.containment = best;

            if !owner_area.is_empty() {
                if owner_area.len() > 1 {
                    warn!("region with conflicting coplanar owners; larger area wins");
                }
                let owner = owner_area
                    .iter()
                    .max_by(|a, b| {
                        a.1.partial_cmp(b.1)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(b.0.cmp(a.0))
                    })
                    .map(|(&key, _)| key_owner(key))
                    .unwrap_or(CoplanarOwner::None);
                region.coplanar_owner = owner;
            }
        }

        Self {
            patch_containment,
            patch_region,
            regions,
        }
    }

    /// True when no region of this operand lies inside the opposite
    /// solid.
    pub fn no_inside_regions(&self) -> bool {
        self.regions
            .iter()
            .all(|r| r.containment != Containment::Inside)
    }
}

fn label_index(label: Containment) -> usize {
    match label {
        Containment::Inside => 0,
        Containment::Outside => 1,
        Containment::On => 2,
    }
}

fn owner_key(owner: CoplanarOwner) -> u8 {
    match owner {
        CoplanarOwner::None => 0,
        CoplanarOwner::MeshA => 1,
        CoplanarOwner::MeshB => 2,
    }
}

fn key_owner(key: u8) -> CoplanarOwner {
    match key {
        1 => CoplanarOwner::MeshA,
        2 => CoplanarOwner::MeshB,
        _ => CoplanarOwner::None,
    }
}

/// Weld patch corners on the merge grid and build the edge -> incident
/// patches map plus the set of cut edges.
///
/// A welded edge is a cut edge when both endpoints resolve to distinct
/// global intersection vertices joined by a graph edge. Welded corners
/// resolving to more than one global id are ambiguous and excluded.
fn weld_and_collect_edges(
    subdivision: &TriangleSubdivision,
    graph: &IntersectionGraph,
    tol: &Tolerances,
) -> (
    AHashMap<(usize, usize), Vec<(usize, usize)>>,
    AHashMap<(usize, usize), ()>,
) {
    let quantum = tol.merge_epsilon;
    let mut weld_ids: AHashMap<(i64, i64, i64), usize> = AHashMap::new();
    // Welded id -> resolved global id; usize::MAX marks ambiguity.
    let mut weld_global: AHashMap<usize, usize> = AHashMap::new();

    // Quantized lookup for graph vertices at the weld resolution, with
    // collisions marked ambiguous.
    let mut graph_keys: AHashMap<(i64, i64, i64), usize> = AHashMap::new();
    for (global, position) in graph.vertices.iter().enumerate() {
        let key = super::graph::quantize(position, quantum);
        match graph_keys.get(&key) {
            Some(&existing) if existing != global => {
                warn!("ambiguous weld key for global vertices {existing} and {global}");
                graph_keys.insert(key, usize::MAX);
            }
            Some(_) => {}
            None => {
                graph_keys.insert(key, global);
            }
        }
    }

    let mut edge_patches: AHashMap<(usize, usize), Vec<(usize, usize)>> = AHashMap::new();

    for (tri, patches) in subdivision.patches.iter().enumerate() {
        for (patch_idx, patch) in patches.iter().enumerate() {
            let welded: [usize; 3] = std::array::from_fn(|corner| {
                let key = super::graph::quantize(&patch.vertices[corner], quantum);
                let next_id = weld_ids.len();
                let id = *weld_ids.entry(key).or_insert(next_id);

                // Resolve the welded corner to a global vertex: the id the
                // patch carries, else the quantized table.
                let resolved = patch.vertex_globals[corner]
                    .or_else(|| graph_keys.get(&key).copied().filter(|&g| g != usize::MAX));
                if let Some(global) = resolved {
                    match weld_global.get(&id) {
                        Some(&existing) if existing != global && existing != usize::MAX => {
                            warn!(
                                "welded corner maps to globals {existing} and {global}; \
                                 excluded from cut-edge recognition"
                            );
                            weld_global.insert(id, usize::MAX);
                        }
                        Some(_) => {}
                        None => {
                            weld_global.insert(id, global);
                        }
                    }
                }
                id
            });

            for corner in 0..3 {
                let a = welded[corner];
                let b = welded[(corner + 1) % 3];
                if a == b {
                    continue;
                }
                let key = if a < b { (a, b) } else { (b, a) };
                edge_patches.entry(key).or_default().push((tri, patch_idx));
            }
        }
    }

    let mut cut_edges: AHashMap<(usize, usize), ()> = AHashMap::new();
    for &edge in edge_patches.keys() {
        let (Some(&ga), Some(&gb)) = (weld_global.get(&edge.0), weld_global.get(&edge.1)) else {
            continue;
        };
        if ga == usize::MAX || gb == usize::MAX || ga == gb {
            continue;
        }
        if graph.has_edge(ga, gb) {
            cut_edges.insert(edge, ());
        }
    }

    (edge_patches, cut_edges)
}

/// Index-based union-find with path halving.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins, keeping region numbering deterministic.
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[merge] = keep;
        }
    }
}
