// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Triangle subdivision: turn each cut triangle's PSLG faces into world
//! space patches

use super::graph::IntersectionGraph;
use super::index::TriangleIntersectionIndex;
use super::intersect::{IntersectionKind, IntersectionSet};
use super::pslg::Pslg;
use super::topology::MeshTopology;
use crate::error::{KernelError, KernelResult, MeshSide};
use crate::geometry::barycentric::{
    barycentric_2d, barycentric_of, point_from_barycentric, signed_area_2d, Barycentric,
};
use crate::geometry::InputTriangle;
use crate::tolerances::Tolerances;
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Which operand owns a coplanar overlap surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoplanarOwner {
    /// Not part of a coplanar overlap.
    None,
    /// Operand A owns the surface.
    MeshA,
    /// Operand B owns the surface.
    MeshB,
}

/// One sub-triangle of an input triangle after subdivision.
#[derive(Debug, Clone)]
pub struct TrianglePatch {
    /// World-space corners, wound like the source triangle.
    pub vertices: [Point3<f64>; 3],
    /// Global intersection vertex ids, `None` for original corners.
    pub vertex_globals: [Option<usize>; 3],
    /// Face id within the parent triangle's subdivision; patches from the
    /// same PSLG face share an id.
    pub face_id: usize,
    /// Coplanar overlap tag.
    pub coplanar_owner: CoplanarOwner,
    /// Index of the parent triangle in its operand.
    pub source_triangle: usize,
}

impl TrianglePatch {
    /// World-space area.
    pub fn area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        (b - a).cross(&(c - a)).norm() * 0.5
    }

    /// World-space centroid.
    pub fn centroid(&self) -> Point3<f64> {
        let [a, b, c] = self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }
}

/// Subdivision result for one operand: patches per source triangle.
#[derive(Debug, Clone)]
pub struct TriangleSubdivision {
    pub patches: Vec<Vec<TrianglePatch>>,
}

impl TriangleSubdivision {
    /// Total patch count.
    pub fn patch_count(&self) -> usize {
        self.patches.iter().map(Vec::len).sum()
    }
}

/// Subdivide every triangle of one operand along its intersection edges.
#[allow(clippy::too_many_arguments)]
pub fn subdivide_mesh(
    side: MeshSide,
    triangles: &[InputTriangle],
    opposite: &[InputTriangle],
    set: &IntersectionSet,
    graph: &IntersectionGraph,
    index: &TriangleIntersectionIndex,
    topology: &MeshTopology,
    tol: &Tolerances,
) -> KernelResult<TriangleSubdivision> {
    // Area-kind pairs per triangle drive coplanar-owner tagging.
    let mut area_pairs: Vec<Vec<usize>> = vec![Vec::new(); triangles.len()];
    for (pair_idx, record) in set.intersections.iter().enumerate() {
        if record.kind == IntersectionKind::Area {
            let tri = match side {
                MeshSide::A => record.tri_a,
                MeshSide::B => record.tri_b,
            };
            area_pairs[tri].push(pair_idx);
        }
    }

    let mut patches = Vec::with_capacity(triangles.len());
    for (tri_idx, triangle) in triangles.iter().enumerate() {
        let mut tri_patches =
            subdivide_triangle(side, tri_idx, triangle, graph, index, topology, tol)?;
        tag_coplanar_patches(
            side,
            triangle,
            &mut tri_patches,
            &area_pairs[tri_idx],
            set,
            opposite,
            tol,
        );
        patches.push(tri_patches);
    }
    Ok(TriangleSubdivision { patches })
}

fn subdivide_triangle(
    side: MeshSide,
    tri_idx: usize,
    triangle: &InputTriangle,
    graph: &IntersectionGraph,
    index: &TriangleIntersectionIndex,
    topology: &MeshTopology,
    tol: &Tolerances,
) -> KernelResult<Vec<TrianglePatch>> {
    let points = index.vertices_of(tri_idx);
    let edges = topology.edges_of(tri_idx);
    let world = triangle.points();

    // Fast path: untouched triangle. Attached vertices force the general
    // path even without edges, so a side split by a neighbor's cut is
    // split here too.
    if edges.is_empty() && points.is_empty() {
        return Ok(vec![TrianglePatch {
            vertices: world,
            vertex_globals: [None; 3],
            face_id: 0,
            coplanar_owner: CoplanarOwner::None,
            source_triangle: tri_idx,
        }]);
    }

    // Fast path: one chord between two distinct sides, no extra vertices.
    if edges.len() == 1 && points.len() == 2 {
        if let Some(patches) =
            try_single_chord(tri_idx, &world, points, graph, edges[0], tol)
        {
            return Ok(patches);
        }
    }

    // General path through the PSLG.
    let mut pslg_points: Vec<(usize, Point2<f64>)> = points
        .iter()
        .map(|r| (r.global, Point2::new(r.bary.u, r.bary.v)))
        .collect();
    let pslg_segments: Vec<(usize, usize)> = edges
        .iter()
        .map(|&e| graph.edges[e])
        .collect();
    // Edge splitting can break a chord at vertices introduced by other
    // pairs; attach any segment endpoint the index missed.
    for &(gu, gv) in &pslg_segments {
        for global in [gu, gv] {
            if pslg_points.iter().any(|&(g, _)| g == global) {
                continue;
            }
            let Some(bary) =
                barycentric_of(&world, &graph.vertices[global], tol.triangle_predicate_epsilon)
            else {
                continue;
            };
            pslg_points.push((global, Point2::new(bary.u, bary.v)));
        }
    }
    let pslg = Pslg::build(&pslg_points, &pslg_segments, tol).map_err(|detail| {
        KernelError::SubdivisionInvariant {
            side,
            triangle: tri_idx,
            detail,
        }
    })?;

    faces_to_patches(side, tri_idx, &world, &pslg, graph, tol)
}

/// Single-chord subdivision: one triangle on the shared-corner side of
/// the chord and two quad triangles on the other.
///
/// Returns `None` when an endpoint sits on a corner or off a side; the
/// caller falls through to the general path.
fn try_single_chord(
    tri_idx: usize,
    world: &[Point3<f64>; 3],
    points: &[super::index::TriangleVertexRef],
    graph: &IntersectionGraph,
    edge_id: usize,
    tol: &Tolerances,
) -> Option<Vec<TrianglePatch>> {
    let edge = graph.edges[edge_id];
    let find = |global: usize| points.iter().find(|r| r.global == global);
    let (p, q) = (find(edge.0)?, find(edge.1)?);

    let side_of = |bary: &Barycentric| -> Option<usize> {
        // Reject corners outright.
        let corners = [
            Barycentric::new(1.0, 0.0, 0.0),
            Barycentric::new(0.0, 1.0, 0.0),
            Barycentric::new(0.0, 0.0, 1.0),
        ];
        if corners
            .iter()
            .any(|c| bary.max_component_delta(c) <= tol.eps_corner)
        {
            return None;
        }
        let zero = [
            bary.w.abs() <= tol.eps_side, // side V0 -> V1
            bary.u.abs() <= tol.eps_side, // side V1 -> V2
            bary.v.abs() <= tol.eps_side, // side V2 -> V0
        ];
        match (zero[0], zero[1], zero[2]) {
            (true, false, false) => Some(0),
            (false, true, false) => Some(1),
            (false, false, true) => Some(2),
            _ => None,
        }
    };

    let (mut first, mut second) = (p, q);
    let (mut side_first, mut side_second) = (side_of(&p.bary)?, side_of(&q.bary)?);
    if side_first == side_second {
        return None;
    }
    // Canonicalize so the second endpoint's side follows the first's in
    // cyclic order.
    if (side_first + 1) % 3 != side_second {
        std::mem::swap(&mut first, &mut second);
        std::mem::swap(&mut side_first, &mut side_second);
    }

    let shared = (side_first + 1) % 3;
    let far = (side_first + 2) % 3;
    let near = side_first;

    // Graph positions keep the chord endpoints bit-identical across every
    // triangle touching them.
    let wp = graph.vertices[first.global];
    let wq = graph.vertices[second.global];

    let patches = vec![
        TrianglePatch {
            vertices: [wp, world[shared], wq],
            vertex_globals: [Some(first.global), None, Some(second.global)],
            face_id: 0,
            coplanar_owner: CoplanarOwner::None,
            source_triangle: tri_idx,
        },
        TrianglePatch {
            vertices: [wq, world[far], world[near]],
            vertex_globals: [Some(second.global), None, None],
            face_id: 1,
            coplanar_owner: CoplanarOwner::None,
            source_triangle: tri_idx,
        },
        TrianglePatch {
            vertices: [wq, world[near], wp],
            vertex_globals: [Some(second.global), None, Some(first.global)],
            face_id: 1,
            coplanar_owner: CoplanarOwner::None,
            source_triangle: tri_idx,
        },
    ];
    Some(patches)
}

/// Triangulate each selected PSLG face and map the result to world space.
fn faces_to_patches(
    side: MeshSide,
    tri_idx: usize,
    world: &[Point3<f64>; 3],
    pslg: &Pslg,
    graph: &IntersectionGraph,
    tol: &Tolerances,
) -> KernelResult<Vec<TrianglePatch>> {
    let invariant = |detail: String| KernelError::SubdivisionInvariant {
        side,
        triangle: tri_idx,
        detail,
    };

    let mut patches = Vec::new();
    for (face_id, &face_idx) in pslg.interior.iter().enumerate() {
        let face = &pslg.faces[face_idx];

        let ring: Vec<(usize, Point2<f64>)> = if face.holes.is_empty() {
            face.outer
                .iter()
                .map(|&v| (v, pslg.vertices[v].uv))
                .collect()
        } else {
            stitch_holes(face, pslg, tol).map_err(invariant)?
        };

        let ears = ear_clip(&ring, tol).map_err(invariant)?;

        // Triangulated area must match the face area.
        let triangulated: f64 = ears
            .iter()
            .map(|&[a, b, c]| signed_area_2d(&ring[a].1, &ring[b].1, &ring[c].1))
            .sum();
        let allowed = tol
            .eps_area
            .max(tol.barycentric_inside_epsilon * face.net_area.abs());
        if (triangulated - face.net_area).abs() > allowed {
            return Err(invariant(format!(
                "triangulated area {triangulated:.3e} disagrees with face area {:.3e}",
                face.net_area
            )));
        }

        for &[a, b, c] in &ears {
            let ids = [ring[a].0, ring[b].0, ring[c].0];
            let uvs = [ring[a].1, ring[b].1, ring[c].1];
            // Intersection vertices take their graph position so every
            // triangle touching them emits the exact same coordinates;
            // chart-only vertices map through the barycentric.
            let mut vertices = [Point3::origin(); 3];
            for corner in 0..3 {
                let pslg_vertex = &pslg.vertices[ids[corner]];
                vertices[corner] = match pslg_vertex.global {
                    // Snapped corners keep the exact lattice position.
                    Some(global) if !pslg_vertex.is_corner => graph.vertices[global],
                    _ => {
                        let uv = uvs[corner];
                        point_from_barycentric(
                            world,
                            &Barycentric::new(uv.x, uv.y, 1.0 - uv.x - uv.y),
                        )
                    }
                };
            }
            let [p0, p1, p2] = vertices;
            if (p1 - p0).cross(&(p2 - p0)).norm() <= 0.0 {
                return Err(invariant(format!(
                    "patch of face {face_id} maps to zero world area at {p0:?}"
                )));
            }
            patches.push(TrianglePatch {
                vertices,
                vertex_globals: ids.map(|v| pslg.vertices[v].global),
                face_id,
                coplanar_owner: CoplanarOwner::None,
                source_triangle: tri_idx,
            });
        }
    }
    Ok(patches)
}

/// Splice hole rings into the outer ring via visibility bridges. Each
/// bridge appears twice (out and back), keeping the ring closed.
fn stitch_holes(
    face: &super::pslg::PslgFace,
    pslg: &Pslg,
    tol: &Tolerances,
) -> Result<Vec<(usize, Point2<f64>)>, String> {
    let mut ring: Vec<(usize, Point2<f64>)> = face
        .outer
        .iter()
        .map(|&v| (v, pslg.vertices[v].uv))
        .collect();
    let mut bridges: Vec<(Point2<f64>, Point2<f64>)> = Vec::new();

    for hole in &face.holes {
        // Entry vertex: the hole vertex with the smallest (x, y).
        let entry = hole
            .iter()
            .enumerate()
            .min_by(|(_, &v1), (_, &v2)| {
                let a = pslg.vertices[v1].uv;
                let b = pslg.vertices[v2].uv;
                (a.x, a.y)
                    .partial_cmp(&(b.x, b.y))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(pos, _)| pos)
            .ok_or_else(|| "empty hole ring".to_string())?;
        let entry_uv = pslg.vertices[hole[entry]].uv;

        // Closest outer-ring vertex with an unobstructed bridge.
        let mut candidates: Vec<(f64, usize)> = ring
            .iter()
            .enumerate()
            .map(|(pos, &(_, uv))| ((uv - entry_uv).norm_squared(), pos))
            .collect();
        candidates
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let anchor = candidates
            .iter()
            .map(|&(_, pos)| pos)
            .find(|&pos| {
                let anchor_uv = ring[pos].1;
                bridge_is_clear(&anchor_uv, &entry_uv, pslg, &bridges, tol)
            })
            .ok_or_else(|| "no visible bridge from hole to outer ring".to_string())?;
        let anchor_uv = ring[anchor].1;

        // Splice: outer[..=anchor], hole clockwise from entry, back to
        // the anchor, outer[anchor+1..].
        let mut spliced: Vec<(usize, Point2<f64>)> = Vec::with_capacity(ring.len() + hole.len() + 2);
        spliced.extend_from_slice(&ring[..=anchor]);
        for step in 0..=hole.len() {
            // Holes are stored counter-clockwise; traverse reversed.
            let pos = (entry + hole.len() - (step % hole.len())) % hole.len();
            let v = hole[pos];
            spliced.push((v, pslg.vertices[v].uv));
        }
        spliced.push((ring[anchor].0, anchor_uv));
        spliced.extend_from_slice(&ring[anchor + 1..]);

        bridges.push((anchor_uv, entry_uv));
        ring = spliced;
    }
    Ok(ring)
}

/// A bridge is usable when it properly crosses no subdivision edge and no
/// earlier bridge.
fn bridge_is_clear(
    from: &Point2<f64>,
    to: &Point2<f64>,
    pslg: &Pslg,
    bridges: &[(Point2<f64>, Point2<f64>)],
    tol: &Tolerances,
) -> bool {
    let eps = tol.pslg_vertex_merge_epsilon;
    for edge in &pslg.edges {
        let a = pslg.vertices[edge.a].uv;
        let b = pslg.vertices[edge.b].uv;
        if segments_properly_cross(from, to, &a, &b, eps) {
            return false;
        }
    }
    for (a, b) in bridges {
        if segments_properly_cross(from, to, a, b, eps) {
            return false;
        }
    }
    true
}

/// True when the open segments cross away from all four endpoints.
fn segments_properly_cross(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    q1: &Point2<f64>,
    q2: &Point2<f64>,
    endpoint_eps: f64,
) -> bool {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() <= 1e-15 {
        return false;
    }
    let qp = q1 - p1;
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return false;
    }
    let crossing = p1 + r * t;
    for endpoint in [p1, p2, q1, q2] {
        if (crossing - endpoint).norm() <= endpoint_eps {
            return false;
        }
    }
    true
}

/// Ear-clipping triangulation over a (possibly spliced) ring. Returns
/// index triples into the ring.
fn ear_clip(
    ring: &[(usize, Point2<f64>)],
    tol: &Tolerances,
) -> Result<Vec<[usize; 3]>, String> {
    if ring.len() < 3 {
        return Err(format!("cannot triangulate ring of {} vertices", ring.len()));
    }
    let mut remaining: Vec<usize> = (0..ring.len()).collect();
    let mut ears = Vec::with_capacity(ring.len() - 2);

    while remaining.len() > 3 {
        let mut clipped = false;
        for i in 0..remaining.len() {
            let prev = remaining[(i + remaining.len() - 1) % remaining.len()];
            let curr = remaining[i];
            let next = remaining[(i + 1) % remaining.len()];
            if is_ear(ring, &remaining, prev, curr, next, tol) {
                ears.push([prev, curr, next]);
                remaining.remove(i);
                clipped = true;
                break;
            }
        }
        if !clipped {
            return Err(format!(
                "ear-clipping cannot find an ear among {} remaining vertices",
                remaining.len()
            ));
        }
    }
    let [a, b, c] = [remaining[0], remaining[1], remaining[2]];
    if signed_area_2d(&ring[a].1, &ring[b].1, &ring[c].1) > tol.eps_area {
        ears.push([a, b, c]);
    }
    Ok(ears)
}

fn is_ear(
    ring: &[(usize, Point2<f64>)],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    tol: &Tolerances,
) -> bool {
    let (a, b, c) = (ring[prev].1, ring[curr].1, ring[next].1);
    if signed_area_2d(&a, &b, &c) <= tol.eps_area {
        return false;
    }
    let ear = [a, b, c];
    for &other in remaining {
        if other == prev || other == curr || other == next {
            continue;
        }
        let p = ring[other].1;
        // Ring vertices coincident with an ear corner (bridge duplicates)
        // do not block the ear.
        if ear
            .iter()
            .any(|corner| (p - corner).norm() <= tol.pslg_vertex_merge_epsilon)
        {
            continue;
        }
        if let Some(bary) = barycentric_2d(&ear, &p, 1e-18) {
            if bary.is_inside_strict(tol.barycentric_inside_epsilon) {
                return false;
            }
        }
    }
    true
}

/// Tag patches overlapping a coplanar opposite triangle with the owning
/// operand: the first operand for same-facing overlaps, the patch's own
/// operand for opposite-facing ones.
fn tag_coplanar_patches(
    side: MeshSide,
    triangle: &InputTriangle,
    patches: &mut [TrianglePatch],
    area_pairs: &[usize],
    set: &IntersectionSet,
    opposite: &[InputTriangle],
    tol: &Tolerances,
) {
    for &pair_idx in area_pairs {
        let record = &set.intersections[pair_idx];
        let opp_tri = match side {
            MeshSide::A => &opposite[record.tri_b],
            MeshSide::B => &opposite[record.tri_a],
        };
        let opp_points = opp_tri.points();
        let same_facing = triangle.normal.dot(&opp_tri.normal) > 0.0;
        let owner = if same_facing {
            CoplanarOwner::MeshA
        } else {
            match side {
                MeshSide::A => CoplanarOwner::MeshA,
                MeshSide::B => CoplanarOwner::MeshB,
            }
        };
        for patch in patches.iter_mut() {
            if patch.coplanar_owner != CoplanarOwner::None {
                continue;
            }
            let centroid = patch.centroid();
            let Some(bary) =
                barycentric_of(&opp_points, &centroid, tol.triangle_predicate_epsilon)
            else {
                continue;
            };
            if bary.is_inside_strict(tol.barycentric_inside_epsilon) {
                patch.coplanar_owner = owner;
            }
        }
    }
}
