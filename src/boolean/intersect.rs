// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Pair intersection: classify candidate triangle pairs and compute their
//! raw intersection features in both triangles' barycentrics

use crate::geometry::barycentric::{
    barycentric_2d, barycentric_of, dominant_axis, point_from_barycentric, project_dropping_axis,
    ring_signed_area, Barycentric,
};
use crate::geometry::InputTriangle;
use crate::tolerances::Tolerances;
use log::debug;
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// How a candidate pair intersects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntersectionKind {
    /// The pair does not intersect.
    None,
    /// A single shared point.
    Point,
    /// A shared segment (possibly chained through breakpoints).
    Segment,
    /// Coplanar triangles overlapping in an area.
    Area,
}

/// Classification record for one candidate pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PairIntersection {
    /// Triangle index in operand A.
    pub tri_a: usize,
    /// Triangle index in operand B.
    pub tri_b: usize,
    /// Intersection classification.
    pub kind: IntersectionKind,
}

/// A point lying on both triangles of a pair, stored in both barycentrics.
/// Its pair-local id is its index in [`PairFeatures::vertices`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PairVertex {
    /// Barycentric relative to the A triangle.
    pub bary_a: Barycentric,
    /// Barycentric relative to the B triangle.
    pub bary_b: Barycentric,
}

/// An undirected segment between two pair-local vertex ids. The same
/// geometric segment lies on both triangles simultaneously.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PairSegment {
    pub start: usize,
    pub end: usize,
}

/// Deduplicated vertices and segments of one pair's intersection.
/// Segments reference only vertices declared here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairFeatures {
    pub vertices: Vec<PairVertex>,
    pub segments: Vec<PairSegment>,
}

impl PairFeatures {
    /// True when the pair contributed nothing.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.segments.is_empty()
    }
}

/// All candidate pairs with their classifications and features, aligned
/// 1:1.
#[derive(Debug, Clone, Default)]
pub struct IntersectionSet {
    /// One record per candidate pair, in candidate order.
    pub intersections: Vec<PairIntersection>,
    /// Features for the pair at the same index.
    pub features: Vec<PairFeatures>,
}

impl IntersectionSet {
    /// Classify every candidate pair.
    pub fn build(
        a: &[InputTriangle],
        b: &[InputTriangle],
        pairs: &[(usize, usize)],
        tol: &Tolerances,
    ) -> Self {
        let mut set = Self {
            intersections: Vec::with_capacity(pairs.len()),
            features: Vec::with_capacity(pairs.len()),
        };
        for &(tri_a, tri_b) in pairs {
            let (kind, features) = intersect_pair(&a[tri_a], &b[tri_b], tol);
            set.intersections.push(PairIntersection {
                tri_a,
                tri_b,
                kind,
            });
            set.features.push(features);
        }
        set
    }

    /// Number of candidate pairs (including `None` classifications).
    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    /// True when no candidate pairs were provided.
    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }
}

/// Classify one pair and compute its features.
pub fn intersect_pair(
    ta: &InputTriangle,
    tb: &InputTriangle,
    tol: &Tolerances,
) -> (IntersectionKind, PairFeatures) {
    let (plane_a, plane_b) = match (ta.plane(), tb.plane()) {
        (Some(pa), Some(pb)) => (pa, pb),
        _ => {
            debug_assert!(false, "degenerate triangle reached pair intersection");
            debug!("dropping pair with degenerate triangle");
            return (IntersectionKind::None, PairFeatures::default());
        }
    };

    if is_coplanar(tb, plane_a, tol) {
        coplanar_features(ta, tb, tol)
    } else {
        non_coplanar_features(ta, tb, plane_a, plane_b, tol)
    }
}

/// Two triangles are coplanar when one's three vertices all lie within
/// the plane-side epsilon of the other's plane.
fn is_coplanar(tb: &InputTriangle, plane_a: (nalgebra::Vector3<f64>, f64), tol: &Tolerances) -> bool {
    let (n, d) = plane_a;
    tb.points()
        .iter()
        .all(|p| (n.dot(&p.coords) - d).abs() <= tol.plane_side_epsilon)
}

fn non_coplanar_features(
    ta: &InputTriangle,
    tb: &InputTriangle,
    plane_a: (nalgebra::Vector3<f64>, f64),
    plane_b: (nalgebra::Vector3<f64>, f64),
    tol: &Tolerances,
) -> (IntersectionKind, PairFeatures) {
    let pts_a = ta.points();
    let pts_b = tb.points();

    let dist_a: [f64; 3] = std::array::from_fn(|i| plane_b.0.dot(&pts_a[i].coords) - plane_b.1);
    let dist_b: [f64; 3] = std::array::from_fn(|i| plane_a.0.dot(&pts_b[i].coords) - plane_a.1);

    let eps = tol.triangle_predicate_epsilon;
    if dist_a.iter().all(|&d| d > eps) || dist_a.iter().all(|&d| d < -eps) {
        return (IntersectionKind::None, PairFeatures::default());
    }
    if dist_b.iter().all(|&d| d > eps) || dist_b.iter().all(|&d| d < -eps) {
        return (IntersectionKind::None, PairFeatures::default());
    }

    let mut samples: Vec<Point3<f64>> = Vec::new();
    collect_crossings(&pts_a, &dist_a, &pts_b, tol, &mut samples);
    collect_crossings(&pts_b, &dist_b, &pts_a, tol, &mut samples);

    // Dedupe in world space.
    let unique = dedupe_world(&samples, tol.feature_world_distance_epsilon_squared);
    if unique.is_empty() {
        return (IntersectionKind::None, PairFeatures::default());
    }

    let spread = max_pairwise_distance_squared(&unique);
    let kind = if unique.len() < 2 || spread <= tol.feature_world_distance_epsilon_squared {
        IntersectionKind::Point
    } else {
        IntersectionKind::Segment
    };

    let mut features = PairFeatures::default();
    for p in &unique {
        if push_pair_vertex(&mut features, &pts_a, &pts_b, p, tol).is_none() {
            // A failed barycentric solve means the pair is degenerate.
            debug!("dropping pair: barycentric solve failed on intersection sample");
            return (IntersectionKind::None, PairFeatures::default());
        }
    }

    match kind {
        IntersectionKind::Point => {
            features.vertices.truncate(1);
            (IntersectionKind::Point, features)
        }
        IntersectionKind::Segment => {
            chain_segments(&mut features, &pts_a, &unique);
            if features.segments.is_empty() {
                // All samples merged into one vertex after barycentric
                // dedupe; degrade to a point.
                features.vertices.truncate(1);
                (IntersectionKind::Point, features)
            } else {
                (IntersectionKind::Segment, features)
            }
        }
        _ => unreachable!(),
    }
}

/// Collect world-space points where source vertices lie on the target
/// plane inside the target triangle, plus where source edges cross the
/// target plane inside the target triangle.
fn collect_crossings(
    src: &[Point3<f64>; 3],
    src_dist: &[f64; 3],
    target: &[Point3<f64>; 3],
    tol: &Tolerances,
    samples: &mut Vec<Point3<f64>>,
) {
    for i in 0..3 {
        if src_dist[i].abs() <= tol.plane_side_epsilon {
            if inside_target(target, &src[i], tol) {
                samples.push(src[i]);
            }
        }
    }
    for i in 0..3 {
        let j = (i + 1) % 3;
        let (d0, d1) = (src_dist[i], src_dist[j]);
        if d0 * d1 < 0.0 && d0.abs() > tol.plane_side_epsilon && d1.abs() > tol.plane_side_epsilon {
            let t = d0 / (d0 - d1);
            let p = src[i] + (src[j] - src[i]) * t;
            if inside_target(target, &p, tol) {
                samples.push(p);
            }
        }
    }
}

fn inside_target(target: &[Point3<f64>; 3], p: &Point3<f64>, tol: &Tolerances) -> bool {
    match barycentric_of(target, p, tol.triangle_predicate_epsilon) {
        Some(bary) => bary.is_inside_inclusive(tol.barycentric_inside_epsilon),
        None => false,
    }
}

/// Register a world sample as a pair vertex, deduplicating against
/// existing vertices by barycentric closeness on both triangles.
/// Returns the local id, or `None` when a barycentric solve fails (the
/// caller drops the pair).
fn push_pair_vertex(
    features: &mut PairFeatures,
    pts_a: &[Point3<f64>; 3],
    pts_b: &[Point3<f64>; 3],
    p: &Point3<f64>,
    tol: &Tolerances,
) -> Option<usize> {
    let bary_a = barycentric_of(pts_a, p, tol.triangle_predicate_epsilon)?;
    let bary_b = barycentric_of(pts_b, p, tol.triangle_predicate_epsilon)?;
    for (local, existing) in features.vertices.iter().enumerate() {
        if existing.bary_a.max_component_delta(&bary_a) <= tol.feature_barycentric_epsilon
            && existing.bary_b.max_component_delta(&bary_b) <= tol.feature_barycentric_epsilon
        {
            return Some(local);
        }
    }
    features.vertices.push(PairVertex { bary_a, bary_b });
    Some(features.vertices.len() - 1)
}

/// Order segment samples along the axis between the two farthest samples
/// and emit consecutive segments, preserving intermediate breakpoints so
/// adjacent triangles agree on chord decomposition.
fn chain_segments(features: &mut PairFeatures, pts_a: &[Point3<f64>; 3], unique: &[Point3<f64>]) {
    let (i0, i1) = farthest_pair(unique);
    let dir = unique[i1] - unique[i0];

    let mut order: Vec<(f64, usize)> = features
        .vertices
        .iter()
        .enumerate()
        .map(|(local, vertex)| {
            let p = point_from_barycentric(pts_a, &vertex.bary_a);
            ((p - unique[i0]).dot(&dir), local)
        })
        .collect();
    order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    for window in order.windows(2) {
        let (start, end) = (window[0].1, window[1].1);
        if start != end {
            features.segments.push(PairSegment { start, end });
        }
    }
}

fn farthest_pair(points: &[Point3<f64>]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_dist = -1.0;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d = (points[j] - points[i]).norm_squared();
            if d > best_dist {
                best_dist = d;
                best = (i, j);
            }
        }
    }
    best
}

fn max_pairwise_distance_squared(points: &[Point3<f64>]) -> f64 {
    let (i, j) = farthest_pair(points);
    if points.len() < 2 {
        0.0
    } else {
        (points[j] - points[i]).norm_squared()
    }
}

fn dedupe_world(points: &[Point3<f64>], eps_sq: f64) -> Vec<Point3<f64>> {
    let mut unique: Vec<Point3<f64>> = Vec::new();
    for p in points {
        if !unique.iter().any(|q| (p - q).norm_squared() <= eps_sq) {
            unique.push(*p);
        }
    }
    unique
}

fn coplanar_features(
    ta: &InputTriangle,
    tb: &InputTriangle,
    tol: &Tolerances,
) -> (IntersectionKind, PairFeatures) {
    let axis = dominant_axis(&ta.normal);
    let pts_a = ta.points();
    let pts_b = tb.points();
    let a2: [Point2<f64>; 3] = std::array::from_fn(|i| project_dropping_axis(&pts_a[i], axis));
    let b2: [Point2<f64>; 3] = std::array::from_fn(|i| project_dropping_axis(&pts_b[i], axis));

    let mut samples: Vec<Point2<f64>> = Vec::new();

    // Vertices of each triangle inside the other (inclusive).
    for p in &a2 {
        if inside_2d(&b2, p, tol) {
            samples.push(*p);
        }
    }
    for p in &b2 {
        if inside_2d(&a2, p, tol) {
            samples.push(*p);
        }
    }

    // All edge-edge crossings of the two projected triangles.
    for i in 0..3 {
        let (p1, p2) = (a2[i], a2[(i + 1) % 3]);
        for j in 0..3 {
            let (q1, q2) = (b2[j], b2[(j + 1) % 3]);
            if let Some(p) = segment_intersection_2d(&p1, &p2, &q1, &q2, tol) {
                samples.push(p);
            }
        }
    }

    let unique = dedupe_2d(&samples, tol.triangle_predicate_epsilon);
    if unique.is_empty() {
        return (IntersectionKind::None, PairFeatures::default());
    }

    // Map candidates back to both triangles' barycentrics.
    let mut features = PairFeatures::default();
    let mut local_of_sample: Vec<usize> = Vec::with_capacity(unique.len());
    for p in &unique {
        let bary_a = barycentric_2d(&a2, p, tol.triangle_predicate_epsilon);
        let bary_b = barycentric_2d(&b2, p, tol.triangle_predicate_epsilon);
        let (Some(bary_a), Some(bary_b)) = (bary_a, bary_b) else {
            debug!("dropping coplanar pair: degenerate projected triangle");
            return (IntersectionKind::None, PairFeatures::default());
        };
        let mut local = None;
        for (idx, existing) in features.vertices.iter().enumerate() {
            if existing.bary_a.max_component_delta(&bary_a) <= tol.feature_barycentric_epsilon
                && existing.bary_b.max_component_delta(&bary_b) <= tol.feature_barycentric_epsilon
            {
                local = Some(idx);
                break;
            }
        }
        let local = local.unwrap_or_else(|| {
            features.vertices.push(PairVertex { bary_a, bary_b });
            features.vertices.len() - 1
        });
        local_of_sample.push(local);
    }

    match features.vertices.len() {
        1 => {
            features.segments.clear();
            (IntersectionKind::Point, features)
        }
        2 => {
            features.segments.push(PairSegment { start: 0, end: 1 });
            (IntersectionKind::Segment, features)
        }
        _ => {
            // Order the convex overlap loop by angle around the centroid.
            let loop_order = convex_loop_order(&unique, &local_of_sample);
            let ring: Vec<Point2<f64>> = loop_order.iter().map(|&(_, s)| unique[s]).collect();
            if ring_signed_area(&ring).abs() <= tol.triangle_predicate_epsilon {
                // Collinear overlap degrades to a segment between the two
                // farthest samples.
                let (i, j) = farthest_pair_2d(&unique);
                let (s, e) = (local_of_sample[i], local_of_sample[j]);
                if s == e {
                    features.segments.clear();
                    (IntersectionKind::Point, features)
                } else {
                    features.segments.push(PairSegment { start: s, end: e });
                    (IntersectionKind::Segment, features)
                }
            } else {
                for k in 0..loop_order.len() {
                    let start = loop_order[k].0;
                    let end = loop_order[(k + 1) % loop_order.len()].0;
                    if start != end {
                        features.segments.push(PairSegment { start, end });
                    }
                }
                (IntersectionKind::Area, features)
            }
        }
    }
}

fn inside_2d(tri: &[Point2<f64>; 3], p: &Point2<f64>, tol: &Tolerances) -> bool {
    match barycentric_2d(tri, p, tol.triangle_predicate_epsilon) {
        Some(bary) => bary.is_inside_inclusive(tol.barycentric_inside_epsilon),
        None => false,
    }
}

/// Intersection point of two 2D segments; parallel pairs are rejected and
/// parameters are accepted in [-eps, 1 + eps], clamped.
fn segment_intersection_2d(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    q1: &Point2<f64>,
    q2: &Point2<f64>,
    tol: &Tolerances,
) -> Option<Point2<f64>> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() <= tol.triangle_predicate_epsilon {
        return None;
    }
    let qp = q1 - p1;
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    let eps = tol.barycentric_inside_epsilon;
    if t < -eps || t > 1.0 + eps || u < -eps || u > 1.0 + eps {
        return None;
    }
    let t = t.clamp(0.0, 1.0);
    Some(p1 + r * t)
}

fn dedupe_2d(points: &[Point2<f64>], eps: f64) -> Vec<Point2<f64>> {
    let mut unique: Vec<Point2<f64>> = Vec::new();
    for p in points {
        if !unique.iter().any(|q| (p - q).norm() <= eps) {
            unique.push(*p);
        }
    }
    unique
}

fn farthest_pair_2d(points: &[Point2<f64>]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_dist = -1.0;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d = (points[j] - points[i]).norm_squared();
            if d > best_dist {
                best_dist = d;
                best = (i, j);
            }
        }
    }
    best
}

/// Order (local id, sample index) pairs counter-clockwise around the
/// sample centroid.
fn convex_loop_order(unique: &[Point2<f64>], local_of_sample: &[usize]) -> Vec<(usize, usize)> {
    let n = unique.len() as f64;
    let cx = unique.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = unique.iter().map(|p| p.y).sum::<f64>() / n;
    let mut order: Vec<(usize, usize)> = local_of_sample
        .iter()
        .enumerate()
        .map(|(sample, &local)| (local, sample))
        .collect();
    order.sort_by(|a, b| {
        let pa = unique[a.1];
        let pb = unique[b.1];
        let angle_a = (pa.y - cy).atan2(pa.x - cx);
        let angle_b = (pb.y - cy).atan2(pb.x - cx);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.dedup_by_key(|&mut (local, _)| local);
    order
}
