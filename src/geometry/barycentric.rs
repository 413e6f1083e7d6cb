// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Barycentric coordinates and dominant-axis 2D projection

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A barycentric triple (u, v, w) with u + v + w = 1 identifying the point
/// `u * P0 + v * P1 + w * P2` on a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Barycentric {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

impl Barycentric {
    /// Fallback triple used by subdivision snapping when a solve degenerates.
    pub const ZERO: Barycentric = Barycentric {
        u: 0.0,
        v: 0.0,
        w: 0.0,
    };

    pub fn new(u: f64, v: f64, w: f64) -> Self {
        Self { u, v, w }
    }

    /// The (u, v) chart coordinates; w is implied by u + v + w = 1.
    pub fn uv(&self) -> Point2<f64> {
        Point2::new(self.u, self.v)
    }

    /// Inclusive containment: all components >= -eps and sum <= 1 + eps.
    pub fn is_inside_inclusive(&self, eps: f64) -> bool {
        self.u >= -eps && self.v >= -eps && self.w >= -eps && self.u + self.v + self.w <= 1.0 + eps
    }

    /// Strict containment: all components > eps.
    pub fn is_inside_strict(&self, eps: f64) -> bool {
        self.u > eps && self.v > eps && self.w > eps
    }

    /// Largest absolute componentwise difference to another triple.
    pub fn max_component_delta(&self, other: &Barycentric) -> f64 {
        (self.u - other.u)
            .abs()
            .max((self.v - other.v).abs())
            .max((self.w - other.w).abs())
    }
}

/// Index of the axis with the largest absolute component, the axis to drop
/// when projecting a triangle to 2D.
pub fn dominant_axis(normal: &Vector3<f64>) -> usize {
    let abs = normal.map(f64::abs);
    if abs.x >= abs.y && abs.x >= abs.z {
        0
    } else if abs.y >= abs.z {
        1
    } else {
        2
    }
}

/// Project a 3D point to 2D by dropping `axis`.
pub fn project_dropping_axis(p: &Point3<f64>, axis: usize) -> Point2<f64> {
    match axis {
        0 => Point2::new(p.y, p.z),
        1 => Point2::new(p.x, p.z),
        _ => Point2::new(p.x, p.y),
    }
}

/// Solve barycentric coordinates of `p` on the 2D triangle `tri`.
///
/// Returns `None` when the projected triangle is degenerate (denominator
/// within `denom_eps` of zero).
pub fn barycentric_2d(
    tri: &[Point2<f64>; 3],
    p: &Point2<f64>,
    denom_eps: f64,
) -> Option<Barycentric> {
    let [a, b, c] = tri;
    let denom = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if denom.abs() <= denom_eps {
        return None;
    }
    let u = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / denom;
    let v = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / denom;
    Some(Barycentric::new(u, v, 1.0 - u - v))
}

/// Solve barycentric coordinates of a world point on a world triangle by
/// projecting both along the triangle's dominant normal axis.
///
/// Returns `None` for degenerate triangles. Callers on the intersection
/// path drop the pair; subdivision snapping substitutes
/// [`Barycentric::ZERO`].
pub fn barycentric_of(
    points: &[Point3<f64>; 3],
    p: &Point3<f64>,
    denom_eps: f64,
) -> Option<Barycentric> {
    let normal = (points[1] - points[0]).cross(&(points[2] - points[0]));
    let axis = dominant_axis(&normal);
    let tri2d = [
        project_dropping_axis(&points[0], axis),
        project_dropping_axis(&points[1], axis),
        project_dropping_axis(&points[2], axis),
    ];
    barycentric_2d(&tri2d, &project_dropping_axis(p, axis), denom_eps)
}

/// Reconstruct the world point `u * P0 + v * P1 + w * P2`.
pub fn point_from_barycentric(points: &[Point3<f64>; 3], bary: &Barycentric) -> Point3<f64> {
    Point3::from(
        points[0].coords * bary.u + points[1].coords * bary.v + points[2].coords * bary.w,
    )
}

/// Signed area of a 2D triangle (positive when counter-clockwise).
pub fn signed_area_2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}

/// Signed area of a 2D polygon ring (positive when counter-clockwise).
pub fn ring_signed_area(ring: &[Point2<f64>]) -> f64 {
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = &ring[i];
        let b = &ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    0.5 * sum
}

/// Centroid of a 2D polygon ring (vertex average; used only for
/// containment seeding, not as an exact area centroid).
pub fn ring_vertex_centroid(ring: &[Point2<f64>]) -> Point2<f64> {
    let mut x = 0.0;
    let mut y = 0.0;
    for p in ring {
        x += p.x;
        y += p.y;
    }
    let n = ring.len() as f64;
    Point2::new(x / n, y / n)
}

/// Inclusive point-in-polygon by crossing count, counting boundary points
/// as inside.
pub fn point_in_ring_inclusive(ring: &[Point2<f64>], p: &Point2<f64>, eps: f64) -> bool {
    let n = ring.len();
    // Boundary check first: distance to any segment within eps.
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        if point_segment_distance_2d(p, a, b) <= eps {
            return true;
        }
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&ring[i], &ring[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = pj.x + (p.y - pj.y) / (pi.y - pj.y) * (pi.x - pj.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from a 2D point to a segment.
pub fn point_segment_distance_2d(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}
