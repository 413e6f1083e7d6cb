// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Bounding volume hierarchy used as the default broadphase for
//! candidate triangle pairs

use super::{BoundingBox, InputTriangle};

/// BVH node
#[derive(Debug, Clone)]
pub struct BvhNode {
    /// Bounding box of this node
    pub bbox: BoundingBox,
    /// Left child (None for leaf)
    pub left: Option<Box<BvhNode>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BvhNode>>,
    /// Triangle indices (only for leaf nodes)
    pub triangle_indices: Vec<usize>,
}

impl BvhNode {
    fn leaf(bbox: BoundingBox, triangle_indices: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            triangle_indices,
        }
    }

    fn internal(bbox: BoundingBox, left: Box<BvhNode>, right: Box<BvhNode>) -> Self {
        Self {
            bbox,
            left: Some(left),
            right: Some(right),
            triangle_indices: Vec::new(),
        }
    }

    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Bounding volume hierarchy over one mesh's triangles.
pub struct Bvh {
    root: BvhNode,
}

impl Bvh {
    /// Build a BVH over the triangles of one operand.
    pub fn build(triangles: &[InputTriangle]) -> Self {
        let boxed: Vec<(usize, BoundingBox)> = triangles
            .iter()
            .enumerate()
            .map(|(idx, tri)| (idx, BoundingBox::from_triangle(tri)))
            .collect();
        Self::build_from_boxes(boxed)
    }

    /// Build from precomputed (index, bbox) pairs.
    pub fn build_from_boxes(triangles: Vec<(usize, BoundingBox)>) -> Self {
        if triangles.is_empty() {
            return Self {
                root: BvhNode::leaf(BoundingBox::empty(), Vec::new()),
            };
        }
        let root = Self::build_recursive(triangles, 0);
        Self { root }
    }

    fn build_recursive(mut triangles: Vec<(usize, BoundingBox)>, depth: usize) -> BvhNode {
        const MAX_DEPTH: usize = 32;
        const MIN_TRIANGLES: usize = 4;

        if triangles.len() <= MIN_TRIANGLES || depth >= MAX_DEPTH {
            let bbox = Self::union_of(&triangles);
            let indices: Vec<usize> = triangles.iter().map(|(idx, _)| *idx).collect();
            return BvhNode::leaf(bbox, indices);
        }

        // Split along the longest axis at the centroid median.
        let split_axis = Self::longest_axis(&triangles);
        triangles.sort_by(|(_, bbox_a), (_, bbox_b)| {
            let ca = bbox_a.center();
            let cb = bbox_b.center();
            let (a, b) = match split_axis {
                0 => (ca.x, cb.x),
                1 => (ca.y, cb.y),
                _ => (ca.z, cb.z),
            };
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = triangles.len() / 2;
        let right_triangles = triangles.split_off(mid);
        let left = Box::new(Self::build_recursive(triangles, depth + 1));
        let right = Box::new(Self::build_recursive(right_triangles, depth + 1));
        let bbox = left.bbox.union(&right.bbox);

        BvhNode::internal(bbox, left, right)
    }

    fn longest_axis(triangles: &[(usize, BoundingBox)]) -> usize {
        let size = Self::union_of(triangles).size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    fn union_of(triangles: &[(usize, BoundingBox)]) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for (_, tri_bbox) in triangles {
            bbox = bbox.union(tri_bbox);
        }
        bbox
    }

    /// Indices of triangles whose bounding box intersects `bbox`.
    pub fn query(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        Self::query_recursive(&self.root, bbox, &mut result);
        result
    }

    fn query_recursive(node: &BvhNode, bbox: &BoundingBox, result: &mut Vec<usize>) {
        if !node.bbox.intersects(bbox) {
            return;
        }
        if node.is_leaf() {
            result.extend_from_slice(&node.triangle_indices);
        } else {
            if let Some(ref left) = node.left {
                Self::query_recursive(left, bbox, result);
            }
            if let Some(ref right) = node.right {
                Self::query_recursive(right, bbox, result);
            }
        }
    }
}

/// Enumerate candidate intersecting pairs (index in A, index in B) between
/// two operands via a BVH over B.
///
/// Each triangle box is inflated by `margin` so features within tolerance
/// of a box face are not missed. Pairs are emitted in ascending (a, b)
/// order, keeping downstream iteration deterministic.
pub fn candidate_pairs(
    a: &[InputTriangle],
    b: &[InputTriangle],
    margin: f64,
) -> Vec<(usize, usize)> {
    let bvh_b = Bvh::build(b);
    let mut pairs = Vec::new();
    for (idx_a, tri_a) in a.iter().enumerate() {
        let bbox = BoundingBox::from_triangle(tri_a).inflate(margin);
        let mut hits = bvh_b.query(&bbox);
        hits.sort_unstable();
        for idx_b in hits {
            pairs.push((idx_a, idx_b));
        }
    }
    pairs
}
