// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Trisect surface boolean kernel
//!
//! Boolean operations (union, intersection, differences, symmetric
//! difference) on closed triangle meshes. The pipeline intersects
//! candidate triangle pairs, globalizes the intersection curves into a
//! shared graph, subdivides cut triangles through per-triangle planar
//! straight-line graphs, classifies the resulting patches against the
//! opposite solid, and assembles the kept patches into a closed mesh.

pub mod boolean;
pub mod debug;
pub mod error;
pub mod geometry;
pub mod tolerances;

pub use boolean::classify::{Containment, PointInSolid, RayCastSolid};
pub use boolean::intersect::{IntersectionKind, PairFeatures, PairSegment, PairVertex};
pub use boolean::subdivide::{CoplanarOwner, TrianglePatch};
pub use boolean::{
    boolean_operation, boolean_operation_with_pairs, run_pipeline, BooleanOp, CancelFlag,
};
pub use error::{KernelError, KernelResult, MeshSide};
pub use geometry::{candidate_pairs, IndexedMesh, InputTriangle};
pub use tolerances::Tolerances;

/// Union of two closed meshes.
pub fn union(a: &[InputTriangle], b: &[InputTriangle]) -> KernelResult<IndexedMesh> {
    boolean_operation(a, b, BooleanOp::Union, &Tolerances::default())
}

/// Intersection of two closed meshes.
pub fn intersection(a: &[InputTriangle], b: &[InputTriangle]) -> KernelResult<IndexedMesh> {
    boolean_operation(a, b, BooleanOp::Intersection, &Tolerances::default())
}

/// A minus B.
pub fn difference(a: &[InputTriangle], b: &[InputTriangle]) -> KernelResult<IndexedMesh> {
    boolean_operation(a, b, BooleanOp::DifferenceAB, &Tolerances::default())
}

/// Symmetric difference of two closed meshes.
pub fn symmetric_difference(
    a: &[InputTriangle],
    b: &[InputTriangle],
) -> KernelResult<IndexedMesh> {
    boolean_operation(a, b, BooleanOp::SymmetricDifference, &Tolerances::default())
}
