// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Geometry substrate - mesh types, predicates, and the broadphase

pub mod barycentric;
mod bbox;
mod bvh;
mod mesh;
pub mod primitives;
pub mod validate;

pub use barycentric::Barycentric;
pub use bbox::BoundingBox;
pub use bvh::{candidate_pairs, Bvh};
pub use mesh::{
    lattice_edge_key, lattice_to_world, shared_edge_adjacency, IndexedMesh, InputTriangle,
    LatticeEdgeKey,
};
