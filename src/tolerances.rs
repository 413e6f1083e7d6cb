// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Tolerance bundle controlling predicates and merging behavior
//! throughout the boolean pipeline

use serde::{Deserialize, Serialize};

/// The full set of epsilons used by the pipeline.
///
/// Every stage takes this bundle by reference; there is no global
/// tolerance state. `Default` carries values suited to integer-lattice
/// input coordinates of magnitude up to a few thousand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tolerances {
    /// Distance from a plane under which a point counts as on the plane.
    pub plane_side_epsilon: f64,
    /// General geometric predicate tolerance (plane rejection, 2D cross
    /// products, world quantization grid for global vertex identity).
    pub triangle_predicate_epsilon: f64,
    /// Vertex coincidence tolerance in world space.
    pub eps_vertex: f64,
    /// Signed-area threshold below which a 2D face or ear is negligible.
    pub eps_area: f64,
    /// Barycentric distance under which a subdivision vertex snaps to a
    /// triangle corner.
    pub eps_corner: f64,
    /// Barycentric distance under which a subdivision vertex counts as
    /// lying on a triangle side.
    pub eps_side: f64,
    /// Merge radius for subdivision vertices in the barycentric chart.
    pub pslg_vertex_merge_epsilon: f64,
    /// Squared world distance under which two intersection samples are the
    /// same feature point.
    pub feature_world_distance_epsilon_squared: f64,
    /// Tolerance for inclusive barycentric containment tests.
    pub barycentric_inside_epsilon: f64,
    /// Tolerance for matching two barycentric triples as the same vertex.
    pub feature_barycentric_epsilon: f64,
    /// Output welding radius. Also the quantization cell for the vertex
    /// table used in cut-edge recognition.
    pub merge_epsilon: f64,
}

impl Tolerances {
    /// Squared form of [`Tolerances::merge_epsilon`].
    pub fn merge_epsilon_squared(&self) -> f64 {
        self.merge_epsilon * self.merge_epsilon
    }

    /// Maximum perpendicular distance at which a global vertex is
    /// considered interior to an intersection edge.
    pub fn edge_split_distance(&self) -> f64 {
        10.0 * self.merge_epsilon
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            plane_side_epsilon: 1e-12,
            triangle_predicate_epsilon: 1e-12,
            eps_vertex: 1e-12,
            eps_area: 1e-12,
            eps_corner: 1e-7,
            eps_side: 1e-7,
            pslg_vertex_merge_epsilon: 1e-7,
            feature_world_distance_epsilon_squared: 1e-24,
            barycentric_inside_epsilon: 1e-9,
            feature_barycentric_epsilon: 1e-12,
            merge_epsilon: 1e-6,
        }
    }
}
