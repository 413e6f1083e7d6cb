// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Edge-use accounting and closed-manifold checks

use super::IndexedMesh;
use ahash::AHashMap;
use std::hash::Hash;

/// Count uses of every undirected edge of a triangle soup whose vertices
/// are identified by `K`.
pub fn edge_use_counts<K>(triangles: &[[K; 3]]) -> AHashMap<(K, K), usize>
where
    K: Copy + Ord + Hash,
{
    let mut counts: AHashMap<(K, K), usize> = AHashMap::new();
    for tri in triangles {
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            let key = if a <= b { (a, b) } else { (b, a) };
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// True when every undirected edge is used exactly twice.
pub fn is_closed_manifold<K>(triangles: &[[K; 3]]) -> bool
where
    K: Copy + Ord + Hash,
{
    edge_use_counts(triangles).values().all(|&count| count == 2)
}

/// Edge-use accounting over an indexed mesh, with the diagnostics the
/// assembler reports on failure.
#[derive(Debug, Clone)]
pub struct EdgeUseReport {
    /// Total number of undirected edges.
    pub total_edges: usize,
    /// Edges whose use count differs from 2, ascending by endpoints.
    pub offending: Vec<((usize, usize), usize)>,
    /// use-count -> number of edges with that count, ascending.
    pub histogram: Vec<(usize, usize)>,
}

impl EdgeUseReport {
    /// Build the report for a mesh.
    pub fn for_mesh(mesh: &IndexedMesh) -> Self {
        let counts = edge_use_counts(&mesh.triangles);

        let mut histogram_map: AHashMap<usize, usize> = AHashMap::new();
        for &count in counts.values() {
            *histogram_map.entry(count).or_insert(0) += 1;
        }
        let mut histogram: Vec<(usize, usize)> = histogram_map.into_iter().collect();
        histogram.sort_unstable();

        let mut offending: Vec<((usize, usize), usize)> = counts
            .iter()
            .filter(|(_, &count)| count != 2)
            .map(|(&edge, &count)| (edge, count))
            .collect();
        offending.sort_unstable();

        Self {
            total_edges: counts.len(),
            offending,
            histogram,
        }
    }

    /// True when the mesh is closed.
    pub fn is_closed(&self) -> bool {
        self.offending.is_empty()
    }

    /// Up to `n` offending edges for the error message.
    pub fn samples(&self, n: usize) -> Vec<((usize, usize), usize)> {
        self.offending.iter().take(n).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn open_fan() -> IndexedMesh {
        IndexedMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
            ],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn test_open_fan_is_not_closed() {
        let report = EdgeUseReport::for_mesh(&open_fan());
        assert!(!report.is_closed());
        // Five edges total, only the shared one used twice.
        assert_eq!(report.total_edges, 5);
        assert_eq!(report.offending.len(), 4);
        assert_eq!(report.histogram, vec![(1, 4), (2, 1)]);
    }

    #[test]
    fn test_closed_tetrahedron() {
        let triangles = vec![[0usize, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
        assert!(is_closed_manifold(&triangles));
    }

    #[test]
    fn test_samples_are_bounded() {
        let report = EdgeUseReport::for_mesh(&open_fan());
        assert_eq!(report.samples(2).len(), 2);
    }
}
