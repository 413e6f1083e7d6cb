// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Assembly of selected patches into a closed indexed mesh: interning,
//! welding, winding-aware deduplication, manifold validation

use super::select::BooleanPatchSet;
use crate::error::{KernelError, KernelResult};
use crate::geometry::validate::EdgeUseReport;
use crate::geometry::IndexedMesh;
use crate::tolerances::Tolerances;
use ahash::AHashMap;
use log::debug;
use nalgebra::Point3;

/// Assemble the selected patches into the output mesh.
///
/// Steps: quantized vertex interning, voxel-grid welding at the merge
/// radius, degenerate-triple removal, unordered-triple deduplication with
/// opposite-winding cancellation, and fatal closed-manifold validation.
pub fn assemble(selection: &BooleanPatchSet, tol: &Tolerances) -> KernelResult<IndexedMesh> {
    let (mut vertices, mut triangles) = intern_vertices(selection, tol);

    let weld_map = weld_vertices(&vertices, tol);
    for tri in &mut triangles {
        for idx in tri.iter_mut() {
            *idx = weld_map[*idx];
        }
    }

    triangles.retain(|tri| tri[0] != tri[1] && tri[1] != tri[2] && tri[2] != tri[0]);

    let triangles = dedupe_opposite_windings(triangles);

    let mesh = compact(vertices.drain(..).collect(), triangles);

    let report = EdgeUseReport::for_mesh(&mesh);
    if !report.is_closed() {
        return Err(KernelError::NonManifoldOutput {
            offending: report.offending.len(),
            total: report.total_edges,
            histogram: report.histogram.clone(),
            samples: report.samples(8),
        });
    }
    Ok(mesh)
}

/// Intern patch corners on the merge-epsilon grid, in collection order.
fn intern_vertices(
    selection: &BooleanPatchSet,
    tol: &Tolerances,
) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let quantum = tol.merge_epsilon;
    let mut keys: AHashMap<(i64, i64, i64), usize> = AHashMap::new();
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::with_capacity(selection.triangles.len());

    for tri in &selection.triangles {
        let indices = tri.map(|p| {
            let key = super::graph::quantize(&p, quantum);
            let next_id = vertices.len();
            let id = *keys.entry(key).or_insert(next_id);
            if id == next_id {
                vertices.push(p);
            }
            id
        });
        if indices[0] != indices[1] && indices[1] != indices[2] && indices[2] != indices[0] {
            triangles.push(indices);
        } else {
            debug!("dropping triangle collapsed by interning");
        }
    }
    (vertices, triangles)
}

/// Voxel-grid weld: merge any two interned vertices within the merge
/// radius by scanning neighboring grid cells. Returns old -> new index.
fn weld_vertices(vertices: &[Point3<f64>], tol: &Tolerances) -> Vec<usize> {
    let quantum = tol.merge_epsilon;
    let merge_sq = tol.merge_epsilon_squared();

    let mut grid: AHashMap<(i64, i64, i64), Vec<usize>> = AHashMap::new();
    for (idx, p) in vertices.iter().enumerate() {
        grid.entry(super::graph::quantize(p, quantum))
            .or_default()
            .push(idx);
    }

    // Union toward the smallest index in each merge cluster.
    let mut map: Vec<usize> = (0..vertices.len()).collect();
    let resolve = |map: &Vec<usize>, mut x: usize| -> usize {
        while map[x] != x {
            x = map[x];
        }
        x
    };

    for (idx, p) in vertices.iter().enumerate() {
        let center = super::graph::quantize(p, quantum);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let cell = (center.0 + dx, center.1 + dy, center.2 + dz);
                    let Some(neighbors) = grid.get(&cell) else {
                        continue;
                    };
                    for &other in neighbors {
                        if other >= idx {
                            continue;
                        }
                        if (vertices[other] - p).norm_squared() <= merge_sq {
                            let ra = resolve(&map, idx);
                            let rb = resolve(&map, other);
                            if ra != rb {
                                let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
                                map[merge] = keep;
                            }
                        }
                    }
                }
            }
        }
    }

    (0..vertices.len()).map(|idx| resolve(&map, idx)).collect()
}

/// Collapse triangles with equal unordered vertex triples. Same-winding
/// duplicates collapse to one; opposite-winding pairs cancel to nothing.
fn dedupe_opposite_windings(triangles: Vec<[usize; 3]>) -> Vec<[usize; 3]> {
    // Canonical cyclic rotation starting at the smallest vertex keeps the
    // winding while giving equal-winding triangles equal keys.
    fn rotated(tri: [usize; 3]) -> [usize; 3] {
        let min_pos = (0..3).min_by_key(|&i| tri[i]).unwrap_or(0);
        [
            tri[min_pos],
            tri[(min_pos + 1) % 3],
            tri[(min_pos + 2) % 3],
        ]
    }

    let mut groups: AHashMap<[usize; 3], (i64, [usize; 3], usize)> = AHashMap::new();
    for (order, tri) in triangles.into_iter().enumerate() {
        let form = rotated(tri);
        let mut key = form;
        key.sort_unstable();
        let entry = groups.entry(key).or_insert((0, form, order));
        if entry.1 == form {
            entry.0 += 1;
        } else {
            entry.0 -= 1;
        }
    }

    let mut survivors: Vec<(usize, [usize; 3])> = Vec::new();
    for (_, (net, form, order)) in groups {
        if net > 0 {
            survivors.push((order, form));
        } else if net < 0 {
            survivors.push((order, [form[0], form[2], form[1]]));
        } else {
            debug!("opposite-winding pair cancelled during assembly");
        }
    }
    // First-appearance order keeps the output deterministic.
    survivors.sort_unstable_by_key(|&(order, _)| order);
    survivors.into_iter().map(|(_, tri)| tri).collect()
}

/// Drop unreferenced vertices and remap indices.
fn compact(vertices: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> IndexedMesh {
    let mut remap: Vec<Option<usize>> = vec![None; vertices.len()];
    let mut out_vertices: Vec<Point3<f64>> = Vec::new();
    let mut out_triangles: Vec<[usize; 3]> = Vec::with_capacity(triangles.len());

    for tri in triangles {
        let indices = tri.map(|idx| {
            *remap[idx].get_or_insert_with(|| {
                out_vertices.push(vertices[idx]);
                out_vertices.len() - 1
            })
        });
        out_triangles.push(indices);
    }

    IndexedMesh {
        vertices: out_vertices,
        triangles: out_triangles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshSide;
    use crate::geometry::primitives::tetrahedron;
    use nalgebra::Point3 as P3;

    fn selection_from(world: Vec<[P3<f64>; 3]>) -> BooleanPatchSet {
        let provenance = vec![MeshSide::A; world.len()];
        BooleanPatchSet {
            triangles: world,
            provenance,
        }
    }

    #[test]
    fn test_assemble_closed_tetrahedron() {
        let tet = tetrahedron([
            P3::new(0, 0, 0),
            P3::new(2, 0, 0),
            P3::new(0, 2, 0),
            P3::new(0, 0, 2),
        ]);
        let selection = selection_from(tet.iter().map(|t| t.points()).collect());
        let mesh = assemble(&selection, &Tolerances::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_assemble_empty_selection() {
        let mesh = assemble(&BooleanPatchSet::default(), &Tolerances::default()).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_opposite_winding_pair_cancels() {
        let tet = tetrahedron([
            P3::new(0, 0, 0),
            P3::new(2, 0, 0),
            P3::new(0, 2, 0),
            P3::new(0, 0, 2),
        ]);
        let mut world: Vec<[P3<f64>; 3]> = tet.iter().map(|t| t.points()).collect();
        // A doubled face with opposite windings nets to zero, leaving the
        // tetrahedron closed.
        let [a, b, c] = world[0];
        world.push([a, b, c]);
        world.push([a, c, b]);
        let mesh = assemble(&selection_from(world), &Tolerances::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
    }

    #[test]
    fn test_same_winding_duplicate_collapses() {
        let tet = tetrahedron([
            P3::new(0, 0, 0),
            P3::new(2, 0, 0),
            P3::new(0, 2, 0),
            P3::new(0, 0, 2),
        ]);
        let mut world: Vec<[P3<f64>; 3]> = tet.iter().map(|t| t.points()).collect();
        world.push(world[0]);
        let mesh = assemble(&selection_from(world), &Tolerances::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
    }

    #[test]
    fn test_open_surface_is_fatal() {
        let tet = tetrahedron([
            P3::new(0, 0, 0),
            P3::new(2, 0, 0),
            P3::new(0, 2, 0),
            P3::new(0, 0, 2),
        ]);
        // Drop one face: three edges become single-use.
        let world: Vec<[P3<f64>; 3]> = tet.iter().take(3).map(|t| t.points()).collect();
        let err = assemble(&selection_from(world), &Tolerances::default());
        match err {
            Err(KernelError::NonManifoldOutput {
                offending,
                histogram,
                ..
            }) => {
                assert_eq!(offending, 3);
                assert!(histogram.iter().any(|&(count, edges)| count == 1 && edges == 3));
            }
            other => panic!("expected non-manifold failure, got {other:?}"),
        }
    }

    #[test]
    fn test_near_duplicate_vertices_weld() {
        let tol = Tolerances::default();
        let nudge = tol.merge_epsilon * 0.4;
        let tet = tetrahedron([
            P3::new(0, 0, 0),
            P3::new(2, 0, 0),
            P3::new(0, 2, 0),
            P3::new(0, 0, 2),
        ]);
        let mut world: Vec<[P3<f64>; 3]> = tet.iter().map(|t| t.points()).collect();
        // Nudge one corner of one face within the weld radius.
        world[0][0].x += nudge;
        let mesh = assemble(&selection_from(world), &tol).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
    }
}
