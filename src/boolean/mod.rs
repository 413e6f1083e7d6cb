// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! The surface boolean pipeline: pair intersection, global graph,
//! subdivision, classification, selection and assembly

pub mod assemble;
pub mod classify;
pub mod graph;
pub mod index;
pub mod intersect;
pub mod pslg;
pub mod select;
pub mod subdivide;
pub mod topology;

use crate::debug::{self, DebugCapture};
use crate::error::{KernelError, KernelResult, MeshSide, Phase};
use crate::geometry::{candidate_pairs, IndexedMesh, InputTriangle};
use crate::tolerances::Tolerances;
use classify::{MeshClassification, PointInSolid, RayCastSolid};
use graph::IntersectionGraph;
use index::TriangleIntersectionIndex;
use intersect::{IntersectionKind, IntersectionSet};
pub use select::BooleanOp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subdivide::subdivide_mesh;
use topology::MeshTopology;

/// Cooperative cancellation flag polled between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the next stage boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True when cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Perform a boolean operation with the built-in broadphase and
/// point-in-solid predicates.
pub fn boolean_operation(
    a: &[InputTriangle],
    b: &[InputTriangle],
    op: BooleanOp,
    tol: &Tolerances,
) -> KernelResult<IndexedMesh> {
    validate_inputs(a, b, tol)?;
    let pairs = candidate_pairs(a, b, tol.merge_epsilon);
    run_pipeline(
        a,
        b,
        &pairs,
        op,
        tol,
        &RayCastSolid::new(a),
        &RayCastSolid::new(b),
        None,
    )
}

/// Perform a boolean operation over caller-provided candidate pairs.
pub fn boolean_operation_with_pairs(
    a: &[InputTriangle],
    b: &[InputTriangle],
    pairs: &[(usize, usize)],
    op: BooleanOp,
    tol: &Tolerances,
) -> KernelResult<IndexedMesh> {
    validate_inputs(a, b, tol)?;
    run_pipeline(
        a,
        b,
        pairs,
        op,
        tol,
        &RayCastSolid::new(a),
        &RayCastSolid::new(b),
        None,
    )
}

/// The full-control entry point: caller-provided candidates, predicates,
/// and cancellation.
#[allow(clippy::too_many_arguments)]
pub fn run_pipeline(
    a: &[InputTriangle],
    b: &[InputTriangle],
    pairs: &[(usize, usize)],
    op: BooleanOp,
    tol: &Tolerances,
    inside_a: &dyn PointInSolid,
    inside_b: &dyn PointInSolid,
    cancel: Option<&CancelFlag>,
) -> KernelResult<IndexedMesh> {
    validate_inputs(a, b, tol)?;
    let check = |phase: Phase| -> KernelResult<()> {
        match cancel {
            Some(flag) if flag.is_cancelled() => Err(KernelError::Cancelled(phase)),
            _ => Ok(()),
        }
    };

    // C1: pair classification and features.
    let set = IntersectionSet::build(a, b, pairs, tol);
    check(Phase::PairIntersect)?;

    // C2: global vertex/edge identities.
    let graph = IntersectionGraph::build(a, &set, tol);
    check(Phase::Graph)?;

    // C3: per-triangle subdivision on both operands.
    let index_a = TriangleIntersectionIndex::build(MeshSide::A, a, &set, &graph, tol);
    let index_b = TriangleIntersectionIndex::build(MeshSide::B, b, &set, &graph, tol);
    let topology_a = MeshTopology::build(MeshSide::A, a.len(), &set, &graph);
    let topology_b = MeshTopology::build(MeshSide::B, b.len(), &set, &graph);
    debug::dump_boundary(MeshSide::A, &topology_a, &graph);
    debug::dump_boundary(MeshSide::B, &topology_b, &graph);

    let subdivision_a =
        subdivide_mesh(MeshSide::A, a, b, &set, &graph, &index_a, &topology_a, tol)?;
    let subdivision_b =
        subdivide_mesh(MeshSide::B, b, a, &set, &graph, &index_b, &topology_b, tol)?;
    check(Phase::Subdivide)?;

    // C4: containment per patch, lifted to regions.
    let classification_a = MeshClassification::build(&subdivision_a, &graph, inside_b, tol);
    let classification_b = MeshClassification::build(&subdivision_b, &graph, inside_a, tol);
    check(Phase::Classify)?;

    // C5: keep rules, then weld and validate.
    let selection = select::select_patches(
        op,
        &subdivision_a,
        &classification_a,
        &subdivision_b,
        &classification_b,
    );
    let mesh = assemble::assemble(&selection, tol)?;
    check(Phase::Assemble)?;

    debug::store(DebugCapture {
        candidate_pairs: pairs.len(),
        intersecting_pairs: set
            .intersections
            .iter()
            .filter(|record| record.kind != IntersectionKind::None)
            .count(),
        graph_vertices: graph.vertex_count(),
        graph_edges: graph.edge_count(),
        patches_a: subdivision_a.patch_count(),
        patches_b: subdivision_b.patch_count(),
        regions_a: classification_a.regions.len(),
        regions_b: classification_b.regions.len(),
        selected_triangles: selection.triangles.len(),
        output_vertices: mesh.vertex_count(),
        output_triangles: mesh.triangle_count(),
    });

    Ok(mesh)
}

fn validate_inputs(
    a: &[InputTriangle],
    b: &[InputTriangle],
    tol: &Tolerances,
) -> KernelResult<()> {
    for (side, triangles) in [(MeshSide::A, a), (MeshSide::B, b)] {
        if triangles.is_empty() {
            return Err(KernelError::EmptyInput { side });
        }
        for (triangle_idx, triangle) in triangles.iter().enumerate() {
            let area = triangle.double_area() * 0.5;
            if area <= tol.eps_area {
                return Err(KernelError::DegenerateInputTriangle {
                    side,
                    triangle: triangle_idx,
                    area,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::box_mesh;
    use crate::geometry::validate::EdgeUseReport;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_empty_input_is_rejected() {
        let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
        let err = boolean_operation(&a, &[], BooleanOp::Union, &Tolerances::default());
        assert!(matches!(
            err,
            Err(KernelError::EmptyInput {
                side: MeshSide::B
            })
        ));
    }

    #[test]
    fn test_degenerate_input_is_rejected() {
        let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
        let degenerate = vec![InputTriangle::from_corners([
            Point3::new(0, 0, 0),
            Point3::new(1, 1, 1),
            Point3::new(2, 2, 2),
        ])];
        let err = boolean_operation(&a, &degenerate, BooleanOp::Union, &Tolerances::default());
        assert!(matches!(
            err,
            Err(KernelError::DegenerateInputTriangle {
                side: MeshSide::B,
                triangle: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_union_of_overlapping_boxes_is_closed() {
        let tol = Tolerances::default();
        let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
        let b = box_mesh(Point3::new(5, 5, 5), Vector3::new(10, 10, 10));
        let mesh = boolean_operation(&a, &b, BooleanOp::Union, &tol).unwrap();
        assert!(!mesh.is_empty());
        assert!(EdgeUseReport::for_mesh(&mesh).is_closed());
    }

    #[test]
    fn test_cancellation_between_stages() {
        let tol = Tolerances::default();
        let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
        let b = box_mesh(Point3::new(5, 5, 5), Vector3::new(10, 10, 10));
        let pairs = candidate_pairs(&a, &b, tol.merge_epsilon);
        let flag = CancelFlag::new();
        flag.cancel();
        let err = run_pipeline(
            &a,
            &b,
            &pairs,
            BooleanOp::Union,
            &tol,
            &RayCastSolid::new(&a),
            &RayCastSolid::new(&b),
            Some(&flag),
        );
        assert!(matches!(err, Err(KernelError::Cancelled(_))));
    }

    #[test]
    fn test_debug_capture_updates() {
        let tol = Tolerances::default();
        let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
        let b = box_mesh(Point3::new(5, 5, 5), Vector3::new(10, 10, 10));
        boolean_operation(&a, &b, BooleanOp::Union, &tol).unwrap();
        let capture = debug::last().expect("capture written");
        assert!(capture.graph_vertices > 0);
        assert!(capture.output_triangles > 0);
    }
}
