// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Algebraic laws of the boolean operations

mod common;

use common::*;
use nalgebra::{Point3, Vector3};
use trisect::geometry::primitives::{box_mesh, icosphere};
use trisect::{boolean_operation, BooleanOp, Tolerances};

fn overlapping_boxes() -> (Vec<trisect::InputTriangle>, Vec<trisect::InputTriangle>) {
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let b = box_mesh(Point3::new(5, 5, 5), Vector3::new(10, 10, 10));
    (a, b)
}

#[test]
fn test_union_with_self_is_identity() {
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let result =
        boolean_operation(&a, &a, BooleanOp::Union, &Tolerances::default()).unwrap();
    assert_closed(&result, "union(A, A)");
    assert_eq!(canonical_triangles(&result), canonical_input_triangles(&a));
}

#[test]
fn test_intersection_with_self_is_identity() {
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let result =
        boolean_operation(&a, &a, BooleanOp::Intersection, &Tolerances::default()).unwrap();
    assert_closed(&result, "intersection(A, A)");
    assert_eq!(canonical_triangles(&result), canonical_input_triangles(&a));
}

#[test]
fn test_difference_with_self_is_empty() {
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    for op in [BooleanOp::DifferenceAB, BooleanOp::DifferenceBA] {
        let result = boolean_operation(&a, &a, op, &Tolerances::default()).unwrap();
        assert!(
            result.is_empty(),
            "difference of a mesh with itself must be empty"
        );
    }
}

#[test]
fn test_symmetric_difference_with_self_is_empty() {
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let result = boolean_operation(
        &a,
        &a,
        BooleanOp::SymmetricDifference,
        &Tolerances::default(),
    )
    .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_union_commutes() {
    let (a, b) = overlapping_boxes();
    let tol = Tolerances::default();
    let ab = boolean_operation(&a, &b, BooleanOp::Union, &tol).unwrap();
    let ba = boolean_operation(&b, &a, BooleanOp::Union, &tol).unwrap();
    assert_closed(&ab, "union(A, B)");
    assert_closed(&ba, "union(B, A)");
    // Triangulation order may differ; the solids must agree.
    let (va, vb) = (signed_volume(&ab), signed_volume(&ba));
    assert!((va - vb).abs() < 1e-6 * va.abs(), "volumes {va} vs {vb}");
    let (sa, sb) = (ab.surface_area(), ba.surface_area());
    assert!((sa - sb).abs() < 1e-6 * sa.abs(), "areas {sa} vs {sb}");
}

#[test]
fn test_intersection_commutes() {
    let (a, b) = overlapping_boxes();
    let tol = Tolerances::default();
    let ab = boolean_operation(&a, &b, BooleanOp::Intersection, &tol).unwrap();
    let ba = boolean_operation(&b, &a, BooleanOp::Intersection, &tol).unwrap();
    assert_closed(&ab, "intersection(A, B)");
    assert_closed(&ba, "intersection(B, A)");
    let (va, vb) = (signed_volume(&ab), signed_volume(&ba));
    // The overlap of the two boxes is the 5x5x5 corner cube.
    assert!((va - 125.0).abs() < 1e-6, "intersection volume {va}");
    assert!((vb - 125.0).abs() < 1e-6, "intersection volume {vb}");
}

#[test]
fn test_symmetric_difference_commutes() {
    let (a, b) = overlapping_boxes();
    let tol = Tolerances::default();
    let ab = boolean_operation(&a, &b, BooleanOp::SymmetricDifference, &tol).unwrap();
    let ba = boolean_operation(&b, &a, BooleanOp::SymmetricDifference, &tol).unwrap();
    assert_closed(&ab, "symmetric difference(A, B)");
    assert_closed(&ba, "symmetric difference(B, A)");
    let (va, vb) = (signed_volume(&ab), signed_volume(&ba));
    // Outside shells from both operands bound the same solid as the
    // union: 1000 + 1000 - 125.
    assert!((va - 1875.0).abs() < 1e-6, "volume {va}");
    assert!((vb - 1875.0).abs() < 1e-6, "volume {vb}");
}

#[test]
fn test_difference_volumes_partition_the_union() {
    let (a, b) = overlapping_boxes();
    let tol = Tolerances::default();
    let union = boolean_operation(&a, &b, BooleanOp::Union, &tol).unwrap();
    let int = boolean_operation(&a, &b, BooleanOp::Intersection, &tol).unwrap();
    let ab = boolean_operation(&a, &b, BooleanOp::DifferenceAB, &tol).unwrap();
    let ba = boolean_operation(&a, &b, BooleanOp::DifferenceBA, &tol).unwrap();
    for (label, mesh) in [("union", &union), ("intersection", &int), ("A-B", &ab), ("B-A", &ba)]
    {
        assert_closed(mesh, label);
        assert_no_degenerate_triangles(mesh, label);
    }
    let total = signed_volume(&ab) + signed_volume(&ba) + signed_volume(&int);
    let union_volume = signed_volume(&union);
    assert!(
        (total - union_volume).abs() < 1e-6 * union_volume,
        "A-B + B-A + intersection = {total} vs union {union_volume}"
    );
}

#[test]
fn test_symmetric_difference_decomposes_for_disjoint_interiors() {
    // With disjoint interiors the decomposition into differences is
    // exact: A - B = A, B - A = B, and their union is the symmetric
    // difference.
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let b = box_mesh(Point3::new(10, 0, 0), Vector3::new(10, 10, 10));
    let tol = Tolerances::default();
    let direct = boolean_operation(&a, &b, BooleanOp::SymmetricDifference, &tol).unwrap();

    let ab = boolean_operation(&a, &b, BooleanOp::DifferenceAB, &tol).unwrap();
    let ba = boolean_operation(&a, &b, BooleanOp::DifferenceBA, &tol).unwrap();
    let recombined = boolean_operation(
        &ab.to_input_triangles(),
        &ba.to_input_triangles(),
        BooleanOp::Union,
        &tol,
    )
    .unwrap();

    assert_closed(&direct, "symmetric difference");
    assert_closed(&recombined, "union of differences");
    let (vd, vr) = (signed_volume(&direct), signed_volume(&recombined));
    assert!((vd - 2000.0).abs() < 1e-6, "direct volume {vd}");
    assert!((vd - vr).abs() < 1e-6 * vd.abs(), "volumes {vd} vs {vr}");
}

#[test]
fn test_sphere_union_commutes() {
    let tol = Tolerances::default();
    let a = icosphere(200, 2, Point3::new(0, 0, 0));
    let b = icosphere(200, 2, Point3::new(150, 0, 0));
    let ab = boolean_operation(&a, &b, BooleanOp::Union, &tol).unwrap();
    let ba = boolean_operation(&b, &a, BooleanOp::Union, &tol).unwrap();
    assert_closed(&ab, "sphere union(A, B)");
    assert_closed(&ba, "sphere union(B, A)");
    let (va, vb) = (signed_volume(&ab), signed_volume(&ba));
    assert!((va - vb).abs() < 1e-9 * va.abs(), "volumes {va} vs {vb}");
}
