// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! End-to-end scenarios over concrete solids

mod common;

use common::*;
use nalgebra::{Point3, Vector3};
use trisect::geometry::primitives::{box_mesh, icosphere, tetrahedron};
use trisect::{boolean_operation, BooleanOp, InputTriangle, Tolerances};

fn run(
    a: &[InputTriangle],
    b: &[InputTriangle],
    op: BooleanOp,
) -> trisect::IndexedMesh {
    boolean_operation(a, b, op, &Tolerances::default())
        .unwrap_or_else(|err| panic!("{op:?} failed: {err}"))
}

#[test]
fn test_tetrahedra_sharing_one_face() {
    let upper = tetrahedron([
        Point3::new(0, 0, 0),
        Point3::new(2, 0, 0),
        Point3::new(0, 2, 0),
        Point3::new(0, 0, 2),
    ]);
    let lower = tetrahedron([
        Point3::new(0, 0, 0),
        Point3::new(2, 0, 0),
        Point3::new(0, 2, 0),
        Point3::new(0, 0, -2),
    ]);

    let int = run(&upper, &lower, BooleanOp::Intersection);
    assert!(
        int.is_empty(),
        "face-touching tetrahedra share no volume, got {} triangles",
        int.triangle_count()
    );

    let union = run(&upper, &lower, BooleanOp::Union);
    assert!(!union.is_empty());
    assert_closed(&union, "union of glued tetrahedra");
    assert_no_degenerate_triangles(&union, "union of glued tetrahedra");
    let expected = input_volume(&upper) + input_volume(&lower);
    let volume = signed_volume(&union);
    assert!(
        (volume - expected).abs() < 1e-9 * expected,
        "volume {volume} vs {expected}"
    );
}

#[test]
fn test_boxes_touching_at_one_face() {
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let b = box_mesh(Point3::new(10, 0, 0), Vector3::new(10, 10, 10));

    let int = run(&a, &b, BooleanOp::Intersection);
    assert!(int.is_empty(), "face-touching boxes share no volume");

    let union = run(&a, &b, BooleanOp::Union);
    assert_closed(&union, "union of touching boxes");
    let volume = signed_volume(&union);
    assert!((volume - 2000.0).abs() < 1e-6, "volume {volume}");
}

#[test]
fn test_widely_separated_boxes() {
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let b = box_mesh(Point3::new(100, 0, 0), Vector3::new(10, 10, 10));

    let int = run(&a, &b, BooleanOp::Intersection);
    assert!(int.is_empty());

    let union = run(&a, &b, BooleanOp::Union);
    assert_closed(&union, "union of separated boxes");
    // Both boxes concatenated, untouched.
    assert_eq!(union.triangle_count(), 24);
    let volume = signed_volume(&union);
    assert!((volume - 2000.0).abs() < 1e-6);
}

#[test]
fn test_sphere_pair_all_operations() {
    let a = icosphere(200, 3, Point3::new(0, 0, 0));
    let b = icosphere(200, 3, Point3::new(150, 0, 0));

    let union = run(&a, &b, BooleanOp::Union);
    let int = run(&a, &b, BooleanOp::Intersection);
    let diff_ab = run(&a, &b, BooleanOp::DifferenceAB);
    let diff_ba = run(&a, &b, BooleanOp::DifferenceBA);
    let sym = run(&a, &b, BooleanOp::SymmetricDifference);

    for (label, mesh) in [
        ("union", &union),
        ("intersection", &int),
        ("A-B", &diff_ab),
        ("B-A", &diff_ba),
        ("symmetric difference", &sym),
    ] {
        assert!(!mesh.is_empty(), "{label} is empty");
        assert_closed(mesh, label);
        assert_no_degenerate_triangles(mesh, label);
    }

    let (vu, vi) = (signed_volume(&union), signed_volume(&int));
    let (vab, vba) = (signed_volume(&diff_ab), signed_volume(&diff_ba));
    let va = input_volume(&a);
    assert!(vi > 0.0 && vi < va);
    assert!(vu > va);
    // Inclusion-exclusion within the tolerance of the triangulated cut.
    let err = (vab + vi - va).abs();
    assert!(err < 1e-6 * va, "A-B + intersection vs A off by {err}");
    let err = (vab + vba + vi - vu).abs();
    assert!(err < 1e-6 * vu, "partition of the union off by {err}");
    // The symmetric difference keeps the outside shells of both
    // operands, bounding the same solid as the union.
    let err = (signed_volume(&sym) - vu).abs();
    assert!(err < 1e-6 * vu, "symmetric difference off by {err}");
}

#[test]
fn test_nested_tetrahedra() {
    let inner = tetrahedron([
        Point3::new(1, 1, 1),
        Point3::new(2, 1, 1),
        Point3::new(1, 2, 1),
        Point3::new(1, 1, 2),
    ]);
    let outer = tetrahedron([
        Point3::new(0, 0, 0),
        Point3::new(10, 0, 0),
        Point3::new(0, 10, 0),
        Point3::new(0, 0, 10),
    ]);

    // Intersection keeps the inner shell.
    let int = run(&inner, &outer, BooleanOp::Intersection);
    assert_eq!(canonical_triangles(&int), canonical_input_triangles(&inner));

    // Union keeps the outer shell.
    let union = run(&inner, &outer, BooleanOp::Union);
    assert_eq!(
        canonical_triangles(&union),
        canonical_input_triangles(&outer)
    );

    // Inner minus outer leaves nothing.
    let hollow = run(&inner, &outer, BooleanOp::DifferenceAB);
    assert!(hollow.is_empty());

    // Outer minus inner keeps both shells, inner flipped.
    let shell = run(&inner, &outer, BooleanOp::DifferenceBA);
    assert_eq!(shell.triangle_count(), 8);
    assert_closed(&shell, "outer minus inner");
    let expected = input_volume(&outer) - input_volume(&inner);
    let volume = signed_volume(&shell);
    assert!(
        (volume - expected).abs() < 1e-9 * expected,
        "cavity volume {volume} vs {expected}"
    );
}

#[test]
fn test_drilled_cube_stays_manifold() {
    let tol = Tolerances::default();
    let cube = box_mesh(Point3::new(0, 0, 0), Vector3::new(1000, 1000, 1000));
    // Three orthogonal rectangular tunnels, each protruding past the cube
    // and offset from the others so the cuts stay generic.
    let tunnel_x = box_mesh(Point3::new(-10, 300, 350), Vector3::new(1020, 300, 300));
    let tunnel_y = box_mesh(Point3::new(350, -10, 300), Vector3::new(300, 1020, 300));
    let tunnel_z = box_mesh(Point3::new(300, 400, -10), Vector3::new(300, 300, 1020));

    let mut drilled =
        boolean_operation(&cube, &tunnel_x, BooleanOp::DifferenceAB, &tol).unwrap();
    assert_closed(&drilled, "cube minus x tunnel");

    for (label, tunnel) in [("y tunnel", &tunnel_y), ("z tunnel", &tunnel_z)] {
        let current = drilled.to_input_triangles();
        drilled = boolean_operation(&current, tunnel, BooleanOp::DifferenceAB, &tol)
            .unwrap_or_else(|err| panic!("drilling {label} failed: {err}"));
        assert_closed(&drilled, label);
    }

    assert_no_degenerate_triangles(&drilled, "drilled cube");
    let volume = signed_volume(&drilled);
    let solid = 1000.0f64.powi(3);
    assert!(volume > 0.0 && volume < solid);
    // Less than the cube minus one full tunnel, more than minus three.
    assert!(volume < solid - 300.0 * 300.0 * 1000.0);
    assert!(volume > solid - 3.0 * 300.0 * 300.0 * 1000.0);
}

#[test]
fn test_output_vertices_respect_weld_radius() {
    let tol = Tolerances::default();
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let b = box_mesh(Point3::new(5, 5, 5), Vector3::new(10, 10, 10));
    let union = run(&a, &b, BooleanOp::Union);
    for i in 0..union.vertices.len() {
        for j in (i + 1)..union.vertices.len() {
            let d = (union.vertices[i] - union.vertices[j]).norm();
            assert!(
                d > tol.merge_epsilon,
                "vertices {i} and {j} within the weld radius ({d})"
            );
        }
    }
}
