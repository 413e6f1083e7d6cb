// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Criterion benchmarks for the boolean pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{Point3, Vector3};
use trisect::geometry::primitives::{box_mesh, icosphere};
use trisect::{boolean_operation, BooleanOp, Tolerances};

fn bench_box_box(c: &mut Criterion) {
    let tol = Tolerances::default();
    let a = box_mesh(Point3::new(0, 0, 0), Vector3::new(10, 10, 10));
    let b = box_mesh(Point3::new(5, 5, 5), Vector3::new(10, 10, 10));

    c.bench_function("union_box_box", |bencher| {
        bencher.iter(|| {
            boolean_operation(black_box(&a), black_box(&b), BooleanOp::Union, &tol).unwrap()
        })
    });
    c.bench_function("difference_box_box", |bencher| {
        bencher.iter(|| {
            boolean_operation(black_box(&a), black_box(&b), BooleanOp::DifferenceAB, &tol)
                .unwrap()
        })
    });
}

fn bench_sphere_sphere(c: &mut Criterion) {
    let tol = Tolerances::default();
    let a = icosphere(200, 2, Point3::new(0, 0, 0));
    let b = icosphere(200, 2, Point3::new(150, 0, 0));

    c.bench_function("union_sphere_sphere_level2", |bencher| {
        bencher.iter(|| {
            boolean_operation(black_box(&a), black_box(&b), BooleanOp::Union, &tol).unwrap()
        })
    });
    c.bench_function("intersection_sphere_sphere_level2", |bencher| {
        bencher.iter(|| {
            boolean_operation(black_box(&a), black_box(&b), BooleanOp::Intersection, &tol)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_box_box, bench_sphere_sphere);
criterion_main!(benches);
