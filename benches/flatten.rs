//! Benchmarks for energy assembly and flattening.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use conflat::algo::parameterize::CsrMatrix;
use conflat::prelude::*;
use nalgebra::Point3;

/// Grid with a smooth bump so the eigenvalue is not zero.
fn create_bumped_grid(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);
    let c = n as f64 / 2.0;

    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64, j as f64);
            let r2 = ((x - c) * (x - c) + (y - c) * (y - c)) / (c * c);
            vertices.push(Point3::new(x, y, 0.5 * c * (-2.0 * r2).exp()));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_energy(c: &mut Criterion) {
    let mesh = create_bumped_grid(60);

    c.bench_function("energy_grid_60_sequential", |b| {
        b.iter(|| build_conformal_energy(black_box(&mesh), false))
    });
    c.bench_function("energy_grid_60_parallel", |b| {
        b.iter(|| build_conformal_energy(black_box(&mesh), true))
    });

    let ec: CsrMatrix = build_conformal_energy(&mesh, false);
    let x = nalgebra::DVector::from_element(mesh.num_vertices(), num_complex::Complex64::new(1.0, -0.5));
    c.bench_function("mul_vec_grid_60", |b| b.iter(|| ec.mul_vec(black_box(&x))));
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    group.sample_size(10);

    let small = create_bumped_grid(12);
    group.bench_function("cholesky_grid_12", |b| {
        b.iter(|| spectral_conformal(black_box(&small), &SpectralOptions::default()).unwrap())
    });

    let auto = create_bumped_grid(40);
    group.bench_function("auto_grid_40", |b| {
        b.iter(|| spectral_conformal(black_box(&auto), &SpectralOptions::default()).unwrap())
    });

    let large = create_bumped_grid(30);
    let cg = SpectralOptions::default()
        .with_backend(SolverBackend::conjugate_gradient())
        .with_shift(1e-4)
        .with_tolerance(1e-8);
    group.bench_function("cg_grid_30", |b| {
        b.iter(|| spectral_conformal(black_box(&large), &cg).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_energy, bench_flatten);
criterion_main!(benches);
