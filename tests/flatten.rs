//! Regression tests against reference solution files in `tests/data`.

use conflat::algo::parameterize::{
    build_conformal_energy, conformal_energy_triplets, spectral_conformal, CsrMatrix,
    SpectralConformal, SpectralOptions,
};
use conflat::io::{obj, solution, solution::Solution};
use conflat::prelude::*;

const FIXTURES: [&str; 2] = ["square.txt", "triangle.txt"];

fn fixture(name: &str) -> Solution {
    let path = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name);
    Solution::load(&path).unwrap()
}

#[test]
fn energy_matches_reference() {
    for name in FIXTURES {
        let solution = fixture(name);
        let mesh: HalfEdgeMesh = solution.mesh().unwrap();

        let reference = CsrMatrix::from_triplets(solution.energy.clone());
        let ec = SpectralConformal::new(&mesh, SpectralOptions::default()).build_conformal_energy();

        let difference = reference.sub(&ec).unwrap().frobenius_norm();
        assert!(difference < 1e-6, "{}: |EC_ref - EC| = {:e}", name, difference);
        assert!(ec.is_hermitian(1e-12), "{}", name);
    }
}

#[test]
fn flattening_matches_reference_up_to_similarity() {
    for name in FIXTURES {
        let solution = fixture(name);
        let mesh: HalfEdgeMesh = solution.mesh().unwrap();

        let flattening = spectral_conformal(&mesh, &SpectralOptions::default()).unwrap();
        assert!(flattening.converged, "{}", name);
        assert!(flattening.uv.is_valid(), "{}", name);

        // One complex scalar, read off vertex 0, must fit every vertex.
        let r = flattening.uv.similarity_to(&solution.flattening).unwrap();
        let deviation = flattening.uv.max_deviation_after(r, &solution.flattening);
        assert!(deviation < 1e-6, "{}: deviation {:e}", name, deviation);
    }
}

#[test]
fn exported_triplets_reproduce_energy() {
    let solution = fixture("square.txt");
    let mesh: HalfEdgeMesh = solution.mesh().unwrap();

    let mut buffer = Vec::new();
    solution::write_triplets(&mut buffer, &conformal_energy_triplets(&mesh, false)).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    let reread = CsrMatrix::from_triplets(solution::parse_triplets(&text, mesh.num_vertices()).unwrap());
    let ec = build_conformal_energy(&mesh, false);
    assert!(reread.sub(&ec).unwrap().frobenius_norm() < 1e-12);
}

#[test]
fn flattening_survives_obj_export() {
    let solution = fixture("triangle.txt");
    let mesh: HalfEdgeMesh = solution.mesh().unwrap();
    let flattening = spectral_conformal(&mesh, &SpectralOptions::default()).unwrap();

    let mut buffer = Vec::new();
    obj::write(&mut buffer, &mesh, Some(&flattening.uv)).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    let vt: Vec<(f64, f64)> = text
        .lines()
        .filter_map(|l| l.strip_prefix("vt "))
        .map(|l| {
            let mut it = l.split_whitespace().map(|t| t.parse::<f64>().unwrap());
            (it.next().unwrap(), it.next().unwrap())
        })
        .collect();

    assert_eq!(vt.len(), mesh.num_vertices());
    for ((u, v), p) in vt.iter().zip(flattening.uv.as_slice()) {
        assert_eq!((*u, *v), (p.x, p.y));
    }
}

#[test]
fn unused_obj_vertex_does_not_shift_flattening() {
    let reference = fixture("square.txt");
    let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 5 5 0\nf 1 2 3\nf 1 3 4\n";

    let path = std::env::temp_dir().join(format!("conflat-unused-{}.obj", std::process::id()));
    std::fs::write(&path, text).unwrap();
    let mesh: HalfEdgeMesh = conflat::io::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(mesh.num_vertices(), 4);

    let flattening = spectral_conformal(&mesh, &SpectralOptions::default()).unwrap();
    let r = flattening.uv.similarity_to(&reference.flattening).unwrap();
    let deviation = flattening.uv.max_deviation_after(r, &reference.flattening);
    assert!(deviation < 1e-6, "deviation {:e}", deviation);

    // Built directly, the unused vertex is refused rather than flattened.
    let (vertices, faces) = obj::parse(text).unwrap();
    let raw: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
    assert!(matches!(
        spectral_conformal(&raw, &SpectralOptions::default()),
        Err(MeshError::IsolatedVertex { vertex: 4 })
    ));
}

#[test]
fn mismatched_uv_map_is_rejected() {
    let solution = fixture("square.txt");
    let mesh: HalfEdgeMesh = solution.mesh().unwrap();
    let uv: UVMap = UVMap::zeros(3);

    let path = std::env::temp_dir().join(format!("conflat-mismatch-{}.obj", std::process::id()));
    let result = obj::save_with_uvs(&mesh, &uv, &path);
    assert!(matches!(result, Err(MeshError::DimensionMismatch { expected: 4, found: 3 })));
}
