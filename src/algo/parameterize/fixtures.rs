//! Small meshes shared by the parameterization tests.

use std::f64::consts::TAU;

use nalgebra::{Point3, Rotation3, Unit, Vector3};

use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};

/// Unit square split along the 0-2 diagonal.
pub fn unit_square() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
}

/// `(n + 1) x (n + 1)` vertex grid on `[0, n]^2` with heights `z = height(x, y)`.
pub fn height_grid(n: usize, height: impl Fn(f64, f64) -> f64) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(2 * n * n);

    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64, j as f64);
            vertices.push(Point3::new(x, y, height(x, y)));
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

/// Flat grid in the xy-plane.
pub fn flat_grid(n: usize) -> HalfEdgeMesh {
    height_grid(n, |_, _| 0.0)
}

/// A grid pushed up into a smooth bump, so no flattening is exact.
pub fn bumped_grid(n: usize) -> HalfEdgeMesh {
    let c = n as f64 / 2.0;
    height_grid(n, move |x, y| {
        let r2 = ((x - c) * (x - c) + (y - c) * (y - c)) / (c * c);
        0.6 * c * (-2.0 * r2).exp()
    })
}

/// Planar annulus between radii 1 and 2; two boundary loops.
pub fn annulus(segments: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity(2 * segments);
    for radius in [1.0, 2.0] {
        for k in 0..segments {
            let t = TAU * k as f64 / segments as f64;
            // Slight jitter in angle keeps the triangles non-symmetric.
            let t = t + 0.05 * (3.0 * t).sin();
            vertices.push(Point3::new(radius * t.cos(), radius * t.sin(), 0.0));
        }
    }

    let mut faces = Vec::with_capacity(2 * segments);
    for k in 0..segments {
        let a = k;
        let b = (k + 1) % segments;
        let c = segments + k;
        let d = segments + (k + 1) % segments;
        faces.push([a, c, d]);
        faces.push([a, d, b]);
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// The flat grid rigidly rotated out of the xy-plane, with the in-plane
/// coordinates it was built from.
pub fn tilted_grid(n: usize) -> (HalfEdgeMesh, Vec<(f64, f64)>) {
    let flat = flat_grid(n);
    let axis = Unit::new_normalize(Vector3::new(1.0, 2.0, 0.5));
    let rotation = Rotation3::from_axis_angle(&axis, 0.9);

    let (vertices, faces) = to_face_vertex(&flat);
    let planar: Vec<(f64, f64)> = vertices.iter().map(|p| (p.x, p.y)).collect();
    let rotated: Vec<Point3<f64>> = vertices.iter().map(|p| rotation.transform_point(p)).collect();
    (build_from_triangles(&rotated, &faces).unwrap(), planar)
}

/// Closed tetrahedron, no boundary.
pub fn tetrahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, 1.0, 0.0),
        Point3::new(0.5, 0.5, 1.0),
    ];
    let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    build_from_triangles(&vertices, &faces).unwrap()
}
