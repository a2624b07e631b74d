//! Discrete conformal energy `EC = ED - A`.
//!
//! `ED` is the Dirichlet energy of a piecewise-linear complex function,
//! one half of the cotangent Laplacian. `A` measures the signed area enclosed
//! by the image of the boundary. Their difference vanishes exactly on
//! holomorphic (angle-preserving) maps, so the conformal flattening is the
//! non-constant vector of smallest energy.
//!
//! All matrices are `V x V` with rows and columns indexed by vertex id.

use num_complex::Complex64;
use nalgebra::DVector;
use rayon::prelude::*;

use super::sparse::{ComplexTriplets, CsrMatrix};
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, MeshIndex};

/// Coefficient of the area term on each boundary half-edge.
const AREA_COEFFICIENT: f64 = 0.25;

/// `(i, j, w_ij)` for every undirected edge.
fn edge_weights<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> Vec<(usize, usize, f64)> {
    let weight = |he: HalfEdgeId<I>| {
        (
            mesh.origin(he).index(),
            mesh.dest(he).index(),
            mesh.cotan_weight(he),
        )
    };

    if parallel {
        let edges: Vec<HalfEdgeId<I>> = mesh.edges().collect();
        edges.par_iter().map(|&he| weight(he)).collect()
    } else {
        mesh.edges().map(weight).collect()
    }
}

fn dirichlet_triplets<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> ComplexTriplets {
    let n = mesh.num_vertices();
    let mut triplets = ComplexTriplets::with_capacity(n, n, 4 * mesh.num_edges());

    for (i, j, w) in edge_weights(mesh, parallel) {
        let half = Complex64::new(0.5 * w, 0.0);
        triplets.add_entry(-half, i, j);
        triplets.add_entry(-half, j, i);
        triplets.add_entry(half, i, i);
        triplets.add_entry(half, j, j);
    }

    triplets
}

fn area_triplets<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> ComplexTriplets {
    let n = mesh.num_vertices();
    let loops = mesh.boundary_loops();
    let boundary_len: usize = loops.iter().map(Vec::len).sum();
    let mut triplets = ComplexTriplets::with_capacity(n, n, 2 * boundary_len);

    let quarter_i = Complex64::new(0.0, AREA_COEFFICIENT);
    for he in loops.into_iter().flatten() {
        let i = mesh.origin(he).index();
        let j = mesh.dest(he).index();
        triplets.add_entry(quarter_i, i, j);
        triplets.add_entry(-quarter_i, j, i);
    }

    triplets
}

/// Assemble the Dirichlet energy `ED = L / 2`.
///
/// For every edge `(i, j)` with cotangent weight `w`, `ED[i][j]` and
/// `ED[j][i]` receive `-w / 2` and both diagonals receive `+w / 2`. Rows sum
/// to zero and every entry is real.
pub fn build_dirichlet_energy<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> CsrMatrix {
    CsrMatrix::from_triplets(dirichlet_triplets(mesh, parallel))
}

/// Assemble the boundary area matrix `A`.
///
/// Each boundary half-edge `i -> j`, on any boundary loop, contributes
/// `+i/4` at `(i, j)` and `-i/4` at `(j, i)`. For a closed mesh the result
/// has no entries.
pub fn build_boundary_area<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> CsrMatrix {
    CsrMatrix::from_triplets(area_triplets(mesh))
}

/// Unfinalized triplets of `EC = ED - A`, in assembly order.
///
/// Positions repeat; finalizing with [`CsrMatrix::from_triplets`] sums them.
pub fn conformal_energy_triplets<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    parallel: bool,
) -> ComplexTriplets {
    let mut triplets = dirichlet_triplets(mesh, parallel);
    for &(row, col, value) in area_triplets(mesh).entries() {
        triplets.add_entry(-value, row, col);
    }
    triplets
}

/// Build the conformal energy matrix `EC = ED - A`.
///
/// The result is Hermitian and positive semi-definite, and the all-ones
/// vector lies in its null space. Boundary existence is not checked: a
/// closed mesh yields `ED` alone. Degenerate triangles are not rejected
/// either and produce non-finite entries.
///
/// # Arguments
///
/// * `mesh` - The triangle mesh
/// * `parallel` - Compute edge weights with rayon
///
/// # Example
/// ```
/// use conflat::algo::parameterize::build_conformal_energy;
/// use conflat::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
///
/// let ec = build_conformal_energy(&mesh, false);
/// assert!(ec.is_hermitian(1e-12));
/// ```
pub fn build_conformal_energy<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> CsrMatrix {
    let ec = CsrMatrix::from_triplets(conformal_energy_triplets(mesh, parallel));
    log::debug!(
        "conformal energy: {} vertices, {} non-zeros",
        ec.nrows(),
        ec.nnz()
    );
    ec
}

/// Value of the quadratic form `z* EC z`.
///
/// Real for Hermitian `EC`; the imaginary part is dropped.
pub fn energy_of(ec: &CsrMatrix, z: &DVector<Complex64>) -> f64 {
    z.dotc(&ec.mul_vec(z)).re
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::parameterize::fixtures;
    use approx::assert_relative_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    /// `x + iy` of every vertex.
    fn coordinates(mesh: &HalfEdgeMesh) -> DVector<Complex64> {
        DVector::from_iterator(
            mesh.num_vertices(),
            mesh.vertex_ids().map(|v| {
                let p = mesh.position(v);
                c(p.x, p.y)
            }),
        )
    }

    fn ones(n: usize) -> DVector<Complex64> {
        DVector::from_element(n, c(1.0, 0.0))
    }

    #[test]
    fn test_square_entries() {
        let mesh = fixtures::unit_square();
        let ec = build_conformal_energy(&mesh, false);

        for i in 0..4 {
            assert_relative_eq!(ec.get(i, i).re, 0.5, epsilon = 1e-12);
            assert!(ec.get(i, i).im.abs() < 1e-15);
        }

        // Boundary runs 0 -> 3 -> 2 -> 1 -> 0.
        for (i, j) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            let forward = ec.get(i, j);
            assert_relative_eq!(forward.re, -0.25, epsilon = 1e-12);
            assert_relative_eq!(forward.im, 0.25, epsilon = 1e-12);
            assert_eq!(ec.get(j, i), forward.conj());
        }

        // The diagonal sees two right angles.
        assert!(ec.get(0, 2).norm() < 1e-12);
        assert!(ec.get(1, 3).norm() < 1e-12);
    }

    #[test]
    fn test_dirichlet_is_real_and_area_is_imaginary() {
        let mesh = fixtures::bumped_grid(4);
        let ed = build_dirichlet_energy(&mesh, false);
        let a = build_boundary_area(&mesh);

        assert!(ed.iter().all(|(_, _, v)| v.im == 0.0));
        assert!(a.iter().all(|(_, _, v)| v.re == 0.0));
        assert!(ed.is_hermitian(1e-12));
        assert!(a.is_hermitian(1e-12));
    }

    #[test]
    fn test_hermitian_and_null_space() {
        let meshes = [
            fixtures::unit_square(),
            fixtures::flat_grid(5),
            fixtures::bumped_grid(6),
            fixtures::annulus(12),
            fixtures::tilted_grid(4).0,
        ];

        for mesh in &meshes {
            let ec = build_conformal_energy(mesh, false);
            assert!(ec.hermitian_defect() < 1e-12);
            assert!(ec.mul_vec(&ones(mesh.num_vertices())).norm() < 1e-10);
        }
    }

    #[test]
    fn test_identity_map_has_zero_energy() {
        for mesh in [fixtures::unit_square(), fixtures::flat_grid(5), fixtures::annulus(16)] {
            let ec = build_conformal_energy(&mesh, false);
            let z = coordinates(&mesh);
            assert!(energy_of(&ec, &z).abs() < 1e-10);
            assert!(ec.mul_vec(&z).norm() < 1e-10);
        }
    }

    #[test]
    fn test_mirror_map_energy_is_twice_area() {
        for mesh in [fixtures::unit_square(), fixtures::flat_grid(4), fixtures::annulus(16)] {
            let ec = build_conformal_energy(&mesh, false);
            let z_bar = coordinates(&mesh).map(|z| z.conj());
            assert_relative_eq!(
                energy_of(&ec, &z_bar),
                2.0 * mesh.surface_area(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_positive_semi_definite() {
        let mesh = fixtures::bumped_grid(5);
        let ec = build_conformal_energy(&mesh, false);
        let n = mesh.num_vertices();

        for k in 0..8 {
            let z = DVector::from_iterator(
                n,
                (0..n).map(|i| {
                    let t = (i * (k + 3)) as f64;
                    c((0.37 * t).sin(), (0.11 * t + k as f64).cos())
                }),
            );
            assert!(energy_of(&ec, &z) > -1e-10);
        }
    }

    #[test]
    fn test_closed_mesh_has_no_area_term() {
        let mesh = fixtures::tetrahedron();
        let a = build_boundary_area(&mesh);
        assert_eq!(a.nnz(), 0);

        let ec = build_conformal_energy(&mesh, false);
        let ed = build_dirichlet_energy(&mesh, false);
        assert!(ec.sub(&ed).unwrap().frobenius_norm() < 1e-15);
    }

    #[test]
    fn test_triplets_finalize_to_energy() {
        let mesh = fixtures::annulus(8);
        let triplets = conformal_energy_triplets(&mesh, false);
        assert_eq!(triplets.len(), 4 * mesh.num_edges() + 2 * 16);

        let ec = build_conformal_energy(&mesh, false);
        let rebuilt = CsrMatrix::from_triplets(triplets);
        assert!(ec.sub(&rebuilt).unwrap().frobenius_norm() < 1e-15);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = fixtures::bumped_grid(6);
        let seq = build_conformal_energy(&mesh, false);
        let par = build_conformal_energy(&mesh, true);
        assert!(seq.sub(&par).unwrap().frobenius_norm() < 1e-14);
    }
}
