//! Spectral conformal parameterization.
//!
//! The flattening is the eigenvector of the conformal energy `EC = ED - A`
//! with the smallest eigenvalue once constant functions are excluded. No
//! vertex is pinned. The result is a planar map that is unique up to one
//! complex scalar (a rotation and a uniform scale); it is neither centered
//! nor rescaled beyond what the solver returns.
//!
//! # References
//!
//! - Mullen, P., Tong, Y., Alliez, P., & Desbrun, M. (2008). "Spectral
//!   conformal parameterization." Computer Graphics Forum (SGP).

use std::time::Instant;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

use super::eigen::{solve_smallest_eigenvector, EigenOptions, SolverBackend};
use super::energy::build_conformal_energy;
use super::sparse::CsrMatrix;
use super::uv::UVMap;

/// Options for spectral conformal flattening.
#[derive(Debug, Clone)]
pub struct SpectralOptions {
    /// Diagonal shift added before each linear solve.
    pub shift: f64,

    /// Convergence threshold on the eigen-residual `‖EC x - λ x‖`.
    pub tolerance: f64,

    /// Maximum number of inverse power iterations.
    pub max_iterations: usize,

    /// Seed of the start vector. Equal seeds give identical results.
    pub seed: u64,

    /// Linear solver used by each iteration.
    pub backend: SolverBackend,

    /// Use rayon for edge weights and sparse products.
    pub parallel: bool,

    /// Fail with [`MeshError::ConvergenceFailed`] instead of returning an
    /// unconverged flattening.
    pub require_convergence: bool,
}

impl Default for SpectralOptions {
    fn default() -> Self {
        let eigen = EigenOptions::default();
        Self {
            shift: eigen.shift,
            tolerance: eigen.tolerance,
            max_iterations: eigen.max_iterations,
            seed: eigen.seed,
            backend: eigen.backend,
            parallel: eigen.parallel,
            require_convergence: false,
        }
    }
}

impl SpectralOptions {
    /// Set the diagonal shift.
    pub fn with_shift(mut self, shift: f64) -> Self {
        self.shift = shift;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set the maximum number of power iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the start-vector seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Choose the linear solver.
    pub fn with_backend(mut self, backend: SolverBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Treat an exhausted iteration budget as an error.
    pub fn with_require_convergence(mut self, require: bool) -> Self {
        self.require_convergence = require;
        self
    }

    fn eigen_options(&self) -> EigenOptions {
        EigenOptions {
            shift: self.shift,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            seed: self.seed,
            backend: self.backend,
            parallel: self.parallel,
        }
    }
}

/// A flattening together with solver diagnostics.
#[derive(Debug, Clone)]
pub struct Flattening<I: MeshIndex = u32> {
    /// Planar position of every vertex: `(Re x_i, Im x_i)`.
    pub uv: UVMap<I>,
    /// Rayleigh quotient of the eigenvector; zero for a planar mesh.
    pub eigenvalue: f64,
    /// Eigen-residual of the returned vector.
    pub residual: f64,
    /// Inverse power iterations performed.
    pub iterations: usize,
    /// Whether the residual met the tolerance.
    pub converged: bool,
    /// Linear solver actually used.
    pub backend: SolverBackend,
}

impl<I: MeshIndex> Flattening<I> {
    /// Discard the diagnostics.
    pub fn into_uv(self) -> UVMap<I> {
        self.uv
    }
}

/// Spectral conformal flattening bound to one mesh.
///
/// # Example
///
/// ```
/// use conflat::algo::parameterize::{SpectralConformal, SpectralOptions};
/// use conflat::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
///
/// let scp = SpectralConformal::new(&mesh, SpectralOptions::default());
/// let ec = scp.build_conformal_energy();
/// assert!(ec.is_hermitian(1e-12));
///
/// let flattening = scp.flatten().unwrap();
/// assert!(flattening.uv.is_valid());
/// ```
#[derive(Debug, Clone)]
pub struct SpectralConformal<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    options: SpectralOptions,
}

impl<'a, I: MeshIndex> SpectralConformal<'a, I> {
    /// Bind a mesh and options.
    pub fn new(mesh: &'a HalfEdgeMesh<I>, options: SpectralOptions) -> Self {
        Self { mesh, options }
    }

    /// The options in use.
    pub fn options(&self) -> &SpectralOptions {
        &self.options
    }

    /// Assemble `EC = ED - A` for the bound mesh.
    ///
    /// Boundary existence is not checked here; see [`Self::flatten`].
    pub fn build_conformal_energy(&self) -> CsrMatrix {
        build_conformal_energy(self.mesh, self.options.parallel)
    }

    /// Compute the conformal flattening.
    ///
    /// # Errors
    ///
    /// - [`MeshError::EmptyMesh`] if the mesh has no faces
    /// - [`MeshError::NoBoundary`] if the mesh is closed
    /// - [`MeshError::IsolatedVertex`] if a vertex belongs to no face; its
    ///   position would be arbitrary
    /// - [`MeshError::InvalidParameter`] for invalid options
    /// - [`MeshError::SingularSystem`] if the shifted system cannot be
    ///   solved, typically because degenerate triangles made the energy
    ///   non-finite
    /// - [`MeshError::ConvergenceFailed`] if a CG solve fails, or the power
    ///   iteration runs out while `require_convergence` is set
    /// - [`MeshError::NonFiniteResult`] if a coordinate is NaN or infinite
    pub fn flatten(&self) -> Result<Flattening<I>> {
        let mesh = self.mesh;
        if mesh.num_faces() == 0 || mesh.num_vertices() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if !mesh.has_boundary() {
            return Err(MeshError::NoBoundary);
        }
        // An unused vertex adds a second constant-free null vector to EC.
        if let Some(v) = mesh.first_isolated_vertex() {
            return Err(MeshError::IsolatedVertex { vertex: v.index() });
        }

        let start = Instant::now();
        let ec = self.build_conformal_energy();
        log::info!(
            "assembled conformal energy for {} vertices ({} non-zeros) in {:.2?}",
            mesh.num_vertices(),
            ec.nnz(),
            start.elapsed()
        );

        let start = Instant::now();
        let solution = solve_smallest_eigenvector(&ec, &self.options.eigen_options())?;
        log::info!(
            "inverse iteration ({:?}): {} iterations, lambda = {:.3e}, residual = {:.3e} in {:.2?}",
            solution.backend,
            solution.iterations,
            solution.eigenvalue,
            solution.residual,
            start.elapsed()
        );

        if !solution.converged && self.options.require_convergence {
            return Err(MeshError::ConvergenceFailed {
                iterations: solution.iterations,
            });
        }

        let uv = UVMap::from_complex(&solution.vector);
        if let Some(vertex) = uv.first_non_finite() {
            return Err(MeshError::NonFiniteResult { vertex });
        }

        Ok(Flattening {
            uv,
            eigenvalue: solution.eigenvalue,
            residual: solution.residual,
            iterations: solution.iterations,
            converged: solution.converged,
            backend: solution.backend,
        })
    }
}

/// Compute a spectral conformal flattening.
///
/// Shorthand for [`SpectralConformal::new`] followed by
/// [`SpectralConformal::flatten`].
///
/// # Arguments
///
/// * `mesh` - A triangle mesh with at least one boundary loop
/// * `options` - Solver options
///
/// # Example
///
/// ```no_run
/// use conflat::prelude::*;
/// use conflat::algo::parameterize::{spectral_conformal, SpectralOptions};
///
/// let mesh: HalfEdgeMesh = conflat::io::load("face.obj").unwrap();
/// let flattening = spectral_conformal(&mesh, &SpectralOptions::default()).unwrap();
///
/// for (v, uv) in flattening.uv.iter() {
///     println!("{:?}: ({:.4}, {:.4})", v, uv.x, uv.y);
/// }
/// ```
pub fn spectral_conformal<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &SpectralOptions,
) -> Result<Flattening<I>> {
    SpectralConformal::new(mesh, options.clone()).flatten()
}
