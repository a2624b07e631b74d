//! Smallest non-trivial eigenvector of a Hermitian positive semi-definite
//! matrix by inverse power iteration.
//!
//! The matrix is assumed to have the all-ones vector in its null space.
//! Every iterate is projected away from that vector, so the iteration
//! converges to the eigenvector of the smallest eigenvalue among vectors
//! with zero mean.

use nalgebra::{Cholesky, DVector, Dyn};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sparse::{conjugate_gradient, CsrMatrix};
use crate::error::{MeshError, Result};

/// Largest system that [`SolverBackend::Auto`] factors densely.
pub const DENSE_VERTEX_LIMIT: usize = 1024;

/// How the shifted linear system `(EC + εI) y = x` is solved.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SolverBackend {
    /// Dense Cholesky up to [`DENSE_VERTEX_LIMIT`] unknowns, conjugate
    /// gradient with default limits above it.
    #[default]
    Auto,

    /// Dense Cholesky factorization, computed once and reused.
    ///
    /// Memory grows with the square of the vertex count and the factorization
    /// with its cube, so this only suits small meshes.
    Cholesky,

    /// Hermitian conjugate gradient on the sparse matrix, once per iteration.
    ConjugateGradient {
        /// Maximum CG iterations per solve.
        max_iterations: usize,
        /// Relative residual tolerance of each solve.
        tolerance: f64,
    },
}

impl SolverBackend {
    /// Conjugate gradient with default limits.
    pub fn conjugate_gradient() -> Self {
        SolverBackend::ConjugateGradient {
            max_iterations: 10_000,
            tolerance: 1e-12,
        }
    }

    /// The concrete backend used for a system with `n` unknowns.
    ///
    /// Never returns [`SolverBackend::Auto`].
    pub fn resolve(self, n: usize) -> Self {
        match self {
            SolverBackend::Auto if n <= DENSE_VERTEX_LIMIT => SolverBackend::Cholesky,
            SolverBackend::Auto => SolverBackend::conjugate_gradient(),
            other => other,
        }
    }
}

/// Options for [`solve_smallest_eigenvector`].
#[derive(Debug, Clone)]
pub struct EigenOptions {
    /// Diagonal shift `ε` making the system positive definite.
    pub shift: f64,

    /// Convergence threshold on `‖EC x - λ x‖`.
    pub tolerance: f64,

    /// Maximum number of power iterations.
    pub max_iterations: usize,

    /// Seed of the pseudo-random start vector.
    pub seed: u64,

    /// Linear solver used in each iteration.
    pub backend: SolverBackend,

    /// Use rayon for sparse products.
    pub parallel: bool,
}

impl Default for EigenOptions {
    fn default() -> Self {
        Self {
            shift: 1e-8,
            tolerance: 1e-10,
            max_iterations: 500,
            seed: 0,
            backend: SolverBackend::default(),
            parallel: true,
        }
    }
}

impl EigenOptions {
    fn validate(&self) -> Result<()> {
        if !(self.shift > 0.0 && self.shift.is_finite()) {
            return Err(MeshError::invalid_param("shift", self.shift, "must be positive and finite"));
        }
        if !(self.tolerance > 0.0) {
            return Err(MeshError::invalid_param("tolerance", self.tolerance, "must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(MeshError::invalid_param("max_iterations", 0, "must be at least 1"));
        }
        if let SolverBackend::ConjugateGradient {
            max_iterations,
            tolerance,
        } = self.backend
        {
            if max_iterations == 0 {
                return Err(MeshError::invalid_param("cg_max_iterations", 0, "must be at least 1"));
            }
            if !(tolerance > 0.0) {
                return Err(MeshError::invalid_param("cg_tolerance", tolerance, "must be positive"));
            }
        }
        Ok(())
    }
}

/// Result of [`solve_smallest_eigenvector`].
#[derive(Debug, Clone)]
pub struct EigenSolution {
    /// Unit-norm eigenvector estimate with zero mean.
    pub vector: DVector<Complex64>,
    /// Rayleigh quotient `x* EC x`.
    pub eigenvalue: f64,
    /// `‖EC x - λ x‖` of the returned vector.
    pub residual: f64,
    /// Power iterations performed.
    pub iterations: usize,
    /// Whether the residual dropped below the tolerance.
    pub converged: bool,
    /// Backend that solved the shifted systems, after resolving `Auto`.
    pub backend: SolverBackend,
}

/// Shifted system solved once per iteration.
enum ShiftedSolver {
    Dense(Cholesky<Complex64, Dyn>),
    Iterative {
        matrix: CsrMatrix,
        max_iterations: usize,
        tolerance: f64,
        parallel: bool,
    },
}

impl ShiftedSolver {
    /// `backend` must already be resolved.
    fn new(ec: &CsrMatrix, backend: SolverBackend, options: &EigenOptions) -> Result<Self> {
        let n = ec.nrows();
        let shifted = ec.add(&CsrMatrix::scaled_identity(n, Complex64::new(options.shift, 0.0)))?;

        if let SolverBackend::ConjugateGradient {
            max_iterations,
            tolerance,
        } = backend
        {
            return Ok(ShiftedSolver::Iterative {
                matrix: shifted,
                max_iterations,
                tolerance,
                parallel: options.parallel,
            });
        }

        Cholesky::new(shifted.to_dense())
            .map(ShiftedSolver::Dense)
            .ok_or_else(|| MeshError::SingularSystem {
                reason: "shifted energy matrix is not positive definite".to_string(),
            })
    }

    fn solve(&self, x: &DVector<Complex64>) -> Result<DVector<Complex64>> {
        match self {
            ShiftedSolver::Dense(cholesky) => Ok(cholesky.solve(x)),
            ShiftedSolver::Iterative {
                matrix,
                max_iterations,
                tolerance,
                parallel,
            } => conjugate_gradient(matrix, x, None, *max_iterations, *tolerance, *parallel),
        }
    }
}

/// Remove the component along the all-ones vector.
fn deflate(x: &mut DVector<Complex64>) {
    if x.is_empty() {
        return;
    }
    let mean = x.sum() / x.len() as f64;
    x.add_scalar_mut(-mean);
}

/// Scale to unit 2-norm. Returns `false` for a zero or non-finite vector.
fn normalize(x: &mut DVector<Complex64>) -> bool {
    let norm = x.norm();
    if norm > 0.0 && norm.is_finite() {
        x.unscale_mut(norm);
        true
    } else {
        false
    }
}

fn random_start(n: usize, seed: u64) -> DVector<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    DVector::from_fn(n, |_, _| {
        let re: f64 = rng.random();
        let im: f64 = rng.random();
        Complex64::new(2.0 * re - 1.0, 2.0 * im - 1.0)
    })
}

fn apply(ec: &CsrMatrix, x: &DVector<Complex64>, parallel: bool) -> DVector<Complex64> {
    if parallel {
        ec.par_mul_vec(x)
    } else {
        ec.mul_vec(x)
    }
}

/// Rayleigh quotient and eigen-residual of a unit vector.
fn rayleigh(ec: &CsrMatrix, x: &DVector<Complex64>, parallel: bool) -> (f64, f64) {
    let ecx = apply(ec, x, parallel);
    let lambda = x.dotc(&ecx).re;
    let residual = (ecx - x * Complex64::new(lambda, 0.0)).norm();
    (lambda, residual)
}

/// Find the eigenvector of smallest eigenvalue orthogonal to the all-ones
/// vector.
///
/// Starting from a seeded pseudo-random vector, each iteration solves
/// `(EC + εI) y = x`, removes the mean of `y` and normalizes it. Iteration
/// stops once `‖EC x - λ x‖` falls below `options.tolerance`, where `λ` is
/// the Rayleigh quotient. Running out of iterations is not an error: the last
/// iterate is returned with `converged == false`.
///
/// Small systems are factored densely once; larger ones run conjugate
/// gradient on the sparse matrix, see [`SolverBackend::Auto`].
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] for a non-positive shift or tolerance
/// - [`MeshError::DimensionMismatch`] if `ec` is not square
/// - [`MeshError::SingularSystem`] if the shifted matrix cannot be factored,
///   or an iterate collapses to zero or non-finite values
/// - [`MeshError::ConvergenceFailed`] if a conjugate gradient solve fails
pub fn solve_smallest_eigenvector(ec: &CsrMatrix, options: &EigenOptions) -> Result<EigenSolution> {
    options.validate()?;

    let n = ec.nrows();
    if ec.ncols() != n {
        return Err(MeshError::DimensionMismatch {
            expected: n,
            found: ec.ncols(),
        });
    }
    if n < 2 {
        return Err(MeshError::SingularSystem {
            reason: format!("no non-constant vector in dimension {}", n),
        });
    }

    let backend = options.backend.resolve(n);
    log::debug!("solving {} x {} shifted system with {:?}", n, n, backend);
    let solver = ShiftedSolver::new(ec, backend, options)?;

    let mut x = random_start(n, options.seed);
    deflate(&mut x);
    if !normalize(&mut x) {
        return Err(MeshError::SingularSystem {
            reason: "degenerate start vector".to_string(),
        });
    }

    let mut eigenvalue = f64::INFINITY;
    let mut residual = f64::INFINITY;

    for iteration in 1..=options.max_iterations {
        let mut y = solver.solve(&x)?;
        deflate(&mut y);
        if !normalize(&mut y) {
            return Err(MeshError::SingularSystem {
                reason: format!("iterate {} vanished or is not finite", iteration),
            });
        }
        x = y;

        (eigenvalue, residual) = rayleigh(ec, &x, options.parallel);
        log::debug!(
            "inverse iteration {}: lambda = {:.3e}, residual = {:.3e}",
            iteration,
            eigenvalue,
            residual
        );

        if residual < options.tolerance {
            return Ok(EigenSolution {
                vector: x,
                eigenvalue,
                residual,
                iterations: iteration,
                converged: true,
                backend,
            });
        }
    }

    log::warn!(
        "inverse iteration stopped after {} iterations with residual {:.3e}",
        options.max_iterations,
        residual
    );

    Ok(EigenSolution {
        vector: x,
        eigenvalue,
        residual,
        iterations: options.max_iterations,
        converged: false,
        backend,
    })
}
