//! Conformal flattening of meshes with boundary.
//!
//! The pipeline is linear:
//!
//! 1. [`build_conformal_energy`] assembles the Hermitian matrix
//!    `EC = ED - A` from cotangent weights and boundary loops.
//! 2. [`solve_smallest_eigenvector`] runs inverse power iteration, deflating
//!    the constant vector every step.
//! 3. [`SpectralConformal::flatten`] reads the eigenvector as planar
//!    coordinates.
//!
//! Meshes may have any number of boundary loops; the area term sums over all
//! of them. Closed meshes must be cut first.
//!
//! # Example
//!
//! ```no_run
//! use conflat::prelude::*;
//! use conflat::algo::parameterize::{spectral_conformal, SpectralOptions};
//!
//! let mesh: HalfEdgeMesh = conflat::io::load("input.obj").unwrap();
//!
//! let flattening = spectral_conformal(&mesh, &SpectralOptions::default()).unwrap();
//! if !flattening.converged {
//!     eprintln!("residual {:.2e}", flattening.residual);
//! }
//!
//! for vid in mesh.vertex_ids() {
//!     let uv = flattening.uv.get(vid);
//!     println!("Vertex {:?}: u={:.3}, v={:.3}", vid, uv.x, uv.y);
//! }
//! ```

mod eigen;
mod energy;
mod sparse;
mod spectral;
mod uv;

#[cfg(test)]
pub(crate) mod fixtures;

pub use eigen::{
    solve_smallest_eigenvector, EigenOptions, EigenSolution, SolverBackend, DENSE_VERTEX_LIMIT,
};
pub use energy::{
    build_boundary_area, build_conformal_energy, build_dirichlet_energy,
    conformal_energy_triplets, energy_of,
};
pub use sparse::{conjugate_gradient, ComplexTriplets, CsrMatrix};
pub use spectral::{spectral_conformal, Flattening, SpectralConformal, SpectralOptions};
pub use uv::UVMap;
