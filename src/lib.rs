//! # conflat
//!
//! Spectral conformal flattening of triangle meshes with boundary.
//!
//! Given a surface patch with one or more boundary loops, conflat computes
//! planar coordinates for every vertex that preserve angles as well as the
//! discretization allows. The flattening is the smallest non-trivial
//! eigenvector of the conformal energy `EC = ED - A`, found by inverse power
//! iteration. No boundary vertex is pinned, and the result is defined up to
//! a rotation and uniform scale.
//!
//! ## Features
//!
//! - **Half-edge data structure**: boundary loops, cotangent weights, type-safe indices
//! - **Complex sparse assembly**: triplet lists finalized into CSR matrices
//! - **Inverse iteration**: dense Cholesky or Hermitian conjugate gradient solves
//! - **File formats**: OBJ (with texture coordinates) and STL
//!
//! ## Quick Start
//!
//! ```no_run
//! use conflat::prelude::*;
//!
//! let mesh: HalfEdgeMesh = conflat::io::load("patch.obj").unwrap();
//! let flattening = spectral_conformal(&mesh, &SpectralOptions::default()).unwrap();
//!
//! println!("converged: {} after {} iterations", flattening.converged, flattening.iterations);
//! conflat::io::obj::save_with_uvs(&mesh, &flattening.uv, "patch_uv.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use conflat::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.2),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.1),
//!     Point3::new(0.5, 0.5, 0.4),
//! ];
//! let faces = vec![[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.boundary_loops().len(), 1);
//!
//! let flattening = spectral_conformal(&mesh, &SpectralOptions::default()).unwrap();
//! assert_eq!(flattening.uv.len(), 5);
//! assert!(flattening.uv.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use conflat::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::parameterize::{
        build_conformal_energy, spectral_conformal, Flattening, SolverBackend,
        SpectralConformal, SpectralOptions, UVMap,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, Face, FaceId, HalfEdge, HalfEdgeId, HalfEdgeMesh,
        MeshIndex, Vertex, VertexId,
    };
}

// Re-export math crates for convenience
pub use nalgebra;
pub use num_complex;
