//! Core mesh data structures.
//!
//! [`HalfEdgeMesh`] stores a consistently oriented triangle mesh with explicit
//! boundary half-edges. Besides adjacency it answers the geometric queries
//! that conformal flattening needs: cotangent edge weights
//! ([`HalfEdgeMesh::cotan_weight`]) and boundary-loop enumeration
//! ([`HalfEdgeMesh::boundary_loops`]).
//!
//! ```
//! use conflat::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! for he in mesh.edges() {
//!     println!("{:?} -> {:?}: w = {}", mesh.origin(he), mesh.dest(he), mesh.cotan_weight(he));
//! }
//! ```

mod builder;
mod geometry;
mod halfedge;
mod index;

pub use builder::{build_from_triangles, remove_unreferenced_vertices, to_face_vertex};
pub use geometry::cotangent_at;
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
