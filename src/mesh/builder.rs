//! Mesh construction from face-vertex lists.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Faces must be consistently oriented. Half-edge ids are assigned in face
/// order, and boundary half-edges are appended afterwards in the order their
/// interior twins were created, so the same input always yields the same
/// mesh.
///
/// # Example
/// ```
/// use conflat::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.boundary_loops().len(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    for &p in vertices {
        mesh.add_vertex(p);
    }

    // Directed edge (v0, v1) -> interior half-edge.
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> =
        HashMap::with_capacity(faces.len() * 3);

    for (fi, face) in faces.iter().enumerate() {
        let face_id = FaceId::<I>::new(fi);
        let base = mesh.num_halfedges();
        let ids = [
            HalfEdgeId::<I>::new(base),
            HalfEdgeId::<I>::new(base + 1),
            HalfEdgeId::<I>::new(base + 2),
        ];
        mesh.faces.push(Face { halfedge: ids[0] });

        for k in 0..3 {
            let origin = VertexId::new(face[k]);
            mesh.halfedges.push(HalfEdge {
                origin,
                twin: HalfEdgeId::invalid(),
                next: ids[(k + 1) % 3],
                prev: ids[(k + 2) % 3],
                face: face_id,
            });
            mesh.vertex_mut(origin).halfedge = ids[k];

            let key = (face[k], face[(k + 1) % 3]);
            if edge_map.insert(key, ids[k]).is_some() {
                return Err(MeshError::NonManifoldEdge { v0: key.0, v1: key.1 });
            }
        }
    }

    // Link twins in creation order; unmatched edges get a boundary twin.
    for fi in 0..faces.len() {
        for k in 0..3 {
            let he = HalfEdgeId::<I>::new(3 * fi + k);
            let (v0, v1) = (faces[fi][k], faces[fi][(k + 1) % 3]);

            match edge_map.get(&(v1, v0)) {
                Some(&twin) => mesh.halfedge_mut(he).twin = twin,
                None => {
                    let boundary = HalfEdgeId::<I>::new(mesh.num_halfedges());
                    mesh.halfedges.push(HalfEdge {
                        origin: VertexId::new(v1),
                        twin: he,
                        ..HalfEdge::new()
                    });
                    mesh.halfedge_mut(he).twin = boundary;
                }
            }
        }
    }

    link_boundary_loops(&mut mesh);
    fix_boundary_vertex_halfedges(&mut mesh);

    Ok(mesh)
}

/// Chain boundary half-edges into loops via `next`/`prev`.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let boundary: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let outgoing: HashMap<usize, HalfEdgeId<I>> = boundary
        .iter()
        .map(|&he| (mesh.origin(he).index(), he))
        .collect();

    for &he in &boundary {
        let dest = mesh.dest(he).index();
        if let Some(&next) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next;
            mesh.halfedge_mut(next).prev = he;
        }
    }
}

/// Point each boundary vertex at its outgoing boundary half-edge.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let boundary: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    for he in boundary {
        let origin = mesh.origin(he);
        mesh.vertex_mut(origin).halfedge = he;
    }
}

/// Drop vertices that no face references and renumber the faces to match.
///
/// Surviving vertices keep their relative order.
///
/// # Errors
///
/// [`MeshError::InvalidVertexIndex`] if a face references a vertex past the
/// end of `vertices`.
pub fn remove_unreferenced_vertices(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    let mut used = vec![false; vertices.len()];
    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            match used.get_mut(vi) {
                Some(flag) => *flag = true,
                None => return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi }),
            }
        }
    }

    let mut remap = vec![usize::MAX; vertices.len()];
    let mut kept = Vec::with_capacity(vertices.len());
    for (vi, p) in vertices.iter().enumerate() {
        if used[vi] {
            remap[vi] = kept.len();
            kept.push(*p);
        }
    }

    let faces = faces
        .iter()
        .map(|f| [remap[f[0]], remap[f[1]], remap[f[2]]])
        .collect();
    Ok((kept, faces))
}

/// Convert a half-edge mesh back to a face-vertex representation.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            [v0.index(), v1.index(), v2.index()]
        })
        .collect();

    (vertices, faces)
}
