//! STL support, binary and ASCII.
//!
//! STL has no shared vertices in the file itself; `stl_io` merges identical
//! corners on read. Vertices no triangle references are dropped so that
//! every vertex of the loaded mesh belongs to a face.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an STL file.
///
/// Triangles that collapse onto fewer than three distinct vertices are
/// skipped.
///
/// # Example
///
/// ```no_run
/// use conflat::io::stl;
/// use conflat::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("patch.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut remap: Vec<Option<usize>> = vec![None; stl.vertices.len()];
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(stl.faces.len());

    for tri in &stl.faces {
        let [i0, i1, i2] = tri.vertices;
        if i0 == i1 || i1 == i2 || i0 == i2 {
            continue;
        }

        let mut face = [0usize; 3];
        for (slot, &src) in face.iter_mut().zip(&tri.vertices) {
            *slot = *remap[src].get_or_insert_with(|| {
                let v = &stl.vertices[src];
                vertices.push(Point3::new(v[0] as f64, v[1] as f64, v[2] as f64));
                vertices.len() - 1
            });
        }
        faces.push(face);
    }

    if faces.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_triangles(&vertices, &faces)
}

/// Save a mesh to a binary STL file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    let (vertices, faces) = to_face_vertex(mesh);
    let as_f32 = |p: &Point3<f64>| [p.x as f32, p.y as f32, p.z as f32];

    let triangles: Vec<stl_io::Triangle> = faces
        .iter()
        .map(|&[a, b, c]| {
            let (p0, p1, p2) = (&vertices[a], &vertices[b], &vertices[c]);
            let n = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(f64::MIN_POSITIVE)
                .unwrap_or_else(Vector3::zeros);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new(as_f32(p0)),
                    stl_io::Vertex::new(as_f32(p1)),
                    stl_io::Vertex::new(as_f32(p2)),
                ],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.flush()?;

    Ok(())
}
