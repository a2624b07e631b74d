//! Wavefront OBJ support.
//!
//! Only `v` and `f` records are read. Faces may use the `v/vt/vn` forms and
//! negative (relative) indices; polygons are fan-triangulated. Every other
//! record is skipped, which lets reference files carry extra lines.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::algo::parameterize::UVMap;
use crate::error::{MeshError, Result};
use crate::mesh::{
    build_from_triangles, remove_unreferenced_vertices, to_face_vertex, HalfEdgeMesh, MeshIndex,
};

/// Vertices and triangles parsed from OBJ text.
pub type FaceVertex = (Vec<Point3<f64>>, Vec<[usize; 3]>);

/// Parse the `v` and `f` records of OBJ text.
pub fn parse(text: &str) -> Result<FaceVertex> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let coords = tokens
                    .take(3)
                    .map(|t| {
                        t.parse::<f64>()
                            .map_err(|_| MeshError::parse(lineno, format!("bad coordinate '{}'", t)))
                    })
                    .collect::<Result<Vec<f64>>>()?;
                if coords.len() != 3 {
                    return Err(MeshError::parse(lineno, "vertex needs three coordinates"));
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let polygon = tokens
                    .map(|t| resolve_index(t, vertices.len(), lineno))
                    .collect::<Result<Vec<usize>>>()?;
                if polygon.len() < 3 {
                    return Err(MeshError::parse(lineno, "face needs at least three vertices"));
                }
                for k in 1..polygon.len() - 1 {
                    faces.push([polygon[0], polygon[k], polygon[k + 1]]);
                }
            }
            _ => {}
        }
    }

    Ok((vertices, faces))
}

/// Turn a face token (`7`, `7/2`, `7//3`, `-1`) into a zero-based index.
fn resolve_index(token: &str, num_vertices: usize, lineno: usize) -> Result<usize> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = head
        .parse()
        .map_err(|_| MeshError::parse(lineno, format!("bad face index '{}'", token)))?;

    let index = match raw {
        r if r > 0 => r - 1,
        r if r < 0 => num_vertices as i64 + r,
        _ => -1,
    };
    if index < 0 {
        return Err(MeshError::parse(lineno, format!("face index '{}' out of range", token)));
    }
    Ok(index as usize)
}

/// Load a mesh from an OBJ file.
///
/// Vertices that no face references are dropped, so vertex ids follow the
/// order of the remaining `v` records.
///
/// # Example
///
/// ```no_run
/// use conflat::io::obj;
/// use conflat::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let (vertices, faces) = parse(&text).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let (vertices, faces) = remove_unreferenced_vertices(&vertices, &faces)?;
    build_from_triangles(&vertices, &faces)
}

/// Save a mesh to an OBJ file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer, mesh, None)?;
    writer.flush()?;
    Ok(())
}

/// Save a mesh with one texture coordinate per vertex.
///
/// Coordinates are written as computed; no fitting into the unit square is
/// applied.
///
/// # Errors
///
/// [`MeshError::DimensionMismatch`] if `uv` does not have one entry per
/// vertex.
pub fn save_with_uvs<P: AsRef<Path>, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    uv: &UVMap<I>,
    path: P,
) -> Result<()> {
    if uv.len() != mesh.num_vertices() {
        return Err(MeshError::DimensionMismatch {
            expected: mesh.num_vertices(),
            found: uv.len(),
        });
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer, mesh, Some(uv))?;
    writer.flush()?;
    Ok(())
}

/// Write OBJ text, with `vt` records when `uv` is given.
pub fn write<W: Write, I: MeshIndex>(
    writer: &mut W,
    mesh: &HalfEdgeMesh<I>,
    uv: Option<&UVMap<I>>,
) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    for p in &vertices {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    if let Some(uv) = uv {
        for p in uv.as_slice() {
            writeln!(writer, "vt {} {}", p.x, p.y)?;
        }
    }
    for [a, b, c] in faces {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        if uv.is_some() {
            writeln!(writer, "f {}/{} {}/{} {}/{}", a, a, b, b, c, c)?;
        } else {
            writeln!(writer, "f {} {} {}", a, b, c)?;
        }
    }
    Ok(())
}
