//! Reference solution files.
//!
//! A solution file is OBJ text extended with two record types:
//!
//! ```text
//! T <re> <im> <row> <col>   one entry of the conformal energy matrix
//! uv <u> <v>                planar position of the next vertex
//! ```
//!
//! `T` entries accumulate like [`ComplexTriplets`]. `uv` records are
//! assigned to vertices in file order. Regression tests compare a computed
//! energy and flattening against these records.

use std::io::Write;
use std::path::Path;

use nalgebra::{Point2, Point3};
use num_complex::Complex64;

use crate::algo::parameterize::{ComplexTriplets, UVMap};
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, HalfEdgeMesh, MeshIndex};

use super::obj;

/// Parsed contents of a solution file.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Mesh vertices (`v` records).
    pub vertices: Vec<Point3<f64>>,
    /// Mesh triangles (`f` records).
    pub faces: Vec<[usize; 3]>,
    /// Reference energy matrix (`T` records).
    pub energy: ComplexTriplets,
    /// Reference flattening (`uv` records).
    pub flattening: UVMap,
}

impl Solution {
    /// Parse a solution from text.
    pub fn parse(text: &str) -> Result<Self> {
        let (vertices, faces) = obj::parse(text)?;
        let energy = parse_triplets(text, vertices.len())?;
        let flattening = parse_flattening(text)?;
        Ok(Self {
            vertices,
            faces,
            energy,
            flattening,
        })
    }

    /// Read and parse a solution file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| MeshError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Build the half-edge mesh described by the `v`/`f` records.
    pub fn mesh<I: MeshIndex>(&self) -> Result<HalfEdgeMesh<I>> {
        build_from_triangles(&self.vertices, &self.faces)
    }
}

fn fields<'a, const N: usize>(
    tokens: impl Iterator<Item = &'a str>,
    lineno: usize,
    record: &str,
) -> Result<[&'a str; N]> {
    let collected: Vec<&str> = tokens.collect();
    collected.try_into().map_err(|v: Vec<&str>| {
        MeshError::parse(
            lineno,
            format!("'{}' record needs {} fields, found {}", record, N, v.len()),
        )
    })
}

fn number<T: std::str::FromStr>(token: &str, lineno: usize) -> Result<T> {
    token
        .parse()
        .map_err(|_| MeshError::parse(lineno, format!("bad number '{}'", token)))
}

/// Collect the `T re im row col` records of a `dim x dim` matrix.
///
/// # Errors
///
/// [`MeshError::Parse`] for malformed records or indices outside the matrix.
pub fn parse_triplets(text: &str, dim: usize) -> Result<ComplexTriplets> {
    let mut triplets = ComplexTriplets::new(dim, dim);

    for (lineno, line) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("T") {
            continue;
        }

        let [re, im, row, col]: [&str; 4] = fields(tokens, lineno, "T")?;
        let value = Complex64::new(number(re, lineno)?, number(im, lineno)?);
        let row: usize = number(row, lineno)?;
        let col: usize = number(col, lineno)?;
        if row >= dim || col >= dim {
            return Err(MeshError::parse(
                lineno,
                format!("entry ({}, {}) outside {}x{} matrix", row, col, dim, dim),
            ));
        }
        triplets.add_entry(value, row, col);
    }

    Ok(triplets)
}

/// Collect the `uv u v` records in order.
pub fn parse_flattening<I: MeshIndex>(text: &str) -> Result<UVMap<I>> {
    let mut coords = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("uv") {
            continue;
        }

        let [u, v]: [&str; 2] = fields(tokens, lineno, "uv")?;
        coords.push(Point2::new(number(u, lineno)?, number(v, lineno)?));
    }

    Ok(UVMap::new(coords))
}

/// Write one `T` record per triplet, in insertion order.
pub fn write_triplets<W: Write>(writer: &mut W, triplets: &ComplexTriplets) -> Result<()> {
    for &(row, col, value) in triplets.entries() {
        writeln!(writer, "T {} {} {} {}", value.re, value.im, row, col)?;
    }
    Ok(())
}

/// Write one `uv` record per vertex.
pub fn write_flattening<W: Write, I: MeshIndex>(writer: &mut W, uv: &UVMap<I>) -> Result<()> {
    for p in uv.as_slice() {
        writeln!(writer, "uv {} {}", p.x, p.y)?;
    }
    Ok(())
}
