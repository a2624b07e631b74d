//! Per-vertex planar coordinates.
//!
//! A flattening is only defined up to a common complex scalar, so besides
//! storage [`UVMap`] offers the comparison helpers needed to check one
//! flattening against another: [`UVMap::similarity_to`] recovers the scalar
//! and [`UVMap::max_deviation_after`] measures what is left.

use std::marker::PhantomData;

use nalgebra::{DVector, Point2, Point3};
use num_complex::Complex64;

use crate::mesh::{MeshIndex, VertexId};

/// Positions below this magnitude cannot anchor a similarity.
const ANCHOR_EPSILON: f64 = 1e-12;

/// Planar coordinates indexed by vertex id.
///
/// # Example
///
/// ```
/// use conflat::algo::parameterize::UVMap;
/// use conflat::mesh::VertexId;
/// use nalgebra::Point2;
///
/// let uv: UVMap = UVMap::new(vec![Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)]);
/// let rotated = uv.scaled(num_complex::Complex64::new(0.0, 2.0));
///
/// let r = rotated.similarity_to(&uv).unwrap();
/// assert!(rotated.max_deviation_after(r, &uv) < 1e-12);
/// assert_eq!(rotated.get(VertexId::new(0)), Point2::new(0.0, 2.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UVMap<I: MeshIndex = u32> {
    coords: Vec<Point2<f64>>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> UVMap<I> {
    /// Wrap coordinates; index `i` belongs to vertex `i`.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self {
            coords,
            _marker: PhantomData,
        }
    }

    /// A map with every vertex at the origin.
    pub fn zeros(n: usize) -> Self {
        Self::new(vec![Point2::origin(); n])
    }

    /// Read `(Re z_i, Im z_i)` for every entry of a complex vector.
    pub fn from_complex(z: &DVector<Complex64>) -> Self {
        Self::new(z.iter().map(|c| Point2::new(c.re, c.im)).collect())
    }

    /// Coordinates as complex numbers `u + iv`.
    pub fn to_complex(&self) -> DVector<Complex64> {
        DVector::from_iterator(self.coords.len(), self.coords.iter().map(as_complex))
    }

    /// Coordinates of a vertex.
    #[inline]
    pub fn get(&self, v: VertexId<I>) -> Point2<f64> {
        self.coords[v.index()]
    }

    /// Overwrite the coordinates of a vertex.
    #[inline]
    pub fn set(&mut self, v: VertexId<I>, uv: Point2<f64>) {
        self.coords[v.index()] = uv;
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Whether the map has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over `(vertex, position)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId<I>, Point2<f64>)> + '_ {
        self.coords
            .iter()
            .enumerate()
            .map(|(i, &uv)| (VertexId::new(i), uv))
    }

    /// Raw coordinates in vertex order.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Embed in 3-D with `z = 0`.
    pub fn to_points3(&self) -> Vec<Point3<f64>> {
        self.coords.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect()
    }

    /// Index of the first vertex with a NaN or infinite coordinate.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.coords
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite()))
    }

    /// Whether every coordinate is finite.
    pub fn is_valid(&self) -> bool {
        self.first_non_finite().is_none()
    }

    /// Axis-aligned bounds; `None` if the map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.coords.first()?;
        Some(
            self.coords
                .iter()
                .fold((first, first), |(min, max), p| (min.inf(p), max.sup(p))),
        )
    }

    /// Multiply every position, viewed as `u + iv`, by `scale`.
    pub fn scaled(&self, scale: Complex64) -> Self {
        Self::new(
            self.coords
                .iter()
                .map(|p| {
                    let z = as_complex(p) * scale;
                    Point2::new(z.re, z.im)
                })
                .collect(),
        )
    }

    /// The complex scalar `r` with `self * r ≈ reference`.
    ///
    /// `r` is read off the first vertex whose position in `self` is not at
    /// the origin. Returns `None` if the maps differ in length or no such
    /// vertex exists.
    pub fn similarity_to(&self, reference: &UVMap<I>) -> Option<Complex64> {
        if self.len() != reference.len() {
            return None;
        }
        self.coords
            .iter()
            .zip(&reference.coords)
            .map(|(p, s)| (as_complex(p), as_complex(s)))
            .find(|(p, _)| p.norm() > ANCHOR_EPSILON)
            .map(|(p, s)| s / p)
    }

    /// Largest `|self_i * r - reference_i|` over all vertices.
    ///
    /// Infinite if the lengths differ or any coordinate is not finite.
    pub fn max_deviation_after(&self, r: Complex64, reference: &UVMap<I>) -> f64 {
        if self.len() != reference.len() {
            return f64::INFINITY;
        }
        self.coords
            .iter()
            .zip(&reference.coords)
            .map(|(p, s)| {
                let d = (as_complex(p) * r - as_complex(s)).norm();
                if d.is_finite() {
                    d
                } else {
                    f64::INFINITY
                }
            })
            .fold(0.0, f64::max)
    }

    /// Sum of signed triangle areas; negative when the map flips orientation.
    ///
    /// # Panics
    ///
    /// Panics if a face references a vertex index `>= self.len()`.
    pub fn signed_area(&self, faces: &[[usize; 3]]) -> f64 {
        faces
            .iter()
            .map(|&[a, b, c]| {
                assert!(
                    a.max(b).max(c) < self.len(),
                    "face ({}, {}, {}) references a vertex outside a map of {}",
                    a,
                    b,
                    c,
                    self.len()
                );
                let (p0, p1, p2) = (self.coords[a], self.coords[b], self.coords[c]);
                0.5 * ((p1 - p0).perp(&(p2 - p0)))
            })
            .sum()
    }
}

#[inline]
fn as_complex(p: &Point2<f64>) -> Complex64 {
    Complex64::new(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> UVMap {
        UVMap::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
        ])
    }

    #[test]
    fn test_access() {
        let mut uv = triangle();
        assert_eq!(uv.len(), 3);
        assert_eq!(uv.get(VertexId::new(2)), Point2::new(0.5, 1.0));

        uv.set(VertexId::new(0), Point2::new(-1.0, 2.0));
        assert_eq!(uv.as_slice()[0], Point2::new(-1.0, 2.0));
        assert_eq!(uv.to_points3()[0], Point3::new(-1.0, 2.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "outside a map of 3")]
    fn test_signed_area_rejects_foreign_faces() {
        triangle().signed_area(&[[0, 1, 3]]);
    }

    #[test]
    fn test_complex_conversion() {
        let z = DVector::from_vec(vec![Complex64::new(1.0, -2.0), Complex64::new(0.5, 3.0)]);
        let uv: UVMap = UVMap::from_complex(&z);
        assert_eq!(uv.get(VertexId::new(0)), Point2::new(1.0, -2.0));
        assert_eq!(uv.to_complex(), z);
    }

    #[test]
    fn test_similarity_skips_origin() {
        // Vertex 0 sits at the origin, so vertex 1 anchors the scalar.
        let uv = triangle();
        let r = Complex64::new(0.3, -1.7);
        let target = uv.scaled(r);

        let found = uv.similarity_to(&target).unwrap();
        assert!((found - r).norm() < 1e-12);
        assert!(uv.max_deviation_after(found, &target) < 1e-12);
    }

    #[test]
    fn test_deviation_detects_non_similar_maps() {
        let uv = triangle();
        let mut other = uv.scaled(Complex64::new(2.0, 0.0));
        other.set(VertexId::new(2), Point2::new(5.0, 5.0));

        let r = uv.similarity_to(&other).unwrap();
        assert!(uv.max_deviation_after(r, &other) > 1.0);
    }

    #[test]
    fn test_similarity_degenerate_inputs() {
        let zeros: UVMap = UVMap::zeros(3);
        assert!(zeros.similarity_to(&triangle()).is_none());
        assert!(triangle().similarity_to(&UVMap::zeros(2)).is_none());
    }

    #[test]
    fn test_validity() {
        let mut uv = triangle();
        assert!(uv.is_valid());
        uv.set(VertexId::new(1), Point2::new(f64::NAN, 0.0));
        assert_eq!(uv.first_non_finite(), Some(1));
        assert!(!uv.is_valid());
        assert_eq!(uv.max_deviation_after(Complex64::new(1.0, 0.0), &triangle()), f64::INFINITY);
    }

    #[test]
    fn test_bounding_box_and_area() {
        let uv = triangle();
        let (min, max) = uv.bounding_box().unwrap();
        assert_eq!(min, Point2::new(0.0, 0.0));
        assert_eq!(max, Point2::new(1.0, 1.0));

        assert!((uv.signed_area(&[[0, 1, 2]]) - 0.5).abs() < 1e-12);
        assert!((uv.signed_area(&[[0, 2, 1]]) + 0.5).abs() < 1e-12);
        assert!(UVMap::<u32>::zeros(0).bounding_box().is_none());
    }
}
