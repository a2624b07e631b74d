//! Geometric quantities derived from vertex positions.
//!
//! Cotangents are computed without clamping. A zero-area corner yields an
//! infinite or NaN cotangent; callers that need finite weights must reject
//! degenerate triangles beforehand.

use nalgebra::{Point3, Vector3};

use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, HalfEdgeId, MeshIndex};

/// Cotangent of the angle at `a` in triangle (a, b, c).
#[inline]
pub fn cotangent_at(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.dot(&ac) / ab.cross(&ac).norm()
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Cotangent of the corner opposite a half-edge inside its face.
    ///
    /// Boundary half-edges have no face and contribute zero.
    pub fn opposite_cotangent(&self, he: HalfEdgeId<I>) -> f64 {
        if self.is_boundary_halfedge(he) {
            return 0.0;
        }
        let apex = self.position(self.origin(self.prev(he)));
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        cotangent_at(apex, p0, p1)
    }

    /// Cotangent weight `(cot α + cot β) / 2` of the edge containing `he`.
    ///
    /// On a boundary edge only the interior corner contributes.
    pub fn cotan_weight(&self, he: HalfEdgeId<I>) -> f64 {
        0.5 * (self.opposite_cotangent(he) + self.opposite_cotangent(self.twin(he)))
    }

    /// Length of the edge containing `he`.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        (self.position(self.dest(he)) - self.position(self.origin(he))).norm()
    }

    /// Area-weighted normal of a triangle (twice its area in magnitude).
    pub fn face_area_vector(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Area of a triangle.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        0.5 * self.face_area_vector(f).norm()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Axis-aligned bounding box, or `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (min.inf(&v.position), max.sup(&v.position))
        }))
    }

    /// Whether any triangle has (numerically) zero area.
    ///
    /// Flattening does not call this; it is offered so callers can reject
    /// meshes whose cotangent weights would be non-finite.
    pub fn has_degenerate_faces(&self, min_area: f64) -> bool {
        self.face_ids().any(|f| self.face_area(f) <= min_area)
    }
}
