//! Complex sparse matrices and a Hermitian conjugate gradient solver.
//!
//! Matrices are assembled in two phases. A [`ComplexTriplets`] list accepts
//! `(value, row, col)` entries in any order, with repeated positions summed.
//! [`CsrMatrix::from_triplets`] consumes the list and produces an immutable
//! compressed-row matrix that supports products, adjoints, and norms.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::error::{MeshError, Result};

/// Write-only accumulation list for a complex sparse matrix.
#[derive(Debug, Clone)]
pub struct ComplexTriplets {
    rows: usize,
    cols: usize,
    entries: Vec<(usize, usize, Complex64)>,
}

impl ComplexTriplets {
    /// Create an empty list for a `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::new(),
        }
    }

    /// Create an empty list with room for `capacity` entries.
    pub fn with_capacity(rows: usize, cols: usize, capacity: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Add `value` at `(row, col)`. Entries at the same position accumulate.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the matrix.
    #[inline]
    pub fn add_entry(&mut self, value: Complex64, row: usize, col: usize) {
        assert!(
            row < self.rows && col < self.cols,
            "entry ({}, {}) outside {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        self.entries.push((row, col, value));
    }

    /// Number of rows of the matrix being assembled.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns of the matrix being assembled.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Number of accumulated entries (duplicates counted separately).
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw entries as `(row, col, value)` in insertion order.
    pub fn entries(&self) -> &[(usize, usize, Complex64)] {
        &self.entries
    }

    /// Append every entry of `other`, optionally scaled.
    pub fn extend_scaled(&mut self, other: &ComplexTriplets, scale: Complex64) -> Result<()> {
        check_shape(self.rows, self.cols, other.rows, other.cols)?;
        self.entries
            .extend(other.entries.iter().map(|&(r, c, v)| (r, c, v * scale)));
        Ok(())
    }
}

/// Compressed Sparse Row matrix over `Complex64`.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` indexes the entries of row `i`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<Complex64>,
}

impl CsrMatrix {
    /// Finalize a triplet list. Duplicate positions are summed.
    pub fn from_triplets(triplets: ComplexTriplets) -> Self {
        let ComplexTriplets {
            rows,
            cols,
            mut entries,
        } = triplets;

        // Stable, so duplicates are summed in insertion order.
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values: Vec<Complex64> = Vec::with_capacity(entries.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, value) in entries {
            if last == Some((row, col)) {
                if let Some(acc) = values.last_mut() {
                    *acc += value;
                }
                continue;
            }
            col_idx.push(col);
            values.push(value);
            row_ptr[row + 1] += 1;
            last = Some((row, col));
        }

        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// `scale * I` of size `n`.
    pub fn scaled_identity(n: usize, scale: Complex64) -> Self {
        let mut t = ComplexTriplets::with_capacity(n, n, n);
        for i in 0..n {
            t.add_entry(scale, i, i);
        }
        Self::from_triplets(t)
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Value at `(row, col)`, zero if not stored.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        assert!(
            row < self.rows && col < self.cols,
            "entry ({}, {}) outside {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        match self.col_idx[range.clone()].binary_search(&col) {
            Ok(k) => self.values[range.start + k],
            Err(_) => Complex64::new(0.0, 0.0),
        }
    }

    /// Iterate over stored entries as `(row, col, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Complex64)> + '_ {
        (0..self.rows).flat_map(move |r| {
            (self.row_ptr[r]..self.row_ptr[r + 1]).map(move |k| (r, self.col_idx[k], self.values[k]))
        })
    }

    /// Back to a triplet list, e.g. for export or further accumulation.
    pub fn to_triplets(&self) -> ComplexTriplets {
        let mut t = ComplexTriplets::with_capacity(self.rows, self.cols, self.nnz());
        for (r, c, v) in self.iter() {
            t.add_entry(v, r, c);
        }
        t
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Self {
        let mut t = ComplexTriplets::with_capacity(self.cols, self.rows, self.nnz());
        for (r, c, v) in self.iter() {
            t.add_entry(v.conj(), c, r);
        }
        Self::from_triplets(t)
    }

    /// `self + scale * other`.
    pub fn add_scaled(&self, other: &CsrMatrix, scale: Complex64) -> Result<Self> {
        check_shape(self.rows, self.cols, other.rows, other.cols)?;
        let mut t = self.to_triplets();
        t.extend_scaled(&other.to_triplets(), scale)?;
        Ok(Self::from_triplets(t))
    }

    /// `self - other`.
    pub fn sub(&self, other: &CsrMatrix) -> Result<Self> {
        self.add_scaled(other, Complex64::new(-1.0, 0.0))
    }

    /// `self + other`.
    pub fn add(&self, other: &CsrMatrix) -> Result<Self> {
        self.add_scaled(other, Complex64::new(1.0, 0.0))
    }

    /// Frobenius norm `sqrt(sum |a_ij|^2)`.
    pub fn frobenius_norm(&self) -> f64 {
        self.values.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
    }

    /// `‖A − A*‖_F`, zero for a Hermitian matrix.
    pub fn hermitian_defect(&self) -> f64 {
        match self.sub(&self.adjoint()) {
            Ok(diff) => diff.frobenius_norm(),
            Err(_) => f64::INFINITY,
        }
    }

    /// Whether the matrix equals its conjugate transpose within `tolerance`
    /// (Frobenius norm of the difference).
    pub fn is_hermitian(&self, tolerance: f64) -> bool {
        self.rows == self.cols && self.hermitian_defect() <= tolerance
    }

    /// Dense copy, for small systems and factorization.
    pub fn to_dense(&self) -> DMatrix<Complex64> {
        let mut dense = DMatrix::zeros(self.rows, self.cols);
        for (r, c, v) in self.iter() {
            dense[(r, c)] += v;
        }
        dense
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &DVector<Complex64>) -> Complex64 {
        (self.row_ptr[row]..self.row_ptr[row + 1])
            .map(|k| self.values[k] * x[self.col_idx[k]])
            .sum()
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<Complex64>) -> DVector<Complex64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");
        DVector::from_iterator(self.rows, (0..self.rows).map(|i| self.row_dot(i, x)))
    }

    /// Row-parallel version of [`CsrMatrix::mul_vec`].
    pub fn par_mul_vec(&self, x: &DVector<Complex64>) -> DVector<Complex64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");
        let y: Vec<Complex64> = (0..self.rows)
            .into_par_iter()
            .map(|i| self.row_dot(i, x))
            .collect();
        DVector::from_vec(y)
    }

    #[inline]
    fn apply(&self, x: &DVector<Complex64>, parallel: bool) -> DVector<Complex64> {
        if parallel {
            self.par_mul_vec(x)
        } else {
            self.mul_vec(x)
        }
    }
}

fn check_shape(rows: usize, cols: usize, other_rows: usize, other_cols: usize) -> Result<()> {
    if rows != other_rows {
        return Err(MeshError::DimensionMismatch {
            expected: rows,
            found: other_rows,
        });
    }
    if cols != other_cols {
        return Err(MeshError::DimensionMismatch {
            expected: cols,
            found: other_cols,
        });
    }
    Ok(())
}

/// Solve `A x = b` for Hermitian positive definite `A` by conjugate gradient.
///
/// # Arguments
///
/// * `a` - The system matrix (Hermitian positive definite)
/// * `b` - The right-hand side vector
/// * `x0` - Optional initial guess (zeros if None)
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance on the relative residual norm
/// * `parallel` - Use row-parallel matrix-vector products
///
/// # Errors
///
/// [`MeshError::DimensionMismatch`] for inconsistent shapes and
/// [`MeshError::ConvergenceFailed`] when the residual does not drop below
/// `tolerance` within `max_iter` iterations.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<Complex64>,
    x0: Option<&DVector<Complex64>>,
    max_iter: usize,
    tolerance: f64,
    parallel: bool,
) -> Result<DVector<Complex64>> {
    let n = b.len();
    check_shape(a.nrows(), a.ncols(), n, n)?;

    let mut x = match x0 {
        Some(x0) if x0.len() == n => x0.clone(),
        Some(x0) => {
            return Err(MeshError::DimensionMismatch {
                expected: n,
                found: x0.len(),
            })
        }
        None => DVector::zeros(n),
    };

    let b_norm = b.norm();
    if b_norm < 1e-300 {
        return Ok(DVector::zeros(n));
    }

    let mut r = b - a.apply(&x, parallel);
    let mut r_norm_sq = r.norm_squared();
    if r_norm_sq.sqrt() / b_norm < tolerance {
        return Ok(x);
    }

    let mut p = r.clone();

    for _ in 0..max_iter {
        let ap = a.apply(&p, parallel);

        // p^H A p is real for Hermitian A.
        let p_ap = p.dotc(&ap).re;
        if p_ap <= 0.0 || !p_ap.is_finite() {
            break;
        }
        let alpha = Complex64::new(r_norm_sq / p_ap, 0.0);

        x.axpy(alpha, &p, Complex64::new(1.0, 0.0));
        r.axpy(-alpha, &ap, Complex64::new(1.0, 0.0));

        let new_r_norm_sq = r.norm_squared();
        if new_r_norm_sq.sqrt() / b_norm < tolerance {
            return Ok(x);
        }

        let beta = Complex64::new(new_r_norm_sq / r_norm_sq, 0.0);
        p = &r + &p * beta;
        r_norm_sq = new_r_norm_sq;
    }

    Err(MeshError::ConvergenceFailed {
        iterations: max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    /// [ 4     1+i ]
    /// [ 1-i   3   ]
    fn hermitian_2x2() -> CsrMatrix {
        let mut t = ComplexTriplets::new(2, 2);
        t.add_entry(c(4.0, 0.0), 0, 0);
        t.add_entry(c(1.0, 1.0), 0, 1);
        t.add_entry(c(1.0, -1.0), 1, 0);
        t.add_entry(c(3.0, 0.0), 1, 1);
        CsrMatrix::from_triplets(t)
    }

    #[test]
    fn test_duplicates_accumulate() {
        let mut t = ComplexTriplets::new(2, 2);
        t.add_entry(c(1.0, 0.5), 1, 0);
        t.add_entry(c(2.0, 0.0), 0, 0);
        t.add_entry(c(0.5, -0.5), 1, 0);
        let a = CsrMatrix::from_triplets(t);

        assert_eq!(a.nnz(), 2);
        assert_eq!(a.get(1, 0), c(1.5, 0.0));
        assert_eq!(a.get(0, 0), c(2.0, 0.0));
        assert_eq!(a.get(0, 1), c(0.0, 0.0));
        assert_eq!(a.get(1, 1), c(0.0, 0.0));
    }

    #[test]
    #[should_panic]
    fn test_add_entry_out_of_bounds() {
        let mut t = ComplexTriplets::new(2, 2);
        t.add_entry(c(1.0, 0.0), 2, 0);
    }

    #[test]
    #[should_panic(expected = "outside 2x2 matrix")]
    fn test_get_out_of_bounds() {
        hermitian_2x2().get(2, 0);
    }

    #[test]
    #[should_panic(expected = "outside 2x2 matrix")]
    fn test_get_column_out_of_bounds() {
        hermitian_2x2().get(0, 5);
    }

    #[test]
    fn test_mul_vec() {
        let a = hermitian_2x2();
        let x = DVector::from_vec(vec![c(1.0, 0.0), c(0.0, 1.0)]);
        let y = a.mul_vec(&x);

        // 4 + (1+i)i = 3 + 5i ; (1-i) + 3i = 1 + 2i
        assert!((y[0] - c(3.0, 5.0)).norm() < 1e-12);
        assert!((y[1] - c(1.0, 2.0)).norm() < 1e-12);
        assert!((a.par_mul_vec(&x) - y).norm() < 1e-12);
    }

    #[test]
    fn test_adjoint_and_hermitian() {
        let a = hermitian_2x2();
        assert!(a.is_hermitian(1e-14));

        let mut t = ComplexTriplets::new(2, 2);
        t.add_entry(c(0.0, 1.0), 0, 1);
        let skew = CsrMatrix::from_triplets(t);
        assert_eq!(skew.adjoint().get(1, 0), c(0.0, -1.0));
        assert!(!skew.is_hermitian(1e-6));
    }

    #[test]
    fn test_sub_and_frobenius() {
        let a = hermitian_2x2();
        assert!(a.sub(&a).unwrap().frobenius_norm() < 1e-15);

        // |4|^2 + |1+i|^2 + |1-i|^2 + |3|^2 = 16 + 2 + 2 + 9
        assert!((a.frobenius_norm() - 29.0f64.sqrt()).abs() < 1e-12);

        let shifted = a.add(&CsrMatrix::scaled_identity(2, c(1.0, 0.0))).unwrap();
        assert_eq!(shifted.get(0, 0), c(5.0, 0.0));
        assert_eq!(shifted.get(0, 1), c(1.0, 1.0));

        let wrong = CsrMatrix::scaled_identity(3, c(1.0, 0.0));
        assert!(matches!(a.sub(&wrong), Err(MeshError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_to_dense() {
        let dense = hermitian_2x2().to_dense();
        assert_eq!(dense[(0, 1)], c(1.0, 1.0));
        assert_eq!(dense[(1, 0)], c(1.0, -1.0));
        assert_eq!(dense.adjoint(), dense);
    }

    #[test]
    fn test_cg_hermitian() {
        let a = hermitian_2x2();
        let b = DVector::from_vec(vec![c(1.0, 0.0), c(0.0, 2.0)]);

        let x = conjugate_gradient(&a, &b, None, 100, 1e-12, false).unwrap();
        assert!((a.mul_vec(&x) - &b).norm() < 1e-10);

        let x_par = conjugate_gradient(&a, &b, None, 100, 1e-12, true).unwrap();
        assert!((x_par - x).norm() < 1e-10);
    }

    #[test]
    fn test_cg_larger_real_system() {
        let mut t = ComplexTriplets::new(4, 4);
        for (r, col, v) in [
            (0, 0, 10.0),
            (0, 1, 1.0),
            (0, 2, 2.0),
            (1, 0, 1.0),
            (1, 1, 10.0),
            (1, 2, 1.0),
            (2, 0, 2.0),
            (2, 1, 1.0),
            (2, 2, 10.0),
            (2, 3, 1.0),
            (3, 2, 1.0),
            (3, 3, 10.0),
        ] {
            t.add_entry(c(v, 0.0), r, col);
        }
        let a = CsrMatrix::from_triplets(t);
        let b = DVector::from_vec(vec![c(1.0, 0.0), c(2.0, 1.0), c(3.0, 0.0), c(4.0, -1.0)]);

        let x = conjugate_gradient(&a, &b, None, 100, 1e-12, false).unwrap();
        assert!((a.mul_vec(&x) - b).norm() < 1e-9);
    }

    #[test]
    fn test_cg_iteration_budget() {
        let a = hermitian_2x2();
        let b = DVector::from_vec(vec![c(1.0, 0.0), c(0.0, 2.0)]);
        let result = conjugate_gradient(&a, &b, None, 1, 1e-14, false);
        assert!(matches!(result, Err(MeshError::ConvergenceFailed { iterations: 1 })));
    }

    #[test]
    fn test_cg_dimension_mismatch() {
        let a = hermitian_2x2();
        let b = DVector::from_vec(vec![c(1.0, 0.0); 3]);
        let result = conjugate_gradient(&a, &b, None, 10, 1e-10, false);
        assert!(matches!(result, Err(MeshError::DimensionMismatch { .. })));
    }
}
