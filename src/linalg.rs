//! Vector and matrix primitives over row-major `Vec<Vec<f64>>` matrices.
//!
//! Everything here is a pure function: arguments are borrowed and a fresh
//! value is returned. Layers keep their parameters as `ndarray` arrays; the
//! `to_array`/`from_array` pair converts at that boundary.

use crate::error::{Error, Result};
use ndarray::Array2;

/// Row-major matrix. All rows must have the same length.
pub type Matrix = Vec<Vec<f64>>;

/// Round `x` to `digits` decimal places. Negative `digits` rounds to an integer.
pub fn round_to(x: f64, digits: i32) -> f64 {
    if digits < 0 {
        return x.round();
    }
    let pow = 10f64.powi(digits);
    (x * pow).round() / pow
}

/// Dot product of two equal-length vectors.
pub fn dot(v1: &[f64], v2: &[f64]) -> Result<f64> {
    if v1.len() != v2.len() {
        return Err(Error::mismatch("dot", v1.len(), v2.len()));
    }
    Ok(v1.iter().zip(v2).map(|(a, b)| a * b).sum())
}

/// Elementwise sum.
pub fn add(v1: &[f64], v2: &[f64]) -> Result<Vec<f64>> {
    if v1.len() != v2.len() {
        return Err(Error::mismatch("add", v1.len(), v2.len()));
    }
    Ok(v1.iter().zip(v2).map(|(a, b)| a + b).collect())
}

/// Elementwise difference `v1 - v2`.
pub fn sub(v1: &[f64], v2: &[f64]) -> Result<Vec<f64>> {
    if v1.len() != v2.len() {
        return Err(Error::mismatch("sub", v1.len(), v2.len()));
    }
    Ok(v1.iter().zip(v2).map(|(a, b)| a - b).collect())
}

/// Multiply every element by `k`.
pub fn scale(v: &[f64], k: f64) -> Vec<f64> {
    v.iter().map(|x| x * k).collect()
}

/// Euclidean norm. Zero for an empty vector.
pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Unit vector in the direction of `v`, or all zeros when `v` has zero norm.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let n = norm(v);
    if n == 0.0 {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / n).collect()
}

/// Elementwise maximum of two vectors.
pub fn maximum(v1: &[f64], v2: &[f64]) -> Result<Vec<f64>> {
    if v1.len() != v2.len() {
        return Err(Error::mismatch("maximum", v1.len(), v2.len()));
    }
    Ok(v1.iter().zip(v2).map(|(a, b)| a.max(*b)).collect())
}

/// Elementwise maximum of two matrices of identical shape.
pub fn maximum_matrix(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.len() != b.len() {
        return Err(Error::mismatch("maximum_matrix", a.len(), b.len()));
    }
    a.iter()
        .zip(b)
        .map(|(ra, rb)| maximum(ra, rb))
        .collect()
}

/// Check that `m` has at least one row and that all rows share a length.
///
/// Returns the column count.
pub fn validate_matrix(m: &Matrix, op: &'static str) -> Result<usize> {
    let first = m.first().ok_or(Error::EmptyInput { op })?;
    let cols = first.len();
    for (row, values) in m.iter().enumerate() {
        if values.len() != cols {
            return Err(Error::RaggedMatrix {
                row,
                expected: cols,
                got: values.len(),
            });
        }
    }
    Ok(cols)
}

/// Check that two matrices have the same number of rows and columns.
pub(crate) fn validate_same_shape(a: &Matrix, b: &Matrix, op: &'static str) -> Result<()> {
    let a_cols = validate_matrix(a, op)?;
    let b_cols = validate_matrix(b, op)?;
    if a.len() != b.len() {
        return Err(Error::mismatch(op, b.len(), a.len()));
    }
    if a_cols != b_cols {
        return Err(Error::mismatch(op, b_cols, a_cols));
    }
    Ok(())
}

/// Matrix product `(m×n)·(n×p) = (m×p)`.
pub fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let n = validate_matrix(a, "matmul")?;
    let p = validate_matrix(b, "matmul")?;
    if n != b.len() {
        return Err(Error::mismatch("matmul", b.len(), n));
    }

    let mut c = vec![vec![0.0; p]; a.len()];
    for (row_a, row_c) in a.iter().zip(c.iter_mut()) {
        for (k, &a_ik) in row_a.iter().enumerate() {
            for (c_ij, b_kj) in row_c.iter_mut().zip(&b[k]) {
                *c_ij += a_ik * b_kj;
            }
        }
    }
    Ok(c)
}

/// Transpose. An empty matrix transposes to an empty matrix.
pub fn transpose(m: &Matrix) -> Result<Matrix> {
    if m.is_empty() {
        return Ok(Vec::new());
    }
    let cols = validate_matrix(m, "transpose")?;
    Ok((0..cols)
        .map(|j| m.iter().map(|row| row[j]).collect())
        .collect())
}

/// Convert a validated row-major matrix into a dense array.
pub fn to_array(m: &Matrix) -> Result<Array2<f64>> {
    let cols = validate_matrix(m, "to_array")?;
    let data: Vec<f64> = m.iter().flatten().copied().collect();
    Array2::from_shape_vec((m.len(), cols), data)
        .map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Convert a dense array back into row-major form.
pub fn from_array(a: &Array2<f64>) -> Matrix {
    a.rows().into_iter().map(|row| row.to_vec()).collect()
}
