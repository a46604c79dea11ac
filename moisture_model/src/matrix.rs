//! Row-major dense matrix with just the operations the network needs.

use serde::{Deserialize, Serialize};

/// Dense `f64` matrix stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create a matrix whose entries are drawn from the supplied closure,
    /// in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut() -> f64) -> Self {
        Self {
            rows,
            cols,
            data: (0..rows * cols).map(|_| f()).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `y = A · x` where `x` has `cols` entries and `y` has `rows`.
    pub fn matvec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.cols);
        self.data
            .chunks_exact(self.cols)
            .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// `y = Aᵀ · x` where `x` has `rows` entries and `y` has `cols`.
    pub fn matvec_t(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.rows);
        let mut out = vec![0.0; self.cols];
        for (row, &xv) in self.data.chunks_exact(self.cols).zip(x) {
            for (acc, &rv) in out.iter_mut().zip(row) {
                *acc += xv * rv;
            }
        }
        out
    }

    /// `A += u ⊗ v` with `u` spanning rows and `v` spanning columns.
    pub fn add_outer(&mut self, u: &[f64], v: &[f64]) {
        debug_assert_eq!(u.len(), self.rows);
        debug_assert_eq!(v.len(), self.cols);
        for (row, &uv) in self.data.chunks_exact_mut(self.cols).zip(u) {
            for (acc, &vv) in row.iter_mut().zip(v) {
                *acc += uv * vv;
            }
        }
    }

    /// Reset every entry to zero.
    pub fn reset(&mut self) {
        self.data.fill(0.0);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
