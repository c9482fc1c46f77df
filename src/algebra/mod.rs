//! Scalar, vector and sparse-matrix math traits shared across the whole
//! crate.
//!
//! `FloatT` is the scalar bound used everywhere else in `concore`: a thin
//! composition of `num_traits` bounds plus the handful of extra items the
//! solver needs (constants, `AsFloatT` literal injection). Cone-local code
//! stays on plain slices (`VectorMath for [T]`), as `algebra::native` does;
//! the system solver and preprocessing layers step up to
//! `faer::Mat`/`faer::sparse::SparseColMat` for factorizations (`svec`,
//! `dense`, `sparse` submodules).

pub mod dense;
pub mod native;
pub mod sparse;
pub mod svec;

use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Scalar type bound for the whole solver.
pub trait FloatT:
    num_traits::Float
    + num_traits::FloatConst
    + num_traits::NumAssignOps
    + Copy
    + Send
    + Sync
    + Debug
    + Display
    + Sum
    + 'static
{
    /// `100 * machine epsilon`, the default rank-estimation pivot tolerance.
    fn rank_tol() -> Self {
        Self::from(100.0).unwrap() * Self::epsilon()
    }
}

impl FloatT for f64 {}
impl FloatT for f32 {}

/// Convenience conversion from Rust float/integer literals into the generic
/// scalar type, e.g. `(0.99_f64).as_t()`.
pub trait AsFloatT<T> {
    fn as_t(&self) -> T;
}

impl<T: FloatT> AsFloatT<T> for f64 {
    fn as_t(&self) -> T {
        T::from(*self).unwrap()
    }
}

impl<T: FloatT> AsFloatT<T> for usize {
    fn as_t(&self) -> T {
        T::from(*self).unwrap()
    }
}

/// Elementwise scalar helpers used by the stepper's clipping logic.
pub trait ScalarMath<T> {
    fn clip(s: T, min_thresh: T, max_thresh: T, min_new: T, max_new: T) -> T;
}

/// Elementwise vector helpers implemented for `[T]`, so cone code never has
/// to allocate for a scale, translate, or axpy.
pub trait VectorMath<T> {
    fn copy_from(&mut self, src: &[T]);
    fn translate(&mut self, c: T);
    fn scale(&mut self, c: T);
    fn reciprocal(&mut self);
    fn sqrt(&mut self);
    fn rsqrt(&mut self);
    fn negate(&mut self);
    fn hadamard(&mut self, y: &[T]);
    fn clip(&mut self, min_thresh: T, max_thresh: T, min_new: T, max_new: T);

    fn dot(&self, y: &[T]) -> T;
    fn sumsq(&self) -> T;
    fn norm(&self) -> T;
    fn norm_scaled(&self, v: &[T]) -> T;
    fn norm_inf(&self) -> T;
    fn norm_one(&self) -> T;
    fn minimum(&self) -> T;
    fn maximum(&self) -> T;
    fn mean(&self) -> T;

    /// `self = a*x + b*self`
    fn axpby(&mut self, a: T, x: &[T], b: T);
    /// `self = a*x + b*y` (written elementwise; `self` may not alias `x`/`y`)
    fn waxpby(&mut self, a: T, x: &[T], b: T, y: &[T]);
}

/// Matrix orientation used by `MatrixMath::gemv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixShape {
    N,
    T,
}

/// A sparse matrix in compressed-sparse-column form, used to store the
/// problem data `A` and `G`. Factorizations (QR/LU/LDLT) live in the
/// `dense`/`sparse` submodules and convert to/from `faer::sparse::SparseColMat`
/// on demand; `CscMatrix` itself only needs to support assembly and the
/// matrix-vector products the residual computation relies on every
/// iteration.
#[derive(Debug, Clone)]
pub struct CscMatrix<T> {
    pub m: usize,
    pub n: usize,
    pub colptr: Vec<usize>,
    pub rowval: Vec<usize>,
    pub nzval: Vec<T>,
}

impl<T: FloatT> CscMatrix<T> {
    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(rowval.len(), nzval.len());
        Self {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    pub fn zeros(m: usize, n: usize) -> Self {
        Self::new(m, n, vec![0; n + 1], Vec::new(), Vec::new())
    }

    pub fn nnz(&self) -> usize {
        self.nzval.len()
    }

    /// Dense -> CSC conversion, row-major input (`data[i*n + j]`).
    pub fn from_dense_row_major(m: usize, n: usize, data: &[T]) -> Self {
        assert_eq!(data.len(), m * n);
        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        colptr.push(0);
        for j in 0..n {
            for i in 0..m {
                let v = data[i * n + j];
                if v != T::zero() {
                    rowval.push(i);
                    nzval.push(v);
                }
            }
            colptr.push(rowval.len());
        }
        Self::new(m, n, colptr, rowval, nzval)
    }

    /// Transpose, materialized as a new CSC matrix.
    pub fn transpose(&self) -> Self {
        let mut counts = vec![0usize; self.m];
        for &r in &self.rowval {
            counts[r] += 1;
        }
        let mut colptr = Vec::with_capacity(self.m + 1);
        colptr.push(0);
        for c in &counts {
            colptr.push(colptr.last().unwrap() + c);
        }
        let mut rowval = vec![0usize; self.nzval.len()];
        let mut nzval = vec![T::zero(); self.nzval.len()];
        let mut cursor = colptr.clone();
        for j in 0..self.n {
            for k in self.colptr[j]..self.colptr[j + 1] {
                let i = self.rowval[k];
                let dest = cursor[i];
                rowval[dest] = j;
                nzval[dest] = self.nzval[k];
                cursor[i] += 1;
            }
        }
        Self::new(self.n, self.m, colptr, rowval, nzval)
    }
}

/// Matrix-level helpers needed by residual computation and equilibration.
/// `U` is the dense vector type (`[T]` for our usage).
pub trait MatrixMath<T, U: ?Sized> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn is_square(&self) -> bool;

    fn scale(&mut self, c: T);

    fn col_norms(&self, norms: &mut [T]);
    fn col_norms_no_reset(&self, norms: &mut [T]);
    fn row_norms(&self, norms: &mut [T]);
    fn row_norms_no_reset(&self, norms: &mut [T]);

    fn lmul_diag(&mut self, l: &[T]);
    fn rmul_diag(&mut self, r: &[T]);
    fn lrmul_diag(&mut self, l: &[T], r: &[T]);

    /// `y := a*op(A)*x + b*y`
    fn gemv(&self, y: &mut U, trans: MatrixShape, x: &U, a: T, b: T);
}
