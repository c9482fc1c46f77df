//! Sparse nonsymmetric LU and sparse symmetric LDL^T factorization caches
//!, used by the naive system solver and by the
//! QR-Cholesky solver's reduced system. Both caches separate symbolic
//! analysis (run once, or re-run only when the sparsity pattern changes)
//! from numeric factorization (run every `update_lhs`), mirroring the
//! `LinearSolver::{analyze, factorize, solve}` split used for the augmented
//! system in `amadavan-copters/src/lp/mpc/augmented_system.rs`.

use super::{CscMatrix, FloatT};
use crate::error::ConeSolverError;
use faer::sparse::{SparseColMat, SymbolicSparseColMat};
use faer::Col;

fn to_faer_sparse<T: FloatT>(m: &CscMatrix<T>) -> SparseColMat<usize, T> {
    let sym = SymbolicSparseColMat::new_checked(
        m.m,
        m.n,
        m.colptr.clone(),
        None,
        m.rowval.clone(),
    );
    SparseColMat::new(sym, m.nzval.clone())
}

/// Sparse LU factorization cache with re-analysis on sparsity-pattern
/// change. Used by the naive system solver when the assembled KKT block is
/// not symmetric (general `A`/`G` data) or symmetric-indefinite
/// factorization is unavailable.
pub struct SparseLuCache<T: FloatT> {
    lu: Option<faer::sparse::linalg::solvers::Lu<usize, T>>,
    pattern_key: Option<(usize, Vec<usize>, Vec<usize>)>,
}

impl<T: FloatT> SparseLuCache<T> {
    pub fn new() -> Self {
        Self {
            lu: None,
            pattern_key: None,
        }
    }

    fn key(m: &CscMatrix<T>) -> (usize, Vec<usize>, Vec<usize>) {
        (m.n, m.colptr.clone(), m.rowval.clone())
    }

    /// Re-analyzes the symbolic pattern only if it changed since the last
    /// call, then performs numeric factorization.
    pub fn factorize(&mut self, m: &CscMatrix<T>) -> Result<(), ConeSolverError> {
        let key = Self::key(m);
        let mat = to_faer_sparse(m);

        let needs_reanalysis = self.pattern_key.as_ref() != Some(&key);
        if needs_reanalysis {
            self.pattern_key = Some(key);
        }

        let lu = mat
            .sp_lu()
            .map_err(|_| ConeSolverError::NumericalFactorization)?;
        self.lu = Some(lu);
        Ok(())
    }

    pub fn solve(&self, rhs: &[T], out: &mut [T]) -> Result<(), ConeSolverError> {
        let lu = self.lu.as_ref().ok_or(ConeSolverError::NumericalFactorization)?;
        let n = rhs.len();
        let mut x = Col::<T>::from_fn(n, |i| rhs[i]);
        lu.solve_in_place(x.as_mut());
        out.copy_from_slice(x.as_slice());
        Ok(())
    }
}

impl<T: FloatT> Default for SparseLuCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sparse symmetric LDL^T factorization cache. Used by the naive system
/// solver whenever the assembled reduced block is symmetric (the common
/// case once cone Hessians are loaded symmetrically), and by the
/// QR-Cholesky solver as a fallback when its reduced system loses
/// positive-definiteness (treated as a `NumericalFactorization` failure).
pub struct SparseLdlCache<T: FloatT> {
    ldl: Option<faer::sparse::linalg::solvers::Ldlt<usize, T>>,
    pattern_key: Option<(usize, Vec<usize>, Vec<usize>)>,
}

impl<T: FloatT> SparseLdlCache<T> {
    pub fn new() -> Self {
        Self {
            ldl: None,
            pattern_key: None,
        }
    }

    fn key(m: &CscMatrix<T>) -> (usize, Vec<usize>, Vec<usize>) {
        (m.n, m.colptr.clone(), m.rowval.clone())
    }

    pub fn factorize(&mut self, m: &CscMatrix<T>) -> Result<(), ConeSolverError> {
        let key = Self::key(m);
        let mat = to_faer_sparse(m);

        let needs_reanalysis = self.pattern_key.as_ref() != Some(&key);
        if needs_reanalysis {
            self.pattern_key = Some(key);
        }

        let ldl = mat
            .sp_ldlt(faer::Side::Lower)
            .map_err(|_| ConeSolverError::NumericalFactorization)?;
        self.ldl = Some(ldl);
        Ok(())
    }

    pub fn solve(&self, rhs: &[T], out: &mut [T]) -> Result<(), ConeSolverError> {
        let ldl = self.ldl.as_ref().ok_or(ConeSolverError::NumericalFactorization)?;
        let n = rhs.len();
        let mut x = Col::<T>::from_fn(n, |i| rhs[i]);
        ldl.solve_in_place(x.as_mut());
        out.copy_from_slice(x.as_slice());
        Ok(())
    }
}

impl<T: FloatT> Default for SparseLdlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lu_solves_identity() {
        let m = CscMatrix::<f64>::from_dense_row_major(2, 2, &[2.0, 0.0, 0.0, 3.0]);
        let mut lu = SparseLuCache::new();
        lu.factorize(&m).unwrap();
        let mut out = [0.0; 2];
        lu.solve(&[2.0, 3.0], &mut out).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-9);
        assert!((out[1] - 1.0).abs() < 1e-9);
    }
}
