//! Dense pivoted QR and rank estimation, used by preprocessing to factorize `A^T` and `[A; G]`. Backed by `faer`'s column-pivoted
//! QR, following the dense-factorization convention the rest of the pack
//! reaches for (`mhovd-diffsol` depends on both `faer` and `nalgebra` for
//! exactly this kind of dense numerical linear algebra).

use super::FloatT;
use faer::prelude::*;
use faer::Mat;

/// Result of a rank-revealing column-pivoted QR factorization of an `m x n`
/// dense matrix, `A P = Q R`.
pub struct PivotedQr<T: FloatT> {
    pub q: Mat<T>,
    pub r: Mat<T>,
    /// `perm[j]` is the original column index now occupying position `j`.
    pub perm: Vec<usize>,
    pub rank: usize,
}

/// Row-major dense matrix convenience wrapper used at the boundary between
/// `CscMatrix`/`Vec<T>` problem data and `faer::Mat`.
pub fn dense_from_row_major<T: FloatT>(m: usize, n: usize, data: &[T]) -> Mat<T> {
    Mat::from_fn(m, n, |i, j| data[i * n + j])
}

/// Computes a column-pivoted QR factorization and estimates the numerical
/// rank by counting diagonal entries of `R` whose magnitude exceeds `tol`
/// (default `100 * epsilon(T)` per).
pub fn pivoted_qr<T: FloatT>(a: &Mat<T>, tol: T) -> PivotedQr<T> {
    let qr = a.col_piv_qr();
    let r = qr.R().to_owned();
    let q = qr.compute_Q();
    let perm = qr.col_permutation().into_arrays().0.to_vec();

    let k = r.nrows().min(r.ncols());
    let mut rank = 0;
    for i in 0..k {
        if r[(i, i)].abs() > tol {
            rank += 1;
        } else {
            break;
        }
    }

    PivotedQr { q, r, perm, rank }
}

/// Minimum-norm least-squares solve of `A x = b` using a precomputed
/// pivoted QR of `A` (`m >= n`, full column rank assumed on the retained
/// columns up to `qr.rank`).
pub fn qr_solve_min_norm<T: FloatT>(qr: &PivotedQr<T>, b: &[T]) -> Vec<T> {
    let m = qr.q.nrows();
    let n = qr.r.ncols();
    assert_eq!(b.len(), m);

    let bcol = Mat::from_fn(m, 1, |i, _| b[i]);
    let qtb = qr.q.transpose() * &bcol;

    // back-substitution on the leading `rank x rank` upper-triangular block;
    // columns beyond `rank` are treated as free (zero) in the minimum-norm
    // solution.
    let mut y = vec![T::zero(); n];
    for i in (0..qr.rank).rev() {
        let mut acc = qtb[(i, 0)];
        for j in (i + 1)..qr.rank {
            acc = acc - qr.r[(i, j)] * y[j];
        }
        y[i] = acc / qr.r[(i, i)];
    }

    let mut x = vec![T::zero(); n];
    for (dest, &src) in qr.perm.iter().enumerate() {
        x[src] = y[dest];
    }
    x
}

/// Minimum-norm solution `x` of the (generally underdetermined) system
/// `M x = b`, computed from a precomputed pivoted QR of `M^T` (`M^T P = Q R`).
/// The minimum-norm solution lies entirely in `range(M^T)`, spanned by the
/// leading `rank` columns of `Q`: its coordinates `u` solve `R1^T u = P^T b`
/// by forward substitution against the leading `rank x rank` block of `R`,
/// and `x = Q1 u`. This is the dual of `qr_solve_min_norm` (which solves
/// `M y = b` directly from a QR of `M`): here we only have the QR of the
/// transpose, so the same factorization is used the other way around.
pub fn qr_solve_min_norm_transpose<T: FloatT>(qr_mt: &PivotedQr<T>, b: &[T]) -> Vec<T> {
    let n = qr_mt.q.nrows();
    let rank = qr_mt.rank;

    let mut pb = vec![T::zero(); rank];
    for i in 0..rank {
        pb[i] = b[qr_mt.perm[i]];
    }

    let mut u = vec![T::zero(); rank];
    for i in 0..rank {
        let mut acc = pb[i];
        for j in 0..i {
            acc = acc - qr_mt.r[(j, i)] * u[j];
        }
        u[i] = acc / qr_mt.r[(i, i)];
    }

    let mut x = vec![T::zero(); n];
    for i in 0..n {
        let mut acc = T::zero();
        for k in 0..rank {
            acc = acc + qr_mt.q[(i, k)] * u[k];
        }
        x[i] = acc;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_of_full_rank_matrix() {
        let a = dense_from_row_major::<f64>(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let qr = pivoted_qr(&a, f64::rank_tol());
        assert_eq!(qr.rank, 2);
    }

    #[test]
    fn rank_of_rank_deficient_matrix() {
        // two identical rows -> rank 1 for the transpose-of-[1,1] style test
        let a = dense_from_row_major::<f64>(2, 2, &[1.0, 2.0, 1.0, 2.0]);
        let qr = pivoted_qr(&a, f64::rank_tol());
        assert_eq!(qr.rank, 1);
    }

    #[test]
    fn min_norm_transpose_solve_splits_evenly() {
        // M = [1, 1] (1x2), M^T = [[1], [1]] (2x1); M x = 3 has minimum-norm
        // solution x = (1.5, 1.5).
        let mt = dense_from_row_major::<f64>(2, 1, &[1.0, 1.0]);
        let qr_mt = pivoted_qr(&mt, f64::rank_tol());
        let x = qr_solve_min_norm_transpose(&qr_mt, &[3.0]);
        assert!((x[0] - 1.5).abs() < 1e-9);
        assert!((x[1] - 1.5).abs() < 1e-9);
    }
}
