//! Shared dense symmetric eigendecomposition used by every matrix-variable
//! cone (PSD triangle, doubly-nonnegative, hypo-rootdet, hypo-perspective-
//! logdet, the spectral/nuclear norm epigraphs, the matrix separable-
//! spectral and trace-relative-entropy cones, and the WSOS-PSD interpolant
//! cone).
//!
//! A small hand-rolled cyclic Jacobi eigensolver is used rather than a LAPACK
//! binding: cone dimensions here are modest (they come from a single block
//! of the conic model), and `algebra::native` already favors self-contained
//! dense kernels over external solver bindings for exactly this kind of
//! small, hot-path linear algebra.

use crate::algebra::FloatT;

/// Eigendecomposition of a dense symmetric `d x d` matrix (row-major):
/// `A = V diag(eigenvalues) V^T`, eigenvalues ascending.
pub struct SymEig<T> {
    pub eigenvalues: Vec<T>,
    /// Row-major `d x d`; column `k` (i.e. `v[i*d+k]`) is the eigenvector
    /// for `eigenvalues[k]`.
    pub v: Vec<T>,
    pub d: usize,
}

/// Cyclic Jacobi eigenvalue algorithm. `max_sweeps` bounds the number of
/// full sweeps; convergence for well-conditioned `d <= ~50` matrices is
/// typically within 10 sweeps.
pub fn sym_eig<T: FloatT>(a: &[T], d: usize) -> SymEig<T> {
    assert_eq!(a.len(), d * d);
    let mut m = a.to_vec();
    let mut v = vec![T::zero(); d * d];
    for i in 0..d {
        v[i * d + i] = T::one();
    }

    let max_sweeps = 60;
    let tol = T::epsilon() * T::from(d as f64).unwrap() * T::from(10.0).unwrap();

    for _ in 0..max_sweeps {
        let mut off = T::zero();
        for p in 0..d {
            for q in (p + 1)..d {
                off = off + m[p * d + q] * m[p * d + q];
            }
        }
        if off.sqrt() < tol {
            break;
        }

        for p in 0..d {
            for q in (p + 1)..d {
                let apq = m[p * d + q];
                if apq.abs() < T::epsilon() {
                    continue;
                }
                let app = m[p * d + p];
                let aqq = m[q * d + q];
                let theta = (aqq - app) / (T::from(2.0).unwrap() * apq);
                let t = theta.signum()
                    / (theta.abs() + (theta * theta + T::one()).sqrt());
                let t = if theta == T::zero() { T::one() } else { t };
                let c = T::one() / (t * t + T::one()).sqrt();
                let s = t * c;

                for k in 0..d {
                    let mkp = m[k * d + p];
                    let mkq = m[k * d + q];
                    m[k * d + p] = c * mkp - s * mkq;
                    m[k * d + q] = s * mkp + c * mkq;
                }
                for k in 0..d {
                    let mpk = m[p * d + k];
                    let mqk = m[q * d + k];
                    m[p * d + k] = c * mpk - s * mqk;
                    m[q * d + k] = s * mpk + c * mqk;
                }
                for k in 0..d {
                    let vkp = v[k * d + p];
                    let vkq = v[k * d + q];
                    v[k * d + p] = c * vkp - s * vkq;
                    v[k * d + q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut eigenvalues: Vec<T> = (0..d).map(|i| m[i * d + i]).collect();

    // sort ascending, permuting eigenvectors to match
    let mut idx: Vec<usize> = (0..d).collect();
    idx.sort_by(|&i, &j| eigenvalues[i].partial_cmp(&eigenvalues[j]).unwrap());
    let sorted_vals: Vec<T> = idx.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_v = vec![T::zero(); d * d];
    for (new_k, &old_k) in idx.iter().enumerate() {
        for row in 0..d {
            sorted_v[row * d + new_k] = v[row * d + old_k];
        }
    }
    eigenvalues = sorted_vals;

    SymEig { eigenvalues, v: sorted_v, d }
}

/// `logdet(X)` for a symmetric PSD `X`, via its eigenvalues. Returns
/// `T::neg_infinity()` if any eigenvalue is non-positive (caller should
/// have already rejected infeasible points).
pub fn logdet_from_eig<T: FloatT>(eig: &SymEig<T>) -> T {
    eig.eigenvalues.iter().fold(T::zero(), |acc, &l| {
        if l <= T::zero() {
            T::neg_infinity()
        } else {
            acc + l.ln()
        }
    })
}

/// Reconstructs `V diag(d) V^T` (row-major `d x d`) from an eigendecomposition
/// with a replacement diagonal `vals`.
pub fn reconstruct<T: FloatT>(eig: &SymEig<T>, vals: &[T], out: &mut [T]) {
    let d = eig.d;
    assert_eq!(vals.len(), d);
    out.iter_mut().for_each(|x| *x = T::zero());
    for k in 0..d {
        let lk = vals[k];
        if lk == T::zero() {
            continue;
        }
        for i in 0..d {
            let vik = eig.v[i * d + k];
            if vik == T::zero() {
                continue;
            }
            for j in 0..d {
                out[i * d + j] = out[i * d + j] + vik * lk * eig.v[j * d + k];
            }
        }
    }
}

/// Dense Gaussian elimination with partial pivoting, `n x n` row-major `a`,
/// solving `a x = rhs`. Shared by the cones whose Hessian has no simpler
/// closed-form inverse (power-cone family, hypo-perspective family,
/// separable-spectral family).
pub fn gauss_solve<T: FloatT>(a: &[T], n: usize, rhs: &[T], out: &mut [T]) {
    let mut a = a.to_vec();
    let mut rhs = rhs.to_vec();
    for col in 0..n {
        let mut piv = col;
        let mut best = a[col * n + col].abs();
        for row in (col + 1)..n {
            let val = a[row * n + col].abs();
            if val > best {
                best = val;
                piv = row;
            }
        }
        if piv != col {
            for k in 0..n {
                a.swap(col * n + k, piv * n + k);
            }
            rhs.swap(col, piv);
        }
        let diag = a[col * n + col];
        if diag == T::zero() {
            continue;
        }
        for row in (col + 1)..n {
            let factor = a[row * n + col] / diag;
            if factor == T::zero() {
                continue;
            }
            for k in col..n {
                a[row * n + k] = a[row * n + k] - factor * a[col * n + k];
            }
            rhs[row] = rhs[row] - factor * rhs[col];
        }
    }
    for row in (0..n).rev() {
        let mut acc = rhs[row];
        for k in (row + 1)..n {
            acc = acc - a[row * n + k] * out[k];
        }
        out[row] = acc / a[row * n + row];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eig_of_diagonal_matrix() {
        let d = 3;
        let a = [2.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 1.0];
        let eig = sym_eig(&a, d);
        assert!((eig.eigenvalues[0] - 1.0).abs() < 1e-8);
        assert!((eig.eigenvalues[1] - 2.0).abs() < 1e-8);
        assert!((eig.eigenvalues[2] - 5.0).abs() < 1e-8);
    }

    #[test]
    fn eig_reconstructs_original() {
        let d = 2;
        let a = [2.0, 1.0, 1.0, 2.0];
        let eig = sym_eig(&a, d);
        let mut back = vec![0.0; d * d];
        reconstruct(&eig, &eig.eigenvalues.clone(), &mut back);
        for (x, y) in a.iter().zip(back.iter()) {
            assert!((x - y).abs() < 1e-8, "{x} vs {y}");
        }
    }
}
