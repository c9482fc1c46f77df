//! Scaled vectorization (`svec`/`smat`) of symmetric matrices, and the
//! symmetric Kronecker operators built on top of it.
//!
//! Symmetric `d x d` matrices are stored column-by-column of the *lower*
//! triangle with off-diagonal entries multiplied by `sqrt(2)`, so that the
//! Euclidean inner product of two `svec`s equals `trace(A B)`. This
//! convention is centralized here per the Design Notes in — no
//! other module is allowed to rescale an svec vector on assembly.

use super::FloatT;

/// Length of the `svec` of a `d x d` symmetric matrix.
pub fn svec_len(d: usize) -> usize {
    d * (d + 1) / 2
}

/// Recovers `d` from an `svec` length; panics if `len` is not triangular.
pub fn svec_dim(len: usize) -> usize {
    let d = (((8 * len + 1) as f64).sqrt() as usize - 1) / 2;
    assert_eq!(svec_len(d), len, "svec length {len} is not triangular");
    d
}

/// `svec(X)`: lower triangle of `X` (row-major read within the column-major
/// layout below), off-diagonals scaled by `sqrt(2)`.
///
/// Layout: entries are written column by column of the lower triangle, i.e.
/// for `d=3` the order is `(0,0) (1,0) (2,0) (1,1) (2,1) (2,2)`.
pub fn svec<T: FloatT>(x: &[T], d: usize, out: &mut [T]) {
    assert_eq!(x.len(), d * d);
    assert_eq!(out.len(), svec_len(d));
    let root2 = T::from(2.0_f64).unwrap().sqrt();
    let mut k = 0;
    for j in 0..d {
        for i in j..d {
            let v = x[i * d + j];
            out[k] = if i == j { v } else { v * root2 };
            k += 1;
        }
    }
}

/// Inverse of `svec`: expands the packed vector back into a dense,
/// row-major `d x d` symmetric matrix.
pub fn smat<T: FloatT>(v: &[T], d: usize, out: &mut [T]) {
    assert_eq!(v.len(), svec_len(d));
    assert_eq!(out.len(), d * d);
    let inv_root2 = T::from(2.0_f64).unwrap().sqrt().recip();
    let mut k = 0;
    for j in 0..d {
        for i in j..d {
            let v = v[k];
            k += 1;
            if i == j {
                out[i * d + j] = v;
            } else {
                let s = v * inv_root2;
                out[i * d + j] = s;
                out[j * d + i] = s;
            }
        }
    }
}

/// Multiplies every off-diagonal entry of an `svec`-packed vector in place
/// by `sqrt(2)`. Used when converting a raw lower-triangle-stacked vector
/// (no scaling) into proper `svec` form.
pub fn rescale_to_svec<T: FloatT>(v: &mut [T], d: usize) {
    let root2 = T::from(2.0_f64).unwrap().sqrt();
    scale_off_diag(v, d, root2);
}

/// Inverse of [`rescale_to_svec`]: divides every off-diagonal entry by
/// `sqrt(2)`.
pub fn rescale_from_svec<T: FloatT>(v: &mut [T], d: usize) {
    let inv_root2 = T::from(2.0_f64).unwrap().sqrt().recip();
    scale_off_diag(v, d, inv_root2);
}

fn scale_off_diag<T: FloatT>(v: &mut [T], d: usize, factor: T) {
    assert_eq!(v.len(), svec_len(d));
    let mut k = 0;
    for j in 0..d {
        for i in j..d {
            if i != j {
                v[k] = v[k] * factor;
            }
            k += 1;
        }
    }
}

/// Dense row-major `d x d` matrix multiply: `out = a * b`.
fn matmul<T: FloatT>(a: &[T], b: &[T], d: usize, out: &mut [T]) {
    out.iter_mut().for_each(|x| *x = T::zero());
    for i in 0..d {
        for k in 0..d {
            let aik = a[i * d + k];
            if aik == T::zero() {
                continue;
            }
            for j in 0..d {
                out[i * d + j] = out[i * d + j] + aik * b[k * d + j];
            }
        }
    }
}

fn transpose<T: FloatT>(a: &[T], d: usize, out: &mut [T]) {
    for i in 0..d {
        for j in 0..d {
            out[j * d + i] = a[i * d + j];
        }
    }
}

/// Builds the `svec`-by-`svec` matrix `M` (row-major, `svec_len(d) x
/// svec_len(d)`) such that `M * svec(X) = svec(A X A^T)` for every symmetric
/// `X`. `M` is always symmetric when `A` is, and respects the `sqrt(2)`
/// off-diagonal scaling of `svec`.
pub fn symm_kron<T: FloatT>(a: &[T], d: usize, out: &mut [T]) {
    let n = svec_len(d);
    assert_eq!(a.len(), d * d);
    assert_eq!(out.len(), n * n);

    let mut at = vec![T::zero(); d * d];
    transpose(a, d, &mut at);

    // Basis approach: for each packed index k <-> (i,j) with i>=j, apply the
    // operator to the k-th basis svec and read off the resulting column.
    let mut e = vec![T::zero(); n];
    let mut ek = vec![T::zero(); d * d];
    let mut tmp = vec![T::zero(); d * d];
    let mut result = vec![T::zero(); d * d];
    let mut col = vec![T::zero(); n];

    for k in 0..n {
        e.iter_mut().for_each(|v| *v = T::zero());
        e[k] = T::one();
        smat(&e, d, &mut ek);
        matmul(a, &ek, d, &mut tmp);
        matmul(&tmp, &at, d, &mut result);
        svec(&result, d, &mut col);
        for row in 0..n {
            out[row * n + k] = col[row];
        }
    }
}

/// Builds the `svec`-by-`svec` matrix acting as
/// `svec(X) -> svec(V (Theta .* (V^T X V)) V^T)`
/// used by the separable-spectral cone family. `theta` is
/// the (dense, row-major) `d x d` weight matrix (typically built from
/// divided differences of a spectral function), `v` is the `d x d`
/// eigenvector matrix.
pub fn eig_dot_kron<T: FloatT>(theta: &[T], v: &[T], d: usize, out: &mut [T]) {
    let n = svec_len(d);
    assert_eq!(theta.len(), d * d);
    assert_eq!(v.len(), d * d);
    assert_eq!(out.len(), n * n);

    let mut vt = vec![T::zero(); d * d];
    transpose(v, d, &mut vt);

    let mut e = vec![T::zero(); n];
    let mut ek = vec![T::zero(); d * d];
    let mut tmp = vec![T::zero(); d * d];
    let mut inner = vec![T::zero(); d * d];
    let mut weighted = vec![T::zero(); d * d];
    let mut tmp2 = vec![T::zero(); d * d];
    let mut result = vec![T::zero(); d * d];
    let mut col = vec![T::zero(); n];

    for k in 0..n {
        e.iter_mut().for_each(|x| *x = T::zero());
        e[k] = T::one();
        smat(&e, d, &mut ek);

        // inner = V^T X V
        matmul(&vt, &ek, d, &mut tmp);
        matmul(&tmp, v, d, &mut inner);

        // weighted = Theta .* inner  (elementwise)
        for idx in 0..d * d {
            weighted[idx] = theta[idx] * inner[idx];
        }

        // result = V * weighted * V^T
        matmul(v, &weighted, d, &mut tmp2);
        matmul(&tmp2, &vt, d, &mut result);

        svec(&result, d, &mut col);
        for row in 0..n {
            out[row * n + k] = col[row];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svec_smat_round_trip() {
        let d = 3;
        let x = [
            1.0, 2.0, 3.0, //
            2.0, 5.0, 6.0, //
            3.0, 6.0, 9.0,
        ];
        let mut v = vec![0.0; svec_len(d)];
        svec(&x, d, &mut v);
        let mut x2 = vec![0.0; d * d];
        smat(&v, d, &mut x2);
        for (a, b) in x.iter().zip(x2.iter()) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn svec_preserves_inner_product() {
        let d = 2;
        let x = [2.0, 1.0, 1.0, 3.0];
        let y = [1.0, 0.5, 0.5, 2.0];

        let mut vx = vec![0.0; svec_len(d)];
        let mut vy = vec![0.0; svec_len(d)];
        svec(&x, d, &mut vx);
        svec(&y, d, &mut vy);

        let inner: f64 = vx.iter().zip(vy.iter()).map(|(a, b)| a * b).sum();

        // trace(X Y)
        let mut xy = [0.0; 4];
        matmul(&x, &y, d, &mut xy);
        let trace = xy[0] + xy[3];

        assert!((inner - trace).abs() < 1e-10);
    }

    #[test]
    fn symm_kron_matches_definition() {
        let d = 2;
        let a = [2.0, 1.0, 0.0, 3.0];
        let n = svec_len(d);
        let mut m = vec![0.0; n * n];
        symm_kron(&a, d, &mut m);

        let x = [1.0, 0.5, 0.5, 2.0];
        let mut vx = vec![0.0; n];
        svec(&x, d, &mut vx);

        // M * svec(X)
        let mut lhs = vec![0.0; n];
        for i in 0..n {
            lhs[i] = (0..n).map(|j| m[i * n + j] * vx[j]).sum();
        }

        // svec(A X A^T)
        let mut at = [0.0; 4];
        transpose(&a, d, &mut at);
        let mut tmp = [0.0; 4];
        matmul(&a, &x, d, &mut tmp);
        let mut axat = [0.0; 4];
        matmul(&tmp, &at, d, &mut axat);
        let mut rhs = vec![0.0; n];
        svec(&axat, d, &mut rhs);

        for (l, r) in lhs.iter().zip(rhs.iter()) {
            assert!((l - r).abs() < 1e-9, "{l} vs {r}");
        }
    }
}
