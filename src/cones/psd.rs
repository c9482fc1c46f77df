//! Positive semidefinite cone, stored in scaled-vectorized (`svec`) form.
//! Barrier `F(X) = -logdet(X)`, `nu = d`. Every other matrix-variable cone
//! in this module reuses the `symm_kron`/`sym_eig` machinery built here.

use super::spectral_util::{reconstruct, sym_eig};
use super::Cone;
use crate::algebra::svec::{smat, svec, svec_len, symm_kron};
use crate::algebra::{AsFloatT, FloatT, VectorMath};

pub struct PsdTriangleCone<T> {
    d: usize,
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    inv_hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
    have_inv_hess: bool,
}

impl<T: FloatT> PsdTriangleCone<T> {
    pub fn new(d: usize) -> Self {
        let n = svec_len(d);
        Self {
            d,
            n,
            s: vec![T::zero(); n],
            z: vec![T::zero(); n],
            grad: vec![T::zero(); n],
            hess_mat: vec![T::zero(); n * n],
            inv_hess_mat: vec![T::zero(); n * n],
            have_grad: false,
            have_hess: false,
            have_inv_hess: false,
        }
    }

    fn matrix(&self) -> Vec<T> {
        let mut x = vec![T::zero(); self.d * self.d];
        smat(&self.s, self.d, &mut x);
        x
    }
}

impl<T: FloatT> Cone<T> for PsdTriangleCone<T> {
    fn dimension(&self) -> usize {
        self.n
    }

    fn nu(&self) -> T {
        T::from(self.d as f64).unwrap()
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
        let x = self.matrix();
        let eig = sym_eig(&x, self.d);
        eig.eigenvalues.iter().all(|&l| l > T::zero() && l.is_finite())
    }

    fn is_dual_feas(&mut self) -> bool {
        let mut z = vec![T::zero(); self.d * self.d];
        smat(&self.z, self.d, &mut z);
        let eig = sym_eig(&z, self.d);
        eig.eigenvalues.iter().all(|&l| l > T::zero())
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let x = self.matrix();
            let eig = sym_eig(&x, self.d);
            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| -T::one() / l).collect();
            let mut xinv_neg = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut xinv_neg);
            svec(&xinv_neg, self.d, &mut self.grad);
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
        let h = self.inv_hess();
        for i in 0..self.n {
            let mut acc = T::zero();
            for j in 0..self.n {
                acc = acc + h[i * self.n + j] * v[j];
            }
            out[i] = acc;
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
            self.have_hess = true;
        }
        &self.hess_mat
    }

    fn inv_hess(&mut self) -> &[T] {
        if !self.have_inv_hess {
            let x = self.matrix();
            symm_kron(&x, self.d, &mut self.inv_hess_mat);
            self.have_inv_hess = true;
        }
        &self.inv_hess_mat
    }

    fn in_neighborhood(&mut self, mu: T, beta: T, _use_infty_nbhd: bool) -> bool {
        if !self.is_feas() || !self.is_dual_feas() {
            return false;
        }
        let inner = self.s.dot(&self.z);
        (inner - self.nu() * mu).abs() <= beta * mu * self.nu()
    }

    fn use_correction(&self) -> bool {
        true
    }

    fn correction(&mut self, out: &mut [T], primal_dir: &[T]) {
        // D^3F[Delta,Delta] for F = -logdet(X) is 2 X^-1 Delta X^-1 Delta X^-1
        let x = self.matrix();
        let eig = sym_eig(&x, self.d);
        let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| T::one() / l).collect();
        let mut xinv = vec![T::zero(); self.d * self.d];
        reconstruct(&eig, &inv_vals, &mut xinv);

        let mut delta = vec![T::zero(); self.d * self.d];
        smat(primal_dir, self.d, &mut delta);

        let a = dense_matmul(&xinv, &delta, self.d);
        let b = dense_matmul(&a, &xinv, self.d);
        let c = dense_matmul(&b, &delta, self.d);
        let result = dense_matmul(&c, &xinv, self.d);
        let mut scaled = vec![T::zero(); self.d * self.d];
        for (o, r) in scaled.iter_mut().zip(result.iter()) {
            *o = T::from(2.0).unwrap() * *r;
        }
        svec(&scaled, self.d, out);
    }

    fn reset_data(&mut self) {
        self.have_grad = false;
        self.have_hess = false;
        self.have_inv_hess = false;
    }
}

fn dense_matmul<T: FloatT>(a: &[T], b: &[T], d: usize) -> Vec<T> {
    let mut out = vec![T::zero(); d * d];
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
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_feasible_with_nu_homogeneity() {
        let d = 3;
        let mut c = PsdTriangleCone::<f64>::new(d);
        let mut s = vec![0.0; svec_len(d)];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
        let g = c.grad().to_vec();
        let inner: f64 = s.iter().zip(g.iter()).map(|(a, b)| -a * b).sum();
        assert!((inner - c.nu()).abs() < 1e-8, "inner={inner}");
    }

    #[test]
    fn hess_and_inv_hess_are_inverses() {
        let d = 2;
        let mut c = PsdTriangleCone::<f64>::new(d);
        let x = [2.0, 0.3, 0.3, 1.5];
        let mut s = vec![0.0; svec_len(d)];
        svec(&x, d, &mut s);
        c.load_point(&s);
        let v = vec![1.0, 0.2, -0.4];
        let mut hv = vec![0.0; svec_len(d)];
        c.hess_prod(&mut hv, &v);
        let mut back = vec![0.0; svec_len(d)];
        c.inv_hess_prod(&mut back, &hv);
        for (a, b) in back.iter().zip(v.iter()) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }
}
