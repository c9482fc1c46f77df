//! Nonnegative orthant cone `{s : s_i >= 0}`, barrier `F(s) = -sum log(s_i)`,
//! `nu = d`. The simplest symmetric cone; every other symmetric cone's
//! `in_neighborhood` check reduces to the same elementwise form used here.

use super::Cone;
use crate::algebra::{AsFloatT, FloatT, VectorMath};

pub struct NonnegativeCone<T> {
    d: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_diag: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> NonnegativeCone<T> {
    pub fn new(d: usize) -> Self {
        Self {
            d,
            s: vec![T::zero(); d],
            z: vec![T::zero(); d],
            grad: vec![T::zero(); d],
            hess_diag: vec![T::zero(); d],
            hess_mat: vec![T::zero(); d * d],
            have_grad: false,
            have_hess: false,
        }
    }
}

impl<T: FloatT> Cone<T> for NonnegativeCone<T> {
    fn dimension(&self) -> usize {
        self.d
    }

    fn nu(&self) -> T {
        T::from(self.d as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr.iter_mut().for_each(|x| *x = T::one());
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
        self.s.iter().all(|&x| x > T::zero() && x.is_finite())
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z.iter().all(|&x| x > T::zero() && x.is_finite())
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            for i in 0..self.d {
                self.grad[i] = T::one() / self.s[i];
            }
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.grad();
        for i in 0..self.d {
            out[i] = v[i] * self.grad[i] * self.grad[i];
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        for i in 0..self.d {
            out[i] = v[i] * self.s[i] * self.s[i];
        }
    }

    fn hess(&mut self) -> &[T] {
        if !self.have_hess {
            self.grad();
            for i in 0..self.d {
                self.hess_diag[i] = self.grad[i] * self.grad[i];
            }
            self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
            for i in 0..self.d {
                self.hess_mat[i * self.d + i] = self.hess_diag[i];
            }
            self.have_hess = true;
        }
        &self.hess_mat
    }

    fn inv_hess(&mut self) -> &[T] {
        self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
        for i in 0..self.d {
            self.hess_mat[i * self.d + i] = self.s[i] * self.s[i];
        }
        &self.hess_mat
    }

    fn in_neighborhood(&mut self, mu: T, beta: T, use_infty_nbhd: bool) -> bool {
        if !self.is_feas() || !self.is_dual_feas() {
            return false;
        }
        if use_infty_nbhd {
            self.s
                .iter()
                .zip(self.z.iter())
                .all(|(&si, &zi)| (si * zi - mu).abs() <= beta * mu)
        } else {
            let mut acc = T::zero();
            for (&si, &zi) in self.s.iter().zip(self.z.iter()) {
                let dev = si * zi - mu;
                acc = acc + dev * dev;
            }
            acc.sqrt() <= beta * mu * T::from(self.d as f64).unwrap().sqrt()
        }
    }

    fn use_correction(&self) -> bool {
        true
    }

    fn correction(&mut self, out: &mut [T], primal_dir: &[T]) {
        // third-order term of -sum log(s_i): (1/2) D^3F[d,d]_i = d_i^2 / s_i^3
        for i in 0..self.d {
            let si = self.s[i];
            out[i] = primal_dir[i] * primal_dir[i] / (si * si * si);
        }
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
    fn initial_point_is_feasible_and_homogeneous() {
        let mut c = NonnegativeCone::<f64>::new(4);
        let mut s = vec![0.0; 4];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
        let g = c.grad().to_vec();
        let inner: f64 = s.iter().zip(g.iter()).map(|(a, b)| -a * b).sum();
        assert!((inner.abs() - c.nu()).abs() < 1e-9, "inner={inner}");
    }

    #[test]
    fn hessian_matches_logarithmic_homogeneity() {
        let mut c = NonnegativeCone::<f64>::new(3);
        let s = vec![1.0, 2.0, 3.0];
        c.load_point(&s);
        let mut hs = vec![0.0; 3];
        c.hess_prod(&mut hs, &s);
        let g = c.grad().to_vec();
        for i in 0..3 {
            assert!((hs[i] - (-(-g[i]))).abs() < 1e-9);
        }
    }
}
