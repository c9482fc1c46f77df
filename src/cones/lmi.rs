//! Linear matrix inequality cone: `{x in R^m : F_0 + sum_i x_i F_i >~ 0}` for
//! fixed symmetric `d x d` matrices `F_0..F_m`. Barrier
//! `F(x) = -logdet(F_0 + sum_i x_i F_i)`, `nu = d`.

use super::spectral_util::{gauss_solve, reconstruct, sym_eig};
use super::Cone;
use crate::algebra::{AsFloatT, FloatT, VectorMath};

pub struct LmiCone<T> {
    mats: Vec<Vec<T>>, // mats[0] = F_0, mats[1..] = F_1..F_m, each d*d row-major
    d: usize,
    m: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> LmiCone<T> {
    pub fn new(mats: Vec<Vec<T>>, d: usize) -> Self {
        let m = mats.len() - 1;
        Self {
            mats,
            d,
            m,
            s: vec![T::zero(); m],
            z: vec![T::zero(); m],
            grad: vec![T::zero(); m],
            hess_mat: vec![T::zero(); m * m],
            have_grad: false,
            have_hess: false,
        }
    }

    fn affine(&self) -> Vec<T> {
        let mut w = self.mats[0].clone();
        for i in 0..self.m {
            let xi = self.s[i];
            if xi == T::zero() {
                continue;
            }
            let fi = &self.mats[1 + i];
            for k in 0..self.d * self.d {
                w[k] = w[k] + xi * fi[k];
            }
        }
        w
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

fn trace<T: FloatT>(a: &[T], d: usize) -> T {
    (0..d).fold(T::zero(), |acc, i| acc + a[i * d + i])
}

impl<T: FloatT> Cone<T> for LmiCone<T> {
    fn dimension(&self) -> usize {
        self.m
    }

    fn nu(&self) -> T {
        T::from(self.d as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        // x = 0 is feasible only if F_0 is PD; callers are responsible for
        // supplying F_0 with that property, trusted at construction like
        // the rest of the model-supplied cone data.
        arr.iter_mut().for_each(|x| *x = T::zero());
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
        let w = self.affine();
        let eig = sym_eig(&w, self.d);
        eig.eigenvalues.iter().all(|&l| l > T::zero())
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z.iter().all(|&x| x.is_finite())
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let w = self.affine();
            let eig = sym_eig(&w, self.d);
            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut winv = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut winv);
            for i in 0..self.m {
                let prod = dense_matmul(&winv, &self.mats[1 + i], self.d);
                self.grad[i] = -trace(&prod, self.d);
            }
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let h = self.hess();
        for i in 0..self.m {
            let mut acc = T::zero();
            for j in 0..self.m {
                acc = acc + h[i * self.m + j] * v[j];
            }
            out[i] = acc;
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let h = self.hess().to_vec();
        gauss_solve(&h, self.m, v, out);
    }

    fn hess(&mut self) -> &[T] {
        if !self.have_hess {
            let w = self.affine();
            let eig = sym_eig(&w, self.d);
            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut winv = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut winv);

            let prods: Vec<Vec<T>> = (0..self.m).map(|i| dense_matmul(&winv, &self.mats[1 + i], self.d)).collect();
            for i in 0..self.m {
                for j in 0..self.m {
                    let prod = dense_matmul(&prods[i], &prods[j], self.d);
                    self.hess_mat[i * self.m + j] = trace(&prod, self.d);
                }
            }
            self.have_hess = true;
        }
        &self.hess_mat
    }

    fn inv_hess(&mut self) -> &[T] {
        self.hess()
    }

    fn in_neighborhood(&mut self, mu: T, beta: T, _use_infty_nbhd: bool) -> bool {
        if !self.is_feas() {
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
    fn identity_affine_map_is_feasible_at_zero() {
        // F_0 = I, F_1 = [[1,0],[0,-1]] -> x=0 gives I, PD.
        let f0 = vec![1.0, 0.0, 0.0, 1.0];
        let f1 = vec![1.0, 0.0, 0.0, -1.0];
        let mut c = LmiCone::<f64>::new(vec![f0, f1], 2);
        let mut s = vec![0.0; 1];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn hess_and_inv_hess_are_inverses() {
        let f0 = vec![2.0, 0.0, 0.0, 2.0];
        let f1 = vec![1.0, 0.2, 0.2, 0.5];
        let mut c = LmiCone::<f64>::new(vec![f0, f1], 2);
        c.load_point(&[0.1]);
        let v = [1.0];
        let mut hv = [0.0];
        c.hess_prod(&mut hv, &v);
        let mut back = [0.0];
        c.inv_hess_prod(&mut back, &hv);
        assert!((back[0] - v[0]).abs() < 1e-8);
    }
}
