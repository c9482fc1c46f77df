//! Hypograph-of-perspective cones: the vector log-perspective, its matrix
//! (logdet) analogue, and the hypograph of the root-determinant.

use super::spectral_util::{gauss_solve, reconstruct, sym_eig};
use super::Cone;
use crate::algebra::svec::{smat, svec, svec_len, symm_kron};
use crate::algebra::{AsFloatT, FloatT, VectorMath};

/// `{(u,v,w) in R x R_+ x R^n_+ : u <= v * sum_i log(w_i / v)}`. Barrier
/// `F = -log(q) - log(v) - sum_i log(w_i)`, `q = v*phi - u`,
/// `phi = sum_i log(w_i) - n log(v)`, `nu = n + 2`.
pub struct HypoPerspectiveLogCone<T> {
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> HypoPerspectiveLogCone<T> {
    pub fn new(n: usize) -> Self {
        let dim = n + 2;
        Self {
            n,
            s: vec![T::zero(); dim],
            z: vec![T::zero(); dim],
            grad: vec![T::zero(); dim],
            hess_mat: vec![T::zero(); dim * dim],
            have_grad: false,
            have_hess: false,
        }
    }

    fn phi_and_q(&self) -> (T, T) {
        let v = self.s[1];
        let mut phi = T::zero();
        for i in 0..self.n {
            phi = phi + self.s[2 + i].ln();
        }
        phi = phi - T::from(self.n as f64).unwrap() * v.ln();
        let q = v * phi - self.s[0];
        (phi, q)
    }
}

impl<T: FloatT> Cone<T> for HypoPerspectiveLogCone<T> {
    fn dimension(&self) -> usize {
        self.n + 2
    }

    fn nu(&self) -> T {
        T::from((self.n + 2) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr[0] = -T::from(self.n as f64).unwrap();
        arr[1] = T::one();
        for i in 0..self.n {
            arr[2 + i] = T::one();
        }
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
        if self.s[1] <= T::zero() || !self.s[2..].iter().all(|&w| w > T::zero()) {
            return false;
        }
        let (_, q) = self.phi_and_q();
        q > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] < T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let v = self.s[1];
            let (phi, q) = self.phi_and_q();
            let b = phi - T::from(self.n as f64).unwrap();
            self.grad[0] = T::one() / q;
            self.grad[1] = -b / q - T::one() / v;
            for i in 0..self.n {
                let w = self.s[2 + i];
                let a_i = v / w;
                self.grad[2 + i] = -a_i / q - T::one() / w;
            }
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let h = self.hess();
        let n = self.dimension();
        for i in 0..n {
            let mut acc = T::zero();
            for j in 0..n {
                acc = acc + h[i * n + j] * v[j];
            }
            out[i] = acc;
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let n = self.dimension();
        let h = self.hess().to_vec();
        gauss_solve(&h, n, v, out);
    }

    fn hess(&mut self) -> &[T] {
        if !self.have_hess {
            let n = self.dimension();
            let vv = self.s[1];
            let (phi, q) = self.phi_and_q();
            let b = phi - T::from(self.n as f64).unwrap();
            let mut a = vec![T::zero(); self.n];
            for i in 0..self.n {
                a[i] = vv / self.s[2 + i];
            }
            self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
            self.hess_mat[0] = T::one() / (q * q);
            self.hess_mat[1] = -b / (q * q);
            self.hess_mat[n] = -b / (q * q);
            for i in 0..self.n {
                let val = -a[i] / (q * q);
                self.hess_mat[2 + i] = val;
                self.hess_mat[(2 + i) * n] = val;
            }
            self.hess_mat[n + 1] = T::from(self.n as f64).unwrap() / vv / q + b * b / (q * q) + T::one() / (vv * vv);
            for i in 0..self.n {
                let w = self.s[2 + i];
                let val = -T::one() / (w * q) + a[i] * b / (q * q);
                self.hess_mat[n + 2 + i] = val;
                self.hess_mat[(2 + i) * n + 1] = val;
            }
            for i in 0..self.n {
                for j in 0..self.n {
                    if i == j {
                        let w = self.s[2 + i];
                        self.hess_mat[(2 + i) * n + 2 + i] =
                            (a[i] / w) / q + a[i] * a[i] / (q * q) + T::one() / (w * w);
                    } else {
                        self.hess_mat[(2 + i) * n + 2 + j] = a[i] * a[j] / (q * q);
                    }
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

/// `{(u,v,W) in R x R_+ x S^d_+ : u <= v * logdet(W / v)}`. Matrix analogue
/// of [`HypoPerspectiveLogCone`]; `W` stored in `svec` form. `nu = d + 2`.
pub struct HypoPerspectiveLogdetCone<T> {
    d: usize,
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> HypoPerspectiveLogdetCone<T> {
    pub fn new(d: usize) -> Self {
        let n = svec_len(d);
        Self {
            d,
            n,
            s: vec![T::zero(); n + 2],
            z: vec![T::zero(); n + 2],
            grad: vec![T::zero(); n + 2],
            hess_mat: vec![T::zero(); (n + 2) * (n + 2)],
            have_grad: false,
            have_hess: false,
        }
    }

    fn w_matrix(&self) -> Vec<T> {
        let mut w = vec![T::zero(); self.d * self.d];
        smat(&self.s[2..], self.d, &mut w);
        w
    }

    fn phi_and_q(&self) -> (T, T, Vec<T>) {
        let v = self.s[1];
        let w = self.w_matrix();
        let eig = sym_eig(&w, self.d);
        let logdet: T = eig.eigenvalues.iter().fold(T::zero(), |acc, &l| acc + l.ln());
        let phi = logdet - T::from(self.d as f64).unwrap() * v.ln();
        let q = v * phi - self.s[0];
        (phi, q, eig.eigenvalues)
    }
}

impl<T: FloatT> Cone<T> for HypoPerspectiveLogdetCone<T> {
    fn dimension(&self) -> usize {
        self.n + 2
    }

    fn nu(&self) -> T {
        T::from((self.d + 2) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr[0] = -T::from(self.d as f64).unwrap();
        arr[1] = T::one();
        let mut eye = vec![T::zero(); self.d * self.d];
        for i in 0..self.d {
            eye[i * self.d + i] = T::one();
        }
        svec(&eye, self.d, &mut arr[2..]);
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
        if self.s[1] <= T::zero() {
            return false;
        }
        let w = self.w_matrix();
        let eig = sym_eig(&w, self.d);
        if !eig.eigenvalues.iter().all(|&l| l > T::zero()) {
            return false;
        }
        let (_, q, _) = self.phi_and_q();
        q > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] < T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let v = self.s[1];
            let w = self.w_matrix();
            let eig = sym_eig(&w, self.d);
            let (phi, q, _) = self.phi_and_q();
            let b = phi - T::from(self.d as f64).unwrap();
            let c = v / q + T::one();
            self.grad[0] = T::one() / q;
            self.grad[1] = -b / q - T::one() / v;
            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| -c / l).collect();
            let mut neg_c_winv = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut neg_c_winv);
            svec(&neg_c_winv, self.d, &mut self.grad[2..]);
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let h = self.hess();
        let n = self.dimension();
        for i in 0..n {
            let mut acc = T::zero();
            for j in 0..n {
                acc = acc + h[i * n + j] * v[j];
            }
            out[i] = acc;
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let n = self.dimension();
        let h = self.hess().to_vec();
        gauss_solve(&h, n, v, out);
    }

    fn hess(&mut self) -> &[T] {
        if !self.have_hess {
            let n = self.dimension();
            let vv = self.s[1];
            let w = self.w_matrix();
            let eig = sym_eig(&w, self.d);
            let (phi, q, _) = self.phi_and_q();
            let b = phi - T::from(self.d as f64).unwrap();
            let c = vv / q + T::one();
            let k1 = b * vv / (q * q) - T::one() / q;
            let d_f = T::from(self.d as f64).unwrap();

            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut winv = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut winv);
            let mut ginv = vec![T::zero(); self.n];
            svec(&winv, self.d, &mut ginv);

            self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
            self.hess_mat[0] = T::one() / (q * q);
            self.hess_mat[1] = -b / (q * q);
            self.hess_mat[n] = -b / (q * q);
            self.hess_mat[n + 1] = d_f / vv / q + b * b / (q * q) + T::one() / (vv * vv);

            for k in 0..self.n {
                let uval = -(vv / (q * q)) * ginv[k];
                self.hess_mat[2 + k] = uval;
                self.hess_mat[(2 + k) * n] = uval;
                let vval = k1 * ginv[k];
                self.hess_mat[n + 2 + k] = vval;
                self.hess_mat[(2 + k) * n + 1] = vval;
            }

            let mut kron = vec![T::zero(); self.n * self.n];
            symm_kron(&winv, self.d, &mut kron);
            let coeff = vv * vv / (q * q);
            for i in 0..self.n {
                for j in 0..self.n {
                    let val = coeff * ginv[i] * ginv[j] + c * kron[i * self.n + j];
                    self.hess_mat[(2 + i) * n + 2 + j] = val;
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

/// `{(u, W) in R x S^d_+ : u <= det(W)^{1/d}}`. Barrier
/// `F(u,W) = -log(p - u) - logdet(W)`, `p = det(W)^{1/d}`, `nu = d + 1`.
pub struct HypoRootdetCone<T> {
    d: usize,
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> HypoRootdetCone<T> {
    pub fn new(d: usize) -> Self {
        let n = svec_len(d);
        Self {
            d,
            n,
            s: vec![T::zero(); n + 1],
            z: vec![T::zero(); n + 1],
            grad: vec![T::zero(); n + 1],
            hess_mat: vec![T::zero(); (n + 1) * (n + 1)],
            have_grad: false,
            have_hess: false,
        }
    }

    fn w_matrix(&self) -> Vec<T> {
        let mut w = vec![T::zero(); self.d * self.d];
        smat(&self.s[1..], self.d, &mut w);
        w
    }

    fn p_and_w(&self) -> (T, T, Vec<T>) {
        let w = self.w_matrix();
        let eig = sym_eig(&w, self.d);
        let logdet: T = eig.eigenvalues.iter().fold(T::zero(), |acc, &l| acc + l.ln());
        let p = (logdet / T::from(self.d as f64).unwrap()).exp();
        (p, p - self.s[0], eig.eigenvalues)
    }
}

impl<T: FloatT> Cone<T> for HypoRootdetCone<T> {
    fn dimension(&self) -> usize {
        self.n + 1
    }

    fn nu(&self) -> T {
        T::from((self.d + 1) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr[0] = T::one();
        let mut eye = vec![T::zero(); self.d * self.d];
        for i in 0..self.d {
            eye[i * self.d + i] = T::one();
        }
        svec(&eye, self.d, &mut arr[1..]);
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
        let w = self.w_matrix();
        let eig = sym_eig(&w, self.d);
        if !eig.eigenvalues.iter().all(|&l| l > T::zero()) {
            return false;
        }
        let (_, w, _) = self.p_and_w();
        w > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let w = self.w_matrix();
            let eig = sym_eig(&w, self.d);
            let (p, wval, _) = self.p_and_w();
            let d_f = T::from(self.d as f64).unwrap();
            self.grad[0] = T::one() / wval;
            let coeff = p / (d_f * wval) + T::one();
            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| -coeff / l).collect();
            let mut g = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut g);
            svec(&g, self.d, &mut self.grad[1..]);
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let h = self.hess();
        let n = self.dimension();
        for i in 0..n {
            let mut acc = T::zero();
            for j in 0..n {
                acc = acc + h[i * n + j] * v[j];
            }
            out[i] = acc;
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let n = self.dimension();
        let h = self.hess().to_vec();
        gauss_solve(&h, n, v, out);
    }

    fn hess(&mut self) -> &[T] {
        if !self.have_hess {
            let n = self.dimension();
            let w = self.w_matrix();
            let eig = sym_eig(&w, self.d);
            let (p, wval, _) = self.p_and_w();
            let d_f = T::from(self.d as f64).unwrap();
            let u = self.s[0];
            let c = p / (d_f * wval) + T::one();

            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut winv = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut winv);
            let mut ginv = vec![T::zero(); self.n];
            svec(&winv, self.d, &mut ginv);

            self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
            self.hess_mat[0] = T::one() / (wval * wval);
            for k in 0..self.n {
                let val = -(p / (d_f * wval * wval)) * ginv[k];
                self.hess_mat[1 + k] = val;
                self.hess_mat[(1 + k) * n] = val;
            }
            let mut kron = vec![T::zero(); self.n * self.n];
            symm_kron(&winv, self.d, &mut kron);
            let coeff = (p * u) / (d_f * d_f * wval * wval);
            for i in 0..self.n {
                for j in 0..self.n {
                    let val = coeff * ginv[i] * ginv[j] + c * kron[i * self.n + j];
                    self.hess_mat[(1 + i) * n + 1 + j] = val;
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
    fn hypo_perspective_log_feasible_at_initial_point() {
        let mut c = HypoPerspectiveLogCone::<f64>::new(3);
        let mut s = vec![0.0; 5];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn hypo_rootdet_feasible_at_initial_point() {
        let mut c = HypoRootdetCone::<f64>::new(2);
        let mut s = vec![0.0; c.dimension()];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn hypo_perspective_logdet_feasible_at_initial_point() {
        let mut c = HypoPerspectiveLogdetCone::<f64>::new(2);
        let mut s = vec![0.0; c.dimension()];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }
}
