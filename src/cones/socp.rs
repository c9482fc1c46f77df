//! Second-order (Lorentz) cone and its rotated variant.
//!
//! `SecondOrderCone`: `{(t, x) : ||x||_2 <= t}`, barrier
//! `F(t,x) = -log(t^2 - ||x||^2)`, `nu = 2`.
//!
//! `RotatedSecondOrderCone`: `{(u, v, w) : ||w||_2^2 <= 2 u v, u,v >= 0}`,
//! barrier `F(u,v,w) = -log(2uv - ||w||^2)`, `nu = 2`, handled by mapping to
//! the standard SOC via the orthogonal change of variables
//! `t = (u+v)/sqrt2, x1 = (u-v)/sqrt2, x_rest = w`.

use super::Cone;
use crate::algebra::{AsFloatT, FloatT, VectorMath};

pub struct SecondOrderCone<T> {
    d: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    inv_hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
    have_inv_hess: bool,
}

fn w_of<T: FloatT>(s: &[T]) -> T {
    let t = s[0];
    let xsq: T = s[1..].iter().fold(T::zero(), |acc, &x| acc + x * x);
    t * t - xsq
}

impl<T: FloatT> SecondOrderCone<T> {
    pub fn new(d: usize) -> Self {
        assert!(d >= 2, "second-order cone needs dimension >= 2");
        Self {
            d,
            s: vec![T::zero(); d],
            z: vec![T::zero(); d],
            grad: vec![T::zero(); d],
            hess_mat: vec![T::zero(); d * d],
            inv_hess_mat: vec![T::zero(); d * d],
            have_grad: false,
            have_hess: false,
            have_inv_hess: false,
        }
    }

    fn j_apply(&self, v: &[T], out: &mut [T]) {
        out[0] = v[0];
        for i in 1..self.d {
            out[i] = -v[i];
        }
    }
}

impl<T: FloatT> Cone<T> for SecondOrderCone<T> {
    fn dimension(&self) -> usize {
        self.d
    }

    fn nu(&self) -> T {
        T::from(2.0).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr.iter_mut().for_each(|x| *x = T::zero());
        arr[0] = T::one();
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
        self.s[0] > T::zero() && w_of(&self.s) > T::zero() && self.s.iter().all(|x| x.is_finite())
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] > T::zero() && w_of(&self.z) > T::zero() && self.z.iter().all(|x| x.is_finite())
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let w = w_of(&self.s);
            let mut js = vec![T::zero(); self.d];
            self.j_apply(&self.s, &mut js);
            let two_over_w = T::from(2.0).unwrap() / w;
            for i in 0..self.d {
                self.grad[i] = two_over_w * js[i];
            }
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let w = w_of(&self.s);
        let mut js = vec![T::zero(); self.d];
        self.j_apply(&self.s, &mut js);
        let jv_dot = js.dot(v);
        let two_over_w = T::from(2.0).unwrap() / w;
        let four_over_w2 = T::from(4.0).unwrap() / (w * w);
        let mut jv = vec![T::zero(); self.d];
        self.j_apply(v, &mut jv);
        for i in 0..self.d {
            out[i] = -two_over_w * jv[i] + four_over_w2 * js[i] * jv_dot;
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let w = w_of(&self.s);
        let mut jv = vec![T::zero(); self.d];
        self.j_apply(v, &mut jv);
        let sv_dot = self.s.dot(v);
        let half_w = w / T::from(2.0).unwrap();
        for i in 0..self.d {
            out[i] = -half_w * jv[i] + self.s[i] * sv_dot;
        }
    }

    fn hess(&mut self) -> &[T] {
        if !self.have_hess {
            let d = self.d;
            let mut e = vec![T::zero(); d];
            let mut col = vec![T::zero(); d];
            for k in 0..d {
                e.iter_mut().for_each(|x| *x = T::zero());
                e[k] = T::one();
                self.hess_prod(&mut col, &e);
                for row in 0..d {
                    self.hess_mat[row * d + k] = col[row];
                }
            }
            self.have_hess = true;
        }
        &self.hess_mat
    }

    fn inv_hess(&mut self) -> &[T] {
        if !self.have_inv_hess {
            let d = self.d;
            let mut e = vec![T::zero(); d];
            let mut col = vec![T::zero(); d];
            for k in 0..d {
                e.iter_mut().for_each(|x| *x = T::zero());
                e[k] = T::one();
                self.inv_hess_prod(&mut col, &e);
                for row in 0..d {
                    self.inv_hess_mat[row * d + k] = col[row];
                }
            }
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
        // A closed-form third-order term exists for the SOC barrier but is
        // not implemented here; the stepper treats this as a zero
        // contribution, which is valid per the cone contract.
        false
    }

    fn correction(&mut self, out: &mut [T], _primal_dir: &[T]) {
        out.iter_mut().for_each(|x| *x = T::zero());
    }

    fn reset_data(&mut self) {
        self.have_grad = false;
        self.have_hess = false;
        self.have_inv_hess = false;
    }
}

/// Rotated second-order cone, implemented by reducing to `SecondOrderCone`
/// via the fixed orthogonal change of basis
/// `R = [[1/sqrt2, 1/sqrt2, 0], [1/sqrt2, -1/sqrt2, 0], [0, 0, I]]`
/// applied to `(u, v, w)`.
pub struct RotatedSecondOrderCone<T> {
    d: usize,
    inner: SecondOrderCone<T>,
    scratch: Vec<T>,
}

impl<T: FloatT> RotatedSecondOrderCone<T> {
    pub fn new(d: usize) -> Self {
        assert!(d >= 3, "rotated second-order cone needs dimension >= 3");
        Self {
            d,
            inner: SecondOrderCone::new(d),
            scratch: vec![T::zero(); d],
        }
    }

    fn to_soc_basis(&self, p: &[T], out: &mut [T]) {
        let root2 = T::from(2.0).unwrap().sqrt();
        out[0] = (p[0] + p[1]) / root2;
        out[1] = (p[0] - p[1]) / root2;
        out[2..].copy_from_slice(&p[2..]);
    }

    fn from_soc_basis(&self, p: &[T], out: &mut [T]) {
        let root2 = T::from(2.0).unwrap().sqrt();
        out[0] = (p[0] + p[1]) / root2;
        out[1] = (p[0] - p[1]) / root2;
        out[2..].copy_from_slice(&p[2..]);
    }
}

impl<T: FloatT> Cone<T> for RotatedSecondOrderCone<T> {
    fn dimension(&self) -> usize {
        self.d
    }

    fn nu(&self) -> T {
        T::from(2.0).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr.iter_mut().for_each(|x| *x = T::zero());
        arr[0] = T::one();
        arr[1] = T::one();
    }

    fn load_point(&mut self, p: &[T]) {
        let mut tmp = vec![T::zero(); self.d];
        self.to_soc_basis(p, &mut tmp);
        self.inner.load_point(&tmp);
    }

    fn load_dual_point(&mut self, d: &[T]) {
        let mut tmp = vec![T::zero(); self.d];
        self.to_soc_basis(d, &mut tmp);
        self.inner.load_dual_point(&tmp);
    }

    fn rescale_point(&mut self, alpha: T) {
        self.inner.rescale_point(alpha);
    }

    fn is_feas(&mut self) -> bool {
        self.inner.is_feas()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.inner.is_dual_feas()
    }

    fn grad(&mut self) -> &[T] {
        let g = self.inner.grad().to_vec();
        let mut out = vec![T::zero(); self.d];
        self.from_soc_basis(&g, &mut out);
        self.scratch.copy_from_slice(&out);
        &self.scratch
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let mut vt = vec![T::zero(); self.d];
        self.to_soc_basis(v, &mut vt);
        let mut ht = vec![T::zero(); self.d];
        self.inner.hess_prod(&mut ht, &vt);
        self.from_soc_basis(&ht, out);
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let mut vt = vec![T::zero(); self.d];
        self.to_soc_basis(v, &mut vt);
        let mut ht = vec![T::zero(); self.d];
        self.inner.inv_hess_prod(&mut ht, &vt);
        self.from_soc_basis(&ht, out);
    }

    fn hess(&mut self) -> &[T] {
        self.inner.hess()
    }

    fn inv_hess(&mut self) -> &[T] {
        self.inner.inv_hess()
    }

    fn in_neighborhood(&mut self, mu: T, beta: T, use_infty_nbhd: bool) -> bool {
        self.inner.in_neighborhood(mu, beta, use_infty_nbhd)
    }

    fn use_correction(&self) -> bool {
        false
    }

    fn correction(&mut self, out: &mut [T], _primal_dir: &[T]) {
        out.iter_mut().for_each(|x| *x = T::zero());
    }

    fn reset_data(&mut self) {
        self.inner.reset_data();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soc_initial_point_satisfies_homogeneity() {
        let mut c = SecondOrderCone::<f64>::new(3);
        let mut s = vec![0.0; 3];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
        let g = c.grad().to_vec();
        let inner: f64 = s.iter().zip(g.iter()).map(|(a, b)| -a * b).sum();
        assert!((inner - c.nu()).abs() < 1e-9);
    }

    #[test]
    fn soc_hessian_is_symmetric() {
        let mut c = SecondOrderCone::<f64>::new(3);
        c.load_point(&[2.0, 0.5, 0.5]);
        let u = [1.0, 0.3, -0.2];
        let v = [0.5, -0.1, 0.4];
        let mut hu = [0.0; 3];
        let mut hv = [0.0; 3];
        c.hess_prod(&mut hu, &u);
        c.hess_prod(&mut hv, &v);
        let lhs: f64 = v.iter().zip(hu.iter()).map(|(a, b)| a * b).sum();
        let rhs: f64 = u.iter().zip(hv.iter()).map(|(a, b)| a * b).sum();
        assert!((lhs - rhs).abs() < 1e-9);
    }

    #[test]
    fn soc_inv_hess_is_inverse() {
        let mut c = SecondOrderCone::<f64>::new(3);
        c.load_point(&[2.0, 0.5, 0.5]);
        let v = [1.0, 0.2, -0.3];
        let mut hv = [0.0; 3];
        c.hess_prod(&mut hv, &v);
        let mut back = [0.0; 3];
        c.inv_hess_prod(&mut back, &hv);
        for i in 0..3 {
            assert!((back[i] - v[i]).abs() < 1e-7, "{} vs {}", back[i], v[i]);
        }
    }

    #[test]
    fn rsoc_initial_point_feasible() {
        let mut c = RotatedSecondOrderCone::<f64>::new(4);
        let mut s = vec![0.0; 4];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }
}
