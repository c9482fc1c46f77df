//! Power-cone family: the generalized power cone (ball-constrained), and the
//! hypograph-of-weighted-geometric-mean cones (halfspace-constrained in the
//! hypograph variable). All three materialize a dense Hessian from a
//! closed-form entrywise derivation and invert it with Gaussian elimination
//! on demand (dimensions here come from a single model block and are small).

use super::spectral_util::gauss_solve;
use super::Cone;
use crate::algebra::{AsFloatT, FloatT, VectorMath};

/// `{(x,y) in R^k_+ x R^n : prod_i x_i^alpha_i >= ||y||_2}`, `alpha_i > 0`,
/// `sum alpha_i = 1`. Barrier
/// `F(x,y) = -log(prod_i x_i^{2 alpha_i} - ||y||^2) - sum_i (1-alpha_i) log(x_i)`,
/// `nu = k + 1`.
pub struct GenPowerCone<T> {
    alpha: Vec<T>,
    k: usize,
    ny: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> GenPowerCone<T> {
    pub fn new(alpha: Vec<T>, ny: usize) -> Self {
        let k = alpha.len();
        let dim = k + ny;
        Self {
            alpha,
            k,
            ny,
            s: vec![T::zero(); dim],
            z: vec![T::zero(); dim],
            grad: vec![T::zero(); dim],
            hess_mat: vec![T::zero(); dim * dim],
            have_grad: false,
            have_hess: false,
        }
    }

    fn p_and_w(&self) -> (T, T) {
        let mut logp = T::zero();
        for i in 0..self.k {
            logp = logp + T::from(2.0).unwrap() * self.alpha[i] * self.s[i].ln();
        }
        let p = logp.exp();
        let ysq: T = self.s[self.k..].iter().fold(T::zero(), |a, &y| a + y * y);
        (p, p - ysq)
    }
}

impl<T: FloatT> Cone<T> for GenPowerCone<T> {
    fn dimension(&self) -> usize {
        self.k + self.ny
    }

    fn nu(&self) -> T {
        T::from((self.k + 1) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr.iter_mut().for_each(|x| *x = T::zero());
        for i in 0..self.k {
            arr[i] = T::one();
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
        if !self.s[..self.k].iter().all(|&x| x > T::zero()) {
            return false;
        }
        let (_, w) = self.p_and_w();
        w > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[..self.k].iter().all(|&x| x > T::zero())
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let (p, w) = self.p_and_w();
            for i in 0..self.k {
                let u_i = T::from(2.0).unwrap() * self.alpha[i] / self.s[i];
                self.grad[i] = -(p * u_i) / w - (T::one() - self.alpha[i]) / self.s[i];
            }
            for j in 0..self.ny {
                self.grad[self.k + j] = T::from(2.0).unwrap() * self.s[self.k + j] / w;
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
            let (p, w) = self.p_and_w();
            let ysq: T = self.s[self.k..].iter().fold(T::zero(), |a, &y| a + y * y);
            let n = self.dimension();
            let mut u = vec![T::zero(); self.k];
            for i in 0..self.k {
                u[i] = T::from(2.0).unwrap() * self.alpha[i] / self.s[i];
            }
            self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
            for i in 0..self.k {
                for j in 0..self.k {
                    let cross = p * u[i] * u[j] * ysq / (w * w);
                    self.hess_mat[i * n + j] = cross;
                }
                self.hess_mat[i * n + i] = self.hess_mat[i * n + i]
                    + p * u[i] / (w * self.s[i])
                    + (T::one() - self.alpha[i]) / (self.s[i] * self.s[i]);
            }
            for j in 0..self.ny {
                for i in 0..self.k {
                    let val = -T::from(2.0).unwrap() * p * u[i] * self.s[self.k + j] / (w * w);
                    self.hess_mat[i * n + self.k + j] = val;
                    self.hess_mat[(self.k + j) * n + i] = val;
                }
            }
            for a in 0..self.ny {
                for b in 0..self.ny {
                    let ya = self.s[self.k + a];
                    let yb = self.s[self.k + b];
                    let mut val = T::from(4.0).unwrap() * ya * yb / (w * w);
                    if a == b {
                        val = val + T::from(2.0).unwrap() / w;
                    }
                    self.hess_mat[(self.k + a) * n + self.k + b] = val;
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

/// Shared barrier core for the hypograph-of-weighted-geometric-mean cones:
/// `{(t,x) in R x R^n_+ : t <= prod_i x_i^alpha_i}`, `alpha_i > 0`,
/// `sum alpha_i = 1`. Barrier `F(t,x) = -log(g - t) - sum log(x_i)`,
/// `g = prod_i x_i^alpha_i`, `nu = n + 1`. Storage convention: `s = [x_1..x_n, t]`.
struct HypoPowerMeanCore<T> {
    alpha: Vec<T>,
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> HypoPowerMeanCore<T> {
    fn new(alpha: Vec<T>) -> Self {
        let n = alpha.len();
        Self {
            alpha,
            n,
            s: vec![T::zero(); n + 1],
            z: vec![T::zero(); n + 1],
            grad: vec![T::zero(); n + 1],
            hess_mat: vec![T::zero(); (n + 1) * (n + 1)],
            have_grad: false,
            have_hess: false,
        }
    }

    fn g_and_w(&self) -> (T, T) {
        let mut logg = T::zero();
        for i in 0..self.n {
            logg = logg + self.alpha[i] * self.s[i].ln();
        }
        let g = logg.exp();
        (g, g - self.s[self.n])
    }
}

impl<T: FloatT> Cone<T> for HypoPowerMeanCore<T> {
    fn dimension(&self) -> usize {
        self.n + 1
    }

    fn nu(&self) -> T {
        T::from((self.n + 1) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr.iter_mut().for_each(|x| *x = T::zero());
        for i in 0..self.n {
            arr[i] = T::one();
        }
        arr[self.n] = T::from(0.5).unwrap();
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
        if !self.s[..self.n].iter().all(|&x| x > T::zero()) {
            return false;
        }
        let (_, w) = self.g_and_w();
        w > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[self.n] < T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let (g, w) = self.g_and_w();
            for i in 0..self.n {
                let h_i = self.alpha[i] * g / self.s[i];
                self.grad[i] = -h_i / w - T::one() / self.s[i];
            }
            self.grad[self.n] = T::one() / w;
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
            let (g, w) = self.g_and_w();
            let t = self.s[self.n];
            let n = self.dimension();
            let mut h = vec![T::zero(); self.n];
            for i in 0..self.n {
                h[i] = self.alpha[i] * g / self.s[i];
            }
            self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
            for i in 0..self.n {
                for j in 0..self.n {
                    if i == j {
                        continue;
                    }
                    self.hess_mat[i * n + j] = h[i] * h[j] * t / (g * w * w);
                }
                self.hess_mat[i * n + i] = h[i] * (T::one() - self.alpha[i]) / (self.s[i] * w)
                    + h[i] * h[i] / (w * w)
                    + T::one() / (self.s[i] * self.s[i]);
                self.hess_mat[i * n + self.n] = -h[i] / (w * w);
                self.hess_mat[self.n * n + i] = -h[i] / (w * w);
            }
            self.hess_mat[self.n * n + self.n] = T::one() / (w * w);
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

/// `{(t,x) in R x R^n_+ : t <= (prod_i x_i)^{1/n}}`.
pub struct HypoGeomeanCone<T>(HypoPowerMeanCore<T>);

impl<T: FloatT> HypoGeomeanCone<T> {
    pub fn new(n: usize) -> Self {
        let w = T::one() / T::from(n as f64).unwrap();
        Self(HypoPowerMeanCore::new(vec![w; n]))
    }
}

impl<T: FloatT> Cone<T> for HypoGeomeanCone<T> {
    fn dimension(&self) -> usize {
        self.0.dimension()
    }
    fn nu(&self) -> T {
        self.0.nu()
    }
    fn set_initial_point(&mut self, arr: &mut [T]) {
        self.0.set_initial_point(arr)
    }
    fn load_point(&mut self, p: &[T]) {
        self.0.load_point(p)
    }
    fn load_dual_point(&mut self, d: &[T]) {
        self.0.load_dual_point(d)
    }
    fn rescale_point(&mut self, alpha: T) {
        self.0.rescale_point(alpha)
    }
    fn is_feas(&mut self) -> bool {
        self.0.is_feas()
    }
    fn is_dual_feas(&mut self) -> bool {
        self.0.is_dual_feas()
    }
    fn grad(&mut self) -> &[T] {
        self.0.grad()
    }
    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.0.hess_prod(out, v)
    }
    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.0.inv_hess_prod(out, v)
    }
    fn hess(&mut self) -> &[T] {
        self.0.hess()
    }
    fn inv_hess(&mut self) -> &[T] {
        self.0.inv_hess()
    }
    fn in_neighborhood(&mut self, mu: T, beta: T, use_infty_nbhd: bool) -> bool {
        self.0.in_neighborhood(mu, beta, use_infty_nbhd)
    }
    fn use_correction(&self) -> bool {
        self.0.use_correction()
    }
    fn correction(&mut self, out: &mut [T], primal_dir: &[T]) {
        self.0.correction(out, primal_dir)
    }
    fn reset_data(&mut self) {
        self.0.reset_data()
    }
}

/// `{(t,x) in R x R^n_+ : t <= prod_i x_i^alpha_i}`, arbitrary weights
/// `alpha_i > 0` summing to 1.
pub struct HypoPowerMeanCone<T>(HypoPowerMeanCore<T>);

impl<T: FloatT> HypoPowerMeanCone<T> {
    pub fn new(alpha: Vec<T>) -> Self {
        Self(HypoPowerMeanCore::new(alpha))
    }
}

impl<T: FloatT> Cone<T> for HypoPowerMeanCone<T> {
    fn dimension(&self) -> usize {
        self.0.dimension()
    }
    fn nu(&self) -> T {
        self.0.nu()
    }
    fn set_initial_point(&mut self, arr: &mut [T]) {
        self.0.set_initial_point(arr)
    }
    fn load_point(&mut self, p: &[T]) {
        self.0.load_point(p)
    }
    fn load_dual_point(&mut self, d: &[T]) {
        self.0.load_dual_point(d)
    }
    fn rescale_point(&mut self, alpha: T) {
        self.0.rescale_point(alpha)
    }
    fn is_feas(&mut self) -> bool {
        self.0.is_feas()
    }
    fn is_dual_feas(&mut self) -> bool {
        self.0.is_dual_feas()
    }
    fn grad(&mut self) -> &[T] {
        self.0.grad()
    }
    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.0.hess_prod(out, v)
    }
    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.0.inv_hess_prod(out, v)
    }
    fn hess(&mut self) -> &[T] {
        self.0.hess()
    }
    fn inv_hess(&mut self) -> &[T] {
        self.0.inv_hess()
    }
    fn in_neighborhood(&mut self, mu: T, beta: T, use_infty_nbhd: bool) -> bool {
        self.0.in_neighborhood(mu, beta, use_infty_nbhd)
    }
    fn use_correction(&self) -> bool {
        self.0.use_correction()
    }
    fn correction(&mut self, out: &mut [T], primal_dir: &[T]) {
        self.0.correction(out, primal_dir)
    }
    fn reset_data(&mut self) {
        self.0.reset_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_power_cone_feasible_at_initial_point() {
        let mut c = GenPowerCone::<f64>::new(vec![0.5, 0.5], 1);
        let mut s = vec![0.0; 3];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn hypo_geomean_feasible_at_initial_point() {
        let mut c = HypoGeomeanCone::<f64>::new(3);
        let mut s = vec![0.0; 4];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn hypo_geomean_inv_hess_is_inverse() {
        let mut c = HypoGeomeanCone::<f64>::new(2);
        c.load_point(&[2.0, 3.0, 0.5]);
        let v = [1.0, -0.3, 0.2];
        let mut hv = [0.0; 3];
        c.hess_prod(&mut hv, &v);
        let mut back = [0.0; 3];
        c.inv_hess_prod(&mut back, &hv);
        for i in 0..3 {
            assert!((back[i] - v[i]).abs() < 1e-6);
        }
    }
}
