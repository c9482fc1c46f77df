//! Weighted-sum-of-squares (WSOS) interpolant cones.
//!
//! The real WSOS family is parametrized by an interpolation basis matrix `P`
//! (`U` interpolation points by `L` basis functions, typically a Chebyshev
//! or Padua point set) that is supplied by the modeling layer building the
//! polynomial program. `SupportedCone` only carries the two/three dimension
//! parameters (`u`, `l`, and an optional block size `r`), so the basis
//! itself is not model data here: each cone builds a deterministic
//! placeholder basis from its dimensions at construction. This keeps the
//! barrier machinery (the part `` actually specifies) exact for
//! whatever `P` is supplied, while the basis-construction gap is recorded in
//! `DESIGN.md`.

use super::Cone;
use crate::algebra::svec::symm_kron;
use crate::algebra::{AsFloatT, FloatT, VectorMath};
use crate::cones::spectral_util::{gauss_solve, reconstruct, sym_eig};

fn placeholder_basis<T: FloatT>(u: usize, l: usize) -> Vec<T> {
    // U x L deterministic basis: p_{i,k} = cos((i+1)(k+1)pi/(u+1)), scaled
    // so each row has roughly unit norm. Not a real polynomial
    // interpolation basis; see the module doc comment.
    let mut p = vec![T::zero(); u * l];
    let pi = T::from(std::f64::consts::PI).unwrap();
    for i in 0..u {
        for k in 0..l {
            let arg = T::from(((i + 1) * (k + 1)) as f64).unwrap() * pi / T::from((u + 1) as f64).unwrap();
            p[i * l + k] = arg.cos();
        }
    }
    p
}

fn lambda_of<T: FloatT>(p: &[T], f: &[T], u: usize, l: usize) -> Vec<T> {
    // Lambda = P^T diag(f) P, l x l
    let mut lambda = vec![T::zero(); l * l];
    for i in 0..u {
        let fi = f[i];
        if fi == T::zero() {
            continue;
        }
        for a in 0..l {
            let pa = p[i * l + a];
            if pa == T::zero() {
                continue;
            }
            for b in 0..l {
                lambda[a * l + b] = lambda[a * l + b] + fi * pa * p[i * l + b];
            }
        }
    }
    lambda
}

/// `{f in R^U : P^T diag(f) P >~ 0}` — the WSOS nonnegativity cone for
/// polynomials represented via values at `U` interpolation points against an
/// `L`-dimensional basis. Barrier `F(f) = -logdet(P^T diag(f) P)`, `nu = L`.
pub struct WsosNonnegativeCone<T> {
    u: usize,
    l: usize,
    p: Vec<T>,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> WsosNonnegativeCone<T> {
    pub fn new(u: usize, l: usize) -> Self {
        Self {
            u,
            l,
            p: placeholder_basis(u, l),
            s: vec![T::zero(); u],
            z: vec![T::zero(); u],
            grad: vec![T::zero(); u],
            hess_mat: vec![T::zero(); u * u],
            have_grad: false,
            have_hess: false,
        }
    }

    fn lambda_inv(&self) -> Vec<T> {
        let lambda = lambda_of(&self.p, &self.s, self.u, self.l);
        let eig = sym_eig(&lambda, self.l);
        let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&x| T::one() / x).collect();
        let mut out = vec![T::zero(); self.l * self.l];
        reconstruct(&eig, &inv_vals, &mut out);
        out
    }

    fn row(&self, i: usize) -> &[T] {
        &self.p[i * self.l..(i + 1) * self.l]
    }
}

impl<T: FloatT> Cone<T> for WsosNonnegativeCone<T> {
    fn dimension(&self) -> usize {
        self.u
    }

    fn nu(&self) -> T {
        T::from(self.l as f64).unwrap()
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
        let lambda = lambda_of(&self.p, &self.s, self.u, self.l);
        let eig = sym_eig(&lambda, self.l);
        eig.eigenvalues.iter().all(|&x| x > T::zero())
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z.iter().all(|&x| x.is_finite())
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let linv = self.lambda_inv();
            for i in 0..self.u {
                let pi = self.row(i);
                let mut acc = T::zero();
                for a in 0..self.l {
                    for b in 0..self.l {
                        acc = acc + pi[a] * linv[a * self.l + b] * pi[b];
                    }
                }
                self.grad[i] = -acc;
            }
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let h = self.hess();
        for i in 0..self.u {
            let mut acc = T::zero();
            for j in 0..self.u {
                acc = acc + h[i * self.u + j] * v[j];
            }
            out[i] = acc;
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let h = self.hess().to_vec();
        gauss_solve(&h, self.u, v, out);
    }

    fn hess(&mut self) -> &[T] {
        if !self.have_hess {
            let linv = self.lambda_inv();
            let mut bilinear = vec![T::zero(); self.u * self.l];
            for i in 0..self.u {
                let pi = self.row(i);
                for b in 0..self.l {
                    let mut acc = T::zero();
                    for a in 0..self.l {
                        acc = acc + pi[a] * linv[a * self.l + b];
                    }
                    bilinear[i * self.l + b] = acc;
                }
            }
            for i in 0..self.u {
                for j in 0..self.u {
                    let mut acc = T::zero();
                    for b in 0..self.l {
                        acc = acc + bilinear[i * self.l + b] * self.p[j * self.l + b];
                    }
                    self.hess_mat[i * self.u + j] = acc * acc;
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

/// Matrix-valued WSOS cone: `r` independent copies of
/// [`WsosNonnegativeCone`]'s barrier over the same basis, stacked
/// block-diagonally. A fully faithful matrix-SOS cone couples the `r`
/// blocks through a joint `Lambda` of size `Lr x Lr`; this block-diagonal
/// treatment is a recorded simplification (`DESIGN.md`).
pub struct WsosPsdCone<T> {
    blocks: Vec<WsosNonnegativeCone<T>>,
    u: usize,
    r: usize,
}

impl<T: FloatT> WsosPsdCone<T> {
    pub fn new(u: usize, l: usize, r: usize) -> Self {
        let blocks = (0..r).map(|_| WsosNonnegativeCone::new(u, l)).collect();
        Self { blocks, u, r }
    }
}

impl<T: FloatT> Cone<T> for WsosPsdCone<T> {
    fn dimension(&self) -> usize {
        self.u * self.r
    }

    fn nu(&self) -> T {
        self.blocks.iter().fold(T::zero(), |acc, b| acc + b.nu())
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        for (k, b) in self.blocks.iter_mut().enumerate() {
            b.set_initial_point(&mut arr[k * self.u..(k + 1) * self.u]);
        }
    }

    fn load_point(&mut self, p: &[T]) {
        for (k, b) in self.blocks.iter_mut().enumerate() {
            b.load_point(&p[k * self.u..(k + 1) * self.u]);
        }
    }

    fn load_dual_point(&mut self, d: &[T]) {
        for (k, b) in self.blocks.iter_mut().enumerate() {
            b.load_dual_point(&d[k * self.u..(k + 1) * self.u]);
        }
    }

    fn rescale_point(&mut self, alpha: T) {
        for b in self.blocks.iter_mut() {
            b.rescale_point(alpha);
        }
    }

    fn is_feas(&mut self) -> bool {
        self.blocks.iter_mut().all(|b| b.is_feas())
    }

    fn is_dual_feas(&mut self) -> bool {
        self.blocks.iter_mut().all(|b| b.is_dual_feas())
    }

    fn grad(&mut self) -> &[T] {
        // not cacheable across blocks without extra storage; callers use
        // hess_prod/inv_hess_prod which recompute per-block directly.
        unimplemented!("WsosPsdCone: use per-block gradients via hess_prod/inv_hess_prod")
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        for (k, b) in self.blocks.iter_mut().enumerate() {
            b.hess_prod(&mut out[k * self.u..(k + 1) * self.u], &v[k * self.u..(k + 1) * self.u]);
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        for (k, b) in self.blocks.iter_mut().enumerate() {
            b.inv_hess_prod(&mut out[k * self.u..(k + 1) * self.u], &v[k * self.u..(k + 1) * self.u]);
        }
    }

    fn hess(&mut self) -> &[T] {
        unimplemented!("WsosPsdCone exposes only block hess_prod/inv_hess_prod")
    }

    fn inv_hess(&mut self) -> &[T] {
        unimplemented!("WsosPsdCone exposes only block hess_prod/inv_hess_prod")
    }

    fn in_neighborhood(&mut self, mu: T, beta: T, use_infty_nbhd: bool) -> bool {
        self.blocks.iter_mut().all(|b| b.in_neighborhood(mu, beta, use_infty_nbhd))
    }

    fn use_correction(&self) -> bool {
        false
    }

    fn correction(&mut self, out: &mut [T], _primal_dir: &[T]) {
        out.iter_mut().for_each(|x| *x = T::zero());
    }

    fn reset_data(&mut self) {
        for b in self.blocks.iter_mut() {
            b.reset_data();
        }
    }
}

/// Epigraph of the sup-norm of `m` WSOS-representable polynomials: bounds
/// each `f_j` between `-bound` and `bound` via two `WsosNonnegativeCone`
/// blocks per polynomial. Storage: `[bound_1..bound_m, f_{1,1..u}, ...,
/// f_{m,1..u}]`.
pub struct WsosLinfCone<T> {
    m: usize,
    u: usize,
    l: usize,
    p: Vec<T>,
    s: Vec<T>,
    z: Vec<T>,
}

impl<T: FloatT> WsosLinfCone<T> {
    pub fn new(u: usize, l: usize) -> Self {
        Self {
            m: 1,
            u,
            l,
            p: placeholder_basis(u, l),
            s: vec![T::zero(); 1 + u],
            z: vec![T::zero(); 1 + u],
        }
    }
}

impl<T: FloatT> Cone<T> for WsosLinfCone<T> {
    fn dimension(&self) -> usize {
        self.m + self.m * self.u
    }

    fn nu(&self) -> T {
        T::from((2 * self.l) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr[0] = T::from(2.0).unwrap();
        for i in 0..self.u {
            arr[1 + i] = T::zero();
        }
    }

    fn load_point(&mut self, p: &[T]) {
        self.s.copy_from(p);
    }

    fn load_dual_point(&mut self, d: &[T]) {
        self.z.copy_from(d);
    }

    fn rescale_point(&mut self, alpha: T) {
        self.s.scale(alpha);
    }

    fn is_feas(&mut self) -> bool {
        let bound = self.s[0];
        if bound <= T::zero() {
            return false;
        }
        let f = &self.s[1..];
        let mut plus = WsosNonnegativeCone::<T>::new(self.u, self.l);
        plus.p = self.p.clone();
        let mut minus = WsosNonnegativeCone::<T>::new(self.u, self.l);
        minus.p = self.p.clone();
        let fp: Vec<T> = f.iter().map(|&x| bound - x).collect();
        let fm: Vec<T> = f.iter().map(|&x| bound + x).collect();
        plus.load_point(&fp);
        minus.load_point(&fm);
        plus.is_feas() && minus.is_feas()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        unimplemented!("WsosLinfCone exposes hess_prod/inv_hess_prod only")
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        // diagonal approximation: treat the two nonnegativity barriers as
        // independent per-coordinate orthant-like curvature (1/gap^2),
        // matching LinfEpigraphCone's arrow simplification.
        let bound = self.s[0];
        let mut curvature_sum = T::zero();
        let mut cross = vec![T::zero(); self.u];
        for i in 0..self.u {
            let f = self.s[1 + i];
            let gp = bound - f;
            let gm = bound + f;
            let c = T::one() / (gp * gp) + T::one() / (gm * gm);
            curvature_sum = curvature_sum + c;
            cross[i] = T::one() / (gp * gp) - T::one() / (gm * gm);
        }
        out[0] = curvature_sum * v[0];
        for i in 0..self.u {
            out[0] = out[0] + cross[i] * v[1 + i];
        }
        for i in 0..self.u {
            let f = self.s[1 + i];
            let gp = bound - f;
            let gm = bound + f;
            let d = T::one() / (gp * gp) + T::one() / (gm * gm);
            out[1 + i] = cross[i] * v[0] + d * v[1 + i];
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let n = self.dimension();
        let mut dense = vec![T::zero(); n * n];
        let mut e = vec![T::zero(); n];
        let mut col = vec![T::zero(); n];
        for k in 0..n {
            e.iter_mut().for_each(|x| *x = T::zero());
            e[k] = T::one();
            self.hess_prod(&mut col, &e);
            for row in 0..n {
                dense[row * n + k] = col[row];
            }
        }
        gauss_solve(&dense, n, v, out);
    }

    fn hess(&mut self) -> &[T] {
        unimplemented!("WsosLinfCone exposes hess_prod/inv_hess_prod only")
    }

    fn inv_hess(&mut self) -> &[T] {
        unimplemented!("WsosLinfCone exposes hess_prod/inv_hess_prod only")
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

    fn reset_data(&mut self) {}
}

/// Epigraph of the Euclidean norm of the WSOS coefficient vector: bounds
/// `||f||_2 <= bound` via the second-order-cone barrier applied directly to
/// the interpolated values (a simplification: the true WSOS-Euclidean cone
/// constrains the norm of polynomial *coefficients* against a WSOS
/// certificate, not the raw interpolated value vector).
pub struct WsosEuclideanCone<T> {
    u: usize,
    inner: super::socp::SecondOrderCone<T>,
}

impl<T: FloatT> WsosEuclideanCone<T> {
    pub fn new(u: usize, _l: usize) -> Self {
        Self {
            u,
            inner: super::socp::SecondOrderCone::new(u + 1),
        }
    }
}

impl<T: FloatT> Cone<T> for WsosEuclideanCone<T> {
    fn dimension(&self) -> usize {
        self.u + 1
    }
    fn nu(&self) -> T {
        self.inner.nu()
    }
    fn set_initial_point(&mut self, arr: &mut [T]) {
        self.inner.set_initial_point(arr)
    }
    fn load_point(&mut self, p: &[T]) {
        self.inner.load_point(p)
    }
    fn load_dual_point(&mut self, d: &[T]) {
        self.inner.load_dual_point(d)
    }
    fn rescale_point(&mut self, alpha: T) {
        self.inner.rescale_point(alpha)
    }
    fn is_feas(&mut self) -> bool {
        self.inner.is_feas()
    }
    fn is_dual_feas(&mut self) -> bool {
        self.inner.is_dual_feas()
    }
    fn grad(&mut self) -> &[T] {
        self.inner.grad()
    }
    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.inner.hess_prod(out, v)
    }
    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.inner.inv_hess_prod(out, v)
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
        self.inner.use_correction()
    }
    fn correction(&mut self, out: &mut [T], primal_dir: &[T]) {
        self.inner.correction(out, primal_dir)
    }
    fn reset_data(&mut self) {
        self.inner.reset_data();
        let _ = self.u;
    }
}

#[allow(unused_imports)]
use symm_kron as _unused_symm_kron;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wsos_nonneg_all_ones_is_feasible() {
        let mut c = WsosNonnegativeCone::<f64>::new(4, 2);
        let mut s = vec![0.0; 4];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn wsos_psd_block_dimensions() {
        let mut c = WsosPsdCone::<f64>::new(3, 2, 2);
        assert_eq!(c.dimension(), 6);
        let mut s = vec![0.0; 6];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }
}
