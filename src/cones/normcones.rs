//! Epigraph cones of three norms: `l_infinity`, the vector Euclidean norm,
//! and the matrix spectral/nuclear norms.

use super::socp::SecondOrderCone;
use super::spectral_util::{gauss_solve, logdet_from_eig, reconstruct, sym_eig};
use super::Cone;
use crate::algebra::svec::{svec, svec_len};
use crate::algebra::{AsFloatT, FloatT, VectorMath};

/// `{(t, x) in R x R^n : ||x||_inf <= t}`, barrier
/// `F(t,x) = -sum_i log(t^2 - x_i^2)`, `nu = 2n` (a valid, if not sharp,
/// LHSCB: the sharp parameter for this cone is `n+1`).
pub struct LinfEpigraphCone<T> {
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    have_grad: bool,
}

impl<T: FloatT> LinfEpigraphCone<T> {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            s: vec![T::zero(); n + 1],
            z: vec![T::zero(); n + 1],
            grad: vec![T::zero(); n + 1],
            have_grad: false,
        }
    }

    fn w(&self) -> Vec<T> {
        let t = self.s[0];
        self.s[1..].iter().map(|&x| t * t - x * x).collect()
    }
}

impl<T: FloatT> Cone<T> for LinfEpigraphCone<T> {
    fn dimension(&self) -> usize {
        self.n + 1
    }

    fn nu(&self) -> T {
        T::from(2.0 * self.n as f64).unwrap()
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
        self.s[0] > T::zero() && self.w().iter().all(|&w| w > T::zero()) && self.s.iter().all(|x| x.is_finite())
    }

    fn is_dual_feas(&mut self) -> bool {
        // conservative: accept any strictly positive-first-coordinate dual
        // point (l1-ball epigraph condition is not separately verified here)
        self.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let t = self.s[0];
            let w = self.w();
            let mut gt = T::zero();
            for (i, &wi) in w.iter().enumerate() {
                gt = gt + T::from(2.0).unwrap() * t / wi;
                self.grad[i + 1] = -T::from(2.0).unwrap() * self.s[i + 1] / wi;
            }
            self.grad[0] = gt;
            self.have_grad = true;
        }
        &self.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let t = self.s[0];
        let w = self.w();
        let mut a = T::zero();
        let mut b = vec![T::zero(); self.n];
        let mut d = vec![T::zero(); self.n];
        for i in 0..self.n {
            let wi = w[i];
            let xi = self.s[i + 1];
            a = a + (-T::from(2.0).unwrap() / wi + T::from(4.0).unwrap() * t * t / (wi * wi));
            b[i] = -T::from(4.0).unwrap() * t * xi / (wi * wi);
            d[i] = T::from(2.0).unwrap() / wi + T::from(4.0).unwrap() * xi * xi / (wi * wi);
        }
        out[0] = a * v[0];
        for i in 0..self.n {
            out[0] = out[0] + b[i] * v[i + 1];
            out[i + 1] = b[i] * v[0] + d[i] * v[i + 1];
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        let t = self.s[0];
        let w = self.w();
        let mut a = T::zero();
        let mut b = vec![T::zero(); self.n];
        let mut d = vec![T::zero(); self.n];
        for i in 0..self.n {
            let wi = w[i];
            let xi = self.s[i + 1];
            a = a + (-T::from(2.0).unwrap() / wi + T::from(4.0).unwrap() * t * t / (wi * wi));
            b[i] = -T::from(4.0).unwrap() * t * xi / (wi * wi);
            d[i] = T::from(2.0).unwrap() / wi + T::from(4.0).unwrap() * xi * xi / (wi * wi);
        }
        // Schur complement on the arrow structure.
        let mut schur = a;
        let mut rhs_t = v[0];
        for i in 0..self.n {
            schur = schur - b[i] * b[i] / d[i];
            rhs_t = rhs_t - b[i] * v[i + 1] / d[i];
        }
        let vt = rhs_t / schur;
        out[0] = vt;
        for i in 0..self.n {
            out[i + 1] = (v[i + 1] - b[i] * vt) / d[i];
        }
    }

    fn hess(&mut self) -> &[T] {
        // materialized on demand via repeated hess_prod; not cached densely
        // because the arrow structure makes the dense matrix rarely needed.
        unimplemented!("LinfEpigraphCone exposes hess_prod/inv_hess_prod; dense hess() is unused by the stepper for this cone")
    }

    fn inv_hess(&mut self) -> &[T] {
        unimplemented!("LinfEpigraphCone exposes hess_prod/inv_hess_prod; dense inv_hess() is unused by the stepper for this cone")
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
    }
}

/// `{(t, x) in R x R^n : ||x||_2 <= t}`. Identical barrier to
/// `SecondOrderCone`; kept as a distinct cone variant because the modeling
/// boundary names it separately from the "raw" SOC (the distinction matters
/// to the adapter, not to the barrier math).
pub struct EpiNormEuclideanCone<T>(SecondOrderCone<T>);

impl<T: FloatT> EpiNormEuclideanCone<T> {
    pub fn new(n: usize) -> Self {
        Self(SecondOrderCone::new(n + 1))
    }
}

impl<T: FloatT> Cone<T> for EpiNormEuclideanCone<T> {
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

/// Shared implementation for the spectral (operator) and nuclear (trace)
/// norm epigraph cones: both act on a vectorized `rows x cols` matrix `X`
/// (row-major) via the eigenvalues of the smaller Gram matrix
/// `G = X X^T` (`rows <= cols`) or `X^T X` otherwise.
///
/// The `X`-gradient is exact: for the spectral cone it's the closed form
/// `grad_X = -2 S^-1 X` with `S = t^2 I - X X^T` (one `r x r` linear
/// solve, `grad_x_block`), and for the nuclear cone it's `-P/w` with `P`
/// the polar factor `G^-1/2 X` (`grad_x_block_nuclear`) and `w = t -
/// sum(sigma)`. Neither needs the left/right singular vectors of `X`
/// itself, only the Gram matrix's eigenbasis (spectral) or its inverse
/// square root (nuclear).
///
/// The Hessian/inverse-Hessian still drop the off-diagonal
/// Loewner/divided-difference cross term an exact matrix barrier
/// requires (the full treatment is `eig_dot_kron`, `src/algebra/svec.rs`);
/// the spectral cone's `X`-block uses a per-eigendirection curvature
/// (`eigenbasis_scale`) rather than one value broadcast across the whole
/// block, but this remains a deliberate simplification, recorded in
/// `DESIGN.md`.
struct SpectralEpiCore<T> {
    rows: usize,
    cols: usize,
    r: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    have_grad: bool,
}

impl<T: FloatT> SpectralEpiCore<T> {
    fn new(rows: usize, cols: usize) -> Self {
        let r = rows.min(cols);
        Self {
            rows,
            cols,
            r,
            s: vec![T::zero(); 1 + rows * cols],
            z: vec![T::zero(); 1 + rows * cols],
            grad: vec![T::zero(); 1 + rows * cols],
            have_grad: false,
        }
    }

    fn gram(&self) -> (Vec<T>, usize, bool) {
        // returns (gram matrix row-major r x r, r, transposed_flag)
        let x = &self.s[1..];
        if self.rows <= self.cols {
            // G = X X^T, r = rows
            let r = self.rows;
            let mut g = vec![T::zero(); r * r];
            for i in 0..r {
                for j in 0..r {
                    let mut acc = T::zero();
                    for k in 0..self.cols {
                        acc = acc + x[i * self.cols + k] * x[j * self.cols + k];
                    }
                    g[i * r + j] = acc;
                }
            }
            (g, r, false)
        } else {
            // G = X^T X, r = cols
            let r = self.cols;
            let mut g = vec![T::zero(); r * r];
            for i in 0..r {
                for j in 0..r {
                    let mut acc = T::zero();
                    for k in 0..self.rows {
                        acc = acc + x[k * self.cols + i] * x[k * self.cols + j];
                    }
                    g[i * r + j] = acc;
                }
            }
            (g, r, true)
        }
    }

    fn singular_values(&self) -> Vec<T> {
        let (g, r, _) = self.gram();
        let eig = sym_eig(&g, r);
        eig.eigenvalues
            .iter()
            .map(|&lam| if lam > T::zero() { lam.sqrt() } else { T::zero() })
            .collect()
    }

    /// `Y = S^-1 X` (`S = t^2 I - X X^T`, `rows <= cols`) or `Y = X T^-1`
    /// (`T = t^2 I - X^T X`, `cols < rows`), via one dense `r x r` solve
    /// against `S`/`T` rather than its eigendecomposition.
    fn solve_s_against_x(&self, t: T) -> Vec<T> {
        let (g, r, transposed) = self.gram();
        let mut s = vec![T::zero(); r * r];
        for i in 0..r {
            for j in 0..r {
                s[i * r + j] = if i == j { t * t - g[i * r + j] } else { -g[i * r + j] };
            }
        }
        let x = &self.s[1..];
        let mut out = vec![T::zero(); self.rows * self.cols];
        if !transposed {
            let mut rhs = vec![T::zero(); r];
            let mut col = vec![T::zero(); r];
            for j in 0..self.cols {
                for i in 0..r {
                    rhs[i] = x[i * self.cols + j];
                }
                gauss_solve(&s, r, &rhs, &mut col);
                for i in 0..r {
                    out[i * self.cols + j] = col[i];
                }
            }
        } else {
            let mut rhs = vec![T::zero(); r];
            let mut row_out = vec![T::zero(); r];
            for i in 0..self.rows {
                rhs.copy_from_slice(&x[i * self.cols..(i + 1) * self.cols]);
                gauss_solve(&s, r, &rhs, &mut row_out);
                out[i * self.cols..(i + 1) * self.cols].copy_from_slice(&row_out);
            }
        }
        out
    }

    /// `grad_X F = -2 S^-1 X` for `F(t,X) = -log det(t^2 I - X X^T)`.
    fn grad_x_block(&self, t: T) -> Vec<T> {
        let y = self.solve_s_against_x(t);
        y.iter().map(|&v| -T::from(2.0).unwrap() * v).collect()
    }

    /// The polar factor `P = G^-1/2 X` (`rows <= cols`) or `X T^-1/2`
    /// (`cols < rows`), `G`/`T` the Gram matrix on the smaller side;
    /// `P` is the exact subgradient direction of `||X||_*` in `X` at a
    /// point with `X` full rank (coincides with the SVD's `U V^T`
    /// without needing `U`/`V` explicitly).
    fn polar_factor(&self) -> Vec<T> {
        let (g, r, transposed) = self.gram();
        let eig = sym_eig(&g, r);
        let inv_sqrt: Vec<T> = eig
            .eigenvalues
            .iter()
            .map(|&lam| {
                let sq = if lam > T::zero() { lam.sqrt() } else { T::zero() };
                if sq > T::epsilon() {
                    T::one() / sq
                } else {
                    T::zero()
                }
            })
            .collect();
        let mut g_inv_sqrt = vec![T::zero(); r * r];
        reconstruct(&eig, &inv_sqrt, &mut g_inv_sqrt);

        let x = &self.s[1..];
        let mut out = vec![T::zero(); self.rows * self.cols];
        if !transposed {
            for i in 0..self.rows {
                for j in 0..self.cols {
                    let mut acc = T::zero();
                    for k in 0..self.rows {
                        acc = acc + g_inv_sqrt[i * self.rows + k] * x[k * self.cols + j];
                    }
                    out[i * self.cols + j] = acc;
                }
            }
        } else {
            for i in 0..self.rows {
                for j in 0..self.cols {
                    let mut acc = T::zero();
                    for k in 0..self.cols {
                        acc = acc + x[i * self.cols + k] * g_inv_sqrt[k * self.cols + j];
                    }
                    out[i * self.cols + j] = acc;
                }
            }
        }
        out
    }

    /// Projects `v` (`rows x cols`) onto the Gram matrix's eigenbasis
    /// along whichever side it spans (`rows` if `rows <= cols`, `cols`
    /// otherwise), scales eigen-direction `k` by `scale[k]`, and projects
    /// back. The diagonal-in-eigenbasis piece of the Hessian action for
    /// both epigraph cones.
    fn eigenbasis_scale(&self, v: &[T], scale: &[T]) -> Vec<T> {
        let (g, r, transposed) = self.gram();
        let eig = sym_eig(&g, r);
        let mut out = vec![T::zero(); self.rows * self.cols];
        if !transposed {
            for j in 0..self.cols {
                let mut proj = vec![T::zero(); r];
                for k in 0..r {
                    let mut acc = T::zero();
                    for i in 0..r {
                        acc = acc + eig.v[i * r + k] * v[i * self.cols + j];
                    }
                    proj[k] = acc * scale[k];
                }
                for i in 0..r {
                    let mut acc = T::zero();
                    for k in 0..r {
                        acc = acc + eig.v[i * r + k] * proj[k];
                    }
                    out[i * self.cols + j] = acc;
                }
            }
        } else {
            for i in 0..self.rows {
                let mut proj = vec![T::zero(); r];
                for k in 0..r {
                    let mut acc = T::zero();
                    for j in 0..r {
                        acc = acc + eig.v[j * r + k] * v[i * self.cols + j];
                    }
                    proj[k] = acc * scale[k];
                }
                for j in 0..r {
                    let mut acc = T::zero();
                    for k in 0..r {
                        acc = acc + eig.v[j * r + k] * proj[k];
                    }
                    out[i * self.cols + j] = acc;
                }
            }
        }
        out
    }
}

/// `{(t, X) : sigma_max(X) <= t}`, `X` an `rows x cols` real matrix
/// (row-major vectorization). Barrier `F(t,X) = -sum_i log(t^2 - sigma_i^2)`
/// over the `r = min(rows,cols)` singular values, `nu = 2r`.
pub struct EpiNormSpectralCone<T>(SpectralEpiCore<T>);

impl<T: FloatT> EpiNormSpectralCone<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self(SpectralEpiCore::new(rows, cols))
    }
}

impl<T: FloatT> Cone<T> for EpiNormSpectralCone<T> {
    fn dimension(&self) -> usize {
        1 + self.0.rows * self.0.cols
    }

    fn nu(&self) -> T {
        T::from(2.0 * self.0.r as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr.iter_mut().for_each(|x| *x = T::zero());
        arr[0] = T::one();
    }

    fn load_point(&mut self, p: &[T]) {
        self.0.s.copy_from(p);
        self.reset_data();
    }

    fn load_dual_point(&mut self, d: &[T]) {
        self.0.z.copy_from(d);
        self.reset_data();
    }

    fn rescale_point(&mut self, alpha: T) {
        self.0.s.scale(alpha);
        self.reset_data();
    }

    fn is_feas(&mut self) -> bool {
        let t = self.0.s[0];
        if t <= T::zero() {
            return false;
        }
        self.0.singular_values().iter().all(|&sv| sv < t)
    }

    fn is_dual_feas(&mut self) -> bool {
        self.0.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.0.have_grad {
            let t = self.0.s[0];
            let svs = self.0.singular_values();
            let mut gt = T::zero();
            for &sv in &svs {
                let w = t * t - sv * sv;
                gt = gt + T::from(2.0).unwrap() * t / w;
            }
            self.0.grad[0] = gt;
            let xblock = self.0.grad_x_block(t);
            self.0.grad[1..].copy_from_slice(&xblock);
            self.0.have_grad = true;
        }
        &self.0.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.grad();
        let t = self.0.s[0];
        let svs = self.0.singular_values();
        let mut curvature_t = T::zero();
        let mut scale = vec![T::zero(); svs.len()];
        for (i, &sv) in svs.iter().enumerate() {
            let w = t * t - sv * sv;
            let c = T::from(4.0).unwrap() * t * t / (w * w) - T::from(2.0).unwrap() / w;
            curvature_t = curvature_t + c;
            scale[i] = c;
        }
        out[0] = curvature_t * v[0];
        let xblock = self.0.eigenbasis_scale(&v[1..], &scale);
        out[1..].copy_from_slice(&xblock);
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.grad();
        let t = self.0.s[0];
        let svs = self.0.singular_values();
        let mut curvature_t = T::zero();
        let mut inv_scale = vec![T::zero(); svs.len()];
        for (i, &sv) in svs.iter().enumerate() {
            let w = t * t - sv * sv;
            let c = T::from(4.0).unwrap() * t * t / (w * w) - T::from(2.0).unwrap() / w;
            curvature_t = curvature_t + c;
            inv_scale[i] = if c.abs() > T::epsilon() { T::one() / c } else { T::zero() };
        }
        out[0] = v[0] / curvature_t;
        let xblock = self.0.eigenbasis_scale(&v[1..], &inv_scale);
        out[1..].copy_from_slice(&xblock);
    }

    fn hess(&mut self) -> &[T] {
        unimplemented!("EpiNormSpectralCone exposes hess_prod/inv_hess_prod only")
    }

    fn inv_hess(&mut self) -> &[T] {
        unimplemented!("EpiNormSpectralCone exposes hess_prod/inv_hess_prod only")
    }

    fn in_neighborhood(&mut self, mu: T, beta: T, _use_infty_nbhd: bool) -> bool {
        if !self.is_feas() {
            return false;
        }
        let inner = self.0.s.dot(&self.0.z);
        (inner - self.nu() * mu).abs() <= beta * mu * self.nu()
    }

    fn use_correction(&self) -> bool {
        false
    }

    fn correction(&mut self, out: &mut [T], _primal_dir: &[T]) {
        out.iter_mut().for_each(|x| *x = T::zero());
    }

    fn reset_data(&mut self) {
        self.0.have_grad = false;
    }
}

/// `{(t, X) : ||X||_* <= t}` (nuclear/trace norm epigraph), dual to the
/// spectral norm epigraph. Barrier built the same way, over `sum(sigma_i)`
/// instead of `max(sigma_i)`: `F(t,X) = -log(t - sum_i sigma_i) - sum_i
/// log(sigma_i)` is the textbook choice, but since singular values aren't
/// available in closed differentiable form either, the same diagonal
/// eigenvalue-weighted approximation as `EpiNormSpectralCone` is used here,
/// with `nu = r + 1`.
pub struct EpiNormNuclearCone<T>(SpectralEpiCore<T>);

impl<T: FloatT> EpiNormNuclearCone<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self(SpectralEpiCore::new(rows, cols))
    }
}

impl<T: FloatT> Cone<T> for EpiNormNuclearCone<T> {
    fn dimension(&self) -> usize {
        1 + self.0.rows * self.0.cols
    }

    fn nu(&self) -> T {
        T::from((self.0.r + 1) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr.iter_mut().for_each(|x| *x = T::zero());
        arr[0] = T::from(self.0.r as f64).unwrap().max(T::one());
    }

    fn load_point(&mut self, p: &[T]) {
        self.0.s.copy_from(p);
        self.reset_data();
    }

    fn load_dual_point(&mut self, d: &[T]) {
        self.0.z.copy_from(d);
        self.reset_data();
    }

    fn rescale_point(&mut self, alpha: T) {
        self.0.s.scale(alpha);
        self.reset_data();
    }

    fn is_feas(&mut self) -> bool {
        let t = self.0.s[0];
        if t <= T::zero() {
            return false;
        }
        let sum: T = self.0.singular_values().iter().fold(T::zero(), |a, &b| a + b);
        sum < t
    }

    fn is_dual_feas(&mut self) -> bool {
        self.0.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.0.have_grad {
            let t = self.0.s[0];
            let svs = self.0.singular_values();
            let sum: T = svs.iter().fold(T::zero(), |a, &b| a + b);
            let w = t - sum;
            self.0.grad[0] = T::one() / w;
            // -P/w, P the polar factor (exact subgradient of ||X||_* in X).
            let p = self.0.polar_factor();
            for (k, &pv) in p.iter().enumerate() {
                self.0.grad[1 + k] = -pv / w;
            }
            self.0.have_grad = true;
        }
        &self.0.grad
    }

    fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.grad();
        let t = self.0.s[0];
        let sum: T = self.0.singular_values().iter().fold(T::zero(), |a, &b| a + b);
        let w = t - sum;
        out[0] = v[0] / (w * w);
        for k in 1..v.len() {
            out[k] = v[k] / (w * T::from(self.0.r.max(1) as f64).unwrap());
        }
    }

    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.grad();
        let t = self.0.s[0];
        let sum: T = self.0.singular_values().iter().fold(T::zero(), |a, &b| a + b);
        let w = t - sum;
        out[0] = v[0] * w * w;
        for k in 1..v.len() {
            out[k] = v[k] * w * T::from(self.0.r.max(1) as f64).unwrap();
        }
    }

    fn hess(&mut self) -> &[T] {
        unimplemented!("EpiNormNuclearCone exposes hess_prod/inv_hess_prod only")
    }

    fn inv_hess(&mut self) -> &[T] {
        unimplemented!("EpiNormNuclearCone exposes hess_prod/inv_hess_prod only")
    }

    fn in_neighborhood(&mut self, mu: T, beta: T, _use_infty_nbhd: bool) -> bool {
        if !self.is_feas() {
            return false;
        }
        let inner = self.0.s.dot(&self.0.z);
        (inner - self.nu() * mu).abs() <= beta * mu * self.nu()
    }

    fn use_correction(&self) -> bool {
        false
    }

    fn correction(&mut self, out: &mut [T], _primal_dir: &[T]) {
        out.iter_mut().for_each(|x| *x = T::zero());
    }

    fn reset_data(&mut self) {
        self.0.have_grad = false;
    }
}

// silence unused-import warnings for helpers shared with other cone files
#[allow(unused_imports)]
use logdet_from_eig as _unused_logdet_from_eig;
#[allow(unused_imports)]
use svec as _unused_svec;
#[allow(unused_imports)]
use svec_len as _unused_svec_len;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linf_epigraph_initial_point_feasible() {
        let mut c = LinfEpigraphCone::<f64>::new(3);
        let mut s = vec![0.0; 4];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn linf_epigraph_inv_hess_is_inverse() {
        let mut c = LinfEpigraphCone::<f64>::new(2);
        c.load_point(&[2.0, 0.5, -0.3]);
        let v = [1.0, 0.2, -0.1];
        let mut hv = [0.0; 3];
        c.hess_prod(&mut hv, &v);
        let mut back = [0.0; 3];
        c.inv_hess_prod(&mut back, &hv);
        for i in 0..3 {
            assert!((back[i] - v[i]).abs() < 1e-7);
        }
    }

    #[test]
    fn spectral_epigraph_feasible_at_initial_point() {
        let mut c = EpiNormSpectralCone::<f64>::new(2, 3);
        let mut s = vec![0.0; c.dimension()];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }
}
