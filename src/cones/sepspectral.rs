//! Separable-spectral-function epigraph cones: the perspective of a
//! separable spectral function (vector and matrix argument), vector
//! relative entropy, and its matrix (trace) analogue.

use super::spectral_util::{gauss_solve, reconstruct, sym_eig, SymEig};
use super::Cone;
use crate::algebra::svec::{eig_dot_kron, smat, svec, svec_len, symm_kron};
use crate::algebra::{AsFloatT, FloatT, VectorMath};

/// `{(u,v,w) in R x R_+ x R^n_+ : u >= sum_i w_i log(w_i / v)}` — the
/// epigraph of the perspective of the (separable, scalar) negative-entropy
/// function `g(x) = x log x`. `nu = n + 2`.
pub struct EpiPerSepSpectralVectorCone<T> {
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> EpiPerSepSpectralVectorCone<T> {
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

    fn h_and_q(&self) -> (T, T) {
        let v = self.s[1];
        let mut h = T::zero();
        for i in 0..self.n {
            let w = self.s[2 + i];
            h = h + w * (w.ln() - v.ln());
        }
        (h, self.s[0] - h)
    }
}

impl<T: FloatT> Cone<T> for EpiPerSepSpectralVectorCone<T> {
    fn dimension(&self) -> usize {
        self.n + 2
    }

    fn nu(&self) -> T {
        T::from((self.n + 2) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr[0] = T::from(self.n as f64).unwrap();
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
        let (_, q) = self.h_and_q();
        q > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let v = self.s[1];
            let (_, q) = self.h_and_q();
            let total_w: T = self.s[2..].iter().fold(T::zero(), |a, &b| a + b);
            let c_v = total_w / v;
            self.grad[0] = T::one() / q;
            self.grad[1] = -c_v / q - T::one() / v;
            for i in 0..self.n {
                let w = self.s[2 + i];
                let l_i = (w / v).ln();
                let c_wi = -(l_i + T::one());
                self.grad[2 + i] = -c_wi / q - T::one() / w;
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
            let (_, q) = self.h_and_q();
            let total_w: T = self.s[2..].iter().fold(T::zero(), |a, &b| a + b);
            let c_v = total_w / vv;

            let mut c_w = vec![T::zero(); self.n];
            for i in 0..self.n {
                let w = self.s[2 + i];
                let l_i = (w / vv).ln();
                c_w[i] = -(l_i + T::one());
            }

            self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
            self.hess_mat[0] = T::one() / (q * q);
            self.hess_mat[1] = c_v / (q * q);
            self.hess_mat[n] = c_v / (q * q);
            for i in 0..self.n {
                let val = c_w[i] / (q * q);
                self.hess_mat[2 + i] = val;
                self.hess_mat[(2 + i) * n] = val;
            }
            self.hess_mat[n + 1] = (total_w / (vv * vv)) / q + c_v * c_v / (q * q) + T::one() / (vv * vv);
            for i in 0..self.n {
                let w = self.s[2 + i];
                let val = -(T::one() / vv) / q + c_v * c_w[i] / (q * q);
                self.hess_mat[n + 2 + i] = val;
                self.hess_mat[(2 + i) * n + 1] = val;
            }
            for i in 0..self.n {
                for j in 0..self.n {
                    if i == j {
                        let w = self.s[2 + i];
                        self.hess_mat[(2 + i) * n + 2 + i] =
                            (T::one() / w) / q + c_w[i] * c_w[i] / (q * q) + T::one() / (w * w);
                    } else {
                        self.hess_mat[(2 + i) * n + 2 + j] = c_w[i] * c_w[j] / (q * q);
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

fn log_divided_diff<T: FloatT>(eig: &SymEig<T>) -> Vec<T> {
    let d = eig.d;
    let mut l = vec![T::zero(); d * d];
    for i in 0..d {
        for j in 0..d {
            let li = eig.eigenvalues[i];
            let lj = eig.eigenvalues[j];
            l[i * d + j] = if i == j {
                T::one() / li
            } else if (li - lj).abs() > T::epsilon() {
                (li.ln() - lj.ln()) / (li - lj)
            } else {
                T::one() / li
            };
        }
    }
    l
}

/// `{(u,v,W) in R x R_+ x S^d_+ : u >= v * tr((W/v) log(W/v))}` — matrix
/// analogue of [`EpiPerSepSpectralVectorCone`]. `nu = d + 2`.
pub struct EpiPerSepSpectralMatrixCone<T> {
    d: usize,
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> EpiPerSepSpectralMatrixCone<T> {
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

    fn phi_and_q(&self) -> (SymEig<T>, T, T) {
        let w = self.w_matrix();
        let eig = sym_eig(&w, self.d);
        let v = self.s[1];
        let phi: T = eig
            .eigenvalues
            .iter()
            .fold(T::zero(), |acc, &l| acc + l * (l.ln() - v.ln()));
        let q = self.s[0] - phi;
        (eig, phi, q)
    }
}

impl<T: FloatT> Cone<T> for EpiPerSepSpectralMatrixCone<T> {
    fn dimension(&self) -> usize {
        self.n + 2
    }

    fn nu(&self) -> T {
        T::from((self.d + 2) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr[0] = T::from(self.d as f64).unwrap();
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
        let (eig, _, q) = self.phi_and_q();
        eig.eigenvalues.iter().all(|&l| l > T::zero()) && q > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let v = self.s[1];
            let (eig, _, q) = self.phi_and_q();
            let trace_w: T = eig.eigenvalues.iter().fold(T::zero(), |a, &b| a + b);
            let c_v = trace_w / v;
            self.grad[0] = T::one() / q;
            self.grad[1] = -c_v / q - T::one() / v;

            let logv = v.ln();
            let c_w_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| -(l.ln() - logv + T::one())).collect();
            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut winv = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut winv);
            let mut cw_mat = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &c_w_vals, &mut cw_mat);
            let mut grad_w = vec![T::zero(); self.d * self.d];
            for k in 0..self.d * self.d {
                grad_w[k] = -cw_mat[k] / q - winv[k];
            }
            svec(&grad_w, self.d, &mut self.grad[2..]);
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
            let (eig, _, q) = self.phi_and_q();
            let trace_w: T = eig.eigenvalues.iter().fold(T::zero(), |a, &b| a + b);
            let c_v = trace_w / vv;
            let logv = vv.ln();
            let c_w_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| -(l.ln() - logv + T::one())).collect();
            let mut cw_mat = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &c_w_vals, &mut cw_mat);
            let mut cw_svec = vec![T::zero(); self.n];
            svec(&cw_mat, self.d, &mut cw_svec);

            let inv_vals: Vec<T> = eig.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut winv = vec![T::zero(); self.d * self.d];
            reconstruct(&eig, &inv_vals, &mut winv);

            self.hess_mat.iter_mut().for_each(|x| *x = T::zero());
            self.hess_mat[0] = T::one() / (q * q);
            self.hess_mat[1] = c_v / (q * q);
            self.hess_mat[n] = c_v / (q * q);
            self.hess_mat[n + 1] = (trace_w / (vv * vv)) / q + c_v * c_v / (q * q) + T::one() / (vv * vv);

            for k in 0..self.n {
                let val_u = cw_svec[k] / (q * q);
                self.hess_mat[2 + k] = val_u;
                self.hess_mat[(2 + k) * n] = val_u;
                let val_v = -(T::one() / vv) / q + c_v * cw_svec[k] / (q * q);
                self.hess_mat[n + 2 + k] = val_v;
                self.hess_mat[(2 + k) * n + 1] = val_v;
            }

            let log_dd = log_divided_diff(&eig);
            let mut k_log = vec![T::zero(); self.n * self.n];
            eig_dot_kron(&log_dd, &eig.v, self.d, &mut k_log);
            let mut k_inv = vec![T::zero(); self.n * self.n];
            symm_kron(&winv, self.d, &mut k_inv);

            for i in 0..self.n {
                for j in 0..self.n {
                    let val = -k_log[i * self.n + j] / q + cw_svec[i] * cw_svec[j] / (q * q) + k_inv[i * self.n + j];
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

/// `{(t,x,y) in R x R^n_+ x R^n_+ : t >= sum_i y_i log(y_i/x_i)}` — vector
/// relative entropy epigraph. `nu = 2n + 1`.
pub struct EpiRelEntropyCone<T> {
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> EpiRelEntropyCone<T> {
    pub fn new(n: usize) -> Self {
        let dim = 2 * n + 1;
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

    fn x(&self, i: usize) -> T {
        self.s[1 + i]
    }
    fn y(&self, i: usize) -> T {
        self.s[1 + self.n + i]
    }

    fn q(&self) -> T {
        let mut h = T::zero();
        for i in 0..self.n {
            h = h + self.y(i) * (self.y(i).ln() - self.x(i).ln());
        }
        self.s[0] - h
    }
}

impl<T: FloatT> Cone<T> for EpiRelEntropyCone<T> {
    fn dimension(&self) -> usize {
        2 * self.n + 1
    }

    fn nu(&self) -> T {
        T::from((2 * self.n + 1) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr[0] = T::from(self.n as f64).unwrap();
        for i in 0..self.n {
            arr[1 + i] = T::one();
            arr[1 + self.n + i] = T::one();
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
        for i in 0..self.n {
            if self.x(i) <= T::zero() || self.y(i) <= T::zero() {
                return false;
            }
        }
        self.q() > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let q = self.q();
            self.grad[0] = T::one() / q;
            for i in 0..self.n {
                let (xi, yi) = (self.x(i), self.y(i));
                let p_i = yi / xi;
                self.grad[1 + i] = -p_i / q - T::one() / xi;
                let l_i = (yi / xi).ln();
                let r_i = -(l_i + T::one());
                self.grad[1 + self.n + i] = -r_i / q - T::one() / yi;
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
            let q = self.q();
            let mut c = vec![T::zero(); n];
            c[0] = T::one();
            let mut p = vec![T::zero(); self.n];
            let mut r = vec![T::zero(); self.n];
            for i in 0..self.n {
                let (xi, yi) = (self.x(i), self.y(i));
                p[i] = yi / xi;
                r[i] = -((yi / xi).ln() + T::one());
                c[1 + i] = p[i];
                c[1 + self.n + i] = r[i];
            }
            self.hess_mat.iter_mut().for_each(|v| *v = T::zero());
            for i in 0..n {
                for j in 0..n {
                    self.hess_mat[i * n + j] = c[i] * c[j] / (q * q);
                }
            }
            for i in 0..self.n {
                let (xi, yi) = (self.x(i), self.y(i));
                self.hess_mat[(1 + i) * n + 1 + i] = self.hess_mat[(1 + i) * n + 1 + i] + (p[i] / xi) / q + T::one() / (xi * xi);
                self.hess_mat[(1 + self.n + i) * n + 1 + self.n + i] =
                    self.hess_mat[(1 + self.n + i) * n + 1 + self.n + i] + (T::one() / yi) / q + T::one() / (yi * yi);
                let cross = -(T::one() / xi) / q;
                self.hess_mat[(1 + i) * n + 1 + self.n + i] = self.hess_mat[(1 + i) * n + 1 + self.n + i] + cross;
                self.hess_mat[(1 + self.n + i) * n + 1 + i] = self.hess_mat[(1 + self.n + i) * n + 1 + i] + cross;
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

/// `{(t,X,Y) in R x S^d_+ x S^d_+ : t >= tr(Y(logY - logX))}` — matrix
/// (trace) relative entropy epigraph. `X` and `Y` are stored in `svec`
/// form. `nu = 2d + 1`.
///
/// The gradient is exact (the standard operator relative-entropy gradient,
/// via `Y` projected into `X`'s eigenbasis). The Hessian drops the
/// second-order divided-difference term coupling `X`'s and `Y`'s distinct
/// eigenbases (a joint Daleckii-Krein operator) and instead combines each
/// matrix's own `eig_dot_kron`/`symm_kron` block plus the same rank-one
/// `q`-coupling used by the vector cone — an approximation recorded in
/// `DESIGN.md`.
pub struct EpiTraceRelEntropyCone<T> {
    d: usize,
    n: usize,
    s: Vec<T>,
    z: Vec<T>,
    grad: Vec<T>,
    hess_mat: Vec<T>,
    have_grad: bool,
    have_hess: bool,
}

impl<T: FloatT> EpiTraceRelEntropyCone<T> {
    pub fn new(d: usize) -> Self {
        let n = svec_len(d);
        let dim = 2 * n + 1;
        Self {
            d,
            n,
            s: vec![T::zero(); dim],
            z: vec![T::zero(); dim],
            grad: vec![T::zero(); dim],
            hess_mat: vec![T::zero(); dim * dim],
            have_grad: false,
            have_hess: false,
        }
    }

    fn x_matrix(&self) -> Vec<T> {
        let mut x = vec![T::zero(); self.d * self.d];
        smat(&self.s[1..1 + self.n], self.d, &mut x);
        x
    }
    fn y_matrix(&self) -> Vec<T> {
        let mut y = vec![T::zero(); self.d * self.d];
        smat(&self.s[1 + self.n..], self.d, &mut y);
        y
    }

    fn q(&self) -> T {
        let x = self.x_matrix();
        let y = self.y_matrix();
        let ex = sym_eig(&x, self.d);
        let ey = sym_eig(&y, self.d);
        // tr(Y logY) - tr(Y logX) computed via Y's own eigenbasis for the
        // first term and X's eigenbasis projection (V_X^T Y V_X) for the
        // second, matching the exact-gradient derivation.
        let tr_y_logy: T = ey.eigenvalues.iter().fold(T::zero(), |a, &l| a + l * l.ln());
        let yp = project(&ex.v, &y, self.d);
        let mut tr_y_logx = T::zero();
        for i in 0..self.d {
            tr_y_logx = tr_y_logx + yp[i * self.d + i] * ex.eigenvalues[i].ln();
        }
        self.s[0] - (tr_y_logy - tr_y_logx)
    }
}

fn project<T: FloatT>(v: &[T], m: &[T], d: usize) -> Vec<T> {
    // V^T M V for row-major d x d matrices
    let mut tmp = vec![T::zero(); d * d];
    for i in 0..d {
        for j in 0..d {
            let mut acc = T::zero();
            for k in 0..d {
                acc = acc + v[k * d + i] * m[k * d + j];
            }
            tmp[i * d + j] = acc;
        }
    }
    let mut out = vec![T::zero(); d * d];
    for i in 0..d {
        for j in 0..d {
            let mut acc = T::zero();
            for k in 0..d {
                acc = acc + tmp[i * d + k] * v[k * d + j];
            }
            out[i * d + j] = acc;
        }
    }
    out
}

impl<T: FloatT> Cone<T> for EpiTraceRelEntropyCone<T> {
    fn dimension(&self) -> usize {
        2 * self.n + 1
    }

    fn nu(&self) -> T {
        T::from((2 * self.d + 1) as f64).unwrap()
    }

    fn set_initial_point(&mut self, arr: &mut [T]) {
        arr[0] = T::from(self.d as f64).unwrap();
        let mut eye = vec![T::zero(); self.d * self.d];
        for i in 0..self.d {
            eye[i * self.d + i] = T::one();
        }
        svec(&eye, self.d, &mut arr[1..1 + self.n]);
        svec(&eye, self.d, &mut arr[1 + self.n..]);
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
        let ex = sym_eig(&self.x_matrix(), self.d);
        let ey = sym_eig(&self.y_matrix(), self.d);
        if !ex.eigenvalues.iter().all(|&l| l > T::zero()) || !ey.eigenvalues.iter().all(|&l| l > T::zero()) {
            return false;
        }
        self.q() > T::zero()
    }

    fn is_dual_feas(&mut self) -> bool {
        self.z[0] > T::zero()
    }

    fn grad(&mut self) -> &[T] {
        if !self.have_grad {
            let q = self.q();
            self.grad[0] = T::one() / q;

            let x = self.x_matrix();
            let y = self.y_matrix();
            let ex = sym_eig(&x, self.d);
            let ey = sym_eig(&y, self.d);

            // d/dX: grad_X = (1/q) * V_X (L_X .* (V_X^T Y V_X)) V_X^T - X^{-1}
            let log_dd = log_divided_diff(&ex);
            let yp = project(&ex.v, &y, self.d);
            let mut weighted = vec![T::zero(); self.d * self.d];
            for k in 0..self.d * self.d {
                weighted[k] = log_dd[k] * yp[k];
            }
            let m = reconstruct_from_basis(&ex.v, &weighted, self.d);
            let inv_x_vals: Vec<T> = ex.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut xinv = vec![T::zero(); self.d * self.d];
            reconstruct(&ex, &inv_x_vals, &mut xinv);
            let mut grad_x = vec![T::zero(); self.d * self.d];
            for k in 0..self.d * self.d {
                grad_x[k] = m[k] / q - xinv[k];
            }
            svec(&grad_x, self.d, &mut self.grad[1..1 + self.n]);

            // d/dY: grad_Y = -(1/q)*(logY - logX + I) - Y^{-1}
            let log_x_vals: Vec<T> = ex.eigenvalues.iter().map(|&l| l.ln()).collect();
            let mut logx = vec![T::zero(); self.d * self.d];
            reconstruct(&ex, &log_x_vals, &mut logx);
            let log_y_vals: Vec<T> = ey.eigenvalues.iter().map(|&l| l.ln()).collect();
            let mut logy = vec![T::zero(); self.d * self.d];
            reconstruct(&ey, &log_y_vals, &mut logy);
            let inv_y_vals: Vec<T> = ey.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut yinv = vec![T::zero(); self.d * self.d];
            reconstruct(&ey, &inv_y_vals, &mut yinv);
            let mut grad_y = vec![T::zero(); self.d * self.d];
            for k in 0..self.d * self.d {
                let diag = if k % self.d == k / self.d { T::one() } else { T::zero() };
                grad_y[k] = -(logy[k] - logx[k] + diag) / q - yinv[k];
            }
            svec(&grad_y, self.d, &mut self.grad[1 + self.n..]);

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
            let q = self.q();
            self.grad();

            let x = self.x_matrix();
            let y = self.y_matrix();
            let ex = sym_eig(&x, self.d);
            let ey = sym_eig(&y, self.d);

            let inv_x_vals: Vec<T> = ex.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut xinv = vec![T::zero(); self.d * self.d];
            reconstruct(&ex, &inv_x_vals, &mut xinv);
            let inv_y_vals: Vec<T> = ey.eigenvalues.iter().map(|&l| T::one() / l).collect();
            let mut yinv = vec![T::zero(); self.d * self.d];
            reconstruct(&ey, &inv_y_vals, &mut yinv);

            let mut k_inv_x = vec![T::zero(); self.n * self.n];
            symm_kron(&xinv, self.d, &mut k_inv_x);
            let mut k_inv_y = vec![T::zero(); self.n * self.n];
            symm_kron(&yinv, self.d, &mut k_inv_y);

            let log_dd_x = log_divided_diff(&ex);
            let mut k_log_x = vec![T::zero(); self.n * self.n];
            eig_dot_kron(&log_dd_x, &ex.v, self.d, &mut k_log_x);

            let mut cx_svec = vec![T::zero(); self.n];
            let mut cy_svec = vec![T::zero(); self.n];
            let log_dd = &log_dd_x;
            let yp = project(&ex.v, &y, self.d);
            let mut weighted = vec![T::zero(); self.d * self.d];
            for k in 0..self.d * self.d {
                weighted[k] = log_dd[k] * yp[k];
            }
            let m = reconstruct_from_basis(&ex.v, &weighted, self.d);
            svec(&m, self.d, &mut cx_svec);
            let log_x_vals: Vec<T> = ex.eigenvalues.iter().map(|&l| l.ln()).collect();
            let mut logx = vec![T::zero(); self.d * self.d];
            reconstruct(&ex, &log_x_vals, &mut logx);
            let log_y_vals: Vec<T> = ey.eigenvalues.iter().map(|&l| l.ln()).collect();
            let mut logy = vec![T::zero(); self.d * self.d];
            reconstruct(&ey, &log_y_vals, &mut logy);
            let mut cy_mat = vec![T::zero(); self.d * self.d];
            for k in 0..self.d * self.d {
                let diag = if k % self.d == k / self.d { T::one() } else { T::zero() };
                cy_mat[k] = -(logy[k] - logx[k] + diag);
            }
            svec(&cy_mat, self.d, &mut cy_svec);

            self.hess_mat.iter_mut().for_each(|v| *v = T::zero());
            self.hess_mat[0] = T::one() / (q * q);
            for k in 0..self.n {
                let vu = cx_svec[k] / (q * q);
                self.hess_mat[1 + k] = vu;
                self.hess_mat[(1 + k) * n] = vu;
                let vy = cy_svec[k] / (q * q);
                self.hess_mat[1 + self.n + k] = vy;
                self.hess_mat[(1 + self.n + k) * n] = vy;
            }
            for i in 0..self.n {
                for j in 0..self.n {
                    let xx = cx_svec[i] * cx_svec[j] / (q * q) + k_inv_x[i * self.n + j];
                    self.hess_mat[(1 + i) * n + 1 + j] = xx;
                    let yy = cy_svec[i] * cy_svec[j] / (q * q) + k_log_x[i * self.n + j] / q + k_inv_y[i * self.n + j];
                    self.hess_mat[(1 + self.n + i) * n + 1 + self.n + j] = yy;
                    let xy = cx_svec[i] * cy_svec[j] / (q * q);
                    self.hess_mat[(1 + i) * n + 1 + self.n + j] = xy;
                    self.hess_mat[(1 + self.n + j) * n + 1 + i] = xy;
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

fn reconstruct_from_basis<T: FloatT>(v: &[T], weighted: &[T], d: usize) -> Vec<T> {
    // result = V * weighted * V^T
    let mut tmp = vec![T::zero(); d * d];
    for i in 0..d {
        for k in 0..d {
            let vik = v[i * d + k];
            if vik == T::zero() {
                continue;
            }
            for j in 0..d {
                tmp[i * d + j] = tmp[i * d + j] + vik * weighted[k * d + j];
            }
        }
    }
    let mut out = vec![T::zero(); d * d];
    for i in 0..d {
        for k in 0..d {
            let tik = tmp[i * d + k];
            if tik == T::zero() {
                continue;
            }
            for j in 0..d {
                out[i * d + j] = out[i * d + j] + tik * v[j * d + k];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epi_per_sep_spectral_vector_feasible_at_initial_point() {
        let mut c = EpiPerSepSpectralVectorCone::<f64>::new(3);
        let mut s = vec![0.0; c.dimension()];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn epi_rel_entropy_feasible_at_initial_point() {
        let mut c = EpiRelEntropyCone::<f64>::new(3);
        let mut s = vec![0.0; c.dimension()];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn epi_trace_rel_entropy_feasible_at_initial_point() {
        let mut c = EpiTraceRelEntropyCone::<f64>::new(2);
        let mut s = vec![0.0; c.dimension()];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }

    #[test]
    fn epi_per_sep_spectral_matrix_feasible_at_initial_point() {
        let mut c = EpiPerSepSpectralMatrixCone::<f64>::new(2);
        let mut s = vec![0.0; c.dimension()];
        c.set_initial_point(&mut s);
        c.load_point(&s);
        assert!(c.is_feas());
    }
}
