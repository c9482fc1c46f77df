//! The QR-Cholesky system solver: eliminates `z` against the blockwise cone
//! Hessian, then eliminates `x`/`y` via the null-space decomposition of `A`
//! obtained from the pivoted QR of `A^T` (`qr_at`, computed once in
//! `src/preprocess.rs` and forwarded here), landing on a single dense
//! `(n - rank(A)) x (n - rank(A))` reduced system rather than the full
//! `(n+p+q+1) x (n+p+q+1)` block `NaiveSystemSolver` factors directly.
//!
//! Writing `x = Q1 u + Q2 v` for the QR factors `A^T = Q R` (`Q1`/`Q2` the
//! leading `rank`/trailing `n - rank` columns of `Q`), `A x = target` has the
//! minimum-norm solution `Q1 u` with `u` from a triangular solve against
//! `R1` (`qr_solve_min_norm_transpose`), and the `x`-row equation projected
//! onto `Q2` collapses to `K v = g` with `K = Q2^T (mu G^T Hess G) Q2`,
//! symmetric and (for a feasible interior point) positive semidefinite.
//! Because the HSD embedding's extra `tau` unknown enters every block-row
//! affinely rather than quadratically, the whole reduced system is affine in
//! `tau_dir`: two solves (one per the `tau`-independent and `tau`-coefficient
//! parts of the right-hand side) plus the scalar `tau`-row equation recover
//! `tau_dir` exactly, the standard bordering trick for direct conic-IPM
//! solvers. `K` is factored with a dense partial-pivoted LU rather than
//! Cholesky proper (noted in `DESIGN.md`); everything downstream of
//! `tau_dir` reuses `unpack_solution` exactly as `NaiveSystemSolver` does.

use super::{assemble_rhs, assemble_triplets, triplets_to_csc, unpack_solution, RhsBlocks, SystemSolver};
use crate::algebra::dense::{qr_solve_min_norm, qr_solve_min_norm_transpose, PivotedQr};
use crate::algebra::{CscMatrix, FloatT, MatrixMath, MatrixShape, VectorMath};
use crate::cones::CompositeCone;
use crate::direction::Direction;
use crate::error::ConeSolverError;
use crate::model::Model;
use faer::prelude::*;
use faer::{Col, Mat};

pub struct QrCholSystemSolver<T: FloatT> {
    n: usize,
    p: usize,
    q: usize,
    qr_at: Option<PivotedQr<T>>,
    /// Null-space basis of `A` (`n x (n - rank)`); the whole space when
    /// `p == 0`, since there is then no equality constraint to eliminate.
    q2: Mat<T>,
    rank: usize,
    /// Minimum-norm `x` with `A x = b`, constant for the life of the model.
    x_range_b: Vec<T>,
    refine_steps: usize,

    mu: T,
    tau: T,
    mat: Option<CscMatrix<T>>,

    k_lu: Option<faer::linalg::solvers::PartialPivLu<T>>,
    c_minus_c2: Vec<T>,
    x1: Vec<T>,
    y1: Vec<T>,
    d1: T,
}

impl<T: FloatT> QrCholSystemSolver<T> {
    /// `qr_at` is the pivoted QR of `A^T` computed by `preprocess::preprocess`
    /// (`None` only when `model.p() == 0`, i.e. no equality rows to
    /// eliminate).
    pub fn new(qr_at: Option<PivotedQr<T>>, model: &Model<T>, refine_steps: usize) -> Self {
        let n = model.n();
        let p = model.p();
        let q = model.q();

        let (rank, q2) = match &qr_at {
            Some(qr) => {
                let r = qr.rank;
                (r, Mat::from_fn(n, n - r, |i, j| qr.q[(i, r + j)]))
            }
            None => (0, Mat::<T>::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })),
        };

        let x_range_b = match &qr_at {
            Some(qr) => qr_solve_min_norm_transpose(qr, &model.b),
            None => vec![T::zero(); n],
        };

        Self {
            n,
            p,
            q,
            qr_at,
            q2,
            rank,
            x_range_b,
            refine_steps,
            mu: T::one(),
            tau: T::one(),
            mat: None,
            k_lu: None,
            c_minus_c2: vec![T::zero(); n],
            x1: vec![T::zero(); n],
            y1: vec![T::zero(); p],
            d1: T::one(),
        }
    }

    /// `mu * G^T * Hess(s) * G * v` for an `n`-length `v`.
    fn apply_m(&self, model: &Model<T>, cones: &mut CompositeCone<T>, v: &[T]) -> Vec<T> {
        let mut gv = vec![T::zero(); self.q];
        model.g.gemv(&mut gv, MatrixShape::N, v, T::one(), T::zero());
        let mut hgv = vec![T::zero(); self.q];
        cones.hess_prod_blockwise(&gv, &mut hgv);
        let mut out = vec![T::zero(); self.n];
        model.g.gemv(&mut out, MatrixShape::T, &hgv, self.mu, T::zero());
        out
    }

    /// `mu * G^T * Hess(s) * qvec` for a `q`-length `qvec`.
    fn g_t_hess(&self, model: &Model<T>, cones: &mut CompositeCone<T>, qvec: &[T]) -> Vec<T> {
        let mut hq = vec![T::zero(); self.q];
        cones.hess_prod_blockwise(qvec, &mut hq);
        let mut out = vec![T::zero(); self.n];
        model.g.gemv(&mut out, MatrixShape::T, &hq, self.mu, T::zero());
        out
    }

    /// `Q2^T v` for an `n`-length `v`.
    fn project_null(&self, v: &[T]) -> Vec<T> {
        let vcol = Col::<T>::from_fn(self.n, |i| v[i]);
        let prod = self.q2.transpose() * &vcol;
        (0..self.n - self.rank).map(|i| prod[i]).collect()
    }

    /// `x_range + Q2 * v_null` for an `(n - rank)`-length `v_null`.
    fn lift_null(&self, x_range: &[T], v_null: &[T]) -> Vec<T> {
        let vcol = Col::<T>::from_fn(self.n - self.rank, |i| v_null[i]);
        let prod = &self.q2 * &vcol;
        (0..self.n).map(|i| x_range[i] + prod[i]).collect()
    }

    fn solve_y(&self, target: &[T]) -> Vec<T> {
        match &self.qr_at {
            Some(qr) => qr_solve_min_norm(qr, target),
            None => Vec::new(),
        }
    }

    /// `K v = g`, `K` the cached reduced-system factorization.
    fn solve_k(&self, g: &[T]) -> Result<Vec<T>, ConeSolverError> {
        let dim = self.n - self.rank;
        if dim == 0 {
            return Ok(Vec::new());
        }
        let lu = self.k_lu.as_ref().ok_or(ConeSolverError::NumericalFactorization)?;
        let mut col = Col::<T>::from_fn(dim, |i| g[i]);
        lu.solve_in_place(col.as_mut());
        Ok(col.as_slice().to_vec())
    }

    /// `out := M*x - rhs` for the currently-assembled reduced matrix,
    /// used only to drive iterative refinement of the direct null-space
    /// solve above.
    fn residual(&self, x: &[T], rhs: &[T], out: &mut [T]) {
        let m = self.mat.as_ref().expect("update_lhs must run before solve_system");
        out.iter_mut().for_each(|v| *v = T::zero());
        m.gemv(out, MatrixShape::N, x, T::one(), T::zero());
        for i in 0..out.len() {
            out[i] = out[i] - rhs[i];
        }
    }
}

impl<T: FloatT> SystemSolver<T> for QrCholSystemSolver<T> {
    fn update_lhs(
        &mut self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        mu: T,
        tau: T,
    ) -> Result<(), ConeSolverError> {
        self.mu = mu;
        self.tau = tau;

        let dim = self.n + self.p + self.q + 1;
        let trips = assemble_triplets(model, cones, mu, tau);
        self.mat = Some(triplets_to_csc(&trips, dim));

        let c2 = self.g_t_hess(model, cones, &model.h);
        let mut rhs_i1 = vec![T::zero(); self.n];
        for i in 0..self.n {
            rhs_i1[i] = model.c[i] + c2[i];
        }

        let m_x_range_b = self.apply_m(model, cones, &self.x_range_b);
        let mut rhs_proj = vec![T::zero(); self.n];
        for i in 0..self.n {
            rhs_proj[i] = rhs_i1[i] - m_x_range_b[i];
        }
        let g1 = self.project_null(&rhs_proj);

        let k_dim = self.n - self.rank;
        if k_dim > 0 {
            let mut mq2_cols = Vec::with_capacity(k_dim);
            for j in 0..k_dim {
                let col: Vec<T> = (0..self.n).map(|i| self.q2[(i, j)]).collect();
                mq2_cols.push(self.apply_m(model, cones, &col));
            }
            let mq2 = Mat::from_fn(self.n, k_dim, |i, j| mq2_cols[j][i]);
            let k_mat = self.q2.transpose() * &mq2;
            self.k_lu = Some(k_mat.partial_piv_lu());
        } else {
            self.k_lu = None;
        }

        let v1 = self.solve_k(&g1)?;
        let x1 = self.lift_null(&self.x_range_b, &v1);
        let m_x1 = self.apply_m(model, cones, &x1);
        let mut y_target = vec![T::zero(); self.n];
        for i in 0..self.n {
            y_target[i] = m_x1[i] - rhs_i1[i];
        }
        let y1 = self.solve_y(&y_target);

        let hq_h = {
            let mut hq = vec![T::zero(); self.q];
            cones.hess_prod_blockwise(&model.h, &mut hq);
            hq
        };
        let mu_hth = mu * model.h.dot(&hq_h);

        let mut c_minus_c2 = vec![T::zero(); self.n];
        for i in 0..self.n {
            c_minus_c2[i] = model.c[i] - c2[i];
        }
        self.d1 = c_minus_c2.dot(&x1) + model.b.dot(&y1) + mu_hth + mu / (tau * tau);

        self.c_minus_c2 = c_minus_c2;
        self.x1 = x1;
        self.y1 = y1;

        Ok(())
    }

    fn solve_system(
        &mut self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        rhs: &RhsBlocks<T>,
        dir: &mut Direction<T>,
    ) -> Result<(), ConeSolverError> {
        let full_rhs = assemble_rhs(model, cones, rhs, self.mu);
        let n = self.n;
        let p = self.p;
        let q = self.q;

        let b_x = &full_rhs[0..n];
        let b_y = &full_rhs[n..n + p];
        let b_z = &full_rhs[n + p..n + p + q];
        let b_tau = full_rhs[n + p + q];

        let sol = self.solve_reduced(model, cones, b_x, b_y, b_z, b_tau)?;

        let mut res = vec![T::zero(); full_rhs.len()];
        self.residual(&sol, &full_rhs, &mut res);
        let mut best = sol;
        let mut best_inf = res.norm_inf();
        let mut best_two = res.norm();
        for _ in 0..self.refine_steps {
            if best_inf == T::zero() {
                break;
            }
            let r_x = &res[0..n];
            let r_y = &res[n..n + p];
            let r_z = &res[n + p..n + p + q];
            let r_tau = res[n + p + q];
            let delta = match self.solve_reduced(model, cones, r_x, r_y, r_z, r_tau) {
                Ok(d) => d,
                Err(_) => break,
            };
            let mut candidate = best.clone();
            for i in 0..candidate.len() {
                candidate[i] = candidate[i] - delta[i];
            }
            let mut cand_res = vec![T::zero(); full_rhs.len()];
            self.residual(&candidate, &full_rhs, &mut cand_res);
            let cand_inf = cand_res.norm_inf();
            let cand_two = cand_res.norm();
            if cand_inf < best_inf && cand_two < best_two {
                best = candidate;
                res = cand_res;
                best_inf = cand_inf;
                best_two = cand_two;
            } else {
                break;
            }
        }

        unpack_solution(model, cones, &best, rhs, self.mu, self.tau, dir);
        Ok(())
    }
}

impl<T: FloatT> QrCholSystemSolver<T> {
    /// Solves the reduced system for a raw `(n, p, q, 1)`-split right-hand
    /// side, returning the full `n+p+q+1` solution vector. Shared by the
    /// initial solve and by residual-based iterative refinement.
    fn solve_reduced(
        &self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        b_x: &[T],
        b_y: &[T],
        b_z: &[T],
        b_tau: T,
    ) -> Result<Vec<T>, ConeSolverError> {
        let n = self.n;
        let p = self.p;
        let q = self.q;

        let g_t_hess_bz = self.g_t_hess(model, cones, b_z);
        let mut rhs_i0 = vec![T::zero(); n];
        for i in 0..n {
            rhs_i0[i] = b_x[i] - g_t_hess_bz[i];
        }

        let x_range_c = match &self.qr_at {
            Some(qr) => qr_solve_min_norm_transpose(qr, b_y),
            None => vec![T::zero(); n],
        };

        let m_x_range_c = self.apply_m(model, cones, &x_range_c);
        let mut g0 = vec![T::zero(); n];
        for i in 0..n {
            g0[i] = -(rhs_i0[i] + m_x_range_c[i]);
        }
        let g0_null = self.project_null(&g0);
        let v0 = self.solve_k(&g0_null)?;
        let x0 = self.lift_null(&x_range_c, &v0);

        let m_x0 = self.apply_m(model, cones, &x0);
        let mut y_target = vec![T::zero(); n];
        for i in 0..n {
            y_target[i] = rhs_i0[i] + m_x0[i];
        }
        let y0 = self.solve_y(&y_target);

        let mut hq_bz = vec![T::zero(); q];
        cones.hess_prod_blockwise(b_z, &mut hq_bz);
        let mu_hth_bz = self.mu * model.h.dot(&hq_bz);

        let n0 = b_tau - mu_hth_bz - self.c_minus_c2.dot(&x0) - model.b.dot(&y0);
        let tau_dir = n0 / self.d1;

        let mut x = vec![T::zero(); n];
        for i in 0..n {
            x[i] = x0[i] + tau_dir * self.x1[i];
        }
        let mut y = vec![T::zero(); p];
        for i in 0..p {
            y[i] = y0[i] + tau_dir * self.y1[i];
        }

        let mut gx = vec![T::zero(); q];
        model.g.gemv(&mut gx, MatrixShape::N, &x, T::one(), T::zero());
        let mut z_arg = vec![T::zero(); q];
        for i in 0..q {
            z_arg[i] = b_z[i] - gx[i] + model.h[i] * tau_dir;
        }
        let mut z = vec![T::zero(); q];
        cones.hess_prod_blockwise(&z_arg, &mut z);
        for i in 0..q {
            z[i] = z[i] * self.mu;
        }

        let mut sol = vec![T::zero(); n + p + q + 1];
        sol[0..n].copy_from_slice(&x);
        sol[n..n + p].copy_from_slice(&y);
        sol[n + p..n + p + q].copy_from_slice(&z);
        sol[n + p + q] = tau_dir;
        Ok(sol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::CscMatrix;
    use crate::cones::SupportedCone;

    #[test]
    fn solves_simple_lp_direction_with_no_equalities() {
        // n=1,p=0,q=1: A empty, G=[-1], Hinv for NonnegativeCone(1) at s=[1] is [1].
        let a = CscMatrix::<f64>::zeros(0, 1);
        let g = CscMatrix::from_dense_row_major(1, 1, &[-1.0]);
        let model = Model::new(a, vec![], g, vec![0.0], vec![1.0], 0.0, vec![
            SupportedCone::NonnegativeCone(1),
        ])
        .unwrap();
        let mut cones = model.cones();
        cones.load_points(&[1.0], &[1.0]);
        cones.reset_data();
        assert!(cones.all_feas());

        let mut solver = QrCholSystemSolver::<f64>::new(None, &model, 3);
        solver.update_lhs(&model, &mut cones, 1.0, 1.0).unwrap();

        let rhs = RhsBlocks {
            r_x: vec![0.0],
            r_y: vec![],
            r_z: vec![0.0],
            r_tau: 0.0,
            r_s: vec![-1.0],
            r_kappa: 0.0,
        };
        let mut dir = Direction::zeros(1, 0, 1);
        solver.solve_system(&model, &mut cones, &rhs, &mut dir).unwrap();
        assert!(dir.tau_dir.is_finite());
        assert!(dir.x_dir[0].is_finite());
    }

    #[test]
    fn solves_simple_lp_direction_with_one_equality() {
        // min x0 + x1 s.t. x0 + x1 = 1, x0 >= 0, x1 >= 0 (optimum at any
        // split summing to 1, e.g. x=(0.5,0.5)); exercises the rank-1 null
        // space reduction with p=1.
        use crate::algebra::dense::{dense_from_row_major, pivoted_qr};
        use crate::algebra::FloatT as _;

        let a = CscMatrix::<f64>::from_dense_row_major(1, 2, &[1.0, 1.0]);
        let g = CscMatrix::from_dense_row_major(2, 2, &[-1.0, 0.0, 0.0, -1.0]);
        let model = Model::new(a, vec![1.0], g, vec![0.0, 0.0], vec![1.0, 1.0], 0.0, vec![
            SupportedCone::NonnegativeCone(2),
        ])
        .unwrap();
        let mut cones = model.cones();
        cones.load_points(&[0.5, 0.5], &[1.0, 1.0]);
        cones.reset_data();
        assert!(cones.all_feas());

        let at = dense_from_row_major::<f64>(2, 1, &[1.0, 1.0]);
        let qr_at = pivoted_qr(&at, f64::rank_tol());

        let mut solver = QrCholSystemSolver::<f64>::new(Some(qr_at), &model, 3);
        solver.update_lhs(&model, &mut cones, 1.0, 1.0).unwrap();

        let rhs = RhsBlocks {
            r_x: vec![0.0, 0.0],
            r_y: vec![0.0],
            r_z: vec![0.0, 0.0],
            r_tau: 0.0,
            r_s: vec![-1.0, -1.0],
            r_kappa: 0.0,
        };
        let mut dir = Direction::zeros(2, 1, 2);
        solver.solve_system(&model, &mut cones, &rhs, &mut dir).unwrap();
        assert!(dir.tau_dir.is_finite());
        assert!(dir.x_dir[0].is_finite());
        assert!(dir.y_dir[0].is_finite());
        // A x_dir - b*tau_dir = -r_y = 0, with A = [1, 1], b = [1].
        assert!((dir.x_dir[0] + dir.x_dir[1] - dir.tau_dir).abs() < 1e-6);
    }
}
