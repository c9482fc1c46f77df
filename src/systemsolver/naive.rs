//! The naive system solver: assembles the full reduced
//! system as a sparse matrix each iteration and solves with sparse LDLT,
//! falling back to sparse LU if the LDLT factorization reports a
//! singular/indefinite pivot. Usable with any model, preprocessed or not.

use super::{assemble_rhs, assemble_triplets, triplets_to_csc, unpack_solution, RhsBlocks, SystemSolver};
use crate::algebra::sparse::{SparseLdlCache, SparseLuCache};
use crate::algebra::{CscMatrix, FloatT, MatrixMath, MatrixShape, VectorMath};
use crate::cones::CompositeCone;
use crate::direction::Direction;
use crate::error::ConeSolverError;
use crate::model::Model;

pub struct NaiveSystemSolver<T: FloatT> {
    dim: usize,
    ldl: SparseLdlCache<T>,
    lu: SparseLuCache<T>,
    use_lu: bool,
    mu: T,
    tau: T,
    mat: Option<CscMatrix<T>>,
    refine_steps: usize,
}

impl<T: FloatT> NaiveSystemSolver<T> {
    pub fn new(n: usize, p: usize, q: usize, refine_steps: usize) -> Self {
        Self {
            dim: n + p + q + 1,
            ldl: SparseLdlCache::new(),
            lu: SparseLuCache::new(),
            use_lu: false,
            mu: T::one(),
            tau: T::one(),
            mat: None,
            refine_steps,
        }
    }

    /// `out := M*x - rhs` for the currently-factorized reduced matrix.
    fn residual(&self, x: &[T], rhs: &[T], out: &mut [T]) {
        let m = self.mat.as_ref().expect("update_lhs must run before solve_system");
        out.iter_mut().for_each(|v| *v = T::zero());
        m.gemv(out, MatrixShape::N, x, T::one(), T::zero());
        for i in 0..out.len() {
            out[i] = out[i] - rhs[i];
        }
    }
}

impl<T: FloatT> SystemSolver<T> for NaiveSystemSolver<T> {
    fn update_lhs(
        &mut self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        mu: T,
        tau: T,
    ) -> Result<(), ConeSolverError> {
        self.mu = mu;
        self.tau = tau;
        let trips = assemble_triplets(model, cones, mu, tau);
        let m = triplets_to_csc(&trips, self.dim);

        let result = if self.ldl.factorize(&m).is_ok() {
            self.use_lu = false;
            Ok(())
        } else {
            self.use_lu = true;
            self.lu.factorize(&m)
        };
        self.mat = Some(m);
        result
    }

    fn solve_system(
        &mut self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        rhs: &RhsBlocks<T>,
        dir: &mut Direction<T>,
    ) -> Result<(), ConeSolverError> {
        let full_rhs = assemble_rhs(model, cones, rhs, self.mu);

        let mut sol = vec![T::zero(); self.dim];
        if self.use_lu {
            self.lu.solve(&full_rhs, &mut sol)?;
        } else {
            self.ldl.solve(&full_rhs, &mut sol)?;
        }

        // Iterative refinement: apply the LHS
        // operator to the candidate, solve for a correction against the
        // residual, keep it only if it strictly reduces both norms.
        let mut res = vec![T::zero(); self.dim];
        self.residual(&sol, &full_rhs, &mut res);
        let mut best_inf = res.norm_inf();
        let mut best_two = res.norm();
        for _ in 0..self.refine_steps {
            if best_inf == T::zero() {
                break;
            }
            let mut delta = vec![T::zero(); self.dim];
            let solved = if self.use_lu {
                self.lu.solve(&res, &mut delta)
            } else {
                self.ldl.solve(&res, &mut delta)
            };
            if solved.is_err() {
                break;
            }
            let mut candidate = sol.clone();
            for i in 0..self.dim {
                candidate[i] = candidate[i] - delta[i];
            }
            let mut cand_res = vec![T::zero(); self.dim];
            self.residual(&candidate, &full_rhs, &mut cand_res);
            let cand_inf = cand_res.norm_inf();
            let cand_two = cand_res.norm();
            if cand_inf < best_inf && cand_two < best_two {
                sol = candidate;
                res = cand_res;
                best_inf = cand_inf;
                best_two = cand_two;
            } else {
                break;
            }
        }

        unpack_solution(model, cones, &sol, rhs, self.mu, self.tau, dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::CscMatrix;
    use crate::cones::SupportedCone;

    #[test]
    fn solves_simple_lp_direction() {
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

        let mut solver = NaiveSystemSolver::<f64>::new(1, 0, 1, 3);
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
}
