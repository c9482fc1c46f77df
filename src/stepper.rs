//! The predictor-corrector HSD stepper, one iteration per
//! call to [`Stepper::step`]. Follows a "pure predict/center branching"
//! policy rather than a weighted-combined-direction alternative
//! (`DESIGN.md` records this choice).

use crate::algebra::{FloatT, VectorMath};
use crate::cones::CompositeCone;
use crate::direction::Direction;
use crate::error::ConeSolverError;
use crate::model::Model;
use crate::point::Point;
use crate::residuals::Residuals;
use crate::settings::SolverSettings;
use crate::systemsolver::{RhsBlocks, SystemSolver};

/// Per-solve stepper state: only the previous accepted step length, reused
/// to initialize the next line search.
pub struct Stepper<T: FloatT> {
    alpha_prev: T,
    dir: Direction<T>,
    corr_dir: Direction<T>,
}

impl<T: FloatT> Stepper<T> {
    pub fn new(n: usize, p: usize, q: usize) -> Self {
        Self {
            alpha_prev: T::one(),
            dir: Direction::zeros(n, p, q),
            corr_dir: Direction::zeros(n, p, q),
        }
    }

    /// Runs one full iteration: refresh cones, update the LHS, build and
    /// solve the predict-or-center RHS (with an optional correction round),
    /// line-search for `alpha`, and commit the step. Returns the accepted
    /// step length.
    pub fn step<S: SystemSolver<T>>(
        &mut self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        solver: &mut S,
        settings: &SolverSettings<T>,
        point: &mut Point<T>,
        residuals: &mut Residuals<T>,
    ) -> Result<T, ConeSolverError> {
        let mu = point.mu(cones);
        if mu <= T::zero() {
            return Err(ConeSolverError::NumericalFactorization);
        }
        let rt = mu.sqrt();

        cones.load_points(&point.s, &point.z);
        cones.rescale_points(T::one() / rt);
        if !cones.all_feas() {
            return Err(ConeSolverError::DomainFeasibility);
        }

        solver.update_lhs(model, cones, mu, point.tau)?;
        residuals.update(model, point);

        let centering = !cones.all_in_neighborhood(mu, settings.beta_c, settings.use_infty_nbhd);

        let mut rhs = if centering {
            self.center_rhs(model, cones, point, mu)
        } else {
            self.predict_rhs(model, point, residuals)
        };

        solver.solve_system(model, cones, &rhs, &mut self.dir)?;
        self.apply_correction_round(model, cones, solver, &mut rhs)?;

        tracing::debug!(mu = ?mu, centering, "stepper: direction solved");

        let alpha = self.line_search(model, cones, settings, point, mu)?;

        point.x.axpby(alpha, &self.dir.x_dir, T::one());
        point.y.axpby(alpha, &self.dir.y_dir, T::one());
        point.z.axpby(alpha, &self.dir.z_dir, T::one());
        point.s.axpby(alpha, &self.dir.s_dir, T::one());
        point.tau = point.tau + alpha * self.dir.tau_dir;
        point.kappa = point.kappa + alpha * self.dir.kappa_dir;

        let mu_new = point.mu(cones);
        if point.tau <= T::zero() || point.kappa <= T::zero() || mu_new <= T::zero() {
            return Err(ConeSolverError::NumericalFactorization);
        }

        self.alpha_prev = alpha;
        tracing::debug!(alpha = ?alpha, mu = ?mu_new, "stepper: step committed");
        Ok(alpha)
    }

    fn predict_rhs(&self, model: &Model<T>, point: &Point<T>, residuals: &Residuals<T>) -> RhsBlocks<T> {
        let mut rhs = RhsBlocks::zeros(model.n(), model.p(), model.q());
        rhs.r_x.copy_from(&residuals.r_x);
        rhs.r_y.copy_from(&residuals.r_y);
        rhs.r_z.copy_from(&residuals.r_z);
        rhs.r_tau = point.kappa + model.c.dot(&point.x) - model.b.dot(&point.y) - model.h.dot(&point.z);
        rhs.r_s.copy_from(&point.z);
        rhs.r_s.negate();
        rhs.r_kappa = -point.kappa;
        rhs
    }

    fn center_rhs(&self, model: &Model<T>, cones: &mut CompositeCone<T>, point: &Point<T>, mu: T) -> RhsBlocks<T> {
        let mut rhs = RhsBlocks::zeros(model.n(), model.p(), model.q());
        let mut g = vec![T::zero(); model.q()];
        cones.grad_blockwise(&mut g);
        let sqrt_mu = mu.sqrt();
        for i in 0..rhs.r_s.len() {
            rhs.r_s[i] = -point.z[i] - sqrt_mu * g[i];
        }
        rhs.r_kappa = -point.kappa + mu / point.tau;
        rhs
    }

    /// Adds each cone's third-order `correction(dir_k)` (oriented according
    /// to `use_dual_barrier`) into `rhs.r_s` and re-solves. Cones with
    /// `use_correction() == false` contribute zero, so this is always safe
    /// to run rather than conditionally skipped.
    fn apply_correction_round<S: SystemSolver<T>>(
        &mut self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        solver: &mut S,
        rhs: &mut RhsBlocks<T>,
    ) -> Result<(), ConeSolverError> {
        let q = model.q();
        let mut dir_arg = vec![T::zero(); q];
        for k in 0..cones.len() {
            let rng = cones.range(k);
            let src = if cones.use_dual_barrier(k) {
                &self.dir.z_dir[rng.clone()]
            } else {
                &self.dir.s_dir[rng.clone()]
            };
            dir_arg[rng].copy_from_slice(src);
        }
        let mut corr = vec![T::zero(); q];
        cones.correction_blockwise(&dir_arg, &mut corr);
        if corr.iter().all(|&x| x == T::zero()) {
            return Ok(());
        }
        for i in 0..q {
            rhs.r_s[i] = rhs.r_s[i] + corr[i];
        }
        solver.solve_system(model, cones, rhs, &mut self.corr_dir)?;
        self.dir = self.corr_dir.clone();
        Ok(())
    }

    fn line_search(
        &self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        settings: &SolverSettings<T>,
        point: &Point<T>,
        mu: T,
    ) -> Result<T, ConeSolverError> {
        let eps = T::epsilon();
        let q = model.q();
        let mut alpha = (self.alpha_prev * T::from(1.4).unwrap()).min(T::one());
        if self.dir.tau_dir < T::zero() {
            alpha = alpha.min(-point.tau / self.dir.tau_dir * T::from(0.9999).unwrap());
        }
        if self.dir.kappa_dir < T::zero() {
            alpha = alpha.min(-point.kappa / self.dir.kappa_dir * T::from(0.9999).unwrap());
        }

        let backtrack = T::from(0.9).unwrap();
        let mut s_trial = vec![T::zero(); q];
        let mut z_trial = vec![T::zero(); q];

        loop {
            if alpha < settings.alpha_min {
                return Err(ConeSolverError::NumericalFactorization);
            }

            let tau_trial = point.tau + alpha * self.dir.tau_dir;
            let kappa_trial = point.kappa + alpha * self.dir.kappa_dir;
            for i in 0..q {
                s_trial[i] = point.s[i] + alpha * self.dir.s_dir[i];
                z_trial[i] = point.z[i] + alpha * self.dir.z_dir[i];
            }
            let mu_trial = cones.mu(&s_trial, &z_trial, tau_trial, kappa_trial);

            let mut ok = tau_trial * kappa_trial > eps && mu_trial > eps;
            if ok {
                for k in 0..cones.len() {
                    let rng = cones.range(k);
                    let sz = s_trial[rng.clone()].dot(&z_trial[rng.clone()]);
                    if sz <= eps || sz < settings.beta_min * mu_trial * cones.iter().nth(k).unwrap().nu() {
                        ok = false;
                        break;
                    }
                }
            }
            if ok && (tau_trial * kappa_trial - mu_trial).abs() > settings.max_nbhd * mu_trial {
                ok = false;
            }

            if ok {
                let rt_trial = mu_trial.sqrt();
                cones.load_points(&s_trial, &z_trial);
                cones.rescale_points(T::one() / rt_trial);
                ok = cones.all_feas()
                    && cones.all_dual_feas()
                    && cones.all_in_neighborhood(mu_trial, settings.max_nbhd, settings.use_infty_nbhd);
            }

            if ok {
                return Ok(alpha);
            }
            alpha = alpha * backtrack;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::CscMatrix;
    use crate::cones::SupportedCone;
    use crate::preprocess::initial_point;
    use crate::systemsolver::naive::NaiveSystemSolver;

    #[test]
    fn one_step_reduces_duality_gap_for_trivial_lp() {
        // min x s.t. x >= 1 -> optimal x=1.
        let a = CscMatrix::<f64>::zeros(0, 1);
        let g = CscMatrix::from_dense_row_major(1, 1, &[-1.0]);
        let model = Model::new(a, vec![], g, vec![-1.0], vec![1.0], 0.0, vec![
            SupportedCone::NonnegativeCone(1),
        ])
        .unwrap();
        let mut cones = model.cones();
        let settings = SolverSettings::<f64>::default();
        let mut point = initial_point(&model, &mut cones, &settings);
        let mut residuals = Residuals::zeros(1, 0, 1);
        let mut solver = NaiveSystemSolver::new(1, 0, 1, settings.refine_steps);
        let mut stepper = Stepper::new(1, 0, 1);

        let mu0 = point.mu(&cones);
        let alpha = stepper
            .step(&model, &mut cones, &mut solver, &settings, &mut point, &mut residuals)
            .unwrap();
        assert!(alpha > 0.0);
        assert!(point.mu(&cones) <= mu0 * 1.5);
    }
}
