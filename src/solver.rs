//! The solver orchestrator: preprocessing and initial point, the iteration loop,
//! termination polling, and the public solution accessors.

use crate::algebra::dense::PivotedQr;
use crate::algebra::{FloatT, VectorMath};
use crate::cones::CompositeCone;
use crate::error::ConeSolverError;
use crate::model::Model;
use crate::point::Point;
use crate::preprocess::{check_consistency, initial_point, preprocess};
use crate::residuals::Residuals;
use crate::settings::{SolverSettings, SystemSolverKind};
use crate::status::SolverStatus;
use crate::stepper::Stepper;
use crate::systemsolver::naive::NaiveSystemSolver;
use crate::systemsolver::qrchol::QrCholSystemSolver;
use crate::systemsolver::SystemSolver;

fn make_system_solver<T: FloatT>(
    kind: SystemSolverKind,
    model: &Model<T>,
    qr_at: Option<PivotedQr<T>>,
    refine_steps: usize,
) -> Box<dyn SystemSolver<T>> {
    match kind {
        SystemSolverKind::Naive => Box::new(NaiveSystemSolver::new(model.n(), model.p(), model.q(), refine_steps)),
        SystemSolverKind::QrChol => Box::new(QrCholSystemSolver::new(qr_at, model, refine_steps)),
    }
}

/// The public solver handle. Owns the model, cones and
/// iterate exclusively for the duration of a solve.
pub struct Solver<T: FloatT> {
    settings: SolverSettings<T>,
    model: Option<Model<T>>,
    cones: Option<CompositeCone<T>>,
    point: Option<Point<T>>,
    status: SolverStatus,
    iterations: usize,
    solve_time: std::time::Duration,
    p_obj: T,
    d_obj: T,
}

impl<T: FloatT> Solver<T> {
    pub fn new(settings: SolverSettings<T>) -> Self {
        Self {
            settings,
            model: None,
            cones: None,
            point: None,
            status: SolverStatus::NotLoaded,
            iterations: 0,
            solve_time: std::time::Duration::ZERO,
            p_obj: T::zero(),
            d_obj: T::zero(),
        }
    }

    pub fn load(&mut self, model: Model<T>) -> Result<(), ConeSolverError> {
        self.settings.validate()?;
        self.model = Some(model);
        self.status = SolverStatus::Loaded;
        Ok(())
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }
    pub fn iterations(&self) -> usize {
        self.iterations
    }
    pub fn solve_time(&self) -> std::time::Duration {
        self.solve_time
    }
    pub fn primal_objective(&self) -> T {
        self.p_obj
    }
    pub fn dual_objective(&self) -> T {
        self.d_obj
    }

    pub fn x(&self) -> Vec<T> {
        self.point.as_ref().map(Point::unembed_x).unwrap_or_default()
    }
    pub fn s(&self) -> Vec<T> {
        self.point.as_ref().map(Point::unembed_s).unwrap_or_default()
    }
    pub fn z(&self) -> Vec<T> {
        self.point.as_ref().map(Point::unembed_z).unwrap_or_default()
    }
    pub fn y(&self) -> Vec<T> {
        self.point
            .as_ref()
            .map(|p| {
                let mut v = p.y.clone();
                v.scale(T::one() / p.tau);
                v
            })
            .unwrap_or_default()
    }
    pub fn tau(&self) -> T {
        self.point.as_ref().map(|p| p.tau).unwrap_or(T::zero())
    }
    pub fn kappa(&self) -> T {
        self.point.as_ref().map(|p| p.kappa).unwrap_or(T::zero())
    }
    pub fn mu(&self) -> T {
        match (&self.point, &self.cones) {
            (Some(p), Some(c)) => p.mu(c),
            _ => T::zero(),
        }
    }

    /// Runs the solve loop to completion.
    pub fn solve(&mut self) -> SolverStatus {
        let start = std::time::Instant::now();
        if self.model.is_none() {
            return self.status;
        }
        self.status = SolverStatus::SolveCalled;

        let model = self.model.take().unwrap();

        let mut qr_at = None;
        if self.settings.preprocess {
            let pre = preprocess(&model, self.settings.init_tol_qr);
            if let Err(e) = check_consistency(&pre) {
                self.status = match e {
                    ConeSolverError::Inconsistent("primal") => SolverStatus::PrimalInconsistent,
                    ConeSolverError::Inconsistent(_) => SolverStatus::DualInconsistent,
                    _ => SolverStatus::NumericalFailure,
                };
                self.model = Some(model);
                return self.status;
            }
            qr_at = pre.qr_at;
        }

        let mut cones = model.cones();
        let mut point = initial_point(&model, &mut cones, &self.settings);
        let mut residuals = Residuals::zeros(model.n(), model.p(), model.q());
        let mut stepper = Stepper::new(model.n(), model.p(), model.q());
        let mut system_solver = make_system_solver::<T>(self.settings.system_solver, &model, qr_at, self.settings.refine_steps);

        let mut prev_mu = point.mu(&cones);
        let mut slow_strikes = 0usize;
        residuals.update(&model, &point);

        let result_status = loop {
            if let Some(done) = self.check_termination(&model, &cones, &point, &residuals) {
                break done;
            }
            if self.iterations >= self.settings.iter_limit {
                break SolverStatus::IterationLimit;
            }
            if start.elapsed() >= self.settings.time_limit {
                break SolverStatus::TimeLimit;
            }

            let alpha = match stepper.step(&model, &mut cones, system_solver.as_mut(), &self.settings, &mut point, &mut residuals) {
                Ok(a) => a,
                Err(_) => break SolverStatus::NumericalFailure,
            };
            self.iterations += 1;
            residuals.update(&model, &point);

            let mu = point.mu(&cones);
            let improvement = if prev_mu > T::zero() { (prev_mu - mu) / prev_mu } else { T::zero() };
            if improvement < self.settings.tol_slow {
                slow_strikes += 1;
                if slow_strikes >= 2 {
                    break SolverStatus::SlowProgress;
                }
            } else {
                slow_strikes = 0;
            }
            prev_mu = mu;

            if self.settings.verbose {
                let inv_tau = T::one() / point.tau;
                let p_obj = model.c.dot(&point.x) * inv_tau + model.obj_offset;
                let d_obj = -(model.b.dot(&point.y) + model.h.dot(&point.z)) * inv_tau + model.obj_offset;
                let gap = p_obj - d_obj;
                let pres = residuals.norm_y.max(residuals.norm_z);
                let dres = residuals.norm_x;
                tracing::info!(
                    iter = self.iterations,
                    pcost = ?p_obj,
                    dcost = ?d_obj,
                    gap = ?gap,
                    pres = ?pres,
                    dres = ?dres,
                    tau = ?point.tau,
                    kappa = ?point.kappa,
                    mu = ?mu,
                    step = ?alpha,
                    time = ?start.elapsed(),
                    "concore iteration"
                );
            }
        };

        residuals.update(&model, &point);
        self.update_objectives(&model, &point);
        self.status = result_status;
        self.solve_time = start.elapsed();
        self.point = Some(point);
        self.cones = Some(cones);
        self.model = Some(model);

        tracing::info!(status = ?self.status, iterations = self.iterations, "concore terminated");
        self.status
    }

    fn update_objectives(&mut self, model: &Model<T>, point: &Point<T>) {
        let inv_tau = T::one() / point.tau;
        self.p_obj = model.c.dot(&point.x) * inv_tau + model.obj_offset;
        self.d_obj = -(model.b.dot(&point.y) + model.h.dot(&point.z)) * inv_tau + model.obj_offset;
    }

    fn check_termination(
        &mut self,
        model: &Model<T>,
        cones: &CompositeCone<T>,
        point: &Point<T>,
        residuals: &Residuals<T>,
    ) -> Option<SolverStatus> {
        if point.tau <= T::zero() || point.kappa <= T::zero() {
            return None;
        }

        let inv_tau = T::one() / point.tau;
        let p_obj = model.c.dot(&point.x) * inv_tau + model.obj_offset;
        let d_obj = -(model.b.dot(&point.y) + model.h.dot(&point.z)) * inv_tau + model.obj_offset;
        let gap = p_obj - d_obj;
        let denom = T::one().max(p_obj.abs().min(d_obj.abs()));
        let rel_gap = gap.abs() / denom;

        let feas = residuals.norm_x.max(residuals.norm_y).max(residuals.norm_z);
        if feas <= self.settings.tol_feas && (gap.abs() <= self.settings.tol_abs_opt || rel_gap <= self.settings.tol_rel_opt) {
            return Some(SolverStatus::Optimal);
        }

        // HSD infeasibility/ill-posedness certificates: tau collapsing to
        // zero relative to kappa signals a degenerate embedding; the sign
        // of the corresponding Farkas-style functional distinguishes primal
        // from dual infeasibility.
        if point.tau < self.settings.tol_feas * point.kappa.max(T::one()) {
            let by_hz = model.b.dot(&point.y) + model.h.dot(&point.z);
            let cx = model.c.dot(&point.x);
            return Some(if -by_hz > self.settings.tol_feas && cx.abs() < self.settings.tol_feas {
                SolverStatus::PrimalInfeasible
            } else if cx < -self.settings.tol_feas && by_hz.abs() < self.settings.tol_feas {
                SolverStatus::DualInfeasible
            } else {
                SolverStatus::IllPosed
            });
        }

        let _ = cones;
        None
    }
}
