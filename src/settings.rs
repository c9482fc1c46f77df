//! Solver options. A plain settings struct with `Default`, builder-style
//! `with_*` setters, and a `validate` pass — no procedural-macro option
//! system, just a flat struct of tunables.

use crate::algebra::FloatT;

/// Which `SystemSolver` implementation backs the Newton system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SystemSolverKind {
    Naive,
    QrChol,
}

impl Default for SystemSolverKind {
    fn default() -> Self {
        SystemSolverKind::QrChol
    }
}

/// Recognized solver options
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverSettings<T: FloatT> {
    pub verbose: bool,
    pub iter_limit: usize,
    pub time_limit: std::time::Duration,

    pub tol_rel_opt: T,
    pub tol_abs_opt: T,
    pub tol_feas: T,
    pub tol_slow: T,

    pub preprocess: bool,
    /// Build the initial `x`/`y` from conjugate-gradient least squares
    /// instead of a direct pivoted-QR solve.
    pub init_use_iterative: bool,
    pub init_tol_qr: T,
    /// When `init_use_iterative` fails to converge, fall back to the direct
    /// QR solve rather than accepting the unconverged iterate.
    pub init_use_fallback: bool,

    pub max_nbhd: T,
    pub use_infty_nbhd: bool,
    pub system_solver: SystemSolverKind,

    /// Predictor/centering switch threshold `beta_c`.
    pub beta_c: T,
    /// Minimum neighborhood deviation `beta_min` used by the line search's
    /// per-cone complementarity floor.
    pub beta_min: T,
    /// Number of iterative-refinement steps attempted per linear solve
    ///.
    pub refine_steps: usize,
    /// Floor on the line-search step length for a combined direction.
    pub alpha_min: T,
    /// Floor on the line-search step length for a pure correction-only
    /// direction.
    pub alpha_min_correction: T,
}

impl<T: FloatT> Default for SolverSettings<T> {
    fn default() -> Self {
        Self {
            verbose: false,
            iter_limit: 200,
            time_limit: std::time::Duration::from_secs(3600),

            tol_rel_opt: T::from(1e-8).unwrap(),
            tol_abs_opt: T::from(1e-8).unwrap(),
            tol_feas: T::from(1e-8).unwrap(),
            tol_slow: T::from(1e-3).unwrap(),

            preprocess: true,
            init_use_iterative: false,
            init_tol_qr: T::rank_tol(),
            init_use_fallback: true,

            max_nbhd: T::from(0.7).unwrap(),
            use_infty_nbhd: false,
            system_solver: SystemSolverKind::QrChol,

            beta_c: T::from(0.04).unwrap(),
            beta_min: T::from(0.1).unwrap(),
            refine_steps: 3,
            alpha_min: T::from(1e-3).unwrap(),
            alpha_min_correction: T::from(1e-6).unwrap(),
        }
    }
}

impl<T: FloatT> SolverSettings<T> {
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_iter_limit(mut self, n: usize) -> Self {
        self.iter_limit = n;
        self
    }

    pub fn with_time_limit(mut self, d: std::time::Duration) -> Self {
        self.time_limit = d;
        self
    }

    pub fn with_system_solver(mut self, kind: SystemSolverKind) -> Self {
        self.system_solver = kind;
        self
    }

    pub fn with_preprocess(mut self, enabled: bool) -> Self {
        self.preprocess = enabled;
        self
    }

    /// Validates cross-option constraints that aren't representable in the
    /// type alone: `QRChol` requires
    /// preprocessing to have run).
    pub fn validate(&self) -> Result<(), crate::error::ConeSolverError> {
        if self.system_solver == SystemSolverKind::QrChol && !self.preprocess {
            return Err(crate::error::ConeSolverError::Configuration(
                "QRChol system solver requires preprocess = true",
            ));
        }
        Ok(())
    }
}
