//! Solver status codes.

/// The outcome of a solve call, or the current lifecycle stage before one
/// completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    NotLoaded,
    Loaded,
    SolveCalled,
    Optimal,
    PrimalInfeasible,
    DualInfeasible,
    PrimalInconsistent,
    DualInconsistent,
    IllPosed,
    SlowProgress,
    IterationLimit,
    TimeLimit,
    NumericalFailure,
}

impl SolverStatus {
    /// Whether this status terminates the main loop (everything except the
    /// pre-solve lifecycle states and `SolveCalled`).
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            SolverStatus::NotLoaded | SolverStatus::Loaded | SolverStatus::SolveCalled
        )
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
