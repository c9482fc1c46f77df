//! Internal error type for `concore`. All fallible internal operations return
//! `Result<_, ConeSolverError>`; the orchestrator (`src/solver.rs`) is the
//! only place that converts these into a terminal `SolverStatus` — callers
//! of the public API never see this type directly.

/// Errors produced by the numerical core. `DomainFeasibility` never escapes
/// the cone layer: it is consumed by the line search, which reduces `alpha`
/// and retries. Every other variant is terminal for the
/// solve.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConeSolverError {
    #[error("cone is not strictly feasible at the loaded point")]
    DomainFeasibility,

    #[error("factorization lost positive-definiteness or became singular")]
    NumericalFactorization,

    #[error("two consecutive iterations made insufficient progress")]
    SlowProgress,

    #[error("preprocessing detected an inconsistent {0} system")]
    Inconsistent(&'static str),

    #[error("solver configuration error: {0}")]
    Configuration(&'static str),
}
