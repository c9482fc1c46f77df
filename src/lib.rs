//! `concore`: a primal-dual interior-point solver for general conic
//! optimization problems, built on the homogeneous self-dual embedding and
//! logarithmically-homogeneous self-concordant barriers.
//!
//! ```text
//! minimize   c'x + obj_offset
//! subject to Ax = b
//!            Gx + s = h,  s in K
//! ```
//!
//! where `K` is a Cartesian product of convex cones (nonnegative orthant,
//! second-order, exponential/power, positive semidefinite, and the other
//! cones in [`cones`]). The public entry point is [`solver::Solver`]: build a
//! [`model::Model`] from `(A, b, G, h, c)` plus an ordered cone list, load it,
//! and call [`solver::Solver::solve`].

pub mod algebra;
pub mod cones;
pub mod direction;
pub mod error;
pub mod model;
pub mod point;
pub mod preprocess;
pub mod residuals;
pub mod settings;
pub mod solver;
pub mod status;
pub mod stepper;
pub mod systemsolver;

pub use cones::SupportedCone;
pub use error::ConeSolverError;
pub use model::Model;
pub use settings::{SolverSettings, SystemSolverKind};
pub use solver::Solver;
pub use status::SolverStatus;
