//! Newton/HSD system solvers. Two
//! implementations share the reduced symmetric system obtained by
//! eliminating `s` via `s_k = (1/mu) * hess F(s_k)^-1 * (r_{s,k} - z_dir_k)`:
//! a **naive** solver that assembles the full sparse system and factorizes
//! with sparse LDLT (falling back to LU), and a **QR-Cholesky** solver that
//! assembles the same system densely, intended for use after preprocessing
//! has shrunk the model to full rank.
//!
//! Both share the triplet-assembly logic in this module (`assemble_triplets`)
//! so the two backends only differ in how they factorize the resulting
//! `(n+p+q+1) x (n+p+q+1)` matrix.

pub mod naive;
pub mod qrchol;

use crate::algebra::FloatT;
use crate::cones::CompositeCone;
use crate::direction::Direction;
use crate::error::ConeSolverError;
use crate::model::Model;

/// The right-hand side of one Newton solve predict/center
/// branches. `r_s` is the full `q`-length per-cone equation RHS
/// (`r_{s,k} = -z_k` for predict, `-z_k - sqrt(mu)*g_k` for center, each
/// optionally bumped by a correction term).
#[derive(Debug, Clone)]
pub struct RhsBlocks<T: FloatT> {
    pub r_x: Vec<T>,
    pub r_y: Vec<T>,
    pub r_z: Vec<T>,
    pub r_tau: T,
    pub r_s: Vec<T>,
    pub r_kappa: T,
}

impl<T: FloatT> RhsBlocks<T> {
    pub fn zeros(n: usize, p: usize, q: usize) -> Self {
        Self {
            r_x: vec![T::zero(); n],
            r_y: vec![T::zero(); p],
            r_z: vec![T::zero(); q],
            r_tau: T::zero(),
            r_s: vec![T::zero(); q],
            r_kappa: T::zero(),
        }
    }
}

/// `update_lhs`/`solve_system` contract. `mu`/`tau` are
/// passed explicitly rather than read off a stored `Point` because the
/// reduced system's `z`-block and `tau`-row entries depend on them directly
/// and the stepper refreshes both once per iteration.
pub trait SystemSolver<T: FloatT> {
    fn update_lhs(
        &mut self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        mu: T,
        tau: T,
    ) -> Result<(), ConeSolverError>;

    fn solve_system(
        &mut self,
        model: &Model<T>,
        cones: &mut CompositeCone<T>,
        rhs: &RhsBlocks<T>,
        dir: &mut Direction<T>,
    ) -> Result<(), ConeSolverError>;
}

/// One nonzero entry of the symmetrized reduced system, in
/// `(row, col, value)` form, row/col indexed over the full
/// `n + p + q + 1` block layout (`x | y | z | tau`).
pub(crate) type Triplet<T> = (usize, usize, T);

/// Builds the symmetrized reduced KKT triplets shared by both system
/// solvers:
///
/// ```text
/// [ 0   A^T   G^T        c      ] [x]   [ r_x        ]
/// [ A   0     0         -b      ] [y] = [-r_y        ]
/// [ G   0     Hinv/mu   -h      ] [z]   [-r_z_reduced]
/// [ c^T b^T   h^T        mu/tau2] [tau] [ r_kappa-r_tau]
/// ```
///
/// obtained from the unsymmetrized system by negating the `y`, `z` and
/// `tau` block-rows, which aligns `A`/`A^T`, `G`/`G^T` and `c`/`c^T` into
/// matching transposed pairs.
pub(crate) fn assemble_triplets<T: FloatT>(
    model: &Model<T>,
    cones: &mut CompositeCone<T>,
    mu: T,
    tau: T,
) -> Vec<Triplet<T>> {
    let n = model.n();
    let p = model.p();
    let q = model.q();
    let mut trips: Vec<Triplet<T>> = Vec::new();

    push_csc_block(&mut trips, 0, n, &model.a, true, T::one());
    push_csc_block(&mut trips, 0, n + p, &model.g, true, T::one());
    for i in 0..n {
        if model.c[i] != T::zero() {
            trips.push((i, n + p + q, model.c[i]));
        }
    }

    push_csc_block(&mut trips, n, 0, &model.a, false, T::one());
    for i in 0..p {
        if model.b[i] != T::zero() {
            trips.push((n + i, n + p + q, -model.b[i]));
        }
    }

    push_csc_block(&mut trips, n + p, 0, &model.g, false, T::one());
    for i in 0..q {
        if model.h[i] != T::zero() {
            trips.push((n + p + i, n + p + q, -model.h[i]));
        }
    }

    for k in 0..cones.len() {
        let rng = cones.range(k);
        let d = rng.len();
        if d == 0 {
            continue;
        }
        let block = cones.dense_inv_hess_block(k);
        push_dense_block(&mut trips, n + p + rng.start, n + p + rng.start, &block, d, T::one() / mu);
    }

    trips.push((n + p + q, n + p + q, mu / (tau * tau)));
    trips
}

fn push_dense_block<T: FloatT>(
    trips: &mut Vec<Triplet<T>>,
    row0: usize,
    col0: usize,
    block: &[T],
    d: usize,
    scale: T,
) {
    for i in 0..d {
        for j in 0..d {
            let v = block[i * d + j] * scale;
            if v != T::zero() {
                trips.push((row0 + i, col0 + j, v));
            }
        }
    }
}

fn push_csc_block<T: FloatT>(
    trips: &mut Vec<Triplet<T>>,
    row_base: usize,
    col_base: usize,
    m: &crate::algebra::CscMatrix<T>,
    transpose: bool,
    scale: T,
) {
    for j in 0..m.n {
        for k in m.colptr[j]..m.colptr[j + 1] {
            let i = m.rowval[k];
            let v = m.nzval[k] * scale;
            if v == T::zero() {
                continue;
            }
            if transpose {
                trips.push((row_base + j, col_base + i, v));
            } else {
                trips.push((row_base + i, col_base + j, v));
            }
        }
    }
}

/// Reduces `rhs.r_z` by `(1/mu) * Hinv_k . r_{s,k}` per cone and assembles
/// the full `(n+p+q+1)`-length RHS for the symmetrized system above.
pub(crate) fn assemble_rhs<T: FloatT>(
    model: &Model<T>,
    cones: &mut CompositeCone<T>,
    rhs: &RhsBlocks<T>,
    mu: T,
) -> Vec<T> {
    let n = model.n();
    let p = model.p();
    let q = model.q();
    let mut hinv_rs = vec![T::zero(); q];
    cones.inv_hess_prod_blockwise(&rhs.r_s, &mut hinv_rs);

    let mut full = vec![T::zero(); n + p + q + 1];
    full[0..n].copy_from_slice(&rhs.r_x);
    for i in 0..p {
        full[n + i] = -rhs.r_y[i];
    }
    for i in 0..q {
        full[n + p + i] = -(rhs.r_z[i] - hinv_rs[i] / mu);
    }
    full[n + p + q] = rhs.r_kappa - rhs.r_tau;
    full
}

/// Groups triplets by column and sorts/merges duplicate entries within a
/// column, producing a `CscMatrix`. Shared by both system solvers' LHS
/// assembly.
pub(crate) fn triplets_to_csc<T: FloatT>(trips: &[Triplet<T>], dim: usize) -> crate::algebra::CscMatrix<T> {
    let mut cols: Vec<Vec<(usize, T)>> = vec![Vec::new(); dim];
    for &(r, c, v) in trips {
        cols[c].push((r, v));
    }
    let mut colptr = Vec::with_capacity(dim + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for col_entries in cols.iter_mut() {
        col_entries.sort_by_key(|&(r, _)| r);
        let mut merged: Vec<(usize, T)> = Vec::new();
        for &(r, v) in col_entries.iter() {
            if let Some(last) = merged.last_mut() {
                if last.0 == r {
                    last.1 = last.1 + v;
                    continue;
                }
            }
            merged.push((r, v));
        }
        for (r, v) in merged {
            rowval.push(r);
            nzval.push(v);
        }
        colptr.push(rowval.len());
    }
    crate::algebra::CscMatrix::new(dim, dim, colptr, rowval, nzval)
}

/// Recovers `y_dir, z_dir, tau_dir` from the solved reduced system, then
/// back-substitutes `s_dir_k = (1/mu) * Hinv_k . (r_{s,k} - z_dir_k)` and
/// `kappa_dir = r_kappa - (mu/tau^2) * tau_dir`.
pub(crate) fn unpack_solution<T: FloatT>(
    model: &Model<T>,
    cones: &mut CompositeCone<T>,
    sol: &[T],
    rhs: &RhsBlocks<T>,
    mu: T,
    tau: T,
    dir: &mut Direction<T>,
) {
    let n = model.n();
    let p = model.p();
    let q = model.q();

    dir.x_dir.copy_from_slice(&sol[0..n]);
    dir.y_dir.copy_from_slice(&sol[n..n + p]);
    dir.z_dir.copy_from_slice(&sol[n + p..n + p + q]);
    dir.tau_dir = sol[n + p + q];

    let mut diff = vec![T::zero(); q];
    for i in 0..q {
        diff[i] = rhs.r_s[i] - dir.z_dir[i];
    }
    let mut s_back = vec![T::zero(); q];
    cones.inv_hess_prod_blockwise(&diff, &mut s_back);
    for i in 0..q {
        dir.s_dir[i] = s_back[i] / mu;
    }

    dir.kappa_dir = rhs.r_kappa - (mu / (tau * tau)) * dir.tau_dir;
}
