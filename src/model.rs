//! Problem data. Immutable once loaded: `A x = b`, `s = h - G x` with
//! `s in K`, minimizing `c^T x + obj_offset`.

use crate::algebra::{CscMatrix, FloatT};
use crate::cones::{CompositeCone, SupportedCone};
use crate::error::ConeSolverError;

/// Coefficient data plus the ordered cone list.
///
/// `A` is `p x n`, `G` is `q x n`; `c in T^n`, `b in T^p`, `h in T^q`. The
/// cones partition `1..q` into contiguous ranges, in the same order as
/// `G`'s/`h`'s rows: coefficient matrices plus a flat cone-type list, no
/// nested problem structure.
pub struct Model<T: FloatT> {
    pub a: CscMatrix<T>,
    pub b: Vec<T>,
    pub g: CscMatrix<T>,
    pub h: Vec<T>,
    pub c: Vec<T>,
    pub obj_offset: T,
    pub cone_types: Vec<SupportedCone<T>>,
}

impl<T: FloatT> Model<T> {
    /// Validates shape consistency and
    /// builds the model. Cone-range/dimension consistency is checked
    /// implicitly by `CompositeCone::new` summing declared cone dimensions
    /// against `q`; callers needing that check up front should call
    /// `Self::cones()` and compare `numel()` to `g.m`.
    pub fn new(
        a: CscMatrix<T>,
        b: Vec<T>,
        g: CscMatrix<T>,
        h: Vec<T>,
        c: Vec<T>,
        obj_offset: T,
        cone_types: Vec<SupportedCone<T>>,
    ) -> Result<Self, ConeSolverError> {
        let n = c.len();
        if a.n != n || g.n != n {
            return Err(ConeSolverError::Configuration(
                "A, G and c must share the same number of columns",
            ));
        }
        if a.m != b.len() {
            return Err(ConeSolverError::Configuration(
                "A's row count must match len(b)",
            ));
        }
        if g.m != h.len() {
            return Err(ConeSolverError::Configuration(
                "G's row count must match len(h)",
            ));
        }
        let q: usize = cone_types.iter().map(|k| k.dim()).sum();
        if q != g.m {
            return Err(ConeSolverError::Configuration(
                "sum of cone dimensions must match G's row count",
            ));
        }
        Ok(Self {
            a,
            b,
            g,
            h,
            c,
            obj_offset,
            cone_types,
        })
    }

    pub fn n(&self) -> usize {
        self.c.len()
    }
    pub fn p(&self) -> usize {
        self.b.len()
    }
    pub fn q(&self) -> usize {
        self.h.len()
    }

    /// Builds the boxed cone objects and their index ranges. Called once by
    /// preprocessing/the orchestrator at the start of `solve()`; the
    /// resulting `CompositeCone` is threaded through the stepper for the
    /// rest of the solve.
    pub fn cones(&self) -> CompositeCone<T> {
        CompositeCone::new(&self.cone_types)
    }

    /// `nu = sum_k nu(K_k)`
    pub fn nu(&self) -> T {
        self.cones().nu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_cone_dimensions() {
        let a = CscMatrix::<f64>::zeros(0, 2);
        let g = CscMatrix::<f64>::from_dense_row_major(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let m = Model::new(
            a,
            vec![],
            g,
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            0.0,
            vec![SupportedCone::NonnegativeCone(3)],
        );
        assert!(matches!(m, Err(ConeSolverError::Configuration(_))));
    }

    #[test]
    fn accepts_consistent_lp_shape() {
        let a = CscMatrix::<f64>::zeros(0, 2);
        let g = CscMatrix::<f64>::from_dense_row_major(2, 2, &[-1.0, 0.0, 0.0, -1.0]);
        let m = Model::new(
            a,
            vec![],
            g,
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            0.0,
            vec![SupportedCone::NonnegativeCone(2)],
        )
        .unwrap();
        assert_eq!(m.n(), 2);
        assert_eq!(m.q(), 2);
        assert!((m.nu() - 2.0).abs() < 1e-12);
    }
}
