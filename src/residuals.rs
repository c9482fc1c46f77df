//! HSD residuals: `r_x = -A^T y - G^T z - c tau`, `r_y = A x -
//! b tau`, `r_z = s + G x - h tau`, plus their tau-scaled feasibility norms.

use crate::algebra::{FloatT, MatrixMath, MatrixShape, VectorMath};
use crate::model::Model;
use crate::point::Point;

/// The three residual blocks and their `/tau`-scaled norms, recomputed once
/// per stepper iteration and consumed by both the
/// RHS assembly and the termination checks.
#[derive(Debug, Clone)]
pub struct Residuals<T: FloatT> {
    pub r_x: Vec<T>,
    pub r_y: Vec<T>,
    pub r_z: Vec<T>,

    pub norm_x: T,
    pub norm_y: T,
    pub norm_z: T,
}

impl<T: FloatT> Residuals<T> {
    pub fn zeros(n: usize, p: usize, q: usize) -> Self {
        Self {
            r_x: vec![T::zero(); n],
            r_y: vec![T::zero(); p],
            r_z: vec![T::zero(); q],
            norm_x: T::zero(),
            norm_y: T::zero(),
            norm_z: T::zero(),
        }
    }

    /// Recomputes every residual block from the current iterate.
    pub fn update(&mut self, model: &Model<T>, pt: &Point<T>) {
        // r_x = -A^T y - G^T z - c*tau
        self.r_x.iter_mut().for_each(|v| *v = T::zero());
        model.a.gemv(&mut self.r_x, MatrixShape::T, &pt.y, -T::one(), T::one());
        model.g.gemv(&mut self.r_x, MatrixShape::T, &pt.z, -T::one(), T::one());
        self.r_x.axpby(-pt.tau, &model.c, T::one());

        // r_y = A x - b*tau
        self.r_y.iter_mut().for_each(|v| *v = T::zero());
        model.a.gemv(&mut self.r_y, MatrixShape::N, &pt.x, T::one(), T::one());
        self.r_y.axpby(-pt.tau, &model.b, T::one());

        // r_z = s + G x - h*tau
        self.r_z.copy_from(&pt.s);
        model.g.gemv(&mut self.r_z, MatrixShape::N, &pt.x, T::one(), T::one());
        self.r_z.axpby(-pt.tau, &model.h, T::one());

        let inv_tau = T::one() / pt.tau;
        self.norm_x = self.r_x.norm() * inv_tau;
        self.norm_y = self.r_y.norm() * inv_tau;
        self.norm_z = self.r_z.norm() * inv_tau;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::CscMatrix;
    use crate::cones::SupportedCone;

    #[test]
    fn zero_at_exact_solution() {
        // min x s.t. x >= 1, i.e. G = [-1], h = [-1], no equalities.
        let a = CscMatrix::<f64>::zeros(0, 1);
        let g = CscMatrix::from_dense_row_major(1, 1, &[-1.0]);
        let model = Model::new(a, vec![], g, vec![-1.0], vec![1.0], 0.0, vec![
            SupportedCone::NonnegativeCone(1),
        ])
        .unwrap();

        let mut pt = Point::zeros(1, 0, 1);
        pt.x = vec![1.0];
        pt.s = vec![0.0]; // s = h - G x = -1 - (-1) = 0
        pt.tau = 1.0;

        let mut res = Residuals::zeros(1, 0, 1);
        res.update(&model, &pt);
        assert!(res.r_y.is_empty());
        assert!((res.r_z[0]).abs() < 1e-12);
    }
}
