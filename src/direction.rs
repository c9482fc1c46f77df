//! Newton/centering search direction: a
//! `(n+p+2q+2)`-long vector partitioned into `x_dir, y_dir, z_dir, s_dir`
//! plus scalars `tau_dir, kappa_dir`.

use crate::algebra::FloatT;
use crate::cones::CompositeCone;

/// One search direction (predictor, corrector, or combined).
#[derive(Debug, Clone)]
pub struct Direction<T: FloatT> {
    pub x_dir: Vec<T>,
    pub y_dir: Vec<T>,
    pub z_dir: Vec<T>,
    pub s_dir: Vec<T>,
    pub tau_dir: T,
    pub kappa_dir: T,
}

impl<T: FloatT> Direction<T> {
    pub fn zeros(n: usize, p: usize, q: usize) -> Self {
        Self {
            x_dir: vec![T::zero(); n],
            y_dir: vec![T::zero(); p],
            z_dir: vec![T::zero(); q],
            s_dir: vec![T::zero(); q],
            tau_dir: T::zero(),
            kappa_dir: T::zero(),
        }
    }

    pub fn set_zero(&mut self) {
        self.x_dir.iter_mut().for_each(|v| *v = T::zero());
        self.y_dir.iter_mut().for_each(|v| *v = T::zero());
        self.z_dir.iter_mut().for_each(|v| *v = T::zero());
        self.s_dir.iter_mut().for_each(|v| *v = T::zero());
        self.tau_dir = T::zero();
        self.kappa_dir = T::zero();
    }

    pub fn s_dir_view<'a>(&'a self, cones: &CompositeCone<T>, k: usize) -> &'a [T] {
        &self.s_dir[cones.range(k)]
    }
    pub fn z_dir_view<'a>(&'a self, cones: &CompositeCone<T>, k: usize) -> &'a [T] {
        &self.z_dir[cones.range(k)]
    }
    pub fn s_dir_view_mut<'a>(&'a mut self, cones: &CompositeCone<T>, k: usize) -> &'a mut [T] {
        let r = cones.range(k);
        &mut self.s_dir[r]
    }
    pub fn z_dir_view_mut<'a>(&'a mut self, cones: &CompositeCone<T>, k: usize) -> &'a mut [T] {
        let r = cones.range(k);
        &mut self.z_dir[r]
    }

    /// The "primal direction" a cone's third-order correction term is
    /// evaluated against for cone `k`. Conjugate-barrier (`use_dual_barrier`)
    /// cones swap roles: their correction is taken in the dual variable's
    /// direction rather than the primal's
    pub fn correction_arg<'a>(&'a self, cones: &CompositeCone<T>, k: usize, use_dual: bool) -> &'a [T] {
        if use_dual {
            self.z_dir_view(cones, k)
        } else {
            self.s_dir_view(cones, k)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cones::SupportedCone;

    #[test]
    fn views_slice_correct_ranges() {
        let types = vec![
            SupportedCone::<f64>::NonnegativeCone(2),
            SupportedCone::<f64>::NonnegativeCone(3),
        ];
        let cones = CompositeCone::new(&types);
        let mut dir = Direction::zeros(0, 0, 5);
        dir.s_dir = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(dir.s_dir_view(&cones, 0), &[1.0, 2.0]);
        assert_eq!(dir.s_dir_view(&cones, 1), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn correction_arg_swaps_on_dual_barrier() {
        let types = vec![SupportedCone::<f64>::NonnegativeCone(2)];
        let cones = CompositeCone::new(&types);
        let mut dir = Direction::zeros(0, 0, 2);
        dir.s_dir = vec![10.0, 20.0];
        dir.z_dir = vec![30.0, 40.0];
        assert_eq!(dir.correction_arg(&cones, 0, false), &[10.0, 20.0]);
        assert_eq!(dir.correction_arg(&cones, 0, true), &[30.0, 40.0]);
    }
}
