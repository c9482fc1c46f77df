//! Dense/slice-level implementations of the `algebra` traits, plus the
//! `CscMatrix` matrix-vector product kernels; the cone library and residual
//! computation never see anything other than `[T]` and `CscMatrix<T>`.

use super::{CscMatrix, FloatT, MatrixMath, MatrixShape, ScalarMath, VectorMath};

impl<T> ScalarMath<T> for T
where
    T: FloatT,
{
    fn clip(s: T, min_thresh: T, max_thresh: T, min_new: T, max_new: T) -> T {
        if s < min_thresh {
            min_new
        } else if s > max_thresh {
            max_new
        } else {
            s
        }
    }
}

impl<T> VectorMath<T> for [T]
where
    T: FloatT,
{
    fn copy_from(&mut self, src: &[T]) {
        self.copy_from_slice(src);
    }

    fn translate(&mut self, c: T) {
        self.iter_mut().for_each(|x| *x += c);
    }

    fn scale(&mut self, c: T) {
        self.iter_mut().for_each(|x| *x *= c);
    }

    fn reciprocal(&mut self) {
        self.iter_mut().for_each(|x| *x = T::recip(*x));
    }

    fn sqrt(&mut self) {
        self.iter_mut().for_each(|x| *x = T::sqrt(*x));
    }

    fn rsqrt(&mut self) {
        self.iter_mut().for_each(|x| *x = T::recip(T::sqrt(*x)));
    }

    fn negate(&mut self) {
        self.iter_mut().for_each(|x| *x = -(*x));
    }

    fn hadamard(&mut self, y: &[T]) {
        self.iter_mut().zip(y).for_each(|(x, y)| *x = (*x) * (*y));
    }

    fn clip(&mut self, min_thresh: T, max_thresh: T, min_new: T, max_new: T) {
        self.iter_mut()
            .for_each(|x| *x = T::clip(*x, min_thresh, max_thresh, min_new, max_new));
    }

    fn dot(&self, y: &[T]) -> T {
        self.iter().zip(y).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
    }

    fn sumsq(&self) -> T {
        self.dot(self)
    }

    fn norm(&self) -> T {
        T::sqrt(self.sumsq())
    }

    fn norm_scaled(&self, v: &[T]) -> T {
        assert_eq!(self.len(), v.len());
        let total = self.iter().zip(v).fold(T::zero(), |acc, (&x, &y)| {
            let prod = x * y;
            acc + prod * prod
        });
        T::sqrt(total)
    }

    fn norm_inf(&self) -> T {
        let mut out = T::zero();
        for v in self.iter().map(|v| v.abs()) {
            out = if v > out { v } else { out };
        }
        out
    }

    fn norm_one(&self) -> T {
        self.iter().fold(T::zero(), |acc, v| acc + v.abs())
    }

    fn minimum(&self) -> T {
        self.iter().fold(T::infinity(), |r, &s| T::min(r, s))
    }

    fn maximum(&self) -> T {
        self.iter().fold(T::neg_infinity(), |r, &s| T::max(r, s))
    }

    fn mean(&self) -> T {
        if self.is_empty() {
            T::zero()
        } else {
            let num = self.iter().fold(T::zero(), |r, &s| r + s);
            let den = T::from(self.len()).unwrap();
            num / den
        }
    }

    fn axpby(&mut self, a: T, x: &[T], b: T) {
        assert_eq!(self.len(), x.len());
        let yx = self.iter_mut().zip(x);
        if b == T::zero() {
            yx.for_each(|(y, x)| *y = a * (*x));
        } else if b == T::one() {
            yx.for_each(|(y, x)| *y = a * (*x) + (*y));
        } else if b == -T::one() {
            yx.for_each(|(y, x)| *y = a * (*x) - (*y));
        } else {
            yx.for_each(|(y, x)| *y = a * (*x) + b * (*y));
        }
    }

    fn waxpby(&mut self, a: T, x: &[T], b: T, y: &[T]) {
        assert_eq!(self.len(), x.len());
        assert_eq!(self.len(), y.len());
        let xy = x.iter().zip(y);
        for (w, (x, y)) in self.iter_mut().zip(xy) {
            *w = a * (*x) + b * (*y);
        }
    }
}

impl<T> MatrixMath<T, [T]> for CscMatrix<T>
where
    T: FloatT,
{
    fn nrows(&self) -> usize {
        self.m
    }
    fn ncols(&self) -> usize {
        self.n
    }
    fn is_square(&self) -> bool {
        self.m == self.n
    }

    fn scale(&mut self, c: T) {
        self.nzval.scale(c);
    }

    fn col_norms(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        self.col_norms_no_reset(norms);
    }

    fn col_norms_no_reset(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.colptr.len() - 1);
        for (i, v) in norms.iter_mut().enumerate() {
            for j in self.colptr[i]..self.colptr[i + 1] {
                let tmp = T::abs(self.nzval[j]);
                *v = T::max(*v, tmp);
            }
        }
    }

    fn row_norms(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        self.row_norms_no_reset(norms);
    }

    fn row_norms_no_reset(&self, norms: &mut [T]) {
        assert_eq!(self.rowval.len(), *self.colptr.last().unwrap());
        for (row, val) in self.rowval.iter().zip(self.nzval.iter()) {
            norms[*row] = T::max(norms[*row], T::abs(*val));
        }
    }

    fn lmul_diag(&mut self, l: &[T]) {
        let rows = &self.rowval;
        let vals = &mut self.nzval;
        for (val, row) in vals.iter_mut().zip(rows) {
            *val *= l[*row];
        }
    }

    fn rmul_diag(&mut self, r: &[T]) {
        let colptr = &self.colptr;
        let vals = &mut self.nzval;
        assert_eq!(vals.len(), *colptr.last().unwrap());
        for i in 0..self.n {
            vals[colptr[i]..colptr[i + 1]].scale(r[i]);
        }
    }

    fn lrmul_diag(&mut self, l: &[T], r: &[T]) {
        assert_eq!(self.nzval.len(), *self.colptr.last().unwrap());
        for col in 0..self.n {
            let (first, last) = (self.colptr[col], self.colptr[col + 1]);
            let vals = &mut self.nzval[first..last];
            let rows = &self.rowval[first..last];
            for (val, row) in vals.iter_mut().zip(rows) {
                *val *= l[*row] * r[col];
            }
        }
    }

    fn gemv(&self, y: &mut [T], trans: MatrixShape, x: &[T], a: T, b: T) {
        match trans {
            MatrixShape::N => csc_axpby_n(self, y, x, a, b),
            MatrixShape::T => csc_axpby_t(self, y, x, a, b),
        }
    }
}

fn csc_axpby_n<T: FloatT>(a_mat: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    if b == T::zero() {
        y.fill(T::zero())
    } else if b == T::one() {
    } else if b == -T::one() {
        y.negate()
    } else {
        y.scale(b)
    }

    if a == T::zero() {
        return;
    }

    assert_eq!(a_mat.nzval.len(), *a_mat.colptr.last().unwrap());
    assert_eq!(x.len(), a_mat.n);

    if a == T::one() {
        for j in 0..a_mat.n {
            for i in a_mat.colptr[j]..a_mat.colptr[j + 1] {
                y[a_mat.rowval[i]] += a_mat.nzval[i] * x[j];
            }
        }
    } else if a == -T::one() {
        for j in 0..a_mat.n {
            for i in a_mat.colptr[j]..a_mat.colptr[j + 1] {
                y[a_mat.rowval[i]] -= a_mat.nzval[i] * x[j];
            }
        }
    } else {
        for j in 0..a_mat.n {
            for i in a_mat.colptr[j]..a_mat.colptr[j + 1] {
                y[a_mat.rowval[i]] += a * a_mat.nzval[i] * x[j];
            }
        }
    }
}

fn csc_axpby_t<T: FloatT>(a_mat: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    if b == T::zero() {
        y.fill(T::zero())
    } else if b == T::one() {
    } else if b == -T::one() {
        y.negate()
    } else {
        y.scale(b)
    }

    if a == T::zero() {
        return;
    }

    assert_eq!(a_mat.nzval.len(), *a_mat.colptr.last().unwrap());
    assert_eq!(x.len(), a_mat.n);

    if a == T::one() {
        for j in 0..a_mat.n {
            for k in a_mat.colptr[j]..a_mat.colptr[j + 1] {
                y[j] += a_mat.nzval[k] * x[a_mat.rowval[k]];
            }
        }
    } else if a == -T::one() {
        for j in 0..a_mat.n {
            for k in a_mat.colptr[j]..a_mat.colptr[j + 1] {
                y[j] -= a_mat.nzval[k] * x[a_mat.rowval[k]];
            }
        }
    } else {
        for j in 0..a_mat.n {
            for k in a_mat.colptr[j]..a_mat.colptr[j + 1] {
                y[j] += a * a_mat.nzval[k] * x[a_mat.rowval[k]];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_and_norm() {
        let x = [1.0_f64, 2.0, 3.0];
        let y = [4.0_f64, 5.0, 6.0];
        assert!((x.dot(&y) - 32.0).abs() < 1e-12);
        assert!((x.norm() - 14.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn csc_gemv_matches_dense() {
        // A = [[1, 0, 2], [0, 3, 4]]  (2x3)
        let dense = [1.0_f64, 0.0, 2.0, 0.0, 3.0, 4.0];
        let a = CscMatrix::from_dense_row_major(2, 3, &dense);
        let x = [1.0_f64, 1.0, 1.0];
        let mut y = [0.0_f64; 2];
        a.gemv(&mut y, MatrixShape::N, &x, 1.0, 0.0);
        assert_eq!(y, [3.0, 7.0]);

        let at = a.transpose();
        let xt = [1.0_f64, 1.0];
        let mut yt = [0.0_f64; 3];
        at.gemv(&mut yt, MatrixShape::N, &xt, 1.0, 0.0);
        assert_eq!(yt, [1.0, 3.0, 6.0]);
    }
}
