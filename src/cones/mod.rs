//! The barrier cone library.
//!
//! A tagged `SupportedCone<T>` enum sits at the API boundary, a `make_cone`
//! factory builds the boxed cone objects, and a `CompositeCone<T>` holds one
//! `Box<dyn Cone<T> + Send>` per cone and fans every trait method out over
//! its constituents by index range. The `Cone` trait itself is the
//! logarithmically-homogeneous self-concordant barrier contract:
//! `grad`/`hess_prod`/`inv_hess_prod`/`in_neighborhood`/`correction`, rather
//! than a Nesterov-Todd-scaling contract (`update_scaling`, `get_Hs`,
//! `mul_Hs`, ...) — one flat trait, boxed dynamic dispatch, no inheritance.

pub mod dnn;
pub mod hypoperspective;
pub mod lmi;
pub mod normcones;
pub mod orthant;
pub mod power;
pub mod psd;
pub mod sepspectral;
pub mod spectral_util;
pub mod socp;
pub mod wsos;

use crate::algebra::FloatT;
use std::ops::Range;

/// The barrier cone contract Every query is valid only
/// after the relevant `load_point`/`load_dual_point` call and lazily
/// computes (and caches) its result; `reset_data` clears every freshness
/// flag. Non-symmetric cones must return `false` (never panic or produce
/// NaN) from `is_feas`/`is_dual_feas` on any numerical exception, per the
/// conservative-feasibility invariant in
pub trait Cone<T: FloatT>: Send {
    /// Ambient dimension of the cone (length of its slice of `s`/`z`).
    fn dimension(&self) -> usize;
    /// Barrier parameter `nu`.
    fn nu(&self) -> T;

    /// Writes a strictly feasible primal anchor point with
    /// `<p, -grad(p)> = nu` into `arr` (length `dimension()`).
    fn set_initial_point(&mut self, arr: &mut [T]);

    /// Loads a primal point and clears freshness.
    fn load_point(&mut self, p: &[T]);
    /// Loads a dual point and clears freshness.
    fn load_dual_point(&mut self, d: &[T]);
    /// Multiplies the stored primal point by `alpha` in place.
    fn rescale_point(&mut self, alpha: T);

    /// Whether the loaded primal point is strictly feasible.
    fn is_feas(&mut self) -> bool;
    /// Whether the loaded dual point is strictly dual-feasible.
    fn is_dual_feas(&mut self) -> bool;

    /// `-grad F(s)`, in `svec`-style packing where applicable.
    fn grad(&mut self) -> &[T];
    /// `out := hess F(s) . v`
    fn hess_prod(&mut self, out: &mut [T], v: &[T]);
    /// `out := hess F(s)^-1 . v`
    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]);
    /// Materialized symmetric Hessian (`dimension() x dimension()`,
    /// row-major), computed lazily.
    fn hess(&mut self) -> &[T];
    /// Materialized symmetric inverse Hessian.
    fn inv_hess(&mut self) -> &[T];

    /// Whether the loaded primal/dual pair's deviation from the central
    /// path at `mu` is within `beta`.
    fn in_neighborhood(&mut self, mu: T, beta: T, use_infty_nbhd: bool) -> bool;

    /// Whether this cone supplies a third-order correction term.
    fn use_correction(&self) -> bool;
    /// Writes `1/2 * D^3F(s)[primal_dir, primal_dir]` into `out`. Cones with
    /// `use_correction() == false` must write zeros.
    fn correction(&mut self, out: &mut [T], primal_dir: &[T]);

    /// Whether the solver should swap primal/dual roles for this cone's
    /// slice (conjugate-barrier cones).
    fn use_dual_barrier(&self) -> bool {
        false
    }

    /// Clears all freshness flags without changing the stored point.
    fn reset_data(&mut self);
}

/// Tagged cone-type enum at the modeling boundary.
/// Carries exactly the constructor parameters needed to build the
/// corresponding concrete cone.
#[derive(Debug, Clone)]
pub enum SupportedCone<T> {
    NonnegativeCone(usize),
    SecondOrderCone(usize),
    RotatedSecondOrderCone(usize),
    LinfEpigraphCone(usize),
    EpiNormEuclideanCone(usize),
    EpiNormSpectralCone(usize, usize),
    EpiNormNuclearCone(usize, usize),
    PsdTriangleCone(usize),
    DoublyNonnegativeTriangleCone(usize),
    GenPowerCone(Vec<T>, usize),
    HypoGeomeanCone(usize),
    HypoPowerMeanCone(Vec<T>),
    HypoPerspectiveLogCone(usize),
    HypoPerspectiveLogdetCone(usize),
    HypoRootdetCone(usize),
    EpiPerSepSpectralVectorCone(usize),
    EpiPerSepSpectralMatrixCone(usize),
    EpiRelEntropyCone(usize),
    EpiTraceRelEntropyCone(usize),
    WsosNonnegativeCone(usize, usize),
    WsosPsdCone(usize, usize, usize),
    WsosLinfCone(usize, usize),
    WsosEuclideanCone(usize, usize),
    LmiCone(Vec<Vec<T>>, usize),
}

impl<T: FloatT> SupportedCone<T> {
    pub fn variant_name(&self) -> &'static str {
        match self {
            SupportedCone::NonnegativeCone(_) => "NonnegativeCone",
            SupportedCone::SecondOrderCone(_) => "SecondOrderCone",
            SupportedCone::RotatedSecondOrderCone(_) => "RotatedSecondOrderCone",
            SupportedCone::LinfEpigraphCone(_) => "LinfEpigraphCone",
            SupportedCone::EpiNormEuclideanCone(_) => "EpiNormEuclideanCone",
            SupportedCone::EpiNormSpectralCone(_, _) => "EpiNormSpectralCone",
            SupportedCone::EpiNormNuclearCone(_, _) => "EpiNormNuclearCone",
            SupportedCone::PsdTriangleCone(_) => "PsdTriangleCone",
            SupportedCone::DoublyNonnegativeTriangleCone(_) => "DoublyNonnegativeTriangleCone",
            SupportedCone::GenPowerCone(_, _) => "GenPowerCone",
            SupportedCone::HypoGeomeanCone(_) => "HypoGeomeanCone",
            SupportedCone::HypoPowerMeanCone(_) => "HypoPowerMeanCone",
            SupportedCone::HypoPerspectiveLogCone(_) => "HypoPerspectiveLogCone",
            SupportedCone::HypoPerspectiveLogdetCone(_) => "HypoPerspectiveLogdetCone",
            SupportedCone::HypoRootdetCone(_) => "HypoRootdetCone",
            SupportedCone::EpiPerSepSpectralVectorCone(_) => "EpiPerSepSpectralVectorCone",
            SupportedCone::EpiPerSepSpectralMatrixCone(_) => "EpiPerSepSpectralMatrixCone",
            SupportedCone::EpiRelEntropyCone(_) => "EpiRelEntropyCone",
            SupportedCone::EpiTraceRelEntropyCone(_) => "EpiTraceRelEntropyCone",
            SupportedCone::WsosNonnegativeCone(_, _) => "WsosNonnegativeCone",
            SupportedCone::WsosPsdCone(_, _, _) => "WsosPsdCone",
            SupportedCone::WsosLinfCone(_, _) => "WsosLinfCone",
            SupportedCone::WsosEuclideanCone(_, _) => "WsosEuclideanCone",
            SupportedCone::LmiCone(_, _) => "LmiCone",
        }
    }

    /// Ambient dimension of the cone this variant describes, without
    /// constructing it.
    pub fn dim(&self) -> usize {
        match self {
            SupportedCone::NonnegativeCone(d) => *d,
            SupportedCone::SecondOrderCone(d) => *d,
            SupportedCone::RotatedSecondOrderCone(d) => *d,
            SupportedCone::LinfEpigraphCone(d) => d + 1,
            SupportedCone::EpiNormEuclideanCone(d) => d + 1,
            SupportedCone::EpiNormSpectralCone(r, c) => 1 + r * c,
            SupportedCone::EpiNormNuclearCone(r, c) => 1 + r * c,
            SupportedCone::PsdTriangleCone(d) => crate::algebra::svec::svec_len(*d),
            SupportedCone::DoublyNonnegativeTriangleCone(d) => crate::algebra::svec::svec_len(*d),
            SupportedCone::GenPowerCone(alpha, n2) => alpha.len() + n2,
            SupportedCone::HypoGeomeanCone(d) => d + 1,
            SupportedCone::HypoPowerMeanCone(alpha) => alpha.len() + 1,
            SupportedCone::HypoPerspectiveLogCone(n) => n + 2,
            SupportedCone::HypoPerspectiveLogdetCone(d) => 2 + crate::algebra::svec::svec_len(*d),
            SupportedCone::HypoRootdetCone(d) => 1 + crate::algebra::svec::svec_len(*d),
            SupportedCone::EpiPerSepSpectralVectorCone(n) => 2 + n,
            SupportedCone::EpiPerSepSpectralMatrixCone(d) => 2 + crate::algebra::svec::svec_len(*d),
            SupportedCone::EpiRelEntropyCone(n) => 1 + 2 * n,
            SupportedCone::EpiTraceRelEntropyCone(d) => 1 + 2 * crate::algebra::svec::svec_len(*d),
            SupportedCone::WsosNonnegativeCone(_, u) => *u,
            SupportedCone::WsosPsdCone(_, u, _) => *u,
            SupportedCone::WsosLinfCone(_, u) => *u,
            SupportedCone::WsosEuclideanCone(_, u) => *u,
            SupportedCone::LmiCone(_, m) => *m,
        }
    }
}

type BoxedCone<T> = Box<dyn Cone<T> + Send>;

pub fn make_cone<T: FloatT>(cone: &SupportedCone<T>) -> BoxedCone<T> {
    match cone.clone() {
        SupportedCone::NonnegativeCone(d) => Box::new(orthant::NonnegativeCone::<T>::new(d)),
        SupportedCone::SecondOrderCone(d) => Box::new(socp::SecondOrderCone::<T>::new(d)),
        SupportedCone::RotatedSecondOrderCone(d) => {
            Box::new(socp::RotatedSecondOrderCone::<T>::new(d))
        }
        SupportedCone::LinfEpigraphCone(d) => Box::new(normcones::LinfEpigraphCone::<T>::new(d)),
        SupportedCone::EpiNormEuclideanCone(d) => {
            Box::new(normcones::EpiNormEuclideanCone::<T>::new(d))
        }
        SupportedCone::EpiNormSpectralCone(r, c) => {
            Box::new(normcones::EpiNormSpectralCone::<T>::new(r, c))
        }
        SupportedCone::EpiNormNuclearCone(r, c) => {
            Box::new(normcones::EpiNormNuclearCone::<T>::new(r, c))
        }
        SupportedCone::PsdTriangleCone(d) => Box::new(psd::PsdTriangleCone::<T>::new(d)),
        SupportedCone::DoublyNonnegativeTriangleCone(d) => {
            Box::new(dnn::DoublyNonnegativeTriangleCone::<T>::new(d))
        }
        SupportedCone::GenPowerCone(alpha, n2) => Box::new(power::GenPowerCone::<T>::new(alpha, n2)),
        SupportedCone::HypoGeomeanCone(d) => Box::new(power::HypoGeomeanCone::<T>::new(d)),
        SupportedCone::HypoPowerMeanCone(alpha) => {
            Box::new(power::HypoPowerMeanCone::<T>::new(alpha))
        }
        SupportedCone::HypoPerspectiveLogCone(n) => {
            Box::new(hypoperspective::HypoPerspectiveLogCone::<T>::new(n))
        }
        SupportedCone::HypoPerspectiveLogdetCone(d) => {
            Box::new(hypoperspective::HypoPerspectiveLogdetCone::<T>::new(d))
        }
        SupportedCone::HypoRootdetCone(d) => Box::new(hypoperspective::HypoRootdetCone::<T>::new(d)),
        SupportedCone::EpiPerSepSpectralVectorCone(n) => {
            Box::new(sepspectral::EpiPerSepSpectralVectorCone::<T>::new(n))
        }
        SupportedCone::EpiPerSepSpectralMatrixCone(d) => {
            Box::new(sepspectral::EpiPerSepSpectralMatrixCone::<T>::new(d))
        }
        SupportedCone::EpiRelEntropyCone(n) => Box::new(sepspectral::EpiRelEntropyCone::<T>::new(n)),
        SupportedCone::EpiTraceRelEntropyCone(d) => {
            Box::new(sepspectral::EpiTraceRelEntropyCone::<T>::new(d))
        }
        SupportedCone::WsosNonnegativeCone(n, u) => Box::new(wsos::WsosNonnegativeCone::<T>::new(n, u)),
        SupportedCone::WsosPsdCone(n, u, r) => Box::new(wsos::WsosPsdCone::<T>::new(n, u, r)),
        SupportedCone::WsosLinfCone(n, u) => Box::new(wsos::WsosLinfCone::<T>::new(n, u)),
        SupportedCone::WsosEuclideanCone(n, u) => Box::new(wsos::WsosEuclideanCone::<T>::new(n, u)),
        SupportedCone::LmiCone(basis, m) => Box::new(lmi::LmiCone::<T>::new(basis, m)),
    }
}

fn make_ranges(sizes: &[usize]) -> Vec<Range<usize>> {
    let mut rngs = Vec::with_capacity(sizes.len());
    let mut start = 0;
    for &sz in sizes {
        rngs.push(start..start + sz);
        start += sz;
    }
    rngs
}

/// The Cartesian product of cones `K = K_1 x ... x K_L`. Every `Cone` method is fanned out over the constituents
/// by index range; the composite itself is not a `Cone` (there is no single
/// "dimension" for a product), it is the thing the stepper and orchestrator
/// iterate over directly.
pub struct CompositeCone<T: FloatT> {
    cones: Vec<BoxedCone<T>>,
    pub types: Vec<SupportedCone<T>>,
    pub ranges: Vec<Range<usize>>,
    numel: usize,
    nu: T,
}

impl<T: FloatT> CompositeCone<T> {
    pub fn new(types: &[SupportedCone<T>]) -> Self {
        let types = types.to_vec();
        let cones: Vec<BoxedCone<T>> = types.iter().map(make_cone).collect();
        let sizes: Vec<usize> = cones.iter().map(|c| c.dimension()).collect();
        let ranges = make_ranges(&sizes);
        let numel = sizes.iter().sum();
        let nu = cones.iter().fold(T::zero(), |acc, c| acc + c.nu());

        Self {
            cones,
            types,
            ranges,
            numel,
            nu,
        }
    }

    pub fn len(&self) -> usize {
        self.cones.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cones.is_empty()
    }
    pub fn numel(&self) -> usize {
        self.numel
    }
    pub fn nu(&self) -> T {
        self.nu
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoxedCone<T>> {
        self.cones.iter()
    }
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BoxedCone<T>> {
        self.cones.iter_mut()
    }

    pub fn range(&self, k: usize) -> Range<usize> {
        self.ranges[k].clone()
    }

    pub fn set_initial_point(&mut self, s: &mut [T]) {
        for (cone, rng) in self.cones.iter_mut().zip(self.ranges.iter()) {
            cone.set_initial_point(&mut s[rng.clone()]);
        }
    }

    pub fn load_points(&mut self, s: &[T], z: &[T]) {
        for (cone, rng) in self.cones.iter_mut().zip(self.ranges.iter()) {
            cone.load_point(&s[rng.clone()]);
            cone.load_dual_point(&z[rng.clone()]);
        }
    }

    pub fn reset_data(&mut self) {
        for cone in self.cones.iter_mut() {
            cone.reset_data();
        }
    }

    pub fn rescale_points(&mut self, alpha: T) {
        for cone in self.cones.iter_mut() {
            cone.rescale_point(alpha);
        }
    }

    pub fn all_feas(&mut self) -> bool {
        self.cones.iter_mut().all(|c| c.is_feas())
    }

    pub fn all_dual_feas(&mut self) -> bool {
        self.cones.iter_mut().all(|c| c.is_dual_feas())
    }

    pub fn all_in_neighborhood(&mut self, mu: T, beta: T, use_infty_nbhd: bool) -> bool {
        self.cones
            .iter_mut()
            .all(|c| c.in_neighborhood(mu, beta, use_infty_nbhd))
    }

    /// `mu = (s.z + tau*kappa) / (nu + 1)`
    pub fn mu(&self, s: &[T], z: &[T], tau: T, kappa: T) -> T {
        use crate::algebra::VectorMath;
        (s.dot(z) + tau * kappa) / (self.nu + T::one())
    }

    /// `out := hess F(s_k) . v[I_k]` for every cone `k`, block-diagonal over
    /// the full `q`-length vectors. Used by the stepper's iterative
    /// refinement (applying the LHS operator to a candidate direction).
    pub fn hess_prod_blockwise(&mut self, v: &[T], out: &mut [T]) {
        for (cone, rng) in self.cones.iter_mut().zip(self.ranges.iter()) {
            cone.hess_prod(&mut out[rng.clone()], &v[rng.clone()]);
        }
    }

    /// `out := hess F(s_k)^-1 . v[I_k]` for every cone `k`, block-diagonal.
    /// Used by the system solver to eliminate `s`.
    pub fn inv_hess_prod_blockwise(&mut self, v: &[T], out: &mut [T]) {
        for (cone, rng) in self.cones.iter_mut().zip(self.ranges.iter()) {
            cone.inv_hess_prod(&mut out[rng.clone()], &v[rng.clone()]);
        }
    }

    /// Materializes cone `k`'s dense inverse-Hessian block (`d_k x d_k`,
    /// row-major) by probing `inv_hess_prod` with unit vectors. Used by the
    /// system solvers to assemble the reduced KKT block for cones whose
    /// `inv_hess()` is not materialized.
    pub fn dense_inv_hess_block(&mut self, k: usize) -> Vec<T> {
        let d = self.cones[k].dimension();
        let mut block = vec![T::zero(); d * d];
        let mut e = vec![T::zero(); d];
        let mut col = vec![T::zero(); d];
        for j in 0..d {
            e[j] = T::one();
            self.cones[k].inv_hess_prod(&mut col, &e);
            for i in 0..d {
                block[i * d + j] = col[i];
            }
            e[j] = T::zero();
        }
        block
    }

    /// Writes `-grad F(s_k)` for every cone `k` into the `q`-length `out`.
    pub fn grad_blockwise(&mut self, out: &mut [T]) {
        for (cone, rng) in self.cones.iter_mut().zip(self.ranges.iter()) {
            out[rng.clone()].copy_from_slice(cone.grad());
        }
    }

    /// Writes each cone's third-order `correction(dir_k)` into the
    /// `q`-length `out`; cones with `use_correction() == false` write zeros.
    /// `dir` supplies the per-cone primal-or-dual direction argument
    /// (already oriented by the caller according to `use_dual_barrier`).
    pub fn correction_blockwise(&mut self, dir: &[T], out: &mut [T]) {
        for (cone, rng) in self.cones.iter_mut().zip(self.ranges.iter()) {
            if cone.use_correction() {
                cone.correction(&mut out[rng.clone()], &dir[rng.clone()]);
            } else {
                out[rng.clone()].iter_mut().for_each(|x| *x = T::zero());
            }
        }
    }

    /// Whether cone `k` wants the primal/dual roles swapped for its
    /// correction-direction argument.
    pub fn use_dual_barrier(&self, k: usize) -> bool {
        self.cones[k].use_dual_barrier()
    }
}
