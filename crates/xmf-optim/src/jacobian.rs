//! Forward-difference Jacobians for residual functions that may return `NaN`.

use nalgebra::{DMatrix, DVector};
use xmf_core::Real;

/// Parameters smaller than this in magnitude share its step.
const STEP_FLOOR: Real = 1.0;

/// Forward-difference step for a parameter currently at `x`.
pub fn step_size(x: Real) -> Real {
    Real::EPSILON.sqrt() * x.abs().max(STEP_FLOOR)
}

/// Jacobian of `f` at `x`, given `f0 = f(x)`.
///
/// Rows where `f0` is not finite are zero. When the forward probe of a
/// column leaves a row undefined, that row falls back to a backward
/// difference, and to zero if both probes fail.
pub fn forward_difference<F>(mut f: F, x: &DVector<Real>, f0: &DVector<Real>) -> DMatrix<Real>
where
    F: FnMut(&DVector<Real>) -> DVector<Real>,
{
    let m = f0.len();
    let n = x.len();
    let mut jac = DMatrix::zeros(m, n);
    let mut probe = x.clone();

    for j in 0..n {
        let h = step_size(x[j]);

        probe[j] = x[j] + h;
        let fp = f(&probe);

        let mut backward: Option<DVector<Real>> = None;
        for i in 0..m {
            if !f0[i].is_finite() {
                continue;
            }
            if fp[i].is_finite() {
                jac[(i, j)] = (fp[i] - f0[i]) / h;
                continue;
            }
            let fm = backward.get_or_insert_with(|| {
                probe[j] = x[j] - h;
                f(&probe)
            });
            if fm[i].is_finite() {
                jac[(i, j)] = (f0[i] - fm[i]) / h;
            }
        }

        probe[j] = x[j];
    }

    jac
}
