//! Fixed-point reconciliation of a standard-frame surface with a metrology
//! grid.
//!
//! The metrology grid fixes lateral coordinates `(x, y)`, but the standard
//! evaluator needs standard-frame coordinates, which depend on the unknown
//! metrology height through the rotation. Starting from a seed height the
//! loop alternates
//!
//! ```text
//! (x_s, y_s)   = T⁻¹ (x, y, z)
//! z_s          = f(x_s, y_s)
//! (x', y', z') = T (x_s, y_s, z_s)
//! z            = z'
//! ```
//!
//! until the lateral drift `√ mean((x − x')² + (y − y')²)` over the finite
//! points is below a threshold.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{nan_mean, same_shape};
use crate::transform::{to_metrology, to_standard, Pose};
use crate::{Grid, Iso3, Pt3, Real};

/// Options for [`reconcile_height`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Stop once the lateral RMS drift is at or below this value (grid units).
    pub rms_threshold: Real,
    /// Hard cap on the number of iterations.
    pub max_iters: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            rms_threshold: 1e-9,
            max_iters: 100,
        }
    }
}

/// How the loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceResult {
    pub converged: bool,
    pub iterations: usize,
    /// Lateral RMS drift after the last iteration; `NaN` if no point was
    /// defined.
    pub rms_dxy: Real,
}

/// Metrology heights together with the loop diagnostics.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub z: Grid,
    pub convergence: ConvergenceResult,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("grid shapes differ: x {x:?}, y {y:?}, seed {seed:?}")]
    ShapeMismatch {
        x: (usize, usize),
        y: (usize, usize),
        seed: (usize, usize),
    },
    #[error("reconciliation did not converge after {iterations} iterations (rms drift {rms_dxy:e})")]
    NotConverged { iterations: usize, rms_dxy: Real },
}

/// One reconciliation pass: returns the updated metrology height and the
/// lateral RMS drift it leaves behind.
pub fn reconcile_step<F>(f: &F, iso: &Iso3, x: &Grid, y: &Grid, z: &Grid) -> (Grid, Real)
where
    F: Fn(Real, Real) -> Real,
{
    let (rows, cols) = x.shape();
    let mut z_next = Grid::from_element(rows, cols, Real::NAN);
    let mut drift = Vec::with_capacity(rows * cols);

    for j in 0..cols {
        for i in 0..rows {
            let xm = x[(i, j)];
            let ym = y[(i, j)];
            let ps = to_standard(iso, &Pt3::new(xm, ym, z[(i, j)]));
            let zs = f(ps.x, ps.y);
            let pm = to_metrology(iso, &Pt3::new(ps.x, ps.y, zs));
            z_next[(i, j)] = pm.z;
            drift.push((xm - pm.x).powi(2) + (ym - pm.y).powi(2));
        }
    }
    (z_next, nan_mean(drift).sqrt())
}

/// Compute metrology heights of the surface `f` placed by `pose`.
///
/// `seed` is the starting height (zeros if absent). A grid where no point is
/// defined terminates immediately and counts as converged.
pub fn reconcile_height<F>(
    f: F,
    pose: &Pose,
    x: &Grid,
    y: &Grid,
    seed: Option<&Grid>,
    opts: &ReconcileOptions,
) -> Result<Reconciled, ReconcileError>
where
    F: Fn(Real, Real) -> Real,
{
    let mut z = match seed {
        Some(s) => s.clone(),
        None => Grid::zeros(x.nrows(), x.ncols()),
    };
    if !same_shape(x, y) || !same_shape(x, &z) {
        return Err(ReconcileError::ShapeMismatch {
            x: x.shape(),
            y: y.shape(),
            seed: z.shape(),
        });
    }

    let iso = pose.to_isometry();
    let mut rms_dxy = Real::INFINITY;
    let mut iterations = 0;

    while iterations < opts.max_iters {
        let (z_next, rms) = reconcile_step(&f, &iso, x, y, &z);
        z = z_next;
        rms_dxy = rms;
        iterations += 1;
        // A NaN drift means no finite point remains; nothing left to refine.
        if rms.is_nan() || rms <= opts.rms_threshold {
            debug!("reconciled in {iterations} iterations (rms drift {rms:e})");
            return Ok(Reconciled {
                z,
                convergence: ConvergenceResult {
                    converged: true,
                    iterations,
                    rms_dxy,
                },
            });
        }
    }

    warn!(
        "reconciliation stopped at the iteration cap {} (rms drift {rms_dxy:e})",
        opts.max_iters
    );
    Err(ReconcileError::NotConverged {
        iterations,
        rms_dxy,
    })
}
