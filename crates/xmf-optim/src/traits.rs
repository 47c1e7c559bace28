//! Backend-agnostic least-squares problem and solver interfaces.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use xmf_core::Real;

/// Generic non-linear least squares problem with dense parameter/residual vectors.
///
/// Implementations must return finite values for every parameter vector the
/// solver may probe; undefined rows are the problem's responsibility.
pub trait NllsProblem {
    /// Number of parameters in the optimization vector.
    fn num_params(&self) -> usize;
    /// Number of residual rows in the problem.
    fn num_residuals(&self) -> usize;

    /// Residuals for the current parameters.
    fn residuals(&self, x: &DVector<Real>) -> DVector<Real>;
    /// Jacobian `∂r/∂x` for the current parameters.
    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Maximum number of solver iterations before termination.
    ///
    /// The LM backend follows the MINPACK convention and caps function
    /// evaluations at `max_iters * (n + 1)`.
    pub max_iters: usize,
    /// Relative tolerance on the objective (cost) reduction.
    pub ftol: Real,
    /// Relative tolerance on parameter updates.
    pub xtol: Real,
    /// Orthogonality/gradient tolerance.
    pub gtol: Real,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Residual evaluations performed by the solver.
    pub evaluations: usize,
    /// `½‖r‖²` at the returned parameters.
    pub final_cost: Real,
    pub converged: bool,
    /// Solver termination reason in readable form.
    pub termination: String,
}

pub trait NllsSolverBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport);
}
