//! Parameter estimation for quadric mirror figures.
//!
//! The fitting layer sits on top of `xmf-core`:
//! - [`params`] names the nine figure/pose parameters and describes which
//!   of them move ([`FreeSpec`]),
//! - [`bounds`] maps bounded parameters to unconstrained solver
//!   coordinates,
//! - [`problem`] turns a [`xmf_core::SurfaceModel`] and a measurement into
//!   an [`NllsProblem`],
//! - [`backend_lm`] solves it with Levenberg–Marquardt,
//! - [`stats`] derives covariance and confidence intervals,
//! - [`engine`] ties the steps together in [`optimize_parameters`].

pub mod backend_lm;
pub mod bounds;
pub mod engine;
pub mod jacobian;
pub mod params;
pub mod problem;
pub mod stats;
pub mod traits;

pub use crate::backend_lm::LmBackend;
pub use crate::bounds::{Bound, BoundTransform};
pub use crate::engine::{
    optimize_parameters, optimize_parameters_with, resolve_initial, resolve_specs,
    undefined_penalty, FitError, FitOptions, FitReport, FitResult,
};
pub use crate::params::{
    default_free_mask, FreeSpec, InputParams, ParamMap, ParamName, ParamSpec, Tolerance,
};
pub use crate::problem::SurfaceFitProblem;
pub use crate::stats::{ConfidenceInterval, CovarianceStatus};
pub use crate::traits::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
