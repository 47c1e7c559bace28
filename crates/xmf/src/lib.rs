//! High-level entry crate for X-ray mirror figure fitting.
//!
//! Fits ellipsoids, hyperboloids, their cylinders and two collimating
//! diaboloids to height maps, height profiles and slope profiles measured
//! in an arbitrary metrology frame. Each fit recovers the rigid pose of the
//! mirror (and optionally its figure parameters `p`, `q`, `theta`) with
//! confidence intervals.
//!
//! ```no_run
//! use xmf::prelude::*;
//! use xmf::core::synthetic::{linspace, meshgrid};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (x, y) = meshgrid(&linspace(-0.1, 0.1, 201), &linspace(-0.01, 0.01, 21));
//! let z: Grid = /* measured heights on (x, y) */
//! # Grid::zeros(21, 201);
//!
//! let input = InputParams::new(30.0, 0.3, 0.03);
//! let result = fit_concave_ellipsoid(&x, &y, &z, &input, &FreeSpec::Defaults)?;
//!
//! println!("beta = {:e} rad", result.param(ParamName::Beta));
//! println!("residual rms = {:e} m", result.report.residual_rms);
//! # Ok(())
//! # }
//! ```
//!
//! Which parameters move is controlled by [`FreeSpec`](optim::FreeSpec):
//! the generator defaults, per-parameter flags, or per-parameter search
//! intervals around the start value.

pub mod fit;

pub use crate::fit::*;

/// Standard-frame evaluators, transforms, reconciler and generators.
pub mod core {
    pub use xmf_core::*;
}

/// Parameter specs, solver backend and the fit engine.
pub mod optim {
    pub use xmf_optim::*;
}

/// Common types for `use xmf::prelude::*;`.
pub mod prelude {
    pub use crate::core::{
        Curvature, Generator, Grid, Pose, Real, StandardSurface, SurfaceModel, SurfaceParams,
    };
    pub use crate::fit::*;
    pub use crate::optim::{
        ConfidenceInterval, CovarianceStatus, FitError, FitOptions, FitResult, FreeSpec,
        InputParams, ParamMap, ParamName, Tolerance,
    };
}
