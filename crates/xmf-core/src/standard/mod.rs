//! Standard-frame surface evaluators.
//!
//! [`StandardSurface`] names a mirror type and maps unsigned `(|p|, |q|)`
//! onto the signed pair expected by the raw evaluators in [`quadric`], or
//! hands them straight to the [`diaboloid`] evaluators.

pub mod diaboloid;
pub mod quadric;

use serde::{Deserialize, Serialize};

use crate::surface::{signed_pq, Curvature, QuadricFamily};
use crate::{Grid, Real};

pub use diaboloid::{
    quartic_root, sag_col_diaboloid_height, tan_col_diaboloid_height, tan_col_diaboloid_quartic,
};
pub use quadric::{
    quadric_cylinder_height, quadric_cylinder_height_expression, quadric_cylinder_xslope,
    quadric_height, quadric_height_expression, quadric_normal,
};

/// Figure parameters of a mirror: source distance, focus distance and
/// grazing angle (radians).
///
/// Distances are magnitudes; the [`StandardSurface`] decides their signs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceParams {
    pub p: Real,
    pub q: Real,
    pub theta: Real,
}

impl SurfaceParams {
    pub fn new(p: Real, q: Real, theta: Real) -> Self {
        Self { p, q, theta }
    }
}

/// Mirror type evaluated in its standard frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardSurface {
    Ellipsoid(Curvature),
    Hyperboloid(Curvature),
    EllipticCylinder(Curvature),
    HyperbolicCylinder(Curvature),
    SagColDiaboloid,
    TanColDiaboloid,
}

impl StandardSurface {
    /// Cylinders ignore `y` and are the only surfaces with a closed-form slope.
    pub fn is_cylinder(self) -> bool {
        matches!(
            self,
            StandardSurface::EllipticCylinder(_) | StandardSurface::HyperbolicCylinder(_)
        )
    }

    /// Signed `(p, q)` handed to the quadric evaluators. Diaboloids keep the
    /// magnitudes.
    pub fn signed_pq(self, abs_p: Real, abs_q: Real) -> (Real, Real) {
        match self {
            StandardSurface::Ellipsoid(c) | StandardSurface::EllipticCylinder(c) => {
                signed_pq(QuadricFamily::Elliptic, c, abs_p, abs_q)
            }
            StandardSurface::Hyperboloid(c) | StandardSurface::HyperbolicCylinder(c) => {
                signed_pq(QuadricFamily::Hyperbolic, c, abs_p, abs_q)
            }
            StandardSurface::SagColDiaboloid | StandardSurface::TanColDiaboloid => (abs_p, abs_q),
        }
    }

    /// Standard-frame height at `(x, y)`.
    pub fn height(self, x: Real, y: Real, params: &SurfaceParams) -> Real {
        let SurfaceParams { p, q, theta } = *params;
        let (sp, sq) = self.signed_pq(p, q);
        match self {
            StandardSurface::Ellipsoid(_) | StandardSurface::Hyperboloid(_) => {
                quadric_height(x, y, sp, sq, theta)
            }
            StandardSurface::EllipticCylinder(_) | StandardSurface::HyperbolicCylinder(_) => {
                quadric_cylinder_height(x, sp, sq, theta)
            }
            StandardSurface::SagColDiaboloid => sag_col_diaboloid_height(x, y, p, q, theta),
            StandardSurface::TanColDiaboloid => tan_col_diaboloid_height(x, y, p, q, theta),
        }
    }

    /// Standard-frame x-slope; `None` for surfaces without a slope model.
    pub fn xslope(self, x: Real, params: &SurfaceParams) -> Option<Real> {
        if !self.is_cylinder() {
            return None;
        }
        let (sp, sq) = self.signed_pq(params.p, params.q);
        Some(quadric_cylinder_xslope(x, sp, sq, params.theta))
    }

    /// Element-wise [`StandardSurface::height`] over coordinate grids of
    /// equal shape.
    pub fn height_grid(self, x: &Grid, y: &Grid, params: &SurfaceParams) -> Grid {
        x.zip_map(y, |xi, yi| self.height(xi, yi, params))
    }

    /// Element-wise [`StandardSurface::xslope`].
    pub fn xslope_grid(self, x: &Grid, params: &SurfaceParams) -> Option<Grid> {
        if !self.is_cylinder() {
            return None;
        }
        Some(x.map(|xi| self.xslope(xi, params).unwrap_or(Real::NAN)))
    }
}

impl std::fmt::Display for StandardSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let curv = |c: &Curvature| match c {
            Curvature::Convex => "convex",
            Curvature::Concave => "concave",
        };
        match self {
            StandardSurface::Ellipsoid(c) => write!(f, "{} ellipsoid", curv(c)),
            StandardSurface::Hyperboloid(c) => write!(f, "{} hyperboloid", curv(c)),
            StandardSurface::EllipticCylinder(c) => write!(f, "{} elliptic cylinder", curv(c)),
            StandardSurface::HyperbolicCylinder(c) => {
                write!(f, "{} hyperbolic cylinder", curv(c))
            }
            StandardSurface::SagColDiaboloid => write!(f, "sagittal collimating diaboloid"),
            StandardSurface::TanColDiaboloid => write!(f, "tangential collimating diaboloid"),
        }
    }
}
