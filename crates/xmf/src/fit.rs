//! One fit function per surface type and measured quantity.
//!
//! 2D entry points take metrology grids `(x, y, z)`; 1D entry points take an
//! abscissa and a height or slope profile. Every function has a
//! `_with_options` sibling; the short form uses [`FitOptions::default`].
//!
//! `p` and `q` in [`InputParams`] are magnitudes; the surface named by the
//! function assigns their signs.
//!
//! Ellipsoids and hyperboloids are surfaces of revolution about the focal
//! axis, so with the default free set `alpha`, `gamma` and `y_i` share one
//! redundant direction. The fit still converges but the covariance may be
//! reported singular; pin `alpha` with [`FreeSpec::flags`] when intervals
//! are needed for every pose component.

use xmf_core::{profile, Curvature, Generator, Grid, Real, StandardSurface, SurfaceModel};
use xmf_optim::{optimize_parameters, FitError, FitOptions, FitResult, FreeSpec, InputParams};

/// Fit any generator/surface pair to a measurement.
pub fn fit_surface(
    model: SurfaceModel,
    x: &Grid,
    y: &Grid,
    v: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    optimize_parameters(model, x, y, v, input, spec, options)
}

/// Fit a 1D profile; `y` is taken as zero.
pub fn fit_profile(
    model: SurfaceModel,
    x: &[Real],
    v: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let x = profile(x);
    let v = profile(v);
    let y = Grid::zeros(x.nrows(), 1);
    optimize_parameters(model, &x, &y, &v, input, spec, options)
}

#[allow(clippy::too_many_arguments)]
fn fit_2d(
    generator: Generator,
    surface: StandardSurface,
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let model = SurfaceModel::new(generator, surface)?;
    fit_surface(model, x, y, z, input, spec, options)
}

fn fit_1d(
    generator: Generator,
    surface: StandardSurface,
    x: &[Real],
    v: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let model = SurfaceModel::new(generator, surface)?;
    fit_profile(model, x, v, input, spec, options)
}

// Ellipsoids

pub fn fit_convex_ellipsoid(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_convex_ellipsoid_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_convex_ellipsoid_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::Ellipsoid(Curvature::Convex);
    fit_2d(Generator::FullSurface, surface, x, y, z, input, spec, options)
}

pub fn fit_concave_ellipsoid(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_concave_ellipsoid_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_concave_ellipsoid_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::Ellipsoid(Curvature::Concave);
    fit_2d(Generator::FullSurface, surface, x, y, z, input, spec, options)
}

// Elliptic cylinders (2D maps, y_i not estimated)

pub fn fit_convex_elliptic_cylinder(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_convex_elliptic_cylinder_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_convex_elliptic_cylinder_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::EllipticCylinder(Curvature::Convex);
    fit_2d(Generator::Cylinder, surface, x, y, z, input, spec, options)
}

pub fn fit_concave_elliptic_cylinder(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_concave_elliptic_cylinder_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_concave_elliptic_cylinder_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::EllipticCylinder(Curvature::Concave);
    fit_2d(Generator::Cylinder, surface, x, y, z, input, spec, options)
}

// Ellipse profiles

pub fn fit_convex_ellipse_height(
    x: &[Real],
    z: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_convex_ellipse_height_with_options(x, z, input, spec, &FitOptions::default())
}

pub fn fit_convex_ellipse_height_with_options(
    x: &[Real],
    z: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::EllipticCylinder(Curvature::Convex);
    fit_1d(Generator::Profile1DHeight, surface, x, z, input, spec, options)
}

pub fn fit_concave_ellipse_height(
    x: &[Real],
    z: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_concave_ellipse_height_with_options(x, z, input, spec, &FitOptions::default())
}

pub fn fit_concave_ellipse_height_with_options(
    x: &[Real],
    z: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::EllipticCylinder(Curvature::Concave);
    fit_1d(Generator::Profile1DHeight, surface, x, z, input, spec, options)
}

pub fn fit_convex_ellipse_slope(
    x: &[Real],
    sx: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_convex_ellipse_slope_with_options(x, sx, input, spec, &FitOptions::default())
}

pub fn fit_convex_ellipse_slope_with_options(
    x: &[Real],
    sx: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::EllipticCylinder(Curvature::Convex);
    fit_1d(Generator::Profile1DSlope, surface, x, sx, input, spec, options)
}

pub fn fit_concave_ellipse_slope(
    x: &[Real],
    sx: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_concave_ellipse_slope_with_options(x, sx, input, spec, &FitOptions::default())
}

pub fn fit_concave_ellipse_slope_with_options(
    x: &[Real],
    sx: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::EllipticCylinder(Curvature::Concave);
    fit_1d(Generator::Profile1DSlope, surface, x, sx, input, spec, options)
}

// Hyperboloids

pub fn fit_convex_hyperboloid(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_convex_hyperboloid_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_convex_hyperboloid_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::Hyperboloid(Curvature::Convex);
    fit_2d(Generator::FullSurface, surface, x, y, z, input, spec, options)
}

pub fn fit_concave_hyperboloid(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_concave_hyperboloid_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_concave_hyperboloid_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::Hyperboloid(Curvature::Concave);
    fit_2d(Generator::FullSurface, surface, x, y, z, input, spec, options)
}

// Hyperbolic cylinders (2D maps, y_i not estimated)

pub fn fit_convex_hyperbolic_cylinder(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_convex_hyperbolic_cylinder_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_convex_hyperbolic_cylinder_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::HyperbolicCylinder(Curvature::Convex);
    fit_2d(Generator::Cylinder, surface, x, y, z, input, spec, options)
}

pub fn fit_concave_hyperbolic_cylinder(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_concave_hyperbolic_cylinder_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_concave_hyperbolic_cylinder_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::HyperbolicCylinder(Curvature::Concave);
    fit_2d(Generator::Cylinder, surface, x, y, z, input, spec, options)
}

// Hyperbola profiles

pub fn fit_convex_hyperbola_height(
    x: &[Real],
    z: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_convex_hyperbola_height_with_options(x, z, input, spec, &FitOptions::default())
}

pub fn fit_convex_hyperbola_height_with_options(
    x: &[Real],
    z: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::HyperbolicCylinder(Curvature::Convex);
    fit_1d(Generator::Profile1DHeight, surface, x, z, input, spec, options)
}

pub fn fit_concave_hyperbola_height(
    x: &[Real],
    z: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_concave_hyperbola_height_with_options(x, z, input, spec, &FitOptions::default())
}

pub fn fit_concave_hyperbola_height_with_options(
    x: &[Real],
    z: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::HyperbolicCylinder(Curvature::Concave);
    fit_1d(Generator::Profile1DHeight, surface, x, z, input, spec, options)
}

pub fn fit_convex_hyperbola_slope(
    x: &[Real],
    sx: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_convex_hyperbola_slope_with_options(x, sx, input, spec, &FitOptions::default())
}

pub fn fit_convex_hyperbola_slope_with_options(
    x: &[Real],
    sx: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::HyperbolicCylinder(Curvature::Convex);
    fit_1d(Generator::Profile1DSlope, surface, x, sx, input, spec, options)
}

pub fn fit_concave_hyperbola_slope(
    x: &[Real],
    sx: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_concave_hyperbola_slope_with_options(x, sx, input, spec, &FitOptions::default())
}

pub fn fit_concave_hyperbola_slope_with_options(
    x: &[Real],
    sx: &[Real],
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::HyperbolicCylinder(Curvature::Concave);
    fit_1d(Generator::Profile1DSlope, surface, x, sx, input, spec, options)
}

// Collimating diaboloids

/// Sagittal-collimating diaboloid.
pub fn fit_sag_col_diaboloid(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_sag_col_diaboloid_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_sag_col_diaboloid_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::SagColDiaboloid;
    fit_2d(Generator::FullSurface, surface, x, y, z, input, spec, options)
}

/// Tangential-collimating diaboloid.
pub fn fit_tan_col_diaboloid(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
) -> Result<FitResult, FitError> {
    fit_tan_col_diaboloid_with_options(x, y, z, input, spec, &FitOptions::default())
}

pub fn fit_tan_col_diaboloid_with_options(
    x: &Grid,
    y: &Grid,
    z: &Grid,
    input: &InputParams,
    spec: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let surface = StandardSurface::TanColDiaboloid;
    fit_2d(Generator::FullSurface, surface, x, y, z, input, spec, options)
}
