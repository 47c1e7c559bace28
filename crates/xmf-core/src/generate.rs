//! Metrology-frame height and slope generation.
//!
//! A [`Generator`] decides which pose components take part and whether the
//! output is a height or an x-slope; a [`SurfaceModel`] pairs it with a
//! [`StandardSurface`] and is what the fitting layer evaluates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::same_shape;
use crate::reconcile::{reconcile_height, ReconcileError, ReconcileOptions};
use crate::standard::{StandardSurface, SurfaceParams};
use crate::transform::Pose;
use crate::{Grid, Real};

/// Generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generator {
    /// 2D height map, full 6-DOF pose.
    FullSurface,
    /// 2D height map of a cylinder; `y_i` is forced to zero.
    Cylinder,
    /// 1D height profile along `x`; only `x_i`, `z_i` and `beta` act.
    Profile1DHeight,
    /// 1D slope profile along `x`; only `x_i` and `beta` act, no transform.
    Profile1DSlope,
}

impl Generator {
    /// Copy of `pose` with the components this generator ignores set to zero.
    pub fn effective_pose(self, pose: &Pose) -> Pose {
        match self {
            Generator::FullSurface => *pose,
            Generator::Cylinder => Pose { y_i: 0.0, ..*pose },
            Generator::Profile1DHeight => Pose {
                y_i: 0.0,
                alpha: 0.0,
                gamma: 0.0,
                ..*pose
            },
            Generator::Profile1DSlope => Pose {
                x_i: pose.x_i,
                beta: pose.beta,
                ..Pose::default()
            },
        }
    }

    pub fn is_profile(self) -> bool {
        matches!(self, Generator::Profile1DHeight | Generator::Profile1DSlope)
    }

    pub fn is_slope(self) -> bool {
        self == Generator::Profile1DSlope
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{0} has no slope model; slope profiles need a cylinder")]
    SlopeUnsupported(StandardSurface),
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("grid shapes differ: x {x:?}, other {other:?}")]
    ShapeMismatch {
        x: (usize, usize),
        other: (usize, usize),
    },
    #[error("surface generation did not converge after {iterations} iterations (rms drift {rms_dxy:e})")]
    NotConverged { iterations: usize, rms_dxy: Real },
}

impl From<ReconcileError> for GenerateError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::ShapeMismatch { x, y, seed } => GenerateError::ShapeMismatch {
                x,
                other: if y != x { y } else { seed },
            },
            ReconcileError::NotConverged {
                iterations,
                rms_dxy,
            } => GenerateError::NotConverged {
                iterations,
                rms_dxy,
            },
        }
    }
}

/// Generator and surface, checked for compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceModel {
    generator: Generator,
    surface: StandardSurface,
}

impl SurfaceModel {
    pub fn new(generator: Generator, surface: StandardSurface) -> Result<Self, ModelError> {
        if generator.is_slope() && !surface.is_cylinder() {
            return Err(ModelError::SlopeUnsupported(surface));
        }
        Ok(Self { generator, surface })
    }

    pub fn generator(&self) -> Generator {
        self.generator
    }

    pub fn surface(&self) -> StandardSurface {
        self.surface
    }

    /// Evaluate the model on the metrology grid.
    ///
    /// `y` is ignored by the 1D generators and `seed` by the slope
    /// generator.
    pub fn generate(
        &self,
        x: &Grid,
        y: &Grid,
        params: &SurfaceParams,
        pose: &Pose,
        seed: Option<&Grid>,
        opts: &ReconcileOptions,
    ) -> Result<Grid, GenerateError> {
        match self.generator {
            Generator::FullSurface => {
                generate_2d_curved_surface_height(self.surface, x, y, params, pose, seed, opts)
            }
            Generator::Cylinder => {
                generate_2d_cylinder_height(self.surface, x, y, params, pose, seed, opts)
            }
            Generator::Profile1DHeight => {
                generate_1d_height(self.surface, x, params, pose, seed, opts)
            }
            Generator::Profile1DSlope => generate_1d_slope(self.surface, x, params, pose),
        }
    }
}

impl std::fmt::Display for SurfaceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.surface, self.generator)
    }
}

fn check_xy(x: &Grid, y: &Grid) -> Result<(), GenerateError> {
    if same_shape(x, y) {
        Ok(())
    } else {
        Err(GenerateError::ShapeMismatch {
            x: x.shape(),
            other: y.shape(),
        })
    }
}

/// 2D height map with all six pose components.
pub fn generate_2d_curved_surface_height(
    surface: StandardSurface,
    x: &Grid,
    y: &Grid,
    params: &SurfaceParams,
    pose: &Pose,
    seed: Option<&Grid>,
    opts: &ReconcileOptions,
) -> Result<Grid, GenerateError> {
    check_xy(x, y)?;
    let pose = Generator::FullSurface.effective_pose(pose);
    let out = reconcile_height(
        |xs, ys| surface.height(xs, ys, params),
        &pose,
        x,
        y,
        seed,
        opts,
    )?;
    Ok(out.z)
}

/// 2D cylinder height map; `pose.y_i` is ignored.
pub fn generate_2d_cylinder_height(
    surface: StandardSurface,
    x: &Grid,
    y: &Grid,
    params: &SurfaceParams,
    pose: &Pose,
    seed: Option<&Grid>,
    opts: &ReconcileOptions,
) -> Result<Grid, GenerateError> {
    check_xy(x, y)?;
    let pose = Generator::Cylinder.effective_pose(pose);
    let out = reconcile_height(
        |xs, ys| surface.height(xs, ys, params),
        &pose,
        x,
        y,
        seed,
        opts,
    )?;
    Ok(out.z)
}

/// 1D height profile on `y = 0`; only `x_i`, `z_i` and `beta` are used.
pub fn generate_1d_height(
    surface: StandardSurface,
    x: &Grid,
    params: &SurfaceParams,
    pose: &Pose,
    seed: Option<&Grid>,
    opts: &ReconcileOptions,
) -> Result<Grid, GenerateError> {
    let pose = Generator::Profile1DHeight.effective_pose(pose);
    let y = Grid::zeros(x.nrows(), x.ncols());
    let out = reconcile_height(
        |xs, ys| surface.height(xs, ys, params),
        &pose,
        x,
        &y,
        seed,
        opts,
    )?;
    Ok(out.z)
}

/// 1D slope profile `sx(x − x_i) − tan(beta)`.
///
/// No frame reconciliation is done; `z_i` and the other rotations have no
/// effect.
pub fn generate_1d_slope(
    surface: StandardSurface,
    x: &Grid,
    params: &SurfaceParams,
    pose: &Pose,
) -> Result<Grid, GenerateError> {
    let shifted = x.add_scalar(-pose.x_i);
    let slope = surface
        .xslope_grid(&shifted, params)
        .ok_or(ModelError::SlopeUnsupported(surface))?;
    Ok(slope.add_scalar(-pose.beta.tan()))
}
