//! Rigid placement of the standard surface in the metrology frame.
//!
//! ```text
//! T = [ R  t ]      R = Rz(γ) · Ry(β) · Rx(α)
//!     [ 0  1 ]      t = (x_i, y_i, z_i)
//! ```
//!
//! `T` maps standard-frame points to metrology-frame points.

use nalgebra::{Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::{Iso3, Mat4, Pt3, Real};

/// Translation (m) and rotation angles (rad) of the standard frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x_i: Real,
    pub y_i: Real,
    pub z_i: Real,
    pub alpha: Real,
    pub beta: Real,
    pub gamma: Real,
}

impl Pose {
    /// Pure translation.
    pub fn translation(x_i: Real, y_i: Real, z_i: Real) -> Self {
        Self {
            x_i,
            y_i,
            z_i,
            ..Self::default()
        }
    }

    pub fn rotation(&self) -> Rotation3<Real> {
        Rotation3::from_euler_angles(self.alpha, self.beta, self.gamma)
    }

    /// Homogeneous 4×4 matrix `T`.
    pub fn matrix(&self) -> Mat4 {
        compose_transformation_matrix(
            self.alpha, self.beta, self.gamma, self.x_i, self.y_i, self.z_i,
        )
    }

    /// `T` as an isometry; its inverse is exact (`Rᵀ`, `−Rᵀt`).
    pub fn to_isometry(&self) -> Iso3 {
        Iso3::from_parts(
            Translation3::new(self.x_i, self.y_i, self.z_i),
            UnitQuaternion::from_rotation_matrix(&self.rotation()),
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Build `T` from rotation angles and translation.
pub fn compose_transformation_matrix(
    alpha: Real,
    beta: Real,
    gamma: Real,
    x_i: Real,
    y_i: Real,
    z_i: Real,
) -> Mat4 {
    let r = Rotation3::from_euler_angles(alpha, beta, gamma);
    let mut t = r.to_homogeneous();
    t[(0, 3)] = x_i;
    t[(1, 3)] = y_i;
    t[(2, 3)] = z_i;
    t
}

/// Apply `T` to a point.
#[inline]
pub fn to_metrology(iso: &Iso3, p: &Pt3) -> Pt3 {
    iso.transform_point(p)
}

/// Apply `T⁻¹` to a point.
#[inline]
pub fn to_standard(iso: &Iso3, p: &Pt3) -> Pt3 {
    iso.inverse_transform_point(p)
}
