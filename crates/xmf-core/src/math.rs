//! Scalar, vector and grid type aliases plus NaN-aware reductions.
//!
//! Measurement data is carried in dense [`Grid`]s: 2D maps keep the
//! `(rows = y, cols = x)` layout produced by [`crate::synthetic::meshgrid`],
//! and 1D profiles are `n × 1` column grids.

use nalgebra::{DMatrix, Isometry3, Matrix3, Matrix4, Point3, Vector3, Vector4};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// Homogeneous 4-vector with [`Real`] components.
pub type Vec4 = Vector4<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;
/// Dense coordinate or value grid.
pub type Grid = DMatrix<Real>;

/// Build an `n × 1` grid from a 1D profile.
pub fn profile(values: &[Real]) -> Grid {
    Grid::from_column_slice(values.len(), 1, values)
}

/// Mean of the finite entries, `NaN` if there are none.
pub fn nan_mean<I>(values: I) -> Real
where
    I: IntoIterator<Item = Real>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        Real::NAN
    } else {
        sum / count as Real
    }
}

/// Root-mean-square of the finite entries, `NaN` if there are none.
pub fn nan_rms<I>(values: I) -> Real
where
    I: IntoIterator<Item = Real>,
{
    nan_mean(values.into_iter().map(|v| v * v)).sqrt()
}

/// Returns `true` when both grids have the same `(rows, cols)` shape.
pub fn same_shape(a: &Grid, b: &Grid) -> bool {
    a.shape() == b.shape()
}
