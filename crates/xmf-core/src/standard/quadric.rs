//! Closed-form heights and slopes of ellipsoids, hyperboloids and their
//! cylinders in the standard mirror frame.
//!
//! The standard frame puts the chief-ray intersection at the origin with the
//! surface tangent to the `xy` plane there; `x` runs along the beam. With
//!
//! ```text
//! A = (p+q)² − (p−q)² sin²θ
//! B = 2x(p+q)(p−q) sinθ cosθ − 4pq(p+q) sinθ
//! C = (p+q)² (x² sin²θ + y²)
//! ```
//!
//! the height solves `A z² + B z + C = 0`. The cylinder drops the `y²` term.
//! Every function returns `NaN` where no real solution exists.

use crate::surface::{QuadricFamily, SurfaceKind};
use crate::{Real, Vec3};

/// Coefficients `(A, B, C)` of the height quadratic. `y2` is `y²` (zero for
/// cylinders).
#[inline]
fn height_quadratic(x: Real, y2: Real, p: Real, q: Real, theta: Real) -> (Real, Real, Real) {
    let (s, c) = theta.sin_cos();
    let a = (p + q).powi(2) - (p - q).powi(2) * s * s;
    let b = 2.0 * x * (p + q) * (p - q) * s * c - 4.0 * p * q * (p + q) * s;
    let cc = (p + q).powi(2) * (x * x * s * s + y2);
    (a, b, cc)
}

#[inline]
fn select_root(kind: SurfaceKind, a: Real, b: Real, c: Real) -> Real {
    let delta = b * b - 4.0 * a * c;
    if delta < 0.0 || !delta.is_finite() {
        return Real::NAN;
    }
    (-b + kind.root_sign() * delta.sqrt()) / (2.0 * a)
}

/// Height of the standard quadric (ellipsoid or hyperboloid).
pub fn quadric_height(x: Real, y: Real, p: Real, q: Real, theta: Real) -> Real {
    let Some(kind) = SurfaceKind::classify(p, q) else {
        return Real::NAN;
    };
    let (a, b, c) = height_quadratic(x, y * y, p, q, theta);
    select_root(kind, a, b, c)
}

/// Height of the standard quadric cylinder (elliptic or hyperbolic).
pub fn quadric_cylinder_height(x: Real, p: Real, q: Real, theta: Real) -> Real {
    let Some(kind) = SurfaceKind::classify(p, q) else {
        return Real::NAN;
    };
    let (a, b, c) = height_quadratic(x, 0.0, p, q, theta);
    select_root(kind, a, b, c)
}

/// Single-expression form of [`quadric_height`].
///
/// Ellipsoids take the `−√` branch and hyperboloids the `+√` branch; the
/// overall sign of `(p+q)` then lands on the same root as the decision
/// table, so both forms agree wherever they are defined.
pub fn quadric_height_expression(x: Real, y: Real, p: Real, q: Real, theta: Real) -> Real {
    let Some(family) = QuadricFamily::of(p, q) else {
        return Real::NAN;
    };
    let (s, c) = theta.sin_cos();
    let a = (p + q).powi(2) - (p - q).powi(2) * s * s;
    let radicand = -4.0 * p * q * x * x - 4.0 * p * q * (p - q) * x * c + 4.0 * p * p * q * q
        - a * y * y / (s * s);
    expression(family, x, p, q, s, c, a, radicand)
}

/// Single-expression form of [`quadric_cylinder_height`].
pub fn quadric_cylinder_height_expression(x: Real, p: Real, q: Real, theta: Real) -> Real {
    let Some(family) = QuadricFamily::of(p, q) else {
        return Real::NAN;
    };
    let (s, c) = theta.sin_cos();
    let a = (p + q).powi(2) - (p - q).powi(2) * s * s;
    let radicand = -4.0 * p * q * x * x - 4.0 * p * q * (p - q) * x * c + 4.0 * p * p * q * q;
    expression(family, x, p, q, s, c, a, radicand)
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn expression(
    family: QuadricFamily,
    x: Real,
    p: Real,
    q: Real,
    s: Real,
    c: Real,
    a: Real,
    radicand: Real,
) -> Real {
    if radicand < 0.0 {
        return Real::NAN;
    }
    let root = match family {
        QuadricFamily::Elliptic => -radicand.sqrt(),
        QuadricFamily::Hyperbolic => radicand.sqrt(),
    };
    (p + q) * s * (-x * (p - q) * c + 2.0 * p * q + root) / a
}

/// Closed-form x-slope of the standard quadric cylinder.
pub fn quadric_cylinder_xslope(x: Real, p: Real, q: Real, theta: Real) -> Real {
    let Some(family) = QuadricFamily::of(p, q) else {
        return Real::NAN;
    };
    let (s, c) = theta.sin_cos();
    let a = (p + q).powi(2) - (p - q).powi(2) * s * s;
    let radicand = -p * q * x * x - p * q * (p - q) * x * c + p * p * q * q;
    if radicand < 0.0 {
        return Real::NAN;
    }
    let ratio = (2.0 * p * q * x + p * q * (p - q) * c) / radicand.sqrt();
    let signed = match family {
        QuadricFamily::Elliptic => ratio,
        QuadricFamily::Hyperbolic => -ratio,
    };
    let sx = (p + q) * s / a * (-(p - q) * c + signed);
    if sx.is_finite() {
        sx
    } else {
        Real::NAN
    }
}

/// Unit normal of the implicit quadric `F(x, y, z) = A z² + B z + C` at a
/// point on the surface, oriented with a positive `z` component.
///
/// Returns `None` where the gradient vanishes or is not finite.
pub fn quadric_normal(x: Real, y: Real, z: Real, p: Real, q: Real, theta: Real) -> Option<Vec3> {
    let (s, c) = theta.sin_cos();
    let (a, b, _) = height_quadratic(x, y * y, p, q, theta);
    let df_dx = 2.0 * (p + q) * (p - q) * s * c * z + 2.0 * (p + q).powi(2) * x * s * s;
    let df_dy = 2.0 * (p + q).powi(2) * y;
    let df_dz = 2.0 * a * z + b;
    let n = Vec3::new(df_dx, df_dy, df_dz);
    let norm = n.norm();
    if !norm.is_finite() || norm == 0.0 {
        return None;
    }
    let n = n / norm;
    Some(if n.z < 0.0 { -n } else { n })
}

#[cfg(test)]
mod tests {
    use super::*;

    const THETA: Real = 0.03;

    fn sign_patterns() -> [(Real, Real); 6] {
        [
            (-30.0, -0.3),
            (30.0, 0.3),
            (-0.3, 30.0),
            (-30.0, 0.3),
            (30.0, -0.3),
            (0.3, -30.0),
        ]
    }

    #[test]
    fn vertex_is_at_origin_for_every_branch() {
        for (p, q) in sign_patterns() {
            let z = quadric_height(0.0, 0.0, p, q, THETA);
            assert!(z.abs() < 1e-15, "p={p} q={q} z={z}");
            let zc = quadric_cylinder_height(0.0, p, q, THETA);
            assert!(zc.abs() < 1e-15, "p={p} q={q} z={zc}");
        }
    }

    #[test]
    fn concave_bends_up_and_convex_bends_down() {
        let z_concave = quadric_height(0.05, 0.0, 30.0, 0.3, THETA);
        let z_convex = quadric_height(0.05, 0.0, -30.0, -0.3, THETA);
        assert!(z_concave > 0.0);
        assert!(z_convex < 0.0);
    }

    #[test]
    fn expression_matches_quadratic_solution() {
        for (p, q) in sign_patterns() {
            for i in -5..=5 {
                let x = i as Real * 0.02;
                let y = 0.002 * i as Real;
                let z = quadric_height(x, y, p, q, THETA);
                let ze = quadric_height_expression(x, y, p, q, THETA);
                if z.is_finite() {
                    assert!((z - ze).abs() < 1e-12, "p={p} q={q} x={x}: {z} vs {ze}");
                }
                let zc = quadric_cylinder_height(x, p, q, THETA);
                let zce = quadric_cylinder_height_expression(x, p, q, THETA);
                if zc.is_finite() {
                    assert!((zc - zce).abs() < 1e-12, "p={p} q={q} x={x}");
                }
            }
        }
    }

    #[test]
    fn xslope_is_derivative_of_cylinder_height() {
        let h = 1e-6;
        for (p, q) in sign_patterns() {
            for i in -4..=4 {
                let x = i as Real * 0.025;
                let numeric = (quadric_cylinder_height(x + h, p, q, THETA)
                    - quadric_cylinder_height(x - h, p, q, THETA))
                    / (2.0 * h);
                let analytic = quadric_cylinder_xslope(x, p, q, THETA);
                assert!(
                    (numeric - analytic).abs() < 1e-8,
                    "p={p} q={q} x={x}: {numeric} vs {analytic}"
                );
            }
        }
    }

    #[test]
    fn slope_vanishes_at_vertex() {
        for (p, q) in sign_patterns() {
            assert!(quadric_cylinder_xslope(0.0, p, q, THETA).abs() < 1e-14);
        }
    }

    #[test]
    fn negative_discriminant_is_nan() {
        // Far outside the sagittal extent of a short concave ellipsoid.
        let z = quadric_height(0.0, 5.0, 1.0, 0.5, THETA);
        assert!(z.is_nan());
        assert!(quadric_cylinder_xslope(1e3, 30.0, 0.3, THETA).is_nan());
        assert!(quadric_height(0.0, 0.0, 0.0, 1.0, THETA).is_nan());
    }

    #[test]
    fn normal_at_vertex_points_up() {
        let n = quadric_normal(0.0, 0.0, 0.0, 30.0, 0.3, THETA).unwrap();
        assert!((n - Vec3::z()).norm() < 1e-12);
    }

    #[test]
    fn normal_tilts_with_slope() {
        let (p, q) = (30.0, 0.3);
        let x = 0.05;
        let z = quadric_cylinder_height(x, p, q, THETA);
        let n = quadric_normal(x, 0.0, z, p, q, THETA).unwrap();
        let slope = quadric_cylinder_xslope(x, p, q, THETA);
        assert!((-n.x / n.z - slope).abs() < 1e-10);
    }
}
