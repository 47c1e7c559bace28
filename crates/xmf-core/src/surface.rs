//! Quadric classification from the signed `(p, q)` pair.
//!
//! The sign of `p` and `q` selects the quadric family and which root of the
//! height quadratic is physical. For hyperboloids the convex/concave half
//! additionally depends on which of `|p|`, `|q|` is larger, and the tie goes
//! to the convex half on both sides:
//!
//! | p   | q   | magnitude   | kind                     | root  |
//! |-----|-----|-------------|--------------------------|-------|
//! | < 0 | < 0 |             | convex ellipsoid         | `+√Δ` |
//! | > 0 | > 0 |             | concave ellipsoid        | `−√Δ` |
//! | < 0 | > 0 | `|p| ≤ |q|` | left convex hyperboloid  | `+√Δ` |
//! | < 0 | > 0 | `|p| > |q|` | left concave hyperboloid | `−√Δ` |
//! | > 0 | < 0 | `|p| ≥ |q|` | right convex hyperboloid | `+√Δ` |
//! | > 0 | < 0 | `|p| < |q|` | right concave hyperboloid| `−√Δ` |

use crate::Real;
use serde::{Deserialize, Serialize};

/// Whether the reflecting side bulges towards (`Convex`) or away from
/// (`Concave`) the incoming beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curvature {
    Convex,
    Concave,
}

/// Conic family of a quadric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuadricFamily {
    /// `p·q > 0`.
    Elliptic,
    /// `p·q < 0`.
    Hyperbolic,
}

/// Branch of the standard quadric selected by `(p, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    ConvexEllipsoid,
    ConcaveEllipsoid,
    LeftConvexHyperboloid,
    LeftConcaveHyperboloid,
    RightConvexHyperboloid,
    RightConcaveHyperboloid,
}

impl SurfaceKind {
    /// Classify a signed `(p, q)` pair.
    ///
    /// Returns `None` when either distance is zero or not finite; evaluators
    /// map that to an undefined (NaN) surface.
    pub fn classify(p: Real, q: Real) -> Option<Self> {
        if !(p.is_finite() && q.is_finite()) || p == 0.0 || q == 0.0 {
            return None;
        }
        let kind = match (p < 0.0, q < 0.0) {
            (true, true) => SurfaceKind::ConvexEllipsoid,
            (false, false) => SurfaceKind::ConcaveEllipsoid,
            (true, false) => {
                if p.abs() <= q.abs() {
                    SurfaceKind::LeftConvexHyperboloid
                } else {
                    SurfaceKind::LeftConcaveHyperboloid
                }
            }
            (false, true) => {
                if p.abs() >= q.abs() {
                    SurfaceKind::RightConvexHyperboloid
                } else {
                    SurfaceKind::RightConcaveHyperboloid
                }
            }
        };
        Some(kind)
    }

    pub fn family(self) -> QuadricFamily {
        match self {
            SurfaceKind::ConvexEllipsoid | SurfaceKind::ConcaveEllipsoid => {
                QuadricFamily::Elliptic
            }
            _ => QuadricFamily::Hyperbolic,
        }
    }

    pub fn curvature(self) -> Curvature {
        match self {
            SurfaceKind::ConvexEllipsoid
            | SurfaceKind::LeftConvexHyperboloid
            | SurfaceKind::RightConvexHyperboloid => Curvature::Convex,
            SurfaceKind::ConcaveEllipsoid
            | SurfaceKind::LeftConcaveHyperboloid
            | SurfaceKind::RightConcaveHyperboloid => Curvature::Concave,
        }
    }

    /// Sign applied to `√Δ` in `(−B ± √Δ) / 2A`.
    pub fn root_sign(self) -> Real {
        match self.curvature() {
            Curvature::Convex => 1.0,
            Curvature::Concave => -1.0,
        }
    }
}

impl QuadricFamily {
    /// Family implied by the sign of `p·q`, `None` when the product is zero
    /// or not finite.
    pub fn of(p: Real, q: Real) -> Option<Self> {
        let pq = p * q;
        if pq > 0.0 {
            Some(QuadricFamily::Elliptic)
        } else if pq < 0.0 {
            Some(QuadricFamily::Hyperbolic)
        } else {
            None
        }
    }
}

/// Assign signs to `(|p|, |q|)` for a mirror of the given family and curvature.
///
/// The magnitudes are used as given; only the hyperbolic comparison takes
/// absolute values.
pub fn signed_pq(
    family: QuadricFamily,
    curvature: Curvature,
    abs_p: Real,
    abs_q: Real,
) -> (Real, Real) {
    match (family, curvature) {
        (QuadricFamily::Elliptic, Curvature::Convex) => (-abs_p, -abs_q),
        (QuadricFamily::Elliptic, Curvature::Concave) => (abs_p, abs_q),
        (QuadricFamily::Hyperbolic, Curvature::Convex) => {
            if abs_p.abs() > abs_q.abs() {
                (abs_p, -abs_q)
            } else {
                (-abs_p, abs_q)
            }
        }
        (QuadricFamily::Hyperbolic, Curvature::Concave) => {
            if abs_p.abs() > abs_q.abs() {
                (-abs_p, abs_q)
            } else {
                (abs_p, -abs_q)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table() {
        use SurfaceKind::*;
        assert_eq!(SurfaceKind::classify(-30.0, -0.3), Some(ConvexEllipsoid));
        assert_eq!(SurfaceKind::classify(30.0, 0.3), Some(ConcaveEllipsoid));
        assert_eq!(SurfaceKind::classify(-0.3, 30.0), Some(LeftConvexHyperboloid));
        assert_eq!(SurfaceKind::classify(-30.0, 0.3), Some(LeftConcaveHyperboloid));
        assert_eq!(SurfaceKind::classify(30.0, -0.3), Some(RightConvexHyperboloid));
        assert_eq!(SurfaceKind::classify(0.3, -30.0), Some(RightConcaveHyperboloid));
    }

    #[test]
    fn equal_magnitudes_pick_convex_on_both_sides() {
        assert_eq!(
            SurfaceKind::classify(-1.0, 1.0),
            Some(SurfaceKind::LeftConvexHyperboloid)
        );
        assert_eq!(
            SurfaceKind::classify(1.0, -1.0),
            Some(SurfaceKind::RightConvexHyperboloid)
        );
    }

    #[test]
    fn degenerate_pairs_are_unclassified() {
        assert_eq!(SurfaceKind::classify(0.0, 1.0), None);
        assert_eq!(SurfaceKind::classify(1.0, Real::NAN), None);
        assert_eq!(QuadricFamily::of(0.0, 2.0), None);
    }

    #[test]
    fn signed_pairs_land_on_the_requested_curvature() {
        for &(a, b) in &[(30.0, 0.3), (0.3, 30.0)] {
            for family in [QuadricFamily::Elliptic, QuadricFamily::Hyperbolic] {
                for curvature in [Curvature::Convex, Curvature::Concave] {
                    let (p, q) = signed_pq(family, curvature, a, b);
                    let kind = SurfaceKind::classify(p, q).unwrap();
                    assert_eq!(kind.family(), family);
                    assert_eq!(kind.curvature(), curvature, "p={p} q={q}");
                }
            }
        }
    }

    #[test]
    fn convex_hyperbola_with_long_source_arm_is_right_handed() {
        let (p, q) = signed_pq(QuadricFamily::Hyperbolic, Curvature::Convex, 30.0, 0.3);
        assert_eq!((p, q), (30.0, -0.3));
    }
}
