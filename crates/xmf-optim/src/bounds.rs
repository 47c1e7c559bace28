//! Box constraints through smooth reparameterization.
//!
//! The LM solver works on unconstrained internal variables `u`; each bounded
//! parameter maps to its external value `x` through
//!
//! ```text
//! [lo, hi]  x = lo + (sin u + 1)(hi − lo)/2
//! [lo, ∞)   x = lo − 1 + √(u² + 1)
//! (−∞, hi]  x = hi + 1 − √(u² + 1)
//! (−∞, ∞)   x = u
//! ```
//!
//! so every `u` lands inside the box.

use serde::{Deserialize, Serialize};
use xmf_core::Real;

/// Relative inset from a two-sided bound for start values on or past it.
const BOX_INSET: Real = 1e-3;
/// Relative inset from a one-sided bound, scaled by the start magnitude.
const EDGE_INSET: Real = 1e-6;

/// Closed interval `[lower, upper]`; infinite sides are open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lower: Real,
    pub upper: Real,
}

impl Bound {
    pub fn new(lower: Real, upper: Real) -> Self {
        Self { lower, upper }
    }

    pub fn unbounded() -> Self {
        Self::new(Real::NEG_INFINITY, Real::INFINITY)
    }

    pub fn contains(&self, x: Real) -> bool {
        x >= self.lower && x <= self.upper
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower == Real::NEG_INFINITY && self.upper == Real::INFINITY
    }
}

impl Default for Bound {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Mapping between internal and external coordinates of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundTransform {
    Identity,
    Lower(Real),
    Upper(Real),
    Box { lower: Real, upper: Real },
}

impl BoundTransform {
    pub fn new(bound: Bound) -> Self {
        match (bound.lower.is_finite(), bound.upper.is_finite()) {
            (false, false) => BoundTransform::Identity,
            (true, false) => BoundTransform::Lower(bound.lower),
            (false, true) => BoundTransform::Upper(bound.upper),
            (true, true) => BoundTransform::Box {
                lower: bound.lower,
                upper: bound.upper,
            },
        }
    }

    /// External start value moved strictly inside the bound, so the
    /// transform has a non-zero derivative there.
    pub fn clamp_start(&self, x: Real) -> Real {
        match *self {
            BoundTransform::Identity => x,
            BoundTransform::Lower(lo) => {
                let inset = EDGE_INSET * x.abs().max(1e-3);
                x.max(lo + inset)
            }
            BoundTransform::Upper(hi) => {
                let inset = EDGE_INSET * x.abs().max(1e-3);
                x.min(hi - inset)
            }
            BoundTransform::Box { lower, upper } => {
                let width = upper - lower;
                if width <= 0.0 {
                    return lower;
                }
                let inset = BOX_INSET * width;
                x.clamp(lower + inset, upper - inset)
            }
        }
    }

    /// Internal coordinate for an external value inside the bound.
    pub fn to_internal(&self, x: Real) -> Real {
        match *self {
            BoundTransform::Identity => x,
            BoundTransform::Lower(lo) => ((x - lo + 1.0).powi(2) - 1.0).max(0.0).sqrt(),
            BoundTransform::Upper(hi) => ((hi - x + 1.0).powi(2) - 1.0).max(0.0).sqrt(),
            BoundTransform::Box { lower, upper } => {
                let s = 2.0 * (x - lower) / (upper - lower) - 1.0;
                s.clamp(-1.0, 1.0).asin()
            }
        }
    }

    pub fn to_external(&self, u: Real) -> Real {
        match *self {
            BoundTransform::Identity => u,
            BoundTransform::Lower(lo) => lo - 1.0 + (u * u + 1.0).sqrt(),
            BoundTransform::Upper(hi) => hi + 1.0 - (u * u + 1.0).sqrt(),
            BoundTransform::Box { lower, upper } => {
                let x = lower + (u.sin() + 1.0) * (upper - lower) / 2.0;
                x.clamp(lower, upper)
            }
        }
    }

    /// `dx/du` at internal coordinate `u`.
    pub fn derivative(&self, u: Real) -> Real {
        match *self {
            BoundTransform::Identity => 1.0,
            BoundTransform::Lower(_) => u / (u * u + 1.0).sqrt(),
            BoundTransform::Upper(_) => -u / (u * u + 1.0).sqrt(),
            BoundTransform::Box { lower, upper } => u.cos() * (upper - lower) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transforms() -> [BoundTransform; 4] {
        [
            BoundTransform::Identity,
            BoundTransform::new(Bound::new(-0.5, Real::INFINITY)),
            BoundTransform::new(Bound::new(Real::NEG_INFINITY, 2.0)),
            BoundTransform::new(Bound::new(-1e-4, 3e-4)),
        ]
    }

    #[test]
    fn internal_round_trip_inside_bounds() {
        for t in transforms() {
            for x in [-1e-4 + 1e-6, 0.0, 1e-4, 2.9e-4] {
                let u = t.to_internal(t.clamp_start(x));
                let back = t.to_external(u);
                assert!((back - t.clamp_start(x)).abs() < 1e-12, "{t:?} x={x}");
            }
        }
    }

    #[test]
    fn every_internal_value_maps_inside() {
        let b = Bound::new(-1e-4, 3e-4);
        let t = BoundTransform::new(b);
        for i in -50..=50 {
            let u = 0.37 * i as Real;
            assert!(b.contains(t.to_external(u)));
        }
        let lower = Bound::new(2.0, Real::INFINITY);
        let t = BoundTransform::new(lower);
        for u in [-1e3, -1.0, 0.0, 5.0] {
            assert!(lower.contains(t.to_external(u)));
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let h = 1e-7;
        for t in transforms() {
            for u in [-0.9, -0.1, 0.3, 1.2] {
                let fd = (t.to_external(u + h) - t.to_external(u - h)) / (2.0 * h);
                assert!((fd - t.derivative(u)).abs() < 1e-7, "{t:?} u={u}");
            }
        }
    }

    #[test]
    fn start_on_bound_is_moved_inside() {
        let t = BoundTransform::new(Bound::new(0.0, 1e-3));
        let x0 = t.clamp_start(0.0);
        assert!(x0 > 0.0 && x0 < 1e-3);
        assert!(t.derivative(t.to_internal(x0)).abs() > 0.0);

        let t = BoundTransform::new(Bound::new(1.0, Real::INFINITY));
        let x0 = t.clamp_start(1.0);
        assert!(x0 > 1.0);
        assert!(t.derivative(t.to_internal(x0)) > 0.0);
    }
}
