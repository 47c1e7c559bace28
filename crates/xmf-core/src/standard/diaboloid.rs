//! Sagittal and tangential collimating diaboloids.
//!
//! Both take unsigned `|p|`, `|q|`. The sagittal variant is a quadratic in
//! `z`; the tangential one is a full quartic solved in closed form through
//! its depressed form.

use crate::Real;
use nalgebra::Complex;

/// Height of the standard sagittal collimating diaboloid.
pub fn sag_col_diaboloid_height(x: Real, y: Real, abs_p: Real, abs_q: Real, theta: Real) -> Real {
    let (p, q) = (abs_p, abs_q);
    let (s, c) = theta.sin_cos();
    let y2 = y * y;
    let a = (p - q).powi(2) * c * c + 4.0 * p * q;
    let b = (p - q) * s * y2 + (p * p - q * q) * (2.0 * theta).sin() * x
        - 4.0 * (p + q) * p * q * s;
    let cc = (p + q).powi(2) * s * s * x * x - (p + q) * (c * x - q) * y2 - 0.25 * y2 * y2;
    let delta = b * b - 4.0 * a * cc;
    if delta < 0.0 || !delta.is_finite() {
        return Real::NAN;
    }
    (-b - delta.sqrt()) / (2.0 * a)
}

/// Coefficients `[A, B, C, D, E]` of the tangential diaboloid quartic
/// `A z⁴ + B z³ + C z² + D z + E = 0`.
pub fn tan_col_diaboloid_quartic(
    x: Real,
    y: Real,
    abs_p: Real,
    abs_q: Real,
    theta: Real,
) -> [Real; 5] {
    let (p, q) = (abs_p, abs_q);
    let (s, c) = theta.sin_cos();
    let c2t = (2.0 * theta).cos();
    let s2t = (2.0 * theta).sin();
    let (x2, x3) = (x * x, x * x * x);

    let a = -c.powi(4);
    let b = 4.0 * (p - q) * c * c * s + 4.0 * c.powi(3) * s * x;
    let cc = 4.0 * q * ((p + q) * c * c + 4.0 * p * s * s)
        + 2.0 * c * (q - 3.0 * p + (p - 3.0 * q) * c2t) * x
        - 6.0 * c * c * s * s * x2;
    let d = -16.0 * p * q * (p + q) * s
        + 4.0 * (p + q) * (2.0 * p - q) * s2t * x
        + 2.0 * (3.0 * p + q + (3.0 * q + p) * c2t) * s * x2
        + 4.0 * c * s.powi(3) * x3;
    let e = 4.0 * (p + q).powi(2) * y * y + 4.0 * q * (p + q) * s * s * x2
        - 4.0 * (p + q) * c * s * s * x3
        - s.powi(4) * x2 * x2;
    [a, b, cc, d, e]
}

/// Height of the standard tangential collimating diaboloid.
pub fn tan_col_diaboloid_height(x: Real, y: Real, abs_p: Real, abs_q: Real, theta: Real) -> Real {
    quartic_root(tan_col_diaboloid_quartic(x, y, abs_p, abs_q, theta))
}

/// Invariants of the normalized quartic `z⁴ + b z³ + c z² + d z + e`.
#[derive(Debug, Clone, Copy)]
struct Depressed {
    b: Real,
    k: Real,
    m: Real,
    delta0: Real,
    delta1: Real,
}

impl Depressed {
    fn new([a, b, c, d, e]: [Real; 5]) -> Self {
        let (b, c, d, e) = (b / a, c / a, d / a, e / a);
        Self {
            b,
            k: (8.0 * c - 3.0 * b * b) / 8.0,
            m: (b.powi(3) - 4.0 * b * c + 8.0 * d) / 8.0,
            delta0: c * c - 3.0 * b * d + 12.0 * e,
            delta1: 2.0 * c.powi(3) - 9.0 * b * c * d + 27.0 * b * b * e + 27.0 * d * d
                - 72.0 * c * e,
        }
    }

    fn discriminant(&self) -> Real {
        self.delta1 * self.delta1 - 4.0 * self.delta0.powi(3)
    }

    /// `S` through the principal complex cube root.
    fn s_cardano(&self) -> Real {
        let disc = Complex::new(self.discriminant(), 0.0).sqrt();
        let cube = (Complex::new(self.delta1, 0.0) + disc).powf(1.0 / 3.0);
        let q = cube * 0.5_f64.powf(1.0 / 3.0);
        let inner = (q + Complex::new(self.delta0, 0.0) / q) / 3.0
            - Complex::new(2.0 * self.k / 3.0, 0.0);
        (inner.sqrt() * 0.5).re
    }

    /// `S` through the trigonometric form, valid for a negative discriminant.
    fn s_trig(&self) -> Real {
        let phi = (self.delta1 / (2.0 * self.delta0.powi(3).sqrt())).acos();
        let w = -2.0 * self.k / 3.0 + 2.0 / 3.0 * self.delta0.sqrt() * (phi / 3.0).cos();
        // Real part of 0.5·√w, which is zero for negative w.
        if w >= 0.0 {
            0.5 * w.sqrt()
        } else {
            0.0
        }
    }

    fn s(&self) -> Real {
        if self.discriminant() >= 0.0 {
            self.s_cardano()
        } else {
            self.s_trig()
        }
    }
}

/// One real root of `A z⁴ + B z³ + C z² + D z + E`, namely
/// `−b/4 − S + ½√(−4S² − 2k + m/S)`.
///
/// `NaN` when that root is complex or the resolvent degenerates.
pub fn quartic_root(coeffs: [Real; 5]) -> Real {
    let dep = Depressed::new(coeffs);
    let s = dep.s();
    let w = -4.0 * s * s - 2.0 * dep.k + dep.m / s;
    if !(w >= 0.0) {
        return Real::NAN;
    }
    let z = -dep.b / 4.0 - s + 0.5 * w.sqrt();
    if z.is_finite() {
        z
    } else {
        Real::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monic(roots: [Real; 4]) -> [Real; 5] {
        let mut c = vec![1.0];
        for r in roots {
            let mut next = vec![0.0; c.len() + 1];
            for (i, a) in c.iter().enumerate() {
                next[i] += a;
                next[i + 1] -= a * r;
            }
            c = next;
        }
        [c[0], c[1], c[2], c[3], c[4]]
    }

    fn eval(coeffs: [Real; 5], z: Real) -> Real {
        coeffs.iter().fold(0.0, |acc, c| acc * z + c)
    }

    #[test]
    fn double_root_sits_on_the_branch_boundary() {
        let dep = Depressed::new(monic([1.0, 2.0, 3.0, 3.0]));
        assert!(dep.discriminant().abs() < 1e-9);
        assert!((dep.s_cardano() - 0.75).abs() < 1e-9);
        assert!((dep.s_trig() - 0.75).abs() < 1e-9);
        assert!((quartic_root(monic([1.0, 2.0, 3.0, 3.0])) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn branches_agree_across_the_boundary() {
        let base = monic([1.0, 2.0, 3.0, 3.0]);
        let mut above = base;
        above[4] += 1e-6;
        let mut below = base;
        below[4] -= 1e-6;

        let up = Depressed::new(above);
        let down = Depressed::new(below);
        assert!(up.discriminant() > 0.0);
        assert!(down.discriminant() < 0.0);

        // Both sides of the switch give nearly the same resolvent.
        assert!((up.s() - down.s()).abs() < 1e-5);
        // With a negative discriminant the complex path is still valid and
        // must match the trigonometric one.
        assert!((down.s_cardano() - down.s_trig()).abs() < 1e-9);

        for coeffs in [above, below] {
            let z = quartic_root(coeffs);
            assert!((z - 2.0).abs() < 1e-5, "z={z}");
            assert!(eval(coeffs, z).abs() < 1e-9);
        }
    }

    #[test]
    fn root_solves_quartics_with_distinct_roots() {
        for roots in [[-1.0, 0.5, 2.0, 4.0], [-3.0, -1.0, 1.0, 6.0], [0.1, 0.2, 0.7, 1.5]] {
            let coeffs = monic(roots);
            let z = quartic_root(coeffs);
            assert!(z.is_finite());
            assert!(eval(coeffs, z).abs() < 1e-8, "roots={roots:?} z={z}");
        }
    }

    #[test]
    fn tan_diaboloid_vertex_and_reference_values() {
        let (p, q, theta) = (30.0, 0.3, 0.03);
        assert!(tan_col_diaboloid_height(0.0, 0.0, p, q, theta).abs() < 1e-12);
        let z = tan_col_diaboloid_height(0.05, 0.01, p, q, theta);
        assert!((z - 0.003367850516270199).abs() < 1e-10, "z={z}");
        let z = tan_col_diaboloid_height(-0.1, 0.0, p, q, theta);
        assert!((z - 2.503797877029257e-06).abs() < 1e-10, "z={z}");
    }

    #[test]
    fn tan_diaboloid_height_solves_its_quartic() {
        let (p, q, theta) = (10.0, 2.0, 0.05);
        for i in -4..=4 {
            let x = 0.025 * i as Real;
            let y = 0.0025 * i as Real;
            let coeffs = tan_col_diaboloid_quartic(x, y, p, q, theta);
            let z = tan_col_diaboloid_height(x, y, p, q, theta);
            assert!(z.is_finite());
            assert!(eval(coeffs, z).abs() < 1e-10, "x={x} y={y}");
            // Symmetric in y.
            assert_eq!(z, tan_col_diaboloid_height(x, -y, p, q, theta));
        }
    }

    #[test]
    fn sag_diaboloid_reference_values() {
        let (p, q, theta) = (30.0, 0.3, 0.03);
        assert!(sag_col_diaboloid_height(0.0, 0.0, p, q, theta).abs() < 1e-15);
        let z = sag_col_diaboloid_height(0.05, 0.01, p, q, theta);
        assert!((z - 9.429448734895946e-05).abs() < 1e-14, "z={z}");
        let z = sag_col_diaboloid_height(-0.1, 0.0, p, q, theta);
        assert!((z - 0.00021786177871587238).abs() < 1e-14, "z={z}");
    }

    #[test]
    fn sag_diaboloid_outside_domain_is_nan() {
        assert!(sag_col_diaboloid_height(50.0, 0.0, 30.0, 0.3, 0.03).is_nan());
    }
}
