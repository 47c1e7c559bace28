//! Post-fit statistics: residual variance, parameter covariance and
//! confidence intervals.

use log::warn;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use xmf_core::Real;

/// Smallest accepted ratio between the extreme singular values of the
/// column-scaled Jacobian.
const RCOND: Real = 1e-12;

/// Absolute interval `[lower, upper]` around a fitted value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: Real,
    pub upper: Real,
}

impl ConfidenceInterval {
    /// Interval of a parameter that was not estimated.
    pub fn undefined() -> Self {
        Self {
            lower: Real::NAN,
            upper: Real::NAN,
        }
    }

    /// `value ± k·σ`.
    pub fn around(value: Real, sigma: Real, k: Real) -> Self {
        Self {
            lower: value - k * sigma,
            upper: value + k * sigma,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }

    pub fn half_width(&self) -> Real {
        0.5 * (self.upper - self.lower)
    }

    pub fn contains(&self, value: Real) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Outcome of the covariance estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceStatus {
    Ok,
    /// The Jacobian is rank deficient, or there are fewer residuals than
    /// free parameters.
    Singular,
    /// Nothing was estimated.
    NoFreeParameters,
}

/// Scaled parameter covariance `s²·(JᵀJ)⁻¹`.
#[derive(Debug, Clone)]
pub struct ParamCovariance {
    pub matrix: DMatrix<Real>,
    /// Residual variance `s² = Σr² / dof`.
    pub residual_variance: Real,
    pub dof: usize,
}

impl ParamCovariance {
    /// Standard deviations (square roots of the diagonal).
    pub fn std_devs(&self) -> DVector<Real> {
        self.matrix.diagonal().map(|v| v.max(0.0).sqrt())
    }
}

/// Degrees of freedom `max(1, m − n)`.
pub fn degrees_of_freedom(num_residuals: usize, num_params: usize) -> usize {
    num_residuals.saturating_sub(num_params).max(1)
}

/// Estimate the covariance from the Jacobian and residuals at the optimum.
///
/// The normal matrix is inverted through an SVD of the column-scaled
/// Jacobian. Returns `None` when a column is zero or the scaled Jacobian is
/// numerically rank deficient.
pub fn estimate_covariance(
    jac: &DMatrix<Real>,
    residuals: &DVector<Real>,
) -> Option<ParamCovariance> {
    let (m, n) = jac.shape();
    if n == 0 {
        return None;
    }
    if m < n {
        warn!("covariance needs at least {n} residuals, got {m}");
        return None;
    }

    let norms: Vec<Real> = jac.column_iter().map(|c| c.norm()).collect();
    if norms.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
        warn!("a free parameter does not affect the residuals; confidence intervals undefined");
        return None;
    }
    let mut scaled = jac.clone();
    for (j, &s) in norms.iter().enumerate() {
        scaled.column_mut(j).unscale_mut(s);
    }

    let svd = scaled.svd(false, true);
    let sv = &svd.singular_values;
    let (s_max, s_min) = (sv.max(), sv.min());
    if !(s_min > RCOND * s_max) {
        warn!(
            "Jacobian is rank deficient (condition {:e}); confidence intervals undefined",
            s_max / s_min
        );
        return None;
    }
    let v_t = svd.v_t.as_ref()?;

    // (JᵀJ)⁻¹ = D⁻¹ V Σ⁻² Vᵀ D⁻¹ with D = diag(column norms).
    let inv_sq = DMatrix::from_diagonal(&sv.map(|s| 1.0 / (s * s)));
    let mut inv = v_t.transpose() * inv_sq * v_t;
    for i in 0..n {
        for j in 0..n {
            inv[(i, j)] /= norms[i] * norms[j];
        }
    }

    let dof = degrees_of_freedom(m, n);
    let residual_variance = residuals.norm_squared() / dof as Real;
    Some(ParamCovariance {
        matrix: inv * residual_variance,
        residual_variance,
        dof,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_covariance() {
        // y = a + b·t over t = 0..4 with residuals ±0.1.
        let t = [0.0, 1.0, 2.0, 3.0, 4.0];
        let jac = DMatrix::from_fn(5, 2, |i, j| if j == 0 { 1.0 } else { t[i] });
        let r = DVector::from_vec(vec![0.1, -0.1, 0.1, -0.1, 0.1]);

        let cov = estimate_covariance(&jac, &r).unwrap();
        assert_eq!(cov.dof, 3);
        assert!((cov.residual_variance - 0.05 / 3.0).abs() < 1e-15);

        // (JᵀJ)⁻¹ for this design is [[0.6, -0.2], [-0.2, 0.1]].
        let expected = DMatrix::from_row_slice(2, 2, &[0.6, -0.2, -0.2, 0.1]) * (0.05 / 3.0);
        assert!((cov.matrix - expected).amax() < 1e-14);
    }

    #[test]
    fn mixed_parameter_scales_are_not_singular() {
        // Same design as above with columns in very different units.
        let t = [0.0, 1.0, 2.0, 3.0, 4.0];
        let jac = DMatrix::from_fn(5, 2, |i, j| if j == 0 { 1e-6 } else { 1e3 * t[i] });
        let r = DVector::from_vec(vec![0.1, -0.1, 0.1, -0.1, 0.1]);

        let cov = estimate_covariance(&jac, &r).unwrap();
        let s2 = 0.05 / 3.0;
        let expected = [
            [0.6 * s2 / 1e-12, -0.2 * s2 / 1e-3],
            [-0.2 * s2 / 1e-3, 0.1 * s2 / 1e6],
        ];
        for i in 0..2 {
            for j in 0..2 {
                let rel = (cov.matrix[(i, j)] - expected[i][j]).abs() / expected[i][j].abs();
                assert!(rel < 1e-9, "({i}, {j}): {rel}");
            }
        }
    }

    #[test]
    fn rank_deficient_jacobian_is_singular() {
        // Second column never moves the residuals.
        let jac = DMatrix::from_fn(4, 2, |i, j| if j == 0 { i as Real + 1.0 } else { 0.0 });
        let r = DVector::from_element(4, 0.01);
        assert!(estimate_covariance(&jac, &r).is_none());

        // Two parameters with the same effect.
        let twins = DMatrix::from_fn(4, 2, |i, _| i as Real + 1.0);
        assert!(estimate_covariance(&twins, &r).is_none());

        let short = DMatrix::from_element(1, 2, 1.0);
        assert!(estimate_covariance(&short, &DVector::zeros(1)).is_none());
    }

    #[test]
    fn dof_never_drops_below_one() {
        assert_eq!(degrees_of_freedom(3, 3), 1);
        assert_eq!(degrees_of_freedom(2, 5), 1);
        assert_eq!(degrees_of_freedom(100, 6), 94);
    }

    #[test]
    fn interval_helpers() {
        let ci = ConfidenceInterval::around(1.0, 0.25, 2.0);
        assert_eq!((ci.lower, ci.upper), (0.5, 1.5));
        assert_eq!(ci.half_width(), 0.5);
        assert!(ci.contains(1.2) && !ci.contains(1.6));
        assert!(!ConfidenceInterval::undefined().is_defined());
    }
}
