//! Fit driver: resolves starting values and free/fixed specs, runs the
//! solver and packages residuals, fitted values and confidence intervals.

use log::{info, warn};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use xmf_core::{
    nan_mean, nan_rms, same_shape, GenerateError, Generator, Grid, ModelError, ReconcileOptions,
    Real, SurfaceModel,
};

use crate::backend_lm::LmBackend;
use crate::params::{default_free_mask, FreeSpec, InputParams, ParamMap, ParamName, ParamSpec};
use crate::problem::SurfaceFitProblem;
use crate::stats::{
    degrees_of_freedom, estimate_covariance, ConfidenceInterval, CovarianceStatus,
};
use crate::traits::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};

/// Options for [`optimize_parameters`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub solve: SolveOptions,
    /// Frame reconciliation used by every model evaluation.
    pub reconcile: ReconcileOptions,
    /// Offset added to the start value of every free parameter.
    pub start_perturbation: Real,
    /// Confidence intervals are `value ± confidence_sigma·σ`.
    pub confidence_sigma: Real,
    /// Penalty residual reported to the solver for samples the model cannot
    /// reach at trial parameters. It pushes the solver back into the
    /// surface domain; `None` derives it from the measurement with
    /// [`undefined_penalty`].
    pub undefined_residual: Option<Real>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            solve: SolveOptions::default(),
            reconcile: ReconcileOptions::default(),
            start_perturbation: 1e-6,
            confidence_sigma: 2.0,
            undefined_residual: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FitError {
    #[error("missing initial value for `{0}`")]
    MissingParameter(ParamName),
    #[error("input shapes differ: x {x:?}, y {y:?}, v {v:?}")]
    ShapeMismatch {
        x: (usize, usize),
        y: (usize, usize),
        v: (usize, usize),
    },
    #[error("no finite samples to fit")]
    NoValidSamples,
    #[error("invalid tolerance for `{name}`: [{lower}, {upper}]")]
    InvalidTolerance {
        name: ParamName,
        lower: Real,
        upper: Real,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Solver and statistics diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub solve: SolveReport,
    pub covariance: CovarianceStatus,
    /// RMS of the finite entries of the residual grid.
    pub residual_rms: Real,
    pub dof: usize,
    /// Samples taking part in the fit.
    pub num_residuals: usize,
    pub num_free: usize,
}

/// Outcome of one fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    /// `v − v_fit`, `NaN` where either side is undefined.
    pub residual: Grid,
    pub fitted: Grid,
    pub params: ParamMap<Real>,
    /// Absolute intervals; undefined for fixed parameters and when the
    /// covariance is singular.
    pub confidence: ParamMap<ConfidenceInterval>,
    /// `true` for the parameters the solver moved.
    pub optimized: ParamMap<bool>,
    /// Resolved starting values before perturbation.
    pub initial: ParamMap<Real>,
    pub report: FitReport,
}

impl FitResult {
    pub fn param(&self, name: ParamName) -> Real {
        self.params[name]
    }

    pub fn interval(&self, name: ParamName) -> ConfidenceInterval {
        self.confidence[name]
    }
}

/// Starting value of every parameter.
///
/// `p`, `q` and `theta` must be given. Missing `x_i` / `y_i` default to the
/// mean coordinate over the finite samples of `v`; the remaining pose
/// entries default to zero.
pub fn resolve_initial(
    input: &InputParams,
    x: &Grid,
    y: &Grid,
    v: &Grid,
) -> Result<ParamMap<Real>, FitError> {
    let mean_where_valid = |coord: &Grid| {
        nan_mean(
            coord
                .iter()
                .zip(v.iter())
                .filter(|(_, vi)| vi.is_finite())
                .map(|(c, _)| *c),
        )
    };

    let mut out = ParamMap::<Real>::default();
    for name in ParamName::ALL {
        out[name] = match (name, input.get(name)) {
            (_, Some(value)) => value,
            (ParamName::P | ParamName::Q | ParamName::Theta, None) => {
                return Err(FitError::MissingParameter(name))
            }
            (ParamName::Xi, None) => mean_where_valid(x),
            (ParamName::Yi, None) => mean_where_valid(y),
            (_, None) => 0.0,
        };
    }
    Ok(out)
}

/// Data-scaled penalty for undefined trial samples: ten times the
/// peak-to-valley of the finite measurement, or 1 when that is zero.
pub fn undefined_penalty(v: &Grid) -> Real {
    let (lo, hi) = v
        .iter()
        .filter(|vi| vi.is_finite())
        .fold((Real::INFINITY, Real::NEG_INFINITY), |(lo, hi), &vi| {
            (lo.min(vi), hi.max(vi))
        });
    let pv = hi - lo;
    if pv.is_finite() && pv > 0.0 {
        10.0 * pv
    } else {
        1.0
    }
}

/// Resolve the free/fixed state and bounds of every parameter.
///
/// Free parameters start at `initial + perturbation`; tolerance bounds are
/// taken around that start.
pub fn resolve_specs(
    generator: Generator,
    initial: &ParamMap<Real>,
    spec: &FreeSpec,
    perturbation: Real,
) -> Result<ParamMap<ParamSpec>, FitError> {
    let defaults = default_free_mask(generator);
    let unbounded = |start: Real| ParamSpec::Free {
        initial: start,
        lower: Real::NEG_INFINITY,
        upper: Real::INFINITY,
    };

    let mut out = ParamMap::from_fn(|name| ParamSpec::Fixed(initial[name]));
    for name in ParamName::ALL {
        let start = initial[name] + perturbation;
        let free_by_default = defaults[name];
        out[name] = match spec {
            FreeSpec::Defaults if free_by_default => unbounded(start),
            FreeSpec::Defaults => continue,
            FreeSpec::Flags(flags) => {
                if flags[name].unwrap_or(free_by_default) {
                    unbounded(start)
                } else {
                    continue;
                }
            }
            FreeSpec::Tolerances(tols) => match tols[name] {
                None if free_by_default => unbounded(start),
                None => continue,
                Some(tol) if tol.is_zero() => continue,
                Some(tol) => {
                    let (lo, hi) = tol.offsets();
                    if lo.is_nan() || hi.is_nan() || lo > hi {
                        return Err(FitError::InvalidTolerance {
                            name,
                            lower: lo,
                            upper: hi,
                        });
                    }
                    ParamSpec::Free {
                        initial: start,
                        lower: start + lo,
                        upper: start + hi,
                    }
                }
            },
        };
    }
    Ok(out)
}

/// Fit `model` to the samples `v` taken at `(x, y)` with the default
/// Levenberg–Marquardt backend.
///
/// 1D generators ignore the content of `y`, but it must still match the
/// shape of `x`.
pub fn optimize_parameters(
    model: SurfaceModel,
    x: &Grid,
    y: &Grid,
    v: &Grid,
    input: &InputParams,
    free: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    optimize_parameters_with(&LmBackend, model, x, y, v, input, free, options)
}

/// [`optimize_parameters`] with an explicit solver backend.
#[allow(clippy::too_many_arguments)]
pub fn optimize_parameters_with<B: NllsSolverBackend>(
    backend: &B,
    model: SurfaceModel,
    x: &Grid,
    y: &Grid,
    v: &Grid,
    input: &InputParams,
    free: &FreeSpec,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    if !same_shape(x, y) || !same_shape(x, v) {
        return Err(FitError::ShapeMismatch {
            x: x.shape(),
            y: y.shape(),
            v: v.shape(),
        });
    }
    if !v.iter().any(|vi| vi.is_finite()) {
        return Err(FitError::NoValidSamples);
    }

    let initial = resolve_initial(input, x, y, v)?;
    let specs = resolve_specs(
        model.generator(),
        &initial,
        free,
        options.start_perturbation,
    )?;
    let optimized = specs.map(|_, s| s.is_free());

    let problem = SurfaceFitProblem::new(
        model,
        x,
        y,
        v,
        &specs,
        options.reconcile,
        options.undefined_residual.unwrap_or_else(|| undefined_penalty(v)),
    )?;
    let names = problem.free_names();
    info!(
        "fitting {model}: {} samples, free [{}]",
        problem.num_residuals(),
        names
            .iter()
            .map(|n| n.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let (params, solve) = if names.is_empty() {
        let start = problem.start_params();
        let r = problem.raw_residuals(&start);
        let cost = 0.5 * r.iter().filter(|v| v.is_finite()).map(|v| v * v).sum::<Real>();
        let report = SolveReport {
            evaluations: 0,
            final_cost: cost,
            converged: true,
            termination: "no free parameters".to_string(),
        };
        (start, report)
    } else {
        let (u, report) = backend.solve(&problem, problem.initial_internal(), &options.solve);
        if !report.converged {
            warn!("solver stopped without converging: {}", report.termination);
        }
        (problem.params_from_internal(&u), report)
    };

    let fitted = problem.evaluate(&params)?;
    let residual = v.zip_map(&fitted, |vi, fi| vi - fi);

    let mut confidence = ParamMap::from_fn(|_| ConfidenceInterval::undefined());
    let (covariance, dof) = if names.is_empty() {
        (
            CovarianceStatus::NoFreeParameters,
            degrees_of_freedom(problem.num_residuals(), 0),
        )
    } else {
        let external = DVector::from_iterator(names.len(), names.iter().map(|n| params[*n]));
        let (jac, r) = problem.external_jacobian(&external);
        let keep: Vec<usize> = (0..r.len()).filter(|&i| r[i].is_finite()).collect();
        let jac = jac.select_rows(keep.iter());
        let r = r.select_rows(keep.iter());

        match estimate_covariance(&jac, &r) {
            Some(cov) => {
                for (name, sigma) in names.iter().zip(cov.std_devs().iter()) {
                    confidence[*name] =
                        ConfidenceInterval::around(params[*name], *sigma, options.confidence_sigma);
                }
                (CovarianceStatus::Ok, cov.dof)
            }
            None => (
                CovarianceStatus::Singular,
                degrees_of_freedom(keep.len(), names.len()),
            ),
        }
    };

    let report = FitReport {
        solve,
        covariance,
        residual_rms: nan_rms(residual.iter().copied()),
        dof,
        num_residuals: problem.num_residuals(),
        num_free: names.len(),
    };
    info!(
        "{model}: residual rms {:.3e}, {} evaluations, covariance {:?}",
        report.residual_rms, report.solve.evaluations, report.covariance
    );

    Ok(FitResult {
        residual,
        fitted,
        params,
        confidence,
        optimized,
        initial,
        report,
    })
}
