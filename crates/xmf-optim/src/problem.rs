//! Least-squares problem for one surface model against one measurement.
//!
//! The solver sees only the free parameters, in internal (unbounded)
//! coordinates; fixed parameters and the start values of the free ones live
//! in a full [`ParamMap`].

use log::debug;
use nalgebra::{DMatrix, DVector};
use xmf_core::{GenerateError, Grid, ReconcileOptions, Real, SurfaceModel};

use crate::bounds::{Bound, BoundTransform};
use crate::engine::FitError;
use crate::jacobian::forward_difference;
use crate::params::{ParamMap, ParamName, ParamSpec};
use crate::traits::NllsProblem;

#[derive(Debug, Clone, Copy)]
struct FreeParam {
    name: ParamName,
    transform: BoundTransform,
}

/// Residuals `v − v_fit` over the samples that are finite in the
/// measurement and in the model at the start values.
#[derive(Debug, Clone)]
pub struct SurfaceFitProblem {
    model: SurfaceModel,
    x: Grid,
    y: Grid,
    observed: Grid,
    /// Generator seed: the measurement with undefined samples set to zero.
    seed: Grid,
    /// Linear (column-major) indices of the fitted samples.
    rows: Vec<usize>,
    start: ParamMap<Real>,
    free: Vec<FreeParam>,
    reconcile: ReconcileOptions,
    undefined_residual: Real,
}

impl SurfaceFitProblem {
    pub fn new(
        model: SurfaceModel,
        x: &Grid,
        y: &Grid,
        observed: &Grid,
        specs: &ParamMap<ParamSpec>,
        reconcile: ReconcileOptions,
        undefined_residual: Real,
    ) -> Result<Self, FitError> {
        let mut free = Vec::new();
        let start = specs.map(|name, spec| match *spec {
            ParamSpec::Fixed(v) => v,
            ParamSpec::Free {
                initial,
                lower,
                upper,
            } => {
                let transform = BoundTransform::new(Bound::new(lower, upper));
                free.push(FreeParam { name, transform });
                transform.clamp_start(initial)
            }
        });

        let seed = observed.map(|v| if v.is_finite() { v } else { 0.0 });
        let model_start = model.generate(
            x,
            y,
            &start.surface(),
            &start.pose(),
            Some(&seed),
            &reconcile,
        )?;

        let rows: Vec<usize> = observed
            .iter()
            .zip(model_start.iter())
            .enumerate()
            .filter(|(_, (v, m))| v.is_finite() && m.is_finite())
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            return Err(FitError::NoValidSamples);
        }
        let dropped = observed.iter().filter(|v| v.is_finite()).count() - rows.len();
        if dropped > 0 {
            debug!("{dropped} measured samples fall outside the model at the start values");
        }

        Ok(Self {
            model,
            x: x.clone(),
            y: y.clone(),
            observed: observed.clone(),
            seed,
            rows,
            start,
            free,
            reconcile,
            undefined_residual,
        })
    }

    pub fn model(&self) -> SurfaceModel {
        self.model
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    /// Free parameters in solver order.
    pub fn free_names(&self) -> Vec<ParamName> {
        self.free.iter().map(|f| f.name).collect()
    }

    /// Full parameter set at the start of the solve.
    pub fn start_params(&self) -> ParamMap<Real> {
        self.start
    }

    /// Solver start vector.
    pub fn initial_internal(&self) -> DVector<Real> {
        DVector::from_iterator(
            self.free.len(),
            self.free
                .iter()
                .map(|f| f.transform.to_internal(self.start[f.name])),
        )
    }

    pub fn external_from_internal(&self, u: &DVector<Real>) -> DVector<Real> {
        DVector::from_iterator(
            self.free.len(),
            self.free
                .iter()
                .zip(u.iter())
                .map(|(f, &ui)| f.transform.to_external(ui)),
        )
    }

    /// Full parameter set with the free values taken from `external`.
    pub fn params_from_external(&self, external: &DVector<Real>) -> ParamMap<Real> {
        let mut params = self.start;
        for (f, &v) in self.free.iter().zip(external.iter()) {
            params[f.name] = v;
        }
        params
    }

    pub fn params_from_internal(&self, u: &DVector<Real>) -> ParamMap<Real> {
        self.params_from_external(&self.external_from_internal(u))
    }

    /// Model on the full grid.
    pub fn evaluate(&self, params: &ParamMap<Real>) -> Result<Grid, GenerateError> {
        self.model.generate(
            &self.x,
            &self.y,
            &params.surface(),
            &params.pose(),
            Some(&self.seed),
            &self.reconcile,
        )
    }

    /// Residuals on the fitted samples; `NaN` where the model is undefined.
    pub fn raw_residuals(&self, params: &ParamMap<Real>) -> DVector<Real> {
        match self.evaluate(params) {
            Ok(fit) => DVector::from_iterator(
                self.rows.len(),
                self.rows.iter().map(|&i| self.observed[i] - fit[i]),
            ),
            Err(err) => {
                debug!("model undefined at trial parameters: {err}");
                DVector::from_element(self.rows.len(), Real::NAN)
            }
        }
    }

    /// Jacobian with respect to the external free values, with the residuals
    /// it was taken at.
    pub fn external_jacobian(&self, external: &DVector<Real>) -> (DMatrix<Real>, DVector<Real>) {
        let r0 = self.raw_residuals(&self.params_from_external(external));
        let jac = forward_difference(
            |xe| self.raw_residuals(&self.params_from_external(xe)),
            external,
            &r0,
        );
        (jac, r0)
    }
}

impl NllsProblem for SurfaceFitProblem {
    fn num_params(&self) -> usize {
        self.free.len()
    }

    fn num_residuals(&self) -> usize {
        self.rows.len()
    }

    fn residuals(&self, u: &DVector<Real>) -> DVector<Real> {
        let fill = self.undefined_residual;
        self.raw_residuals(&self.params_from_internal(u))
            .map(|r| if r.is_finite() { r } else { fill })
    }

    fn jacobian(&self, u: &DVector<Real>) -> DMatrix<Real> {
        let external = self.external_from_internal(u);
        let (mut jac, _) = self.external_jacobian(&external);
        for (j, (f, &uj)) in self.free.iter().zip(u.iter()).enumerate() {
            let scale = f.transform.derivative(uj);
            jac.column_mut(j).scale_mut(scale);
        }
        jac
    }
}
