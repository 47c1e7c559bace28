//! Core geometry for X-ray mirror figure fitting.
//!
//! This crate contains:
//! - math aliases and NaN-aware grid reductions (`Real`, `Grid`, ...),
//! - closed-form standard-frame evaluators for ellipsoids, hyperboloids,
//!   their cylinders and two collimating diaboloids ([`standard`]),
//! - the rigid standard → metrology transform ([`transform`]),
//! - the fixed-point reconciler that samples a rotated surface on a fixed
//!   lateral grid ([`reconcile`]),
//! - height and slope generators used by the fitting layer ([`generate`]).
//!
//! Surface pipeline:
//! `v(x, y) = generator ∘ reconcile(T(pose)) ∘ standard(p, q, θ)`
//!
//! Undefined geometry (negative discriminant, complex roots) is reported as
//! `NaN` at the affected sample and never as an error.

/// Linear algebra aliases, grids and NaN-aware helpers.
pub mod math;
/// Surface-kind decision table.
pub mod surface;
/// Standard-frame evaluators.
pub mod standard;
/// Rigid transforms.
pub mod transform;
/// Iterative frame reconciliation.
pub mod reconcile;
/// Metrology-frame generators.
pub mod generate;
/// Deterministic synthetic grids and noise.
pub mod synthetic;

pub use generate::*;
pub use math::*;
pub use reconcile::{ConvergenceResult, ReconcileError, ReconcileOptions, Reconciled};
pub use standard::{StandardSurface, SurfaceParams};
pub use surface::{Curvature, QuadricFamily, SurfaceKind};
pub use transform::{compose_transformation_matrix, Pose};
