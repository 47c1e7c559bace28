//! Noisy metrology scenarios: mirrors measured on a stitching grid with
//! sub-nanometre white noise.

use anyhow::Result;
use xmf::core::synthetic::{linspace, meshgrid, GaussianNoise};
use xmf::core::{nan_rms, ReconcileOptions};
use xmf::prelude::*;

const SIGMA: Real = 0.5e-9;

fn noisy_measurement(surface: StandardSurface, pose: &Pose) -> Result<(Grid, Grid, Grid)> {
    let (x, y) = meshgrid(&linspace(-0.1, 0.1, 201), &linspace(-0.01, 0.01, 21));
    let model = SurfaceModel::new(Generator::FullSurface, surface)?;
    let exact = model.generate(
        &x,
        &y,
        &SurfaceParams::new(30.0, 0.3, 0.03),
        pose,
        None,
        &ReconcileOptions::default(),
    )?;
    let z = GaussianNoise::new(7, SIGMA).apply(&exact)?;
    Ok((x, y, z))
}

fn noisy_ellipsoid() -> Result<(Grid, Grid, Grid)> {
    noisy_measurement(StandardSurface::Ellipsoid(Curvature::Concave), &Pose::default())
}

#[test]
fn noisy_ellipsoid_intervals_cover_the_truth() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let (x, y, z) = noisy_ellipsoid()?;
    let input = InputParams::new(30.0, 0.3, 0.03);
    // Roll about the focal axis is a symmetry of the ellipsoid.
    let spec = FreeSpec::flags([("alpha", false)])?;
    let result = fit_concave_ellipsoid(&x, &y, &z, &input, &spec)?;

    assert_eq!(result.report.covariance, CovarianceStatus::Ok);
    assert_eq!(result.report.num_free, 5);
    assert_eq!(result.report.num_residuals, 201 * 21);
    assert_eq!(result.report.dof, 201 * 21 - 5);

    let rms = result.report.residual_rms;
    assert!((0.4e-9..0.6e-9).contains(&rms), "residual rms {rms:e}");
    assert!((nan_rms(result.residual.iter().copied()) - rms).abs() < 1e-15);

    for name in [
        ParamName::Xi,
        ParamName::Yi,
        ParamName::Zi,
        ParamName::Beta,
        ParamName::Gamma,
    ] {
        let ci = result.interval(name);
        assert!(ci.is_defined(), "{name}");
        let value = result.param(name);
        assert!(ci.contains(value), "{name}: {value:e} outside {ci:?}");
        // Truth is the zero pose.
        assert!(
            value.abs() <= 2.0 * ci.half_width(),
            "{name}: {value:e} vs half width {:e}",
            ci.half_width()
        );
    }
    assert!(!result.interval(ParamName::Alpha).is_defined());
    assert!(!result.interval(ParamName::P).is_defined());
    Ok(())
}

#[test]
fn tilted_hyperboloid_with_every_pose_component_free() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let truth = Pose {
        x_i: -1e-3,
        y_i: -2e-4,
        z_i: 3e-7,
        alpha: 2e-6,
        beta: 1e-5,
        gamma: 5e-4,
    };
    let (x, y, z) = noisy_measurement(StandardSurface::Hyperboloid(Curvature::Concave), &truth)?;
    let input = InputParams::new(30.0, 0.3, 0.03);
    let result = fit_concave_hyperboloid(&x, &y, &z, &input, &FreeSpec::Defaults)?;

    assert_eq!(result.report.num_free, 6);
    assert_eq!(result.report.covariance, CovarianceStatus::Ok);
    let rms = result.report.residual_rms;
    assert!((0.4e-9..0.6e-9).contains(&rms), "residual rms {rms:e}");

    for (name, expected) in [
        (ParamName::Xi, truth.x_i),
        (ParamName::Yi, truth.y_i),
        (ParamName::Zi, truth.z_i),
        (ParamName::Alpha, truth.alpha),
        (ParamName::Beta, truth.beta),
        (ParamName::Gamma, truth.gamma),
    ] {
        let ci = result.interval(name);
        assert!(ci.contains(expected), "{name}: {expected:e} outside {ci:?}");
    }
    for name in [ParamName::P, ParamName::Q, ParamName::Theta] {
        assert!(!result.optimized[name]);
    }
    Ok(())
}

#[test]
fn fit_result_serializes_to_json() -> Result<()> {
    let (x, y, z) = noisy_ellipsoid()?;
    let input = InputParams::new(30.0, 0.3, 0.03);
    let spec = FreeSpec::flags([("alpha", false)])?;
    let result = fit_concave_ellipsoid(&x, &y, &z, &input, &spec)?;

    let value = serde_json::to_value(&result)?;
    let beta = value["params"]["beta"].as_f64().unwrap_or(Real::NAN);
    assert!((beta - result.param(ParamName::Beta)).abs() < 1e-18);
    assert_eq!(value["optimized"]["alpha"], serde_json::Value::Bool(false));
    assert_eq!(value["report"]["covariance"], "Ok");
    // Undefined intervals carry no number.
    assert!(value["confidence"]["p"]["lower"].is_null());
    assert!(value["confidence"]["x_i"]["lower"].is_f64());
    Ok(())
}
