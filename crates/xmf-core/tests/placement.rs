//! Placing standard surfaces in the metrology frame.

use xmf_core::reconcile::reconcile_height;
use xmf_core::standard::quadric_cylinder_height;
use xmf_core::synthetic::{linspace, meshgrid};
use xmf_core::transform::to_standard;
use xmf_core::{
    Curvature, Generator, Grid, Pose, Pt3, ReconcileOptions, StandardSurface, SurfaceModel,
    SurfaceParams,
};

const PARAMS: SurfaceParams = SurfaceParams {
    p: 30.0,
    q: 0.3,
    theta: 0.03,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tilted() -> Pose {
    Pose {
        x_i: 1e-3,
        y_i: -2e-4,
        z_i: 5e-6,
        alpha: 2e-5,
        beta: -4e-5,
        gamma: 1e-5,
    }
}

#[test]
fn generated_points_lie_on_the_standard_surface() {
    init_logger();
    let (x, y) = meshgrid(&linspace(-0.1, 0.1, 21), &linspace(-0.01, 0.01, 5));
    let pose = tilted();
    let iso = pose.to_isometry();

    for surface in [
        StandardSurface::Ellipsoid(Curvature::Concave),
        StandardSurface::Hyperboloid(Curvature::Convex),
        StandardSurface::SagColDiaboloid,
    ] {
        let model = SurfaceModel::new(Generator::FullSurface, surface).unwrap();
        let z = model
            .generate(&x, &y, &PARAMS, &pose, None, &ReconcileOptions::default())
            .unwrap();
        for ((xm, ym), zm) in x.iter().zip(y.iter()).zip(z.iter()) {
            let ps = to_standard(&iso, &Pt3::new(*xm, *ym, *zm));
            let on_surface = surface.height(ps.x, ps.y, &PARAMS);
            assert!(
                (ps.z - on_surface).abs() < 1e-11,
                "{surface} at ({xm}, {ym}): {:e}",
                ps.z - on_surface
            );
        }
    }
}

#[test]
fn seeded_generation_starts_at_the_fixed_point() {
    init_logger();
    let (x, y) = meshgrid(&linspace(-0.1, 0.1, 21), &linspace(-0.01, 0.01, 5));
    let surface = StandardSurface::Ellipsoid(Curvature::Convex);
    let height = |xs, ys| surface.height(xs, ys, &PARAMS);
    let opts = ReconcileOptions::default();

    let cold = reconcile_height(height, &tilted(), &x, &y, None, &opts).unwrap();
    let warm = reconcile_height(height, &tilted(), &x, &y, Some(&cold.z), &opts).unwrap();

    assert!(cold.convergence.converged);
    assert_eq!(warm.convergence.iterations, 1);
    for (a, b) in cold.z.iter().zip(warm.z.iter()) {
        assert!((a - b).abs() < 1e-14);
    }
}

#[test]
fn convex_hyperbolic_cylinder_is_the_right_branch() {
    let xs = linspace(-0.1, 0.1, 11);
    let (x, y) = meshgrid(&xs, &[0.0, 0.005]);
    let model = SurfaceModel::new(
        Generator::Cylinder,
        StandardSurface::HyperbolicCylinder(Curvature::Convex),
    )
    .unwrap();
    let z = model
        .generate(&x, &y, &PARAMS, &Pose::default(), None, &ReconcileOptions::default())
        .unwrap();

    for (j, xj) in xs.iter().enumerate() {
        let expected = quadric_cylinder_height(*xj, 30.0, -0.3, 0.03);
        assert!((z[(0, j)] - expected).abs() < 1e-15);
        assert!((z[(1, j)] - expected).abs() < 1e-15);
    }
}

#[test]
fn samples_off_the_mirror_are_nan() {
    init_logger();
    // The ellipse spans at most 2a = p + q along x.
    let x = xmf_core::profile(&[-40.0, 0.0, 40.0]);
    let y = Grid::zeros(3, 1);
    let model = SurfaceModel::new(
        Generator::Profile1DHeight,
        StandardSurface::EllipticCylinder(Curvature::Concave),
    )
    .unwrap();
    let z = model
        .generate(&x, &y, &PARAMS, &Pose::default(), None, &ReconcileOptions::default())
        .unwrap();

    assert!(z[0].is_nan());
    assert!(z[1].abs() < 1e-15);
    assert!(z[2].is_nan());
}
