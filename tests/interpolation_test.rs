//! Integration tests for grid interpolation
//!
//! These tests check accuracy of every method against smooth closed-form
//! fields in one, two and three dimensions, along with the boundary and
//! periodic behaviour seen by callers.

mod common;

use common::assertions::{assert_all_nan, assert_allclose, assert_approx_eq};
use common::test_data;
use gridspline::{
    interp1d, interp2d, interp3d, BoundaryPolicy, Extrapolation, InterpOptions, Interpolator,
    Method,
};
use ndarray::ArrayView1;
use std::f64::consts::PI;
use std::thread;

/// Tolerance per method for `sin(x)` sampled at 100 nodes over one period.
fn tolerance_1d(method: Method) -> f64 {
    match method {
        Method::Nearest => 1e-1,
        Method::Linear => 1e-3,
        Method::Monotonic => 1e-3,
        Method::Monotonic0 => 1e-2,
        _ => 1e-5,
    }
}

#[test]
fn test_interp1d_accuracy_all_methods() {
    let xp = test_data::linspace(0.0, 2.0 * PI, 100);
    let fp: Vec<f64> = xp.iter().map(|x| x.sin()).collect();
    let xq = test_data::linspace(0.0, 2.0 * PI, 10_000);
    let expected: Vec<f64> = xq.iter().map(|x| x.sin()).collect();

    for method in Method::ALL {
        let options = InterpOptions::new(method);
        let free = interp1d(&xq, &xp, &fp, &options).unwrap();
        assert_allclose(&free, &expected, 1e-6, tolerance_1d(method));

        let interp = Interpolator::new_1d(&xp, ArrayView1::from(&fp[..]), &options).unwrap();
        let object = interp.evaluate_points(&[&xq], &[]).unwrap();
        assert_eq!(free, object, "{} free and object forms differ", method);
    }
}

#[test]
fn test_interp1d_scalar_query() {
    let xp = test_data::linspace(0.0, 2.0 * PI, 100);
    let fp: Vec<f64> = xp.iter().map(|x| x.sin()).collect();

    for method in Method::ALL {
        let fq = interp1d(&[0.0], &xp, &fp, &InterpOptions::new(method)).unwrap();
        assert_eq!(fq.len(), 1);
        assert_approx_eq(fq[0], 0.0, Some(1e-12));
    }
}

#[test]
fn test_cubic_matches_reference_scenario() {
    // sin on 100 nodes over [0, 2pi], queried at 200 points
    let xp = test_data::linspace(0.0, 2.0 * PI, 100);
    let fp: Vec<f64> = xp.iter().map(|x| x.sin()).collect();
    let xq = test_data::linspace(0.0, 2.0 * PI, 200);
    let expected: Vec<f64> = xq.iter().map(|x| x.sin()).collect();

    let fq = interp1d(&xq, &xp, &fp, &InterpOptions::new(Method::Cubic)).unwrap();
    assert_allclose(&fq, &expected, 1e-6, 1e-5);
}

#[test]
fn test_interp1d_extrapolation() {
    let xp = test_data::linspace(0.0, 2.0 * PI, 200);
    let fp: Vec<f64> = xp.iter().map(|x| x.sin()).collect();
    let xq = test_data::linspace(-1.0, 2.0 * PI + 1.0, 10_000);

    let fq = interp1d(&xq, &xp, &fp, &InterpOptions::new(Method::Cubic)).unwrap();
    assert!(fq[0].is_nan());
    assert!(fq[fq.len() - 1].is_nan());
    // Missing points do not spoil the rest of the batch
    assert!(fq[5_000].is_finite());

    let options = InterpOptions::new(Method::Cubic).with_extrapolation(true);
    let fq = interp1d(&xq, &xp, &fp, &options).unwrap();
    assert!(fq.iter().all(|v| v.is_finite()));

    let options = InterpOptions::new(Method::Cubic).with_boundary(BoundaryPolicy::new(
        Extrapolation::Fill(-5.0),
        Extrapolation::Missing,
    ));
    let fq = interp1d(&[-0.5, 1.0, 7.0], &xp, &fp, &options).unwrap();
    assert_eq!(fq[0], -5.0);
    assert_approx_eq(fq[1], 1.0_f64.sin(), Some(1e-5));
    assert!(fq[2].is_nan());
}

#[test]
fn test_interp1d_periodic() {
    let xp = test_data::linspace(0.0, 2.0 * PI, 200);
    let fp: Vec<f64> = xp.iter().map(|x| x.sin()).collect();
    let xq = test_data::linspace(-1.0, 2.0 * PI + 1.0, 10_000);
    let expected: Vec<f64> = xq.iter().map(|x| x.sin()).collect();

    let options = InterpOptions::new(Method::Cubic).with_period(2.0 * PI);
    let fq = interp1d(&xq, &xp, &fp, &options).unwrap();
    assert_allclose(&fq, &expected, 1e-6, 1e-4);
}

#[test]
fn test_periodic_query_matches_canonical_representative() {
    let xp = test_data::linspace_open(0.0, 2.0 * PI, 24);
    let fp: Vec<f64> = xp.iter().map(|x| (2.0 * x).cos() + 0.3 * x.sin()).collect();
    let xq = [0.1, 1.3, 2.9, 4.4, 6.0];
    let shifted: Vec<f64> = xq.iter().map(|x| x + 4.0 * PI).collect();
    let negative: Vec<f64> = xq.iter().map(|x| x - 2.0 * PI).collect();

    for method in Method::ALL {
        for derivative in 0..=2 {
            let options = InterpOptions::new(method)
                .with_period(2.0 * PI)
                .with_derivative(derivative);
            let base = interp1d(&xq, &xp, &fp, &options).unwrap();
            let up = interp1d(&shifted, &xp, &fp, &options).unwrap();
            let down = interp1d(&negative, &xp, &fp, &options).unwrap();
            assert_allclose(&up, &base, 0.0, 1e-9);
            assert_allclose(&down, &base, 0.0, 1e-9);
        }
    }
}

#[test]
fn test_periodic_seam_is_smooth() {
    let xp = test_data::linspace_open(0.0, 2.0 * PI, 40);
    let fp: Vec<f64> = xp.iter().map(|x| x.cos()).collect();
    let options = InterpOptions::new(Method::Cubic)
        .with_period(2.0 * PI)
        .with_derivative(1);

    let eps = 1e-9;
    let left = interp1d(&[2.0 * PI - eps], &xp, &fp, &options).unwrap()[0];
    let right = interp1d(&[eps], &xp, &fp, &options).unwrap()[0];
    assert_approx_eq(left, right, Some(1e-6));
    assert_approx_eq(right, 0.0, Some(1e-3));
}

#[test]
fn test_interp1d_monotonic_step() {
    // Linear ramp with a jump between nodes 1 and 2
    let x = test_data::linspace(-4.0, 5.0, 10);
    let f: Vec<f64> = x
        .iter()
        .map(|&v| test_data::heaviside(v - 1.5) + 0.1 * v)
        .collect();
    let xq = test_data::linspace(-4.0, 5.0, 1000);

    let slope = |method: Method| {
        let options = InterpOptions::new(method).with_derivative(1);
        interp1d(&xq, &x, &f, &options).unwrap()
    };
    let min = |v: &[f64]| v.iter().copied().fold(f64::INFINITY, f64::min);

    let dfc = slope(Method::Cubic);
    let dfm = slope(Method::Monotonic);
    let dfm0 = slope(Method::Monotonic0);

    assert!(min(&dfc) < 0.0, "cubic should undershoot");
    assert!(min(&dfm) > 0.0, "monotonic should stay increasing");
    assert!(min(&dfm0) >= -1e-14, "monotonic-0 should not overshoot");
    assert_approx_eq(dfm0[0], 0.0, Some(1e-12));
    assert_approx_eq(dfm0[dfm0.len() - 1], 0.0, Some(1e-12));
}

#[test]
fn test_second_derivative() {
    let xp = test_data::linspace(0.0, 2.0 * PI, 200);
    let fp: Vec<f64> = xp.iter().map(|x| x.sin()).collect();
    let xq = test_data::linspace(0.5, 5.5, 50);
    let expected: Vec<f64> = xq.iter().map(|x| -x.sin()).collect();

    let options = InterpOptions::new(Method::Cubic2).with_derivative(2);
    let fq = interp1d(&xq, &xp, &fp, &options).unwrap();
    assert_allclose(&fq, &expected, 0.0, 1e-3);
}

#[test]
fn test_interp1d_uneven_nodes() {
    let xp = test_data::uneven_nodes(0.0, 3.0, 60);
    let fp: Vec<f64> = xp.iter().map(|x| x.exp()).collect();
    let xq = test_data::linspace(0.0, 3.0, 500);
    let expected: Vec<f64> = xq.iter().map(|x| x.exp()).collect();

    for method in [
        Method::Cubic,
        Method::Cubic2,
        Method::CatmullRom,
        Method::Monotonic,
    ] {
        let fq = interp1d(&xq, &xp, &fp, &InterpOptions::new(method)).unwrap();
        assert_allclose(&fq, &expected, 1e-3, 1e-3);
    }
}

#[test]
fn test_interp2d_accuracy_periodic() {
    let xp = test_data::linspace(0.0, 2.0 * PI, 99);
    let yp = test_data::linspace(0.0, 2.0 * PI, 40);
    let field = |x: f64, y: f64| x.sin() * y.cos();
    let fp = test_data::grid_2d(&xp, &yp, field);

    // Queries run past one period in x and wrap around
    let xq = test_data::linspace(0.0, 3.0 * PI, 1000);
    let yq = test_data::linspace(0.0, 2.0 * PI, 1000);
    let expected: Vec<f64> = xq.iter().zip(&yq).map(|(&x, &y)| field(x, y)).collect();

    let cases = [
        (Method::Nearest, 0.2),
        (Method::Linear, 1e-2),
        (Method::Cubic, 2e-3),
        (Method::Cubic2, 2e-3),
        (Method::CatmullRom, 2e-3),
        (Method::Cardinal, 2e-3),
        (Method::Monotonic, 1e-2),
    ];

    for (method, atol) in cases {
        let options = InterpOptions::new(method).with_period(2.0 * PI);
        let free = interp2d(&xq, &yq, &xp, &yp, fp.view(), &options).unwrap();
        assert_allclose(&free, &expected, 1e-5, atol);

        let interp = Interpolator::new_2d(&xp, &yp, fp.view(), &options).unwrap();
        let object = interp.evaluate_points(&[&xq, &yq], &[]).unwrap();
        assert_eq!(free, object, "{} free and object forms differ", method);
    }
}

#[test]
fn test_interp2d_mixed_periodicity_and_derivatives() {
    let xp = test_data::linspace(0.0, 2.0, 30);
    let yp = test_data::linspace_open(0.0, 2.0 * PI, 96);
    let fp = test_data::grid_2d(&xp, &yp, |x, y| x * x * y.sin());

    let options = InterpOptions::new(Method::Cubic)
        .with_periods(vec![None, Some(2.0 * PI)])
        .with_derivatives(vec![1, 1]);

    let xq = [0.3, 1.1, 1.7];
    let yq = [-0.4, 2.0, 7.5];
    let fq = interp2d(&xq, &yq, &xp, &yp, fp.view(), &options).unwrap();
    for i in 0..3 {
        assert_approx_eq(fq[i], 2.0 * xq[i] * yq[i].cos(), Some(5e-3));
    }

    // Only the non-periodic axis can leave the domain
    let options = options.with_derivatives(vec![0, 0]);
    let fq = interp2d(&[2.5, 1.0], &[1.0, 20.0], &xp, &yp, fp.view(), &options).unwrap();
    assert!(fq[0].is_nan());
    assert_approx_eq(fq[1], 20.0_f64.sin(), Some(1e-3));
}

#[test]
fn test_interp2d_missing_on_any_axis() {
    let xp = test_data::linspace(0.0, 1.0, 5);
    let yp = test_data::linspace(0.0, 1.0, 6);
    let fp = test_data::grid_2d(&xp, &yp, |x, y| x + y);

    let options = InterpOptions::new(Method::Linear);
    let fq = interp2d(
        &[0.5, -0.1, 0.5, 1.2],
        &[0.5, 0.5, 1.1, -3.0],
        &xp,
        &yp,
        fp.view(),
        &options,
    )
    .unwrap();
    assert_approx_eq(fq[0], 1.0, Some(1e-12));
    assert_all_nan(&fq[1..]);

    let options = options.with_extrapolation(true);
    let fq = interp2d(&[1.5], &[-0.5], &xp, &yp, fp.view(), &options).unwrap();
    assert_approx_eq(fq[0], 1.0, Some(1e-12));
}

#[test]
fn test_interp3d_accuracy() {
    let xp = test_data::linspace(0.0, PI, 20);
    let yp = test_data::linspace(0.0, 2.0 * PI, 30);
    let zp = test_data::linspace(0.0, 3.0, 25);
    let field = |x: f64, y: f64, z: f64| x.sin() * y.cos() * z * z;
    let fp = test_data::grid_3d(&xp, &yp, &zp, field);

    let xq = test_data::linspace(0.0, PI, 1000);
    let yq = test_data::linspace(0.0, 2.0 * PI, 1000);
    let zq = test_data::linspace(0.0, 3.0, 1000);
    let expected: Vec<f64> = (0..1000).map(|i| field(xq[i], yq[i], zq[i])).collect();

    let cases = [
        (Method::Nearest, 1.0),
        (Method::Linear, 1e-1),
        (Method::Cubic, 5.5e-3),
        (Method::Cubic2, 5.5e-3),
        (Method::CatmullRom, 5.5e-3),
        (Method::Cardinal, 5.5e-3),
        (Method::Monotonic, 5e-2),
    ];

    for (method, atol) in cases {
        let options = InterpOptions::new(method);
        let free = interp3d(&xq, &yq, &zq, &xp, &yp, &zp, fp.view(), &options).unwrap();
        assert_allclose(&free, &expected, 1e-5, atol);

        let interp = Interpolator::new_3d(&xp, &yp, &zp, fp.view(), &options).unwrap();
        let object = interp.evaluate_points(&[&xq, &yq, &zq], &[]).unwrap();
        assert_eq!(free, object, "{} free and object forms differ", method);
    }

    let fq = interp3d(&[0.0], &[0.0], &[0.0], &xp, &yp, &zp, fp.view(), &InterpOptions::default())
        .unwrap();
    assert_approx_eq(fq[0], 0.0, Some(1e-12));
}

#[test]
fn test_interp3d_reproduces_trilinear_field() {
    let xp = test_data::uneven_nodes(-1.0, 1.0, 7);
    let yp = test_data::linspace(0.0, 4.0, 5);
    let zp = test_data::linspace(2.0, 3.0, 4);
    let field = |x: f64, y: f64, z: f64| 1.0 + x - 2.0 * y + 0.5 * z + x * y * z;
    let fp = test_data::grid_3d(&xp, &yp, &zp, field);

    let point = [0.3, 2.7, 2.2];
    for method in [Method::Linear, Method::Cubic, Method::Cubic2, Method::Monotonic] {
        let interp =
            Interpolator::new_3d(&xp, &yp, &zp, fp.view(), &InterpOptions::new(method)).unwrap();
        assert_approx_eq(
            interp.evaluate_point(&point, &[]).unwrap(),
            field(point[0], point[1], point[2]),
            Some(1e-10),
        );
        // d3f/dxdydz of the trilinear field is one everywhere
        assert_approx_eq(
            interp.evaluate_point(&point, &[1, 1, 1]).unwrap(),
            1.0,
            Some(1e-9),
        );
    }
}

#[test]
fn test_shared_interpolator_across_threads() {
    let xp = test_data::linspace(0.0, 2.0 * PI, 64);
    let yp = test_data::linspace(0.0, 1.0, 16);
    let fp = test_data::grid_2d(&xp, &yp, |x, y| x.sin() + y);
    let interp = Interpolator::new_2d(&xp, &yp, fp.view(), &InterpOptions::default())
        .unwrap()
        .into_shared();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let interp = interp.clone();
            thread::spawn(move || {
                let xq: Vec<f64> = (0..500).map(|i| (i + t) as f64 * 0.01).collect();
                let yq = [0.25 * t as f64];
                let values = interp.evaluate_points(&[&xq, &yq], &[]).unwrap();
                (xq, yq[0], values)
            })
        })
        .collect();

    for handle in handles {
        let (xq, y, values) = handle.join().unwrap();
        let expected: Vec<f64> = xq.iter().map(|x| x.sin() + y).collect();
        assert_allclose(&values, &expected, 0.0, 1e-3);
    }
}

#[test]
fn test_options_from_json() {
    let options: InterpOptions = serde_json::from_str(
        r#"{"method": "catmull-rom", "extrapolation": {"lower": "extend", "upper": {"fill": 2.0}}}"#,
    )
    .unwrap();
    let xp = [0.0, 1.0, 2.0, 3.0];
    let fp = [0.0, 1.0, 2.0, 3.0];

    let fq = interp1d(&[-1.0, 4.0], &xp, &fp, &options).unwrap();
    assert_approx_eq(fq[0], -1.0, Some(1e-12));
    assert_eq!(fq[1], 2.0);
}
