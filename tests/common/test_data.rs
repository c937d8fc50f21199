//! Test data generation utilities.
//!
//! Grids, smooth test fields and band-limited periodic signals with known
//! closed forms.

#![allow(dead_code)]

use ndarray::{Array2, Array3};
use std::f64::consts::PI;

/// `n` points from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (stop - start) / (n - 1) as f64;
    let mut points: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
    points[n - 1] = stop;
    points
}

/// `n` points from `start` towards `stop`, leaving out `stop`.
pub fn linspace_open(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let step = (stop - start) / n as f64;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Strictly increasing but unevenly spaced nodes on `[start, stop]`.
pub fn uneven_nodes(start: f64, stop: f64, n: usize) -> Vec<f64> {
    linspace(0.0, 1.0, n)
        .into_iter()
        .map(|u| start + (stop - start) * (u + 0.1 * (PI * u).sin() * u * (1.0 - u)))
        .collect()
}

/// Samples of `f` on the Cartesian product of `x` and `y`.
pub fn grid_2d(x: &[f64], y: &[f64], f: impl Fn(f64, f64) -> f64) -> Array2<f64> {
    Array2::from_shape_fn((x.len(), y.len()), |(i, j)| f(x[i], y[j]))
}

/// Samples of `f` on the Cartesian product of `x`, `y` and `z`.
pub fn grid_3d(x: &[f64], y: &[f64], z: &[f64], f: impl Fn(f64, f64, f64) -> f64) -> Array3<f64> {
    Array3::from_shape_fn((x.len(), y.len(), z.len()), |(i, j, k)| {
        f(x[i], y[j], z[k])
    })
}

/// Band-limited 1-D test signal, highest frequency 3.
pub fn band_limited_1d(x: f64) -> f64 {
    2.0 * x.sin() + 4.0 * (3.0 * x).cos() + 1.0
}

/// Band-limited 2-D test signal, highest frequencies 2 in x and 5 in y.
pub fn band_limited_2d(x: f64, y: f64) -> f64 {
    2.0 * x.sin() - 1.2 * (2.0 * x).cos() + 3.0 * (3.0 * y).cos() - 2.0 * (5.0 * y).cos() + 1.0
}

/// Step from 0 to 1 at `x = 0`.
pub fn heaviside(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        1.0
    }
}
