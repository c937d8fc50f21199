//! Interpolation on structured grids.
//!
//! This module provides the tensor-product spline interpolant in its object
//! form ([`Interpolator`]) and as one-shot free functions for 1-D, 2-D and
//! 3-D data.

mod basis;
pub mod boundary;
pub mod common;
pub mod grid;
pub mod interpolator;
pub mod method;
pub mod options;
mod slopes;
mod tensor;

use ndarray::{ArrayView1, ArrayView2, ArrayView3, ArrayViewD};

use crate::error::Result;

pub use boundary::{BoundaryPolicy, BoundarySpec, Extrapolation};
pub use grid::Grid;
pub use interpolator::{Interpolator, Sensitivity};
pub use method::{get_method, Method};
pub use options::{DerivativeOrder, InterpOptions, PeriodSpec, MAX_DERIVATIVE};
pub use slopes::estimate_slopes;

/// Interpolate 1-D data at the query points `xq`.
///
/// Uses `options.derivative` as the derivative order.
pub fn interp1d(xq: &[f64], x: &[f64], f: &[f64], options: &InterpOptions) -> Result<Vec<f64>> {
    evaluate_once(&[x], ArrayView1::from(f).into_dyn(), &[xq], options)
}

/// Interpolate 2-D data at the query points `(xq[i], yq[i])`.
pub fn interp2d(
    xq: &[f64],
    yq: &[f64],
    x: &[f64],
    y: &[f64],
    f: ArrayView2<f64>,
    options: &InterpOptions,
) -> Result<Vec<f64>> {
    evaluate_once(&[x, y], f.into_dyn(), &[xq, yq], options)
}

/// Interpolate 3-D data at the query points `(xq[i], yq[i], zq[i])`.
#[allow(clippy::too_many_arguments)]
pub fn interp3d(
    xq: &[f64],
    yq: &[f64],
    zq: &[f64],
    x: &[f64],
    y: &[f64],
    z: &[f64],
    f: ArrayView3<f64>,
    options: &InterpOptions,
) -> Result<Vec<f64>> {
    evaluate_once(&[x, y, z], f.into_dyn(), &[xq, yq, zq], options)
}

fn evaluate_once(
    nodes: &[&[f64]],
    values: ArrayViewD<f64>,
    coords: &[&[f64]],
    options: &InterpOptions,
) -> Result<Vec<f64>> {
    let orders = options.derivative.resolve(nodes.len())?;
    let interp = Interpolator::new(nodes, values, options)?;
    interp.evaluate_points(coords, &orders)
}
