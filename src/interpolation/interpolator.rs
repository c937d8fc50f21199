//! The object form: an immutable interpolant over a 1-D, 2-D or 3-D grid.

use ndarray::{Array2, ArrayD, ArrayView1, ArrayView2, ArrayView3, ArrayViewD, IxDyn};
use std::sync::Arc;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::boundary::{self, BoundaryPolicy};
use super::common::{broadcast_len, broadcast_shape};
use super::grid::{Grid, Placement};
use super::method::Method;
use super::options::{check_orders, InterpOptions};
use super::tensor::{TensorSpline, MAX_DIMS};
use crate::error::{GridSplineError, Result};
use crate::logging::log_error;

/// Points evaluated per parallel task.
#[cfg(feature = "parallel")]
const CHUNK_SIZE: usize = 256;

/// Derivatives of one evaluated quantity with respect to the interpolant's data.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensitivity {
    /// The evaluated quantity.
    pub value: f64,
    /// Derivative with respect to each sample, in the sample array's shape.
    pub samples: ArrayD<f64>,
    /// Derivative with respect to each node coordinate, per axis.
    pub nodes: Vec<Vec<f64>>,
}

/// Tensor-product interpolant over sampled grid data.
///
/// All derivative tables are computed at construction. Evaluation takes
/// `&self` only, so one interpolant can serve any number of threads.
#[derive(Debug, Clone)]
pub struct Interpolator {
    method: Method,
    tension: f64,
    boundaries: Vec<BoundaryPolicy>,
    grids: Vec<Grid>,
    shape: Vec<usize>,
    spline: TensorSpline,
}

impl Interpolator {
    /// Build an interpolant from per-axis node coordinates and the samples on
    /// their Cartesian product.
    ///
    /// `options.derivative` is not used here; evaluation calls take the
    /// derivative order explicitly.
    pub fn new(
        nodes: &[&[f64]],
        values: ArrayViewD<f64>,
        options: &InterpOptions,
    ) -> Result<Self> {
        Self::build(nodes, values, options).map_err(|e| {
            log_error(&e, "building interpolator");
            e
        })
    }

    pub fn new_1d(x: &[f64], values: ArrayView1<f64>, options: &InterpOptions) -> Result<Self> {
        Self::new(&[x], values.into_dyn(), options)
    }

    pub fn new_2d(
        x: &[f64],
        y: &[f64],
        values: ArrayView2<f64>,
        options: &InterpOptions,
    ) -> Result<Self> {
        Self::new(&[x, y], values.into_dyn(), options)
    }

    pub fn new_3d(
        x: &[f64],
        y: &[f64],
        z: &[f64],
        values: ArrayView3<f64>,
        options: &InterpOptions,
    ) -> Result<Self> {
        Self::new(&[x, y, z], values.into_dyn(), options)
    }

    fn build(nodes: &[&[f64]], values: ArrayViewD<f64>, options: &InterpOptions) -> Result<Self> {
        let ndim = nodes.len();
        if ndim == 0 || ndim > MAX_DIMS {
            return Err(GridSplineError::invalid_parameter(
                "nodes",
                format!("expected 1 to {} axes, got {}", MAX_DIMS, ndim),
            ));
        }
        if values.ndim() != ndim {
            return Err(GridSplineError::ShapeMismatch {
                message: format!(
                    "{} node axes but samples have {} dimensions",
                    ndim,
                    values.ndim()
                ),
            });
        }
        options.validate()?;

        let method = options.method;
        let periods = options.periods(ndim)?;
        let boundaries = options.boundaries(ndim)?;
        let mut grids = Vec::with_capacity(ndim);
        for (a, (x, period)) in nodes.iter().zip(&periods).enumerate() {
            let grid = Grid::with_period(x, *period)?;
            if grid.len() != values.shape()[a] {
                return Err(GridSplineError::ShapeMismatch {
                    message: format!(
                        "axis {} has {} nodes but samples have length {}",
                        a,
                        grid.len(),
                        values.shape()[a]
                    ),
                });
            }
            if grid.len() < method.min_nodes() {
                return Err(GridSplineError::InvalidGrid {
                    message: format!(
                        "{} needs at least {} nodes, axis {} has {}",
                        method,
                        method.min_nodes(),
                        a,
                        grid.len()
                    ),
                });
            }
            grids.push(grid);
        }

        let shape = values.shape().to_vec();
        let layouts = grids.iter().map(Grid::layout).collect();
        let spline = TensorSpline::new(method, options.tension, layouts, values);
        debug!(
            method = %method,
            shape = ?shape,
            periodic = ?periods,
            "Built interpolator"
        );

        Ok(Self {
            method,
            tension: options.tension,
            boundaries,
            grids,
            shape,
            spline,
        })
    }

    /// Wrap in an `Arc` for sharing between threads.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn ndim(&self) -> usize {
        self.grids.len()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    /// Boundary policy of each axis.
    pub fn boundaries(&self) -> &[BoundaryPolicy] {
        &self.boundaries
    }

    pub fn grids(&self) -> &[Grid] {
        &self.grids
    }

    /// Shape of the sample array.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Evaluate at query arrays broadcast against each other.
    ///
    /// `derivative` holds one order per axis, a single order for every axis,
    /// or nothing for plain values.
    pub fn evaluate(
        &self,
        queries: &[ArrayViewD<f64>],
        derivative: &[usize],
    ) -> Result<ArrayD<f64>> {
        self.check_axes(queries.len(), "queries")?;
        let orders = self.orders(derivative)?;

        let shapes: Vec<&[usize]> = queries.iter().map(|q| q.shape()).collect();
        let shape = broadcast_shape(&shapes)?;
        let mut columns = Vec::with_capacity(queries.len());
        for q in queries {
            let view = q
                .broadcast(IxDyn(&shape))
                .ok_or_else(|| GridSplineError::ShapeMismatch {
                    message: format!(
                        "query shape {:?} cannot be broadcast to {:?}",
                        q.shape(),
                        shape
                    ),
                })?;
            columns.push(view.iter().copied().collect::<Vec<f64>>());
        }
        let columns: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();

        let values = self.evaluate_columns(&columns, shape.iter().product(), &orders);
        ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| GridSplineError::Interpolation {
            message: e.to_string(),
        })
    }

    /// Evaluate at points given as per-axis coordinate lists of equal length
    /// (a list of length 1 is repeated).
    pub fn evaluate_points(&self, coords: &[&[f64]], derivative: &[usize]) -> Result<Vec<f64>> {
        self.check_axes(coords.len(), "coords")?;
        let orders = self.orders(derivative)?;
        let len = broadcast_len(&coords.iter().map(|c| c.len()).collect::<Vec<_>>())?;
        Ok(self.evaluate_columns(coords, len, &orders))
    }

    /// Evaluate at a single point.
    pub fn evaluate_point(&self, point: &[f64], derivative: &[usize]) -> Result<f64> {
        self.check_axes(point.len(), "point")?;
        let orders = self.orders(derivative)?;
        Ok(self.point_value(point, &orders))
    }

    /// First derivative along each axis at a single point.
    pub fn gradient(&self, point: &[f64]) -> Result<Vec<f64>> {
        self.check_axes(point.len(), "point")?;
        Ok((0..self.ndim())
            .map(|axis| {
                let mut orders = [0; MAX_DIMS];
                orders[axis] = 1;
                self.point_value(point, &orders)
            })
            .collect())
    }

    /// Evaluate at a single point and differentiate the result with respect
    /// to every sample and node coordinate.
    ///
    /// Points that resolve to a fill or missing value have zero sensitivity.
    pub fn sensitivity(&self, point: &[f64], derivative: &[usize]) -> Result<Sensitivity> {
        self.check_axes(point.len(), "point")?;
        let orders = self.orders(derivative)?;
        Ok(self.point_sensitivity(point, &orders))
    }

    /// Derivatives of the evaluated quantity at each point with respect to
    /// every sample: one row per point, samples flattened in row-major order.
    pub fn jacobian_samples(
        &self,
        coords: &[&[f64]],
        derivative: &[usize],
    ) -> Result<Array2<f64>> {
        self.check_axes(coords.len(), "coords")?;
        let orders = self.orders(derivative)?;
        let len = broadcast_len(&coords.iter().map(|c| c.len()).collect::<Vec<_>>())?;
        let width: usize = self.shape.iter().product();

        self.jacobian_rows(len, width, |i, row| {
            let point = point_at(coords, i);
            let sens = self.point_sensitivity(&point[..self.ndim()], &orders);
            for (dst, src) in row.iter_mut().zip(sens.samples.iter()) {
                *dst = *src;
            }
        })
    }

    /// Derivatives of the evaluated quantity at each point with respect to
    /// the node coordinates of `axis`: one row per point.
    pub fn jacobian_nodes(
        &self,
        coords: &[&[f64]],
        axis: usize,
        derivative: &[usize],
    ) -> Result<Array2<f64>> {
        self.check_axes(coords.len(), "coords")?;
        if axis >= self.ndim() {
            return Err(GridSplineError::invalid_parameter(
                "axis",
                format!("axis {} out of range for {} axes", axis, self.ndim()),
            ));
        }
        let orders = self.orders(derivative)?;
        let len = broadcast_len(&coords.iter().map(|c| c.len()).collect::<Vec<_>>())?;
        let width = self.grids[axis].len();

        self.jacobian_rows(len, width, |i, row| {
            let point = point_at(coords, i);
            let sens = self.point_sensitivity(&point[..self.ndim()], &orders);
            row.copy_from_slice(&sens.nodes[axis]);
        })
    }

    fn check_axes(&self, given: usize, what: &str) -> Result<()> {
        if given != self.ndim() {
            return Err(GridSplineError::ShapeMismatch {
                message: format!(
                    "{} has {} axes but the interpolator has {}",
                    what,
                    given,
                    self.ndim()
                ),
            });
        }
        Ok(())
    }

    fn orders(&self, derivative: &[usize]) -> Result<[usize; MAX_DIMS]> {
        let mut orders = [0; MAX_DIMS];
        match derivative.len() {
            0 => {}
            1 => orders[..self.ndim()].fill(derivative[0]),
            n if n == self.ndim() => orders[..n].copy_from_slice(derivative),
            n => {
                return Err(GridSplineError::invalid_parameter(
                    "derivative",
                    format!("expected 1 or {} orders, got {}", self.ndim(), n),
                ))
            }
        }
        check_orders(&orders)?;
        Ok(orders)
    }

    /// Place each coordinate and apply the boundary policy.
    fn place(&self, point: &[f64]) -> Resolved {
        let mut placements = [Placement::Inside(0.0); MAX_DIMS];
        for ((slot, axis), &x) in placements.iter_mut().zip(self.spline.axes()).zip(point) {
            *slot = axis.place(x);
        }
        let placements = &placements[..self.ndim()];
        if let Some(v) = boundary::resolve(&self.boundaries, placements) {
            return Resolved::Marker(v);
        }

        let mut coords = [0.0; MAX_DIMS];
        for (c, p) in coords.iter_mut().zip(placements) {
            *c = p.coordinate();
        }
        Resolved::Spline(coords)
    }

    fn point_value(&self, point: &[f64], orders: &[usize; MAX_DIMS]) -> f64 {
        let k = self.ndim();
        match self.place(point) {
            Resolved::Spline(coords) => self.spline.evaluate(&coords[..k], &orders[..k]),
            Resolved::Marker(v) => v,
        }
    }

    fn point_sensitivity(&self, point: &[f64], orders: &[usize; MAX_DIMS]) -> Sensitivity {
        let k = self.ndim();
        match self.place(point) {
            Resolved::Spline(coords) => {
                let rev = self.spline.reverse(&coords[..k], &orders[..k]);
                Sensitivity {
                    value: rev.value,
                    samples: rev.samples,
                    nodes: rev.nodes,
                }
            }
            Resolved::Marker(v) => Sensitivity {
                value: v,
                samples: ArrayD::zeros(IxDyn(&self.shape)),
                nodes: self.grids.iter().map(|g| vec![0.0; g.len()]).collect(),
            },
        }
    }

    fn evaluate_columns(
        &self,
        columns: &[&[f64]],
        len: usize,
        orders: &[usize; MAX_DIMS],
    ) -> Vec<f64> {
        trace!(points = len, "Evaluating batch");
        let mut out = vec![0.0; len];

        #[cfg(feature = "parallel")]
        {
            out.par_chunks_mut(CHUNK_SIZE)
                .enumerate()
                .for_each(|(chunk, slots)| {
                    for (j, slot) in slots.iter_mut().enumerate() {
                        let point = point_at(columns, chunk * CHUNK_SIZE + j);
                        *slot = self.point_value(&point[..self.ndim()], orders);
                    }
                });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (i, slot) in out.iter_mut().enumerate() {
                let point = point_at(columns, i);
                *slot = self.point_value(&point[..self.ndim()], orders);
            }
        }

        out
    }

    fn jacobian_rows<F>(&self, len: usize, width: usize, fill: F) -> Result<Array2<f64>>
    where
        F: Fn(usize, &mut [f64]) + Sync,
    {
        trace!(points = len, width = width, "Building jacobian");
        let mut data = vec![0.0; len * width];

        if width > 0 {
            #[cfg(feature = "parallel")]
            data.par_chunks_mut(width)
                .enumerate()
                .for_each(|(i, row)| fill(i, row));

            #[cfg(not(feature = "parallel"))]
            data.chunks_mut(width)
                .enumerate()
                .for_each(|(i, row)| fill(i, row));
        }

        Array2::from_shape_vec((len, width), data).map_err(|e| GridSplineError::Interpolation {
            message: e.to_string(),
        })
    }
}

/// A query after the boundary policy: working coordinates to evaluate the
/// spline at, or the value to report instead.
enum Resolved {
    Spline([f64; MAX_DIMS]),
    Marker(f64),
}

/// Coordinates of point `i`; length-1 columns repeat.
fn point_at(columns: &[&[f64]], i: usize) -> [f64; MAX_DIMS] {
    let mut point = [0.0; MAX_DIMS];
    for (slot, column) in point.iter_mut().zip(columns) {
        *slot = if column.len() == 1 { column[0] } else { column[i] };
    }
    point
}
