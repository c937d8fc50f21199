//! Tensor-product evaluation over precomputed derivative tables.
//!
//! For a field on `k` axes the Hermite methods keep `2^k` tables indexed by
//! an axis bitmask: table `A` holds the mixed derivative of the samples with
//! respect to every axis in `A`, estimated one axis at a time with the
//! method's slope rule. A query contracts the per-axis cell weights against
//! the `2^k` corners of its cell in every table.

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Zip};
use tracing::debug;

use super::basis::{axis_weights, AxisWeights, Family};
use super::common::locate;
use super::grid::AxisLayout;
use super::method::Method;
use super::slopes::SlopeRule;
use crate::logging::log_timed_operation;

/// Largest supported number of axes.
pub(crate) const MAX_DIMS: usize = 3;

/// A spline field ready for evaluation.
#[derive(Debug, Clone)]
pub(crate) struct TensorSpline {
    family: Family,
    rule: Option<SlopeRule>,
    axes: Vec<AxisLayout>,
    tables: Vec<ArrayD<f64>>,
}

/// Adjoints of one evaluated quantity.
#[derive(Debug, Clone)]
pub(crate) struct Reverse {
    pub value: f64,
    /// With respect to each user sample.
    pub samples: ArrayD<f64>,
    /// With respect to each user node, per axis.
    pub nodes: Vec<Vec<f64>>,
}

/// Cell indices and axis weights of one query.
struct Stencil {
    index: [usize; MAX_DIMS],
    weights: [AxisWeights; MAX_DIMS],
}

impl TensorSpline {
    /// Build the derivative tables for `samples`, laid out on the user grid.
    pub fn new(
        method: Method,
        tension: f64,
        axes: Vec<AxisLayout>,
        samples: ArrayViewD<f64>,
    ) -> Self {
        let mut working = samples.to_owned();
        for (a, axis) in axes.iter().enumerate() {
            if axis.period.is_some() {
                working = working.select(Axis(a), &axis.source);
            }
        }

        let rule = SlopeRule::for_method(method, tension);
        let tables =
            log_timed_operation("derivative_tables", || build_tables(rule, &axes, working));
        debug!(
            method = %method,
            tables = tables.len(),
            shape = ?tables[0].shape(),
            "Built derivative tables"
        );

        Self {
            family: method.into(),
            rule,
            axes,
            tables,
        }
    }

    pub fn axes(&self) -> &[AxisLayout] {
        &self.axes
    }

    fn ndim(&self) -> usize {
        self.axes.len()
    }

    fn stencil(&self, coords: &[f64], orders: &[usize]) -> Stencil {
        let mut stencil = Stencil {
            index: [0; MAX_DIMS],
            weights: [AxisWeights::default(); MAX_DIMS],
        };
        for (a, axis) in self.axes.iter().enumerate() {
            let cell = locate(&axis.nodes, coords[a]);
            stencil.index[a] = cell.index;
            stencil.weights[a] = axis_weights(self.family, &cell, orders[a]);
        }
        stencil
    }

    /// Mixed derivative of order `orders[a]` along each axis at working
    /// coordinates `coords`.
    pub fn evaluate(&self, coords: &[f64], orders: &[usize]) -> f64 {
        let k = self.ndim();
        let stencil = self.stencil(coords, orders);
        let weights = &stencil.weights[..k];

        let mut idx = [0usize; MAX_DIMS];
        let mut total = 0.0;
        for corner in 0..1usize << k {
            corner_index(&stencil.index[..k], corner, &mut idx);
            for (mask, table) in self.tables.iter().enumerate() {
                let w = term_weight(weights, corner, mask, None);
                if w != 0.0 {
                    total += w * table[&idx[..k]];
                }
            }
        }
        total
    }

    /// Evaluate and differentiate with respect to every sample and node.
    pub fn reverse(&self, coords: &[f64], orders: &[usize]) -> Reverse {
        let k = self.ndim();
        let stencil = self.stencil(coords, orders);
        let weights = &stencil.weights[..k];

        let mut bars: Vec<ArrayD<f64>> = self
            .tables
            .iter()
            .map(|t| ArrayD::zeros(t.raw_dim()))
            .collect();
        let mut node_bars: Vec<Vec<f64>> = self
            .axes
            .iter()
            .map(|axis| vec![0.0; axis.nodes.len()])
            .collect();

        // Contraction: seed table adjoints and collect the cell-weight terms.
        let mut idx = [0usize; MAX_DIMS];
        let mut value = 0.0;
        for corner in 0..1usize << k {
            corner_index(&stencil.index[..k], corner, &mut idx);
            for (mask, table) in self.tables.iter().enumerate() {
                let entry = table[&idx[..k]];
                let w = term_weight(weights, corner, mask, None);
                if w != 0.0 {
                    value += w * entry;
                }
                bars[mask][&idx[..k]] += w;

                for a in 0..k {
                    let others = term_weight(weights, corner, mask, Some(a)) * entry;
                    if others == 0.0 {
                        continue;
                    }
                    let slope = mask >> a & 1 == 1;
                    let c = corner >> a & 1;
                    let i = stencil.index[a];
                    node_bars[a][i] += weights[a].d_left.get(slope, c) * others;
                    node_bars[a][i + 1] += weights[a].d_right.get(slope, c) * others;
                }
            }
        }

        // Tables: walk each table back onto the table it was estimated from.
        if let Some(rule) = self.rule {
            for mask in (1..self.tables.len()).rev() {
                let axis = highest_axis(mask);
                let parent = mask ^ (1 << axis);
                let (lo, hi) = bars.split_at_mut(mask);
                let nodes = &self.axes[axis].nodes;
                let x_bar = &mut node_bars[axis];
                let mut f_bar = vec![0.0; nodes.len()];

                Zip::from(hi[0].lanes(Axis(axis)))
                    .and(self.tables[parent].lanes(Axis(axis)))
                    .and(self.tables[mask].lanes(Axis(axis)))
                    .and(lo[parent].lanes_mut(Axis(axis)))
                    .for_each(|m_bar, f, m, mut parent_bar| {
                        if m_bar.iter().all(|&v| v == 0.0) {
                            return;
                        }
                        f_bar.iter_mut().for_each(|v| *v = 0.0);
                        rule.adjoint(
                            nodes,
                            &f.to_vec(),
                            &m.to_vec(),
                            &m_bar.to_vec(),
                            &mut f_bar,
                            x_bar.as_mut_slice(),
                        );
                        for (dst, src) in parent_bar.iter_mut().zip(&f_bar) {
                            *dst += src;
                        }
                    });
            }
        }

        let samples = self.fold_samples(bars.swap_remove(0));
        let nodes = self
            .axes
            .iter()
            .zip(&node_bars)
            .map(|(axis, working)| {
                let mut user = vec![0.0; axis.len];
                axis.fold_nodes(working, &mut user);
                user
            })
            .collect();

        Reverse {
            value,
            samples,
            nodes,
        }
    }

    /// Sum working-sample adjoints onto the user samples they were copied from.
    fn fold_samples(&self, working: ArrayD<f64>) -> ArrayD<f64> {
        let mut arr = working;
        for (a, axis) in self.axes.iter().enumerate() {
            if axis.period.is_none() {
                continue;
            }
            let mut shape = arr.shape().to_vec();
            shape[a] = axis.len;
            let mut out = ArrayD::zeros(IxDyn(&shape));
            for (j, &src) in axis.source.iter().enumerate() {
                let mut dst = out.index_axis_mut(Axis(a), src);
                dst += &arr.index_axis(Axis(a), j);
            }
            arr = out;
        }
        arr
    }
}

fn build_tables(
    rule: Option<SlopeRule>,
    axes: &[AxisLayout],
    samples: ArrayD<f64>,
) -> Vec<ArrayD<f64>> {
    let Some(rule) = rule else {
        return vec![samples];
    };

    let k = axes.len();
    let mut tables = Vec::with_capacity(1 << k);
    tables.push(samples);
    for mask in 1..1usize << k {
        let axis = highest_axis(mask);
        let parent = &tables[mask ^ (1 << axis)];
        let nodes = &axes[axis].nodes;
        let mut table = ArrayD::zeros(parent.raw_dim());
        let mut m = vec![0.0; nodes.len()];

        Zip::from(table.lanes_mut(Axis(axis)))
            .and(parent.lanes(Axis(axis)))
            .for_each(|mut out, f| {
                rule.estimate(nodes, &f.to_vec(), &mut m);
                for (dst, src) in out.iter_mut().zip(&m) {
                    *dst = *src;
                }
            });
        tables.push(table);
    }
    tables
}

fn highest_axis(mask: usize) -> usize {
    (usize::BITS - 1 - mask.leading_zeros()) as usize
}

fn corner_index(base: &[usize], corner: usize, out: &mut [usize; MAX_DIMS]) {
    for (a, &i) in base.iter().enumerate() {
        out[a] = i + (corner >> a & 1);
    }
}

/// Product of the axis weights of one term, leaving out `skip`.
fn term_weight(weights: &[AxisWeights], corner: usize, mask: usize, skip: Option<usize>) -> f64 {
    let mut w = 1.0;
    for (a, axis) in weights.iter().enumerate() {
        if Some(a) == skip {
            continue;
        }
        w *= axis.weights.get(mask >> a & 1 == 1, corner >> a & 1);
    }
    w
}
