//! Common utilities for interpolation algorithms.
//!
//! Cell location on a node axis and the broadcasting rules used for batched
//! queries.

use crate::error::{GridSplineError, Result};

/// A located grid cell: the interval `[nodes[index], nodes[index + 1]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Index of the left node of the cell.
    pub index: usize,
    /// Cell-local coordinate; in `[0, 1]` inside the domain.
    pub t: f64,
    /// Width of the cell.
    pub width: f64,
}

/// Locate the cell containing `x` by binary search.
///
/// A query equal to a node resolves to the cell starting at that node, except
/// the last node, which resolves to the last cell with `t = 1`. Queries outside
/// the domain resolve to the boundary cells with `t < 0` or `t > 1`.
///
/// `nodes` must hold at least two strictly increasing values.
pub fn locate(nodes: &[f64], x: f64) -> Cell {
    let last_cell = nodes.len() - 2;
    let index = nodes
        .partition_point(|&v| v <= x)
        .saturating_sub(1)
        .min(last_cell);
    let width = nodes[index + 1] - nodes[index];
    Cell {
        index,
        t: (x - nodes[index]) / width,
        width,
    }
}

/// Reduce `x` into `[start, start + period)`.
///
/// In-range values are returned unchanged.
pub fn wrap_periodic(x: f64, start: f64, period: f64) -> f64 {
    if x >= start && x < start + period {
        x
    } else {
        start + (x - start).rem_euclid(period)
    }
}

/// NumPy-style broadcast of several shapes.
pub fn broadcast_shape(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    let ndim = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = vec![1usize; ndim];
    for shape in shapes {
        let offset = ndim - shape.len();
        for (i, &len) in shape.iter().enumerate() {
            let slot = &mut out[offset + i];
            if *slot == 1 {
                *slot = len;
            } else if len != 1 && len != *slot {
                return Err(GridSplineError::ShapeMismatch {
                    message: format!("query shapes {:?} cannot be broadcast together", shapes),
                });
            }
        }
    }
    Ok(out)
}

/// Common length of per-axis coordinate lists, where a length of 1 repeats.
pub fn broadcast_len(lens: &[usize]) -> Result<usize> {
    let mut out = 1;
    for &len in lens {
        if out == 1 {
            out = len;
        } else if len != 1 && len != out {
            return Err(GridSplineError::ShapeMismatch {
                message: format!("coordinate lengths {:?} cannot be broadcast together", lens),
            });
        }
    }
    Ok(out)
}
