//! Per-cell basis functions.
//!
//! Every method reduces to one of three families on a cell: piecewise
//! constant, affine, or Hermite cubic. A cell contributes two node values and,
//! for the Hermite family, two node slopes.

use super::common::Cell;
use super::method::Method;

/// Basis family used on each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Nearest,
    Linear,
    Hermite,
}

impl From<Method> for Family {
    fn from(method: Method) -> Self {
        match method {
            Method::Nearest => Family::Nearest,
            Method::Linear => Family::Linear,
            _ => Family::Hermite,
        }
    }
}

/// Coefficients on the left and right node values and node slopes of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Weights {
    pub value: [f64; 2],
    pub slope: [f64; 2],
}

impl Weights {
    /// Coefficient on the value (`slope == false`) or slope of corner `c`.
    #[inline]
    pub fn get(&self, slope: bool, c: usize) -> f64 {
        if slope {
            self.slope[c]
        } else {
            self.value[c]
        }
    }
}

/// k-th derivative in `t` of the shape functions.
pub(crate) fn shape(family: Family, t: f64, k: usize) -> Weights {
    match family {
        Family::Nearest => {
            if k > 0 {
                Weights::default()
            } else if t <= 0.5 {
                Weights {
                    value: [1.0, 0.0],
                    slope: [0.0; 2],
                }
            } else {
                Weights {
                    value: [0.0, 1.0],
                    slope: [0.0; 2],
                }
            }
        }
        Family::Linear => {
            let value = match k {
                0 => [1.0 - t, t],
                1 => [-1.0, 1.0],
                _ => [0.0, 0.0],
            };
            Weights {
                value,
                slope: [0.0; 2],
            }
        }
        Family::Hermite => {
            let t2 = t * t;
            let t3 = t2 * t;
            match k {
                0 => Weights {
                    value: [2.0 * t3 - 3.0 * t2 + 1.0, -2.0 * t3 + 3.0 * t2],
                    slope: [t3 - 2.0 * t2 + t, t3 - t2],
                },
                1 => Weights {
                    value: [6.0 * t2 - 6.0 * t, -6.0 * t2 + 6.0 * t],
                    slope: [3.0 * t2 - 4.0 * t + 1.0, 3.0 * t2 - 2.0 * t],
                },
                2 => Weights {
                    value: [12.0 * t - 6.0, -12.0 * t + 6.0],
                    slope: [6.0 * t - 4.0, 6.0 * t - 2.0],
                },
                3 => Weights {
                    value: [12.0, -12.0],
                    slope: [6.0, 6.0],
                },
                _ => Weights::default(),
            }
        }
    }
}

/// Weights of one axis for a given derivative order, with their partials
/// with respect to the cell's left and right node coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AxisWeights {
    pub weights: Weights,
    pub d_left: Weights,
    pub d_right: Weights,
}

/// Weights for the `order`-th derivative in `x` on a located cell.
pub(crate) fn axis_weights(family: Family, cell: &Cell, order: usize) -> AxisWeights {
    let Cell { t, width: h, .. } = *cell;
    let d = order as i32;
    let base = shape(family, t, order);
    let next = shape(family, t, order + 1);

    let value_scale = h.powi(-d);
    let slope_scale = h.powi(1 - d);

    let mut out = AxisWeights::default();
    for c in 0..2 {
        out.weights.value[c] = base.value[c] * value_scale;
        out.weights.slope[c] = base.slope[c] * slope_scale;

        let value_dt = next.value[c] * value_scale;
        let value_dh = -(d as f64) * base.value[c] * h.powi(-d - 1);
        let slope_dt = next.slope[c] * slope_scale;
        let slope_dh = (1 - d) as f64 * base.slope[c] * h.powi(-d);

        out.d_left.value[c] = value_dt * (t - 1.0) / h - value_dh;
        out.d_right.value[c] = -value_dt * t / h + value_dh;
        out.d_left.slope[c] = slope_dt * (t - 1.0) / h - slope_dh;
        out.d_right.slope[c] = -slope_dt * t / h + slope_dh;
    }
    out
}
