//! Validated node axes and their periodic working layout.

use super::common::wrap_periodic;
use crate::error::{GridSplineError, Result};

/// Ghost nodes added on each side of a periodic axis.
const GHOST: usize = 2;

/// Strictly increasing node coordinates along one axis, optionally periodic.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    nodes: Vec<f64>,
    period: Option<f64>,
}

impl Grid {
    /// A non-periodic axis.
    pub fn new(nodes: &[f64]) -> Result<Self> {
        validate_nodes(nodes)?;
        Ok(Self {
            nodes: nodes.to_vec(),
            period: None,
        })
    }

    /// A periodic axis. The nodes may not span more than one period.
    pub fn periodic(nodes: &[f64], period: f64) -> Result<Self> {
        validate_nodes(nodes)?;
        if !period.is_finite() || period <= 0.0 {
            return Err(GridSplineError::invalid_parameter(
                "period",
                format!("must be positive and finite, got {}", period),
            ));
        }
        let span = nodes[nodes.len() - 1] - nodes[0];
        if span > period + period_tolerance(nodes, period) {
            return Err(GridSplineError::InvalidGrid {
                message: format!("nodes span {} which exceeds the period {}", span, period),
            });
        }
        Ok(Self {
            nodes: nodes.to_vec(),
            period: Some(period),
        })
    }

    /// A periodic or non-periodic axis depending on `period`.
    pub fn with_period(nodes: &[f64], period: Option<f64>) -> Result<Self> {
        match period {
            Some(p) => Self::periodic(nodes, p),
            None => Self::new(nodes),
        }
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn period(&self) -> Option<f64> {
        self.period
    }

    pub fn is_periodic(&self) -> bool {
        self.period.is_some()
    }

    /// First and last node.
    pub fn bounds(&self) -> (f64, f64) {
        (self.nodes[0], self.nodes[self.nodes.len() - 1])
    }

    /// Number of distinct nodes in one period.
    ///
    /// A trailing node one period above the first repeats the first node and is
    /// not counted.
    pub fn distinct_len(&self) -> usize {
        match self.period {
            Some(p) => {
                let n = self.nodes.len();
                let (first, last) = self.bounds();
                if n > 2 && (last - (first + p)).abs() <= period_tolerance(&self.nodes, p) {
                    n - 1
                } else {
                    n
                }
            }
            None => self.nodes.len(),
        }
    }

    pub(crate) fn layout(&self) -> AxisLayout {
        let Some(period) = self.period else {
            let (lower, upper) = self.bounds();
            return AxisLayout {
                nodes: self.nodes.clone(),
                source: (0..self.nodes.len()).collect(),
                len: self.nodes.len(),
                lower,
                upper,
                period: None,
            };
        };

        let m = self.distinct_len() as isize;
        let ghost = GHOST as isize;
        let mut nodes = Vec::with_capacity((m + 2 * ghost) as usize);
        let mut source = Vec::with_capacity(nodes.capacity());
        for j in -ghost..m + ghost {
            let src = j.rem_euclid(m) as usize;
            nodes.push(self.nodes[src] + j.div_euclid(m) as f64 * period);
            source.push(src);
        }
        AxisLayout {
            nodes,
            source,
            len: self.nodes.len(),
            lower: self.nodes[0],
            upper: self.nodes[0] + period,
            period: Some(period),
        }
    }
}

fn validate_nodes(nodes: &[f64]) -> Result<()> {
    if nodes.len() < 2 {
        return Err(GridSplineError::InvalidGrid {
            message: format!("an axis needs at least 2 nodes, got {}", nodes.len()),
        });
    }
    if let Some(bad) = nodes.iter().find(|v| !v.is_finite()) {
        return Err(GridSplineError::InvalidGrid {
            message: format!("node coordinates must be finite, got {}", bad),
        });
    }
    if let Some(i) = nodes.windows(2).position(|w| w[1] <= w[0]) {
        return Err(GridSplineError::InvalidGrid {
            message: format!(
                "nodes must be strictly increasing, but node {} ({}) follows {}",
                i + 1,
                nodes[i + 1],
                nodes[i]
            ),
        });
    }
    Ok(())
}

fn period_tolerance(nodes: &[f64], period: f64) -> f64 {
    1e-12 * period.max(nodes[0].abs()).max(nodes[nodes.len() - 1].abs())
}

/// Working node layout of one axis, with ghost nodes for periodic axes.
#[derive(Debug, Clone)]
pub(crate) struct AxisLayout {
    /// Working node coordinates.
    pub nodes: Vec<f64>,
    /// User node index behind each working node.
    pub source: Vec<usize>,
    /// Number of user nodes.
    pub len: usize,
    /// Lower bound of the domain.
    pub lower: f64,
    /// Upper bound of the domain (exclusive on periodic axes).
    pub upper: f64,
    pub period: Option<f64>,
}

impl AxisLayout {
    /// Map a query into the working range, or classify it as below or above
    /// the domain.
    pub fn place(&self, x: f64) -> Placement {
        match self.period {
            Some(p) => Placement::Inside(wrap_periodic(x, self.lower, p)),
            None if x < self.lower => Placement::Below(x),
            None if x > self.upper => Placement::Above(x),
            None => Placement::Inside(x),
        }
    }

    /// Add working-node adjoints onto the user nodes they came from.
    pub fn fold_nodes(&self, working: &[f64], user: &mut [f64]) {
        for (&src, &bar) in self.source.iter().zip(working) {
            user[src] += bar;
        }
    }
}

/// Where a query falls relative to an axis domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Placement {
    Below(f64),
    Inside(f64),
    Above(f64),
}

impl Placement {
    pub fn coordinate(self) -> f64 {
        match self {
            Placement::Below(x) | Placement::Inside(x) | Placement::Above(x) => x,
        }
    }
}
