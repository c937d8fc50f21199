//! Interpolation options shared by the object and free-function forms.

use serde::{Deserialize, Serialize};

use super::boundary::{BoundaryPolicy, BoundarySpec};
use super::method::Method;
use crate::error::{GridSplineError, Result};

/// Highest supported derivative order along an axis.
pub const MAX_DERIVATIVE: usize = 2;

/// Derivative order of the evaluated quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DerivativeOrder {
    /// The same order along every axis.
    Uniform(usize),
    /// One order per axis; mixed partials combine them.
    PerAxis(Vec<usize>),
}

impl Default for DerivativeOrder {
    fn default() -> Self {
        DerivativeOrder::Uniform(0)
    }
}

impl DerivativeOrder {
    /// Orders for each of `ndim` axes.
    pub fn resolve(&self, ndim: usize) -> Result<Vec<usize>> {
        let orders = match self {
            DerivativeOrder::Uniform(d) => vec![*d; ndim],
            DerivativeOrder::PerAxis(orders) if orders.len() == ndim => orders.clone(),
            DerivativeOrder::PerAxis(orders) => {
                return Err(GridSplineError::invalid_parameter(
                    "derivative",
                    format!("expected {} orders, got {}", ndim, orders.len()),
                ))
            }
        };
        check_orders(&orders)?;
        Ok(orders)
    }
}

impl From<usize> for DerivativeOrder {
    fn from(order: usize) -> Self {
        DerivativeOrder::Uniform(order)
    }
}

impl From<Vec<usize>> for DerivativeOrder {
    fn from(orders: Vec<usize>) -> Self {
        DerivativeOrder::PerAxis(orders)
    }
}

pub(crate) fn check_orders(orders: &[usize]) -> Result<()> {
    if let Some(d) = orders.iter().find(|&&d| d > MAX_DERIVATIVE) {
        return Err(GridSplineError::invalid_parameter(
            "derivative",
            format!("order {} is not supported, the maximum is {}", d, MAX_DERIVATIVE),
        ));
    }
    Ok(())
}

/// Periodicity of the axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeriodSpec {
    /// Every axis has this period.
    Uniform(f64),
    /// Per-axis period, `None` for a non-periodic axis.
    PerAxis(Vec<Option<f64>>),
}

impl PeriodSpec {
    /// Periods for each of `ndim` axes.
    pub fn resolve(&self, ndim: usize) -> Result<Vec<Option<f64>>> {
        let periods = match self {
            PeriodSpec::Uniform(p) => vec![Some(*p); ndim],
            PeriodSpec::PerAxis(periods) if periods.len() == ndim => periods.clone(),
            PeriodSpec::PerAxis(periods) => {
                return Err(GridSplineError::invalid_parameter(
                    "period",
                    format!("expected {} periods, got {}", ndim, periods.len()),
                ))
            }
        };
        if let Some(p) = periods
            .iter()
            .flatten()
            .find(|p| !p.is_finite() || **p <= 0.0)
        {
            return Err(GridSplineError::invalid_parameter(
                "period",
                format!("must be positive and finite, got {}", p),
            ));
        }
        Ok(periods)
    }
}

/// Options for building and evaluating an interpolant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpOptions {
    /// Interpolation method
    #[serde(default)]
    pub method: Method,

    /// Derivative order used by the free functions
    #[serde(default)]
    pub derivative: DerivativeOrder,

    /// Axis periods (None = no periodic axes)
    #[serde(default)]
    pub period: Option<PeriodSpec>,

    /// Behaviour outside the node range of non-periodic axes
    #[serde(default)]
    pub extrapolation: BoundarySpec,

    /// Tension of the `cardinal` method, in [0, 1]
    #[serde(default)]
    pub tension: f64,
}

impl Default for InterpOptions {
    fn default() -> Self {
        Self::new(Method::default())
    }
}

impl InterpOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            derivative: DerivativeOrder::default(),
            period: None,
            extrapolation: BoundarySpec::default(),
            tension: 0.0,
        }
    }

    /// The same derivative order along every axis.
    pub fn with_derivative(mut self, order: usize) -> Self {
        self.derivative = DerivativeOrder::Uniform(order);
        self
    }

    /// One derivative order per axis.
    pub fn with_derivatives(mut self, orders: Vec<usize>) -> Self {
        self.derivative = DerivativeOrder::PerAxis(orders);
        self
    }

    /// The same period on every axis.
    pub fn with_period(mut self, period: f64) -> Self {
        self.period = Some(PeriodSpec::Uniform(period));
        self
    }

    pub fn with_periods(mut self, periods: Vec<Option<f64>>) -> Self {
        self.period = Some(PeriodSpec::PerAxis(periods));
        self
    }

    /// Extend (`true`) or mark missing (`false`) on both sides.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolation = extrapolate.into();
        self
    }

    /// The same boundary policy on every axis.
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.extrapolation = BoundarySpec::Uniform(boundary);
        self
    }

    /// One boundary policy per axis.
    pub fn with_boundaries(mut self, boundaries: Vec<BoundaryPolicy>) -> Self {
        self.extrapolation = BoundarySpec::PerAxis(boundaries);
        self
    }

    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = tension;
        self
    }

    /// Periods for each of `ndim` axes.
    pub fn periods(&self, ndim: usize) -> Result<Vec<Option<f64>>> {
        match &self.period {
            Some(spec) => spec.resolve(ndim),
            None => Ok(vec![None; ndim]),
        }
    }

    /// Boundary policies for each of `ndim` axes.
    pub fn boundaries(&self, ndim: usize) -> Result<Vec<BoundaryPolicy>> {
        self.extrapolation.resolve(ndim)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.tension) {
            return Err(GridSplineError::invalid_parameter(
                "tension",
                format!("must lie in [0, 1], got {}", self.tension),
            ));
        }
        if let DerivativeOrder::PerAxis(orders) = &self.derivative {
            check_orders(orders)?;
        } else {
            self.derivative.resolve(1)?;
        }
        if let Some(spec) = &self.period {
            let ndim = match spec {
                PeriodSpec::Uniform(_) => 1,
                PeriodSpec::PerAxis(periods) => periods.len(),
            };
            spec.resolve(ndim)?;
        }
        Ok(())
    }
}
