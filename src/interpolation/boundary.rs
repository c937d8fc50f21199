//! Out-of-domain policy for non-periodic axes.

use serde::{Deserialize, Serialize};

use super::grid::Placement;
use crate::error::{GridSplineError, Result};

/// What to do with a query beyond one end of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolation {
    /// Extend the polynomial of the boundary cell.
    Extend,
    /// Report the missing-value marker (NaN).
    #[default]
    Missing,
    /// Return a fixed value.
    Fill(f64),
}

/// Extrapolation below the first node and above the last node of an axis.
///
/// Deserializes from either a boolean (`true` extends both sides, `false`
/// marks both missing) or a `{ "lower": ..., "upper": ... }` object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PolicyRepr")]
pub struct BoundaryPolicy {
    pub lower: Extrapolation,
    pub upper: Extrapolation,
}

impl BoundaryPolicy {
    pub fn new(lower: Extrapolation, upper: Extrapolation) -> Self {
        Self { lower, upper }
    }

    /// The same policy on both sides.
    pub fn uniform(side: Extrapolation) -> Self {
        Self::new(side, side)
    }

    /// Extend the boundary cells on both sides.
    pub fn extend() -> Self {
        Self::uniform(Extrapolation::Extend)
    }

    /// Missing values on both sides.
    pub fn missing() -> Self {
        Self::uniform(Extrapolation::Missing)
    }

    /// A fixed fill value on both sides.
    pub fn fill(value: f64) -> Self {
        Self::uniform(Extrapolation::Fill(value))
    }

    /// The side policy for a placement, `None` inside the axis.
    fn side(&self, placement: &Placement) -> Option<Extrapolation> {
        match placement {
            Placement::Below(_) => Some(self.lower),
            Placement::Above(_) => Some(self.upper),
            Placement::Inside(_) => None,
        }
    }
}

/// Decide the result for a query whose axes were placed as `placements`,
/// with `policies[a]` governing axis `a`.
///
/// Returns `None` when the spline should be evaluated, or the value to
/// report instead. A missing axis takes precedence over any fill value.
pub(crate) fn resolve(policies: &[BoundaryPolicy], placements: &[Placement]) -> Option<f64> {
    let mut fill = None;
    for (policy, placement) in policies.iter().zip(placements) {
        match policy.side(placement) {
            Some(Extrapolation::Missing) => return Some(f64::NAN),
            Some(Extrapolation::Fill(v)) => {
                fill.get_or_insert(v);
            }
            Some(Extrapolation::Extend) | None => {}
        }
    }
    fill
}

impl From<bool> for BoundaryPolicy {
    fn from(extrapolate: bool) -> Self {
        if extrapolate {
            Self::extend()
        } else {
            Self::missing()
        }
    }
}

impl From<Extrapolation> for BoundaryPolicy {
    fn from(side: Extrapolation) -> Self {
        Self::uniform(side)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyRepr {
    Flag(bool),
    Sides {
        #[serde(default)]
        lower: Extrapolation,
        #[serde(default)]
        upper: Extrapolation,
    },
}

impl From<PolicyRepr> for BoundaryPolicy {
    fn from(repr: PolicyRepr) -> Self {
        match repr {
            PolicyRepr::Flag(flag) => flag.into(),
            PolicyRepr::Sides { lower, upper } => Self::new(lower, upper),
        }
    }
}

/// Boundary policies of the axes.
///
/// Deserializes from a single policy (applied to every axis) or a list with
/// one policy per axis, e.g. `[true, {"upper": {"fill": 0.0}}]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundarySpec {
    /// Every axis uses this policy.
    Uniform(BoundaryPolicy),
    /// One policy per axis; periodic axes ignore theirs.
    PerAxis(Vec<BoundaryPolicy>),
}

impl Default for BoundarySpec {
    fn default() -> Self {
        BoundarySpec::Uniform(BoundaryPolicy::default())
    }
}

impl BoundarySpec {
    /// Policies for each of `ndim` axes.
    pub fn resolve(&self, ndim: usize) -> Result<Vec<BoundaryPolicy>> {
        match self {
            BoundarySpec::Uniform(policy) => Ok(vec![*policy; ndim]),
            BoundarySpec::PerAxis(policies) if policies.len() == ndim => Ok(policies.clone()),
            BoundarySpec::PerAxis(policies) => Err(GridSplineError::invalid_parameter(
                "extrapolation",
                format!("expected {} policies, got {}", ndim, policies.len()),
            )),
        }
    }
}

impl From<BoundaryPolicy> for BoundarySpec {
    fn from(policy: BoundaryPolicy) -> Self {
        BoundarySpec::Uniform(policy)
    }
}

impl From<bool> for BoundarySpec {
    fn from(extrapolate: bool) -> Self {
        BoundarySpec::Uniform(extrapolate.into())
    }
}

impl From<Vec<BoundaryPolicy>> for BoundarySpec {
    fn from(policies: Vec<BoundaryPolicy>) -> Self {
        BoundarySpec::PerAxis(policies)
    }
}
