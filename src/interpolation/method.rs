//! The closed set of interpolation methods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GridSplineError, Result};

/// Interpolation method applied along every axis of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Method {
    /// Value of the closer bounding node; the lower node wins ties.
    #[serde(rename = "nearest")]
    Nearest,
    /// Piecewise affine blend of the two bounding nodes.
    #[serde(rename = "linear")]
    Linear,
    /// Hermite cubic with spacing-weighted three-point slopes.
    #[default]
    #[serde(rename = "cubic")]
    Cubic,
    /// Hermite cubic with the slopes of the C2 cubic spline.
    #[serde(rename = "cubic2")]
    Cubic2,
    /// Hermite cubic with tension-scaled centered slopes.
    #[serde(rename = "cardinal")]
    Cardinal,
    /// Cardinal spline with zero tension.
    #[serde(rename = "catmull-rom")]
    CatmullRom,
    /// Shape-preserving Hermite cubic (Fritsch-Carlson limited slopes).
    #[serde(rename = "monotonic")]
    Monotonic,
    /// As `Monotonic`, with zero slope at both ends of each axis.
    #[serde(rename = "monotonic-0")]
    Monotonic0,
}

impl Method {
    /// Every method, in declaration order.
    pub const ALL: [Method; 8] = [
        Method::Nearest,
        Method::Linear,
        Method::Cubic,
        Method::Cubic2,
        Method::Cardinal,
        Method::CatmullRom,
        Method::Monotonic,
        Method::Monotonic0,
    ];

    /// Canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Method::Nearest => "nearest",
            Method::Linear => "linear",
            Method::Cubic => "cubic",
            Method::Cubic2 => "cubic2",
            Method::Cardinal => "cardinal",
            Method::CatmullRom => "catmull-rom",
            Method::Monotonic => "monotonic",
            Method::Monotonic0 => "monotonic-0",
        }
    }

    /// Fewest nodes an axis needs for this method.
    pub fn min_nodes(&self) -> usize {
        if self.is_hermite() {
            3
        } else {
            2
        }
    }

    /// Whether the method blends node values with node slopes.
    pub fn is_hermite(&self) -> bool {
        !matches!(self, Method::Nearest | Method::Linear)
    }

    /// Whether the method honors the tension parameter.
    pub fn uses_tension(&self) -> bool {
        matches!(self, Method::Cardinal)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = GridSplineError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.name() == lower)
            .ok_or_else(|| GridSplineError::Config {
                message: format!(
                    "Unknown interpolation method: {}. Must be one of: {}",
                    s,
                    Method::ALL.map(|m| m.name()).join(", ")
                ),
            })
    }
}

/// Get an interpolation method by name
pub fn get_method(name: &str) -> Result<Method> {
    name.parse()
}
