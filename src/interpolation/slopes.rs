//! Node slope estimation for the Hermite methods.
//!
//! Each rule turns node coordinates `x` and samples `f` into one slope per
//! node, and provides the exact reverse-mode product of that map so that
//! sensitivities can be pushed back onto the samples and nodes.

use super::grid::Grid;
use super::method::Method;
use crate::error::{GridSplineError, Result};

/// How node slopes are estimated from neighbouring samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SlopeRule {
    /// Spacing-weighted three-point difference, one-sided at the ends.
    ThreePoint,
    /// `(1 - tension)` times the centered difference, one-sided at the ends.
    Cardinal { tension: f64 },
    /// First derivatives of the C2 cubic spline.
    Spline,
    /// Fritsch-Carlson limited harmonic mean of the adjacent secants.
    Monotone { flat_ends: bool },
}

impl SlopeRule {
    /// The rule behind a method, or `None` for methods without node slopes.
    pub fn for_method(method: Method, tension: f64) -> Option<Self> {
        match method {
            Method::Nearest | Method::Linear => None,
            Method::Cubic => Some(SlopeRule::ThreePoint),
            Method::Cubic2 => Some(SlopeRule::Spline),
            Method::Cardinal => Some(SlopeRule::Cardinal { tension }),
            Method::CatmullRom => Some(SlopeRule::Cardinal { tension: 0.0 }),
            Method::Monotonic => Some(SlopeRule::Monotone { flat_ends: false }),
            Method::Monotonic0 => Some(SlopeRule::Monotone { flat_ends: true }),
        }
    }

    /// Write the slope at every node into `m`.
    pub fn estimate(&self, x: &[f64], f: &[f64], m: &mut [f64]) {
        let n = x.len();
        let (h, s) = secants(x, f);
        if let SlopeRule::Spline = self {
            m.copy_from_slice(&spline_slopes(&h, &s));
            return;
        }

        m[0] = self.end(&h, &s, false).0;
        m[n - 1] = self.end(&h, &s, true).0;
        for i in 1..n - 1 {
            m[i] = self.interior(h[i - 1], h[i], s[i - 1], s[i]).0;
        }
    }

    /// Reverse-mode product: given the adjoint `m_bar` of the slopes `m`
    /// produced by [`SlopeRule::estimate`], accumulate the adjoints of the
    /// samples into `f_bar` and of the node coordinates into `x_bar`.
    pub fn adjoint(
        &self,
        x: &[f64],
        f: &[f64],
        m: &[f64],
        m_bar: &[f64],
        f_bar: &mut [f64],
        x_bar: &mut [f64],
    ) {
        let n = x.len();
        let (h, s) = secants(x, f);
        let mut s_bar = vec![0.0; n - 1];
        let mut h_bar = vec![0.0; n - 1];

        if let SlopeRule::Spline = self {
            spline_adjoint(&h, &s, m, m_bar, &mut s_bar, &mut h_bar);
        } else {
            for (right, node) in [(false, 0), (true, n - 1)] {
                let (_, p) = self.end(&h, &s, right);
                let g = m_bar[node];
                let (near, far) = if right { (n - 2, n.saturating_sub(3)) } else { (0, 1) };
                s_bar[near] += g * p[0];
                h_bar[near] += g * p[2];
                if n > 2 {
                    s_bar[far] += g * p[1];
                    h_bar[far] += g * p[3];
                }
            }
            for i in 1..n - 1 {
                let g = m_bar[i];
                if g == 0.0 {
                    continue;
                }
                let (_, p) = self.interior(h[i - 1], h[i], s[i - 1], s[i]);
                s_bar[i - 1] += g * p[0];
                s_bar[i] += g * p[1];
                h_bar[i - 1] += g * p[2];
                h_bar[i] += g * p[3];
            }
        }

        // s_j = (f_{j+1} - f_j) / h_j and h_j = x_{j+1} - x_j
        for j in 0..n - 1 {
            let ds = s_bar[j] / h[j];
            f_bar[j + 1] += ds;
            f_bar[j] -= ds;
            let dh = h_bar[j] - s_bar[j] * s[j] / h[j];
            x_bar[j + 1] += dh;
            x_bar[j] -= dh;
        }
    }

    /// Slope at an interior node with partials in `(s0, s1, a, b)`, where
    /// `s0`, `a` are the secant and width of the cell on the left and `s1`,
    /// `b` those of the cell on the right.
    fn interior(&self, a: f64, b: f64, s0: f64, s1: f64) -> (f64, [f64; 4]) {
        let sum = a + b;
        match *self {
            SlopeRule::ThreePoint => {
                let m = (b * s0 + a * s1) / sum;
                (m, [b / sum, a / sum, (s1 - m) / sum, (s0 - m) / sum])
            }
            SlopeRule::Cardinal { tension } => {
                let k = 1.0 - tension;
                let u = (a * s0 + b * s1) / sum;
                (
                    k * u,
                    [
                        k * a / sum,
                        k * b / sum,
                        k * (s0 - u) / sum,
                        k * (s1 - u) / sum,
                    ],
                )
            }
            SlopeRule::Monotone { .. } => {
                if s0 * s1 <= 0.0 {
                    return (0.0, [0.0; 4]);
                }
                let w1 = 2.0 * b + a;
                let w2 = b + 2.0 * a;
                let total = w1 + w2;
                let denom = w1 / s0 + w2 / s1;
                let m = total / denom;
                let d2 = denom * denom;
                let dw1 = 1.0 / denom - total / (d2 * s0);
                let dw2 = 1.0 / denom - total / (d2 * s1);
                (
                    m,
                    [
                        total * w1 / (d2 * s0 * s0),
                        total * w2 / (d2 * s1 * s1),
                        dw1 + 2.0 * dw2,
                        2.0 * dw1 + dw2,
                    ],
                )
            }
            SlopeRule::Spline => unreachable!("spline slopes are solved globally"),
        }
    }

    /// End slope with partials in `(s_near, s_far, h_near, h_far)`.
    fn end(&self, h: &[f64], s: &[f64], right: bool) -> (f64, [f64; 4]) {
        let n = h.len() + 1;
        let near = if right { n - 2 } else { 0 };
        match *self {
            SlopeRule::ThreePoint => (s[near], [1.0, 0.0, 0.0, 0.0]),
            SlopeRule::Cardinal { tension } => {
                let k = 1.0 - tension;
                (k * s[near], [k, 0.0, 0.0, 0.0])
            }
            SlopeRule::Monotone { flat_ends: true } => (0.0, [0.0; 4]),
            SlopeRule::Monotone { flat_ends: false } => {
                if n == 2 {
                    return (s[0], [1.0, 0.0, 0.0, 0.0]);
                }
                let far = if right { n - 3 } else { 1 };
                shape_preserving_end(h[near], h[far], s[near], s[far])
            }
            SlopeRule::Spline => unreachable!("spline slopes are solved globally"),
        }
    }
}

/// Estimate node slopes along one axis the way `method` does.
///
/// Methods without node slopes (`nearest`, `linear`) return one-sided
/// secants at the ends and centered differences in between.
pub fn estimate_slopes(x: &[f64], f: &[f64], method: Method, tension: f64) -> Result<Vec<f64>> {
    if x.len() != f.len() {
        return Err(GridSplineError::ShapeMismatch {
            message: format!("{} nodes but {} samples", x.len(), f.len()),
        });
    }
    if x.len() < method.min_nodes() {
        return Err(GridSplineError::InvalidGrid {
            message: format!(
                "{} needs at least {} nodes, got {}",
                method,
                method.min_nodes(),
                x.len()
            ),
        });
    }
    Grid::new(x)?;
    if !(0.0..=1.0).contains(&tension) {
        return Err(GridSplineError::invalid_parameter(
            "tension",
            format!("must lie in [0, 1], got {}", tension),
        ));
    }

    let rule =
        SlopeRule::for_method(method, tension).unwrap_or(SlopeRule::Cardinal { tension: 0.0 });
    let mut m = vec![0.0; x.len()];
    rule.estimate(x, f, &mut m);
    Ok(m)
}

fn secants(x: &[f64], f: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let s = f
        .windows(2)
        .zip(&h)
        .map(|(w, &h)| (w[1] - w[0]) / h)
        .collect();
    (h, s)
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Three-point end formula with the monotonicity checks applied.
fn shape_preserving_end(h0: f64, h1: f64, s0: f64, s1: f64) -> (f64, [f64; 4]) {
    let sum = h0 + h1;
    let d = ((2.0 * h0 + h1) * s0 - h0 * s1) / sum;
    if sign(d) != sign(s0) {
        (0.0, [0.0; 4])
    } else if sign(s0) != sign(s1) && d.abs() > 3.0 * s0.abs() {
        (3.0 * s0, [3.0, 0.0, 0.0, 0.0])
    } else {
        (
            d,
            [
                (2.0 * h0 + h1) / sum,
                -h0 / sum,
                (2.0 * s0 - s1 - d) / sum,
                (s0 - d) / sum,
            ],
        )
    }
}

/// Bands of the spline slope system `A m = r`.
struct SplineSystem {
    lower: Vec<f64>,
    diag: Vec<f64>,
    upper: Vec<f64>,
    rhs: Vec<f64>,
}

impl SplineSystem {
    fn new(h: &[f64], s: &[f64]) -> Self {
        let n = h.len() + 1;
        let mut sys = SplineSystem {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
            rhs: vec![0.0; n],
        };

        // The end cells are quadratic.
        sys.diag[0] = 1.0;
        sys.upper[0] = 1.0;
        sys.rhs[0] = 2.0 * s[0];
        sys.lower[n - 1] = 1.0;
        sys.diag[n - 1] = 1.0;
        sys.rhs[n - 1] = 2.0 * s[n - 2];

        for i in 1..n - 1 {
            let left = 1.0 / h[i - 1];
            let right = 1.0 / h[i];
            sys.lower[i] = left;
            sys.diag[i] = 2.0 * (left + right);
            sys.upper[i] = right;
            sys.rhs[i] = 3.0 * (s[i - 1] * left + s[i] * right);
        }
        sys
    }
}

fn spline_slopes(h: &[f64], s: &[f64]) -> Vec<f64> {
    if h.len() == 1 {
        return vec![s[0], s[0]];
    }
    let sys = SplineSystem::new(h, s);
    solve_tridiagonal(&sys.lower, &sys.diag, &sys.upper, &sys.rhs)
}

fn spline_adjoint(
    h: &[f64],
    s: &[f64],
    m: &[f64],
    m_bar: &[f64],
    s_bar: &mut [f64],
    h_bar: &mut [f64],
) {
    let n = h.len() + 1;
    if n == 2 {
        s_bar[0] += m_bar[0] + m_bar[1];
        return;
    }

    let sys = SplineSystem::new(h, s);
    // A^T has the bands swapped and shifted.
    let mut lower_t = vec![0.0; n];
    let mut upper_t = vec![0.0; n];
    for i in 1..n {
        lower_t[i] = sys.upper[i - 1];
    }
    for i in 0..n - 1 {
        upper_t[i] = sys.lower[i + 1];
    }
    let lambda = solve_tridiagonal(&lower_t, &sys.diag, &upper_t, m_bar);

    s_bar[0] += 2.0 * lambda[0];
    s_bar[n - 2] += 2.0 * lambda[n - 1];
    for i in 1..n - 1 {
        let l = lambda[i];
        if l == 0.0 {
            continue;
        }
        let (a, b) = (h[i - 1], h[i]);
        s_bar[i - 1] += 3.0 * l / a;
        s_bar[i] += 3.0 * l / b;
        h_bar[i - 1] += l * (m[i - 1] + 2.0 * m[i] - 3.0 * s[i - 1]) / (a * a);
        h_bar[i] += l * (2.0 * m[i] + m[i + 1] - 3.0 * s[i]) / (b * b);
    }
}

/// Thomas algorithm. `lower[0]` and `upper[n - 1]` are ignored.
fn solve_tridiagonal(lower: &[f64], diag: &[f64], upper: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    c[0] = upper[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - lower[i] * c[i - 1];
        if i + 1 < n {
            c[i] = upper[i] / denom;
        }
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / denom;
    }

    let mut out = d;
    for i in (0..n - 1).rev() {
        out[i] -= c[i] * out[i + 1];
    }
    out
}
