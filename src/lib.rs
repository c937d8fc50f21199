//! # gridspline
//!
//! Differentiable interpolation on structured grids.
//!
//! This library evaluates tensor-product splines over 1-D, 2-D and 3-D
//! rectilinear grids, together with exact analytic derivatives of the result
//! with respect to the query point, the sampled values and the node
//! coordinates. A separate spectral path resamples uniformly sampled periodic
//! signals with the FFT.
//!
//! ## Key Features
//!
//! - **Eight interpolation methods**: nearest, linear, cubic, cubic2, cardinal,
//!   catmull-rom, monotonic and monotonic-0
//! - **Periodic axes and extrapolation policies**: wrap, extend, fill or mark missing
//! - **Analytic sensitivities**: gradients and Jacobians without finite differences
//! - **Spectral resampling**: parity-aware FFT up/down-sampling with sub-sample shifts
//!
//! ## Architecture
//!
//! - **Grid layer**: validated node axes, cell location and periodic ghost layout
//! - **Spline layer**: basis weights, slope estimation and tensor-product contraction
//! - **Spectral layer**: planned forward/inverse transforms applied lane by lane

pub mod config;
pub mod error;
pub mod interpolation;
pub mod logging;
pub mod spectral;

pub use config::Config;
pub use error::{GridSplineError, Result};
pub use interpolation::{
    estimate_slopes, get_method, interp1d, interp2d, interp3d, BoundaryPolicy, BoundarySpec,
    DerivativeOrder, Extrapolation, Grid, InterpOptions, Interpolator, Method, PeriodSpec, Sensitivity,
};
pub use logging::{
    init_tracing, log_error, log_operation_end, log_operation_start, log_timed_operation,
};
pub use spectral::{fft_resample_1d, fft_resample_2d, SpectralResampler};
