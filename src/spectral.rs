//! Spectral (FFT) resampling of periodic, uniformly sampled signals.
//!
//! A signal of `n` samples is read as the trigonometric polynomial through
//! its samples, then evaluated on `m` equally spaced points over the same
//! period, optionally displaced by a sub-sample shift.
//!
//! ## Parity
//!
//! An even-length spectrum has a single Nyquist bin at `n/2` that stands for
//! both `+n/2` and `-n/2`. It is split into two halves before the spectrum is
//! moved to the new length, and on an even-length output the two frequencies
//! `+m/2` and `-m/2` are folded back into its single Nyquist bin:
//!
//! ```text
//!   source bins   0  1 .. n/2-1 | n/2 |  -(n/2-1) .. -1
//!                                  / \
//!   signed freq   0  1 .. n/2-1  +n/2 -n/2  -(n/2-1) .. -1
//!                  \  \            |    |     /         /
//!   target bins   0  1 ..        (k mod m for |k| < m/2, m/2 for |k| = m/2)
//! ```
//!
//! Frequencies above the output band are dropped.

use ndarray::{Array2, ArrayView2, Axis, Zip};
use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{GridSplineError, Result};

/// Planned transforms for resampling signals of one length to another.
///
/// The plans and scratch buffers are reused across calls, which makes a
/// resampler cheap to apply to many lanes of the same length.
pub struct SpectralResampler {
    source_len: usize,
    target_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    forward_scratch: Vec<Complex64>,
    inverse_scratch: Vec<Complex64>,
    spectrum: Vec<Complex64>,
    resampled: Vec<Complex64>,
}

impl fmt::Debug for SpectralResampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralResampler")
            .field("source_len", &self.source_len)
            .field("target_len", &self.target_len)
            .finish()
    }
}

impl SpectralResampler {
    /// Plan a resampler from `source_len` to `target_len` samples.
    pub fn new(source_len: usize, target_len: usize) -> Result<Self> {
        check_lengths(source_len, target_len)?;

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(source_len);
        let inverse = planner.plan_fft_inverse(target_len);
        let zero = Complex64::new(0.0, 0.0);
        debug!(
            source_len = source_len,
            target_len = target_len,
            "Planned spectral resampler"
        );

        Ok(Self {
            source_len,
            target_len,
            forward_scratch: vec![zero; forward.get_inplace_scratch_len()],
            inverse_scratch: vec![zero; inverse.get_inplace_scratch_len()],
            forward,
            inverse,
            spectrum: vec![zero; source_len],
            resampled: vec![zero; target_len],
        })
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    /// Resample `signal`, evaluating it at `shift` past each output sample.
    ///
    /// `spacing` is the source sample spacing, in the units of `shift`.
    pub fn resample(&mut self, signal: &[f64], shift: f64, spacing: f64) -> Result<Vec<f64>> {
        if signal.len() != self.source_len {
            return Err(GridSplineError::ShapeMismatch {
                message: format!(
                    "resampler expects {} samples, got {}",
                    self.source_len,
                    signal.len()
                ),
            });
        }
        check_shift(shift, spacing)?;

        let mut out = vec![0.0; self.target_len];
        self.process(signal, shift, spacing, &mut out);
        Ok(out)
    }

    /// Resample without validation; lengths must match the plan.
    fn process(&mut self, signal: &[f64], shift: f64, spacing: f64, out: &mut [f64]) {
        let n = self.source_len;
        let m = self.target_len;
        if n == m && shift == 0.0 {
            out.copy_from_slice(signal);
            return;
        }

        for (c, &v) in self.spectrum.iter_mut().zip(signal) {
            *c = Complex64::new(v, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.forward_scratch);

        let zero = Complex64::new(0.0, 0.0);
        self.resampled.iter_mut().for_each(|c| *c = zero);
        let phase_step = 2.0 * PI * shift / (n as f64 * spacing);
        let resampled = &mut self.resampled;
        let mut deposit = |k: isize, c: Complex64| {
            let twice = 2 * k.unsigned_abs();
            let c = if phase_step == 0.0 {
                c
            } else {
                c * Complex64::from_polar(1.0, phase_step * k as f64)
            };
            if twice < m {
                resampled[k.rem_euclid(m as isize) as usize] += c;
            } else if twice == m {
                resampled[m / 2] += c;
            }
        };

        for (j, &c) in self.spectrum.iter().enumerate() {
            if n % 2 == 0 && j == n / 2 {
                let nyquist = (n / 2) as isize;
                deposit(nyquist, c * 0.5);
                deposit(-nyquist, c * 0.5);
            } else if j <= (n - 1) / 2 {
                deposit(j as isize, c);
            } else {
                deposit(j as isize - n as isize, c);
            }
        }

        self.inverse
            .process_with_scratch(&mut self.resampled, &mut self.inverse_scratch);
        let scale = 1.0 / n as f64;
        for (dst, c) in out.iter_mut().zip(&self.resampled) {
            *dst = c.re * scale;
        }
    }
}

/// Resample a periodic signal to `target_len` samples over the same period.
///
/// Output sample `i` approximates the underlying function at
/// `i * period / target_len + shift`, where the period is
/// `signal.len() * spacing`. Equal lengths with zero shift return the input.
pub fn fft_resample_1d(
    signal: &[f64],
    target_len: usize,
    shift: f64,
    spacing: f64,
) -> Result<Vec<f64>> {
    check_lengths(signal.len(), target_len)?;
    check_shift(shift, spacing)?;
    if signal.len() == target_len && shift == 0.0 {
        return Ok(signal.to_vec());
    }
    SpectralResampler::new(signal.len(), target_len)?.resample(signal, shift, spacing)
}

/// Resample a doubly periodic 2-D signal to `target` samples per axis.
///
/// Axis 0 is resampled first, then axis 1; `shift` and `spacing` are per axis.
pub fn fft_resample_2d(
    signal: ArrayView2<f64>,
    target: [usize; 2],
    shift: [f64; 2],
    spacing: [f64; 2],
) -> Result<Array2<f64>> {
    let (nx, ny) = signal.dim();
    check_lengths(nx, target[0])?;
    check_lengths(ny, target[1])?;
    check_shift(shift[0], spacing[0])?;
    check_shift(shift[1], spacing[1])?;

    let rows = resample_axis(signal, Axis(0), target[0], shift[0], spacing[0])?;
    resample_axis(rows.view(), Axis(1), target[1], shift[1], spacing[1])
}

fn resample_axis(
    signal: ArrayView2<f64>,
    axis: Axis,
    target_len: usize,
    shift: f64,
    spacing: f64,
) -> Result<Array2<f64>> {
    let source_len = signal.len_of(axis);
    if source_len == target_len && shift == 0.0 {
        return Ok(signal.to_owned());
    }

    let mut shape = [signal.nrows(), signal.ncols()];
    shape[axis.index()] = target_len;
    let mut out = Array2::zeros(shape);
    let mut resampler = SpectralResampler::new(source_len, target_len)?;
    let mut lane_in = vec![0.0; source_len];
    let mut lane_out = vec![0.0; target_len];

    Zip::from(out.lanes_mut(axis))
        .and(signal.lanes(axis))
        .for_each(|mut dst, src| {
            for (a, b) in lane_in.iter_mut().zip(src.iter()) {
                *a = *b;
            }
            resampler.process(&lane_in, shift, spacing, &mut lane_out);
            for (a, b) in dst.iter_mut().zip(&lane_out) {
                *a = *b;
            }
        });
    Ok(out)
}

fn check_lengths(source_len: usize, target_len: usize) -> Result<()> {
    if source_len == 0 {
        return Err(GridSplineError::invalid_parameter(
            "signal",
            "cannot resample an empty signal",
        ));
    }
    if target_len == 0 {
        return Err(GridSplineError::invalid_parameter(
            "target_len",
            "must be positive",
        ));
    }
    Ok(())
}

fn check_shift(shift: f64, spacing: f64) -> Result<()> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(GridSplineError::invalid_parameter(
            "spacing",
            format!("must be positive and finite, got {}", spacing),
        ));
    }
    if !shift.is_finite() {
        return Err(GridSplineError::invalid_parameter(
            "shift",
            format!("must be finite, got {}", shift),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn samples(n: usize, f: impl Fn(f64) -> f64) -> Vec<f64> {
        (0..n).map(|i| f(2.0 * PI * i as f64 / n as f64)).collect()
    }

    #[test]
    fn test_identity_fast_path() {
        let signal = vec![1.0, -2.0, 3.5, 0.25];
        assert_eq!(fft_resample_1d(&signal, 4, 0.0, 1.0).unwrap(), signal);
    }

    #[test]
    fn test_constant_signal() {
        for (n, m) in [(5, 8), (8, 5), (4, 4), (1, 3)] {
            let out = fft_resample_1d(&vec![2.5; n], m, 0.3, 1.0).unwrap();
            assert_eq!(out.len(), m);
            for v in out {
                assert_abs_diff_eq!(v, 2.5, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_even_nyquist_split_on_upsampling() {
        // cos(2x) on 4 points is exactly the Nyquist mode.
        let signal = samples(4, |x| (2.0 * x).cos());
        let out = fft_resample_1d(&signal, 8, 0.0, 1.0).unwrap();
        for (a, b) in out.iter().zip(samples(8, |x| (2.0 * x).cos())) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_resampler_reuse() {
        let f = |x: f64| 1.0 + x.sin() - 0.5 * (2.0 * x).cos();
        let mut resampler = SpectralResampler::new(9, 16).unwrap();
        assert_eq!(resampler.source_len(), 9);
        assert_eq!(resampler.target_len(), 16);

        for _ in 0..2 {
            let out = resampler.resample(&samples(9, f), 0.0, 1.0).unwrap();
            for (a, b) in out.iter().zip(samples(16, f)) {
                assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
            }
        }
        assert!(resampler.resample(&[0.0; 8], 0.0, 1.0).is_err());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(fft_resample_1d(&[], 4, 0.0, 1.0).is_err());
        assert!(fft_resample_1d(&[1.0], 0, 0.0, 1.0).is_err());
        assert!(fft_resample_1d(&[1.0], 2, 0.0, 0.0).is_err());
        assert!(fft_resample_1d(&[1.0], 2, f64::NAN, 1.0).is_err());
        assert!(SpectralResampler::new(0, 3).is_err());

        let err = fft_resample_1d(&[1.0, 2.0], 3, 0.0, -1.0).unwrap_err();
        assert!(matches!(err, GridSplineError::InvalidParameter { .. }));
    }
}
