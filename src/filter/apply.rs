//! Overlap-add zero-phase FIR convolution.
//!
//! Matches MNE's `_overlap_add_filter` + `_1d_overlap_filter`.
//!
//! Zero-phase is achieved by shifting the output left by `(N-1)/2` samples,
//! NOT by running filtfilt. The edge transient is suppressed by
//! reflect-limited padding of `N-1` samples on each side.
use std::sync::Arc;

use anyhow::{ensure, Result};
use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// A linear-phase FIR kernel with its FFT plans, reusable across channels.
pub struct FirFilter {
    h: Vec<f64>,
    n_fft: usize,
    h_fft: Vec<Complex<f64>>,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

impl FirFilter {
    /// Prepare `h` for signals of `n_x` samples. `h` must have odd length.
    pub fn new(h: Vec<f64>, n_x: usize) -> Result<Self> {
        ensure!(!h.is_empty() && h.len() % 2 == 1, "FIR kernel must have odd length, got {}", h.len());
        let n_ext = n_x + 2 * (h.len() - 1);
        let n_fft = choose_fft_len(h.len(), n_ext);

        let mut planner: FftPlanner<f64> = FftPlanner::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);

        let mut h_fft: Vec<Complex<f64>> = h
            .iter()
            .map(|&v| Complex { re: v, im: 0.0 })
            .chain(std::iter::repeat(Complex::default()))
            .take(n_fft)
            .collect();
        fwd.process(&mut h_fft);

        Ok(Self { h, n_fft, h_fft, fwd, inv })
    }

    /// Number of taps.
    pub fn len(&self) -> usize {
        self.h.len()
    }

    pub fn is_empty(&self) -> bool {
        self.h.is_empty()
    }

    /// Filter a single 1-D signal; output has the same length as `x`.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        let n_x = x.len();
        let n_h = self.h.len();
        if n_x == 0 {
            return vec![];
        }

        let shift = (n_h - 1) / 2;
        let n_edge = n_h - 1;
        let x_ext = reflect_limited_pad(x, n_edge, n_edge);
        let n_ext = x_ext.len();

        let n_fft = self.n_fft;
        let n_seg = n_fft - n_h + 1;
        let n_segments = n_ext.div_ceil(n_seg);
        let inv_scale = 1.0 / n_fft as f64;
        let mut x_filtered = vec![0.0_f64; n_ext];
        let mut buf = vec![Complex::<f64>::default(); n_fft];

        for seg_idx in 0..n_segments {
            let start = seg_idx * n_seg;
            let stop = (start + n_seg).min(n_ext);

            for (b, v) in buf.iter_mut().zip(
                x_ext[start..stop].iter().copied().chain(std::iter::repeat(0.0)),
            ) {
                *b = Complex { re: v, im: 0.0 };
            }
            self.fwd.process(&mut buf);
            for (b, &hf) in buf.iter_mut().zip(&self.h_fft) {
                *b *= hf;
            }
            self.inv.process(&mut buf);

            // Accumulate, undoing the (N-1)/2 group delay.
            let out_start = start.saturating_sub(shift);
            let out_end = (out_start + n_fft).min(n_ext);
            let prod_start = shift.saturating_sub(start);
            for (o, p) in (out_start..out_end).zip(prod_start..n_fft) {
                x_filtered[o] += buf[p].re * inv_scale;
            }
        }

        x_filtered[n_edge..n_edge + n_x].to_vec()
    }
}

/// Apply a zero-phase FIR filter to each channel of `data` ([C, T]) in-place.
pub fn apply_fir_zero_phase(data: &mut Array2<f64>, h: &[f64]) -> Result<()> {
    let filter = FirFilter::new(h.to_vec(), data.ncols())?;
    for mut row in data.rows_mut() {
        let filtered = filter.apply(&row.to_vec());
        row.assign(&ndarray::ArrayView1::from(&filtered));
    }
    Ok(())
}

/// Filter a single 1-D signal with the overlap-add algorithm.
pub fn filter_1d(x: &[f64], h: &[f64]) -> Result<Vec<f64>> {
    Ok(FirFilter::new(h.to_vec(), x.len())?.apply(x))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Reflect-limited padding (MNE's `_smart_pad`).
///
/// Left:  `pad[i] = 2*x[0] - x[n_l-i]`  for i in 1..=n_l
/// Right: `pad[i] = 2*x[-1] - x[-(i+1)]` for i in 1..=n_r
/// Padding beyond `len(x) - 1` samples is zero-filled.
fn reflect_limited_pad(x: &[f64], n_l: usize, n_r: usize) -> Vec<f64> {
    let n = x.len();
    let actual_l = n_l.min(n - 1);
    let actual_r = n_r.min(n - 1);

    let mut out = Vec::with_capacity(n_l + n + n_r);
    out.extend(std::iter::repeat(0.0).take(n_l - actual_l));
    out.extend((1..=actual_l).rev().map(|i| 2.0 * x[0] - x[i]));
    out.extend_from_slice(x);
    let last = x[n - 1];
    out.extend((1..=actual_r).map(|i| 2.0 * last - x[n - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(n_r - actual_r));
    out
}

/// Choose the FFT block size (power of 2 minimising operation count).
///
/// MNE's cost function:
///   `cost = ceil(n_x / (N - n_h + 1)) * N * (log2(N) + 1) + 4e-5 * N * n_x`
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let max_pow = (n_x as f64).log2().ceil() as u32 + 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;

    (min_pow..=max_pow.max(min_pow))
        .map(|pow| 1_usize << pow)
        .filter(|&n| n >= min_fft)
        .map(|n| {
            let n_seg = (n - n_h + 1) as f64;
            let cost = (n_x as f64 / n_seg).ceil() * n as f64 * ((n as f64).log2() + 1.0)
                + 4e-5 * n as f64 * n_x as f64;
            (n, cost)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n)
        .unwrap_or_else(|| min_fft.next_power_of_two())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::design::{design_bandpass, design_highpass};

    #[test]
    fn filter_preserves_length() {
        let x: Vec<f64> = (0..1024).map(|i| (i as f64 / 1024.0).sin()).collect();
        let h = design_highpass(0.5, 256.0).unwrap();
        let y = filter_1d(&x, &h).unwrap();
        assert_eq!(y.len(), x.len());
    }

    #[test]
    fn filter_removes_dc() {
        let x = vec![1.0_f64; 4096];
        let h = design_highpass(0.5, 256.0).unwrap();
        let y = filter_1d(&x, &h).unwrap();
        let n_h = h.len();
        let interior = &y[n_h..y.len() - n_h];
        let max_val = interior.iter().map(|v| v.abs()).fold(0.0_f64, f64::max);
        assert!(max_val < 1e-6, "DC not removed: max={max_val}");
    }

    #[test]
    fn identity_kernel_is_passthrough() {
        let x: Vec<f64> = (0..300).map(|i| (i as f64 * 0.37).cos()).collect();
        let y = filter_1d(&x, &[1.0]).unwrap();
        for (a, b) in x.iter().zip(&y) {
            approx::assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn kernel_longer_than_signal() {
        // 8449 taps on 512 samples: padding falls back to zeros past the reflection.
        let h = design_bandpass(0.1, 30.0, 256.0).unwrap();
        let x: Vec<f64> = (0..512).map(|i| (i as f64 * 0.1).sin()).collect();
        let y = filter_1d(&x, &h).unwrap();
        assert_eq!(y.len(), 512);
        assert!(y.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn reflect_limited_left_pad() {
        let x = [1.0_f64, 2.0, 3.0, 4.0, 5.0];
        let padded = reflect_limited_pad(&x, 3, 0);
        assert_eq!(&padded[..3], &[-2.0, -1.0, 0.0]);
        assert_eq!(&padded[3..], &x[..]);
    }

    #[test]
    fn reflect_limited_pad_zero_fills_overflow() {
        let x = [1.0_f64, 2.0];
        let padded = reflect_limited_pad(&x, 3, 2);
        assert_eq!(padded, vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
    }
}
