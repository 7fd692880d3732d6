//! FFT-based resampler following MNE's `resample(..., method='fft')`.
//!
//! Algorithm (from `mne/cuda.py _fft_resample`):
//!   1. Pad with reflect-limited samples up to the next power of two.
//!   2. FFT(padded)  →  half-spectrum.
//!   3. If downsampling: double the Nyquist bin (use_len = new_len).
//!      If upsampling:   halve  the Nyquist bin (use_len = old_len).
//!   4. Scale all bins by `new_len_padded / old_len_padded`.
//!   5. Inverse FFT with n = new_len_padded; the spectrum is truncated or
//!      zero-padded as needed.
//!   6. Strip the resampled padding edges.
use anyhow::{ensure, Result};
use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};

/// Compute the auto npad as MNE does: pad to the next power of 2.
///
/// ```text
/// min_add = min(n // 8, 100) * 2
/// total   = 2^ceil(log2(n + min_add)) - n
/// npads   = [total // 2, total - total // 2]
/// ```
pub fn auto_npad(n: usize) -> (usize, usize) {
    let min_add = (n / 8).min(100) * 2;
    let sum = n + min_add;
    let next_pow2 = 1usize << ((sum as f64).log2().ceil() as u32);
    let total = next_pow2 - n;
    (total / 2, total - total / 2)
}

/// Output length after resampling `n` samples by `ratio`: `round(n · ratio)`.
#[inline]
pub fn final_length(n: usize, ratio: f64) -> usize {
    (n as f64 * ratio).round() as usize
}

/// Resample `data` ([C, T]) from `src_sfreq` to `dst_sfreq`.
pub fn resample(data: &Array2<f64>, src_sfreq: f64, dst_sfreq: f64) -> Result<Array2<f64>> {
    ensure!(
        src_sfreq > 0.0 && dst_sfreq > 0.0,
        "sampling rates must be positive (got {src_sfreq} → {dst_sfreq})"
    );
    if (src_sfreq - dst_sfreq).abs() < 1e-9 {
        return Ok(data.clone());
    }
    let ratio = dst_sfreq / src_sfreq;
    let n_in = data.ncols();
    let n_out = final_length(n_in, ratio);
    ensure!(n_out > 0, "resampling {n_in} samples by {ratio} leaves nothing");

    let (npad_l, npad_r) = auto_npad(n_in);
    let mut out = Array2::<f64>::zeros((data.nrows(), n_out));
    for (row, mut dst) in data.rows().into_iter().zip(out.rows_mut()) {
        let resampled = resample_1d(&row.to_vec(), ratio, npad_l, npad_r);
        dst.assign(&ndarray::ArrayView1::from(&resampled));
    }
    Ok(out)
}

/// Resample a single 1-D signal with explicit (possibly asymmetric) padding.
pub fn resample_1d(x: &[f64], ratio: f64, npad_l: usize, npad_r: usize) -> Vec<f64> {
    let n_in = x.len();
    if n_in == 0 {
        return vec![];
    }
    let n_out = final_length(n_in, ratio);

    // ── 1. Reflect-limited padding ──────────────────────────────────────────
    let pad_l = npad_l.min(n_in - 1);
    let pad_r = npad_r.min(n_in - 1);
    let old_len = n_in + pad_l + pad_r;

    let mut x_ext = Vec::with_capacity(old_len);
    x_ext.extend((1..=pad_l).rev().map(|i| 2.0 * x[0] - x[i]));
    x_ext.extend_from_slice(x);
    let last = x[n_in - 1];
    x_ext.extend((1..=pad_r).map(|i| 2.0 * last - x[n_in - 1 - i]));

    // ── 2. Padded output length ─────────────────────────────────────────────
    let new_len = final_length(old_len, ratio).max(1);
    let shorter = new_len < old_len;
    let use_len = if shorter { new_len } else { old_len };

    // ── 3. Forward FFT, keep the half-spectrum ──────────────────────────────
    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft = planner.plan_fft_forward(old_len);
    let mut buf: Vec<Complex<f64>> = x_ext.iter().map(|&v| Complex { re: v, im: 0.0 }).collect();
    fft.process(&mut buf);
    let mut x_fft: Vec<Complex<f64>> = buf[..old_len / 2 + 1].to_vec();

    // ── 4. Nyquist bin ──────────────────────────────────────────────────────
    if use_len % 2 == 0 {
        let nyq = use_len / 2;
        if nyq < x_fft.len() {
            x_fft[nyq] *= if shorter { 2.0 } else { 0.5 };
        }
    }

    // ── 5. Boxcar scaling ───────────────────────────────────────────────────
    let scale = new_len as f64 / old_len as f64;
    x_fft.iter_mut().for_each(|v| *v *= scale);

    // ── 6. Inverse FFT of the Hermitian-extended spectrum ──────────────────
    let new_half = new_len / 2 + 1;
    let mut spec = vec![Complex::<f64>::default(); new_len];
    let n_copy = x_fft.len().min(new_half);
    spec[..n_copy].copy_from_slice(&x_fft[..n_copy]);
    for i in 1..new_half {
        let idx = new_len - i;
        if idx >= new_half {
            spec[idx] = spec[i].conj();
        }
    }
    let ifft = planner.plan_fft_inverse(new_len);
    ifft.process(&mut spec);
    let inv_scale = 1.0 / new_len as f64;

    // ── 7. Strip padding ────────────────────────────────────────────────────
    let to_remove_l = final_length(npad_l.min(n_in - 1), ratio).min(new_len);
    let mut result: Vec<f64> = spec[to_remove_l..]
        .iter()
        .take(n_out)
        .map(|c| c.re * inv_scale)
        .collect();
    result.resize(n_out, 0.0);
    result
}
