//! FIR filter design matching MNE / `scipy.signal.firwin`.
//!
//! Transition bandwidths and filter length follow MNE's `'auto'` rules:
//!   • low  transition = min(max(0.25 · l_freq, 2.0), l_freq)
//!   • high transition = min(max(0.25 · h_freq, 2.0), nyquist − h_freq)
//!   • length N        = ceil(3.3 / min(transition) · sfreq), rounded to odd
//!
//! The firwin cutoff sits in the middle of each transition band.
use std::f64::consts::PI;

use crate::error::{ErpError, Result};

/// Hamming window length factor (`3.3 / trans_bw` periods).
const HAMMING_LENGTH_FACTOR: f64 = 3.3;
/// Transition bandwidth used for notch filters, in Hz.
pub const NOTCH_TRANS_BANDWIDTH: f64 = 1.0;

/// MNE transition bandwidth for the lower pass-band edge.
pub fn auto_l_trans_bandwidth(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// MNE transition bandwidth for the upper pass-band edge.
pub fn auto_h_trans_bandwidth(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of FIR taps for a given transition bandwidth. Always odd.
pub fn auto_filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n = (HAMMING_LENGTH_FACTOR / trans_bw * sfreq).ceil() as usize;
    if n % 2 == 0 { n + 1 } else { n.max(1) }
}

/// Design a zero-phase band-pass FIR for `[l_freq, h_freq]`.
///
/// Requires `0 < l_freq < h_freq < sfreq / 2`.
pub fn design_bandpass(l_freq: f64, h_freq: f64, sfreq: f64) -> Result<Vec<f64>> {
    let nyq = sfreq / 2.0;
    if !(l_freq > 0.0 && l_freq < h_freq && h_freq < nyq) {
        return Err(ErpError::config(format!(
            "band-pass edges must satisfy 0 < l_freq < h_freq < {nyq} Hz (got {l_freq}, {h_freq})"
        )));
    }
    let l_trans = auto_l_trans_bandwidth(l_freq);
    let h_trans = auto_h_trans_bandwidth(h_freq, sfreq);
    let n = auto_filter_length(l_trans.min(h_trans), sfreq);
    let cutoffs = [l_freq - l_trans / 2.0, h_freq + h_trans / 2.0];
    Ok(firwin(n, &cutoffs, sfreq, false))
}

/// Design a zero-phase highpass FIR at `l_freq` via spectral inversion of
/// a unit-DC lowpass, matching `mne.filter.create_filter(l_freq=…, h_freq=None)`.
pub fn design_highpass(l_freq: f64, sfreq: f64) -> Result<Vec<f64>> {
    if !(l_freq > 0.0 && l_freq < sfreq / 2.0) {
        return Err(ErpError::config(format!("highpass cutoff {l_freq} Hz out of range")));
    }
    let trans_bw = auto_l_trans_bandwidth(l_freq);
    let n = auto_filter_length(trans_bw, sfreq);
    let mut h = firwin(n, &[l_freq - trans_bw / 2.0], sfreq, true);
    h.iter_mut().for_each(|v| *v = -*v);
    h[n / 2] += 1.0;
    Ok(h)
}

/// Design a zero-phase lowpass FIR at `h_freq`.
pub fn design_lowpass(h_freq: f64, sfreq: f64) -> Result<Vec<f64>> {
    if !(h_freq > 0.0 && h_freq < sfreq / 2.0) {
        return Err(ErpError::config(format!("lowpass cutoff {h_freq} Hz out of range")));
    }
    let trans_bw = auto_h_trans_bandwidth(h_freq, sfreq);
    let n = auto_filter_length(trans_bw, sfreq);
    Ok(firwin(n, &[h_freq + trans_bw / 2.0], sfreq, true))
}

/// Pick band-pass, highpass or lowpass from which edges are given,
/// like `mne.filter.create_filter(l_freq, h_freq)`.
pub fn design_filter(l_freq: Option<f64>, h_freq: Option<f64>, sfreq: f64) -> Result<Vec<f64>> {
    match (l_freq, h_freq) {
        (Some(l), Some(h)) => design_bandpass(l, h, sfreq),
        (Some(l), None) => design_highpass(l, sfreq),
        (None, Some(h)) => design_lowpass(h, sfreq),
        (None, None) => Err(ErpError::config("filter needs l_freq, h_freq or both")),
    }
}

/// Design a zero-phase band-stop FIR removing each of `freqs`.
///
/// Each stop band is `f ± f/400` widened by a quarter of the 1 Hz transition
/// on each side; the length is set by half the transition bandwidth.
pub fn design_notch(freqs: &[f64], sfreq: f64) -> Result<Vec<f64>> {
    let nyq = sfreq / 2.0;
    if freqs.is_empty() {
        return Err(ErpError::config("notch filter needs at least one frequency"));
    }
    let mut sorted: Vec<f64> = freqs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut cutoffs = Vec::with_capacity(2 * sorted.len());
    for &f in &sorted {
        let half_width = f / 400.0 + NOTCH_TRANS_BANDWIDTH / 4.0;
        if !(f > 0.0 && f + half_width < nyq) {
            return Err(ErpError::config(format!(
                "notch frequency {f} Hz must lie strictly below Nyquist ({nyq} Hz)"
            )));
        }
        if let Some(&prev_hi) = cutoffs.last() {
            if f - half_width <= prev_hi {
                return Err(ErpError::config(format!("notch bands overlap near {f} Hz")));
            }
        }
        cutoffs.push(f - half_width);
        cutoffs.push(f + half_width);
    }
    let n = auto_filter_length(NOTCH_TRANS_BANDWIDTH / 2.0, sfreq);
    Ok(firwin(n, &cutoffs, sfreq, true))
}

/// Hamming-windowed sinc design, `scipy.signal.firwin(n, cutoffs, fs=sfreq,
/// pass_zero=…, scale=True)`.
///
/// `cutoffs` must be increasing and strictly inside `(0, nyquist)`. Bands
/// alternate pass/stop starting with pass when `pass_zero` is true. `n`
/// must be odd whenever the Nyquist band passes.
pub fn firwin(n: usize, cutoffs: &[f64], sfreq: f64, pass_zero: bool) -> Vec<f64> {
    assert!(n % 2 == 1, "firwin requires odd N for a linear-phase filter");
    let nyq = sfreq / 2.0;
    let alpha = (n - 1) as f64 / 2.0;
    let pass_nyquist = (cutoffs.len() % 2 == 1) ^ pass_zero;

    // Normalised band edges, padded with 0 / 1 and paired up.
    let mut edges: Vec<f64> = Vec::with_capacity(cutoffs.len() + 2);
    if pass_zero {
        edges.push(0.0);
    }
    edges.extend(cutoffs.iter().map(|&c| c / nyq));
    if pass_nyquist {
        edges.push(1.0);
    }

    let win = hamming(n);
    let mut h = vec![0.0_f64; n];
    for band in edges.chunks_exact(2) {
        let (left, right) = (band[0], band[1]);
        for (i, v) in h.iter_mut().enumerate() {
            let m = i as f64 - alpha;
            *v += right * sinc(right * m) - left * sinc(left * m);
        }
    }
    for (v, w) in h.iter_mut().zip(&win) {
        *v *= w;
    }

    // Unit gain at the centre of the first pass band.
    let (left, right) = (edges[0], edges[1]);
    let scale_freq = if left == 0.0 {
        0.0
    } else if right == 1.0 {
        1.0
    } else {
        0.5 * (left + right)
    };
    let s: f64 = h
        .iter()
        .enumerate()
        .map(|(i, &v)| v * (PI * (i as f64 - alpha) * scale_freq).cos())
        .sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Magnitude of the frequency response of `h` at `freq` Hz.
pub fn gain_at(h: &[f64], freq: f64, sfreq: f64) -> f64 {
    let w = 2.0 * PI * freq / sfreq;
    let (re, im) = h.iter().enumerate().fold((0.0, 0.0), |(re, im), (k, &v)| {
        (re + v * (w * k as f64).cos(), im - v * (w * k as f64).sin())
    });
    (re * re + im * im).sqrt()
}

#[inline]
fn sinc(x: f64) -> f64 {
    if x == 0.0 { 1.0 } else { (PI * x).sin() / (PI * x) }
}
