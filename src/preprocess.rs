//! In-place preprocessing stages on a [`Recording`].
//!
//! Every stage takes `&mut Recording` and hands it back so calls chain:
//!
//! ```no_run
//! use erpkit::{preprocess, synthetic};
//!
//! let mut rec = synthetic::synthetic(60.0, 256.0).unwrap();
//! preprocess::bandpass(&mut rec, 0.1, 30.0)
//!     .and_then(|r| preprocess::decimate(r, 128.0))
//!     .unwrap();
//! assert_eq!(rec.sfreq, 128.0);
//! ```
use crate::error::{ErpError, Result};
use crate::filter;
use crate::recording::Recording;
use crate::resample;

/// Zero-phase FIR filter with optional lower and upper edges.
///
/// `(Some(l), Some(h))` is a band-pass, `(Some(l), None)` a highpass and
/// `(None, Some(h))` a lowpass.
pub fn filter_data(
    rec: &mut Recording,
    l_freq: Option<f64>,
    h_freq: Option<f64>,
) -> Result<&mut Recording> {
    let h = filter::design_filter(l_freq, h_freq, rec.sfreq)?;
    tracing::debug!(?l_freq, ?h_freq, n_taps = h.len(), sfreq = rec.sfreq, "FIR filter");
    filter::apply_fir_zero_phase(&mut rec.data, &h)
        .map_err(|e| ErpError::config(format!("FIR filter: {e:#}")))?;
    Ok(rec)
}

/// Band-pass every channel to `[l_freq, h_freq]`.
///
/// Requires `0 < l_freq < h_freq < sfreq / 2`.
pub fn bandpass(rec: &mut Recording, l_freq: f64, h_freq: f64) -> Result<&mut Recording> {
    tracing::info!(l_freq, h_freq, "band-pass");
    filter_data(rec, Some(l_freq), Some(h_freq))
}

/// Remove power-line components at each of `freqs`.
pub fn notch<'a>(rec: &'a mut Recording, freqs: &[f64]) -> Result<&'a mut Recording> {
    let h = filter::design_notch(freqs, rec.sfreq)?;
    tracing::info!(?freqs, n_taps = h.len(), "notch");
    filter::apply_fir_zero_phase(&mut rec.data, &h)
        .map_err(|e| ErpError::config(format!("notch filter: {e:#}")))?;
    Ok(rec)
}

/// Resample to `sfreq` Hz. Annotations are in seconds and stay untouched.
///
/// Annotations that fall past the new last sample are dropped.
pub fn decimate(rec: &mut Recording, sfreq: f64) -> Result<&mut Recording> {
    if !(sfreq > 0.0) {
        return Err(ErpError::config(format!("target sampling rate must be positive, got {sfreq}")));
    }
    if (sfreq - rec.sfreq).abs() < 1e-9 {
        return Ok(rec);
    }
    let before = rec.n_samples();
    rec.data = resample::resample(&rec.data, rec.sfreq, sfreq)
        .map_err(|e| ErpError::config(format!("resample: {e:#}")))?;
    tracing::info!(from = rec.sfreq, to = sfreq, before, after = rec.n_samples(), "resample");
    rec.sfreq = sfreq;

    let duration = rec.duration_secs();
    let n_before = rec.annotations.len();
    rec.annotations.retain(|a| a.onset < duration);
    if rec.annotations.len() < n_before {
        tracing::warn!(dropped = n_before - rec.annotations.len(), "annotations past end after resampling");
    }
    Ok(rec)
}
