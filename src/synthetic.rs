//! Synthetic P300 recordings.
//!
//! Produces Gaussian sensor noise with labelled stimulus onsets; every
//! "target" onset gets a spatially decaying Gaussian bump 300 ms later.
//! Used as a self-test fixture for the whole pipeline.
//!
//! ```text
//!   noise  ~ N(0, 1) · 1 µV                     [20, round(dur · sfreq)]
//!   onsets ⊂ [sfreq, n − sfreq)   (140 distinct samples, no replacement)
//!   labels = shuffle(20 × target ++ 120 × non)
//!   target → data[c, t0 + 0.3 s ± width/2] += amp[c] · gauss
//!            amp = linspace(5 µV, 1 µV, 20)
//! ```
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::error::{ErpError, Result};
use crate::recording::{Annotation, EventLabel, Recording};

/// Seed used by [`synthetic`].
pub const SYNTHETIC_SEED: u64 = 42;
/// Number of generated channels.
pub const N_CHANNELS: usize = 20;
/// Number of target onsets.
pub const N_TARGET: usize = 20;
/// Number of non-target onsets.
pub const N_NON_TARGET: usize = 120;

const NOISE_SCALE: f64 = 1e-6;
const AMP_FIRST: f64 = 5e-6;
const AMP_LAST: f64 = 1e-6;

/// Generate the default synthetic recording with a fresh `StdRng` seeded at 42.
///
/// Two calls with the same arguments return identical data.
pub fn synthetic(duration: f64, sfreq: f64) -> Result<Recording> {
    let mut rng = StdRng::seed_from_u64(SYNTHETIC_SEED);
    synthetic_with_rng(duration, sfreq, &mut rng)
}

/// Generate a synthetic recording drawing all randomness from `rng`.
pub fn synthetic_with_rng<R: Rng + ?Sized>(
    duration: f64,
    sfreq: f64,
    rng: &mut R,
) -> Result<Recording> {
    if !(duration > 0.0 && sfreq > 0.0) {
        return Err(ErpError::config(format!(
            "duration and sfreq must be positive (got {duration} s, {sfreq} Hz)"
        )));
    }
    let n_samples = (duration * sfreq).round() as usize;
    let edge = sfreq.round() as usize;
    let n_events = N_TARGET + N_NON_TARGET;
    if n_samples < 2 * edge || n_samples - 2 * edge < n_events {
        return Err(ErpError::config(format!(
            "{n_samples} samples leave no room for {n_events} onsets 1 s away from the edges"
        )));
    }

    // 1. Sensor noise.
    let mut data = Array2::<f64>::zeros((N_CHANNELS, n_samples));
    for v in data.iter_mut() {
        let z: f64 = StandardNormal.sample(rng);
        *v = z * NOISE_SCALE;
    }

    // 2. Distinct onsets in [edge, n_samples - edge).
    let onsets: Vec<usize> = rand::seq::index::sample(rng, n_samples - 2 * edge, n_events)
        .into_vec()
        .into_iter()
        .map(|i| i + edge)
        .collect();

    // 3. Labels, shuffled independently of the onset draw.
    let mut labels: Vec<EventLabel> = std::iter::repeat(EventLabel::Target)
        .take(N_TARGET)
        .chain(std::iter::repeat(EventLabel::NonTarget).take(N_NON_TARGET))
        .collect();
    labels.shuffle(rng);

    // 4. Target pulses.
    let width = (0.1 * sfreq) as usize;
    let half = width / 2;
    let sigma = 0.05 * sfreq;
    let offset = (0.3 * sfreq) as usize;
    let gauss: Vec<f64> = (0..width)
        .map(|k| {
            let z = (k as f64 - half as f64) / sigma;
            (-0.5 * z * z).exp()
        })
        .collect();
    let amp: Vec<f64> = (0..N_CHANNELS)
        .map(|c| AMP_FIRST + (AMP_LAST - AMP_FIRST) * c as f64 / (N_CHANNELS - 1) as f64)
        .collect();

    for (&onset, &label) in onsets.iter().zip(&labels) {
        if label != EventLabel::Target {
            continue;
        }
        let start = onset as i64 + offset as i64 - half as i64;
        // Out-of-bounds pulses are skipped, leaving a "target" epoch of pure noise.
        if start < 0 || start >= n_samples as i64 - width as i64 {
            tracing::warn!(onset, start, "target pulse outside recording; annotation kept without pulse");
            continue;
        }
        let start = start as usize;
        for (c, &a) in amp.iter().enumerate() {
            for (k, &g) in gauss.iter().enumerate() {
                data[[c, start + k]] += a * g;
            }
        }
    }

    // 5. Annotations.
    let annotations = onsets
        .iter()
        .zip(&labels)
        .map(|(&onset, label)| Annotation::new(onset as f64 / sfreq, 0.0, label.as_str()))
        .collect();
    let ch_names = (0..N_CHANNELS).map(|i| format!("EEG{i:02}")).collect();

    tracing::debug!(n_samples, sfreq, n_events, "generated synthetic recording");
    Recording::new(data, sfreq, ch_names, annotations)
}
