//! Time-window features.
//!
//! Each epoch is sliced to a post-stimulus window and flattened
//! channel-major into one row:
//!
//! ```text
//!   epoch [C, T]  ──slice [i0, i1)──►  [C, W]  ──flatten──►  [C·W]
//!   column index  = c · W + t
//! ```
use ndarray::{s, Array1, Array2, ArrayView1};

use crate::epoch::Epochs;
use crate::error::{ErpError, Result};

/// Index of the sample at time `t` seconds in `times`, following
/// `mne.Epochs.time_as_index(use_rounding=False)`: truncation of
/// `(t − times[0]) · sfreq`, clamped to `[0, times.len()]`.
pub fn time_as_index(times: ArrayView1<'_, f64>, sfreq: f64, t: f64) -> usize {
    let Some(&t0) = times.first() else { return 0 };
    let idx = ((t - t0) * sfreq).trunc();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(times.len())
    }
}

/// Build `(X, y)` from the epochs restricted to `window = (start, stop)` s.
///
/// `X` has shape `[n_epochs, n_channels · n_window]`; `y` holds the event
/// codes (`non = 0`, `target = 1`).
pub fn extract_features(epochs: &Epochs, window: (f64, f64)) -> Result<(Array2<f64>, Array1<i32>)> {
    let (start, stop) = window;
    if !(start < stop) {
        return Err(ErpError::config(format!("feature window needs start < stop (got {start}, {stop})")));
    }
    let i0 = time_as_index(epochs.times.view(), epochs.sfreq, start);
    let i1 = time_as_index(epochs.times.view(), epochs.sfreq, stop);
    if i1 <= i0 {
        return Err(ErpError::config(format!(
            "feature window ({start}, {stop}) s selects no samples of the epoch"
        )));
    }
    let n_window = i1 - i0;
    let n_features = epochs.n_channels() * n_window;

    let mut x = Array2::<f64>::zeros((epochs.len(), n_features));
    for (mut row, epoch) in x.outer_iter_mut().zip(epochs.data.outer_iter()) {
        let win = epoch.slice(s![.., i0..i1]);
        row.iter_mut().zip(win.iter()).for_each(|(d, &v)| *d = v);
    }
    let y = Array1::from_iter(epochs.events.iter().map(|e| e.label.code()));

    tracing::debug!(n_epochs = epochs.len(), n_features, i0, i1, "features");
    Ok((x, y))
}

/// Collapse a flattened channel-major weight vector to one magnitude per
/// channel: the mean absolute weight over that channel's window samples.
pub fn fold_channel_weights(weights: ArrayView1<'_, f64>, n_channels: usize) -> Result<Array1<f64>> {
    if n_channels == 0 || weights.len() % n_channels != 0 {
        return Err(ErpError::validation(format!(
            "{} weights do not split into {n_channels} channels",
            weights.len()
        )));
    }
    let per_ch = weights.len() / n_channels;
    Ok(Array1::from_shape_fn(n_channels, |c| {
        weights.slice(s![c * per_ch..(c + 1) * per_ch]).mapv(f64::abs).sum() / per_ch as f64
    }))
}
