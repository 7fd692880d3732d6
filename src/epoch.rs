//! Event-locked epoching.
//!
//! Cuts a fixed window `[tmin, tmax]` (inclusive) around every annotation
//! whose description is in the [`EventLabel`] vocabulary:
//!
//! ```text
//!   event sample  s = round(onset · sfreq)
//!   window        [s + round(tmin · sfreq), s + round(tmax · sfreq)]
//!   ──────────────┬──────────────────┬───────────────────────────────
//!                 │◄── tmin ──►│◄──── tmax ────►│
//!                              s
//! ```
//!
//! Windows that cross either edge of the recording are dropped, as are
//! repeated event samples (the first one wins). No baseline correction.
use ndarray::{s, Array1, Array2, Array3, Axis};

use crate::error::{ErpError, Result};
use crate::recording::{EventLabel, Recording};

/// One retained event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Sample index of the onset in the continuous recording.
    pub sample: usize,
    pub label: EventLabel,
}

/// Fixed-length windows cut around labelled events.
#[derive(Debug, Clone)]
pub struct Epochs {
    /// `[n_epochs, n_channels, n_times]`.
    pub data: Array3<f64>,
    /// One entry per epoch, in sample order.
    pub events: Vec<Event>,
    /// Time of each window sample relative to the onset, in seconds.
    pub times: Array1<f64>,
    pub sfreq: f64,
    pub ch_names: Vec<String>,
    pub positions: Option<Array2<f64>>,
}

impl Epochs {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn n_channels(&self) -> usize {
        self.data.dim().1
    }

    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    /// Labels in epoch order.
    pub fn labels(&self) -> Vec<EventLabel> {
        self.events.iter().map(|e| e.label).collect()
    }

    /// Number of epochs carrying `label`.
    pub fn count(&self, label: EventLabel) -> usize {
        self.events.iter().filter(|e| e.label == label).count()
    }

    /// Mean over the epochs carrying `label`, shape `[n_channels, n_times]`.
    /// `None` when no epoch has that label.
    pub fn average(&self, label: EventLabel) -> Option<Array2<f64>> {
        let idx: Vec<usize> = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.label == label)
            .map(|(i, _)| i)
            .collect();
        if idx.is_empty() {
            return None;
        }
        self.data.select(Axis(0), &idx).mean_axis(Axis(0))
    }
}

/// Cut epochs from `rec` for every vocabulary annotation.
///
/// # Errors
///
/// * [`ErpError::Config`] when `tmin >= tmax`.
/// * [`ErpError::Validation`] when the recording has no annotations, none
///   of them is `"target"`/`"non"`, or every window crosses an edge.
pub fn make_epochs(rec: &Recording, tmin: f64, tmax: f64) -> Result<Epochs> {
    if !(tmin < tmax) {
        return Err(ErpError::config(format!("epoch window needs tmin < tmax (got {tmin}, {tmax})")));
    }
    if rec.annotations.is_empty() {
        return Err(ErpError::validation("recording lacks annotations"));
    }

    let mut events: Vec<Event> = rec
        .annotations
        .iter()
        .filter_map(|a| {
            a.label().map(|label| Event { sample: (a.onset * rec.sfreq).round() as usize, label })
        })
        .collect();
    if events.is_empty() {
        return Err(ErpError::validation("no annotation matches the target/non vocabulary"));
    }
    let n_ignored = rec.annotations.len() - events.len();
    if n_ignored > 0 {
        tracing::debug!(n_ignored, "annotations outside the event vocabulary ignored");
    }

    // Stable sort, so the first of two events on one sample is kept.
    events.sort_by_key(|e| e.sample);
    let n_before = events.len();
    events.dedup_by_key(|e| e.sample);
    if events.len() < n_before {
        tracing::warn!(dropped = n_before - events.len(), "events sharing a sample dropped");
    }

    let start_off = (tmin * rec.sfreq).round() as i64;
    let stop_off = (tmax * rec.sfreq).round() as i64;
    let n_times = (stop_off - start_off + 1) as usize;
    let n_samples = rec.n_samples() as i64;

    let n_events = events.len();
    events.retain(|e| {
        let s = e.sample as i64;
        s + start_off >= 0 && s + stop_off < n_samples
    });
    if events.len() < n_events {
        tracing::info!(dropped = n_events - events.len(), "epochs crossing the recording edge dropped");
    }
    if events.is_empty() {
        return Err(ErpError::validation("every epoch window crosses the recording edge"));
    }

    let mut data = Array3::<f64>::zeros((events.len(), rec.n_channels(), n_times));
    for (mut dst, e) in data.outer_iter_mut().zip(&events) {
        let start = (e.sample as i64 + start_off) as usize;
        dst.assign(&rec.data.slice(s![.., start..start + n_times]));
    }
    let times = Array1::from_shape_fn(n_times, |i| (start_off + i as i64) as f64 / rec.sfreq);

    tracing::info!(
        n_epochs = events.len(),
        n_target = events.iter().filter(|e| e.label == EventLabel::Target).count(),
        n_times,
        "epochs"
    );
    Ok(Epochs {
        data,
        events,
        times,
        sfreq: rec.sfreq,
        ch_names: rec.ch_names.clone(),
        positions: rec.positions.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::Annotation;

    fn ramp(n_ch: usize, n_t: usize, sfreq: f64, ann: Vec<Annotation>) -> Recording {
        let data = Array2::from_shape_fn((n_ch, n_t), |(c, t)| (c * 1000 + t) as f64);
        let names = (0..n_ch).map(|i| format!("C{i}")).collect();
        Recording::new(data, sfreq, names, ann).unwrap()
    }

    #[test]
    fn window_is_inclusive_and_aligned() {
        let rec = ramp(2, 1000, 100.0, vec![Annotation::new(2.0, 0.0, "target")]);
        let ep = make_epochs(&rec, -0.2, 0.8).unwrap();
        assert_eq!(ep.data.dim(), (1, 2, 101));
        assert_eq!(ep.data[[0, 0, 0]], 180.0);
        assert_eq!(ep.data[[0, 1, 100]], 1280.0);
        approx::assert_abs_diff_eq!(ep.times[0], -0.2, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(ep.times[100], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn edge_windows_are_dropped() {
        let rec = ramp(
            1,
            1000,
            100.0,
            vec![
                Annotation::new(0.1, 0.0, "non"),
                Annotation::new(5.0, 0.0, "target"),
                Annotation::new(9.5, 0.0, "non"),
            ],
        );
        let ep = make_epochs(&rec, -0.2, 0.8).unwrap();
        assert_eq!(ep.len(), 1);
        assert_eq!(ep.events[0], Event { sample: 500, label: EventLabel::Target });
    }

    #[test]
    fn unknown_descriptions_are_ignored() {
        let rec = ramp(
            1,
            1000,
            100.0,
            vec![Annotation::new(3.0, 0.0, "BAD_blink"), Annotation::new(4.0, 0.0, "non")],
        );
        let ep = make_epochs(&rec, -0.1, 0.1).unwrap();
        assert_eq!(ep.labels(), vec![EventLabel::NonTarget]);
    }

    #[test]
    fn duplicate_samples_keep_first() {
        let rec = ramp(
            1,
            1000,
            100.0,
            vec![Annotation::new(3.0, 0.0, "target"), Annotation::new(3.001, 0.0, "non")],
        );
        let ep = make_epochs(&rec, -0.1, 0.1).unwrap();
        assert_eq!(ep.labels(), vec![EventLabel::Target]);
    }

    #[test]
    fn missing_annotations_is_validation_error() {
        let rec = ramp(1, 100, 100.0, vec![]);
        let err = make_epochs(&rec, -0.1, 0.1).unwrap_err();
        assert!(matches!(err, ErpError::Validation(ref m) if m.contains("lacks annotations")));
    }

    #[test]
    fn inverted_window_is_config_error() {
        let rec = ramp(1, 1000, 100.0, vec![Annotation::new(3.0, 0.0, "non")]);
        assert!(matches!(make_epochs(&rec, 0.5, 0.5), Err(ErpError::Config(_))));
    }

    #[test]
    fn average_per_label() {
        let rec = ramp(
            1,
            1000,
            100.0,
            vec![Annotation::new(3.0, 0.0, "target"), Annotation::new(5.0, 0.0, "target")],
        );
        let ep = make_epochs(&rec, 0.0, 0.1).unwrap();
        let avg = ep.average(EventLabel::Target).unwrap();
        assert_eq!(avg[[0, 0]], 400.0);
        assert!(ep.average(EventLabel::NonTarget).is_none());
    }
}
