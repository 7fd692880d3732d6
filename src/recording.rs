//! In-memory continuous recording and its event vocabulary.
//!
//! A [`Recording`] is the preloaded equivalent of an MNE `Raw`: a `[C, T]`
//! voltage matrix plus sampling rate, channel names and annotations.
use ndarray::{Array1, Array2, Axis};

use crate::error::{ErpError, Result};

/// Closed event vocabulary of the P300 paradigm.
///
/// The integer codes are fixed: `non → 0`, `target → 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventLabel {
    NonTarget = 0,
    Target = 1,
}

impl EventLabel {
    /// Both labels in code order.
    pub const ALL: [EventLabel; 2] = [EventLabel::NonTarget, EventLabel::Target];

    /// Annotation description used on disk and in legends.
    pub fn as_str(self) -> &'static str {
        match self {
            EventLabel::NonTarget => "non",
            EventLabel::Target => "target",
        }
    }

    /// Integer event code.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(EventLabel::NonTarget),
            1 => Some(EventLabel::Target),
            _ => None,
        }
    }

    /// Parse an annotation description. Anything outside the vocabulary is `None`.
    pub fn parse(desc: &str) -> Option<Self> {
        match desc {
            "non" => Some(EventLabel::NonTarget),
            "target" => Some(EventLabel::Target),
            _ => None,
        }
    }
}

/// One `(onset, duration, description)` annotation, times in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub onset: f64,
    pub duration: f64,
    pub description: String,
}

impl Annotation {
    pub fn new(onset: f64, duration: f64, description: impl Into<String>) -> Self {
        Self { onset, duration, description: description.into() }
    }

    /// The event label, if the description belongs to the vocabulary.
    pub fn label(&self) -> Option<EventLabel> {
        EventLabel::parse(&self.description)
    }
}

/// A preloaded multichannel recording.
#[derive(Debug, Clone)]
pub struct Recording {
    /// `[n_channels, n_samples]` in volts.
    pub data: Array2<f64>,
    /// Sampling rate in Hz.
    pub sfreq: f64,
    /// Channel names, one per row of `data`.
    pub ch_names: Vec<String>,
    /// Annotations sorted by onset.
    pub annotations: Vec<Annotation>,
    /// Sensor positions `[n_channels, 3]` in metres, when the file has them.
    pub positions: Option<Array2<f64>>,
}

impl Recording {
    /// Build a recording, checking shape, channel-name and annotation invariants.
    pub fn new(
        data: Array2<f64>,
        sfreq: f64,
        ch_names: Vec<String>,
        mut annotations: Vec<Annotation>,
    ) -> Result<Self> {
        if !(sfreq > 0.0) || !sfreq.is_finite() {
            return Err(ErpError::validation(format!("sampling rate must be positive, got {sfreq}")));
        }
        if ch_names.len() != data.nrows() {
            return Err(ErpError::validation(format!(
                "{} channel names for {} data rows",
                ch_names.len(),
                data.nrows()
            )));
        }
        for (i, name) in ch_names.iter().enumerate() {
            if ch_names[..i].contains(name) {
                return Err(ErpError::validation(format!("duplicate channel name {name:?}")));
            }
        }
        let duration = data.ncols() as f64 / sfreq;
        if let Some(bad) = annotations.iter().find(|a| !(a.onset >= 0.0 && a.onset < duration)) {
            return Err(ErpError::validation(format!(
                "annotation onset {} s outside recording [0, {duration}) s",
                bad.onset
            )));
        }
        annotations.sort_by(|a, b| a.onset.total_cmp(&b.onset));
        Ok(Self { data, sfreq, ch_names, annotations, positions: None })
    }

    /// Attach sensor positions (`[n_channels, 3]`).
    pub fn with_positions(mut self, positions: Array2<f64>) -> Result<Self> {
        if positions.dim() != (self.n_channels(), 3) {
            return Err(ErpError::validation(format!(
                "positions shape {:?} does not match {} channels",
                positions.dim(),
                self.n_channels()
            )));
        }
        self.positions = Some(positions);
        Ok(self)
    }

    #[inline]
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Total duration in seconds.
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.sfreq
    }

    /// Sample times in seconds, starting at zero.
    pub fn times(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n_samples(), |i| i as f64 / self.sfreq)
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.ch_names.iter().position(|n| n == name)
    }

    /// Replace the annotation set (re-sorted, onsets validated).
    pub fn set_annotations(&mut self, mut annotations: Vec<Annotation>) -> Result<()> {
        let duration = self.duration_secs();
        if let Some(bad) = annotations.iter().find(|a| !(a.onset >= 0.0 && a.onset < duration)) {
            return Err(ErpError::validation(format!(
                "annotation onset {} s outside recording [0, {duration}) s",
                bad.onset
            )));
        }
        annotations.sort_by(|a, b| a.onset.total_cmp(&b.onset));
        self.annotations = annotations;
        Ok(())
    }

    /// Remove the named channels. Names that are not present are ignored.
    pub fn drop_channels(&mut self, names: &[&str]) {
        let keep: Vec<usize> = (0..self.n_channels())
            .filter(|&i| !names.contains(&self.ch_names[i].as_str()))
            .collect();
        if keep.len() == self.n_channels() {
            return;
        }
        self.data = self.data.select(Axis(0), &keep);
        self.ch_names = keep.iter().map(|&i| self.ch_names[i].clone()).collect();
        if let Some(pos) = &self.positions {
            self.positions = Some(pos.select(Axis(0), &keep));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("C{i}")).collect()
    }

    #[test]
    fn label_codes_are_fixed() {
        assert_eq!(EventLabel::parse("target"), Some(EventLabel::Target));
        assert_eq!(EventLabel::parse("non"), Some(EventLabel::NonTarget));
        assert_eq!(EventLabel::parse("Target"), None);
        assert_eq!(EventLabel::Target.code(), 1);
        assert_eq!(EventLabel::NonTarget.code(), 0);
        assert_eq!(EventLabel::from_code(1), Some(EventLabel::Target));
        assert_eq!(EventLabel::from_code(7), None);
    }

    #[test]
    fn annotations_sorted_on_construction() {
        let rec = Recording::new(
            Array2::zeros((2, 100)),
            100.0,
            names(2),
            vec![Annotation::new(0.5, 0.0, "non"), Annotation::new(0.1, 0.0, "target")],
        )
        .unwrap();
        assert_eq!(rec.annotations[0].onset, 0.1);
        assert_eq!(rec.annotations[1].label(), Some(EventLabel::NonTarget));
    }

    #[test]
    fn onset_past_end_rejected() {
        let err = Recording::new(
            Array2::zeros((1, 100)),
            100.0,
            names(1),
            vec![Annotation::new(1.0, 0.0, "non")],
        )
        .unwrap_err();
        assert!(matches!(err, ErpError::Validation(_)));
    }

    #[test]
    fn duplicate_channel_names_rejected() {
        let err = Recording::new(Array2::zeros((2, 10)), 10.0, vec!["A".into(), "A".into()], vec![])
            .unwrap_err();
        assert!(matches!(err, ErpError::Validation(_)));
    }

    #[test]
    fn drop_channels_keeps_rows_aligned() {
        let data = Array2::from_shape_fn((3, 4), |(c, _)| c as f64);
        let mut rec = Recording::new(data, 4.0, names(3), vec![]).unwrap();
        rec.drop_channels(&["C1", "missing"]);
        assert_eq!(rec.ch_names, vec!["C0", "C2"]);
        assert_eq!(rec.data.row(1)[0], 2.0);
    }
}
