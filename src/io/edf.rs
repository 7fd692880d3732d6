//! EDF+ reader on top of [`edfplus`].
//!
//! `edfplus` decodes the header, the data records and the `EDF Annotations`
//! TALs. This module turns its output into a preloaded [`Recording`]:
//!
//! ```text
//! EdfReader::open ──► header().signals   data signals only, one shared rate
//!                 ──► read_physical_samples(ch, n)   × volts_per_unit(dim)
//!                 ──► annotations()      100 ns ticks → seconds
//! ```
use std::path::Path;

use anyhow::{anyhow, bail, ensure, Context, Result};
use edfplus::{EdfReader, SignalParam};
use ndarray::Array2;

use crate::recording::{Annotation, Recording};

/// Label of the EDF+ annotation signal.
pub const ANNOTATION_LABEL: &str = "EDF Annotations";
/// EDF+ time stamps count 100 ns ticks.
pub const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Factor from a physical dimension to volts; unitless signals stay as-is.
pub fn volts_per_unit(dim: &str) -> f64 {
    match dim.trim() {
        "uV" | "µV" | "microV" => 1e-6,
        "mV" => 1e-3,
        "nV" => 1e-9,
        _ => 1.0,
    }
}

pub fn is_annotation(signal: &SignalParam) -> bool {
    signal.label.trim() == ANNOTATION_LABEL
}

/// Samples per record shared by every data signal.
pub fn common_samples_per_record(signals: &[SignalParam]) -> Result<usize> {
    let first = signals.first().ok_or_else(|| anyhow!("EDF file holds no data signals"))?;
    let spr = first.samples_per_record;
    if let Some(odd) = signals.iter().find(|s| s.samples_per_record != spr) {
        bail!(
            "data signals must share one sampling rate: {:?} has {} samples per record, expected {spr}",
            odd.label,
            odd.samples_per_record
        );
    }
    ensure!(spr > 0, "signal {:?} has {spr} samples per record", first.label);
    Ok(spr as usize)
}

/// Annotation from EDF+ tick stamps. An unknown duration (`-1`) becomes 0.
pub fn annotation_from_ticks(onset: i64, duration: i64, description: &str) -> Annotation {
    let duration = if duration > 0 { duration as f64 / TICKS_PER_SECOND } else { 0.0 };
    Annotation::new(onset as f64 / TICKS_PER_SECOND, duration, description.trim())
}

/// A fully decoded EDF file.
#[derive(Debug, Clone)]
pub struct Edf {
    /// Names of the data (non-annotation) signals.
    pub ch_names: Vec<String>,
    /// Physical dimension of each data signal as written in the file.
    pub units: Vec<String>,
    /// `[n_data_signals, n_samples]` in volts (unitless signals unscaled).
    pub data: Array2<f64>,
    pub sfreq: f64,
    pub n_records: usize,
    /// Seconds per data record.
    pub record_duration: f64,
    /// Onset-sorted annotations with non-empty text.
    pub annotations: Vec<Annotation>,
}

impl Edf {
    /// Convert to a [`Recording`], dropping annotations that fall outside it.
    pub fn into_recording(self) -> crate::error::Result<Recording> {
        let duration = self.data.ncols() as f64 / self.sfreq;
        let (inside, outside): (Vec<_>, Vec<_>) = self
            .annotations
            .into_iter()
            .partition(|a| a.onset >= 0.0 && a.onset < duration);
        if !outside.is_empty() {
            tracing::warn!(n = outside.len(), "EDF annotations outside the recording dropped");
        }
        Recording::new(self.data, self.sfreq, self.ch_names, inside)
    }
}

fn edf_error(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("{e}")
}

/// Read and decode an EDF+ file.
pub fn read_edf<P: AsRef<Path>>(path: P) -> Result<Edf> {
    let path = path.as_ref();
    let mut reader = EdfReader::open(path)
        .map_err(edf_error)
        .with_context(|| format!("open EDF {}", path.display()))?;

    let header = reader.header();
    let n_records = usize::try_from(header.datarecords_in_file)
        .map_err(|_| anyhow!("invalid record count {}", header.datarecords_in_file))?;
    let record_duration = header.datarecord_duration as f64 / TICKS_PER_SECOND;
    let (channels, signals): (Vec<usize>, Vec<SignalParam>) = header
        .signals
        .iter()
        .enumerate()
        .filter(|(_, s)| !is_annotation(s))
        .map(|(i, s)| (i, s.clone()))
        .unzip();

    let spr = common_samples_per_record(&signals)?;
    ensure!(record_duration > 0.0, "record duration must be positive for data signals");
    let sfreq = spr as f64 / record_duration;
    let n_times = n_records * spr;

    let mut data = Array2::<f64>::zeros((signals.len(), n_times));
    for (row, (&ch, sig)) in channels.iter().zip(&signals).enumerate() {
        let samples = reader
            .read_physical_samples(ch, n_times)
            .map_err(edf_error)
            .with_context(|| format!("read signal {:?}", sig.label))?;
        ensure!(
            samples.len() == n_times,
            "signal {:?}: expected {n_times} samples, got {}",
            sig.label,
            samples.len()
        );
        let scale = volts_per_unit(&sig.physical_dimension);
        data.row_mut(row).iter_mut().zip(&samples).for_each(|(dst, &v)| *dst = v * scale);
    }

    let mut annotations: Vec<Annotation> = reader
        .annotations()
        .iter()
        .filter(|a| !a.description.trim().is_empty())
        .map(|a| annotation_from_ticks(a.onset, a.duration, &a.description))
        .collect();
    annotations.sort_by(|a, b| a.onset.total_cmp(&b.onset));

    tracing::debug!(
        path = %path.display(),
        n_chan = signals.len(),
        n_times,
        sfreq,
        n_annotations = annotations.len(),
        "read EDF"
    );
    Ok(Edf {
        ch_names: signals.iter().map(|s| s.label.trim().to_string()).collect(),
        units: signals.iter().map(|s| s.physical_dimension.trim().to_string()).collect(),
        data,
        sfreq,
        n_records,
        record_duration,
        annotations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(label: &str, samples_per_record: i32) -> SignalParam {
        SignalParam {
            label: label.into(),
            samples_in_file: 0,
            physical_max: 3276.7,
            physical_min: -3276.8,
            digital_max: 32767,
            digital_min: -32768,
            samples_per_record,
            physical_dimension: "uV".into(),
            prefilter: String::new(),
            transducer: String::new(),
        }
    }

    #[test]
    fn ticks_to_seconds() {
        assert_eq!(annotation_from_ticks(15_000_000, 2_500_000, " target "), Annotation::new(1.5, 0.25, "target"));
        // Unknown duration.
        assert_eq!(annotation_from_ticks(-5_000_000, -1, "non"), Annotation::new(-0.5, 0.0, "non"));
    }

    #[test]
    fn units_convert_to_volts() {
        assert_eq!(volts_per_unit("uV"), 1e-6);
        assert_eq!(volts_per_unit(" mV "), 1e-3);
        assert_eq!(volts_per_unit("nV"), 1e-9);
        assert_eq!(volts_per_unit(""), 1.0);
    }

    #[test]
    fn mixed_sampling_rates_rejected() {
        assert_eq!(common_samples_per_record(&[signal("A", 10), signal("B", 10)]).unwrap(), 10);
        let err = common_samples_per_record(&[signal("A", 10), signal("B", 5)]).unwrap_err();
        assert!(err.to_string().contains("share one sampling rate"), "{err}");
        assert!(common_samples_per_record(&[]).is_err());
    }

    #[test]
    fn annotation_signal_detected_by_label() {
        assert!(is_annotation(&signal("EDF Annotations ", 30)));
        assert!(!is_annotation(&signal("Cz", 256)));
    }

    #[test]
    fn missing_file_is_error() {
        assert!(read_edf("/no/such/file.edf").is_err());
    }
}
