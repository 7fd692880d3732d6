//! Shared fixtures for integration tests: an EDF+ writer and small
//! in-memory recordings.
use edfplus::{EdfWriter, SignalParam};
use erpkit::{Annotation, Recording};
use ndarray::Array2;
use std::path::Path;

/// One data signal of a fixture EDF+ file.
#[allow(unused)]
pub struct SignalSpec {
    pub label: &'static str,
    pub phys_dim: &'static str,
    pub phys_min: f64,
    pub phys_max: f64,
    pub dig_min: i32,
    pub dig_max: i32,
    /// Physical samples, `n_records × samples_per_record` long.
    pub samples: Vec<f64>,
}

#[allow(unused)]
impl SignalSpec {
    /// 0.1 `phys_dim` per digital step.
    pub fn tenth(label: &'static str, phys_dim: &'static str, samples: Vec<f64>) -> Self {
        Self { label, phys_dim, phys_min: -3276.7, phys_max: 3276.7, dig_min: -32767, dig_max: 32767, samples }
    }

    /// Digital = physical, so small integers survive exactly.
    pub fn identity(label: &'static str, phys_dim: &'static str, samples: Vec<f64>) -> Self {
        Self { label, phys_dim, phys_min: -32767.0, phys_max: 32767.0, dig_min: -32767, dig_max: 32767, samples }
    }

    fn param(&self, samples_per_record: usize) -> SignalParam {
        SignalParam {
            label: self.label.to_string(),
            samples_in_file: 0,
            physical_max: self.phys_max,
            physical_min: self.phys_min,
            digital_max: self.dig_max,
            digital_min: self.dig_min,
            samples_per_record: samples_per_record as i32,
            physical_dimension: self.phys_dim.to_string(),
            prefilter: String::new(),
            transducer: String::new(),
        }
    }
}

/// Write an EDF+ file with 1 s records and `(onset, text)` annotations.
#[allow(unused)]
pub fn write_edf(path: &Path, signals: &[SignalSpec], samples_per_record: usize, annotations: &[(f64, &str)]) {
    let mut writer = EdfWriter::create(path).unwrap();
    writer.set_patient_info("P001", "M", "01-JAN-1990", "erpkit fixture").unwrap();
    for s in signals {
        writer.add_signal(s.param(samples_per_record)).unwrap();
    }
    for &(onset, text) in annotations {
        writer.add_annotation(onset, None, text).unwrap();
    }
    let n_records = signals[0].samples.len() / samples_per_record;
    for r in 0..n_records {
        let record: Vec<Vec<f64>> = signals
            .iter()
            .map(|s| s.samples[r * samples_per_record..(r + 1) * samples_per_record].to_vec())
            .collect();
        writer.write_samples(&record).unwrap();
    }
    writer.finalize().unwrap();
}

/// Flat zero recording with `(onset, label)` annotations.
#[allow(unused)]
pub fn flat_recording(n_channels: usize, n_samples: usize, sfreq: f64, events: &[(f64, &str)]) -> Recording {
    let names = (0..n_channels).map(|c| format!("EEG{c:02}")).collect();
    let annotations = events.iter().map(|&(t, d)| Annotation::new(t, 0.0, d)).collect();
    Recording::new(Array2::zeros((n_channels, n_samples)), sfreq, names, annotations).unwrap()
}

/// Sum of sinusoids `(freq, amplitude)` on every channel.
#[allow(unused)]
pub fn sine_recording(n_channels: usize, n_samples: usize, sfreq: f64, parts: &[(f64, f64)]) -> Recording {
    let data = Array2::from_shape_fn((n_channels, n_samples), |(_, t)| {
        parts
            .iter()
            .map(|&(f, a)| a * (2.0 * std::f64::consts::PI * f * t as f64 / sfreq).sin())
            .sum()
    });
    let names = (0..n_channels).map(|c| format!("EEG{c:02}")).collect();
    Recording::new(data, sfreq, names, vec![]).unwrap()
}

/// RMS over the central half of a 1-D signal.
#[allow(unused)]
pub fn central_rms(x: ndarray::ArrayView1<'_, f64>) -> f64 {
    let n = x.len();
    let mid = x.slice(ndarray::s![n / 4..3 * n / 4]);
    (mid.iter().map(|v| v * v).sum::<f64>() / mid.len() as f64).sqrt()
}
