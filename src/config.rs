//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of the P300 pipeline.
//! It is built once (usually via [`PipelineConfig::default()`]) and passed
//! by reference to each stage; stages never mutate it.
//!
//! [`DataPaths`] resolves the on-disk locations of the external datasets
//! from the environment.
use std::path::{Path, PathBuf};

/// Configuration for the P300 pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use erpkit::PipelineConfig;
///
/// let cfg = PipelineConfig {
///     resample_sfreq: 256.0,   // keep the native rate
///     cv_splits:      3,
///     ..PipelineConfig::default()
/// };
/// assert_eq!(cfg.tmin, -0.2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Lower pass-band edge of the band-pass filter in Hz.
    ///
    /// Default: `0.1` Hz.
    pub l_freq: f64,

    /// Upper pass-band edge of the band-pass filter in Hz.
    ///
    /// Default: `30.0` Hz.
    pub h_freq: f64,

    /// Sampling rate after decimation, in Hz.
    ///
    /// Default: `128.0` Hz.
    pub resample_sfreq: f64,

    /// Epoch start relative to the event onset, in seconds.
    ///
    /// Default: `-0.2` s.
    pub tmin: f64,

    /// Epoch end relative to the event onset, in seconds (inclusive).
    ///
    /// Default: `0.8` s.
    pub tmax: f64,

    /// Time window `(start, stop)` sliced from each epoch for the feature
    /// vector. Must lie inside `[tmin, tmax]`.
    ///
    /// Default: `(0.25, 0.45)` s, the P300 peak region.
    pub feature_window: (f64, f64),

    /// Power-line frequencies notched out before the band-pass. Empty skips
    /// the notch stage.
    ///
    /// Default: `[]`.
    pub notch_freqs: Vec<f64>,

    /// Number of stratified cross-validation folds.
    ///
    /// Default: `5`.
    pub cv_splits: usize,

    /// Seed for fold shuffling.
    ///
    /// Default: `42`.
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            l_freq: 0.1,
            h_freq: 30.0,
            resample_sfreq: 128.0,
            tmin: -0.2,
            tmax: 0.8,
            feature_window: (0.25, 0.45),
            notch_freqs: Vec::new(),
            cv_splits: 5,
            seed: 42,
        }
    }
}

impl PipelineConfig {
    /// `true` when the feature window lies inside the epoch window.
    pub fn feature_window_in_epoch(&self) -> bool {
        let (a, b) = self.feature_window;
        a <= b && a >= self.tmin && b <= self.tmax
    }
}

/// Environment variable naming the BigP3BCI data root.
pub const BIGP3BCI_ROOT_ENV: &str = "BIGP3BCI_ROOT";
/// Environment variable naming the MNE data directory.
pub const MNE_DATA_ENV: &str = "MNE_DATA";

/// Locations of external datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Root of the BigP3BCI tree (`<root>/<study>/<subject>/…/<file>.edf`).
    pub bigp3bci_root: PathBuf,
    /// Directory holding `MNE-sample-data`.
    pub mne_data: PathBuf,
}

impl DataPaths {
    /// Read `BIGP3BCI_ROOT` / `MNE_DATA`, falling back to
    /// `~/data/bigP3BCI-data` and `~/mne_data`.
    pub fn from_env() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let bigp3bci_root = std::env::var_os(BIGP3BCI_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("data").join("bigP3BCI-data"));
        let mne_data = std::env::var_os(MNE_DATA_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("mne_data"));
        Self { bigp3bci_root, mne_data }
    }

    /// Resolve a path relative to the BigP3BCI root.
    pub fn bigp3bci_file(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.bigp3bci_root.join(rel)
    }

    /// Location of the MNE "sample" raw recording.
    pub fn sample_raw(&self) -> PathBuf {
        self.mne_data
            .join("MNE-sample-data")
            .join("MEG")
            .join("sample")
            .join("sample_audvis_raw.fif")
    }
}
