//! # erpkit: P300 event-related-potential pipeline in pure Rust
//!
//! `erpkit` loads (or synthesizes) multichannel EEG, filters and epochs it
//! around stimulus events, and cross-validates a linear discriminant that
//! tells target from non-target responses. The DSP follows
//! [MNE-Python](https://mne.tools) and the classifier follows scikit-learn;
//! both are implemented natively on [`ndarray`], RustFFT and nalgebra.
//!
//! ## Pipeline overview
//!
//! ```text
//! recording.fif / .edf  ──or──  synthetic(60 s, 256 Hz)
//!   │
//!   ├─ io::load_raw()            native FIFF reader, EDF+ via edfplus
//!   ├─ preprocess::bandpass()    firwin + overlap-add, 0.1–30 Hz
//!   ├─ preprocess::decimate()    FFT resample → 128 Hz
//!   ├─ epoch::make_epochs()      [-0.2, 0.8] s around each event
//!   ├─ features::extract_features() 0.25–0.45 s window, channel-major flatten
//!   ├─ classify::lda_cv()        5-fold stratified LDA accuracy
//!   └─ viz::plot_erp()           target vs non-target → erp.png
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use erpkit::{run_p300_pipeline, PipelineConfig};
//! use std::path::Path;
//!
//! let report = run_p300_pipeline(None, Path::new("results"), &PipelineConfig::default()).unwrap();
//! println!("accuracy {:.3} over {} epochs", report.accuracy, report.n_epochs);
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use erpkit::{synthetic, make_epochs, extract_features, lda_cv};
//! use erpkit::preprocess::{bandpass, decimate};
//!
//! let mut rec = synthetic(60.0, 256.0).unwrap();
//! bandpass(&mut rec, 0.1, 30.0).unwrap();
//! decimate(&mut rec, 128.0).unwrap();
//!
//! let epochs = make_epochs(&rec, -0.2, 0.8).unwrap();
//! let (x, y) = extract_features(&epochs, (0.25, 0.45)).unwrap();
//! let acc = lda_cv(x.view(), y.view(), 5).unwrap();
//! ```

pub mod classify;
pub mod config;
pub mod dataset;
pub mod epoch;
pub mod error;
pub mod features;
pub mod fiff;
pub mod filter;
pub mod io;
pub mod preprocess;
pub mod recording;
pub mod resample;
pub mod synthetic;
pub mod viz;

use std::path::{Path, PathBuf};

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `erpkit::Foo` without having to know the internal module layout.

// config
pub use config::{DataPaths, PipelineConfig};

// data model + errors
pub use error::{ErpError, Result};
pub use recording::{Annotation, EventLabel, Recording};

// generation + loading
pub use dataset::{list_dataset_structure, DatasetIndex, DatasetRow};
pub use io::{load_bigp3bci, load_raw, load_sample_dataset, RecordingFormat};
pub use synthetic::{synthetic, synthetic_with_rng};

// preprocessing
pub use epoch::{make_epochs, Epochs, Event};
pub use preprocess::{bandpass, decimate, notch};

// features + classification
pub use classify::{cross_val_accuracy, lda_cv, CvScores, LinearDiscriminant, StratifiedKFold};
pub use features::{extract_features, fold_channel_weights};

// figures
pub use viz::{plot_erp, plot_filter_response, plot_scalp, ChannelLayout, Figure};

/// Duration of the stand-in recording used when no file is given, in seconds.
pub const SYNTHETIC_DURATION: f64 = 60.0;
/// Sampling rate of the stand-in recording, in Hz.
pub const SYNTHETIC_SFREQ: f64 = 256.0;

/// Outcome of [`run_p300_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Mean cross-validated accuracy in `[0, 1]`.
    pub accuracy: f64,
    pub fold_scores: Vec<f64>,
    pub n_epochs: usize,
    pub n_features: usize,
    pub erp_path: PathBuf,
}

/// Run the **full P300 pipeline** end to end.
///
/// 1. Load `data_path` with [`load_raw`], or generate
///    [`synthetic`]`(60 s, 256 Hz)` when `None`.
/// 2. Notch [`PipelineConfig::notch_freqs`] when non-empty, then band-pass
///    between [`PipelineConfig::l_freq`] and [`PipelineConfig::h_freq`].
/// 3. Decimate to [`PipelineConfig::resample_sfreq`].
/// 4. Epoch over `[tmin, tmax]` and flatten [`PipelineConfig::feature_window`].
/// 5. Stratified, shuffled k-fold LDA accuracy.
/// 6. Create `out_dir` and write `erp.png` there; nothing else is persisted.
///
/// # Errors
///
/// Any stage error is returned unchanged; files written before the failure
/// are left in place.
pub fn run_p300_pipeline(
    data_path: Option<&Path>,
    out_dir: &Path,
    cfg: &PipelineConfig,
) -> Result<PipelineReport> {
    if !cfg.feature_window_in_epoch() {
        return Err(ErpError::Config(format!(
            "feature window {:?} outside epoch [{}, {}]",
            cfg.feature_window, cfg.tmin, cfg.tmax
        )));
    }

    // 1. Load or synthesize.
    let mut rec = match data_path {
        Some(path) => load_raw(path)?,
        None => {
            tracing::info!("no data path given; using synthetic recording");
            synthetic(SYNTHETIC_DURATION, SYNTHETIC_SFREQ)?
        }
    };
    tracing::info!(
        n_channels = rec.n_channels(),
        n_samples = rec.n_samples(),
        sfreq = rec.sfreq,
        n_annotations = rec.annotations.len(),
        "recording ready"
    );

    // 2–3. Filter and decimate.
    if !cfg.notch_freqs.is_empty() {
        notch(&mut rec, &cfg.notch_freqs)?;
    }
    bandpass(&mut rec, cfg.l_freq, cfg.h_freq)?;
    decimate(&mut rec, cfg.resample_sfreq)?;

    // 4. Epochs and features.
    let epochs = make_epochs(&rec, cfg.tmin, cfg.tmax)?;
    let (x, y) = extract_features(&epochs, cfg.feature_window)?;
    tracing::info!(
        n_epochs = epochs.len(),
        n_target = epochs.count(EventLabel::Target),
        n_features = x.ncols(),
        "features extracted"
    );

    // 5. Cross-validation.
    let cv = StratifiedKFold::new(cfg.cv_splits, true, cfg.seed);
    let scores = cross_val_accuracy(x.view(), y.view(), &cv)?;

    // 6. ERP figure.
    std::fs::create_dir_all(out_dir)?;
    let erp_path = out_dir.join("erp.png");
    plot_erp(&epochs)?.save_png(&erp_path)?;

    Ok(PipelineReport {
        accuracy: scores.mean,
        fold_scores: scores.scores,
        n_epochs: epochs.len(),
        n_features: x.ncols(),
        erp_path,
    })
}
