//! Recording loaders.
//!
//! | Source         | Entry point               | Failure when absent            |
//! |----------------|---------------------------|--------------------------------|
//! | any FIF / EDF  | [`load_raw`]              | [`ErpError::NotFound`]         |
//! | MNE sample     | [`load_sample_dataset`]   | [`ErpError::Unavailable`]      |
//! | BigP3BCI EDF   | [`load_bigp3bci`]         | [`ErpError::MissingDataset`]   |
//!
//! Parse failures of an existing file surface as [`ErpError::Load`].
pub mod edf;

use std::path::Path;

use crate::config::DataPaths;
use crate::error::{ErpError, Result};
use crate::recording::{Annotation, EventLabel, Recording};

/// Hint attached to a missing BigP3BCI file.
pub const DVC_HINT: &str = "Please run `dvc pull` to fetch the dataset.";
/// BigP3BCI channel flagging stimulus onsets (> 0 on onset samples).
pub const STIMULUS_BEGIN: &str = "StimulusBegin";
/// BigP3BCI channel holding the stimulus class (1 = target, 0 = non).
pub const STIMULUS_TYPE: &str = "StimulusType";

/// On-disk format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingFormat {
    Fif,
    Edf,
}

impl RecordingFormat {
    /// `.fif` → [`Fif`](Self::Fif); everything else is read as EDF.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("fif") => RecordingFormat::Fif,
            _ => RecordingFormat::Edf,
        }
    }
}

/// Load and preload a FIF or EDF recording.
pub fn load_raw(path: impl AsRef<Path>) -> Result<Recording> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ErpError::NotFound(path.to_path_buf()));
    }
    let format = RecordingFormat::from_path(path);
    tracing::info!(path = %path.display(), ?format, "loading recording");
    let load_err = |source: anyhow::Error| ErpError::Load { path: path.to_path_buf(), source };
    match format {
        RecordingFormat::Fif => crate::fiff::read_raw_fif(path).map_err(load_err)?.into_recording(),
        RecordingFormat::Edf => edf::read_edf(path).map_err(load_err)?.into_recording(),
    }
}

/// Load the MNE "sample" auditory/visual recording from the local data directory.
pub fn load_sample_dataset(paths: &DataPaths) -> Result<Recording> {
    let path = paths.sample_raw();
    if !path.exists() {
        return Err(ErpError::Unavailable(format!(
            "MNE sample dataset not found at {}",
            path.display()
        )));
    }
    load_raw(&path)
}

/// Load a BigP3BCI EDF file.
///
/// When the file has no annotations but carries the `StimulusBegin` /
/// `StimulusType` channels, events are derived from them.
pub fn load_bigp3bci(path: impl AsRef<Path>) -> Result<Recording> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ErpError::MissingDataset { path: path.to_path_buf(), hint: DVC_HINT.to_string() });
    }
    let mut rec = load_raw(path)?;
    if rec.annotations.is_empty()
        && rec.channel_index(STIMULUS_BEGIN).is_some()
        && rec.channel_index(STIMULUS_TYPE).is_some()
    {
        annotations_from_stim_channels(&mut rec, STIMULUS_BEGIN, STIMULUS_TYPE)?;
    }
    Ok(rec)
}

/// Turn a pair of stimulus channels into annotations and drop both channels.
///
/// Every sample where `begin > 0` becomes one annotation, labelled from
/// `kind` rounded to an integer (`1 → "target"`, `0 → "non"`). Samples with
/// any other type code are skipped.
pub fn annotations_from_stim_channels(rec: &mut Recording, begin: &str, kind: &str) -> Result<()> {
    let missing = |name: &str| ErpError::validation(format!("stimulus channel {name:?} not found"));
    let b = rec.channel_index(begin).ok_or_else(|| missing(begin))?;
    let k = rec.channel_index(kind).ok_or_else(|| missing(kind))?;

    let mut annotations = Vec::new();
    let mut skipped = 0usize;
    for (t, (&flag, &code)) in rec.data.row(b).iter().zip(rec.data.row(k).iter()).enumerate() {
        if flag <= 0.0 {
            continue;
        }
        match EventLabel::from_code(code.round() as i32) {
            Some(label) => annotations.push(Annotation::new(t as f64 / rec.sfreq, 0.0, label.as_str())),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "stimulus onsets with unknown type code");
    }
    tracing::info!(n_events = annotations.len(), "events from stimulus channels");
    rec.set_annotations(annotations)?;
    rec.drop_channels(&[begin, kind]);
    Ok(())
}
