//! Error taxonomy for the pipeline.
//!
//! Binary-format parsers work with [`anyhow`] internally and are wrapped into
//! [`ErpError::Load`] at the public boundary, so callers can always tell a
//! missing file from a corrupt one.
use std::path::PathBuf;
use thiserror::Error;

/// Every failure a pipeline stage can report.
#[derive(Debug, Error)]
pub enum ErpError {
    /// The requested file or directory does not exist.
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    /// An external dataset file is missing; `hint` names the fetch step.
    #[error("{} not found. {hint}", .path.display())]
    MissingDataset { path: PathBuf, hint: String },

    /// Input data violate a precondition (e.g. a recording without annotations).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A bundled resource (sample dataset) is not installed locally.
    #[error("resource unavailable: {0}")]
    Unavailable(String),

    /// Parameters are inconsistent with each other or with the data.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The file exists but could not be parsed.
    #[error("failed to load {}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A figure could not be rendered to disk.
    #[error("failed to render figure")]
    Render(#[source] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ErpError>;

impl ErpError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ErpError::Config(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ErpError::Validation(msg.into())
    }
}
