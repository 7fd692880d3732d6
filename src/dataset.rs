//! BigP3BCI directory index.
//!
//! Files are laid out as
//!
//! ```text
//! <root>/<study>/<subject>/<session>/<subset>/<paradigm>/<file>.edf
//! ```
//!
//! and [`list_dataset_structure`] turns every matching file into a
//! [`DatasetRow`]. Paths with fewer than six components below the root are
//! skipped.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ErpError, Result};

/// One recording file in the dataset tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRow {
    pub study: String,
    pub subject: String,
    pub session: String,
    pub subset: String,
    pub paradigm: String,
    pub file: String,
    pub path: PathBuf,
}

/// Table of [`DatasetRow`]s, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DatasetIndex {
    pub rows: Vec<DatasetRow>,
}

impl DatasetIndex {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DatasetRow> {
        self.rows.iter()
    }

    /// Distinct study names, sorted.
    pub fn studies(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.study.as_str()).collect();
        set.into_iter().collect()
    }

    /// Pretty-printed JSON array of rows.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a DatasetIndex {
    type Item = &'a DatasetRow;
    type IntoIter = std::slice::Iter<'a, DatasetRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Recursively index every `*.{extension}` file under `root`.
///
/// The extension match is case-insensitive and given without the dot. A
/// root that does not exist yields an empty index; a root that is a file is
/// [`ErpError::NotFound`].
pub fn list_dataset_structure(root: impl AsRef<Path>, extension: &str) -> Result<DatasetIndex> {
    let root = root.as_ref();
    if !root.exists() {
        tracing::warn!(root = %root.display(), "dataset root does not exist; empty index");
        return Ok(DatasetIndex::default());
    }
    if !root.is_dir() {
        return Err(ErpError::NotFound(root.to_path_buf()));
    }
    let mut files = Vec::new();
    walk(root, extension, &mut files)?;
    files.sort();

    let rows: Vec<DatasetRow> = files
        .into_iter()
        .filter_map(|path| {
            let rel = path.strip_prefix(root).ok()?;
            let parts: Vec<String> =
                rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
            if parts.len() < 6 {
                tracing::debug!(path = %path.display(), "too shallow for the dataset layout; skipped");
                return None;
            }
            let mut it = parts.into_iter();
            let mut next = || it.next().unwrap_or_default();
            Some(DatasetRow {
                study: next(),
                subject: next(),
                session: next(),
                subset: next(),
                paradigm: next(),
                file: next(),
                path,
            })
        })
        .collect();

    tracing::info!(root = %root.display(), n_files = rows.len(), "indexed dataset");
    Ok(DatasetIndex { rows })
}

fn walk(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            // A subtree we cannot read is not fatal.
            if let Err(e) = walk(&path, extension, out) {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable directory");
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            out.push(path);
        }
    }
    Ok(())
}
