//! FIFF file format reader.
//!
//! Reads raw `.fif` recordings as written by
//! [MNE-Python](https://mne.tools) and Neuromag systems.
//!
//! # Quick start
//! ```no_run
//! use erpkit::fiff::read_raw_fif;
//!
//! let raw = read_raw_fif("sample_audvis_raw.fif").unwrap();
//! println!("{} channels @ {} Hz", raw.info.chs.len(), raw.info.sfreq);
//! let rec = raw.into_recording().unwrap();
//! ```
pub mod constants;
pub mod raw;
pub mod tag;
pub mod tree;

pub use raw::{read_raw_fif, ChannelInfo, MeasInfo, RawFif};
pub use tag::{FifReader, TagHeader};
pub use tree::{read_tree, Node};
