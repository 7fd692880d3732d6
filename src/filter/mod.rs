//! FIR filter design and application.
//!
//! - [`design`]: Hamming-windowed sinc band-pass, highpass, lowpass and
//!   notch FIR design, matching
//!   `mne.filter.create_filter(fir_window='hamming', phase='zero')`.
//! - [`apply`]: Overlap-add zero-phase convolution, matching MNE's
//!   `_overlap_add_filter` / `_1d_overlap_filter`.

pub mod apply;
pub mod design;

pub use apply::{apply_fir_zero_phase, filter_1d, FirFilter};
pub use design::{
    auto_filter_length, auto_h_trans_bandwidth, auto_l_trans_bandwidth, design_bandpass,
    design_filter, design_highpass, design_lowpass, design_notch, firwin, gain_at, hamming,
};
