//! Linear classification and its validation.
//!
//! - [`lda`]: linear discriminant analysis with the SVD solver.
//! - [`cv`]: stratified k-fold splitting and cross-validated accuracy.

pub mod cv;
pub mod lda;

pub use cv::{cross_val_accuracy, lda_cv, CvScores, Fold, StratifiedKFold, DEFAULT_CV_SEED};
pub use lda::LinearDiscriminant;
