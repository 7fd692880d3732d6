//! Stratified k-fold cross-validation.
//!
//! Fold assignment follows scikit-learn's `StratifiedKFold`: labels are
//! encoded in order of first appearance, sorted, and dealt round-robin into
//! `n_splits` buckets to get the per-fold count of every class. Each class
//! then receives its fold ids (optionally shuffled) in sample order.
use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::lda::LinearDiscriminant;
use crate::error::{ErpError, Result};

/// Seed used by [`lda_cv`].
pub const DEFAULT_CV_SEED: u64 = 42;

/// Stratified k-fold splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

/// One `(train, test)` pair of row indices.
pub type Fold = (Vec<usize>, Vec<usize>);

impl StratifiedKFold {
    pub fn new(n_splits: usize, shuffle: bool, seed: u64) -> Self {
        Self { n_splits, shuffle, seed }
    }

    /// Fold id (`0..n_splits`) of every sample.
    pub fn test_folds(&self, y: &[i32]) -> Result<Vec<usize>> {
        let k = self.n_splits;
        if k < 2 {
            return Err(ErpError::config(format!("cross-validation needs at least 2 splits, got {k}")));
        }
        if y.len() < k {
            return Err(ErpError::config(format!("{k} splits for only {} samples", y.len())));
        }

        // Encode in order of first appearance.
        let mut first_seen: Vec<i32> = Vec::new();
        let encoded: Vec<usize> = y
            .iter()
            .map(|l| match first_seen.iter().position(|f| f == l) {
                Some(i) => i,
                None => {
                    first_seen.push(*l);
                    first_seen.len() - 1
                }
            })
            .collect();
        let n_classes = first_seen.len();
        let mut counts = vec![0usize; n_classes];
        encoded.iter().for_each(|&c| counts[c] += 1);
        if let Some((c, &n)) = counts.iter().enumerate().find(|(_, &n)| n < k) {
            return Err(ErpError::config(format!(
                "class {} has {n} members, fewer than {k} splits",
                first_seen[c]
            )));
        }

        // allocation[fold][class] = bincount(sorted[fold::k])
        let mut sorted = encoded.clone();
        sorted.sort_unstable();
        let mut allocation = vec![vec![0usize; n_classes]; k];
        for (i, &c) in sorted.iter().enumerate() {
            allocation[i % k][c] += 1;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut test_folds = vec![0usize; y.len()];
        for class in 0..n_classes {
            let mut folds_for_class: Vec<usize> = (0..k)
                .flat_map(|f| std::iter::repeat(f).take(allocation[f][class]))
                .collect();
            if self.shuffle {
                folds_for_class.shuffle(&mut rng);
            }
            let members = encoded.iter().enumerate().filter(|(_, &c)| c == class).map(|(i, _)| i);
            for (i, f) in members.zip(folds_for_class) {
                test_folds[i] = f;
            }
        }
        Ok(test_folds)
    }

    /// `(train, test)` indices for every fold, in fold order.
    pub fn split(&self, y: &[i32]) -> Result<Vec<Fold>> {
        let test_folds = self.test_folds(y)?;
        Ok((0..self.n_splits)
            .map(|f| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&i| test_folds[i] == f);
                (train, test)
            })
            .collect())
    }
}

/// Per-fold accuracies with their mean and (population) standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct CvScores {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CvScores {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len().max(1) as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let std = (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
        Self { scores, mean, std }
    }
}

/// Fit an LDA on each training split and score it on the held-out fold.
pub fn cross_val_accuracy(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, i32>,
    cv: &StratifiedKFold,
) -> Result<CvScores> {
    if x.nrows() != y.len() {
        return Err(ErpError::validation(format!("{} rows but {} labels", x.nrows(), y.len())));
    }
    let y = y.to_vec();
    let mut scores = Vec::with_capacity(cv.n_splits);
    for (fold, (train, test)) in cv.split(&y)?.into_iter().enumerate() {
        let x_train = x.select(Axis(0), &train);
        let y_train: Vec<i32> = train.iter().map(|&i| y[i]).collect();
        let x_test = x.select(Axis(0), &test);
        let y_test: Vec<i32> = test.iter().map(|&i| y[i]).collect();

        let model = LinearDiscriminant::fit(x_train.view(), &y_train)?;
        let acc = model.score(x_test.view(), &y_test)?;
        tracing::debug!(fold, n_train = train.len(), n_test = test.len(), acc, "CV fold");
        scores.push(acc);
    }
    let out = CvScores::from_scores(scores);
    tracing::info!(mean = out.mean, std = out.std, "cross-validated accuracy");
    Ok(out)
}

/// Mean accuracy of a shuffled stratified `n_splits`-fold LDA (seed 42).
pub fn lda_cv(x: ArrayView2<'_, f64>, y: ArrayView1<'_, i32>, n_splits: usize) -> Result<f64> {
    let cv = StratifiedKFold::new(n_splits, true, DEFAULT_CV_SEED);
    Ok(cross_val_accuracy(x, y, &cv)?.mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sample_tested_once() {
        let y: Vec<i32> = (0..50).map(|i| i32::from(i % 5 == 0)).collect();
        let folds = StratifiedKFold::new(5, true, 42).split(&y).unwrap();
        let mut seen = vec![0; y.len()];
        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), y.len());
            test.iter().for_each(|&i| seen[i] += 1);
        }
        assert!(seen.iter().all(|&s| s == 1));
    }

    #[test]
    fn folds_preserve_class_proportions() {
        // 40 of class 0, 10 of class 1 → each test fold has 8 + 2.
        let y: Vec<i32> = (0..50).map(|i| i32::from(i >= 40)).collect();
        for (_, test) in StratifiedKFold::new(5, true, 7).split(&y).unwrap() {
            let pos = test.iter().filter(|&&i| y[i] == 1).count();
            assert_eq!((test.len(), pos), (10, 2));
        }
    }

    #[test]
    fn unshuffled_folds_are_contiguous_per_class() {
        let y = [0, 0, 0, 1, 1, 1];
        let folds = StratifiedKFold::new(3, false, 0).test_folds(&y).unwrap();
        assert_eq!(folds, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn same_seed_same_folds() {
        let y: Vec<i32> = (0..30).map(|i| i % 3).collect();
        let a = StratifiedKFold::new(5, true, 42).test_folds(&y).unwrap();
        let b = StratifiedKFold::new(5, true, 42).test_folds(&y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn small_class_is_config_error() {
        let y = [0, 0, 0, 0, 0, 1, 1];
        assert!(matches!(StratifiedKFold::new(3, true, 1).split(&y), Err(ErpError::Config(_))));
        assert!(matches!(StratifiedKFold::new(1, true, 1).split(&y), Err(ErpError::Config(_))));
    }

    #[test]
    fn cv_scores_summary() {
        let s = CvScores::from_scores(vec![0.5, 1.0]);
        approx::assert_abs_diff_eq!(s.mean, 0.75);
        approx::assert_abs_diff_eq!(s.std, 0.25);
    }
}
