//! Linear discriminant analysis, SVD solver.
//!
//! Follows scikit-learn's `LinearDiscriminantAnalysis(solver='svd')`:
//!
//! ```text
//!   Xc  = X − means[y]                     within-class centred
//!   Xs  = √(1/(n−K)) · Xc / std            std == 0 → 1
//!   Xs  = U S Vᵀ        scalings = V[:, S > tol] / std / S
//!   Xb  = √(n·prior/(K−1)) · (means − x̄) · scalings
//!   Xb  = U₂ S₂ V₂ᵀ     rotated = scalings · V₂[:, S₂ > tol·max S₂]
//!   coef      = (means − x̄) · rotated · rotatedᵀ
//!   intercept = −½‖(means − x̄) · rotated‖² + ln prior − x̄ · coefᵀ
//! ```
//!
//! With two classes the model collapses to one row: `coef[1] − coef[0]`.
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{ErpError, Result};

/// Singular values at or below this are treated as zero.
pub const DEFAULT_TOL: f64 = 1e-4;

/// A fitted linear discriminant classifier.
#[derive(Debug, Clone)]
pub struct LinearDiscriminant {
    classes: Vec<i32>,
    priors: Array1<f64>,
    means: Array2<f64>,
    coef: Array2<f64>,
    intercept: Array1<f64>,
}

impl LinearDiscriminant {
    /// Fit on `x` `[n_samples, n_features]` with integer labels `y`.
    pub fn fit(x: ArrayView2<'_, f64>, y: &[i32]) -> Result<Self> {
        Self::fit_with_tol(x, y, DEFAULT_TOL)
    }

    pub fn fit_with_tol(x: ArrayView2<'_, f64>, y: &[i32], tol: f64) -> Result<Self> {
        let (n, p) = x.dim();
        if y.len() != n {
            return Err(ErpError::validation(format!("{n} samples but {} labels", y.len())));
        }
        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let k = classes.len();
        if k < 2 {
            return Err(ErpError::config(format!("LDA needs at least two classes, got {k}")));
        }
        if n <= k {
            return Err(ErpError::config(format!("LDA needs more than {k} samples, got {n}")));
        }
        let class_of: Vec<usize> = y
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or_default())
            .collect();

        // ── Class statistics ────────────────────────────────────────────────
        let mut counts = vec![0usize; k];
        let mut means = Array2::<f64>::zeros((k, p));
        for (row, &c) in x.outer_iter().zip(&class_of) {
            counts[c] += 1;
            let mut m = means.row_mut(c);
            m += &row;
        }
        for (mut m, &cnt) in means.outer_iter_mut().zip(&counts) {
            m /= cnt as f64;
        }
        let priors = Array1::from_iter(counts.iter().map(|&c| c as f64 / n as f64));
        let xbar = priors.dot(&means);

        // ── Within-class whitening ──────────────────────────────────────────
        let mut xc = x.to_owned();
        for (mut row, &c) in xc.outer_iter_mut().zip(&class_of) {
            row -= &means.row(c);
        }
        let std = xc.std_axis(Axis(0), 0.0).mapv(|s| if s == 0.0 { 1.0 } else { s });
        let fac = (1.0 / (n - k) as f64).sqrt();
        let xs = DMatrix::from_fn(n, p, |i, j| fac * xc[[i, j]] / std[j]);

        let svd = xs.svd(false, true);
        let v_t = svd
            .v_t
            .ok_or_else(|| ErpError::config("SVD did not produce right singular vectors"))?;
        let keep: Vec<usize> = (0..svd.singular_values.len())
            .filter(|&i| svd.singular_values[i] > tol)
            .collect();
        if keep.is_empty() {
            return Err(ErpError::validation("all features are constant within classes"));
        }
        // scalings [p, rank]
        let scalings = DMatrix::from_fn(p, keep.len(), |j, r| {
            let i = keep[r];
            v_t[(i, j)] / std[j] / svd.singular_values[i]
        });

        // ── Between-class projection ────────────────────────────────────────
        let centred_means = DMatrix::from_fn(k, p, |c, j| means[[c, j]] - xbar[j]);
        let between_fac = 1.0 / (k - 1) as f64;
        let mut xb = &centred_means * &scalings;
        for c in 0..k {
            let w = (n as f64 * priors[c] * between_fac).sqrt();
            xb.row_mut(c).scale_mut(w);
        }
        let svd2 = xb.svd(false, true);
        let v2_t = svd2
            .v_t
            .ok_or_else(|| ErpError::config("SVD did not produce right singular vectors"))?;
        let s_max = svd2.singular_values.iter().copied().fold(0.0_f64, f64::max);
        let keep2: Vec<usize> = (0..svd2.singular_values.len())
            .filter(|&i| svd2.singular_values[i] > tol * s_max)
            .collect();
        let rotation = DMatrix::from_fn(scalings.ncols(), keep2.len(), |r, q| v2_t[(keep2[q], r)]);
        let rotated = &scalings * rotation;

        // ── Linear decision rule ────────────────────────────────────────────
        let proj = &centred_means * &rotated;
        let coef_full = &proj * rotated.transpose();
        let mut coef = Array2::from_shape_fn((k, p), |(c, j)| coef_full[(c, j)]);
        let mut intercept = Array1::from_shape_fn(k, |c| {
            -0.5 * proj.row(c).norm_squared() + priors[c].ln() - xbar.dot(&coef.row(c))
        });

        if k == 2 {
            coef = (&coef.row(1) - &coef.row(0)).insert_axis(Axis(0));
            intercept = Array1::from_elem(1, intercept[1] - intercept[0]);
        }

        tracing::trace!(n, p, k, rank = keep.len(), "LDA fitted");
        Ok(Self { classes, priors, means, coef, intercept })
    }

    /// Class labels in ascending order.
    pub fn classes(&self) -> &[i32] {
        &self.classes
    }

    /// Weight matrix: one row for two classes, one row per class otherwise.
    pub fn coef(&self) -> &Array2<f64> {
        &self.coef
    }

    pub fn intercept(&self) -> &Array1<f64> {
        &self.intercept
    }

    pub fn priors(&self) -> &Array1<f64> {
        &self.priors
    }

    pub fn means(&self) -> &Array2<f64> {
        &self.means
    }

    pub fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    /// `x · coefᵀ + intercept`, shape `[n_samples, coef.nrows()]`.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(ErpError::validation(format!(
                "model has {} features, input has {}",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok(x.dot(&self.coef.t()) + &self.intercept)
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i32>> {
        let scores = self.decision_function(x)?;
        let labels = scores.outer_iter().map(|s| {
            if s.len() == 1 {
                self.classes[usize::from(s[0] > 0.0)]
            } else {
                let best = s
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc })
                    .0;
                self.classes[best]
            }
        });
        Ok(Array1::from_iter(labels))
    }

    /// Fraction of `y` predicted correctly.
    pub fn score(&self, x: ArrayView2<'_, f64>, y: &[i32]) -> Result<f64> {
        let pred = self.predict(x)?;
        if pred.len() != y.len() || y.is_empty() {
            return Err(ErpError::validation(format!("{} predictions for {} labels", pred.len(), y.len())));
        }
        let hits = pred.iter().zip(y).filter(|(a, b)| a == b).count();
        Ok(hits as f64 / y.len() as f64)
    }
}
