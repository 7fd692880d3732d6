use erpkit::classify::{cross_val_accuracy, lda_cv, LinearDiscriminant, StratifiedKFold};
use erpkit::ErpError;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Two Gaussian clouds in `p` dimensions, means `±shift` on feature 0.
fn clouds(n_pos: usize, n_neg: usize, p: usize, shift: f64, seed: u64) -> (Array2<f64>, Array1<i32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let n = n_pos + n_neg;
    let y = Array1::from_shape_fn(n, |i| i32::from(i < n_pos));
    let x = Array2::from_shape_fn((n, p), |(i, j)| {
        let centre = if j == 0 { if y[i] == 1 { shift } else { -shift } } else { 0.0 };
        centre + noise.sample(&mut rng)
    });
    (x, y)
}

#[test]
fn folds_preserve_class_proportions() {
    let y: Vec<i32> = (0..140).map(|i| i32::from(i % 7 == 0)).collect();
    let folds = StratifiedKFold::new(5, true, 42).split(&y).unwrap();
    assert_eq!(folds.len(), 5);
    for (train, test) in &folds {
        assert_eq!(test.len(), 28);
        assert_eq!(test.iter().filter(|&&i| y[i] == 1).count(), 4);
        assert_eq!(train.len(), 112);
    }
}

#[test]
fn folds_are_deterministic_per_seed() {
    let y: Vec<i32> = (0..60).map(|i| i32::from(i % 3 == 0)).collect();
    let a = StratifiedKFold::new(5, true, 7).test_folds(&y).unwrap();
    let b = StratifiedKFold::new(5, true, 7).test_folds(&y).unwrap();
    let c = StratifiedKFold::new(5, true, 8).test_folds(&y).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn unshuffled_folds_are_contiguous_per_class() {
    let y = [0, 0, 0, 0, 1, 1, 1, 1];
    let folds = StratifiedKFold::new(2, false, 0).test_folds(&y).unwrap();
    assert_eq!(folds, vec![0, 0, 1, 1, 0, 0, 1, 1]);
}

#[test]
fn too_few_members_is_config_error() {
    let y = [0, 0, 0, 0, 0, 0, 1, 1];
    assert!(matches!(StratifiedKFold::new(3, true, 0).split(&y), Err(ErpError::Config(_))));
    assert!(matches!(StratifiedKFold::new(1, true, 0).split(&y), Err(ErpError::Config(_))));
}

#[test]
fn lda_separates_gaussian_clouds() {
    let (x, y) = clouds(60, 60, 4, 3.0, 1);
    let lda = LinearDiscriminant::fit(x.view(), &y.to_vec()).unwrap();
    assert_eq!(lda.classes(), &[0, 1]);
    assert_eq!(lda.coef().dim(), (1, 4));
    assert!(lda.coef()[[0, 0]] > 0.0);
    assert!(lda.score(x.view(), &y.to_vec()).unwrap() > 0.95);
}

#[test]
fn cv_accuracy_on_clouds() {
    let (x, y) = clouds(20, 120, 10, 2.0, 3);
    let cv = StratifiedKFold::new(5, true, 42);
    let scores = cross_val_accuracy(x.view(), y.view(), &cv).unwrap();
    assert_eq!(scores.scores.len(), 5);
    assert!(scores.scores.iter().all(|s| (0.0..=1.0).contains(s)));
    assert!(scores.mean > 0.9, "mean {}", scores.mean);

    let mean = lda_cv(x.view(), y.view(), 5).unwrap();
    assert!((0.0..=1.0).contains(&mean));
}

#[test]
fn more_features_than_samples() {
    let (x, y) = clouds(20, 20, 100, 4.0, 5);
    let lda = LinearDiscriminant::fit(x.view(), &y.to_vec()).unwrap();
    assert!(lda.score(x.view(), &y.to_vec()).unwrap() > 0.95);
}
