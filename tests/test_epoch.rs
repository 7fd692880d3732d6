mod common;
use common::flat_recording;

use erpkit::{extract_features, make_epochs, ErpError, EventLabel};

#[test]
fn epochs_keep_sample_order_and_drop_edges() {
    let rec = flat_recording(
        4,
        2000,
        200.0,
        &[(9.9, "non"), (1.0, "target"), (0.05, "non"), (5.0, "non"), (3.0, "noise")],
    );
    let epochs = make_epochs(&rec, -0.2, 0.8).unwrap();
    assert_eq!(epochs.labels(), vec![EventLabel::Target, EventLabel::NonTarget]);
    assert_eq!(epochs.events[0].sample, 200);
    assert_eq!(epochs.data.dim(), (2, 4, 201));
}

#[test]
fn duplicate_sample_keeps_first_annotation() {
    // 1.0 s and 1.002 s both round to sample 100 at 100 Hz.
    let rec = flat_recording(1, 500, 100.0, &[(1.0, "target"), (1.002, "non"), (2.0, "non")]);
    let epochs = make_epochs(&rec, -0.1, 0.1).unwrap();
    assert_eq!(epochs.len(), 2);
    assert_eq!(epochs.events[0].label, EventLabel::Target);
}

#[test]
fn epoch_errors() {
    let rec = flat_recording(1, 500, 100.0, &[]);
    assert!(matches!(make_epochs(&rec, -0.1, 0.5), Err(ErpError::Validation(_))));

    let rec = flat_recording(1, 500, 100.0, &[(1.0, "target")]);
    assert!(matches!(make_epochs(&rec, 0.5, 0.5), Err(ErpError::Config(_))));
    assert!(matches!(make_epochs(&rec, -2.0, 0.5), Err(ErpError::Validation(_))));

    let rec = flat_recording(1, 500, 100.0, &[(1.0, "stimulus")]);
    assert!(matches!(make_epochs(&rec, -0.1, 0.5), Err(ErpError::Validation(_))));
}

#[test]
fn feature_columns_are_channel_major() {
    let mut rec = flat_recording(3, 1000, 100.0, &[(2.0, "target"), (5.0, "non")]);
    // data[c, t] = 1000 c + t
    rec.data = ndarray::Array2::from_shape_fn((3, 1000), |(c, t)| (1000 * c + t) as f64);

    let epochs = make_epochs(&rec, -0.2, 0.8).unwrap();
    let (x, y) = extract_features(&epochs, (0.25, 0.45)).unwrap();
    // times start at -0.2: i0 = trunc(45) = 45, i1 = trunc(65) = 65.
    assert_eq!(x.dim(), (2, 3 * 20));
    assert_eq!(y.to_vec(), vec![1, 0]);
    // Epoch 0: event sample 200, window start 180, column c·20 + t.
    assert_eq!(x[[0, 0]], 225.0);
    assert_eq!(x[[0, 20]], 1225.0);
    assert_eq!(x[[1, 2 * 20 + 19]], 2000.0 + 480.0 + 64.0);
}

#[test]
fn feature_window_outside_epoch_is_config_error() {
    let rec = flat_recording(1, 1000, 100.0, &[(2.0, "target")]);
    let epochs = make_epochs(&rec, -0.2, 0.8).unwrap();
    assert!(matches!(extract_features(&epochs, (0.45, 0.25)), Err(ErpError::Config(_))));
    assert!(matches!(extract_features(&epochs, (2.0, 3.0)), Err(ErpError::Config(_))));
}
