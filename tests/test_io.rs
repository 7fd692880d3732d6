mod common;
use common::{write_edf, SignalSpec};

use approx::assert_abs_diff_eq;
use erpkit::io::{edf, STIMULUS_BEGIN, STIMULUS_TYPE};
use erpkit::{load_bigp3bci, load_raw, make_epochs, Annotation, ErpError, EventLabel};

// ── EDF+ ─────────────────────────────────────────────────────────────────────

#[test]
fn edf_plus_round_trip_signals_and_annotations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec.edf");
    let ramp: Vec<f64> = (0..300).map(|k| k as f64 * 0.1).collect();
    let neg: Vec<f64> = (0..300).map(|k| -(k as f64) * 0.1).collect();
    write_edf(
        &path,
        &[SignalSpec::tenth("Cz", "uV", ramp), SignalSpec::tenth("Pz", "uV", neg)],
        100,
        &[(1.2, "non"), (0.5, "target")],
    );

    let rec = load_raw(&path).unwrap();
    assert_eq!(rec.ch_names, vec!["Cz", "Pz"]);
    assert_eq!(rec.sfreq, 100.0);
    assert_eq!(rec.n_samples(), 300);
    assert_abs_diff_eq!(rec.data[[0, 10]], 10.0 * 0.1e-6, epsilon = 1e-12);
    assert_abs_diff_eq!(rec.data[[1, 250]], -250.0 * 0.1e-6, epsilon = 1e-12);
    let events: Vec<&Annotation> = rec.annotations.iter().filter(|a| a.label().is_some()).collect();
    assert_eq!(
        events,
        vec![&Annotation::new(0.5, 0.0, "target"), &Annotation::new(1.2, 0.0, "non")]
    );

    let epochs = make_epochs(&rec, -0.2, 0.3).unwrap();
    assert_eq!(epochs.labels(), vec![EventLabel::Target, EventLabel::NonTarget]);
    assert_eq!(epochs.n_times(), 51);
}

#[test]
fn millivolt_signal_without_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fz.edf");
    write_edf(&path, &[SignalSpec::identity("Fz", "mV", vec![2.0; 64])], 32, &[]);

    let parsed = edf::read_edf(&path).unwrap();
    assert_eq!(parsed.units, vec!["mV"]);
    assert_eq!(parsed.n_records, 2);
    assert_eq!(parsed.sfreq, 32.0);
    assert!(parsed.annotations.is_empty());
    assert_abs_diff_eq!(parsed.data[[0, 63]], 2e-3, epsilon = 1e-15);
}

#[test]
fn corrupt_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.edf");
    std::fs::write(&path, b"definitely not an EDF header").unwrap();
    match load_raw(&path) {
        Err(ErpError::Load { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Load error, got {other:?}"),
    }
}

// ── BigP3BCI ─────────────────────────────────────────────────────────────────

#[test]
fn bigp3bci_events_from_stimulus_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("A_01_SE001_CB_Train01.edf");
    let mut begin = vec![0.0; 256];
    let mut kind = vec![0.0; 256];
    begin[32] = 1.0;
    kind[32] = 1.0;
    begin[96] = 1.0;
    begin[200] = 1.0;
    kind[200] = 1.0;
    write_edf(
        &path,
        &[
            SignalSpec::tenth("Cz", "uV", vec![5.0; 256]),
            SignalSpec::identity(STIMULUS_BEGIN, "", begin),
            SignalSpec::identity(STIMULUS_TYPE, "", kind),
        ],
        64,
        &[],
    );

    let rec = load_bigp3bci(&path).unwrap();
    assert_eq!(rec.ch_names, vec!["Cz"]);
    let labels: Vec<_> = rec.annotations.iter().map(|a| (a.onset, a.label())).collect();
    assert_eq!(
        labels,
        vec![
            (0.5, Some(EventLabel::Target)),
            (1.5, Some(EventLabel::NonTarget)),
            (200.0 / 64.0, Some(EventLabel::Target)),
        ]
    );
}

#[test]
fn bigp3bci_missing_file_carries_dvc_hint() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_bigp3bci(dir.path().join("StudyA/absent.edf")).unwrap_err();
    assert!(matches!(err, ErpError::MissingDataset { .. }));
    assert!(err.to_string().contains("dvc pull"));
}
