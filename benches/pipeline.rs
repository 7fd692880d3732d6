use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use erpkit::classify::lda_cv;
use erpkit::preprocess::{bandpass, decimate};
use erpkit::{extract_features, make_epochs, synthetic};

fn bench_synthetic(c: &mut Criterion) {
    c.bench_function("synthetic 60 s @ 256 Hz [20 ch]", |b| {
        b.iter(|| {
            let rec = synthetic(black_box(60.0), black_box(256.0)).unwrap();
            black_box(rec.n_samples())
        })
    });
}

fn bench_bandpass(c: &mut Criterion) {
    let rec = synthetic(60.0, 256.0).unwrap();
    c.bench_function("bandpass 0.1–30 Hz [20×15360]", |b| {
        b.iter_batched(
            || rec.clone(),
            |mut r| {
                bandpass(&mut r, 0.1, 30.0).unwrap();
                black_box(r.data[[0, 0]])
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_decimate(c: &mut Criterion) {
    let rec = synthetic(60.0, 256.0).unwrap();
    c.bench_function("decimate 256 → 128 Hz", |b| {
        b.iter_batched(
            || rec.clone(),
            |mut r| {
                decimate(&mut r, 128.0).unwrap();
                black_box(r.n_samples())
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_lda_cv(c: &mut Criterion) {
    let mut rec = synthetic(60.0, 256.0).unwrap();
    decimate(&mut rec, 128.0).unwrap();
    let epochs = make_epochs(&rec, -0.2, 0.8).unwrap();
    let (x, y) = extract_features(&epochs, (0.25, 0.45)).unwrap();
    c.bench_function("lda_cv 5-fold [140×500]", |b| {
        b.iter(|| black_box(lda_cv(x.view(), y.view(), 5).unwrap()))
    });
}

criterion_group!(benches, bench_synthetic, bench_bandpass, bench_decimate, bench_lda_cv);
criterion_main!(benches);
