use std::f32::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use setforge_features::extractor::{energy, key, spectral, tempo};

const SR: u32 = 22050;

fn synthetic_signal(secs: f32) -> Vec<f32> {
    let n = (secs * SR as f32) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / SR as f32;
            0.6 * (2.0 * PI * 220.0 * t).sin() + 0.3 * (2.0 * PI * 440.0 * t).sin()
        })
        .collect()
}

fn bench_estimate_bpm(c: &mut Criterion) {
    let signal = synthetic_signal(6.0);
    c.bench_function("setforge-features: extractor::tempo::estimate_bpm", |b| {
        b.iter(|| {
            let _ = black_box(tempo::estimate_bpm(black_box(&signal), SR));
        });
    });
}

fn bench_detect_key(c: &mut Criterion) {
    let signal = synthetic_signal(6.0);
    c.bench_function("setforge-features: extractor::key::detect_key", |b| {
        b.iter(|| {
            let _ = black_box(key::detect_key(black_box(&signal), SR));
        });
    });
}

fn bench_compute_spectral(c: &mut Criterion) {
    let signal = synthetic_signal(6.0);
    c.bench_function("setforge-features: extractor::spectral::compute_spectral", |b| {
        b.iter(|| {
            let _ = black_box(spectral::compute_spectral(black_box(&signal), SR, 6.0));
        });
    });
}

fn bench_energy_score(c: &mut Criterion) {
    c.bench_function("setforge-features: extractor::energy::energy_score", |b| {
        b.iter(|| {
            let _ = black_box(energy::energy_score(
                black_box(-20.0),
                black_box(3000.0),
                black_box(4.0),
                energy::EnergyWeights::default(),
            ));
        });
    });
}

criterion_group!(
    benches,
    bench_estimate_bpm,
    bench_detect_key,
    bench_compute_spectral,
    bench_energy_score
);
criterion_main!(benches);
