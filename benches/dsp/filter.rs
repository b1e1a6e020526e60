//! Benchmarks for the state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::{dsp::filter::StateVariableFilter, param::FilterResponse};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Noise-ish input so the filter state never settles.
        let input: Vec<f32> = (0..size)
            .map(|i| ((i * 7919) % 97) as f32 / 48.5 - 1.0)
            .collect();
        let mut buffer = input.clone();

        for (name, response) in [
            ("lowpass", FilterResponse::LowPass),
            ("notch", FilterResponse::Notch),
        ] {
            let mut filter = StateVariableFilter::new(response);
            filter.configure(1200.0, 0.7, 48_000.0, response);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
