//! Benchmarks for the amp envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::dsp::envelope::AmpEnvelope;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut env = AmpEnvelope::new(48_000.0);
        env.set_times(10.0, 0.3);
        env.note_on(false);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Sustain phase (holding steady)
        let mut env = AmpEnvelope::new(48_000.0);
        env.set_times(0.001, 0.3);
        env.note_on(false);
        for _ in 0..200 {
            env.next_sample();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
