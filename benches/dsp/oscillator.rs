//! Benchmarks for the PolyBLEP saw and unison stacks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::dsp::oscillator::{unison_layout, SawOscillator, UnisonSlot, MAX_UNISON};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let increment = 440.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut saw = SawOscillator::new();
        group.bench_with_input(BenchmarkId::new("saw", size), &size, |b, _| {
            b.iter(|| {
                for s in buffer.iter_mut() {
                    *s = saw.next_sample(black_box(increment));
                }
            })
        });

        // Seven detuned saws, the widest stack a voice can have.
        let mut slots = [UnisonSlot {
            ratio: 1.0,
            gain_left: 0.0,
            gain_right: 0.0,
        }; MAX_UNISON];
        let count = unison_layout(MAX_UNISON, 30.0, 0.0, &mut slots);
        let mut stack: Vec<SawOscillator> = (0..count)
            .map(|i| SawOscillator::with_phase(i as f32 / count as f32))
            .collect();
        group.bench_with_input(BenchmarkId::new("unison_7", size), &size, |b, _| {
            b.iter(|| {
                for s in buffer.iter_mut() {
                    let mut sum = 0.0;
                    for (osc, slot) in stack.iter_mut().zip(slots.iter()) {
                        sum += osc.next_sample(increment * slot.ratio) * slot.gain_left;
                    }
                    *s = black_box(sum);
                }
            })
        });
    }

    group.finish();
}
