//! Event-heavy blocks: automation on every few samples plus UI edits.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::{
    io::{AudioOutput, HostEvent, NoteKey, OutputEventList},
    param::ParamId,
    EngineConfig, PolySynth,
};

use crate::BLOCK_SIZES;

pub fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/dispatch");

    for &size in BLOCK_SIZES {
        let (mut synth, mut ui) =
            PolySynth::new(EngineConfig::default()).expect("default config is valid");
        let mut out = AudioOutput::with_frames(size);
        let mut sink = OutputEventList::with_capacity(1024);

        let chord: Vec<HostEvent> = [48, 52, 55, 59]
            .iter()
            .map(|&k| HostEvent::note_on(0, NoteKey::untagged(0, 0, k), 0.8))
            .collect();
        synth.process(&chord, &mut out.as_stereo(), &mut sink);

        // A cutoff sweep with one automation point every 8 samples.
        let sweep: Vec<HostEvent> = (0..size / 8)
            .map(|i| {
                HostEvent::param_value(
                    (i * 8) as u32,
                    ParamId::Cutoff.raw(),
                    40.0 + (i % 64) as f64,
                )
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("cutoff_sweep", size), &size, |b, _| {
            b.iter(|| {
                sink.clear();
                ui.adjust(ParamId::Resonance, 0.5);
                synth.process(black_box(&sweep), &mut out.as_stereo(), &mut sink);
                // Keep the ack queue from filling up between iterations.
                while ui.try_recv().is_some() {}
            })
        });
    }

    group.finish();
}
