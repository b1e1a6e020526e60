//! Full voice pool rendering.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::{
    io::{AudioOutput, HostEvent, NoteKey, OutputEventList},
    EngineConfig, PolySynth,
};

use crate::BLOCK_SIZES;

pub fn bench_polyphony(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/polyphony");

    for voices in [8usize, 64] {
        for &size in BLOCK_SIZES {
            let (mut synth, _ui) = PolySynth::new(EngineConfig::default().max_voices(voices))
                .expect("default config is valid");
            let mut out = AudioOutput::with_frames(size);
            let mut sink = OutputEventList::with_capacity(256);

            // Hold a chord on every voice; a long release keeps them all alive.
            let notes: Vec<HostEvent> = (0..voices)
                .map(|i| HostEvent::note_on(0, NoteKey::untagged(0, 0, 24 + i as i16), 0.8))
                .collect();
            synth.process(&notes, &mut out.as_stereo(), &mut sink);

            let no_events: &[HostEvent] = &[];
            group.bench_with_input(
                BenchmarkId::new(format!("{}_voices", voices), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        sink.clear();
                        synth.process(black_box(no_events), &mut out.as_stereo(), &mut sink);
                    })
                },
            );
        }
    }

    group.finish();
}
