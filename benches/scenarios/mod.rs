//! Whole-engine benchmarks.
//!
//! These drive `PolySynth::process` the way a host does, so they include
//! dispatch, rendering and note reporting.

mod dispatch;
mod polyphony;

pub use dispatch::bench_dispatch;
pub use polyphony::bench_polyphony;
