//! Voice DSP.
//!
//! The engine treats a voice's sound generation as an opaque
//! [`crate::synth::VoiceDsp`]; this module holds the one the instrument ships
//! with. Everything here is allocation-free and realtime-safe.

/// Attack/release amplitude envelope with a gate mode.
pub mod envelope;
/// State-variable filter with five responses.
pub mod filter;
/// PolyBLEP sawtooth and unison layout.
pub mod oscillator;
/// Unison saw → filter → VCA voice.
pub mod saw_voice;

pub use envelope::EnvelopeStage;
pub use saw_voice::SawVoice;
