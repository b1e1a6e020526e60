use crate::param::ParamValues;

/// The sound-generating part of a voice.
///
/// The engine decides *when* a voice starts, releases, stops and renders;
/// implementors decide *what* it sounds like. Every method is called on the
/// audio thread and must not block or allocate.
pub trait VoiceDsp: Send {
    /// Begin a note. `params` is the voice's private parameter snapshot.
    fn start(&mut self, key: i16, velocity: f32, params: &ParamValues, sample_rate: f32);

    /// The key went up: begin the release tail.
    fn release(&mut self);

    /// Silence immediately (voice stolen or gated off).
    fn kill(&mut self);

    /// Render `left.len()` frames, overwriting both buffers.
    fn render(&mut self, left: &mut [f32], right: &mut [f32], params: &ParamValues);

    /// The voice has decayed to silence and can be recycled.
    fn is_finished(&self) -> bool;
}

/// Factory for the voice DSP the pool is filled with.
///
/// Called once per pool slot at construction, never on the audio thread.
pub trait VoiceFactory {
    type Voice: VoiceDsp;

    fn create_voice(&self) -> Self::Voice;
}

impl<F, T> VoiceFactory for F
where
    F: Fn() -> T,
    T: VoiceDsp,
{
    type Voice = T;

    fn create_voice(&self) -> Self::Voice {
        self()
    }
}
