use crate::{
    io::NoteKey,
    param::{ParamId, ParamValues},
    synth::VoiceDsp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,      // Available for allocation
    Active,    // Key held
    Releasing, // Key released, tail still sounding
}

/// One slot of the voice pool.
pub struct Voice<D: VoiceDsp> {
    state: VoiceState,
    note: NoteKey,
    age: u64,
    sample_rate: f32,
    /// Base values copied from the parameter cells.
    params: ParamValues,
    /// Per-voice modulation offsets, cleared on every start.
    modulation: ParamValues,
    dsp: D,
}

impl<D: VoiceDsp> Voice<D> {
    pub fn new(dsp: D, sample_rate: f32) -> Self {
        Self {
            state: VoiceState::Idle,
            note: NoteKey::untagged(-1, -1, -1),
            age: 0,
            sample_rate,
            params: ParamValues::default(),
            modulation: ParamValues::zeroed(),
            dsp,
        }
    }

    pub fn start(&mut self, note: NoteKey, velocity: f32, params: &ParamValues, age: u64) {
        self.note = note;
        self.age = age;
        self.params = *params;
        self.modulation = ParamValues::zeroed();
        self.state = VoiceState::Active;

        self.dsp.start(note.key, velocity, params, self.sample_rate);
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.dsp.release();
        }
    }

    /// Return to the pool without a tail.
    pub fn free(&mut self) {
        self.dsp.kill();
        self.state = VoiceState::Idle;
    }

    /// Render into `left`/`right`. Returns true once the tail has finished.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) -> bool {
        let effective = self.params.offset_by(&self.modulation);
        self.dsp.render(left, right, &effective);
        self.dsp.is_finished()
    }

    pub fn set_params(&mut self, params: &ParamValues) {
        self.params = *params;
    }

    pub fn set_modulation(&mut self, id: ParamId, amount: f64) {
        self.modulation.set(id, amount);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pub fn is_idle(&self) -> bool {
        self.state == VoiceState::Idle
    }

    /// Active or Releasing.
    pub fn is_sounding(&self) -> bool {
        !self.is_idle()
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn note(&self) -> NoteKey {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn params(&self) -> &ParamValues {
        &self.params
    }

    pub fn modulation(&self, id: ParamId) -> f64 {
        self.modulation.get(id)
    }
}
