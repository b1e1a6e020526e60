//! Deterministic voice DSP for engine tests.

use crate::{param::ParamValues, synth::VoiceDsp};

/// Outputs a constant `velocity` on both channels while sounding. After
/// release it keeps sounding for `tail` frames, then finishes.
pub struct TestVoice {
    pub tail: usize,
    velocity: f32,
    sounding: bool,
    released: bool,
    remaining: usize,
    pub last_params: Option<ParamValues>,
}

impl TestVoice {
    pub fn with_tail(tail: usize) -> Self {
        Self {
            tail,
            velocity: 0.0,
            sounding: false,
            released: false,
            remaining: 0,
            last_params: None,
        }
    }
}

impl VoiceDsp for TestVoice {
    fn start(&mut self, _key: i16, velocity: f32, params: &ParamValues, _sample_rate: f32) {
        self.velocity = velocity;
        self.sounding = true;
        self.released = false;
        self.remaining = self.tail;
        self.last_params = Some(*params);
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn kill(&mut self) {
        self.sounding = false;
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32], params: &ParamValues) {
        self.last_params = Some(*params);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let out = if self.sounding { self.velocity } else { 0.0 };
            *l = out;
            *r = out;
            if self.sounding && self.released {
                if self.remaining == 0 {
                    self.sounding = false;
                } else {
                    self.remaining -= 1;
                }
            }
        }
    }

    fn is_finished(&self) -> bool {
        !self.sounding
    }
}
