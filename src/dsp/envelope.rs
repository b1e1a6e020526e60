use crate::MIN_TIME;

/*
Amplitude Envelope
==================

Each voice shapes its loudness with a two-segment attack/release envelope,
or with a plain gate when the envelope is bypassed.

  Level
    1.0 ┐     ______________
        │    ╱              ╲
        │   ╱                ╲
    0.0 └──╱──────────────────╲──→ Time
         Attack   (held)    Release

Stages
------

  Idle      no sound, level = 0. The voice may be recycled.
  Attack    linear ramp 0 → 1 over the attack time.
  Sustain   held at 1 while the key is down.
  Release   linear ramp from the current level to 0 over the release time.

Gate mode skips both ramps: note_on jumps straight to Sustain at full level
and note_off drops straight to Idle. That is what lets the allocator return a
gated voice to the pool the moment its key goes up.

Release always starts from the level at the moment of note_off, so releasing
halfway through an attack fades from wherever the ramp got to instead of
clicking up to full level first. Like the attack, it is precomputed as a
sample count at note_off and interpolated, which lands exactly on 0.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Sustain,
    Release,
}

pub struct AmpEnvelope {
    sample_rate: f32,

    attack_time: f32,
    release_time: f32,
    gated: bool,

    stage: EnvelopeStage,
    level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl AmpEnvelope {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            attack_time: 0.01,
            release_time: 0.2,
            gated: false,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Update segment times. Takes effect immediately for the attack ramp
    /// and at the next note_off for the release.
    pub fn set_times(&mut self, attack: f32, release: f32) {
        self.attack_time = attack.max(MIN_TIME);
        self.release_time = release.max(MIN_TIME);
    }

    /// Gate high.
    pub fn note_on(&mut self, gated: bool) {
        self.gated = gated;
        self.release_elapsed_samples = 0;
        if gated {
            self.level = 1.0;
            self.stage = EnvelopeStage::Sustain;
        } else {
            self.level = 0.0;
            self.stage = EnvelopeStage::Attack;
        }
    }

    /// Gate low.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }
        if self.gated {
            self.reset();
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = (self.release_time * self.sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeStage::Release;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.level += 1.0 / (self.attack_time * self.sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {
                self.level = 1.0;
            }
            EnvelopeStage::Release => {
                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Fill `buffer` with successive envelope values.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.release_start_level = 0.0;
        self.release_elapsed_samples = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
