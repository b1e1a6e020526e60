//! Engine construction settings.
//!
//! Everything sized here is allocated once by [`crate::PolySynth::new`]; none
//! of it can change while the audio path runs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, synth::StealPolicy};

/// Voice count used when none is configured.
pub const DEFAULT_MAX_VOICES: usize = 64;
/// Hard ceiling for the voice pool.
pub const VOICE_CEILING: usize = 256;
/// Slots in each UI queue when none is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;
/// Smallest accepted queue. A refresh must fit one message per parameter.
pub const MIN_QUEUE_CAPACITY: usize = crate::param::PARAM_COUNT;
/// Host events accepted per block when none is configured.
pub const DEFAULT_TIMELINE_CAPACITY: usize = 1024;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Size of the pre-allocated voice pool.
    pub max_voices: usize,
    /// Slots in each of the two UI queues.
    pub queue_capacity: usize,
    /// Host events a single block can carry; extra events are dropped. The
    /// timeline also reserves one slot per UI queue slot.
    pub timeline_capacity: usize,
    /// Sample rate used until the host calls `activate`.
    pub sample_rate: f32,
    /// Allow several voices on the same port/channel/key.
    pub overlapping_notes: bool,
    pub steal_policy: StealPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_voices: DEFAULT_MAX_VOICES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeline_capacity: DEFAULT_TIMELINE_CAPACITY,
            sample_rate: 48_000.0,
            overlapping_notes: true,
            steal_policy: StealPolicy::FirstFound,
        }
    }
}

impl EngineConfig {
    pub fn max_voices(mut self, voices: usize) -> Self {
        self.max_voices = voices;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn timeline_capacity(mut self, capacity: usize) -> Self {
        self.timeline_capacity = capacity;
        self
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn overlapping_notes(mut self, enabled: bool) -> Self {
        self.overlapping_notes = enabled;
        self
    }

    pub fn steal_policy(mut self, policy: StealPolicy) -> Self {
        self.steal_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_voices == 0 || self.max_voices > VOICE_CEILING {
            return Err(ConfigError::VoiceCount {
                got: self.max_voices,
                max: VOICE_CEILING,
            });
        }
        if self.queue_capacity < MIN_QUEUE_CAPACITY {
            return Err(ConfigError::QueueCapacity {
                got: self.queue_capacity,
                min: MIN_QUEUE_CAPACITY,
            });
        }
        if self.timeline_capacity == 0 {
            return Err(ConfigError::TimelineCapacity);
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        Ok(())
    }
}
