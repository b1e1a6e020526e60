//! The instrument's voice: unison saws → state variable filter → VCA.

use crate::{
    dsp::{
        envelope::AmpEnvelope,
        filter::StateVariableFilter,
        oscillator::{unison_layout, SawOscillator, UnisonSlot, MAX_UNISON},
    },
    param::{key_to_freq, scale_time_param_to_seconds, FilterResponse, ParamId, ParamValues},
    synth::VoiceDsp,
};

/// Per-voice output level before summing, leaves headroom for stacked voices.
const VOICE_GAIN: f32 = 0.2;

pub struct SawVoice {
    sample_rate: f32,
    key: i16,
    velocity: f32,

    oscillators: [SawOscillator; MAX_UNISON],
    slots: [UnisonSlot; MAX_UNISON],
    envelope: AmpEnvelope,
    filter_left: StateVariableFilter,
    filter_right: StateVariableFilter,
}

impl SawVoice {
    pub fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            key: 69,
            velocity: 1.0,
            oscillators: std::array::from_fn(|_| SawOscillator::new()),
            slots: [UnisonSlot {
                ratio: 1.0,
                gain_left: 0.0,
                gain_right: 0.0,
            }; MAX_UNISON],
            envelope: AmpEnvelope::new(48_000.0),
            filter_left: StateVariableFilter::new(FilterResponse::LowPass),
            filter_right: StateVariableFilter::new(FilterResponse::LowPass),
        }
    }

    fn apply_envelope_times(&mut self, params: &ParamValues) {
        self.envelope.set_times(
            scale_time_param_to_seconds(params.get(ParamId::AmpAttack)) as f32,
            scale_time_param_to_seconds(params.get(ParamId::AmpRelease)) as f32,
        );
    }
}

impl Default for SawVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceDsp for SawVoice {
    fn start(&mut self, key: i16, velocity: f32, params: &ParamValues, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.key = key;
        self.velocity = velocity.clamp(0.0, 1.0);

        for (i, osc) in self.oscillators.iter_mut().enumerate() {
            osc.reset(i as f32 / MAX_UNISON as f32);
        }
        self.filter_left.reset();
        self.filter_right.reset();

        self.envelope.set_sample_rate(sample_rate);
        self.apply_envelope_times(params);
        self.envelope.note_on(params.is_on(ParamId::AmpIsGate));
    }

    fn release(&mut self) {
        self.envelope.note_off();
    }

    fn kill(&mut self) {
        self.envelope.reset();
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32], params: &ParamValues) {
        let count = params.get(ParamId::UnisonCount).round().max(1.0) as usize;
        let voices = unison_layout(
            count,
            params.get(ParamId::UnisonSpread) as f32,
            params.get(ParamId::OscDetune) as f32,
            &mut self.slots,
        );

        self.apply_envelope_times(params);

        let response = FilterResponse::from_value(params.get(ParamId::FilterMode));
        let cutoff = key_to_freq(params.get(ParamId::Cutoff)) as f32;
        let resonance = params.get(ParamId::Resonance) as f32;
        self.filter_left
            .configure(cutoff, resonance, self.sample_rate, response);
        self.filter_right
            .configure(cutoff, resonance, self.sample_rate, response);

        let pre_filter_vca = params.is_on(ParamId::PreFilterVca);
        let base_increment = key_to_freq(self.key as f64) as f32 / self.sample_rate;

        for (out_l, out_r) in left.iter_mut().zip(right.iter_mut()) {
            let mut l = 0.0;
            let mut r = 0.0;
            for (osc, slot) in self
                .oscillators
                .iter_mut()
                .zip(self.slots.iter())
                .take(voices)
            {
                let s = osc.next_sample(base_increment * slot.ratio);
                l += s * slot.gain_left;
                r += s * slot.gain_right;
            }

            let amp = self.envelope.next_sample() * self.velocity * VOICE_GAIN;
            if pre_filter_vca {
                l = self.filter_left.process(l * amp);
                r = self.filter_right.process(r * amp);
            } else {
                l = self.filter_left.process(l) * amp;
                r = self.filter_right.process(r) * amp;
            }

            *out_l = l;
            *out_r = r;
        }
    }

    fn is_finished(&self) -> bool {
        !self.envelope.is_active()
    }
}
