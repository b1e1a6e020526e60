/*
Band-limited Sawtooth
=====================

A naive sawtooth (2·phase - 1) jumps from +1 to -1 every cycle. That jump
contains energy at every harmonic, and everything above Nyquist folds back
as audible aliasing. PolyBLEP rounds off the jump with a two-sample
polynomial correction: cheap, and good enough for a subtractive voice.

Unison stacks several saws detuned symmetrically around the played pitch
and spreads them across the stereo field, lowest pitch hard left, highest
hard right.
*/

/// Maximum unison depth supported by a voice.
pub const MAX_UNISON: usize = 7;

/// Polynomial band-limited step correction around a phase wrap.
#[inline(always)]
fn poly_blep(phase: f32, phase_increment: f32) -> f32 {
    if phase < phase_increment {
        let t = phase / phase_increment;
        t + t - t * t - 1.0
    } else if phase > 1.0 - phase_increment {
        let t = (phase - 1.0) / phase_increment;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

pub struct SawOscillator {
    phase: f32,
}

impl SawOscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Start at a given phase (0..1). Unison voices start spread out so the
    /// stack does not begin with a phase-aligned spike.
    pub fn with_phase(phase: f32) -> Self {
        Self {
            phase: phase.rem_euclid(1.0),
        }
    }

    /// Produce one sample. `phase_increment` is frequency / sample rate.
    #[inline]
    pub fn next_sample(&mut self, phase_increment: f32) -> f32 {
        let dt = phase_increment.clamp(1.0e-6, 0.5);
        let out = 2.0 * self.phase - 1.0 - poly_blep(self.phase, dt);
        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }

    pub fn reset(&mut self, phase: f32) {
        self.phase = phase.rem_euclid(1.0);
    }
}

impl Default for SawOscillator {
    fn default() -> Self {
        Self::new()
    }
}

/// One unison member: frequency ratio and constant-power pan gains.
#[derive(Debug, Clone, Copy)]
pub struct UnisonSlot {
    pub ratio: f32,
    pub gain_left: f32,
    pub gain_right: f32,
}

/// Lay out `count` detuned members across `spread_cents` around `detune_cents`.
///
/// Returns how many slots were filled. The total level is normalized so a
/// bigger stack is not louder.
pub fn unison_layout(
    count: usize,
    spread_cents: f32,
    detune_cents: f32,
    slots: &mut [UnisonSlot; MAX_UNISON],
) -> usize {
    let count = count.clamp(1, MAX_UNISON);
    let norm = 1.0 / (count as f32).sqrt();

    for (i, slot) in slots.iter_mut().take(count).enumerate() {
        // -1..1 position inside the stack; a single voice sits in the middle.
        let position = if count == 1 {
            0.0
        } else {
            2.0 * i as f32 / (count - 1) as f32 - 1.0
        };
        let cents = detune_cents + position * spread_cents;
        let pan = (position + 1.0) * std::f32::consts::FRAC_PI_4;

        *slot = UnisonSlot {
            ratio: 2.0_f32.powf(cents / 1200.0),
            gain_left: pan.cos() * norm,
            gain_right: pan.sin() * norm,
        };
    }
    count
}
