use std::f32::consts::PI;

use crate::param::FilterResponse;

/*
| response  | output taken from      | passes            | rejects      |
| --------- | ---------------------- | ----------------- | ------------ |
| low-pass  | v2                     | below cutoff      | above cutoff |
| band-pass | v1                     | around cutoff     | far from it  |
| high-pass | x - k·v1 - v2          | above cutoff      | below cutoff |
| notch     | x - k·v1               | away from cutoff  | at cutoff    |
| peak      | lp - hp                | boost at cutoff   |              |
*/

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
    pub peak: f32,
}

/// Topology-preserving-transform state variable filter.
///
/// Coefficients are computed by [`StateVariableFilter::configure`] once per
/// rendered range rather than per sample.
pub struct StateVariableFilter {
    ic1eq: f32,
    ic2eq: f32,

    g: f32,
    k: f32,
    response: FilterResponse,
}

impl StateVariableFilter {
    pub fn new(response: FilterResponse) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 2.0,
            response,
        };
        filter.configure(1000.0, 0.0, 48_000.0, response);
        filter
    }

    /// `resonance` is 0..1; it is capped just below self-oscillation.
    pub fn configure(
        &mut self,
        cutoff_hz: f32,
        resonance: f32,
        sample_rate: f32,
        response: FilterResponse,
    ) {
        let nyquist_guard = sample_rate * 0.49;
        let cutoff = cutoff_hz.clamp(10.0, nyquist_guard);
        self.g = (PI * cutoff / sample_rate).tan();
        self.k = 2.0 - 2.0 * resonance.clamp(0.0, 0.98);
        self.response = response;
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> FilterOutputs {
        let g = self.g;
        let k = self.k;
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        let highpass = sample - k * v1 - v2;
        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass,
            notch: sample - k * v1,
            peak: v2 - highpass,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let outputs = self.next_sample(sample);
        match self.response {
            FilterResponse::LowPass => outputs.lowpass,
            FilterResponse::BandPass => outputs.bandpass,
            FilterResponse::HighPass => outputs.highpass,
            FilterResponse::Notch => outputs.notch,
            FilterResponse::Peak => outputs.peak,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
