//! Parameter registry and live storage.
//!
//! `ParamTable` is the immutable description of every automatable control
//! (built once, shared by `Arc` with the control surface). `ParamValues` is the
//! storage the audio path reads and writes: one cell per parameter, indexed by
//! the parameter's slot in the table. The control surface never holds a
//! `ParamValues`; it asks for writes through `FromUi` messages.

mod state;

pub use state::{ParamRecord, PatchState, PATCH_STATE_VERSION};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of parameters exposed by the instrument.
pub const PARAM_COUNT: usize = 10;

/// Stable parameter identifiers.
///
/// The numeric values are part of the host contract (automation lanes and
/// saved patches refer to them) and must never be reassigned.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ParamId {
    UnisonCount = 1378,
    UnisonSpread = 2391,
    OscDetune = 8675309,

    AmpAttack = 2874,
    AmpRelease = 728,
    AmpIsGate = 1942,

    PreFilterVca = 87612,

    Cutoff = 17,
    Resonance = 94,
    FilterMode = 14255,
}

impl ParamId {
    /// All parameters in table order.
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::UnisonCount,
        ParamId::UnisonSpread,
        ParamId::OscDetune,
        ParamId::AmpAttack,
        ParamId::AmpRelease,
        ParamId::AmpIsGate,
        ParamId::PreFilterVca,
        ParamId::Cutoff,
        ParamId::Resonance,
        ParamId::FilterMode,
    ];

    /// Look up a parameter by its wire id.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.raw() == raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Position of this parameter's storage cell.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ParamId::UnisonCount => 0,
            ParamId::UnisonSpread => 1,
            ParamId::OscDetune => 2,
            ParamId::AmpAttack => 3,
            ParamId::AmpRelease => 4,
            ParamId::AmpIsGate => 5,
            ParamId::PreFilterVca => 6,
            ParamId::Cutoff => 7,
            ParamId::Resonance => 8,
            ParamId::FilterMode => 9,
        }
    }
}

/// How a parameter's value should be displayed.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUnit {
    /// Plain number.
    None,
    /// Integer count of unison voices.
    Voices,
    /// Pitch offset in cents.
    Cents,
    /// Normalized 0..1 mapped to seconds via [`scale_time_param_to_seconds`].
    Seconds,
    /// On/off switch.
    Toggle,
    /// MIDI-style key number, displayed as Hz.
    Key,
    /// Filter response selector.
    FilterMode,
}

/// Static description of one parameter.
#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub id: ParamId,
    pub name: &'static str,
    /// Group shown by editors ("Oscillator", "Amp", "Filter").
    pub module: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub unit: ParamUnit,
    /// Only integer values are meaningful.
    pub stepped: bool,
    /// Accepts per-voice modulation from the host.
    pub modulatable: bool,
}

impl ParamInfo {
    const fn new(
        id: ParamId,
        name: &'static str,
        module: &'static str,
        range: (f64, f64),
        default: f64,
        unit: ParamUnit,
    ) -> Self {
        let stepped = matches!(
            unit,
            ParamUnit::Voices | ParamUnit::Toggle | ParamUnit::FilterMode
        );
        Self {
            id,
            name,
            module,
            min: range.0,
            max: range.1,
            default,
            unit,
            stepped,
            modulatable: !stepped,
        }
    }

    /// Clamp (and for stepped parameters, round) a value into range.
    ///
    /// Returns `None` for NaN or infinite input.
    pub fn sanitize(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let v = value.clamp(self.min, self.max);
        Some(if self.stepped { v.round() } else { v })
    }

    /// Map a value into 0..1 across this parameter's range.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Human readable rendering of a value, as shown by editors and hosts.
    pub fn format_value(&self, value: f64) -> String {
        match self.unit {
            ParamUnit::None => format!("{value:.2}"),
            ParamUnit::Voices => format!("{} voices", value.round() as i64),
            ParamUnit::Cents => format!("{value:.1} cents"),
            ParamUnit::Seconds => {
                let secs = scale_time_param_to_seconds(value);
                if secs < 1.0 {
                    format!("{:.1} ms", secs * 1000.0)
                } else {
                    format!("{secs:.2} s")
                }
            }
            ParamUnit::Toggle => {
                if value > 0.5 {
                    "On".to_string()
                } else {
                    "Off".to_string()
                }
            }
            ParamUnit::Key => format!("{:.1} Hz", key_to_freq(value)),
            ParamUnit::FilterMode => FilterResponse::from_value(value).name().to_string(),
        }
    }
}

/// Filter response selected by [`ParamId::FilterMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResponse {
    LowPass,
    BandPass,
    HighPass,
    Notch,
    Peak,
}

impl FilterResponse {
    pub fn from_value(value: f64) -> Self {
        match value.round() as i64 {
            1 => FilterResponse::BandPass,
            2 => FilterResponse::HighPass,
            3 => FilterResponse::Notch,
            4 => FilterResponse::Peak,
            _ => FilterResponse::LowPass,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterResponse::LowPass => "Low Pass",
            FilterResponse::BandPass => "Band Pass",
            FilterResponse::HighPass => "High Pass",
            FilterResponse::Notch => "Notch",
            FilterResponse::Peak => "Peak",
        }
    }
}

/// Convert a 0..1 time control into seconds on an exponential curve.
///
/// 1.0 maps to 4 s, 2/3 to 1 s, 0.0 to 62.5 ms.
pub fn scale_time_param_to_seconds(param: f64) -> f64 {
    let scaled = ((param - 2.0 / 3.0) * 6.0).clamp(-100.0, 2.0);
    2.0_f64.powf(scaled)
}

/// Key number (A4 = 69) to frequency in Hz. Fractional keys are allowed.
pub fn key_to_freq(key: f64) -> f64 {
    440.0 * 2.0_f64.powf((key - 69.0) / 12.0)
}

/// The immutable parameter registry.
#[derive(Debug)]
pub struct ParamTable {
    infos: [ParamInfo; PARAM_COUNT],
}

impl ParamTable {
    #[rustfmt::skip]
    pub fn new() -> Self {
        use ParamUnit as U;

        Self {
            infos: [
                ParamInfo::new(ParamId::UnisonCount, "Unison Count", "Oscillator", (1.0, 7.0), 3.0, U::Voices),
                ParamInfo::new(ParamId::UnisonSpread, "Unison Spread", "Oscillator", (0.0, 100.0), 10.0, U::Cents),
                ParamInfo::new(ParamId::OscDetune, "Oscillator Detune", "Oscillator", (-200.0, 200.0), 0.0, U::Cents),
                ParamInfo::new(ParamId::AmpAttack, "Amplifier Attack", "Amp", (0.0, 1.0), 0.01, U::Seconds),
                ParamInfo::new(ParamId::AmpRelease, "Amplifier Release", "Amp", (0.0, 1.0), 0.2, U::Seconds),
                ParamInfo::new(ParamId::AmpIsGate, "Bypass Amp Envelope", "Amp", (0.0, 1.0), 0.0, U::Toggle),
                ParamInfo::new(ParamId::PreFilterVca, "Pre-Filter VCA", "Amp", (0.0, 1.0), 0.0, U::Toggle),
                ParamInfo::new(ParamId::Cutoff, "Cutoff", "Filter", (1.0, 127.0), 69.0, U::Key),
                ParamInfo::new(ParamId::Resonance, "Resonance", "Filter", (0.0, 1.0), 0.7, U::None),
                ParamInfo::new(ParamId::FilterMode, "Filter Type", "Filter", (0.0, 4.0), 0.0, U::FilterMode),
            ],
        }
    }

    pub fn info(&self, id: ParamId) -> &ParamInfo {
        &self.infos[id.index()]
    }

    /// Metadata for a wire id, or `None` for an unknown id.
    pub fn lookup(&self, raw: u32) -> Option<&ParamInfo> {
        ParamId::from_raw(raw).map(|id| self.info(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamInfo> {
        self.infos.iter()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Storage initialised to every parameter's default.
    pub fn defaults(&self) -> ParamValues {
        let mut values = ParamValues::zeroed();
        for info in &self.infos {
            values.set(info.id, info.default);
        }
        values
    }
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::new()
    }
}

/// One storage cell per parameter.
///
/// `Copy` so voices can take a private snapshot without allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamValues {
    cells: [f64; PARAM_COUNT],
}

impl ParamValues {
    pub const fn zeroed() -> Self {
        Self {
            cells: [0.0; PARAM_COUNT],
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f64 {
        self.cells[id.index()]
    }

    #[inline]
    pub fn set(&mut self, id: ParamId, value: f64) {
        self.cells[id.index()] = value;
    }

    #[inline]
    pub fn is_on(&self, id: ParamId) -> bool {
        self.get(id) > 0.5
    }

    /// Add `offsets` cell by cell.
    pub fn offset_by(&self, offsets: &ParamValues) -> ParamValues {
        let mut out = *self;
        for (cell, offset) in out.cells.iter_mut().zip(offsets.cells.iter()) {
            *cell += offset;
        }
        out
    }
}

impl Default for ParamValues {
    fn default() -> Self {
        ParamTable::new().defaults()
    }
}
