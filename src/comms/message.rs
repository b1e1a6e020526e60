#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Audio path → control surface.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ToUi {
    /// A parameter cell now holds `value`, whoever changed it.
    ParamValue { id: u32, value: f64 },
    NoteOn { key: i16 },
    NoteOff { key: i16 },
}

/// Control surface → audio path.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FromUi {
    BeginEdit { id: u32 },
    EndEdit { id: u32 },
    AdjustValue { id: u32, value: f64 },
}
