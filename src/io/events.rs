//! Events exchanged with the host once per block.

/// Identity of a note as the host addresses it.
///
/// Follows the usual plugin-host convention: `-1` in any field means
/// "any" when the key is used as a target (note-off, modulation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteKey {
    pub port: i16,
    pub channel: i16,
    pub key: i16,
    pub note_id: i32,
}

impl NoteKey {
    pub const WILDCARD: i16 = -1;

    pub fn new(port: i16, channel: i16, key: i16, note_id: i32) -> Self {
        Self {
            port,
            channel,
            key,
            note_id,
        }
    }

    /// A key with no host-assigned note id.
    pub fn untagged(port: i16, channel: i16, key: i16) -> Self {
        Self::new(port, channel, key, -1)
    }

    /// Port, channel and key are equal.
    #[inline]
    pub fn same_key(&self, other: &NoteKey) -> bool {
        self.port == other.port && self.channel == other.channel && self.key == other.key
    }

    /// Does this (possibly wildcarded) target address `note`?
    pub fn matches(&self, note: &NoteKey) -> bool {
        fn field(target: i32, value: i32) -> bool {
            target == -1 || target == value
        }
        field(self.port as i32, note.port as i32)
            && field(self.channel as i32, note.channel as i32)
            && field(self.key as i32, note.key as i32)
            && field(self.note_id, note.note_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEventKind {
    NoteOn { note: NoteKey, velocity: f64 },
    NoteOff { note: NoteKey, velocity: f64 },
    /// Automation or a host-side edit of a parameter's base value.
    ParamValue { id: u32, value: f64 },
    /// Per-voice modulation offset for every voice `target` addresses.
    ParamMod { id: u32, target: NoteKey, amount: f64 },
    /// Raw MIDI 1.0 channel message.
    Midi { port: i16, data: [u8; 3] },
}

/// One inbound event, `offset` samples into the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostEvent {
    pub offset: u32,
    pub kind: HostEventKind,
}

impl HostEvent {
    pub fn note_on(offset: u32, note: NoteKey, velocity: f64) -> Self {
        Self {
            offset,
            kind: HostEventKind::NoteOn { note, velocity },
        }
    }

    pub fn note_off(offset: u32, note: NoteKey) -> Self {
        Self {
            offset,
            kind: HostEventKind::NoteOff {
                note,
                velocity: 0.0,
            },
        }
    }

    pub fn param_value(offset: u32, id: u32, value: f64) -> Self {
        Self {
            offset,
            kind: HostEventKind::ParamValue { id, value },
        }
    }

    pub fn param_mod(offset: u32, id: u32, target: NoteKey, amount: f64) -> Self {
        Self {
            offset,
            kind: HostEventKind::ParamMod { id, target, amount },
        }
    }

    pub fn midi(offset: u32, port: i16, data: [u8; 3]) -> Self {
        Self {
            offset,
            kind: HostEventKind::Midi { port, data },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputEventKind {
    /// A parameter change the host did not originate (UI edits).
    ParamValue { id: u32, value: f64 },
    GestureBegin { id: u32 },
    GestureEnd { id: u32 },
    /// A voice stopped sounding: released to silence, gated off, or stolen.
    NoteEnd { note: NoteKey },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputEvent {
    pub offset: u32,
    pub kind: OutputEventKind,
}

/// Destination for events the engine sends back to the host.
pub trait EventSink {
    /// Returns false when the event could not be accepted.
    fn try_push(&mut self, event: OutputEvent) -> bool;
}

impl EventSink for Vec<OutputEvent> {
    fn try_push(&mut self, event: OutputEvent) -> bool {
        self.push(event);
        true
    }
}

/// Fixed-capacity output list that never grows once built.
#[derive(Debug)]
pub struct OutputEventList {
    events: Vec<OutputEvent>,
}

impl OutputEventList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn events(&self) -> &[OutputEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for OutputEventList {
    fn try_push(&mut self, event: OutputEvent) -> bool {
        if self.events.len() == self.events.capacity() {
            return false;
        }
        self.events.push(event);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_targets_match_any_field() {
        let note = NoteKey::new(0, 2, 60, 17);
        assert!(NoteKey::new(-1, -1, -1, -1).matches(&note));
        assert!(NoteKey::new(0, 2, 60, -1).matches(&note));
        assert!(NoteKey::new(0, 2, 60, 17).matches(&note));
        assert!(!NoteKey::new(0, 2, 61, -1).matches(&note));
        assert!(!NoteKey::new(-1, -1, -1, 18).matches(&note));
    }

    #[test]
    fn output_list_refuses_past_capacity() {
        let mut list = OutputEventList::with_capacity(2);
        let ev = OutputEvent {
            offset: 0,
            kind: OutputEventKind::GestureBegin { id: 17 },
        };
        assert!(list.try_push(ev));
        assert!(list.try_push(ev));
        assert!(!list.try_push(ev));
        assert_eq!(list.len(), 2);
    }
}
