use crate::io::{
    events::{HostEventKind, NoteKey},
    midi::MidiEvent,
};

/// Translate a raw MIDI message into the note events the engine understands.
///
/// Only note on/off survive; the engine has no MIDI-mapped parameters.
/// MIDI carries no note id, so the resulting keys are untagged.
pub fn midi_to_host(port: i16, data: [u8; 3]) -> Option<HostEventKind> {
    match MidiEvent::parse(data)? {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } => Some(HostEventKind::NoteOn {
            note: NoteKey::untagged(port, channel as i16, key as i16),
            velocity: velocity as f64 / 127.0,
        }),
        MidiEvent::NoteOff {
            channel,
            key,
            velocity,
        } => Some(HostEventKind::NoteOff {
            note: NoteKey::untagged(port, channel as i16, key as i16),
            velocity: velocity as f64 / 127.0,
        }),
        _ => None,
    }
}
