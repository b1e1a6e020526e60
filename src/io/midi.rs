/// Decoded MIDI 1.0 channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Parse a three byte channel message. Running status and system
    /// messages are not supported.
    pub fn parse(data: [u8; 3]) -> Option<Self> {
        let status = data[0] & 0xF0;
        let channel = data[0] & 0x0F;
        let d1 = data[1] & 0x7F;
        let d2 = data[2] & 0x7F;

        match status {
            // Note-on with zero velocity is a note-off by convention.
            0x90 if d2 == 0 => Some(MidiEvent::NoteOff {
                channel,
                key: d1,
                velocity: 0,
            }),
            0x90 => Some(MidiEvent::NoteOn {
                channel,
                key: d1,
                velocity: d2,
            }),
            0x80 => Some(MidiEvent::NoteOff {
                channel,
                key: d1,
                velocity: d2,
            }),
            0xB0 => Some(MidiEvent::ControlChange {
                channel,
                controller: d1,
                value: d2,
            }),
            0xE0 => Some(MidiEvent::PitchBend {
                channel,
                value: (((d2 as i16) << 7) | d1 as i16) - 8192,
            }),
            0xC0 => Some(MidiEvent::ProgramChange {
                channel,
                program: d1,
            }),
            _ => None,
        }
    }
}
