//! Piano widget and the computer-keyboard note layout

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Semitone offset for a key on the home row (white) and the row above (black).
pub fn key_for_char(c: char) -> Option<i16> {
    let offset = match c {
        'a' => 0,
        'w' => 1,
        's' => 2,
        'e' => 3,
        'd' => 4,
        'f' => 5,
        't' => 6,
        'g' => 7,
        'y' => 8,
        'h' => 9,
        'u' => 10,
        'j' => 11,
        'k' => 12,
        _ => return None,
    };
    Some(offset)
}

/// Keys the engine reports as sounding, counted so overlapping notes on the
/// same key stay lit until the last one ends.
pub struct HeldKeys {
    counts: [u8; 128],
}

impl Default for HeldKeys {
    fn default() -> Self {
        Self { counts: [0; 128] }
    }
}

impl HeldKeys {
    pub fn press(&mut self, key: i16) {
        if let Some(count) = self.slot(key) {
            *count = count.saturating_add(1);
        }
    }

    pub fn release(&mut self, key: i16) {
        if let Some(count) = self.slot(key) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn is_held(&self, key: i16) -> bool {
        usize::try_from(key)
            .ok()
            .and_then(|k| self.counts.get(k))
            .is_some_and(|c| *c > 0)
    }

    fn slot(&mut self, key: i16) -> Option<&mut u8> {
        usize::try_from(key).ok().and_then(|k| self.counts.get_mut(k))
    }
}

const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

pub fn render_keyboard(frame: &mut Frame, area: Rect, held: &HeldKeys, octave: i16) {
    let block = Block::default()
        .title(format!(" Keyboard (octave {}) ", octave))
        .borders(Borders::ALL);

    let base = (octave + 1) * 12;
    let keys: Vec<Span> = (base..base + 25)
        .map(|key| {
            let name = NAMES[(key % 12) as usize];
            let black = name.len() > 1;
            let style = if held.is_held(key) {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else if black {
                Style::default().fg(Color::Gray).bg(Color::Black)
            } else {
                Style::default().fg(Color::Black).bg(Color::White)
            };
            Span::styled(format!("{:^3}", name), style)
        })
        .collect();

    let paragraph = Paragraph::new(vec![Line::from(""), Line::from(keys)]).block(block);
    frame.render_widget(paragraph, area);
}
