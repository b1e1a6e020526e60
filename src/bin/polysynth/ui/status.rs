//! Status bar widget - engine state from the published snapshot

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use polysynth::comms::UiSnapshot;

/// What the status bar shows, re-read only when the snapshot moves.
pub struct StatusView {
    pub sample_rate: f32,
    pub peak: f32,
    pub processing: bool,
    pub polyphony: usize,
    pub engine_dropped: u64,
    pub ui_dropped: u64,
    last_update: Option<u32>,
}

impl StatusView {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            peak: 0.0,
            processing: false,
            polyphony: 0,
            engine_dropped: 0,
            ui_dropped: 0,
            last_update: None,
        }
    }

    pub fn refresh(&mut self, snapshot: &UiSnapshot, ui_dropped: u64) {
        self.ui_dropped = ui_dropped;

        let count = snapshot.update_count();
        if self.last_update == Some(count) {
            return;
        }
        self.last_update = Some(count);
        self.processing = snapshot.is_processing();
        self.polyphony = snapshot.polyphony();
        self.engine_dropped = snapshot.dropped_messages();
    }
}

pub fn render_status(frame: &mut Frame, area: Rect, status: &StatusView) {
    let block = Block::default().title(" polysynth ").borders(Borders::ALL);

    let (symbol, state) = if status.processing {
        ("▶", "Running")
    } else {
        ("⏸", "Stopped")
    };
    let dropped = status.engine_dropped + status.ui_dropped;

    let line = Line::from(vec![
        Span::styled(
            format!(" {} {}  ", symbol, state),
            Style::default().fg(if status.processing {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::styled(
            format!("Voices: {:>3}  ", status.polyphony),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:.1}kHz  ", status.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  ", status.peak),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("Dropped: {}", dropped),
            Style::default().fg(if dropped > 0 { Color::Red } else { Color::DarkGray }),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
