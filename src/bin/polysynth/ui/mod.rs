//! TUI module for polysynth
//!
//! Parameter editing, a status bar fed by the engine's snapshot, and a
//! computer-keyboard piano.

mod keyboard;
mod params;
mod status;

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};

use polysynth::{
    comms::ToUi,
    io::{HostEvent, NoteKey},
    param::{ParamId, ParamValues},
    UiHandle,
};

use keyboard::{key_for_char, render_keyboard, HeldKeys};
use params::render_params;
use status::{render_status, StatusView};

/// How long a key press sounds; terminals do not report key releases.
const NOTE_LENGTH: Duration = Duration::from_millis(400);

/// UI application state
pub struct UiApp {
    ui: UiHandle,
    notes: Producer<HostEvent>,
    meter: Consumer<f32>,
    /// Last values acknowledged by the engine.
    values: ParamValues,
    selected: usize,
    held: HeldKeys,
    /// Keyboard notes waiting for their note-off.
    pending_offs: Vec<(Instant, NoteKey)>,
    octave: i16,
    status: StatusView,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        ui: UiHandle,
        notes: Producer<HostEvent>,
        meter: Consumer<f32>,
        sample_rate: f32,
    ) -> Self {
        ui.request_refresh();
        Self {
            values: ui.params().defaults(),
            ui,
            notes,
            meter,
            selected: 0,
            held: HeldKeys::default(),
            pending_offs: Vec::new(),
            octave: 4,
            status: StatusView::new(sample_rate),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_engine();
            self.release_due_notes();

            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_engine(&mut self) {
        while let Some(msg) = self.ui.try_recv() {
            match msg {
                ToUi::ParamValue { id, value } => {
                    if let Some(id) = ParamId::from_raw(id) {
                        self.values.set(id, value);
                    }
                }
                ToUi::NoteOn { key } => self.held.press(key),
                ToUi::NoteOff { key } => self.held.release(key),
            }
        }

        while let Ok(peak) = self.meter.pop() {
            self.status.peak = peak;
        }
        self.status.refresh(self.ui.snapshot(), self.ui.dropped());
    }

    fn release_due_notes(&mut self) {
        let now = Instant::now();
        let mut i = 0;
        while i < self.pending_offs.len() {
            let (due, note) = self.pending_offs[i];
            if due <= now && self.notes.push(HostEvent::note_off(0, note)).is_ok() {
                self.pending_offs.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(ParamId::ALL.len() - 1),
            KeyCode::Left => self.nudge(-1.0),
            KeyCode::Right => self.nudge(1.0),
            KeyCode::Char('z') => self.octave = (self.octave - 1).max(0),
            KeyCode::Char('x') => self.octave = (self.octave + 1).min(8),
            KeyCode::Char('r') => self.ui.request_refresh(),
            KeyCode::Char(c) => {
                if let Some(offset) = key_for_char(c) {
                    self.play((self.octave + 1) * 12 + offset);
                }
            }
            _ => {}
        }
    }

    /// One edit gesture: a single step of the selected parameter.
    fn nudge(&mut self, direction: f64) {
        let id = ParamId::ALL[self.selected];
        let info = self.ui.params().info(id).clone();
        let step = if info.stepped {
            1.0
        } else {
            (info.max - info.min) / 100.0
        };
        let target = (self.values.get(id) + direction * step).clamp(info.min, info.max);

        self.ui.begin_edit(id);
        self.ui.adjust(id, target);
        self.ui.end_edit(id);
    }

    fn play(&mut self, key: i16) {
        if !(0..128).contains(&key) {
            return;
        }
        let note = NoteKey::untagged(0, 0, key);
        if self.notes.push(HostEvent::note_on(0, note, 0.8)).is_ok() {
            self.pending_offs.push((Instant::now() + NOTE_LENGTH, note));
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Status bar
                Constraint::Min(12),    // Parameters
                Constraint::Length(5),  // Keyboard
                Constraint::Length(1),  // Help bar
            ])
            .split(frame.area());

        render_status(frame, chunks[0], &self.status);
        render_params(frame, chunks[1], self.ui.params(), &self.values, self.selected);
        render_keyboard(frame, chunks[2], &self.held, self.octave);

        let help = Paragraph::new(
            " [Esc] Quit  [↑↓] Select  [←→] Adjust  [A-K] Play  [Z/X] Octave  [R] Refresh",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
