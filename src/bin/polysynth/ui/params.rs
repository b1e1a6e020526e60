//! Parameter list widget - one row per parameter with a value bar

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use polysynth::param::{ParamTable, ParamValues};

const BAR_WIDTH: usize = 24;

pub fn render_params(
    frame: &mut Frame,
    area: Rect,
    table: &ParamTable,
    values: &ParamValues,
    selected: usize,
) {
    let block = Block::default().title(" Parameters ").borders(Borders::ALL);

    let lines: Vec<Line> = table
        .iter()
        .enumerate()
        .map(|(i, info)| {
            let value = values.get(info.id);
            let filled = (info.normalize(value) * BAR_WIDTH as f64).round() as usize;
            let bar = format!(
                "{}{}",
                "█".repeat(filled),
                "░".repeat(BAR_WIDTH.saturating_sub(filled))
            );

            let name_style = if i == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(vec![
                Span::styled(format!(" {:<8}", info.module), Style::default().fg(Color::DarkGray)),
                Span::styled(format!(" {:<16}", info.name), name_style),
                Span::styled(format!(" {} ", bar), Style::default().fg(Color::Cyan)),
                Span::styled(info.format_value(value), Style::default().fg(Color::Yellow)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
