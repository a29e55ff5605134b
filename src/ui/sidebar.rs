use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::llm::RequestConfig;

/// Left-hand panel with the two connection fields
pub struct Sidebar<'a> {
    pub config: &'a RequestConfig,
    pub model: &'a str,
    pub turns: usize,
}

impl Sidebar<'_> {
    fn field(label: &str, value: &str, missing: &str) -> Vec<Line<'static>> {
        let value_span = if value.is_empty() {
            Span::styled(missing.to_string(), Style::default().fg(Color::Red))
        } else {
            Span::styled(value.to_string(), Style::default().fg(Color::White))
        };
        vec![
            Line::from(Span::styled(
                label.to_string(),
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            )),
            Line::from(value_span),
            Line::default(),
        ]
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines = Vec::new();
        lines.extend(Self::field("Google Cloud Project ID", self.config.project_id(), "(not set: /project <id>)"));
        lines.extend(Self::field("Location", self.config.region(), ""));
        lines.extend(Self::field("Model", self.model, ""));
        lines.push(Line::from(Span::styled(
            format!("{} turns", self.turns),
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("⚙ Settings"))
            .render(area, buf);
    }
}
