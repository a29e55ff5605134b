//! Conversation history display component

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::session::{Role, Turn};

/// Scrollable view over the session turns, newest at the bottom
pub struct ConversationHistory<'a> {
    turns: &'a [Turn],
    /// Lines scrolled up from the bottom
    scroll: u16,
    show_timestamps: bool,
    pending: Option<&'a str>,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(turns: &'a [Turn]) -> Self {
        Self {
            turns,
            scroll: 0,
            show_timestamps: true,
            pending: None,
        }
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn show_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    /// Indicator shown below the last turn while a call is in flight
    pub fn pending(mut self, text: Option<&'a str>) -> Self {
        self.pending = text;
        self
    }

    /// All lines for the given content width, oldest first
    pub fn lines(&self, width: u16) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        for turn in self.turns {
            lines.extend(self.render_turn(turn, width));
            lines.push(Line::default());
        }
        if let Some(text) = self.pending {
            lines.push(Line::from(Span::styled(
                format!("🤖 {text}"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }

    /// Furthest the view can scroll up when rendered into `area`
    pub fn max_scroll(&self, area: Rect) -> u16 {
        let inner = frame_block().inner(area);
        let overflow = self.lines(inner.width).len().saturating_sub(inner.height as usize);
        u16::try_from(overflow).unwrap_or(u16::MAX)
    }

    fn render_turn(&self, turn: &Turn, width: u16) -> Vec<Line<'a>> {
        let (icon, label) = match turn.role() {
            Role::User => ("👤", "You"),
            Role::Assistant => ("🤖", "Gemini"),
        };

        let header = if self.show_timestamps {
            format!("{icon} {label} {}", turn.timestamp().format("%H:%M:%S"))
        } else {
            format!("{icon} {label}")
        };

        let mut lines = vec![Line::from(Span::styled(header, Style::default().fg(Color::DarkGray)))];
        let style = content_style(turn.role());
        for content_line in wrap_text(turn.content(), width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![Span::raw("  "), Span::styled(content_line, style)]));
        }
        lines
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = frame_block();
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.lines(inner.width);
        let height = inner.height as usize;
        let end = lines.len().saturating_sub(self.scroll as usize).max(height.min(lines.len()));
        let start = end.saturating_sub(height);

        for (i, line) in lines[start..end].iter().enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}

fn frame_block() -> Block<'static> {
    Block::default().borders(Borders::ALL).title("💬 Gemini Chatbot")
}

fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Cyan),
        Role::Assistant => Style::default().fg(Color::Green),
    }
}

/// Word-wrap text to `width` columns, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + word_len + 1 > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(wrap_text("the quick brown fox", 10), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn wrap_keeps_paragraphs() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn wrap_does_not_split_long_words() {
        assert_eq!(wrap_text("supercalifragilistic ok", 5), vec!["supercalifragilistic", "ok"]);
    }

    #[test]
    fn lines_follow_turn_order_and_show_pending() {
        let turns = vec![Turn::assistant("How can I help you?"), Turn::user("Hi")];
        let history = ConversationHistory::new(&turns)
            .show_timestamps(false)
            .pending(Some("Waiting..."));
        let text: Vec<String> = history
            .lines(40)
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();

        assert_eq!(text[0], "🤖 Gemini");
        assert_eq!(text[1], "  How can I help you?");
        assert_eq!(text[3], "👤 You");
        assert_eq!(text[4], "  Hi");
        assert_eq!(text.last().map(String::as_str), Some("🤖 Waiting..."));
    }

    #[test]
    fn max_scroll_is_overflow_past_viewport() {
        let turns: Vec<Turn> = (0..10).map(|i| Turn::user(format!("message {i}"))).collect();
        let history = ConversationHistory::new(&turns).show_timestamps(false);

        // 10 turns of header, content and spacer; 4 inner rows
        assert_eq!(history.max_scroll(Rect::new(0, 0, 30, 6)), 26);
        assert_eq!(history.max_scroll(Rect::new(0, 0, 30, 40)), 0);
    }

    #[test]
    fn renders_newest_lines_at_bottom() {
        let turns: Vec<Turn> = (0..10).map(|i| Turn::user(format!("message {i}"))).collect();
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        ConversationHistory::new(&turns).show_timestamps(false).render(area, &mut buf);

        let bottom: String = (1..29).map(|x| buf.get(x, 3).symbol().to_string()).collect();
        assert!(bottom.contains("message 9"));
    }
}
