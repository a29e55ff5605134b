use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Terminal events the chat loop cares about
#[derive(Debug, Clone)]
pub enum TuiEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Ignored,
}

impl From<Event> for TuiEvent {
    fn from(event: Event) -> Self {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => TuiEvent::Key(key),
            Event::Resize(w, h) => TuiEvent::Resize(w, h),
            _ => TuiEvent::Ignored,
        }
    }
}

/// What the interactive loop should do after an input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    /// Send this prompt; the loop redraws before awaiting the reply
    Submit(String),
    Exit,
}

/// One-off message shown between the history and the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Ctrl+C / Ctrl+D always quit, regardless of focus
pub fn is_quit_key(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
}
