use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::{
    event::{EventStream, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{error, info};

use crate::config::Config;
use crate::conversation::Conversation;
use crate::events::{is_quit_key, AppAction, Notice, TuiEvent};
use crate::ui::commands::{get_help_text, ParsedCommand, SlashCommand};
use crate::ui::composer::{Composer, ComposerResult};
use crate::ui::history::ConversationHistory;
use crate::ui::sidebar::Sidebar;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Interactive chat screen state
pub struct App {
    conversation: Conversation,
    config: Config,
    composer: Composer,
    notice: Option<Notice>,
    scroll: u16,
    /// Scroll limit from the last drawn frame
    max_scroll: u16,
    in_flight: bool,
}

impl App {
    pub fn new(conversation: Conversation, config: Config) -> Self {
        Self {
            conversation,
            config,
            composer: Composer::new("Type a message..."),
            notice: None,
            scroll: 0,
            max_scroll: 0,
            in_flight: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if is_quit_key(&key) || key.code == KeyCode::Esc {
            return AppAction::Exit;
        }

        match key.code {
            KeyCode::PageUp => {
                self.scroll = self
                    .scroll
                    .saturating_add(self.config.ui.scroll_step)
                    .min(self.max_scroll);
                return AppAction::Continue;
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_sub(self.config.ui.scroll_step);
                return AppAction::Continue;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(prompt) => AppAction::Submit(prompt),
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => AppAction::Continue,
        }
    }

    /// Mark the submission as in flight so the next frame shows it
    pub fn begin_submit(&mut self) {
        self.in_flight = true;
        self.notice = None;
        self.scroll = 0;
        self.composer.set_enabled(false);
    }

    pub async fn finish_submit(&mut self, prompt: &str) {
        if let Err(e) = self.conversation.submit(prompt).await {
            let message = self.conversation.describe_error(&e);
            self.notice = Some(if e.is_missing_configuration() {
                Notice::Info(message)
            } else {
                Notice::Error(message)
            });
        }
        self.in_flight = false;
        self.composer.set_enabled(true);
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) -> AppAction {
        let argument = command.argument().unwrap_or_default().to_string();
        match command.command {
            SlashCommand::Project => {
                self.conversation.set_project(&argument);
                let message = format!("Project set to '{}'", self.conversation.config().project_id());
                self.persist(message, |config| config.set_project(argument.as_str()));
            }
            SlashCommand::Region => {
                self.conversation.set_region(&argument);
                let message = format!("Location set to '{}'", self.conversation.config().region());
                self.persist(message, |config| config.set_region(argument.as_str()));
            }
            SlashCommand::New => {
                self.conversation.reset();
                self.scroll = 0;
                self.notice = Some(Notice::Info("Started a new session".to_string()));
            }
            SlashCommand::Config => {
                self.notice = Some(Notice::Info(self.config_summary()));
            }
            SlashCommand::Help => {
                self.notice = Some(Notice::Info(get_help_text()));
            }
            SlashCommand::Bye => return AppAction::Exit,
        }
        AppAction::Continue
    }

    /// Apply `update` to the running config and to the file's own values.
    ///
    /// Values that came from flags or the environment are never written back.
    fn persist(&mut self, message: String, update: impl Fn(&mut Config)) {
        update(&mut self.config);
        let saved = Config::load_from(&self.config.home).and_then(|mut file| {
            update(&mut file);
            file.save()
        });

        self.notice = Some(match saved {
            Ok(()) => Notice::Info(message),
            Err(e) => {
                error!("failed to save config: {e:#}");
                Notice::Error(format!("{message}, but saving the config failed: {e}"))
            }
        });
    }

    fn config_summary(&self) -> String {
        let request = self.conversation.config();
        let project = if request.project_id().is_empty() { "(not set)" } else { request.project_id() };
        format!(
            "Project: {project}\nLocation: {}\nModel: {}\nConfig file: {}",
            request.region(),
            self.config.model,
            self.config.config_path().display()
        )
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(20)])
            .split(frame.size());

        frame.render_widget(
            Sidebar {
                config: self.conversation.config(),
                model: &self.config.model,
                turns: self.conversation.session().len(),
            },
            columns[0],
        );

        let notice_height = self
            .notice
            .as_ref()
            .map(|n| (n.text().lines().count() as u16 + 2).min(10))
            .unwrap_or(0);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(notice_height),
                Constraint::Length(3),
            ])
            .split(columns[1]);

        let locale = self.conversation.locale();
        let history = ConversationHistory::new(self.conversation.session().all())
            .show_timestamps(self.config.ui.show_timestamps)
            .pending(self.in_flight.then(|| locale.waiting()));
        self.max_scroll = history.max_scroll(rows[0]);
        self.scroll = self.scroll.min(self.max_scroll);
        frame.render_widget(history.scroll(self.scroll), rows[0]);

        if let Some(notice) = &self.notice {
            let color = if notice.is_error() { Color::Red } else { Color::Blue };
            let paragraph = Paragraph::new(notice.text())
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(color))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(paragraph, rows[1]);
        }

        frame.render_widget(&self.composer, rows[2]);
    }
}

/// Runs `restore` when dropped, so setup failures and early returns leave the terminal usable
struct TerminalGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> Drop for TerminalGuard<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run the interactive chat until the user quits
pub async fn run(conversation: Conversation, config: Config) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let guard = TerminalGuard {
        restore: restore_terminal,
    };
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    info!(session = %conversation.session().id(), "interactive session started");
    let result = event_loop(&mut terminal, App::new(conversation, config)).await;

    drop(guard);
    terminal.show_cursor()?;
    result
}

async fn event_loop(terminal: &mut Tui, mut app: App) -> Result<()> {
    let mut events = EventStream::new();

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        let key = match TuiEvent::from(event.context("Failed to read terminal event")?) {
            TuiEvent::Key(key) => key,
            TuiEvent::Resize(..) | TuiEvent::Ignored => continue,
        };

        match app.handle_key(key) {
            AppAction::Continue => {}
            AppAction::Submit(prompt) => {
                app.begin_submit();
                terminal.draw(|frame| app.draw(frame))?;
                app.finish_submit(&prompt).await;
            }
            AppAction::Exit => break,
        }
    }

    info!(session = %app.conversation().session().id(), "interactive session ended");
    Ok(())
}
