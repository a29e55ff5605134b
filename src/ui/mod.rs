//! Interactive terminal chat

pub mod app;
pub mod commands;
pub mod composer;
pub mod history;
pub mod sidebar;

pub use app::{run, App};
pub use commands::{get_help_text, parse_slash_command, ParsedCommand, SlashCommand};
pub use composer::{Composer, ComposerResult};
pub use history::ConversationHistory;
pub use sidebar::Sidebar;
