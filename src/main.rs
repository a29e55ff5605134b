use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gemchat::commands::{ask, build_llm, check_credentials, show_config};
use gemchat::{Config, Conversation, Locale};

#[derive(Parser)]
#[command(name = "gemchat")]
#[command(version, about = "Chat with Gemini models on Vertex AI", long_about = None)]
struct Cli {
    /// Google Cloud project id
    #[arg(long, global = true)]
    project: Option<String>,

    /// Vertex AI location (default: us-central1)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Publisher model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Language for greeting and fallback text (en, es)
    #[arg(long, global = true)]
    locale: Option<Locale>,

    /// Refuse to start unless GOOGLE_APPLICATION_CREDENTIALS names a key file
    #[arg(long, global = true)]
    require_credentials: bool,

    /// Answer from an in-process backend instead of Vertex AI
    #[arg(long, global = true)]
    mock: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the reply
    Ask { prompt: String },
    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(project) = &cli.project {
        config.set_project(project.as_str());
    }
    if let Some(region) = &cli.region {
        config.set_region(region.as_str());
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    config.require_credentials |= cli.require_credentials;

    let interactive = cli.command.is_none();
    init_logging(&config, cli.verbose, interactive)?;

    match cli.command {
        None => {
            check_credentials(&config)?;
            let llm = build_llm(&config, cli.mock);
            let conversation = Conversation::from_config(llm, &config);
            gemchat::ui::run(conversation, config).await
        }
        Some(Commands::Ask { prompt }) => {
            check_credentials(&config)?;
            let llm = build_llm(&config, cli.mock);
            let conversation = Conversation::from_config(llm, &config);
            ask(conversation, &prompt, &mut io::stdout()).await
        }
        Some(Commands::Config) => show_config(&config, &mut io::stdout()),
    }
}

/// Log to stderr, or to `~/.gemchat/logs/gemchat.log` while the chat screen owns the terminal
fn init_logging(config: &Config, verbose: bool, interactive: bool) -> Result<()> {
    let default_level = if verbose { "gemchat=debug" } else { "gemchat=info" };
    let filter = EnvFilter::try_from_env("GEMCHAT_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if interactive {
        let log_dir = config.log_dir();
        fs::create_dir_all(&log_dir).context("Failed to create log directory")?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("gemchat.log"))
            .context("Failed to open log file")?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(io::stderr).init();
    }
    Ok(())
}
