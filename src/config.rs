use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::{AsRefStr, Display, EnumString};

use crate::llm::RequestConfig;

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_MODEL: &str = "gemini-flash";

pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
pub const REGION_ENV: &str = "GOOGLE_CLOUD_REGION";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Google Cloud project hosting the model
    pub project_id: Option<String>,

    /// Vertex AI location, `us-central1` when unset
    pub region: Option<String>,

    /// Publisher model name
    pub model: String,

    /// Base URL override, e.g. a private service connect endpoint
    pub api_endpoint: Option<String>,

    /// Language for the greeting, fallback reply and notices
    pub locale: Locale,

    /// Refuse to start unless GOOGLE_APPLICATION_CREDENTIALS names a readable file
    pub require_credentials: bool,

    pub ui: UiConfig,

    /// gemchat home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub scroll_step: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            scroll_step: 5,
        }
    }
}

/// Text that differs between the English and Spanish builds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn greeting(self) -> &'static str {
        match self {
            Locale::En => "How can I help you?",
            Locale::Es => "¿En qué puedo ayudarte?",
        }
    }

    /// Reply used when the first prediction carries no content
    pub fn fallback_reply(self) -> &'static str {
        match self {
            Locale::En => "No response",
            Locale::Es => "Sin respuesta",
        }
    }

    pub fn missing_project(self) -> &'static str {
        match self {
            Locale::En => "Please add your Google Cloud Project ID to continue.",
            Locale::Es => "Agrega tu Google Cloud Project ID para continuar.",
        }
    }

    pub fn waiting(self) -> &'static str {
        match self {
            Locale::En => "Waiting for Gemini...",
            Locale::Es => "Esperando a Gemini...",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            project_id: None,
            region: None,
            model: DEFAULT_MODEL.to_string(),
            api_endpoint: None,
            locale: Locale::default(),
            require_credentials: false,
            ui: UiConfig::default(),
            home: home.join(".gemchat"),
        }
    }
}

impl Config {
    /// Load configuration from `~/.gemchat/config.toml` and the environment
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Self::load_with_env(&home.join(".gemchat"), |key| std::env::var(key).ok())
    }

    /// Load `config.toml` from `gemchat_home`, then fill unset values from `lookup`.
    ///
    /// Nothing is created on disk; `save` makes the directory when needed.
    pub fn load_with_env(gemchat_home: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::load_from(gemchat_home)?;
        config.apply_env(lookup);
        Ok(config)
    }

    /// Load `config.toml` from the given home directory, falling back to defaults
    pub fn load_from(gemchat_home: &Path) -> Result<Self> {
        let config_path = gemchat_home.join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.home = gemchat_home.to_path_buf();
        config.normalize();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.home).context("Failed to create .gemchat directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(self.config_path(), content).context("Failed to write config file")?;
        Ok(())
    }

    /// Fill unset values from environment variables.
    ///
    /// Values already present in the file win over the environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.project_id.is_none() {
            self.project_id = lookup(PROJECT_ENV).filter(|v| !v.trim().is_empty());
        }
        if self.region.is_none() {
            self.region = lookup(REGION_ENV).filter(|v| !v.trim().is_empty());
        }
        self.normalize();
    }

    pub fn set_project(&mut self, project_id: impl Into<String>) {
        let project_id = project_id.into().trim().to_string();
        self.project_id = if project_id.is_empty() { None } else { Some(project_id) };
    }

    /// Empty input resets to the default region
    pub fn set_region(&mut self, region: impl Into<String>) {
        let region = region.into().trim().to_string();
        self.region = if region.is_empty() { None } else { Some(region) };
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn request_config(&self) -> RequestConfig {
        RequestConfig::new(self.project_id.clone().unwrap_or_default(), self.region())
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.home.join("logs")
    }

    fn normalize(&mut self) {
        if self.region.as_deref().is_some_and(|r| r.trim().is_empty()) {
            self.region = None;
        }
        if self.model.trim().is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        if let Some(project) = &self.project_id {
            if project.trim().is_empty() {
                self.project_id = None;
            }
        }
    }
}
