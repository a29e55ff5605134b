use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::conversation::Conversation;
use crate::credentials::{require_credential_file, CREDENTIALS_ENV};
use crate::llm::{Connector, LlmClient, VertexConnector};
use crate::mock::MockBackend;

/// Build the adapter, against the in-process backend when `mock` is set
pub fn build_llm(config: &Config, mock: bool) -> LlmClient {
    let connector: Arc<dyn Connector> = if mock {
        info!("Using mock prediction backend");
        Arc::new(MockBackend::new())
    } else {
        Arc::new(VertexConnector::from_config(config))
    };
    LlmClient::new(connector, config.locale.fallback_reply())
}

/// Startup check for the credential file when the config demands one
pub fn check_credentials(config: &Config) -> Result<()> {
    if !config.require_credentials {
        return Ok(());
    }
    let path = require_credential_file(|key| std::env::var(key).ok())?;
    info!(path = %path.display(), "using credentials from {CREDENTIALS_ENV}");
    Ok(())
}

/// One submission against a fresh session; the reply goes to `out`
pub async fn ask(mut conversation: Conversation, prompt: &str, out: &mut impl Write) -> Result<()> {
    let reply = conversation
        .submit(prompt)
        .await
        .map_err(|e| anyhow::anyhow!(conversation.describe_error(&e)))?;

    match reply {
        Some(reply) => writeln!(out, "{reply}").context("Failed to write reply")?,
        None => anyhow::bail!("Prompt is empty"),
    }
    Ok(())
}

pub fn show_config(config: &Config, out: &mut impl Write) -> Result<()> {
    let request = config.request_config();
    writeln!(out, "⚙ gemchat configuration")?;
    writeln!(out, "{}", "=".repeat(40))?;
    writeln!(
        out,
        "  Project:      {}",
        if request.project_id().is_empty() { "(not set)" } else { request.project_id() }
    )?;
    writeln!(out, "  Location:     {}", request.region())?;
    writeln!(out, "  Model:        {}", config.model)?;
    if let Some(endpoint) = &config.api_endpoint {
        writeln!(out, "  API endpoint: {endpoint}")?;
    }
    writeln!(out, "  Locale:       {}", config.locale)?;
    writeln!(out, "  Config file:  {}", config.config_path().display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockReply;

    #[tokio::test]
    async fn ask_prints_reply() {
        let backend = MockBackend::new();
        backend.push_reply(MockReply::content("Hello!"));
        let mut config = Config::default();
        config.set_project("p");
        let llm = LlmClient::new(Arc::new(backend), "No response");

        let mut out = Vec::new();
        ask(Conversation::from_config(llm, &config), "Hi", &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Hello!\n");
    }

    #[tokio::test]
    async fn ask_without_project_reports_missing_configuration() {
        let llm = LlmClient::new(Arc::new(MockBackend::new()), "No response");
        let mut out = Vec::new();

        let err = ask(Conversation::from_config(llm, &Config::default()), "Hi", &mut out)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please add your Google Cloud Project ID to continue.");
        assert!(out.is_empty());
    }

    #[test]
    fn credentials_not_checked_unless_required() {
        assert!(check_credentials(&Config::default()).is_ok());
    }

    #[test]
    fn show_config_lists_fields() {
        let mut config = Config::default();
        config.set_project("demo");
        let mut out = Vec::new();
        show_config(&config, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Project:      demo"));
        assert!(text.contains("Location:     us-central1"));
        assert!(text.contains("Model:        gemini-flash"));
    }
}
