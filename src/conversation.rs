use tracing::{info, warn};

use crate::config::{Config, Locale};
use crate::error::ChatError;
use crate::llm::{LlmClient, RequestConfig};
use crate::session::{SessionState, Turn};

/// Where a submission currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingInput,
    InFlight,
}

/// One interactive session: its turns, the two form values and the adapter.
///
/// A submission goes through validation, client initialization, the user
/// turn append, the call and the reply append, in that order. Errors before
/// the append leave the session untouched; a failed call keeps the user turn.
pub struct Conversation {
    session: SessionState,
    config: RequestConfig,
    locale: Locale,
    llm: LlmClient,
    phase: Phase,
}

impl Conversation {
    pub fn new(llm: LlmClient, config: RequestConfig, locale: Locale) -> Self {
        Self {
            session: SessionState::new(locale.greeting()),
            config,
            locale,
            llm,
            phase: Phase::AwaitingInput,
        }
    }

    pub fn from_config(llm: LlmClient, config: &Config) -> Self {
        Self::new(llm, config.request_config(), config.locale)
    }

    /// Submit a prompt and return the assistant reply.
    ///
    /// Whitespace-only prompts are ignored and yield `Ok(None)`.
    pub async fn submit(&mut self, prompt: &str) -> Result<Option<String>, ChatError> {
        if prompt.trim().is_empty() {
            return Ok(None);
        }

        self.phase = Phase::InFlight;
        let result = self.run(prompt).await;
        self.phase = Phase::AwaitingInput;

        if let Err(e) = &result {
            warn!(session = %self.session.id(), "submission failed: {e}");
        }
        result.map(Some)
    }

    async fn run(&mut self, prompt: &str) -> Result<String, ChatError> {
        let client = self.llm.connect(&self.config).await?;

        self.session.append(Turn::user(prompt));
        let reply = self.llm.complete(client.as_ref(), prompt, self.session.all()).await?;

        self.session.append(Turn::assistant(reply.clone()));
        info!(session = %self.session.id(), turns = self.session.len(), "reply appended");
        Ok(reply)
    }

    /// End the current session and start a fresh, seeded one
    pub fn reset(&mut self) {
        info!(session = %self.session.id(), "session ended");
        self.session = SessionState::new(self.locale.greeting());
    }

    pub fn set_project(&mut self, project_id: &str) {
        self.config = RequestConfig::new(project_id, self.config.region());
    }

    pub fn set_region(&mut self, region: &str) {
        self.config = RequestConfig::new(self.config.project_id(), region);
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// User-facing text for a failed submission
    pub fn describe_error(&self, error: &ChatError) -> String {
        match error {
            ChatError::MissingConfiguration => self.locale.missing_project().to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::{MockBackend, MockReply};
    use crate::session::Role;

    fn conversation(backend: &MockBackend, project: &str) -> Conversation {
        let llm = LlmClient::new(Arc::new(backend.clone()), Locale::En.fallback_reply());
        Conversation::new(llm, RequestConfig::new(project, ""), Locale::En)
    }

    #[tokio::test]
    async fn blank_prompt_is_ignored() {
        let backend = MockBackend::new();
        let mut chat = conversation(&backend, "p");

        assert_eq!(chat.submit("   ").await.unwrap(), None);
        assert_eq!(chat.session().len(), 1);
        assert_eq!(backend.connect_count(), 0);
    }

    #[tokio::test]
    async fn init_failure_leaves_session_untouched() {
        let backend = MockBackend::new();
        backend.fail_connect("no network");
        let mut chat = conversation(&backend, "p");

        let err = chat.submit("Hi").await.unwrap_err();
        assert!(matches!(err, ChatError::ClientInitialization(_)));
        assert_eq!(chat.session().len(), 1);
        assert!(backend.calls().is_empty());
        assert_eq!(chat.phase(), Phase::AwaitingInput);
    }

    #[tokio::test]
    async fn call_failure_keeps_user_turn() {
        let backend = MockBackend::new();
        backend.push_reply(MockReply::Fail("503 Service Unavailable".into()));
        let mut chat = conversation(&backend, "p");

        let err = chat.submit("Hi").await.unwrap_err();
        assert!(err.is_call_failure());
        assert_eq!(chat.session().len(), 2);
        assert_eq!(chat.session().last().map(Turn::role), Some(Role::User));
        assert!(chat.describe_error(&err).contains("503 Service Unavailable"));

        // still usable afterwards
        assert!(chat.submit("again").await.unwrap().is_some());
        assert_eq!(chat.session().len(), 4);
    }

    #[tokio::test]
    async fn region_change_applies_to_next_call() {
        let backend = MockBackend::new();
        let mut chat = conversation(&backend, "p");
        chat.set_region("europe-west1");
        chat.submit("Hi").await.unwrap();

        assert_eq!(
            backend.calls()[0].endpoint,
            "projects/p/locations/europe-west1/publishers/google/models/gemini-flash"
        );
    }

    #[tokio::test]
    async fn reset_starts_seeded_session() {
        let backend = MockBackend::new();
        let mut chat = conversation(&backend, "p");
        chat.submit("Hi").await.unwrap();
        let old_id = chat.session().id();

        chat.reset();
        assert_eq!(chat.session().len(), 1);
        assert_ne!(chat.session().id(), old_id);
    }

    #[tokio::test]
    async fn missing_project_message_is_localized() {
        let backend = MockBackend::new();
        let llm = LlmClient::new(Arc::new(backend.clone()), Locale::Es.fallback_reply());
        let mut chat = Conversation::new(llm, RequestConfig::new("", ""), Locale::Es);

        let err = chat.submit("Hola").await.unwrap_err();
        assert_eq!(chat.describe_error(&err), Locale::Es.missing_project());
        assert_eq!(chat.session().all()[0].content(), "¿En qué puedo ayudarte?");
    }
}
