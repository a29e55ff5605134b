use thiserror::Error;

/// Errors surfaced by a single chat submission or by startup checks.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The project identifier is empty; nothing was sent.
    #[error("Please add your Google Cloud Project ID to continue.")]
    MissingConfiguration,

    #[error("{var} is not set or does not point to a readable credential file. {instruction}")]
    MissingCredential {
        var: &'static str,
        instruction: String,
    },

    #[error("Failed to initialize Vertex AI client: {0}")]
    ClientInitialization(String),

    #[error("Error calling the model: {0}")]
    CallFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    pub fn client_init(msg: impl Into<String>) -> Self {
        Self::ClientInitialization(msg.into())
    }

    pub fn call(msg: impl Into<String>) -> Self {
        Self::CallFailure(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_missing_configuration(&self) -> bool {
        matches!(self, Self::MissingConfiguration)
    }

    pub fn is_call_failure(&self) -> bool {
        matches!(self, Self::CallFailure(_))
    }

    /// Whether the session stays usable after this error.
    ///
    /// Credential and configuration-file errors happen before a session
    /// exists and stop the process instead.
    pub fn is_terminal_for_submission(&self) -> bool {
        matches!(
            self,
            Self::MissingConfiguration | Self::ClientInitialization(_) | Self::CallFailure(_)
        )
    }
}
