//! Locating Google Cloud credentials and minting bearer tokens.
//!
//! The credential subsystem itself is external; this module only checks the
//! credential file at startup and asks `gcloud` (or the environment) for an
//! access token when a client is initialized.

use std::fs;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::debug;

use crate::error::ChatError;

pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const SETUP_INSTRUCTION: &str = "Create a service account key in the Google Cloud console and run \
     `export GOOGLE_APPLICATION_CREDENTIALS=/path/to/key.json` before starting gemchat.";

/// Check that the credential file variable names a readable JSON key file
pub fn require_credential_file(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, ChatError> {
    let missing = || ChatError::MissingCredential {
        var: CREDENTIALS_ENV,
        instruction: SETUP_INSTRUCTION.to_string(),
    };

    let path = lookup(CREDENTIALS_ENV)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(missing)?;

    let content = fs::read_to_string(&path).map_err(|_| missing())?;
    serde_json::from_str::<serde_json::Value>(&content).map_err(|_| missing())?;

    debug!(path = %path.display(), "credential file found");
    Ok(path)
}

/// Where bearer tokens come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Token handed to us through the environment
    Static(String),
    /// `gcloud auth application-default print-access-token`
    Gcloud,
}

impl TokenSource {
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(ACCESS_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            Some(token) => TokenSource::Static(token.trim().to_string()),
            None => TokenSource::Gcloud,
        }
    }

    pub async fn fetch(&self) -> Result<String, ChatError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Gcloud => {
                let output = Command::new("gcloud")
                    .args(["auth", "application-default", "print-access-token"])
                    .output()
                    .await
                    .map_err(|e| ChatError::client_init(format!("could not run gcloud: {e}")))?;

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(ChatError::client_init(format!(
                        "gcloud could not provide an access token: {}",
                        stderr.trim()
                    )));
                }

                let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if token.is_empty() {
                    return Err(ChatError::client_init("gcloud returned an empty access token"));
                }
                Ok(token)
            }
        }
    }
}
