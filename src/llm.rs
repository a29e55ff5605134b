use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_REGION};
use crate::credentials::TokenSource;
use crate::error::ChatError;
use crate::session::{Role, Turn};

const PUBLISHER: &str = "google";

/// Project and region a single call is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    project_id: String,
    region: String,
}

impl RequestConfig {
    pub fn new(project_id: impl Into<String>, region: impl Into<String>) -> Self {
        let region = region.into().trim().to_string();
        Self {
            project_id: project_id.into().trim().to_string(),
            region: if region.is_empty() { DEFAULT_REGION.to_string() } else { region },
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// An empty project means nothing may be sent
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.project_id.is_empty() {
            return Err(ChatError::MissingConfiguration);
        }
        Ok(())
    }
}

/// Sampling parameters sent with every prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 256,
            top_k: 40,
            top_p: 0.8,
        }
    }
}

/// Role and content of one prior turn, as sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Turn> for ContextTurn {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role(),
            content: turn.content().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub content: String,
    pub context: Vec<ContextTurn>,
}

/// Body of a `:predict` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub instances: Vec<Instance>,
    pub parameters: GenerationParameters,
}

impl PredictRequest {
    pub fn new(prompt: &str, history: &[Turn]) -> Self {
        Self {
            instances: vec![Instance {
                content: prompt.to_string(),
                context: history.iter().map(ContextTurn::from).collect(),
            }],
            parameters: GenerationParameters::default(),
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        self.instances.first().map(|i| i.content.as_str())
    }

    pub fn context(&self) -> &[ContextTurn] {
        self.instances.first().map(|i| i.context.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub content: Option<String>,
}

impl Prediction {
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn content_or(&self, fallback: &str) -> String {
        self.content().unwrap_or(fallback).to_string()
    }
}

impl PredictResponse {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            predictions: vec![Prediction {
                content: Some(content.into()),
            }],
        }
    }

    /// Content of the first prediction, or `fallback` when it has none.
    ///
    /// A response without any prediction is malformed.
    pub fn reply(&self, fallback: &str) -> Result<String, ChatError> {
        self.predictions
            .first()
            .map(|p| p.content_or(fallback))
            .ok_or_else(|| ChatError::call("response contained no predictions"))
    }
}

/// A publisher model addressed by project, region and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    project_id: String,
    region: String,
    model: String,
    base_url: String,
}

impl Endpoint {
    pub fn new(config: &RequestConfig, model: &str, base_url: Option<&str>) -> Self {
        let base_url = match base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", config.region()),
        };
        Self {
            project_id: config.project_id().to_string(),
            region: config.region().to_string(),
            model: model.to_string(),
            base_url,
        }
    }

    /// `projects/<project>/locations/<region>/publishers/google/models/<model>`
    pub fn resource_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/publishers/{}/models/{}",
            self.project_id, self.region, PUBLISHER, self.model
        )
    }

    pub fn predict_url(&self) -> String {
        format!("{}/v1/{}:predict", self.base_url, self.resource_name())
    }
}

/// An initialized client bound to one endpoint
#[async_trait]
pub trait PredictionClient: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    /// Issue exactly one prediction call
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ChatError>;
}

/// Creates clients scoped to a project and region
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &RequestConfig) -> Result<Box<dyn PredictionClient>, ChatError>;
}

/// Connector for the hosted Vertex AI prediction service
pub struct VertexConnector {
    model: String,
    api_endpoint: Option<String>,
    token_source: TokenSource,
}

impl VertexConnector {
    pub fn new(model: impl Into<String>, api_endpoint: Option<String>, token_source: TokenSource) -> Self {
        Self {
            model: model.into(),
            api_endpoint,
            token_source,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.model.clone(),
            config.api_endpoint.clone(),
            TokenSource::from_env(|key| std::env::var(key).ok()),
        )
    }
}

/// Reject identifiers that cannot form a valid resource path
pub fn validate_scope(config: &RequestConfig) -> Result<(), ChatError> {
    let project = config.project_id();
    if project.chars().any(|c| c == '/' || c.is_whitespace()) {
        return Err(ChatError::client_init(format!("invalid project id '{project}'")));
    }

    let region = config.region();
    let valid_region = region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_region || region.starts_with('-') || region.ends_with('-') {
        return Err(ChatError::client_init(format!("invalid region '{region}'")));
    }

    Ok(())
}

#[async_trait]
impl Connector for VertexConnector {
    async fn connect(&self, config: &RequestConfig) -> Result<Box<dyn PredictionClient>, ChatError> {
        validate_scope(config)?;

        let token = self.token_source.fetch().await?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatError::client_init(format!("failed to create HTTP client: {e}")))?;

        let endpoint = Endpoint::new(config, &self.model, self.api_endpoint.as_deref());
        debug!(endpoint = %endpoint.resource_name(), "Vertex AI client initialized");

        Ok(Box::new(VertexClient { http, endpoint, token }))
    }
}

/// HTTP client for one Vertex AI publisher model
pub struct VertexClient {
    http: reqwest::Client,
    endpoint: Endpoint,
    token: String,
}

#[async_trait]
impl PredictionClient for VertexClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ChatError> {
        let response = self
            .http
            .post(self.endpoint.predict_url())
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::call(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Vertex AI returned an error: {body}");
            return Err(ChatError::call(format!("Vertex AI returned {status}: {}", body.trim())));
        }

        response
            .json::<PredictResponse>()
            .await
            .map_err(|e| ChatError::call(format!("failed to parse response: {e}")))
    }
}

/// Turns a prompt plus history into one prediction call
#[derive(Clone)]
pub struct LlmClient {
    connector: Arc<dyn Connector>,
    fallback: String,
}

impl LlmClient {
    pub fn new(connector: Arc<dyn Connector>, fallback: impl Into<String>) -> Self {
        Self {
            connector,
            fallback: fallback.into(),
        }
    }

    /// Validate the configuration and initialize a client scoped to it
    pub async fn connect(&self, config: &RequestConfig) -> Result<Box<dyn PredictionClient>, ChatError> {
        config.validate()?;
        self.connector.connect(config).await
    }

    /// Send `prompt` with `history` as context through an initialized client
    pub async fn complete(
        &self,
        client: &dyn PredictionClient,
        prompt: &str,
        history: &[Turn],
    ) -> Result<String, ChatError> {
        let request = PredictRequest::new(prompt, history);
        info!(
            endpoint = %client.endpoint().resource_name(),
            context_turns = history.len(),
            "sending prediction request"
        );

        let response = client.predict(&request).await?;
        let reply = response.reply(&self.fallback)?;
        debug!(reply_len = reply.len(), "prediction received");
        Ok(reply)
    }

    /// Connect and complete in one step
    pub async fn send(&self, prompt: &str, config: &RequestConfig, history: &[Turn]) -> Result<String, ChatError> {
        let client = self.connect(config).await?;
        self.complete(client.as_ref(), prompt, history).await
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}
