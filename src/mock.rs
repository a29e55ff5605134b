//! In-process prediction backend for offline use and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::config::DEFAULT_MODEL;
use crate::error::ChatError;
use crate::llm::{
    validate_scope, Connector, Endpoint, PredictRequest, PredictResponse, Prediction, PredictionClient,
    RequestConfig,
};

/// Scripted outcome of the next prediction call
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Content(String),
    /// A prediction without a content field
    Empty,
    Fail(String),
}

impl MockReply {
    pub fn content(text: impl Into<String>) -> Self {
        MockReply::Content(text.into())
    }
}

/// A prediction call as seen by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: String,
    pub request: PredictRequest,
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    calls: Vec<RecordedCall>,
    connects: usize,
    connect_error: Option<String>,
}

/// Records every call and answers from a script, echoing once the script runs out
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.lock().replies.push_back(reply);
    }

    /// Make every following `connect` fail with `message`
    pub fn fail_connect(&self, message: impl Into<String>) {
        self.lock().connect_error = Some(message.into());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.lock().connects
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Connector for MockBackend {
    async fn connect(&self, config: &RequestConfig) -> Result<Box<dyn PredictionClient>, ChatError> {
        validate_scope(config)?;

        let mut state = self.lock();
        state.connects += 1;
        if let Some(message) = &state.connect_error {
            return Err(ChatError::client_init(message.clone()));
        }
        drop(state);

        Ok(Box::new(MockClient {
            backend: self.clone(),
            endpoint: Endpoint::new(config, DEFAULT_MODEL, Some("mock://")),
        }))
    }
}

struct MockClient {
    backend: MockBackend,
    endpoint: Endpoint,
}

#[async_trait]
impl PredictionClient for MockClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ChatError> {
        let mut state = self.backend.lock();
        state.calls.push(RecordedCall {
            endpoint: self.endpoint.resource_name(),
            request: request.clone(),
        });

        let reply = state.replies.pop_front().unwrap_or_else(|| {
            MockReply::content(format!("You said: {}", request.prompt().unwrap_or_default()))
        });
        debug!(?reply, "mock prediction");

        match reply {
            MockReply::Content(text) => Ok(PredictResponse::with_content(text)),
            MockReply::Empty => Ok(PredictResponse {
                predictions: vec![Prediction::default()],
            }),
            MockReply::Fail(message) => Err(ChatError::call(message)),
        }
    }
}
