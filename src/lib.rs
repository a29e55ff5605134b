pub mod commands;
pub mod config;
pub mod conversation;
pub mod credentials;
pub mod error;
pub mod events;
pub mod llm;
pub mod mock;
pub mod session;
pub mod ui;

pub use config::{Config, Locale};
pub use conversation::{Conversation, Phase};
pub use error::ChatError;
pub use llm::{
    Connector, Endpoint, GenerationParameters, LlmClient, PredictRequest, PredictResponse, PredictionClient,
    RequestConfig, VertexConnector,
};
pub use mock::{MockBackend, MockReply, RecordedCall};
pub use session::{Role, SessionState, Turn};
