mod http;

pub use http::ApiClient;

use async_trait::async_trait;
use thiserror::Error;
use crate::config::WidgetConfig;
use crate::models::api::ChatReply;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("chat API answered with HTTP {0}")]
    Status(u16),
    #[error("chat API returned an unreadable body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("chat API response has no reply")]
    MissingReply,
}

/// One request/response exchange with the chat backend. A single attempt:
/// failures go back to the caller, which decides whether to resend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, message: &str, config: &WidgetConfig) -> Result<ChatReply, ApiError>;
}
