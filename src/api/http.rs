use async_trait::async_trait;
use log::{ debug, error };
use reqwest::Client as HttpClient;
use crate::api::{ ApiError, ChatTransport };
use crate::config::WidgetConfig;
use crate::models::api::{ ChatReply, ChatRequest, ChatResponseBody };

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone, Default)]
pub struct ApiClient {
    http: HttpClient,
}

impl ApiClient {
    pub fn new() -> Self {
        Self { http: HttpClient::new() }
    }
}

pub(crate) fn parse_reply(body: &str) -> Result<ChatReply, ApiError> {
    let parsed: ChatResponseBody = serde_json::from_str(body)?;
    parsed
        .reply()
        .map(|reply| ChatReply { reply: reply.to_string() })
        .ok_or(ApiError::MissingReply)
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn send(&self, message: &str, config: &WidgetConfig) -> Result<ChatReply, ApiError> {
        let payload = ChatRequest {
            text: message,
            site_id: &config.site_id,
        };
        let mut req = self.http.post(&config.api_url).json(&payload);
        if !config.api_key.is_empty() {
            req = req.header(API_KEY_HEADER, &config.api_key);
        }

        debug!("POST {} ({} chars)", config.api_url, message.chars().count());
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            error!("Chat API returned {}", status);
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        parse_reply(&body)
    }
}
