//! Chat completions client with a hard deadline.
//!
//! The wire exchange sits behind [`ChatTransport`] so the deadline and
//! response validation in [`TransformationClient`] do not depend on how the
//! bytes travel.

use crate::config::Config;
use crate::error::{AppError, PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, full_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                ChatMessage {
                    role: "developer",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: full_prompt.into(),
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// One request/response exchange with the remote service.
///
/// `Err` carries a description of a transport-level failure (DNS,
/// connection, TLS); any HTTP status counts as a completed exchange.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post(&self, credential: &str, request: &ChatRequest) -> std::result::Result<RawResponse, String>;
}

/// [`ChatTransport`] over HTTPS with `reqwest`.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Http(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post(&self, credential: &str, request: &ChatRequest) -> std::result::Result<RawResponse, String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            // Error bodies are not inspected.
            return Ok(RawResponse { status, body: Vec::new() });
        }

        let body = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(RawResponse { status, body: body.to_vec() })
    }
}

/// Exchanges a prompt for generated text under a deadline.
#[derive(Clone)]
pub struct TransformationClient {
    transport: Arc<dyn ChatTransport>,
    model: String,
    deadline: Duration,
}

impl TransformationClient {
    pub fn new(transport: Arc<dyn ChatTransport>, model: impl Into<String>, deadline: Duration) -> Self {
        Self {
            transport,
            model: model.into(),
            deadline,
        }
    }

    /// Client talking HTTPS to the configured endpoint.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config.endpoint.clone())?;
        Ok(Self::new(
            Arc::new(transport),
            config.model_name.clone(),
            config.request_deadline,
        ))
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Sends `full_prompt` and returns the trimmed reply.
    ///
    /// The transport future is raced against the deadline; if the timer wins
    /// the future is dropped and its eventual result never observed.
    pub async fn transform(&self, credential: &str, full_prompt: &str) -> std::result::Result<String, PipelineError> {
        let request = ChatRequest::new(&self.model, full_prompt);
        tracing::debug!(model = %self.model, prompt_len = full_prompt.len(), "Sending transformation request");

        let raw = match tokio::time::timeout(self.deadline, self.transport.post(credential, &request)).await {
            Err(_) => return Err(PipelineError::Timeout(self.deadline)),
            Ok(Err(cause)) => return Err(PipelineError::TransportError(cause)),
            Ok(Ok(raw)) => raw,
        };

        parse_reply(&raw)
    }
}

fn parse_reply(raw: &RawResponse) -> std::result::Result<String, PipelineError> {
    if !(200..300).contains(&raw.status) {
        return Err(PipelineError::HttpError(raw.status));
    }

    let response: ChatResponse =
        serde_json::from_slice(&raw.body).map_err(|_| PipelineError::InvalidResponseBody)?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(PipelineError::MissingContent)
}
