//! Chat-completion client for the external AI gateway.
//!
//! Speaks the OpenAI-style `/chat/completions` wire format: a single JSON
//! completion for extraction/briefs, or an SSE stream of deltas for the
//! roleplay chat. Upstream quota exhaustion (429) and billing failures
//! (402) are mapped to dedicated errors so callers can surface them
//! without leaking raw gateway responses.

use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Configuration for the gateway client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway (the `/chat/completions` path is appended).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer key sent with every request.
    #[serde(default)]
    pub api_key: String,
    /// Model identifier to request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8080/v1".to_string()
}
fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One turn of a chat-completion conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f32,
    /// Ask the gateway to constrain output to a JSON object.
    pub json_object: bool,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            json_object: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: DeltaContent,
}

#[derive(Debug, Deserialize)]
struct DeltaContent {
    #[serde(default)]
    content: Option<String>,
}

/// Errors from the gateway.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Upstream 429.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    /// Upstream 402.
    #[error("AI credits exhausted. Please add credits.")]
    CreditsExhausted,
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("API error: HTTP {status}")]
    Api { status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Stream of content deltas from a streaming completion.
pub type ContentStream = BoxStream<'static, Result<String, LlmError>>;

/// Completion backend seam; lets pipelines run against a stub in tests.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run a single-shot completion and return the message content.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<String, LlmError>;

    /// Run a streaming completion and return the delta stream.
    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<ContentStream, LlmError>;
}

/// HTTP client for the AI gateway.
pub struct GatewayClient {
    config: GatewayConfig,
    client: Client,
}

impl GatewayClient {
    /// Create a new gateway client with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: params.temperature,
            response_format: params.json_object.then_some(ResponseFormat {
                format_type: "json_object",
            }),
            stream,
        };

        let url = format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => LlmError::RateLimited,
                402 => LlmError::CreditsExhausted,
                code => {
                    // Detail stays in the server log; callers get a generic error.
                    let body = resp.text().await.unwrap_or_default();
                    error!("AI API error: {} {}", code, body);
                    LlmError::Api { status: code }
                }
            });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl CompletionBackend for GatewayClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        let resp = self.send(&messages, params, false).await?;
        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("no choices in response".to_string()))
    }

    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<ContentStream, LlmError> {
        let resp = self.send(&messages, params, true).await?;
        let mut upstream = Box::pin(resp.bytes_stream());
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<String, LlmError>>(32);

        tokio::spawn(async move {
            let mut buffer = String::new();
            while let Some(chunk) = upstream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::Connection(e.to_string()))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim_end_matches('\r').to_string();
                    buffer.drain(..=pos);

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }
                    match serde_json::from_str::<StreamChunk>(data) {
                        Ok(parsed) => {
                            let content = parsed
                                .choices
                                .into_iter()
                                .next()
                                .and_then(|c| c.delta.content);
                            if let Some(content) = content {
                                if tx.send(Ok(content)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(e) => debug!("skipping unparseable stream line: {}", e),
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }
}
