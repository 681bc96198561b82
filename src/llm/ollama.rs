//! Ollama driver for the local fallback model.
//!
//! Talks to Ollama's native `POST /api/chat` with `stream: false`. Ollama
//! models are used without tool calling, so [`LlmRequest::tools`] is ignored.

use serde::{Deserialize, Serialize};

use super::{EngineError, LlmDriver, LlmReply, LlmRequest, LlmSettings, Message, MessageContent};

/// Chat request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// Chat response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Driver for a local Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl OllamaDriver {
    /// Create a new driver with the given settings.
    pub fn new(settings: LlmSettings) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl LlmDriver for OllamaDriver {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, req: LlmRequest) -> Result<LlmReply, EngineError> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: &req.messages,
            stream: false,
        };

        let mut rb = self.http.post(self.chat_url()).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::status(self.name(), status, &text));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        match parsed.message {
            Some(m) if !m.content.is_empty() => Ok(LlmReply::Text(MessageContent::text(m.content))),
            _ => Err(EngineError::EmptyResponse),
        }
    }
}
