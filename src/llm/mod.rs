//! Language-model engines behind the routing pipeline.
//!
//! This module provides the request/reply model shared by every engine and
//! the [`LlmDriver`] trait the pipeline calls through. Engines are built once
//! at startup from [`LlmSettings`] and handed to the pipeline as trait
//! objects.
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: OpenAI-compatible `/chat/completions` with tool calling
//! - [`OllamaDriver`]: local Ollama `/api/chat`, text only
//! - [`KeywordEngine`]: offline keyword classifier, text only
//!
//! # Example
//!
//! ```rust,ignore
//! use serqet_brain::llm::{build_engine, LlmProtocol, LlmSettings, Provider};
//!
//! let settings = LlmSettings {
//!     base_url: "http://localhost:11434".to_string(),
//!     api_key: None,
//!     model: "llama3.2".to_string(),
//!     protocol: LlmProtocol::Ollama,
//!     provider: Provider::Generic,
//!     timeout: std::time::Duration::from_secs(30),
//! };
//! let engine = build_engine(settings)?;
//! ```

pub mod chat_completions;
pub mod error;
pub mod keyword;
pub mod ollama;
pub mod provider;
pub mod scripted;

pub use chat_completions::ChatCompletionsDriver;
pub use error::EngineError;
pub use keyword::KeywordEngine;
pub use ollama::OllamaDriver;
pub use provider::Provider;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Model connection settings for one engine.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the model API (e.g., `http://localhost:11434`).
    pub base_url: String,
    /// Optional API key for bearer authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gemini-2.0-flash`, `llama3.2`).
    pub model: String,
    /// Wire protocol the engine speaks.
    pub protocol: LlmProtocol,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
    /// Per-call timeout enforced by the HTTP client.
    pub timeout: Duration,
}

/// How an engine reaches its model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LlmProtocol {
    /// Pick `Ollama` for the default Ollama port, `Chat` otherwise.
    #[default]
    Auto,
    /// OpenAI-compatible Chat Completions API.
    Chat,
    /// Ollama native `/api/chat`.
    Ollama,
    /// Built-in keyword classifier, no network.
    Rules,
    /// No engine at all.
    Disabled,
}

impl LlmProtocol {
    /// Parse a protocol name from configuration. Unknown names map to `Auto`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "chat" | "openai" => Self::Chat,
            "ollama" | "local" => Self::Ollama,
            "rules" | "keywords" => Self::Rules,
            "none" | "disabled" | "off" => Self::Disabled,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against a base URL.
    #[must_use]
    pub fn resolve(self, base_url: &str) -> Self {
        match self {
            Self::Auto if base_url.contains(":11434") => Self::Ollama,
            Self::Auto => Self::Chat,
            other => other,
        }
    }
}

/// A message in the assembled prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Content of the message.
    #[serde(flatten)]
    pub content: MessageContent,
}

impl Message {
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::text(text),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::text(text),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::text(text),
        }
    }
}

/// Message payload: plain text or an ordered list of typed segments.
///
/// Providers disagree on the reply shape. Most send a string, some send
/// `[{"type": "text", "text": "..."}, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text { content: String },
    /// Segmented content.
    Parts { content: Vec<ContentPart> },
}

impl MessageContent {
    /// Create plain text content.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { content: s.into() }
    }

    /// Create segmented content.
    #[must_use]
    pub fn parts(parts: Vec<ContentPart>) -> Self {
        Self::Parts { content: parts }
    }

    /// Read a provider `content` field, which may be a string, an array of
    /// segments, null, or something unexpected.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::text(""),
            serde_json::Value::String(s) => Self::text(s.clone()),
            serde_json::Value::Array(items) => Self::parts(
                items
                    .iter()
                    .map(|item| {
                        serde_json::from_value(item.clone()).unwrap_or_else(|_| ContentPart {
                            kind: "unknown".to_string(),
                            text: None,
                        })
                    })
                    .collect(),
            ),
            other => Self::text(other.to_string()),
        }
    }

    /// The text itself, or the first segment that carries text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content } => Some(content),
            Self::Parts { content } => content.iter().find_map(|p| p.text.as_deref()),
        }
    }

    /// Check if the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text { content } => content.is_empty(),
            Self::Parts { content } => content.is_empty(),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::text("")
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

/// One segment of segmented content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Segment kind (`text`, `thinking`, `image_url`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Text carried by the segment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentPart {
    /// Create a text segment.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(s.into()),
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

impl MessageRole {
    /// Map a caller-supplied history role. Anything that is not `user` or
    /// `system` is an earlier assistant turn.
    #[must_use]
    pub fn from_history(role: &str) -> Self {
        match role {
            "user" => Self::User,
            "system" => Self::System,
            _ => Self::Assistant,
        }
    }
}

/// A tool the model chose, with its decoded arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tool/function name.
    pub name: String,
    /// Arguments exactly as the model supplied them.
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// Request to an engine.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Prompt messages, system directive first.
    pub messages: Vec<Message>,
    /// Available tools in OpenAI function schema format. Empty disables tool calling.
    pub tools: Vec<serde_json::Value>,
}

/// What an engine answered.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmReply {
    /// The model selected one or more tools.
    ToolCalls {
        /// Selected tools, in the order the model listed them.
        calls: Vec<ToolCall>,
        /// Any text the model sent alongside.
        content: MessageContent,
    },
    /// The model replied in text.
    Text(MessageContent),
}

/// Trait for non-streaming model engines.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Whether the engine honors [`LlmRequest::tools`].
    fn supports_tools(&self) -> bool {
        false
    }

    /// Send the prompt and wait for the full reply.
    async fn complete(&self, req: LlmRequest) -> Result<LlmReply, EngineError>;
}

/// Build the engine described by `settings`. Returns `None` for
/// [`LlmProtocol::Disabled`].
pub fn build_engine(settings: LlmSettings) -> Result<Option<Arc<dyn LlmDriver>>, EngineError> {
    let engine: Arc<dyn LlmDriver> = match settings.protocol.resolve(&settings.base_url) {
        LlmProtocol::Disabled => return Ok(None),
        LlmProtocol::Rules => Arc::new(KeywordEngine::new()),
        LlmProtocol::Ollama => Arc::new(OllamaDriver::new(settings)?),
        LlmProtocol::Chat | LlmProtocol::Auto => Arc::new(ChatCompletionsDriver::new(settings)?),
    };
    Ok(Some(engine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serializes_openai_shape() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_content_from_segments() {
        let content = MessageContent::from_json(&json!([
            {"type": "thinking", "thinking": "hmm"},
            {"type": "text", "text": "Hello", "extras": {"signature": "abc"}}
        ]));
        assert_eq!(content.as_text(), Some("Hello"));
    }

    #[test]
    fn test_content_from_null_is_empty() {
        assert!(MessageContent::from_json(&serde_json::Value::Null).is_empty());
    }

    #[test]
    fn test_history_roles() {
        assert_eq!(MessageRole::from_history("user"), MessageRole::User);
        assert_eq!(MessageRole::from_history("assistant"), MessageRole::Assistant);
        assert_eq!(MessageRole::from_history("serqet"), MessageRole::Assistant);
        assert_eq!(MessageRole::from_history("system"), MessageRole::System);
    }

    #[test]
    fn test_protocol_parse_and_resolve() {
        assert_eq!(LlmProtocol::parse("Ollama"), LlmProtocol::Ollama);
        assert_eq!(LlmProtocol::parse("none"), LlmProtocol::Disabled);
        assert_eq!(LlmProtocol::parse("rules"), LlmProtocol::Rules);
        assert_eq!(
            LlmProtocol::Auto.resolve("http://localhost:11434"),
            LlmProtocol::Ollama
        );
        assert_eq!(
            LlmProtocol::Auto.resolve("https://api.openai.com"),
            LlmProtocol::Chat
        );
    }

    #[test]
    fn test_build_disabled_engine() {
        let settings = LlmSettings {
            base_url: String::new(),
            api_key: None,
            model: String::new(),
            protocol: LlmProtocol::Disabled,
            provider: Provider::Generic,
            timeout: Duration::from_secs(1),
        };
        assert!(build_engine(settings).unwrap().is_none());
    }
}
