//! OpenAI-compatible Chat Completions driver.
//!
//! This module implements the [`LlmDriver`] trait for `/chat/completions`
//! endpoints (OpenAI, Gemini's OpenAI surface, Groq, ...). Calls are
//! non-streaming; the whole reply is decoded into an [`LlmReply`].

use serde_json::Value;

use super::{EngineError, LlmDriver, LlmReply, LlmRequest, LlmSettings, MessageContent, ToolCall};

/// Driver for OpenAI-compatible Chat Completions APIs.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
    url: String,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("url", &self.url)
            .field("model", &self.settings.model)
            .field("has_api_key", &self.settings.api_key.is_some())
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new driver with the given settings.
    pub fn new(settings: LlmSettings) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        let url = settings.provider.build_chat_url(&settings.base_url);
        Ok(Self {
            http,
            settings,
            url,
        })
    }
}

#[async_trait::async_trait]
impl LlmDriver for ChatCompletionsDriver {
    fn name(&self) -> &str {
        "chat_completions"
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn complete(&self, req: LlmRequest) -> Result<LlmReply, EngineError> {
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": req.messages,
        });
        if !req.tools.is_empty() {
            body["tools"] = Value::Array(req.tools);
        }

        let mut rb = self.http.post(&self.url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::status(self.name(), status, &text));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;
        parse_completion(&v)
    }
}

/// Decode a non-streaming chat completion body.
pub(crate) fn parse_completion(v: &Value) -> Result<LlmReply, EngineError> {
    let message = v
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or(EngineError::EmptyResponse)?;

    let content = MessageContent::from_json(message.get("content").unwrap_or(&Value::Null));

    // Only the first call is acted on; later ones are kept when they decode.
    let calls = match message
        .get("tool_calls")
        .and_then(Value::as_array)
        .and_then(|arr| arr.split_first())
    {
        Some((first, rest)) => std::iter::once(parse_tool_call(first)?)
            .chain(rest.iter().filter_map(|tc| parse_tool_call(tc).ok()))
            .collect(),
        None => Vec::new(),
    };

    if !calls.is_empty() {
        return Ok(LlmReply::ToolCalls { calls, content });
    }
    if content.is_empty() {
        return Err(EngineError::EmptyResponse);
    }
    Ok(LlmReply::Text(content))
}

fn parse_tool_call(tc: &Value) -> Result<ToolCall, EngineError> {
    let function = tc
        .get("function")
        .ok_or_else(|| EngineError::Decode("tool call without function".to_string()))?;
    let name = function
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::Decode("tool call without name".to_string()))?
        .to_string();

    // Arguments arrive as a JSON string; some providers send the object directly.
    let arguments = match function.get("arguments") {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::String(s)) if s.trim().is_empty() => serde_json::Map::new(),
        Some(Value::String(s)) => serde_json::from_str(s)
            .map_err(|e| EngineError::Decode(format!("arguments for {name}: {e}")))?,
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(EngineError::Decode(format!(
                "arguments for {name} is not an object: {other}"
            )));
        }
    };

    Ok(ToolCall {
        id: tc.get("id").and_then(Value::as_str).map(ToString::to_string),
        name,
        arguments,
    })
}
