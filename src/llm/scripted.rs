//! Canned engine for tests and local wiring checks.
//!
//! Answers every request with the same scripted reply or failure and keeps
//! a copy of each request it saw.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{EngineError, LlmDriver, LlmReply, LlmRequest, MessageContent, ToolCall};

#[derive(Debug, Clone)]
enum Script {
    Reply(LlmReply),
    Fail,
}

/// Engine with a fixed answer.
#[derive(Debug)]
pub struct ScriptedEngine {
    name: String,
    tools: bool,
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedEngine {
    fn with_script(name: &str, script: Script) -> Self {
        Self {
            name: name.to_string(),
            tools: false,
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with `text`.
    #[must_use]
    pub fn text(name: &str, text: &str) -> Self {
        Self::content(name, MessageContent::text(text))
    }

    /// Always reply with the given content.
    #[must_use]
    pub fn content(name: &str, content: MessageContent) -> Self {
        Self::with_script(name, Script::Reply(LlmReply::Text(content)))
    }

    /// Always select `calls`, with `text` alongside. Advertises tool support.
    #[must_use]
    pub fn tool_calls(name: &str, calls: Vec<ToolCall>, text: &str) -> Self {
        Self::with_script(
            name,
            Script::Reply(LlmReply::ToolCalls {
                calls,
                content: MessageContent::text(text),
            }),
        )
        .with_tool_support()
    }

    /// Always fail with a 503.
    #[must_use]
    pub fn failing(name: &str) -> Self {
        Self::with_script(name, Script::Fail).with_tool_support()
    }

    /// Advertise tool support.
    #[must_use]
    pub fn with_tool_support(mut self) -> Self {
        self.tools = true;
        self
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmDriver for ScriptedEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_tools(&self) -> bool {
        self.tools
    }

    async fn complete(&self, req: LlmRequest) -> Result<LlmReply, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(req);
        }
        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Fail => Err(EngineError::Status {
                engine: self.name.clone(),
                status: 503,
                body: "scripted failure".to_string(),
            }),
        }
    }
}
