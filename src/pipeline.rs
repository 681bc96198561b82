//! The routing pipeline.
//!
//! One request runs one pass through a small state machine:
//!
//! ```text
//! Start -> PrimaryAttempt -> Done(ToolSelected | TextReply)
//!                 |
//!                 +-> FallbackAttempt -> Done(TextReply | TotalFailure)
//! ```
//!
//! The primary engine gets the intent tools. If it fails for any reason the
//! fallback engine gets the same prompt without tools, and its reply is only
//! scanned for a known `view_` token. If that fails too the caller gets a
//! fixed apology. Nothing is retried beyond that single handoff.

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::llm::{LlmDriver, LlmReply, LlmRequest, Message, MessageRole};
use crate::parser;
use crate::tools::ToolRegistry;

/// Persona and routing instructions prepended to every prompt.
pub const SYSTEM_DIRECTIVE: &str = "You are Serqet, a 2026-era personal assistant. \
Logic: If a tool is needed, call it. If not, respond concisely. \
Always include 'ACTION: view_<module>' if navigating manually.";

/// Reply when neither engine answered.
pub const APOLOGY: &str =
    "I'm sorry, my cognitive engines are offline right now. Please try again in a moment.";

/// Reply when a tool was selected and the model sent no text with it.
pub const TOOL_PENDING_MESSAGE: &str = "Action processing...";

/// Prefix of the action emitted for a selected tool.
pub const EXECUTE_PREFIX: &str = "execute_";

/// Terminal result of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The primary model chose a tool.
    ToolSelected {
        tool_name: String,
        arguments: Map<String, Value>,
        message: String,
    },
    /// A model replied in text, possibly with a navigation action.
    TextReply {
        message: String,
        action: Option<String>,
    },
    /// Both engines failed.
    TotalFailure,
}

#[derive(Debug)]
enum Stage {
    Start,
    PrimaryAttempt,
    FallbackAttempt,
    Done(Outcome),
}

/// Per-request state. Built from the caller's history, discarded after the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    /// Correlation id for logs.
    pub request_id: String,
    /// Prompt messages, ending with the final assistant reply once done.
    pub messages: Vec<Message>,
    /// `execute_<tool>` or `view_<module>`.
    pub action: Option<String>,
    /// Raw tool arguments when a tool was selected.
    pub tool_data: Option<Map<String, Value>>,
}

impl PipelineState {
    fn new(history: Vec<Message>, query: &str) -> Self {
        let mut messages = history;
        messages.push(Message::user(query));
        Self {
            request_id: Uuid::new_v4().to_string(),
            messages,
            action: None,
            tool_data: None,
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        let (message, action, tool_data) = match outcome {
            Outcome::ToolSelected {
                tool_name,
                arguments,
                message,
            } => (
                message,
                Some(format!("{EXECUTE_PREFIX}{tool_name}")),
                Some(arguments),
            ),
            Outcome::TextReply { message, action } => (message, action, None),
            Outcome::TotalFailure => (APOLOGY.to_string(), None, None),
        };
        self.messages.push(Message::assistant(message));
        self.action = action;
        self.tool_data = tool_data;
    }

    /// Text of the final assistant message.
    #[must_use]
    pub fn reply(&self) -> &str {
        self.messages
            .last()
            .filter(|m| m.role == MessageRole::Assistant)
            .and_then(|m| m.content.as_text())
            .unwrap_or_default()
    }
}

/// Primary/fallback routing over the intent tools.
#[derive(Clone)]
pub struct Pipeline {
    primary: Arc<dyn LlmDriver>,
    fallback: Option<Arc<dyn LlmDriver>>,
    tools: ToolRegistry,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.as_ref().map(|e| e.name()))
            .field("tools", &self.tools)
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline over the given engines.
    pub fn new(
        primary: Arc<dyn LlmDriver>,
        fallback: Option<Arc<dyn LlmDriver>>,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            primary,
            fallback,
            tools,
        }
    }

    /// Run one request to completion.
    ///
    /// Never fails: engine errors end in the fallback reply or the apology.
    pub async fn run(&self, history: Vec<Message>, query: &str) -> PipelineState {
        let mut state = PipelineState::new(history, query);
        let mut stage = Stage::Start;

        loop {
            stage = match stage {
                Stage::Start => {
                    state.messages.insert(0, Message::system(SYSTEM_DIRECTIVE));
                    tracing::debug!(
                        request_id = %state.request_id,
                        message_count = state.messages.len(),
                        "Prompt assembled"
                    );
                    Stage::PrimaryAttempt
                }
                Stage::PrimaryAttempt => self.primary_attempt(&state).await,
                Stage::FallbackAttempt => self.fallback_attempt(&state).await,
                Stage::Done(outcome) => {
                    state.finish(outcome);
                    tracing::info!(
                        request_id = %state.request_id,
                        action = ?state.action,
                        has_tool_data = state.tool_data.is_some(),
                        "Pipeline complete"
                    );
                    return state;
                }
            };
        }
    }

    async fn primary_attempt(&self, state: &PipelineState) -> Stage {
        let tools = if self.primary.supports_tools() {
            self.tools.openai_tools_json()
        } else {
            Vec::new()
        };
        let req = LlmRequest {
            messages: state.messages.clone(),
            tools,
        };

        match self.primary.complete(req).await {
            Ok(LlmReply::ToolCalls { calls, content }) => {
                let offered = calls.len();
                let Some(call) = calls.into_iter().next() else {
                    return Stage::Done(Self::text_outcome(&content));
                };
                if offered > 1 {
                    tracing::info!(
                        request_id = %state.request_id,
                        offered = offered,
                        kept = %call.name,
                        "Model offered several tool calls, keeping the first"
                    );
                }

                match self.tools.capture(&call.name, &call.arguments) {
                    Ok(record) => tracing::debug!(
                        request_id = %state.request_id,
                        tool_name = %call.name,
                        intent = ?record.intent,
                        "Intent captured"
                    ),
                    Err(e) => tracing::warn!(
                        request_id = %state.request_id,
                        tool_name = %call.name,
                        error = %e,
                        "Tool selection does not match the registry, passing it through"
                    ),
                }

                let text = parser::normalize(&content).trim().to_string();
                let message = if text.is_empty() {
                    TOOL_PENDING_MESSAGE.to_string()
                } else {
                    text
                };
                tracing::info!(
                    request_id = %state.request_id,
                    engine = self.primary.name(),
                    tool_name = %call.name,
                    "Tool selected"
                );
                Stage::Done(Outcome::ToolSelected {
                    tool_name: call.name,
                    arguments: call.arguments,
                    message,
                })
            }
            Ok(LlmReply::Text(content)) => {
                tracing::info!(
                    request_id = %state.request_id,
                    engine = self.primary.name(),
                    "Primary engine replied in text"
                );
                Stage::Done(Self::text_outcome(&content))
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %state.request_id,
                    engine = self.primary.name(),
                    error = %e,
                    "Primary engine failed, handing off to fallback"
                );
                Stage::FallbackAttempt
            }
        }
    }

    async fn fallback_attempt(&self, state: &PipelineState) -> Stage {
        let Some(fallback) = &self.fallback else {
            tracing::error!(
                request_id = %state.request_id,
                "Primary engine failed and no fallback is configured"
            );
            return Stage::Done(Outcome::TotalFailure);
        };

        let req = LlmRequest {
            messages: state.messages.clone(),
            tools: Vec::new(),
        };

        match fallback.complete(req).await {
            Ok(reply) => {
                // No tool contract here: only the text counts.
                let content = match reply {
                    LlmReply::Text(content) | LlmReply::ToolCalls { content, .. } => content,
                };
                let message = parser::normalize(&content);
                let action = parser::detect_keyword_action(&message);
                tracing::info!(
                    request_id = %state.request_id,
                    engine = fallback.name(),
                    action = ?action,
                    "Fallback engine replied"
                );
                Stage::Done(Outcome::TextReply { message, action })
            }
            Err(e) => {
                tracing::error!(
                    request_id = %state.request_id,
                    engine = fallback.name(),
                    error = %e,
                    "Fallback engine failed"
                );
                Stage::Done(Outcome::TotalFailure)
            }
        }
    }

    fn text_outcome(content: &crate::llm::MessageContent) -> Outcome {
        let extracted = parser::extract_action(&parser::normalize(content));
        Outcome::TextReply {
            message: extracted.message,
            action: extracted.action,
        }
    }
}
