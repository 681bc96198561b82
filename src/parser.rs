//! Reply text handling: content normalization and navigation directives.
//!
//! A model reply may embed a directive such as `ACTION: view_finance` telling
//! the client which module to open. On the primary path the directive is
//! captured and removed from the visible message; on the fallback path the
//! reply is only scanned for a known `view_` token and left untouched.

use std::sync::LazyLock;

use regex::Regex;

use crate::llm::MessageContent;

/// Navigation tokens recognized on the fallback path, in priority order.
pub const FALLBACK_ACTIONS: [&str; 4] = ["view_social", "view_finance", "view_task", "view_jobs"];

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ACTION:\s*(view_\w+)").expect("directive pattern is valid"));

/// Result of scanning a reply for a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Text shown to the user.
    pub message: String,
    /// Captured navigation action, e.g. `view_finance`.
    pub action: Option<String>,
}

/// Reduce a reply payload to plain text.
///
/// Plain text is returned as is. Segmented content yields its first text
/// segment, or the JSON form of the whole payload when no segment carries text.
#[must_use]
pub fn normalize(content: &MessageContent) -> String {
    match content {
        MessageContent::Text { content } => content.clone(),
        MessageContent::Parts { content: parts } => {
            parts.iter().find_map(|p| p.text.clone()).unwrap_or_else(|| {
                serde_json::to_string(parts).unwrap_or_else(|_| format!("{parts:?}"))
            })
        }
    }
}

/// Capture the first `ACTION: view_<name>` directive and strip directives from the text.
///
/// Only the first directive sets the action. Every directive is removed so
/// the cleaned text never carries one, and the result is trimmed.
#[must_use]
pub fn extract_action(text: &str) -> Extracted {
    let Some(caps) = DIRECTIVE.captures(text) else {
        return Extracted {
            message: text.trim().to_string(),
            action: None,
        };
    };

    let action = caps.get(1).map(|m| m.as_str().to_string());
    let message = DIRECTIVE.replace_all(text, "").trim().to_string();
    Extracted { message, action }
}

/// Find the first known navigation token anywhere in the text.
///
/// Case-sensitive substring search; the text itself is not modified.
#[must_use]
pub fn detect_keyword_action(text: &str) -> Option<String> {
    FALLBACK_ACTIONS
        .iter()
        .find(|token| text.contains(*token))
        .map(|token| (*token).to_string())
}
