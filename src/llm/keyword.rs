//! Offline keyword classifier.
//!
//! Answers without a model: the latest user message is matched against
//! fixed keyword sets and the reply names the module to open. Useful as a
//! fallback when no local model is installed.

use super::{EngineError, LlmDriver, LlmReply, LlmRequest, MessageContent, MessageRole};

/// Keyword set and canned reply per module, checked in order. Keywords match
/// whole words (a trailing plural `s` allowed); `$` matches anywhere.
const RULES: &[(&[&str], &str)] = &[
    (
        &["tweet", "post", "linkedin", "facebook", "social", "draft"],
        "Opening your Social Hub so you can work on that post. view_social",
    ),
    (
        &["spent", "spend", "paid", "expense", "bought", "bill", "budget", "$"],
        "Opening Finances so you can log that. view_finance",
    ),
    (
        &["remind", "todo", "to-do", "task", "deadline", "follow up"],
        "Opening your tasks. view_task",
    ),
    (
        &["job", "applied", "apply", "interview", "recruiter", "offer"],
        "Opening the job tracker. view_jobs",
    ),
];

const NO_MATCH: &str =
    "I'm running in offline mode and couldn't tell which module you need. Could you rephrase?";

/// Rule-based engine with no network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordEngine;

impl KeywordEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pick the canned reply for a query.
    #[must_use]
    pub fn classify(query: &str) -> &'static str {
        let lower = query.to_lowercase();
        let tokens = words(&lower);
        RULES
            .iter()
            .find(|(keywords, _)| {
                keywords.iter().any(|k| match *k {
                    "$" => lower.contains('$'),
                    phrase => mentions(&tokens, phrase),
                })
            })
            .map_or(NO_MATCH, |(_, reply)| reply)
    }
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whether `phrase` appears as a run of whole words in `tokens`.
fn mentions(tokens: &[&str], phrase: &str) -> bool {
    let needle = words(phrase);
    !needle.is_empty()
        && tokens.windows(needle.len()).any(|window| {
            window
                .iter()
                .zip(&needle)
                .all(|(word, key)| word == key || word.strip_suffix('s') == Some(*key))
        })
}

#[async_trait::async_trait]
impl LlmDriver for KeywordEngine {
    fn name(&self) -> &str {
        "keywords"
    }

    async fn complete(&self, req: LlmRequest) -> Result<LlmReply, EngineError> {
        let query = req
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .and_then(|m| m.content.as_text())
            .unwrap_or_default();
        Ok(LlmReply::Text(MessageContent::text(Self::classify(query))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    #[test]
    fn test_classify_modules() {
        assert!(KeywordEngine::classify("Draft a LinkedIn post").ends_with("view_social"));
        assert!(KeywordEngine::classify("I spent $12 on lunch").ends_with("view_finance"));
        assert!(KeywordEngine::classify("remind me to call mom").ends_with("view_task"));
        assert!(KeywordEngine::classify("I applied at Acme").ends_with("view_jobs"));
        assert_eq!(KeywordEngine::classify("hello"), NO_MATCH);
    }

    #[test]
    fn test_classify_whole_words_only() {
        assert_eq!(KeywordEngine::classify("Let's postpone the meeting"), NO_MATCH);
        assert_eq!(KeywordEngine::classify("a billion reasons"), NO_MATCH);
        assert!(KeywordEngine::classify("Schedule two tweets").ends_with("view_social"));
        assert!(KeywordEngine::classify("I need to follow up with Acme").ends_with("view_task"));
        assert!(KeywordEngine::classify("add a to-do").ends_with("view_task"));
        assert!(KeywordEngine::classify("it cost $5").ends_with("view_finance"));
    }

    #[tokio::test]
    async fn test_uses_latest_user_message() {
        let req = LlmRequest {
            messages: vec![
                Message::system("persona"),
                Message::user("I paid the electric bill"),
                Message::assistant("Noted."),
                Message::user("now remind me about the dentist"),
            ],
            tools: Vec::new(),
        };
        let reply = KeywordEngine::new().complete(req).await.unwrap();
        let LlmReply::Text(content) = reply else {
            panic!("expected text");
        };
        assert!(content.as_text().unwrap().ends_with("view_task"));
    }
}
