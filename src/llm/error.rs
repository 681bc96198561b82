//! Engine error types.

use thiserror::Error;

/// Errors from a model engine call.
///
/// The pipeline never surfaces these to the caller: any error from the
/// primary engine triggers the fallback, any error from the fallback
/// triggers the apology reply.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Transport failure, timeout, or client construction failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API answered with a non-success status.
    #[error("{engine} returned status {status}: {body}")]
    Status {
        /// Engine name.
        engine: String,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body was not in the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The response carried neither text nor tool calls.
    #[error("Response contained no message")]
    EmptyResponse,
}

impl EngineError {
    /// Build a `Status` error, keeping at most 512 bytes of the body.
    pub(crate) fn status(engine: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let mut end = body.len().min(512);
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        Self::Status {
            engine: engine.to_string(),
            status: status.as_u16(),
            body: body[..end].to_string(),
        }
    }
}
