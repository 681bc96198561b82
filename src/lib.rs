//! Serqet brain service
//!
//! Turns a natural-language query plus conversation history into either a
//! conversational reply or a structured intent the caller executes.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP boundary, one endpoint
//! - **Pipeline**: primary model with intent tools, single handoff to a fallback model
//! - **Engines**: OpenAI-compatible chat completions, Ollama, and a keyword classifier
//!
//! # Modules
//!
//! - [`llm`]: engine trait, message model and drivers
//! - [`parser`]: content normalization and navigation directive extraction
//! - [`tools`]: the intent tool registry
//! - [`pipeline`]: the routing state machine
//! - [`server`]: HTTP boundary and startup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod tools;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::pipeline::Pipeline;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Routing pipeline with its engines and tool registry.
    pub pipeline: Arc<Pipeline>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
