use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::llm::{Message, MessageContent, MessageRole, build_engine};
use crate::pipeline::{Pipeline, PipelineState};
use crate::tools::ToolRegistry;

/// Route of the single intent endpoint.
pub const PROCESS_INTENT_PATH: &str = "/brain/v1/process_intent";

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let timeout = config.engines.timeout();
    let primary_settings = config.engines.primary.to_settings(timeout);
    let fallback_settings = config.engines.fallback.to_settings(timeout);

    info!(
        name: "engine.config.loaded",
        primary_url = %primary_settings.base_url,
        primary_model = %primary_settings.model,
        primary_key_set = primary_settings.api_key.is_some(),
        fallback_url = %fallback_settings.base_url,
        fallback_model = %fallback_settings.model,
        fallback_protocol = ?fallback_settings.protocol,
        "Engine configuration loaded"
    );

    let Some(primary) = build_engine(primary_settings)? else {
        anyhow::bail!("the primary engine cannot be disabled");
    };
    let fallback = build_engine(fallback_settings)?;
    if fallback.is_none() {
        tracing::warn!("No fallback engine, a primary failure goes straight to the apology");
    }

    let tools = ToolRegistry::builtin();
    for tool in tools.tools() {
        info!(name: "tool.registered", tool_name = %tool.name, "Intent tool registered");
    }

    let state = AppState {
        pipeline: Arc::new(Pipeline::new(primary, fallback, tools)),
        config: Arc::clone(&config),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router over prepared state.
pub fn build_router(state: AppState) -> Router {
    let timeout_duration = state.config.request_timeout();

    Router::new()
        .route(PROCESS_INTENT_PATH, post(process_intent))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB limit
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let duration = timeout_duration;
                async move {
                    match tokio::time::timeout(duration, next.run(req)).await {
                        Ok(res) => res,
                        Err(_) => {
                            (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
                        }
                    }
                }
            },
        ))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// One earlier turn supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    /// `user`, `assistant`, `system`, or the gateway's own label.
    pub role: String,
    pub text: String,
}

impl From<HistoryMessage> for Message {
    fn from(turn: HistoryMessage) -> Self {
        Self {
            role: MessageRole::from_history(&turn.role),
            content: MessageContent::text(turn.text),
        }
    }
}

/// Request body for the intent API.
#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub user_id: String,
    /// New user query. Empty text is passed through.
    pub query: String,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

/// Response from the intent API.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct IntentResponse {
    /// Always `"success"`: engine failures degrade to the apology text.
    pub status: String,
    pub message: String,
    /// `execute_<tool>`, `view_<module>`, or null.
    pub action: Option<String>,
    /// Raw tool arguments when a tool was selected.
    pub data: Option<Map<String, Value>>,
}

impl From<PipelineState> for IntentResponse {
    fn from(state: PipelineState) -> Self {
        Self {
            status: "success".to_string(),
            message: state.reply().to_string(),
            action: state.action,
            data: state.tool_data,
        }
    }
}

/// Errors raised at the HTTP boundary, before the pipeline runs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidBody(rejection) => rejection.status(),
        };
        let body = serde_json::json!({
            "status": "error",
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// POST /brain/v1/process_intent - Route one query through the pipeline.
async fn process_intent(
    State(state): State<AppState>,
    payload: Result<Json<IntentRequest>, JsonRejection>,
) -> Result<Json<IntentResponse>, ApiError> {
    let Json(req) = payload.inspect_err(|e| {
        tracing::warn!(error = %e.body_text(), "Rejected intent request");
    })?;

    tracing::info!(
        user_id = %req.user_id,
        history_len = req.history.len(),
        "Received intent request"
    );

    let history = req.history.into_iter().map(Message::from).collect();
    let result = state.pipeline.run(history, &req.query).await;

    tracing::debug!(
        user_id = %req.user_id,
        request_id = %result.request_id,
        "Intent request answered"
    );

    Ok(Json(IntentResponse::from(result)))
}
