//! HTTP surface: request DTOs, handlers, and the API router.
//!
//! Both streaming routes follow the same lifecycle: build a fresh
//! [`RunContext`] with its event channel, hand the run to the agent, and
//! answer with the bridge's SSE stream. Failures after the stream starts
//! are in-band events; the response status is always 200.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures_util::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::agent::AgentRunner;
use crate::agent::context::{EditSpec, RunContext, RunSpec, ScaffoldSpec};
use crate::provider::PromptPart;
use crate::stream::bridge_stream;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub scaffold: Arc<dyn AgentRunner>,
    pub editor: Arc<dyn AgentRunner>,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ScaffoldRequest {
    pub user_prompt: String,
    pub app_name: String,
    pub project_path: String,
    pub brand_color: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Deserialize)]
pub struct EditRequest {
    pub project_path: String,
    pub relative_path: String,
    pub content: String,
    pub user_prompt: String,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    BadRequest(String),
    NotImplemented(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotImplemented(msg) => (StatusCode::NOT_IMPLEMENTED, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/edit", post(edit))
        .route("/preview", post(preview))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

/// Scaffold a new app. Streams progress until the agent's final summary.
async fn generate(
    State(state): State<SharedState>,
    Json(req): Json<ScaffoldRequest>,
) -> Result<Response, ApiError> {
    if req.user_prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("user_prompt must not be empty".into()));
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let ctx = Arc::new(RunContext::new(
        RunSpec::Scaffold(ScaffoldSpec {
            project_path: req.project_path,
            app_name: req.app_name,
            brand_color: req.brand_color,
        }),
        tx,
    ));
    tracing::info!(run_id = %ctx.run_id, "starting scaffold run");

    let mut parts = vec![PromptPart::Text(req.user_prompt)];
    parts.extend(req.image_urls.into_iter().map(PromptPart::ImageUrl));

    let task = state.scaffold.spawn_run(parts, ctx.clone());
    Ok(sse_response(bridge_stream(ctx, rx, task)))
}

/// Apply a requested change to one existing file.
async fn edit(
    State(state): State<SharedState>,
    Json(req): Json<EditRequest>,
) -> Result<Response, ApiError> {
    if req.user_prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("user_prompt must not be empty".into()));
    }
    if req.relative_path.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "relative_path must not be empty".into(),
        ));
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let ctx = Arc::new(RunContext::new(
        RunSpec::Edit(EditSpec {
            project_path: req.project_path,
            relative_path: req.relative_path,
            content: req.content,
        }),
        tx,
    ));
    tracing::info!(run_id = %ctx.run_id, "starting edit run");

    let task = state
        .editor
        .spawn_run(vec![PromptPart::Text(req.user_prompt)], ctx.clone());
    Ok(sse_response(bridge_stream(ctx, rx, task)))
}

/// Device preview is not built yet; fail before any streaming begins.
async fn preview() -> ApiError {
    ApiError::NotImplemented("preview is not implemented".into())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Wrap a frame stream as an SSE response with proxy-friendly headers.
fn sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    );
    (
        [("cache-control", "no-cache"), ("x-accel-buffering", "no")],
        sse,
    )
        .into_response()
}
