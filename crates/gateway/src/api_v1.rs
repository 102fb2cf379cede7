//! HTTP API v1: the workflow surface.
//!
//! Endpoints:
//!
//! - `POST /v1/message`: run a workflow, get the collected answer
//! - `POST /v1/message/stream`: run a workflow, get the answer as SSE
//! - `GET  /v1/logs`: SSE stream of workflow progress events
//! - `GET  /v1/ping`: liveness probe

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, Sse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::info;

use windlass_config::AppConfig;
use windlass_core::error::{CapabilityError, Error};
use windlass_core::event::WorkflowEvent;
use windlass_core::payload::{Tag, WorkflowRequest};
use windlass_core::reasoner::Reasoner;
use windlass_core::tool::ToolRegistry;
use windlass_workflow::{RunnerSettings, WorkflowRunner};

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiState {
    pub reasoner: Arc<dyn Reasoner>,
    pub runner: WorkflowRunner,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedApiState = Arc<ApiState>;

impl ApiState {
    /// Assemble the shared state from capabilities built once at startup.
    pub fn new(
        config: &AppConfig,
        reasoner: Arc<dyn Reasoner>,
        registry: Arc<ToolRegistry>,
    ) -> SharedApiState {
        let settings = RunnerSettings {
            max_iterations: config.workflow.max_iterations,
            thinking_iterations: config.workflow.thinking_iterations,
            step_budget: config.workflow.step_budget,
        };
        let runner = WorkflowRunner::new(reasoner.clone(), registry).with_settings(settings);
        Arc::new(Self {
            reasoner,
            runner,
            start_time: chrono::Utc::now(),
        })
    }
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/message", post(message_handler))
        .route("/message/stream", post(message_stream_handler))
        .route("/logs", get(log_stream_handler))
        .route("/ping", get(ping_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct MessageResponse {
    chat_id: String,
    answer: String,
    tag: Tag,
    iterations: u32,
    tool_calls: u32,
}

#[derive(Serialize)]
struct PingResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `POST /v1/message`: run the workflow to completion, return the answer.
async fn message_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<WorkflowRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!(chat_id = %payload.chat_id, mode = %payload.mode, "v1/message request");
    ensure_ready(&state).await?;
    require_user_message(&payload)?;

    let chat_id = payload.chat_id.to_string();
    let collected = state
        .runner
        .run_collected(payload)
        .await
        .map_err(error_response)?;

    Ok(Json(MessageResponse {
        chat_id,
        answer: collected.answer,
        tag: collected.tag,
        iterations: collected.iterations,
        tool_calls: collected.tool_calls,
    }))
}

/// `POST /v1/message/stream`: run the workflow, relay the answer as SSE.
///
/// Each event is named after its `AnswerEvent` variant; the `complete`
/// event carries the resolved tag. A client disconnect drops the stream,
/// which stops the run at its next send.
async fn message_stream_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<WorkflowRequest>,
) -> Result<
    Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>,
    (StatusCode, Json<ErrorResponse>),
> {
    info!(chat_id = %payload.chat_id, mode = %payload.mode, "v1/message/stream SSE request");
    ensure_ready(&state).await?;
    require_user_message(&payload)?;

    let handle = state.runner.start(payload);
    let stream = handle.into_event_stream().map(|event| {
        let event_type = event.event_type().to_string();
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Ok(Sse::new(stream))
}

// ── SSE Log Stream ────────────────────────────────────────────────────────

/// `GET /v1/logs`: SSE stream of workflow progress events (node activity,
/// tool calls, tag resolution, forced finalization).
async fn log_stream_handler(
    State(state): State<SharedApiState>,
) -> Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.runner.event_bus().subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx)
        .filter_map(|result| result.ok())
        .map(|event| {
            let data = serde_json::to_string(event.as_ref()).unwrap_or_default();
            let event_name = match event.as_ref() {
                WorkflowEvent::NodeStarted { .. } => "node_started",
                WorkflowEvent::NodeFinished { .. } => "node_finished",
                WorkflowEvent::TagResolved { .. } => "tag_resolved",
                WorkflowEvent::ModeResolved { .. } => "mode_resolved",
                WorkflowEvent::ToolExecuted { .. } => "tool_executed",
                WorkflowEvent::ForcedFinalize { .. } => "forced_finalize",
                WorkflowEvent::ErrorOccurred { .. } => "error_occurred",
            };
            Ok(SseEvent::default().event(event_name).data(data))
        });

    Sse::new(stream)
}

/// `GET /v1/ping`: liveness probe. Answers even while the reasoner is down.
async fn ping_handler(State(state): State<SharedApiState>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────

/// Gate answer endpoints on reasoner readiness.
async fn ensure_ready(state: &ApiState) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    state.reasoner.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: format!("Reasoner not ready: {e}"),
            }),
        )
    })
}

fn require_user_message(
    payload: &WorkflowRequest,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if payload.messages.last_user_text().is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Conversation must contain at least one user message".into(),
            }),
        ));
    }
    Ok(())
}

fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        Error::Validation(_) | Error::Conversation(_) => StatusCode::BAD_REQUEST,
        Error::Capability(CapabilityError::NotReady(_)) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
