//! HTTP handlers for the refinery endpoints.
//!
//! Each request gets its own cancellation token. The token's drop guard lives
//! as long as the request future (or, for chat, the response body), so a
//! client that disconnects cancels any in-flight backend call.

use std::convert::Infallible;
use std::sync::Arc;

use async_stream::stream;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::adapters::backends::Backend;
use crate::application::{
    EnrichPromptCommand, EnrichPromptHandler, ExecuteChatCommand, ExecuteChatHandler, PromptRole,
};
use crate::config::BackendConfig;
use crate::domain::enrichment::IntentLevel;
use crate::domain::foundation::SessionId;
use crate::ports::{ModelBackend, SessionStore};

use super::dto::{
    ChatRequest, EnhanceRequest, EnhanceResponse, HealthResponse, SessionHistoryResponse,
};
use super::error::ApiError;
use super::sse;

/// Response header carrying the session a chat stream belongs to.
pub const SESSION_HEADER: &str = "x-session-id";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the refinery endpoints.
///
/// The backend is rebuilt from configuration for every request.
#[derive(Clone)]
pub struct RefineryAppState {
    pub session_store: Arc<dyn SessionStore>,
    pub backend_config: Arc<BackendConfig>,
    pub http_client: reqwest::Client,
}

impl RefineryAppState {
    pub fn new(
        session_store: Arc<dyn SessionStore>,
        backend_config: BackendConfig,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            session_store,
            backend_config: Arc::new(backend_config),
            http_client,
        }
    }

    /// Selects and builds the backend for one request.
    pub fn backend(&self) -> Backend {
        Backend::from_config(&self.backend_config, self.http_client.clone())
    }

    pub fn enrich_prompt_handler(&self) -> EnrichPromptHandler {
        EnrichPromptHandler::new(Arc::new(self.backend()))
    }

    pub fn execute_chat_handler(&self) -> ExecuteChatHandler {
        ExecuteChatHandler::new(Arc::new(self.backend()), self.session_store.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Enrichment
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/enhance
pub async fn enhance(
    State(state): State<RefineryAppState>,
    payload: Result<Json<EnhanceRequest>, JsonRejection>,
) -> Result<Json<EnhanceResponse>, ApiError> {
    let Json(request) = payload?;
    let session_id = request.validate()?;

    let mut cmd = EnrichPromptCommand::new(request.text)
        .with_intent_level(IntentLevel::parse_or_default(request.intent_level.as_deref()));
    if let Some(session_id) = session_id {
        cmd = cmd.with_session(session_id);
    }

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let result = state.enrich_prompt_handler().handle(cmd, cancel).await?;
    Ok(Json(result.into()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Chat
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/chat
///
/// Streams the reply as SSE frames. The stream always ends with a
/// `[DONE]` frame unless the client went away first.
pub async fn chat(
    State(state): State<RefineryAppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let session_id = request.validate()?.unwrap_or_default();

    let cmd = ExecuteChatCommand::new(
        session_id.clone(),
        request.prompt,
        PromptRole::for_enhanced(request.use_enhanced),
    );

    let cancel = CancellationToken::new();
    let mut events = state.execute_chat_handler().handle(cmd, cancel.clone())?;
    let guard = cancel.drop_guard();

    let frames = stream! {
        let _guard = guard;
        while let Some(event) = events.next().await {
            if let Some(frame) = sse::event_frame(&event) {
                yield Ok::<_, Infallible>(frame);
            }
            if event.is_terminal() {
                break;
            }
        }
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        [(HeaderName::from_static(SESSION_HEADER), session_id.to_string())],
        Body::from_stream(frames),
    )
        .into_response())
}

// ════════════════════════════════════════════════════════════════════════════════
// Sessions
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/sessions/:session_id
pub async fn get_session(
    State(state): State<RefineryAppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionHistoryResponse>, ApiError> {
    let session_id = SessionId::parse(session_id)?;
    let messages = state
        .session_store
        .history(&session_id)
        .await
        .map_err(ApiError::Storage)?;

    if messages.is_empty() {
        return Err(ApiError::SessionNotFound(session_id));
    }

    Ok(Json(SessionHistoryResponse {
        session_id: session_id.to_string(),
        messages,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Health
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/health
pub async fn health(State(state): State<RefineryAppState>) -> impl IntoResponse {
    let backend = state.backend();
    let info = backend.describe();

    Json(HealthResponse {
        status: "ok".to_string(),
        backend: backend.kind().as_str().to_string(),
        model: info.model,
    })
}
