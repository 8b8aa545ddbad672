//! Axum router configuration for the refinery endpoints.

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{chat, enhance, get_session, health, RefineryAppState};

/// Create the refinery API routes.
///
/// # Routes
/// - `POST /enhance` - Enrich a raw request
/// - `POST /chat` - Stream a reply as SSE
/// - `GET /sessions/:session_id` - Conversation history
/// - `GET /health` - Liveness and selected backend
pub fn refinery_routes() -> Router<RefineryAppState> {
    Router::new()
        .route("/enhance", post(enhance))
        .route("/chat", post(chat))
        .route("/sessions/:session_id", get(get_session))
        .route("/health", get(health))
}

/// Builds the CORS layer. No configured origins means any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}

/// Create the complete application router mounted at `/api`.
pub fn refinery_router(state: RefineryAppState, cors_origins: &[String]) -> Router {
    Router::new()
        .nest("/api", refinery_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::session::InMemorySessionStore;
    use crate::config::BackendConfig;
    use std::sync::Arc;

    fn state() -> RefineryAppState {
        RefineryAppState::new(
            Arc::new(InMemorySessionStore::new()),
            BackendConfig {
                force_mock: true,
                ..Default::default()
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn routes_build_with_state() {
        let _: Router<()> = refinery_routes().with_state(state());
    }

    #[test]
    fn router_builds_with_and_without_origins() {
        let _ = refinery_router(state(), &[]);
        let _ = refinery_router(state(), &["http://localhost:3000".to_string()]);
    }
}
