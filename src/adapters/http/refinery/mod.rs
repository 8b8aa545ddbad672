//! HTTP adapter for the refinery endpoints.
//!
//! - `POST /api/enhance` - Enrich a raw request into a better prompt
//! - `POST /api/chat` - Execute a prompt, streaming the reply as SSE
//! - `GET /api/sessions/:session_id` - Conversation history
//! - `GET /api/health` - Liveness and selected backend

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;

pub use dto::*;
pub use error::ApiError;
pub use handlers::{RefineryAppState, SESSION_HEADER};
pub use routes::{cors_layer, refinery_router, refinery_routes};
