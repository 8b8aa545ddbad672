//! Request and response DTOs for the refinery endpoints.
//!
//! Validation of caller input happens here, before any application handler
//! runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::application::EnrichPromptResult;
use crate::domain::foundation::{SessionId, ValidationError};
use crate::ports::Message;

/// Longest accepted `text` or `prompt`, in characters.
pub const MAX_REQUEST_CHARS: usize = 100_000;

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/enhance body.
#[derive(Debug, Clone, Deserialize)]
pub struct EnhanceRequest {
    pub text: String,
    pub session_id: Option<String>,
    pub intent_level: Option<String>,
}

impl EnhanceRequest {
    /// Validates the text and parses the optional session id.
    pub fn validate(&self) -> Result<Option<SessionId>, ValidationError> {
        validate_text("text", &self.text)?;
        parse_session(self.session_id.as_deref())
    }
}

/// POST /api/chat body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub use_enhanced: bool,
}

impl ChatRequest {
    /// Validates the prompt and parses the optional session id.
    pub fn validate(&self) -> Result<Option<SessionId>, ValidationError> {
        validate_text("prompt", &self.prompt)?;
        parse_session(self.session_id.as_deref())
    }
}

fn validate_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    let chars = value.chars().count();
    if chars > MAX_REQUEST_CHARS {
        return Err(ValidationError::too_long(field, MAX_REQUEST_CHARS, chars));
    }
    Ok(())
}

fn parse_session(raw: Option<&str>) -> Result<Option<SessionId>, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => SessionId::parse(id).map(Some),
        None => Ok(None),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/enhance response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnhanceResponse {
    pub enhanced_prompt: String,
    pub request_id: String,
    pub session_id: String,
    pub intent_level: String,
    pub language: String,
    pub intent: String,
    pub safety_flags: BTreeSet<String>,
}

impl From<EnrichPromptResult> for EnhanceResponse {
    fn from(result: EnrichPromptResult) -> Self {
        let enhanced_prompt = result.presented();
        let ctx = result.context;
        Self {
            enhanced_prompt,
            request_id: ctx.request_id.to_string(),
            session_id: ctx.session_id.to_string(),
            intent_level: ctx.intent_level.to_string(),
            safety_flags: ctx.safety_flags().clone(),
            language: ctx.language,
            intent: ctx.intent,
        }
    }
}

/// GET /api/sessions/{session_id} response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionHistoryResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
}

/// GET /api/health response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub model: String,
}

/// Error body for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
