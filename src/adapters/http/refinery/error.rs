//! HTTP error mapping for the refinery endpoints.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use super::dto::ErrorResponse;
use crate::application::{EnrichmentError, ExecuteChatError};
use crate::domain::foundation::{DomainError, ErrorCode, SessionId, ValidationError};

/// Errors returned by refinery handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    MalformedBody(String),

    #[error("No history for session {0}")]
    SessionNotFound(SessionId),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Session store failed: {0}")]
    Storage(DomainError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl From<EnrichmentError> for ApiError {
    fn from(err: EnrichmentError) -> Self {
        match err {
            EnrichmentError::Cancelled => ApiError::Cancelled,
        }
    }
}

impl From<ExecuteChatError> for ApiError {
    fn from(err: ExecuteChatError) -> Self {
        match err {
            ExecuteChatError::EmptyPrompt => {
                ApiError::Validation(ValidationError::empty_field("prompt"))
            }
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, ErrorCode::from(err)),
            ApiError::MalformedBody(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed),
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::SessionNotFound),
            // Client closed the request; nobody reads this response.
            ApiError::Cancelled => (
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
                ErrorCode::Cancelled,
            ),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::StorageError),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(ErrorResponse::new(code.to_string(), self.to_string()))).into_response()
    }
}
