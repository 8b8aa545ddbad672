//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ValidationError;

/// Maximum accepted length of a caller-supplied session identifier.
pub const MAX_SESSION_ID_LENGTH: usize = 128;

/// Identifier of a conversation session.
///
/// Callers may supply their own identifier (any non-empty string without
/// whitespace or control characters); otherwise a random UUID is generated.
/// Every valid id is also a valid HTTP header value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random SessionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a SessionId from a caller-supplied value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the value is empty, too long, or contains
    /// whitespace or control characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::empty_field("session_id"));
        }
        if value.chars().count() > MAX_SESSION_ID_LENGTH {
            return Err(ValidationError::invalid_format(
                "session_id",
                format!("must be at most {} characters", MAX_SESSION_ID_LENGTH),
            ));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "session_id",
                "must not contain whitespace",
            ));
        }
        if value.chars().any(char::is_control) {
            return Err(ValidationError::invalid_format(
                "session_id",
                "must not contain control characters",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier generated for every enrichment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random RequestId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_new_generates_unique_values() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn session_id_accepts_caller_supplied_value() {
        let id = SessionId::parse("my-session_01").unwrap();
        assert_eq!(id.as_str(), "my-session_01");
        assert_eq!(id.to_string(), "my-session_01");
    }

    #[test]
    fn session_id_rejects_empty_value() {
        assert!(matches!(
            SessionId::parse(""),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn session_id_rejects_whitespace() {
        assert!(SessionId::parse("two words").is_err());
    }

    #[test]
    fn session_id_rejects_overlong_value() {
        let long = "x".repeat(MAX_SESSION_ID_LENGTH + 1);
        assert!(SessionId::parse(long).is_err());
    }

    #[test]
    fn session_id_rejects_control_characters() {
        for raw in ["a\u{1}b", "del\u{7f}", "nul\u{0}", "c1\u{85}x"] {
            assert!(
                matches!(
                    SessionId::parse(raw),
                    Err(ValidationError::InvalidFormat { .. })
                ),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn session_id_accepts_non_ascii_text() {
        assert_eq!(SessionId::parse("sesión-1").unwrap().as_str(), "sesión-1");
    }

    #[test]
    fn request_id_new_generates_unique_values() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn session_id_serializes_transparently() {
        let id = SessionId::parse("abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
