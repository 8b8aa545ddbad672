//! Model Backend Port - Interface over interchangeable text-generation backends.
//!
//! This port abstracts every interaction with a language model (the offline
//! simulator, a local inference server, a hosted API), so the enrichment
//! pipeline and the chat coordinator never couple to a specific provider.
//!
//! # Design
//!
//! - One streaming primitive (`stream_chat`) yields text fragments lazily
//! - `chat` is provided in terms of `stream_chat`, so concatenating every
//!   fragment always equals the one-shot result
//! - Cancellation is an explicit `CancellationToken` observed at every
//!   suspension point; a cancelled call yields `BackendError::Cancelled`
//!
//! # Example
//!
//! ```ignore
//! let mut fragments = backend.stream_chat(&messages, cancel.clone()).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! ```

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Lazy, finite, non-restartable sequence of generated text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

/// Port for language model backends.
///
/// Callers that have no cancellation source pass a fresh
/// `CancellationToken::new()`, which is never triggered.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Starts a streaming generation for the given conversation.
    ///
    /// Fragments are produced as they become available. The stream ends after
    /// the last fragment, or after yielding a single error.
    async fn stream_chat(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<FragmentStream, BackendError>;

    /// Generates the complete text for the given conversation.
    ///
    /// Drains `stream_chat` and concatenates every fragment.
    async fn chat(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<String, BackendError> {
        let mut fragments = self.stream_chat(messages, cancel).await?;
        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    /// Describes the backend (variant name and model).
    fn describe(&self) -> BackendInfo;
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Trusted framing instructions.
    System,
    /// User input.
    User,
    /// Model response.
    Assistant,
}

impl MessageRole {
    /// Wire name used by chat-style APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Backend identification for logs and health output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Variant name (e.g., "simulated", "local", "hosted").
    pub name: String,
    /// Model identifier.
    pub model: String,
}

impl BackendInfo {
    /// Creates new backend info.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Model backend errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The caller cancelled the request. Not a failure.
    #[error("request cancelled")]
    Cancelled,

    /// Backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Backend answered without any response body.
    #[error("backend response had no body")]
    EmptyBody,

    /// A required credential is not configured.
    #[error("missing credential for {backend} backend")]
    MissingCredential {
        /// Backend that needs the credential.
        backend: &'static str,
    },

    /// Transport failure while sending or reading.
    #[error("network error: {0}")]
    Network(String),
}

impl BackendError {
    /// Creates an HTTP status error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Returns true if the request was intentionally stopped.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BackendError::Cancelled)
    }
}
