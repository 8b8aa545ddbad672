//! Session Store Port - Per-session conversation history.
//!
//! The store is append-only: history for a session grows only through
//! `append_exchange`, which adds one completed user/assistant pair at a time.

use async_trait::async_trait;

use super::Message;
use crate::domain::foundation::{DomainError, SessionId};

/// Port for conversation history persistence.
///
/// Implementations must append both messages of an exchange atomically, so a
/// reader never observes a user prompt without its reply.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the ordered history of a session (empty if unknown).
    async fn history(&self, session_id: &SessionId) -> Result<Vec<Message>, DomainError>;

    /// Appends one completed exchange: the prompt, then the reply.
    async fn append_exchange(
        &self,
        session_id: &SessionId,
        prompt: Message,
        reply: Message,
    ) -> Result<(), DomainError>;

    /// Returns the number of messages stored for a session.
    async fn len(&self, session_id: &SessionId) -> Result<usize, DomainError> {
        Ok(self.history(session_id).await?.len())
    }
}
