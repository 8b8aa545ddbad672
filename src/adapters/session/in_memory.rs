//! In-memory session store.
//!
//! Holds every session's history for the lifetime of the process. There is
//! no eviction; memory grows with the number of sessions and exchanges.
//!
//! # Concurrency
//!
//! Reads and appends take a tokio `RwLock` briefly. Both messages of an
//! exchange are appended under one write lock, so pairs never interleave.
//! Concurrent executions on the same session are not serialized: each reads
//! history independently and the last one to complete appends last.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(InMemorySessionStore::new());
//! store.append_exchange(&id, Message::user("Hi"), Message::assistant("Hello")).await?;
//! assert_eq!(store.len(&id).await?, 2);
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, SessionId};
use crate::ports::{Message, SessionStore};

/// Process-lifetime session history map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Vec<Message>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with at least one exchange.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn history(&self, session_id: &SessionId) -> Result<Vec<Message>, DomainError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_exchange(
        &self,
        session_id: &SessionId,
        prompt: Message,
        reply: Message,
    ) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session_id.clone()).or_default();
        history.push(prompt);
        history.push(reply);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MessageRole;
    use std::sync::Arc;

    #[tokio::test]
    async fn unknown_session_has_empty_history() {
        let store = InMemorySessionStore::new();
        let history = store.history(&SessionId::new()).await.unwrap();
        assert!(history.is_empty());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn append_exchange_adds_pair_in_order() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        store
            .append_exchange(&id, Message::user("Hi"), Message::assistant("Hello"))
            .await
            .unwrap();

        let history = store.history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1], Message::assistant("Hello"));
        assert_eq!(store.len(&id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        let a = SessionId::new();
        let b = SessionId::new();

        store
            .append_exchange(&a, Message::user("a"), Message::assistant("A"))
            .await
            .unwrap();

        assert_eq!(store.len(&a).await.unwrap(), 2);
        assert_eq!(store.len(&b).await.unwrap(), 0);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_appends_never_interleave_pairs() {
        let store = Arc::new(InMemorySessionStore::new());
        let id = SessionId::new();

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    store
                        .append_exchange(
                            &id,
                            Message::user(format!("q{i}")),
                            Message::assistant(format!("a{i}")),
                        )
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let history = store.history(&id).await.unwrap();
        assert_eq!(history.len(), 40);
        for pair in history.chunks(2) {
            let n = pair[0].content.trim_start_matches('q');
            assert_eq!(pair[0].role, MessageRole::User);
            assert_eq!(pair[1].content, format!("a{n}"));
        }
    }
}
