//! ExecuteChat command handler (streaming execution coordinator).
//!
//! Drives one conversational exchange:
//!
//! ```text
//! Idle → Assembling → Streaming → Completed
//!                 ↘           ↘→ Aborted
//!                  ↘→ Failed  ↘→ Failed
//! ```
//!
//! - Assembling: session history plus the new prompt with the chosen role
//! - Streaming: fragments are relayed as they arrive and accumulated
//! - Completed: the only state that writes history (prompt, then full reply)
//! - Aborted / Failed: terminal marker, history untouched, no retry
//!
//! Errors never escape past the event stream; every run ends with exactly one
//! terminal event.

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{SessionId, StateMachine};
use crate::ports::{BackendError, Message, MessageRole, ModelBackend, SessionStore};

/// Lifecycle of a single chat execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Idle,
    Assembling,
    Streaming,
    Completed,
    Aborted,
    Failed,
}

impl StateMachine for ExecutionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ExecutionState::*;
        match self {
            Idle => vec![Assembling],
            Assembling => vec![Streaming, Aborted, Failed],
            Streaming => vec![Completed, Aborted, Failed],
            Completed | Aborted | Failed => vec![],
        }
    }
}

/// Role the new prompt is sent with.
///
/// Enhanced prompts are trusted framing (system role); raw prompts are
/// requests (user role). The choice is made by the caller, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    System,
    User,
}

impl PromptRole {
    /// System role for enhanced prompts, user role for raw ones.
    pub fn for_enhanced(use_enhanced: bool) -> Self {
        if use_enhanced {
            PromptRole::System
        } else {
            PromptRole::User
        }
    }

    pub fn message_role(&self) -> MessageRole {
        match self {
            PromptRole::System => MessageRole::System,
            PromptRole::User => MessageRole::User,
        }
    }
}

/// Command to execute a chat exchange.
#[derive(Debug, Clone)]
pub struct ExecuteChatCommand {
    /// Session whose history provides context.
    pub session_id: SessionId,
    /// Prompt text to send.
    pub prompt: String,
    /// Role the prompt is sent with.
    pub role: PromptRole,
}

impl ExecuteChatCommand {
    pub fn new(session_id: SessionId, prompt: impl Into<String>, role: PromptRole) -> Self {
        Self {
            session_id,
            prompt: prompt.into(),
            role,
        }
    }
}

/// Events produced by a chat execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// One relayed text fragment.
    Fragment(String),
    /// The backend finished; the exchange was saved.
    Completed { text: String },
    /// The caller cancelled; nothing was saved.
    Aborted,
    /// The backend or store failed; nothing was saved.
    Failed { message: String },
}

impl ExecutionEvent {
    /// Returns true for the final event of a run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionEvent::Fragment(_))
    }
}

/// Lazy, cancellable sequence of execution events.
pub type ExecutionStream = Pin<Box<dyn Stream<Item = ExecutionEvent> + Send>>;

/// Errors rejecting a command before execution starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteChatError {
    /// Prompt is empty or whitespace only.
    #[error("Validation error: prompt cannot be empty")]
    EmptyPrompt,
}

/// Handler for chat executions.
pub struct ExecuteChatHandler {
    backend: Arc<dyn ModelBackend>,
    store: Arc<dyn SessionStore>,
}

impl ExecuteChatHandler {
    pub fn new(backend: Arc<dyn ModelBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self { backend, store }
    }

    /// Starts an execution and returns its event stream.
    ///
    /// Nothing happens until the stream is polled. Dropping the stream or
    /// cancelling `cancel` stops the exchange without touching history.
    pub fn handle(
        &self,
        cmd: ExecuteChatCommand,
        cancel: CancellationToken,
    ) -> Result<ExecutionStream, ExecuteChatError> {
        if cmd.prompt.trim().is_empty() {
            return Err(ExecuteChatError::EmptyPrompt);
        }

        let backend = self.backend.clone();
        let store = self.store.clone();

        Ok(Box::pin(stream! {
            let ExecuteChatCommand { session_id, prompt, role } = cmd;
            let backend_name = backend.describe().name;
            let mut state = advance(ExecutionState::Idle, ExecutionState::Assembling);

            let mut messages = match store.history(&session_id).await {
                Ok(history) => history,
                Err(e) => {
                    tracing::error!(session_id = %session_id, error = %e, "Failed to read session history");
                    yield conclude(state, ExecutionState::Failed, ExecutionEvent::Failed { message: e.to_string() });
                    return;
                }
            };
            messages.push(Message::new(role.message_role(), prompt.clone()));

            state = advance(state, ExecutionState::Streaming);
            let mut fragments = match backend.stream_chat(&messages, cancel.clone()).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    yield finish(state, &session_id, &backend_name, e, 0);
                    return;
                }
            };

            let mut text = String::new();
            let mut count = 0usize;
            loop {
                let next = tokio::select! {
                    biased;
                    () = cancel.cancelled() => Err(BackendError::Cancelled),
                    next = fragments.next() => Ok(next),
                };

                match next {
                    Ok(Some(Ok(fragment))) => {
                        text.push_str(&fragment);
                        count += 1;
                        yield ExecutionEvent::Fragment(fragment);
                    }
                    Ok(None) => break,
                    Ok(Some(Err(e))) | Err(e) => {
                        yield finish(state, &session_id, &backend_name, e, count);
                        return;
                    }
                }
            }

            if let Err(e) = store
                .append_exchange(&session_id, Message::user(prompt), Message::assistant(text.clone()))
                .await
            {
                tracing::error!(session_id = %session_id, error = %e, "Failed to save exchange");
                yield conclude(state, ExecutionState::Failed, ExecutionEvent::Failed { message: e.to_string() });
                return;
            }

            tracing::info!(
                session_id = %session_id,
                backend = %backend_name,
                fragments = count,
                "Chat execution completed"
            );
            yield conclude(state, ExecutionState::Completed, ExecutionEvent::Completed { text });
        }))
    }
}

fn advance(state: ExecutionState, next: ExecutionState) -> ExecutionState {
    match state.transition_to(next) {
        Ok(next) => {
            tracing::debug!(from = ?state, to = ?next, "Execution state change");
            next
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid execution state transition");
            ExecutionState::Failed
        }
    }
}

/// Enters the terminal state `next` and returns the event announcing it.
///
/// An illegal transition ends the run as `Failed` instead of emitting `event`.
fn conclude(state: ExecutionState, next: ExecutionState, event: ExecutionEvent) -> ExecutionEvent {
    let reached = advance(state, next);
    debug_assert!(reached.is_terminal());
    if reached == next {
        event
    } else {
        ExecutionEvent::Failed {
            message: format!("invalid execution state transition from {:?} to {:?}", state, next),
        }
    }
}

/// Maps a backend error to the terminal event and logs it.
fn finish(
    state: ExecutionState,
    session_id: &SessionId,
    backend: &str,
    error: BackendError,
    fragments: usize,
) -> ExecutionEvent {
    if error.is_cancelled() {
        tracing::info!(session_id = %session_id, backend, fragments, "Chat execution aborted");
        conclude(state, ExecutionState::Aborted, ExecutionEvent::Aborted)
    } else {
        tracing::error!(session_id = %session_id, backend, fragments, error = %error, "Chat execution failed");
        conclude(
            state,
            ExecutionState::Failed,
            ExecutionEvent::Failed {
                message: error.to_string(),
            },
        )
    }
}
