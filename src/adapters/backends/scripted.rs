//! Scripted backend for tests.
//!
//! Replays pre-configured replies in order and records every conversation it
//! receives, so tests can assert both outputs and whether the backend was
//! called at all.
//!
//! # Example
//!
//! ```ignore
//! let backend = ScriptedBackend::new()
//!     .with_reply(["Hel", "lo"])
//!     .with_failure(BackendError::http(503, "overloaded"));
//!
//! assert_eq!(backend.chat(&messages, cancel).await?, "Hello");
//! assert_eq!(backend.call_count(), 1);
//! ```

use async_stream::stream;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::ports::{BackendError, BackendInfo, FragmentStream, Message, ModelBackend};

/// A configured scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Stream these fragments, then end.
    Fragments(Vec<String>),
    /// Stream these fragments, then yield the error.
    FailAfter(Vec<String>, BackendError),
    /// Refuse to start the stream.
    Fail(BackendError),
    /// Stream these fragments, then wait until cancelled.
    HangAfter(Vec<String>),
}

/// Test backend with queued replies and call tracking.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedBackend {
    /// Creates a backend with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply made of the given fragments.
    pub fn with_reply<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ScriptedReply::Fragments(
            fragments.into_iter().map(Into::into).collect(),
        ))
    }

    /// Queues an error returned before any fragment.
    pub fn with_failure(self, error: BackendError) -> Self {
        self.push(ScriptedReply::Fail(error))
    }

    /// Queues an arbitrary reply.
    pub fn with_scripted(self, reply: ScriptedReply) -> Self {
        self.push(reply)
    }

    /// Returns the number of calls made to this backend.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns every conversation received, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(self, reply: ScriptedReply) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
        self
    }

    fn next_reply(&self) -> ScriptedReply {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::Fragments(vec!["Scripted response".to_string()]))
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn stream_chat(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<FragmentStream, BackendError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let (fragments, tail) = match self.next_reply() {
            ScriptedReply::Fail(error) => return Err(error),
            ScriptedReply::Fragments(fragments) => (fragments, None),
            ScriptedReply::FailAfter(fragments, error) => (fragments, Some(Err(error))),
            ScriptedReply::HangAfter(fragments) => (fragments, Some(Ok(()))),
        };

        Ok(Box::pin(stream! {
            for fragment in fragments {
                if cancel.is_cancelled() {
                    yield Err(BackendError::Cancelled);
                    return;
                }
                yield Ok(fragment);
            }

            match tail {
                None => {}
                Some(Err(error)) => yield Err(error),
                Some(Ok(())) => {
                    cancel.cancelled().await;
                    yield Err(BackendError::Cancelled);
                }
            }
        }))
    }

    fn describe(&self) -> BackendInfo {
        BackendInfo::new("scripted", "scripted-1")
    }
}
