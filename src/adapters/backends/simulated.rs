//! Simulated backend for offline development and tests.
//!
//! Produces a deterministic reply that quotes the last user message, emitted
//! word by word after an initial think delay, followed by an end marker.
//!
//! # Example
//!
//! ```ignore
//! let backend = SimulatedBackend::new()
//!     .with_think_delay(Duration::ZERO)
//!     .with_fragment_delay(Duration::ZERO);
//!
//! let text = backend.chat(&[Message::user("test")], CancellationToken::new()).await?;
//! assert!(text.contains("test"));
//! ```

use async_stream::stream;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::BackendConfig;
use crate::ports::{BackendError, BackendInfo, FragmentStream, Message, MessageRole, ModelBackend};

/// Final fragment of every simulated reply.
pub const END_MARKER: &str = "\n\n[END OF RESPONSE]";

/// Model name reported by the simulator.
pub const SIMULATED_MODEL: &str = "simulated-1";

const DEFAULT_THINK_DELAY: Duration = Duration::from_millis(800);
const DEFAULT_FRAGMENT_DELAY: Duration = Duration::from_millis(40);

/// Time-delayed, deterministic-shape backend.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    think_delay: Duration,
    fragment_delay: Duration,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    /// Creates a simulator with the default delays.
    pub fn new() -> Self {
        Self {
            think_delay: DEFAULT_THINK_DELAY,
            fragment_delay: DEFAULT_FRAGMENT_DELAY,
        }
    }

    /// Creates a simulator with the configured delays.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new()
            .with_think_delay(config.think_delay())
            .with_fragment_delay(config.fragment_delay())
    }

    /// Sets the delay before the first fragment.
    pub fn with_think_delay(mut self, delay: Duration) -> Self {
        self.think_delay = delay;
        self
    }

    /// Sets the delay before each word fragment.
    pub fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = delay;
        self
    }

    /// Splits the reply into word fragments plus the end marker.
    ///
    /// Fragments keep their trailing space, so joining them reproduces the
    /// reply exactly.
    fn fragments(messages: &[Message]) -> Vec<String> {
        let reply = compose_reply(messages);
        reply
            .split_inclusive(' ')
            .map(str::to_string)
            .chain(std::iter::once(END_MARKER.to_string()))
            .collect()
    }
}

fn compose_reply(messages: &[Message]) -> String {
    let prompt = messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .or_else(|| messages.last())
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    format!(
        "This is a simulated response to: \"{}\". Configure a local or hosted backend to get real model output.",
        prompt
    )
}

/// Waits for `delay` unless the token fires first.
async fn pause(delay: Duration, cancel: &CancellationToken) -> Result<(), BackendError> {
    if cancel.is_cancelled() {
        return Err(BackendError::Cancelled);
    }
    if delay.is_zero() {
        return Ok(());
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(BackendError::Cancelled),
        () = sleep(delay) => Ok(()),
    }
}

#[async_trait]
impl ModelBackend for SimulatedBackend {
    async fn stream_chat(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<FragmentStream, BackendError> {
        let fragments = Self::fragments(messages);
        let think_delay = self.think_delay;
        let fragment_delay = self.fragment_delay;

        Ok(Box::pin(stream! {
            if let Err(err) = pause(think_delay, &cancel).await {
                yield Err(err);
                return;
            }

            for fragment in fragments {
                if let Err(err) = pause(fragment_delay, &cancel).await {
                    yield Err(err);
                    return;
                }
                yield Ok(fragment);
            }
        }))
    }

    fn describe(&self) -> BackendInfo {
        BackendInfo::new("simulated", SIMULATED_MODEL)
    }
}
