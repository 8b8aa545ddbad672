//! Model backend adapters - Implementations of the `ModelBackend` port.
//!
//! - `SimulatedBackend` - offline, time-delayed deterministic replies
//! - `LocalInferenceBackend` - local inference server, NDJSON streaming
//! - `HostedBackend` - hosted chat completions API, SSE streaming
//! - `ScriptedBackend` - queued replies with call tracking, for tests
//!
//! `Backend` is the tagged variant the application runs on. It is built from
//! configuration by a pure selection policy every time it is needed, so the
//! choice never goes stale within a process.

mod hosted;
mod line_buffer;
mod local_inference;
mod scripted;
mod simulated;
#[cfg(test)]
mod stalled_server;
mod transport;

pub use hosted::HostedBackend;
pub use line_buffer::LineBuffer;
pub use local_inference::LocalInferenceBackend;
pub use scripted::{ScriptedBackend, ScriptedReply};
pub use simulated::{SimulatedBackend, END_MARKER, SIMULATED_MODEL};

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::config::{BackendConfig, BackendProvider};
use crate::ports::{BackendError, BackendInfo, FragmentStream, Message, ModelBackend};

/// Which backend variant the selection policy picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Simulated,
    LocalInference,
    Hosted,
}

impl BackendKind {
    /// Evaluates the selection policy, in order:
    ///
    /// 1. `force_mock` wins
    /// 2. an explicit local provider
    /// 3. a configured hosted credential
    /// 4. otherwise the simulator
    pub fn select(config: &BackendConfig) -> Self {
        if config.force_mock {
            return BackendKind::Simulated;
        }
        if config.provider == Some(BackendProvider::Local) {
            return BackendKind::LocalInference;
        }
        if config.has_api_key() {
            return BackendKind::Hosted;
        }
        BackendKind::Simulated
    }

    /// Short name used in logs and health output.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Simulated => "simulated",
            BackendKind::LocalInference => "local",
            BackendKind::Hosted => "hosted",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The selected model backend.
#[derive(Debug)]
pub enum Backend {
    Simulated(SimulatedBackend),
    LocalInference(LocalInferenceBackend),
    Hosted(HostedBackend),
}

impl Backend {
    /// Builds the backend the selection policy picks for `config`.
    pub fn from_config(config: &BackendConfig, client: Client) -> Self {
        match BackendKind::select(config) {
            BackendKind::Simulated => Backend::Simulated(SimulatedBackend::from_config(config)),
            BackendKind::LocalInference => Backend::LocalInference(LocalInferenceBackend::new(
                client,
                config.local_base_url(),
                config.local_model(),
            )),
            BackendKind::Hosted => Backend::Hosted(HostedBackend::new(
                client,
                config.hosted_base_url(),
                config.hosted_model(),
                config.api_key.clone(),
            )),
        }
    }

    /// Which variant this is.
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Simulated(_) => BackendKind::Simulated,
            Backend::LocalInference(_) => BackendKind::LocalInference,
            Backend::Hosted(_) => BackendKind::Hosted,
        }
    }

    fn inner(&self) -> &dyn ModelBackend {
        match self {
            Backend::Simulated(backend) => backend,
            Backend::LocalInference(backend) => backend,
            Backend::Hosted(backend) => backend,
        }
    }
}

#[async_trait]
impl ModelBackend for Backend {
    async fn stream_chat(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<FragmentStream, BackendError> {
        self.inner().stream_chat(messages, cancel).await
    }

    fn describe(&self) -> BackendInfo {
        self.inner().describe()
    }
}
