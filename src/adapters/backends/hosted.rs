//! Hosted backend (OpenAI-compatible chat completions over SSE).
//!
//! # Streaming
//!
//! The response is Server-Sent Events, decoded by `eventsource-stream`. Each
//! event's data is a JSON chunk whose text is at `choices[0].delta.content`;
//! an event whose data is `[DONE]` ends the stream.

use async_stream::stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::transport::{self, LineOutcome};
use crate::ports::{BackendError, BackendInfo, FragmentStream, Message, ModelBackend};

/// Backend for a hosted chat completions API.
#[derive(Debug)]
pub struct HostedBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<Secret<String>>,
}

impl HostedBackend {
    /// Creates a hosted backend. A missing or blank key fails on first use.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key
                .filter(|k| !k.trim().is_empty())
                .map(Secret::new),
        }
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn parse_event_data(data: &str) -> LineOutcome {
    let data = data.trim();

    if data == "[DONE]" {
        return LineOutcome::Finished(None);
    }
    if data.is_empty() {
        return LineOutcome::Skip;
    }

    match serde_json::from_str::<StreamResponseChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map_or(LineOutcome::Skip, LineOutcome::Fragment),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed SSE chunk");
            LineOutcome::Skip
        }
    }
}

/// Reads an SSE body as a fragment stream.
///
/// Each event read is raced against `cancel`. A body that carries no events
/// at all is reported as `EmptyBody`.
fn event_stream(response: Response, cancel: CancellationToken) -> FragmentStream {
    let mut events = Box::pin(response.bytes_stream().eventsource());

    Box::pin(stream! {
        let mut received_any = false;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(BackendError::Cancelled),
                next = events.next() => Ok(next),
            };

            let event = match next {
                Err(err) => {
                    yield Err(err);
                    return;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    yield Err(BackendError::network(format!("Stream error: {}", e)));
                    return;
                }
                Ok(Some(Ok(event))) => event,
            };
            received_any = true;

            match parse_event_data(&event.data) {
                LineOutcome::Fragment(text) => yield Ok(text),
                LineOutcome::Finished(last) => {
                    if let Some(text) = last {
                        yield Ok(text);
                    }
                    return;
                }
                LineOutcome::Skip => {}
            }
        }

        if !received_any {
            yield Err(BackendError::EmptyBody);
        }
    })
}

#[async_trait]
impl ModelBackend for HostedBackend {
    async fn stream_chat(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<FragmentStream, BackendError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(BackendError::MissingCredential { backend: "hosted" })?;

        let body = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: true,
        };

        tracing::debug!(backend = "hosted", model = %self.model, "Sending chat completion request");

        let request = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .json(&body);
        let response = transport::send(request, &cancel).await?;
        let response = transport::ensure_success(response, &cancel).await?;

        Ok(event_stream(response, cancel))
    }

    fn describe(&self) -> BackendInfo {
        BackendInfo::new("hosted", &self.model)
    }
}

// ----- Hosted API types -----

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct StreamResponseChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
