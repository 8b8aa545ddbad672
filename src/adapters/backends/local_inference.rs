//! Local inference backend (Ollama-compatible `/api/generate`).
//!
//! Sends the conversation as a single role-labelled transcript and reads the
//! newline-delimited JSON response:
//!
//! ```text
//! {"response":"Hel","done":false}
//! {"response":"lo","done":false}
//! {"response":"","done":true}
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::transport::{self, LineOutcome};
use crate::ports::{BackendError, BackendInfo, FragmentStream, Message, MessageRole, ModelBackend};

/// Backend for a local inference server.
#[derive(Debug, Clone)]
pub struct LocalInferenceBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl LocalInferenceBackend {
    /// Creates a backend talking to `base_url` with the given model.
    pub fn new(client: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Builds the generate endpoint URL.
    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

/// Flattens a conversation into a prompt ending with an open assistant turn.
fn transcript(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        let label = match message.role {
            MessageRole::System => "System",
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        };
        prompt.push_str(label);
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Assistant:");
    prompt
}

fn parse_ndjson_line(line: &str) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Skip;
    }

    match serde_json::from_str::<GenerateChunk>(line) {
        Ok(chunk) => {
            let text = chunk.response.filter(|t| !t.is_empty());
            if chunk.done {
                LineOutcome::Finished(text)
            } else {
                text.map_or(LineOutcome::Skip, LineOutcome::Fragment)
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed NDJSON line");
            LineOutcome::Skip
        }
    }
}

#[async_trait]
impl ModelBackend for LocalInferenceBackend {
    async fn stream_chat(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<FragmentStream, BackendError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: transcript(messages),
            stream: true,
        };

        tracing::debug!(backend = "local", model = %self.model, "Sending generate request");

        let request = self.client.post(self.generate_url()).json(&body);
        let response = transport::send(request, &cancel).await?;
        let response = transport::ensure_success(response, &cancel).await?;

        Ok(transport::line_stream(response, cancel, parse_ndjson_line))
    }

    fn describe(&self) -> BackendInfo {
        BackendInfo::new("local", &self.model)
    }
}

// ----- Local inference API types -----

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use crate::adapters::backends::stalled_server::serve_partial;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> LocalInferenceBackend {
        LocalInferenceBackend::new(Client::new(), server.uri(), "llama3")
    }

    async fn mount_body(server: &MockServer, body: &str) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn transcript_labels_roles_and_opens_assistant_turn() {
        let prompt = transcript(&[Message::system("be brief"), Message::user("hi")]);
        assert_eq!(prompt, "System: be brief\n\nUser: hi\n\nAssistant:");
    }

    #[test]
    fn parses_ndjson_lines() {
        assert_eq!(
            parse_ndjson_line(r#"{"response":"Hi","done":false}"#),
            LineOutcome::Fragment("Hi".to_string())
        );
        assert_eq!(
            parse_ndjson_line(r#"{"response":"","done":true}"#),
            LineOutcome::Finished(None)
        );
        assert_eq!(parse_ndjson_line("{not json"), LineOutcome::Skip);
        assert_eq!(parse_ndjson_line("   "), LineOutcome::Skip);
    }

    #[tokio::test]
    async fn streams_fragments_until_done() {
        let server = MockServer::start().await;
        mount_body(
            &server,
            "{\"response\":\"Hel\",\"done\":false}\n\
             {\"response\":\"lo\",\"done\":false}\n\
             {\"response\":\"\",\"done\":true}\n\
             {\"response\":\"ignored\",\"done\":false}\n",
        )
        .await;

        let fragments: Vec<String> = backend(&server)
            .stream_chat(&[Message::user("hi")], CancellationToken::new())
            .await
            .unwrap()
            .map(|f| f.unwrap())
            .collect()
            .await;

        assert_eq!(fragments, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn sends_model_prompt_and_stream_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3",
                "stream": true,
                "prompt": "User: ping\n\nAssistant:"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("{\"response\":\"pong\",\"done\":true}\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = backend(&server)
            .chat(&[Message::user("ping")], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "pong");
    }

    #[tokio::test]
    async fn skips_malformed_lines_and_parses_unterminated_tail() {
        let server = MockServer::start().await;
        mount_body(
            &server,
            "{\"response\":\"a\",\"done\":false}\n\
             garbage line\n\
             {\"response\":\"b\",\"done\":false}",
        )
        .await;

        let text = backend(&server)
            .chat(&[Message::user("x")], CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "ab");
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let result = backend(&server)
            .chat(&[Message::user("x")], CancellationToken::new())
            .await;

        assert_eq!(result, Err(BackendError::http(404, "model not found")));
    }

    #[tokio::test]
    async fn empty_body_is_an_error() {
        let server = MockServer::start().await;
        mount_body(&server, "").await;

        let result = backend(&server)
            .chat(&[Message::user("x")], CancellationToken::new())
            .await;

        assert_eq!(result, Err(BackendError::EmptyBody));
    }

    #[tokio::test]
    async fn cancellation_while_waiting_for_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"response\":\"late\",\"done\":true}\n")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = backend(&server).chat(&[Message::user("x")], cancel).await;

        assert_eq!(result, Err(BackendError::Cancelled));
    }

    fn cancel_after(cancel: &CancellationToken, delay: Duration) {
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trigger.cancel();
        });
    }

    #[tokio::test]
    async fn cancellation_while_body_is_stalled() {
        let base = serve_partial(
            200,
            "application/x-ndjson",
            "{\"response\":\"Hel\",\"done\":false}\n{\"respo",
        )
        .await;
        let backend = LocalInferenceBackend::new(Client::new(), base, "llama3");
        let cancel = CancellationToken::new();

        let mut stream = backend
            .stream_chat(&[Message::user("x")], cancel.clone())
            .await
            .unwrap();
        assert_eq!(stream.next().await, Some(Ok("Hel".to_string())));

        cancel_after(&cancel, Duration::from_millis(50));
        let next = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("stalled body read was not cancelled");

        assert_eq!(next, Some(Err(BackendError::Cancelled)));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn cancellation_while_error_body_is_stalled() {
        let base = serve_partial(500, "text/plain", "model crash").await;
        let backend = LocalInferenceBackend::new(Client::new(), base, "llama3");
        let cancel = CancellationToken::new();
        cancel_after(&cancel, Duration::from_millis(50));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            backend.stream_chat(&[Message::user("x")], cancel),
        )
        .await
        .expect("stalled error body read was not cancelled");

        assert!(matches!(result, Err(BackendError::Cancelled)));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let backend = LocalInferenceBackend::new(Client::new(), "http://127.0.0.1:1", "llama3");

        let result = backend
            .chat(&[Message::user("x")], CancellationToken::new())
            .await;

        assert!(matches!(result, Err(BackendError::Network(_))));
    }
}
