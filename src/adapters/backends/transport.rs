//! Shared HTTP plumbing for the network backends.
//!
//! Both network backends send one streaming POST raced against cancellation.
//! Newline-delimited JSON bodies are read through `line_stream`, with the
//! caller supplying how a single line is interpreted as a `LineParser`.
//! Server-Sent Events are decoded by the hosted backend itself.

use async_stream::stream;
use futures::StreamExt;
use reqwest::{RequestBuilder, Response};
use tokio_util::sync::CancellationToken;

use super::LineBuffer;
use crate::ports::{BackendError, FragmentStream};

/// What a single line or event of a streaming body means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineOutcome {
    /// An incremental piece of text.
    Fragment(String),
    /// The backend signalled the end; an optional last piece of text.
    Finished(Option<String>),
    /// Nothing to emit (blank, comment, metadata, or malformed line).
    Skip,
}

/// Interprets one complete line of a streaming body.
pub(crate) type LineParser = fn(&str) -> LineOutcome;

/// Sends the request, racing it against cancellation.
pub(crate) async fn send(
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<Response, BackendError> {
    if cancel.is_cancelled() {
        return Err(BackendError::Cancelled);
    }

    tokio::select! {
        biased;

        () = cancel.cancelled() => Err(BackendError::Cancelled),

        result = request.send() => result.map_err(|e| {
            if e.is_connect() {
                BackendError::network(format!("Connection failed: {}", e))
            } else {
                BackendError::network(e.to_string())
            }
        }),
    }
}

/// Turns a non-success status into `BackendError::Http` with the body text.
///
/// Reading the error body is raced against `cancel` like every other read.
pub(crate) async fn ensure_success(
    response: Response,
    cancel: &CancellationToken,
) -> Result<Response, BackendError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    tokio::select! {
        biased;

        () = cancel.cancelled() => Err(BackendError::Cancelled),

        body = response.text() => {
            Err(BackendError::http(status.as_u16(), body.unwrap_or_default()))
        }
    }
}

/// Reads a line-framed body as a fragment stream.
///
/// Each network read is raced against `cancel`. Only complete lines are
/// parsed; the unterminated tail is parsed once the body ends. Iteration
/// stops at the first `Finished` line even if more bytes are buffered. A body
/// with no bytes at all is reported as `EmptyBody`.
pub(crate) fn line_stream(
    response: Response,
    cancel: CancellationToken,
    parse: LineParser,
) -> FragmentStream {
    let mut bytes = Box::pin(response.bytes_stream());

    Box::pin(stream! {
        let mut buffer = LineBuffer::new();
        let mut received_any = false;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(BackendError::Cancelled),
                next = bytes.next() => Ok(next),
            };

            let chunk = match next {
                Err(err) => {
                    yield Err(err);
                    return;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    yield Err(BackendError::network(format!("Stream error: {}", e)));
                    return;
                }
                Ok(Some(Ok(chunk))) => chunk,
            };

            if !chunk.is_empty() {
                received_any = true;
            }

            for line in buffer.push(&chunk) {
                match parse(&line) {
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
        }

        if !received_any {
            yield Err(BackendError::EmptyBody);
            return;
        }

        if let Some(line) = buffer.finish() {
            match parse(&line) {
                LineOutcome::Fragment(text) | LineOutcome::Finished(Some(text)) => yield Ok(text),
                LineOutcome::Finished(None) | LineOutcome::Skip => {}
            }
        }
    })
}
