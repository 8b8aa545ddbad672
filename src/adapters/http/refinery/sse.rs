//! Wire framing of chat executions toward the UI.
//!
//! ```text
//! data: {"content":"Hel"}\n\n
//! data: {"content":"lo"}\n\n
//! data: [DONE]\n\n
//! ```
//!
//! A failure replaces the `[DONE]` frame with `data: {"error":"..."}\n\n`.
//! A cancelled execution writes nothing further.

use serde::Serialize;

use crate::application::ExecutionEvent;

/// Terminal frame of a successful execution.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

#[derive(Serialize)]
struct ContentPayload<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    error: &'a str,
}

/// Frames one fragment.
pub fn content_frame(content: &str) -> String {
    data_frame(&ContentPayload { content })
}

/// Frames an error marker.
pub fn error_frame(message: &str) -> String {
    data_frame(&ErrorPayload { error: message })
}

/// Frames an execution event, or `None` when nothing is written.
pub fn event_frame(event: &ExecutionEvent) -> Option<String> {
    match event {
        ExecutionEvent::Fragment(content) => Some(content_frame(content)),
        ExecutionEvent::Completed { .. } => Some(DONE_FRAME.to_string()),
        ExecutionEvent::Failed { message } => Some(error_frame(message)),
        ExecutionEvent::Aborted => None,
    }
}

fn data_frame<T: Serialize>(payload: &T) -> String {
    // Serializing a struct of string fields cannot fail.
    let json = serde_json::to_string(payload).unwrap_or_default();
    format!("data: {}\n\n", json)
}
