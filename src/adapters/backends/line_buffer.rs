//! Partial-line buffering for line-framed streaming responses.
//!
//! Network reads split a response at arbitrary byte offsets, including inside
//! a line or inside a multi-byte character. `LineBuffer` keeps the unfinished
//! tail and only hands out complete lines.

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed.
    ///
    /// Lines are returned without their `\n` or `\r\n` terminator.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // Pending bytes never contain a newline, so only the new chunk is scanned.
        let Some(last) = chunk.iter().rposition(|b| *b == b'\n') else {
            self.pending.extend_from_slice(chunk);
            return Vec::new();
        };

        self.pending.extend_from_slice(&chunk[..last]);
        let lines = self.pending.split(|b| *b == b'\n').map(decode_line).collect();

        self.pending.clear();
        self.pending.extend_from_slice(&chunk[last + 1..]);
        lines
    }

    /// Returns the unterminated remainder once the response has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.pending);
        let line = decode_line(&raw);
        if line.trim().is_empty() {
            None
        } else {
            Some(line)
        }
    }

    /// Number of buffered bytes not yet returned as a line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
