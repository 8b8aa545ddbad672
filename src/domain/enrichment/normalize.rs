//! Normalize stage - whitespace cleanup and silent length cap.

use super::EnrichmentContext;

/// Hard maximum length of a normalized request, in characters.
pub const MAX_NORMALIZED_CHARS: usize = 8000;

/// Trims, collapses whitespace runs to single spaces, and truncates.
///
/// Truncation is silent. The result never starts or ends with whitespace,
/// so applying the function twice gives the same text.
pub fn normalize_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_NORMALIZED_CHARS {
        return collapsed;
    }

    let truncated: String = collapsed.chars().take(MAX_NORMALIZED_CHARS).collect();
    truncated.trim_end().to_string()
}

/// Applies `normalize_text` to the context's user message.
pub fn normalize(ctx: EnrichmentContext) -> EnrichmentContext {
    let text = normalize_text(&ctx.user_message);
    ctx.with_user_message(text)
}
