//! Safety screen stage - flags denylisted phrases without altering text.

use super::EnrichmentContext;

/// Flag raised when the request contains a denylisted phrase.
pub const UNSAFE_KEYWORD_DETECTED: &str = "unsafe_keyword_detected";

/// Phrases that trigger the safety flag, lowercase.
pub const DENYLIST: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous instructions",
    "disregard all prior instructions",
    "forget your instructions",
    "drop table",
    "drop database",
    "truncate table",
];

/// Returns the first denylisted phrase contained in `text`, ignoring case.
pub fn find_denylisted(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    DENYLIST
        .iter()
        .copied()
        .find(|phrase| lowered.contains(phrase))
}

/// Screens the user message and annotates the context.
///
/// The message text is never changed; a match only adds a flag.
pub fn screen(ctx: EnrichmentContext) -> EnrichmentContext {
    match find_denylisted(&ctx.user_message) {
        Some(phrase) => {
            tracing::warn!(
                request_id = %ctx.request_id,
                phrase,
                "Denylisted phrase detected"
            );
            ctx.with_flag(UNSAFE_KEYWORD_DETECTED)
        }
        None => ctx,
    }
}
