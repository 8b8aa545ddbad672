//! Presentation of pipeline output as plain text.

use crate::ports::{Message, MessageRole};

/// Separator placed between system and user parts of a multi-message result.
pub const PART_SEPARATOR: &str = "\n\n---\n\n";

/// Converts pipeline output into a single display string.
///
/// A lone message is returned as-is. Otherwise the system parts and then the
/// user parts are joined with `PART_SEPARATOR`.
pub fn present(messages: &[Message]) -> String {
    if let [only] = messages {
        return only.content.clone();
    }

    let system = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str());
    let user = messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str());

    system.chain(user).collect::<Vec<_>>().join(PART_SEPARATOR)
}
