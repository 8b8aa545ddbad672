//! Application handlers.
//!
//! - `enrich_prompt` - the enrichment pipeline entry point
//! - `execute_chat` - the streaming execution coordinator

pub mod enrich_prompt;
pub mod execute_chat;

pub use enrich_prompt::{
    EnrichPromptCommand, EnrichPromptHandler, EnrichPromptResult, EnrichmentError,
};
pub use execute_chat::{
    ExecuteChatCommand, ExecuteChatError, ExecuteChatHandler, ExecutionEvent, ExecutionState,
    ExecutionStream, PromptRole,
};
