//! Application layer - Command handlers.
//!
//! This layer orchestrates domain stages and coordinates between ports.

pub mod handlers;

pub use handlers::{
    EnrichPromptCommand, EnrichPromptHandler, EnrichPromptResult, EnrichmentError,
    ExecuteChatCommand, ExecuteChatError, ExecuteChatHandler, ExecutionEvent, ExecutionState,
    ExecutionStream, PromptRole,
};
