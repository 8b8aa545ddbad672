//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! - `ModelBackend` - Text generation over a conversation (one-shot and streaming)
//! - `SessionStore` - Append-only per-session message history

mod model_backend;
mod session_store;

pub use model_backend::{
    BackendError, BackendInfo, FragmentStream, Message, MessageRole, ModelBackend,
};
pub use session_store::SessionStore;
