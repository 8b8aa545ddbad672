//! Adapters - Implementations of port interfaces.
//!
//! - `backends` - Model backends (simulated, local inference, hosted)
//! - `session` - Conversation history stores
//! - `http` - REST and SSE endpoints

pub mod backends;
pub mod http;
pub mod session;

pub use backends::{Backend, BackendKind};
pub use session::InMemorySessionStore;
