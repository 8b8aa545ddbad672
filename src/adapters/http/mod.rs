//! HTTP adapters - REST API implementations.

pub mod refinery;

pub use refinery::{refinery_router, RefineryAppState};
