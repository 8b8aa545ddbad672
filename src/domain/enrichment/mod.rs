//! Enrichment module - Turning raw user text into a model-ready prompt.
//!
//! The pipeline runs three stages over an `EnrichmentContext`:
//!
//! 1. `normalize` - whitespace cleanup and length cap
//! 2. `screen` - denylist check that only adds safety flags
//! 3. rewrite - meta-prompt construction here, model call in the handler
//!
//! Stages take the context by value and return the next version.

mod context;
mod normalize;
mod presentation;
mod rewrite;
mod safety;

pub use context::{EnrichmentContext, IntentLevel, DEFAULT_INTENT, DEFAULT_LANGUAGE};
pub use normalize::{normalize, normalize_text, MAX_NORMALIZED_CHARS};
pub use presentation::{present, PART_SEPARATOR};
pub use rewrite::{build_meta_prompt, persona_instructions, REFUSAL, SYSTEM_FRAMING};
pub use safety::{find_denylisted, screen, DENYLIST, UNSAFE_KEYWORD_DETECTED};
