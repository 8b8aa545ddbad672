//! Domain layer containing the refinery's core types and pure stages.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors, state machine)
//! - `enrichment` - Enrichment context and the normalize/screen/rewrite stages

pub mod enrichment;
pub mod foundation;
