//! Prompt Refinery - Prompt enrichment and streamed chat execution
//!
//! This crate rewrites rough user requests into structured prompts through a
//! language model, then executes either version against a conversational
//! backend with streamed, cancellable output.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
