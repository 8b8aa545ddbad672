//! Enrichment context carried through the pipeline stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::foundation::{RequestId, SessionId};

/// Language tag assigned when nothing more specific is known.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Intent category assigned when nothing more specific is known.
pub const DEFAULT_INTENT: &str = "general";

/// Per-call state flowing through the enrichment stages.
///
/// Created fresh for every enrichment call and passed by value: each stage
/// consumes the context and returns the next version. Safety flags can only
/// be added, never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentContext {
    /// Unique id of this enrichment call.
    pub request_id: RequestId,
    /// Session the caller is working in.
    pub session_id: SessionId,
    /// Current text of the user's request.
    pub user_message: String,
    /// Persona preset for the rewrite.
    pub intent_level: IntentLevel,
    /// Language tag of the request.
    pub language: String,
    /// Intent category of the request.
    pub intent: String,
    safety_flags: BTreeSet<String>,
}

impl EnrichmentContext {
    /// Creates a context for a new enrichment call.
    pub fn new(
        session_id: SessionId,
        user_message: impl Into<String>,
        intent_level: IntentLevel,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            session_id,
            user_message: user_message.into(),
            intent_level,
            language: DEFAULT_LANGUAGE.to_string(),
            intent: DEFAULT_INTENT.to_string(),
            safety_flags: BTreeSet::new(),
        }
    }

    /// Returns the next version with a replaced user message.
    pub fn with_user_message(mut self, user_message: impl Into<String>) -> Self {
        self.user_message = user_message.into();
        self
    }

    /// Returns the next version with an added safety flag.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.safety_flags.insert(flag.into());
        self
    }

    /// Safety flags raised so far.
    pub fn safety_flags(&self) -> &BTreeSet<String> {
        &self.safety_flags
    }

    /// Returns true if any safety flag was raised.
    pub fn is_flagged(&self) -> bool {
        !self.safety_flags.is_empty()
    }
}

/// Caller-selected persona/tone preset for the rewrite.
///
/// Parsing is total: unrecognized or missing values become `Casual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum IntentLevel {
    /// Friendly, intuitive framing.
    #[default]
    Casual,
    /// Formal, structured framing.
    Academic,
    /// Short, direct framing.
    Concise,
    /// Comprehensive, theoretical framing.
    DeepDive,
}

impl IntentLevel {
    /// Parses a caller-supplied level, falling back to `Casual`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "academic" => IntentLevel::Academic,
            "concise" => IntentLevel::Concise,
            "deep-dive" | "deep_dive" | "deepdive" => IntentLevel::DeepDive,
            _ => IntentLevel::Casual,
        }
    }

    /// Parses an optional level, falling back to `Casual`.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.map(Self::parse).unwrap_or_default()
    }

    /// Canonical name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentLevel::Casual => "casual",
            IntentLevel::Academic => "academic",
            IntentLevel::Concise => "concise",
            IntentLevel::DeepDive => "deep-dive",
        }
    }
}

impl From<String> for IntentLevel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for IntentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
