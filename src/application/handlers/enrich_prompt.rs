//! EnrichPrompt command handler.
//!
//! Runs the enrichment pipeline (normalize, safety screen, rewrite) over one
//! raw request. The rewrite stage is the only one that calls the backend,
//! once and non-streaming.
//!
//! Backend failures never fail the request: the rewrite falls back to the
//! normalized text. Cancellation is the only error the caller sees.

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::enrichment::{
    build_meta_prompt, normalize, present, screen, EnrichmentContext, IntentLevel, REFUSAL,
    SYSTEM_FRAMING,
};
use crate::domain::foundation::SessionId;
use crate::ports::{Message, ModelBackend};

/// Command to enrich a raw user request.
#[derive(Debug, Clone)]
pub struct EnrichPromptCommand {
    /// Raw user text.
    pub text: String,
    /// Session to associate with; a new one is generated when absent.
    pub session_id: Option<SessionId>,
    /// Persona preset for the rewrite.
    pub intent_level: IntentLevel,
}

impl EnrichPromptCommand {
    /// Creates a command with the default intent level and a fresh session.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
            intent_level: IntentLevel::default(),
        }
    }

    /// Sets the session.
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Sets the intent level.
    pub fn with_intent_level(mut self, intent_level: IntentLevel) -> Self {
        self.intent_level = intent_level;
        self
    }
}

/// Result of an enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichPromptResult {
    /// Pipeline output; always a single assistant message.
    pub messages: Vec<Message>,
    /// Final context, for language, intent, and safety metadata.
    pub context: EnrichmentContext,
}

impl EnrichPromptResult {
    /// Output formatted for display.
    pub fn presented(&self) -> String {
        present(&self.messages)
    }
}

/// Errors that escape the enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentError {
    /// The caller cancelled the request.
    #[error("enrichment cancelled")]
    Cancelled,
}

/// Handler for enrichment requests.
pub struct EnrichPromptHandler {
    backend: Arc<dyn ModelBackend>,
}

impl EnrichPromptHandler {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    /// Runs the full pipeline.
    pub async fn handle(
        &self,
        cmd: EnrichPromptCommand,
        cancel: CancellationToken,
    ) -> Result<EnrichPromptResult, EnrichmentError> {
        let session_id = cmd.session_id.unwrap_or_default();
        let ctx = EnrichmentContext::new(session_id, cmd.text, cmd.intent_level);

        let ctx = normalize(ctx);
        let ctx = screen(ctx);
        let rewritten = self.rewrite(&ctx, cancel).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            session_id = %ctx.session_id,
            intent_level = %ctx.intent_level,
            flagged = ctx.is_flagged(),
            "Prompt enriched"
        );

        Ok(EnrichPromptResult {
            messages: vec![Message::assistant(rewritten)],
            context: ctx,
        })
    }

    /// Rewrite stage.
    ///
    /// Returns the refusal without calling the backend when the context is
    /// flagged. Otherwise asks the backend for a rewrite and falls back to the
    /// context's message on any failure other than cancellation.
    pub async fn rewrite(
        &self,
        ctx: &EnrichmentContext,
        cancel: CancellationToken,
    ) -> Result<String, EnrichmentError> {
        if ctx.is_flagged() {
            return Ok(REFUSAL.to_string());
        }
        if cancel.is_cancelled() {
            return Err(EnrichmentError::Cancelled);
        }

        let messages = [
            Message::system(SYSTEM_FRAMING),
            Message::user(build_meta_prompt(ctx)),
        ];

        match self.backend.chat(&messages, cancel).await {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    "Backend returned an empty rewrite, using normalized text"
                );
                Ok(ctx.user_message.clone())
            }
            Err(e) if e.is_cancelled() => Err(EnrichmentError::Cancelled),
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    backend = %self.backend.describe().name,
                    error = %e,
                    "Rewrite failed, using normalized text"
                );
                Ok(ctx.user_message.clone())
            }
        }
    }
}
