//! Rewrite stage prompt construction.
//!
//! Builds the two-message conversation sent to the model when a request is
//! rewritten, and holds the fixed refusal returned for flagged requests.
//! The model call itself lives in the enrichment handler.

use super::{EnrichmentContext, IntentLevel};

/// Returned instead of a rewrite when any safety flag is raised.
pub const REFUSAL: &str = "I can't help rewrite this request because it appears to contain \
unsafe or instruction-overriding content. Please rephrase it and try again.";

/// Fixed system framing for every rewrite call.
pub const SYSTEM_FRAMING: &str = "You are a prompt-rewriting specialist. You transform rough \
user requests into clear, well-structured prompts for a conversational model. You never answer \
the request yourself.";

/// Fixed instruction block for an intent level, embedded verbatim into the
/// meta-prompt.
pub fn persona_instructions(level: IntentLevel) -> &'static str {
    match level {
        IntentLevel::Casual => {
            "Persona: friendly guide.\n\
             - Use a warm, conversational tone.\n\
             - Favor intuitive explanations and everyday examples.\n\
             - Avoid jargon unless the user already uses it."
        }
        IntentLevel::Academic => {
            "Persona: academic expert.\n\
             - Use a formal, precise register.\n\
             - Ask for a structured answer with clear sections.\n\
             - Request definitions, evidence, and references where relevant."
        }
        IntentLevel::Concise => {
            "Persona: efficient assistant.\n\
             - Ask for a short, direct answer.\n\
             - Prefer bullet points over paragraphs.\n\
             - Exclude background the user did not ask for."
        }
        IntentLevel::DeepDive => {
            "Persona: subject-matter researcher.\n\
             - Ask for a comprehensive, in-depth treatment.\n\
             - Request underlying theory, trade-offs, and edge cases.\n\
             - Encourage worked examples and connections to related topics."
        }
    }
}

/// Builds the meta-prompt that asks the model to rewrite the user's text.
pub fn build_meta_prompt(ctx: &EnrichmentContext) -> String {
    format!(
        "Rewrite the user's request below into a higher-quality prompt.\n\
         \n\
         Rules:\n\
         - Preserve the user's original intent exactly.\n\
         - Improve clarity, structure, and robustness.\n\
         - Do NOT answer or fulfil the request.\n\
         - Do NOT add greetings, preamble, or commentary.\n\
         - Output only the rewritten prompt.\n\
         \n\
         {persona}\n\
         \n\
         Language: {language}\n\
         \n\
         User request:\n\
         \"\"\"\n\
         {request}\n\
         \"\"\"",
        persona = persona_instructions(ctx.intent_level),
        language = ctx.language,
        request = ctx.user_message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;

    #[test]
    fn every_level_has_distinct_instructions() {
        let levels = [
            IntentLevel::Casual,
            IntentLevel::Academic,
            IntentLevel::Concise,
            IntentLevel::DeepDive,
        ];
        for (i, a) in levels.iter().enumerate() {
            for b in levels.iter().skip(i + 1) {
                assert_ne!(persona_instructions(*a), persona_instructions(*b));
            }
        }
    }

    #[test]
    fn meta_prompt_embeds_request_and_persona() {
        let ctx = EnrichmentContext::new(
            SessionId::new(),
            "explain rust lifetimes",
            IntentLevel::Academic,
        );

        let prompt = build_meta_prompt(&ctx);

        assert!(prompt.contains("explain rust lifetimes"));
        assert!(prompt.contains(persona_instructions(IntentLevel::Academic)));
        assert!(prompt.contains("Do NOT answer"));
    }

    #[test]
    fn refusal_is_not_empty() {
        assert!(!REFUSAL.trim().is_empty());
    }
}
