use crate::llm::{ChatClient, ChatRequest, StructuredResponse};
use crate::types::{Draft, Judgment};
use std::sync::Arc;
use tracing::{info, warn};

const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a Senior Chief Editor at a top-tier tech news outlet.
Your job is to CRITIQUE the provided post draft based on the source articles.

CRITERIA:
1. Length: Is it strictly under {max_length} characters? (CRITICAL - Reject immediately if longer).
2. Factuality: Does the post contradict the source articles?
3. Value: Is it boring? Does it lack specific details?
4. Style: Is it cringe? (Too many emojis, robotic phrasing).

SCORING:
- 1-5: Reject. Factual errors or OVER {max_length} CHARACTERS.
- 6-7: Reject. Needs polish (better hook, make it shorter).
- 8-10: Approve. Ready for publication.

OUTPUT FORMAT:
Return a JSON object:
{"score": <int 1-10>, "feedback": "<what to improve>", "is_approved": <bool>}"#;

/// Critiques drafts. The length rule is enforced deterministically before
/// the chat collaborator is ever consulted, so it cannot be bypassed by
/// collaborator noise or saved on by skipping a call.
pub struct Evaluator {
    chat: Arc<dyn ChatClient>,
    max_length: usize,
}

impl Evaluator {
    pub fn new(chat: Arc<dyn ChatClient>, max_length: usize) -> Self {
        Self { chat, max_length }
    }

    /// Evaluate a draft against its source material. Never returns an
    /// error: collaborator failures become a synthesized minimum-score
    /// rejection.
    pub async fn evaluate(&self, draft: &Draft, source_material: &str) -> Judgment {
        let draft_len = draft.content.chars().count();
        if draft_len > self.max_length {
            warn!("Draft is too long ({} chars), rejecting automatically", draft_len);
            return Judgment {
                score: 2,
                is_approved: false,
                feedback: format!(
                    "Too long! The draft is {} characters, but the limit is {}. Shorten it significantly.",
                    draft_len, self.max_length
                ),
            };
        }

        let system = SYSTEM_PROMPT_TEMPLATE.replace("{max_length}", &self.max_length.to_string());
        let user = format!(
            "--- SOURCE ARTICLES ---\n{}\n\n--- PROPOSED POST DRAFT ---\n{}\n\n--- REASONING GIVEN BY WRITER ---\n{}",
            source_material, draft.content, draft.reasoning
        );

        let request = ChatRequest {
            system,
            user,
            temperature: 0.0,
        };

        let raw = match self.chat.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Critique call failed: {}", e);
                return Self::system_error_judgment();
            }
        };

        match StructuredResponse::<Judgment>::from_raw(&raw) {
            StructuredResponse::Parsed(judgment) => {
                // The rubric is 1-10; anything else is collaborator noise
                // and gets discarded like an unparseable reply.
                if !(1..=10).contains(&judgment.score) {
                    warn!("Critique score {} is outside 1-10, discarding", judgment.score);
                    return Self::system_error_judgment();
                }
                info!(
                    "Critique generated: score {} approved {}",
                    judgment.score, judgment.is_approved
                );
                judgment
            }
            StructuredResponse::Malformed(raw) => {
                warn!(
                    "Malformed critique reply: {}",
                    raw.chars().take(120).collect::<String>()
                );
                Self::system_error_judgment()
            }
        }
    }

    fn system_error_judgment() -> Judgment {
        Judgment {
            score: 1,
            feedback: "System error during critique.".to_string(),
            is_approved: false,
        }
    }
}
