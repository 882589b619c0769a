use crate::llm::{ChatClient, ChatRequest, StructuredResponse};
use crate::types::{Candidate, Draft, Judgment};
use std::sync::Arc;
use tracing::{info, warn};

/// Produces post drafts from a selected candidate, folding critique
/// feedback into revision prompts.
pub struct Drafter {
    chat: Arc<dyn ChatClient>,
    target_length: usize,
}

impl Drafter {
    pub fn new(chat: Arc<dyn ChatClient>, target_length: usize) -> Self {
        Self {
            chat,
            target_length,
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            r#"You are a Senior Tech Journalist writing for a short-form social platform.

YOUR TASK:
Write a viral, engaging post about the provided news article.

GUIDELINES:
1. Hook: Start with a strong insight or breaking news alert.
2. Value: Explain the impact for AI engineers.
3. Tone: Professional, concise, no marketing fluff.
4. Constraints: EXTREMELY SHORT. Max {} characters. NO threads.

OUTPUT FORMAT:
Return a JSON object:
{{"content": "<the post text>", "reasoning": "<explanation of the chosen style and tone>"}}"#,
            self.target_length
        )
    }

    /// Generate a draft. When a judgment from the previous round is present
    /// its feedback is folded into the prompt; a length rejection switches
    /// the instruction to aggressive shortening instead of a generic
    /// rewrite. Malformed output or a transport failure yields `None`.
    pub async fn draft(
        &self,
        candidate: &Candidate,
        prior_draft: Option<&Draft>,
        latest_judgment: Option<&Judgment>,
    ) -> Option<Draft> {
        let mut user = format!("SOURCE MATERIAL:\n{}", candidate.to_markdown());

        if let Some(judgment) = latest_judgment {
            let instruction = if judgment.feedback.contains("Too long") {
                "CRITICAL: The text is too long. REMOVE all adjectives. REMOVE hashtags if needed. Make it 50% shorter."
            } else {
                "Rewrite the post to address this feedback explicitly."
            };

            let previous_content = prior_draft.map(|d| d.content.as_str()).unwrap_or("N/A");
            let previous_len = prior_draft.map(|d| d.content.chars().count()).unwrap_or(0);

            info!("Drafter received feedback: {}", judgment.feedback);

            user.push_str(&format!(
                r#"

IMPORTANT: FEEDBACK ON PREVIOUS VERSION
Your previous draft was REJECTED with score {}/10.

PREVIOUS DRAFT ({} chars):
{}

EDITOR FEEDBACK:
"{}"

INSTRUCTION:
{}
Target length: < {} characters."#,
                judgment.score,
                previous_len,
                previous_content,
                judgment.feedback,
                instruction,
                self.target_length
            ));
        }

        let request = ChatRequest {
            system: self.system_prompt(),
            user,
            temperature: 0.7,
        };

        let raw = match self.chat.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Draft generation call failed: {}", e);
                return None;
            }
        };

        match StructuredResponse::<Draft>::from_raw(&raw) {
            StructuredResponse::Parsed(mut draft) => {
                // Media always comes from the candidate, never from the model.
                draft.media_files = candidate.image_url.iter().cloned().collect();

                info!(
                    "Draft generated ({} chars): {}",
                    draft.content.chars().count(),
                    draft.content.chars().take(50).collect::<String>()
                );
                Some(draft)
            }
            StructuredResponse::Malformed(raw) => {
                warn!(
                    "Malformed draft reply: {}",
                    raw.chars().take(120).collect::<String>()
                );
                None
            }
        }
    }
}
