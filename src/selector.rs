use crate::llm::{ChatClient, ChatRequest, StructuredResponse};
use crate::types::Candidate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = r#"You are a Lead Editor for an AI News Channel.
You have a list of potential news stories.

YOUR TASK:
Select the SINGLE most important, viral, or technically significant story to publish right now.
Ignore fluff, marketing, or minor updates. Look for breakthroughs, major releases, or drama.

OUTPUT FORMAT:
Return a JSON object with the 0-based 'index' of the selected story and your 'reasoning':
{"index": <int>, "reasoning": "<why this is the most impactful story>"}"#;

#[derive(Debug, Deserialize)]
struct Selection {
    index: usize,
    #[serde(default)]
    reasoning: String,
}

/// Picks the single most newsworthy candidate from a non-empty list.
pub struct Selector {
    chat: Arc<dyn ChatClient>,
}

impl Selector {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// The returned reference is always a member of `candidates`. On a
    /// malformed reply, transport failure, or out-of-range index the
    /// selection falls back to the first candidate.
    pub async fn choose<'a>(&self, candidates: &'a [Candidate]) -> &'a Candidate {
        debug_assert!(!candidates.is_empty());

        let titles = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {} (Source: {})", i, c.title, c.source))
            .collect::<Vec<_>>()
            .join("\n");

        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: format!("Here are the candidate stories:\n\n{}", titles),
            temperature: 0.1,
        };

        let raw = match self.chat.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Selection call failed, falling back to first candidate: {}", e);
                return &candidates[0];
            }
        };

        match StructuredResponse::<Selection>::from_raw(&raw) {
            StructuredResponse::Parsed(selection) => {
                if let Some(chosen) = candidates.get(selection.index) {
                    info!(
                        "Selected story '{}' (index {}): {}",
                        chosen.title, selection.index, selection.reasoning
                    );
                    chosen
                } else {
                    warn!(
                        "Selection index {} out of range (max {}), falling back to first candidate",
                        selection.index,
                        candidates.len() - 1
                    );
                    &candidates[0]
                }
            }
            StructuredResponse::Malformed(raw) => {
                warn!(
                    "Malformed selection reply, falling back to first candidate: {}",
                    raw.chars().take(120).collect::<String>()
                );
                &candidates[0]
            }
        }
    }
}
