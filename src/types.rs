use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One sourced news item eligible for drafting.
/// The `id` is the canonical article URL and doubles as the dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
}

impl Candidate {
    /// Format the candidate as prompt source material.
    pub fn to_markdown(&self) -> String {
        let mut md = format!(
            "# {}\n\nSource: {}\nLink: {}\n\n{}",
            self.title, self.source, self.id, self.content
        );
        if let Some(ref image) = self.image_url {
            md.push_str(&format!("\n\n![Image]({})", image));
        }
        md
    }
}

/// A single feed inside a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSpec {
    pub title: String,
    pub url: String,
}

/// A weighted bucket of feeds. The weight drives probabilistic topic
/// selection; topics already tried within a run are excluded from redraws.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub feeds: Vec<FeedSpec>,
}

fn default_weight() -> f64 {
    1.0
}

/// One generated attempt at final publishable text.
/// A new instance replaces the previous one each round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub content: String,
    #[serde(default)]
    pub media_files: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

/// One evaluation outcome for a draft. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub score: u8,
    pub feedback: String,
    pub is_approved: bool,
}

/// Final, immutable outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A post went out; holds the delivery identifier.
    Published(String),
    /// Every topic was tried and none yielded fresh candidates.
    NoNews,
    /// The draft was rejected `max_rounds` times.
    RoundsExhausted,
    /// The drafter failed to produce any draft for the candidate.
    DraftFailed,
    /// The approved draft could not be delivered.
    DeliveryFailed,
}

/// The single mutable aggregate threaded through one pipeline run.
///
/// Invariant: `rounds == history.len()` except transiently between a fresh
/// draft and its evaluation. The history records rejections only and is
/// append-only; an approval terminates the run without appending.
#[derive(Debug, Default)]
pub struct RunState {
    pub topic: Option<String>,
    pub candidate: Option<Candidate>,
    pub draft: Option<Draft>,
    pub history: Vec<Judgment>,
    pub rounds: u32,
    pub tried_topics: HashSet<String>,
    outcome: Option<RunOutcome>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the terminal outcome. First write wins; once set, the run is
    /// over and later calls are ignored.
    pub fn finish(&mut self, outcome: RunOutcome) {
        if self.outcome.is_some() {
            tracing::warn!("Run already finished; ignoring outcome {:?}", outcome);
            return;
        }
        self.outcome = Some(outcome);
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn latest_judgment(&self) -> Option<&Judgment> {
        self.history.last()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NewsroomError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, NewsroomError>;
