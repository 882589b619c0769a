pub mod config;
pub mod controller;
pub mod drafter;
pub mod evaluator;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod publisher;
pub mod selector;
pub mod sources;
pub mod types;

pub use config::AppConfig;
pub use controller::{RetryController, RetryVerdict, RunPhase};
pub use drafter::Drafter;
pub use evaluator::Evaluator;
pub use history::ProcessedSet;
pub use llm::{ChatClient, ChatRequest, OpenAiChatClient, StructuredResponse};
pub use pipeline::{pick_weighted, Pipeline};
pub use publisher::{DeliveryClient, HttpDeliveryClient, Publisher};
pub use selector::Selector;
pub use sources::{CandidateSource, NewsSource};
pub use types::*;
