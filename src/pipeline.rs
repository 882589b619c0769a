use crate::controller::{RetryController, RetryVerdict};
use crate::history::ProcessedSet;
use crate::publisher::Publisher;
use crate::selector::Selector;
use crate::sources::CandidateSource;
use crate::types::{RunOutcome, RunState, Topic};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Outer controller: draws topics until one yields candidates, then runs
/// the select -> draft/critique -> publish chain exactly once.
pub struct Pipeline {
    topics: Vec<Topic>,
    source: Arc<dyn CandidateSource>,
    selector: Selector,
    controller: RetryController,
    publisher: Publisher,
    history: Arc<ProcessedSet>,
}

impl Pipeline {
    pub fn new(
        topics: Vec<Topic>,
        source: Arc<dyn CandidateSource>,
        selector: Selector,
        controller: RetryController,
        publisher: Publisher,
        history: Arc<ProcessedSet>,
    ) -> Self {
        Self {
            topics,
            source,
            selector,
            controller,
            publisher,
            history,
        }
    }

    /// Execute one full run. Topics that yield zero fresh candidates are
    /// marked tried and never redrawn within this run; once a candidate
    /// enters the retry loop, its terminal verdict is the run's verdict
    /// and no other topic is attempted afterwards.
    pub async fn run(&self) -> RunOutcome {
        let mut state = RunState::new();
        self.run_with_state(&mut state).await
    }

    /// Like [`run`](Self::run), but threads a caller-owned [`RunState`]
    /// so the judgment history and tried-topic set stay inspectable.
    pub async fn run_with_state(&self, state: &mut RunState) -> RunOutcome {
        let run_id = Uuid::new_v4();
        info!("Starting pipeline run {}", run_id);

        let mut rng = rand::thread_rng();

        let candidates = loop {
            let topic = match pick_weighted(&self.topics, state, &mut rng) {
                Some(topic) => topic.clone(),
                None => {
                    warn!("No news found in any topic; halting run {}", run_id);
                    state.finish(RunOutcome::NoNews);
                    return RunOutcome::NoNews;
                }
            };

            state.tried_topics.insert(topic.name.clone());
            state.topic = Some(topic.name.clone());
            info!("Topic selected: {}", topic.name);

            let candidates = self.source.fetch(&topic, &self.history).await;
            if candidates.is_empty() {
                info!("No fresh news for topic '{}'; trying another", topic.name);
                continue;
            }
            break candidates;
        };

        let chosen = self.selector.choose(&candidates).await.clone();
        info!("Developing story: {}", chosen.title);

        let verdict = self.controller.run(&chosen, state).await;

        let outcome = match verdict {
            RetryVerdict::Approved(draft) => {
                match self.publisher.publish(&draft, &chosen).await {
                    Some(post_id) => RunOutcome::Published(post_id),
                    None => RunOutcome::DeliveryFailed,
                }
            }
            RetryVerdict::RoundsExhausted => RunOutcome::RoundsExhausted,
            RetryVerdict::DraftFailed => RunOutcome::DraftFailed,
        };

        state.finish(outcome.clone());

        match &outcome {
            RunOutcome::Published(id) => info!("Run {} finished: published {}", run_id, id),
            other => warn!("Run {} finished without publishing: {:?}", run_id, other),
        }
        outcome
    }
}

/// Cumulative-weight draw over the topics not yet tried in this run.
/// Returns `None` when every topic has been tried.
pub fn pick_weighted<'a>(
    topics: &'a [Topic],
    state: &RunState,
    rng: &mut impl Rng,
) -> Option<&'a Topic> {
    let untried: Vec<&Topic> = topics
        .iter()
        .filter(|t| !state.tried_topics.contains(&t.name))
        .collect();

    if untried.is_empty() {
        return None;
    }

    let total: f64 = untried.iter().map(|t| t.weight.max(0.0)).sum();
    if total <= 0.0 {
        // All-zero weights degrade to uniform choice over the untried list.
        return Some(untried[rng.gen_range(0..untried.len())]);
    }

    let mut draw = rng.gen_range(0.0..total);
    for topic in &untried {
        draw -= topic.weight.max(0.0);
        if draw < 0.0 {
            return Some(topic);
        }
    }
    untried.last().copied()
}
