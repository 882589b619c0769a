use crate::drafter::Drafter;
use crate::evaluator::Evaluator;
use crate::types::{Candidate, Draft, RunState};
use tracing::{info, warn};

/// Why the loop stopped without an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    DraftFailed,
    RoundsExhausted,
}

/// Phases of the draft/critique loop for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum RunPhase {
    Idle,
    NeedsDraft,
    NeedsEvaluation,
    Approved(Draft),
    Exhausted(ExhaustReason),
}

/// Terminal verdict of the retry loop for one candidate.
#[derive(Debug, Clone)]
pub enum RetryVerdict {
    /// The evaluator approved this draft.
    Approved(Draft),
    /// `max_rounds` drafts were rejected; no further draft is requested.
    RoundsExhausted,
    /// The drafter failed to produce a draft at all.
    DraftFailed,
}

/// Bounded draft/critique controller.
///
/// Drives `Idle -> NeedsDraft -> NeedsEvaluation -> (Approved | NeedsDraft | Exhausted)`
/// over a single candidate. The round counter equals the number of rejected
/// judgments so far; after the `max_rounds`-th rejection the next phase is
/// always `Exhausted`. The evaluator's deterministic length pre-check is just
/// one path through `NeedsEvaluation` and gets no special casing here.
pub struct RetryController {
    drafter: Drafter,
    evaluator: Evaluator,
    max_rounds: u32,
}

impl RetryController {
    pub fn new(drafter: Drafter, evaluator: Evaluator, max_rounds: u32) -> Self {
        Self {
            drafter,
            evaluator,
            max_rounds,
        }
    }

    pub async fn run(&self, candidate: &Candidate, state: &mut RunState) -> RetryVerdict {
        if state.is_finished() {
            warn!("Retry controller invoked on a finished run");
            return RetryVerdict::DraftFailed;
        }

        state.candidate = Some(candidate.clone());
        let source_material = candidate.to_markdown();
        let mut phase = RunPhase::Idle;

        loop {
            phase = match phase {
                RunPhase::Idle => RunPhase::NeedsDraft,

                RunPhase::NeedsDraft => {
                    let draft = self
                        .drafter
                        .draft(candidate, state.draft.as_ref(), state.latest_judgment())
                        .await;

                    match draft {
                        Some(draft) => {
                            state.draft = Some(draft);
                            RunPhase::NeedsEvaluation
                        }
                        None => {
                            warn!("Drafter produced no draft; giving up on this candidate");
                            RunPhase::Exhausted(ExhaustReason::DraftFailed)
                        }
                    }
                }

                RunPhase::NeedsEvaluation => {
                    let draft = match state.draft.clone() {
                        Some(draft) => draft,
                        // Unreachable by construction; treated as a failed draft.
                        None => return RetryVerdict::DraftFailed,
                    };

                    let judgment = self.evaluator.evaluate(&draft, &source_material).await;

                    if judgment.is_approved {
                        info!(
                            "Draft approved with score {} after {} rejected round(s)",
                            judgment.score, state.rounds
                        );
                        RunPhase::Approved(draft)
                    } else {
                        state.history.push(judgment);
                        state.rounds = state.history.len() as u32;

                        if state.rounds >= self.max_rounds {
                            info!("Max rounds reached ({} rejections); stopping", state.rounds);
                            RunPhase::Exhausted(ExhaustReason::RoundsExhausted)
                        } else {
                            info!(
                                "Draft rejected (round {}/{}), redrafting with feedback",
                                state.rounds, self.max_rounds
                            );
                            RunPhase::NeedsDraft
                        }
                    }
                }

                RunPhase::Approved(draft) => return RetryVerdict::Approved(draft),

                RunPhase::Exhausted(ExhaustReason::DraftFailed) => {
                    return RetryVerdict::DraftFailed
                }
                RunPhase::Exhausted(ExhaustReason::RoundsExhausted) => {
                    return RetryVerdict::RoundsExhausted
                }
            };
        }
    }
}
