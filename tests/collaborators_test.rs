mod common;

use common::*;
use newsroom::types::{Draft, Judgment};
use newsroom::{Drafter, Evaluator, Selector};

fn draft(content: &str) -> Draft {
    Draft {
        content: content.to_string(),
        media_files: Vec::new(),
        reasoning: "test".to_string(),
    }
}

#[tokio::test]
async fn length_precheck_rejects_without_calling_collaborator() {
    let chat = ScriptedChat::silent();
    let evaluator = Evaluator::new(chat.clone(), 280);

    let long_draft = draft(&"x".repeat(300));
    let judgment = evaluator.evaluate(&long_draft, "source material").await;

    assert!(!judgment.is_approved);
    assert_eq!(judgment.score, 2);
    assert!(judgment.feedback.contains("300"));
    assert!(judgment.feedback.contains("280"));
    assert_eq!(chat.call_count(), 0, "pre-check must never reach the LLM");
}

#[tokio::test]
async fn draft_at_exactly_the_limit_goes_to_the_collaborator() {
    let chat = ScriptedChat::new(vec![Reply::Text(judgment_json(8, true, "Tight."))]);
    let evaluator = Evaluator::new(chat.clone(), 280);

    let judgment = evaluator.evaluate(&draft(&"y".repeat(280)), "source").await;

    assert!(judgment.is_approved);
    assert_eq!(chat.call_count(), 1);
}

#[tokio::test]
async fn evaluator_transport_failure_yields_system_error_judgment() {
    let chat = ScriptedChat::new(vec![Reply::Fail]);
    let evaluator = Evaluator::new(chat, 280);

    let judgment = evaluator.evaluate(&draft("fine length"), "source").await;

    assert!(!judgment.is_approved);
    assert_eq!(judgment.score, 1);
    assert_eq!(judgment.feedback, "System error during critique.");
}

#[tokio::test]
async fn evaluator_malformed_reply_yields_system_error_judgment() {
    let chat = ScriptedChat::new(vec![Reply::Text("five out of ten I guess".to_string())]);
    let evaluator = Evaluator::new(chat, 280);

    let judgment = evaluator.evaluate(&draft("fine length"), "source").await;

    assert!(!judgment.is_approved);
    assert_eq!(judgment.score, 1);
}

#[tokio::test]
async fn evaluator_out_of_range_score_yields_system_error_judgment() {
    // A zero score claiming approval must not reach the history.
    let chat = ScriptedChat::new(vec![Reply::Text(judgment_json(0, true, "looks fine"))]);
    let evaluator = Evaluator::new(chat, 280);

    let judgment = evaluator.evaluate(&draft("fine length"), "source").await;

    assert!(!judgment.is_approved);
    assert_eq!(judgment.score, 1);
    assert_eq!(judgment.feedback, "System error during critique.");

    let chat = ScriptedChat::new(vec![Reply::Text(judgment_json(11, true, "stellar"))]);
    let evaluator = Evaluator::new(chat, 280);

    let judgment = evaluator.evaluate(&draft("fine length"), "source").await;
    assert!(!judgment.is_approved);
    assert_eq!(judgment.score, 1);
}

#[tokio::test]
async fn selector_returns_member_of_input() {
    let chat = ScriptedChat::new(vec![Reply::Text(
        r#"{"index": 2, "reasoning": "biggest story"}"#.to_string(),
    )]);
    let selector = Selector::new(chat);

    let candidates = vec![
        candidate("https://example.com/0", "Zero"),
        candidate("https://example.com/1", "One"),
        candidate("https://example.com/2", "Two"),
    ];

    let chosen = selector.choose(&candidates).await;
    assert_eq!(chosen.id, "https://example.com/2");
}

#[tokio::test]
async fn selector_out_of_range_index_falls_back_to_first() {
    let chat = ScriptedChat::new(vec![Reply::Text(
        r#"{"index": 99, "reasoning": "hallucinated"}"#.to_string(),
    )]);
    let selector = Selector::new(chat);

    let candidates = vec![
        candidate("https://example.com/0", "Zero"),
        candidate("https://example.com/1", "One"),
        candidate("https://example.com/2", "Two"),
    ];

    let chosen = selector.choose(&candidates).await;
    assert_eq!(chosen.id, "https://example.com/0");
}

#[tokio::test]
async fn selector_malformed_and_failing_replies_fall_back_to_first() {
    let candidates = vec![
        candidate("https://example.com/0", "Zero"),
        candidate("https://example.com/1", "One"),
    ];

    let malformed = Selector::new(ScriptedChat::new(vec![Reply::Text(
        "the second one looks good".to_string(),
    )]));
    assert_eq!(malformed.choose(&candidates).await.id, "https://example.com/0");

    let failing = Selector::new(ScriptedChat::new(vec![Reply::Fail]));
    assert_eq!(failing.choose(&candidates).await.id, "https://example.com/0");
}

#[tokio::test]
async fn drafter_length_rejection_switches_to_shortening_instruction() {
    let chat = ScriptedChat::new(vec![Reply::Text(draft_json("Trimmed down."))]);
    let drafter = Drafter::new(chat.clone(), 250);

    let cand = candidate("https://example.com/a", "Story A");
    let prior = draft(&"z".repeat(300));
    let judgment = Judgment {
        score: 2,
        feedback: "Too long! The draft is 300 characters, but the limit is 280. Shorten it significantly.".to_string(),
        is_approved: false,
    };

    let result = drafter.draft(&cand, Some(&prior), Some(&judgment)).await;
    assert!(result.is_some());

    let requests = chat.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].user.contains("CRITICAL: The text is too long"));
    assert!(requests[0].user.contains("300 chars"));
}

#[tokio::test]
async fn drafter_generic_rejection_asks_for_a_rewrite() {
    let chat = ScriptedChat::new(vec![Reply::Text(draft_json("Reworked."))]);
    let drafter = Drafter::new(chat.clone(), 250);

    let cand = candidate("https://example.com/a", "Story A");
    let prior = draft("Original take.");
    let judgment = Judgment {
        score: 6,
        feedback: "Lacks a concrete number.".to_string(),
        is_approved: false,
    };

    drafter.draft(&cand, Some(&prior), Some(&judgment)).await;

    let requests = chat.requests();
    assert!(requests[0].user.contains("Rewrite the post to address this feedback"));
    assert!(!requests[0].user.contains("CRITICAL: The text is too long"));
}

#[tokio::test]
async fn drafter_media_always_comes_from_the_candidate() {
    let chat = ScriptedChat::new(vec![Reply::Text(
        serde_json::json!({
            "content": "Post text.",
            "reasoning": "r",
            "media_files": ["https://evil.example.com/injected.png"]
        })
        .to_string(),
    )]);
    let drafter = Drafter::new(chat, 250);

    let mut cand = candidate("https://example.com/a", "Story A");
    cand.image_url = Some("https://example.com/real.jpg".to_string());

    let produced = drafter.draft(&cand, None, None).await.unwrap();
    assert_eq!(produced.media_files, vec!["https://example.com/real.jpg"]);
}
