#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use newsroom::history::ProcessedSet;
use newsroom::llm::{ChatClient, ChatRequest};
use newsroom::sources::CandidateSource;
use newsroom::publisher::DeliveryClient;
use newsroom::types::{Candidate, NewsroomError, Result, Topic};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted chat reply: either text handed back verbatim, or a
/// simulated transport failure.
pub enum Reply {
    Text(String),
    Fail,
}

/// Chat collaborator test double that replays a fixed script and records
/// every request it receives.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn silent() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail) => Err(NewsroomError::Llm("scripted transport failure".to_string())),
            None => Err(NewsroomError::Llm("chat script exhausted".to_string())),
        }
    }
}

/// Candidate source test double serving canned candidates per topic name.
pub struct StaticSource {
    by_topic: HashMap<String, Vec<Candidate>>,
    fetch_calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(by_topic: HashMap<String, Vec<Candidate>>) -> Arc<Self> {
        Arc::new(Self {
            by_topic,
            fetch_calls: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(HashMap::new())
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandidateSource for StaticSource {
    async fn fetch(&self, topic: &Topic, history: &ProcessedSet) -> Vec<Candidate> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.by_topic
            .get(&topic.name)
            .map(|candidates| {
                candidates
                    .iter()
                    .filter(|c| !history.contains(&c.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Delivery test double replaying scripted results and recording what
/// was posted.
pub struct ScriptedDelivery {
    replies: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
    posted: Mutex<Vec<String>>,
}

impl ScriptedDelivery {
    pub fn new(replies: Vec<Option<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            posted: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryClient for ScriptedDelivery {
    async fn deliver(&self, text: &str, _media: &[String]) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.posted.lock().unwrap().push(text.to_string());
        self.replies.lock().unwrap().pop_front().flatten()
    }
}

pub fn candidate(id: &str, title: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("Body text for {}", title),
        source: "Test Wire".to_string(),
        published_at: Utc::now(),
        image_url: None,
    }
}

pub fn topic(name: &str, weight: f64) -> Topic {
    Topic {
        name: name.to_string(),
        weight,
        feeds: Vec::new(),
    }
}

pub fn draft_json(content: &str) -> String {
    serde_json::json!({
        "content": content,
        "reasoning": "Strong hook, concrete detail."
    })
    .to_string()
}

pub fn judgment_json(score: u8, approved: bool, feedback: &str) -> String {
    serde_json::json!({
        "score": score,
        "feedback": feedback,
        "is_approved": approved
    })
    .to_string()
}

/// Fresh ProcessedSet backed by a temp file; returns the dir so it lives
/// as long as the test.
pub fn temp_history() -> (tempfile::TempDir, Arc<ProcessedSet>) {
    let dir = tempfile::tempdir().unwrap();
    let set = Arc::new(ProcessedSet::load(dir.path().join("history.json")));
    (dir, set)
}
