use crate::history::ProcessedSet;
use crate::types::{Candidate, Draft};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Delivery boundary for the downstream platform. Returns an opaque post
/// identifier on success and `None` on failure; delivery failures are
/// logged by implementations, never raised.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn deliver(&self, text: &str, media: &[String]) -> Option<String>;
}

#[derive(Serialize)]
struct PostRequest<'a> {
    text: &'a str,
    media_urls: &'a [String],
}

#[derive(Deserialize)]
struct PostResponse {
    id: String,
}

/// Posts to an HTTP delivery endpoint with bearer auth. When no endpoint
/// or token is configured the client runs in mock mode, mirroring a dev
/// setup without platform credentials.
pub struct HttpDeliveryClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpDeliveryClient {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsroom/0.1")
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        if endpoint.is_empty() || token.is_empty() {
            warn!("Delivery credentials missing; client will mock publishes");
        }

        Self {
            http,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
        }
    }

    fn is_configured(&self) -> bool {
        !self.endpoint.is_empty() && !self.token.is_empty()
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn deliver(&self, text: &str, media: &[String]) -> Option<String> {
        if !self.is_configured() {
            info!(
                "MOCK PUBLISH: credentials missing. Text: {}",
                text.chars().take(50).collect::<String>()
            );
            return Some("mock-id-no-creds".to_string());
        }

        if !media.is_empty() {
            // Links in the text produce a preview card downstream; media
            // upload needs a separate endpoint we don't target yet.
            info!("Media upload skipped for {} attachment(s)", media.len());
        }

        let body = PostRequest {
            text,
            media_urls: media,
        };

        let response = match self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to publish post: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            error!("Delivery endpoint returned HTTP {}", response.status());
            return None;
        }

        match response.json::<PostResponse>().await {
            Ok(parsed) => {
                info!("Post published successfully: {}", parsed.id);
                Some(parsed.id)
            }
            Err(e) => {
                error!("Failed to parse delivery response: {}", e);
                None
            }
        }
    }
}

/// Wraps the delivery client with the last-resort length safety net and
/// dedup history recording.
pub struct Publisher {
    delivery: Arc<dyn DeliveryClient>,
    history: Arc<ProcessedSet>,
    max_length: usize,
}

impl Publisher {
    pub fn new(delivery: Arc<dyn DeliveryClient>, history: Arc<ProcessedSet>, max_length: usize) -> Self {
        Self {
            delivery,
            history,
            max_length,
        }
    }

    /// Deliver the approved draft. On success the candidate's identifier is
    /// recorded into the processed set and persisted immediately; on failure
    /// the set is left untouched and the caller gets `None` (no retry).
    pub async fn publish(&self, draft: &Draft, candidate: &Candidate) -> Option<String> {
        let mut content = draft.content.clone();

        if content.chars().count() > self.max_length {
            let original_len = content.chars().count();
            content = smart_truncate(&content, self.max_length);
            warn!(
                "Approved draft exceeded limit; smart truncation applied ({} -> {} chars)",
                original_len,
                content.chars().count()
            );
        }

        let post_id = self.delivery.deliver(&content, &draft.media_files).await?;

        info!("Content cycle finished successfully: {}", post_id);
        self.history.record(&candidate.id);
        Some(post_id)
    }
}

/// Truncate to `max_length` characters without chopping mid-sentence:
/// cut at the last period within the limit, else at the last comma
/// (replaced with a period), else at the last space (period appended).
pub fn smart_truncate(content: &str, max_length: usize) -> String {
    if max_length == 0 {
        return String::new();
    }

    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= max_length {
        return content.to_string();
    }

    let candidate: String = chars[..max_length].iter().collect();

    if let Some(last_dot) = candidate.rfind('.') {
        return candidate[..=last_dot].to_string();
    }

    if let Some(last_comma) = candidate.rfind(',') {
        return format!("{}.", &candidate[..last_comma]);
    }

    let safe_slice: String = chars[..max_length - 1].iter().collect();
    if let Some(last_space) = safe_slice.rfind(' ') {
        return format!("{}.", &safe_slice[..last_space]);
    }

    format!("{}.", safe_slice)
}
