use crate::history::ProcessedSet;
use crate::types::{Candidate, NewsroomError, Result, Topic};
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

/// Cap on candidate body text, to keep prompts inside the context window.
const MAX_CONTENT_CHARS: usize = 5000;

/// Supplies candidate news items for a topic, already filtered for
/// recency and prior-publication history. An empty result is a normal
/// outcome, never an error.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch(&self, topic: &Topic, history: &ProcessedSet) -> Vec<Candidate>;
}

/// Fetches and filters candidate news items from a topic's RSS/Atom feeds.
pub struct NewsSource {
    http: reqwest::Client,
    recency_window: Duration,
    max_retries: u32,
    tag_re: Regex,
}

impl NewsSource {
    pub fn new(recency_window_hours: i64, timeout: StdDuration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsroom/0.1")
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            recency_window: Duration::hours(recency_window_hours),
            max_retries: 2,
            tag_re: Regex::new(r"<[^>]*>").expect("valid tag regex"),
        }
    }

    /// Load the topics file. A missing or unreadable file yields an empty
    /// list with a warning; the pipeline treats that as "no news".
    pub fn load_topics(path: impl AsRef<Path>) -> Vec<Topic> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Topics file not readable at {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Topic>>(&raw) {
            Ok(topics) => {
                info!("Loaded {} topics from {}", topics.len(), path.display());
                topics
            }
            Err(e) => {
                warn!("Failed to parse topics file {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut backoff = ExponentialBackoff {
            initial_interval: StdDuration::from_secs(1),
            max_interval: StdDuration::from_secs(10),
            max_elapsed_time: Some(StdDuration::from_secs(60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.fetch_once(url).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                "Attempt {} failed for {}, retrying in {:?}",
                                attempt + 1,
                                url,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| NewsroomError::General("Unknown fetch error".to_string())))
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NewsroomError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }
        Ok(response.text().await?)
    }

    fn entry_to_candidate(
        &self,
        entry: feed_rs::model::Entry,
        source_name: &str,
        now: DateTime<Utc>,
    ) -> Option<Candidate> {
        let link = &entry.links.first()?.href;
        let id = match Self::canonical_id(link) {
            Ok(id) => id,
            Err(e) => {
                debug!("Skipping entry with unusable link '{}': {}", link, e);
                return None;
            }
        };

        // No parseable timestamp means we can't judge freshness; skip.
        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc))?;

        if now - published_at > self.recency_window {
            return None;
        }

        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "No Title".to_string());

        let raw_body = entry
            .content
            .and_then(|c| c.body)
            .or_else(|| entry.summary.map(|s| s.content))
            .unwrap_or_default();

        let mut content = self.clean_html(&raw_body);
        if content.chars().count() > MAX_CONTENT_CHARS {
            content = content.chars().take(MAX_CONTENT_CHARS).collect();
        }

        let image_url = Self::extract_image(&entry.media);

        Some(Candidate {
            id,
            title,
            content,
            source: source_name.to_string(),
            published_at,
            image_url,
        })
    }

    /// Canonical identifier for a candidate: the entry link parsed and
    /// re-serialized, so casing and whitespace variants of the same
    /// article dedup to one key.
    fn canonical_id(link: &str) -> Result<String> {
        let url = url::Url::parse(link.trim())?;
        Ok(url.to_string())
    }

    /// Strip HTML tags so prompt tokens aren't wasted on markup.
    fn clean_html(&self, html: &str) -> String {
        let text = self.tag_re.replace_all(html, " ");
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Find an image URL in the entry's media objects, preferring full
    /// media content over thumbnails.
    fn extract_image(media: &[feed_rs::model::MediaObject]) -> Option<String> {
        for object in media {
            for content in &object.content {
                let is_image = content
                    .content_type
                    .as_ref()
                    .map(|t| t.to_string().starts_with("image"))
                    .unwrap_or(false);
                if is_image {
                    if let Some(url) = &content.url {
                        return Some(url.to_string());
                    }
                }
            }
            if let Some(thumbnail) = object.thumbnails.first() {
                return Some(thumbnail.image.uri.clone());
            }
        }
        None
    }
}

#[async_trait]
impl CandidateSource for NewsSource {
    /// Fetch every feed in the topic and return fresh, unseen candidates.
    /// A feed that fails to download or parse is logged and skipped.
    async fn fetch(&self, topic: &Topic, history: &ProcessedSet) -> Vec<Candidate> {
        let now = Utc::now();
        let mut candidates = Vec::new();

        for feed_spec in &topic.feeds {
            let content = match self.fetch_with_retry(&feed_spec.url).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to fetch feed {}: {}", feed_spec.url, e);
                    continue;
                }
            };

            let feed = match feed_rs::parser::parse(content.as_bytes()) {
                Ok(feed) => feed,
                Err(e) => {
                    warn!("Failed to parse feed {}: {}", feed_spec.url, e);
                    continue;
                }
            };

            for entry in feed.entries {
                if let Some(candidate) = self.entry_to_candidate(entry, &feed_spec.title, now) {
                    if history.contains(&candidate.id) {
                        debug!("Skipping already-published candidate: {}", candidate.id);
                        continue;
                    }
                    candidates.push(candidate);
                }
            }
        }

        info!(
            "Fetched {} fresh candidates for topic '{}'",
            candidates.len(),
            topic.name
        );
        candidates
    }
}
