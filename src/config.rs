use std::env;
use std::time::Duration;

/// Runtime configuration, read once at startup from the environment.
/// Everything has a usable default so a dev machine can run the pipeline
/// against a local OpenAI-compatible endpoint with no setup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the OpenAI-compatible chat endpoint.
    pub llm_api_base: String,
    pub llm_api_key: String,
    pub llm_model: String,

    /// Delivery endpoint for publishing posts. When empty the delivery
    /// client runs in mock mode and returns a placeholder id.
    pub post_api_url: String,
    pub post_api_token: String,

    /// Hard cap on published post length, in characters.
    pub max_post_length: usize,
    /// Target length given to the drafter; kept below the hard cap so a
    /// slightly verbose draft still fits.
    pub writer_target_length: usize,
    /// Maximum number of rejected drafts before the run gives up.
    pub max_rounds: u32,
    /// Candidates older than this are dropped at fetch time.
    pub recency_window_hours: i64,

    pub topics_path: String,
    pub history_path: String,

    /// Timeout applied to every external HTTP call.
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm_api_base: "http://localhost:8000/v1".to_string(),
            llm_api_key: "local-dev-key".to_string(),
            llm_model: "google/gemma-3-27b-it".to_string(),
            post_api_url: String::new(),
            post_api_token: String::new(),
            max_post_length: 280,
            writer_target_length: 250,
            max_rounds: 3,
            recency_window_hours: 24,
            topics_path: "data/topics.json".to_string(),
            history_path: "data/history.json".to_string(),
            http_timeout: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            llm_api_base: env_or("OPENAI_API_BASE", defaults.llm_api_base),
            llm_api_key: env_or("OPENAI_API_KEY", defaults.llm_api_key),
            llm_model: env_or("MODEL_NAME", defaults.llm_model),
            post_api_url: env_or("POST_API_URL", defaults.post_api_url),
            post_api_token: env_or("POST_API_TOKEN", defaults.post_api_token),
            max_post_length: env_parsed("MAX_POST_LENGTH", defaults.max_post_length),
            writer_target_length: env_parsed("WRITER_TARGET_LENGTH", defaults.writer_target_length),
            max_rounds: env_parsed("MAX_ROUNDS", defaults.max_rounds),
            recency_window_hours: env_parsed("RECENCY_WINDOW_HOURS", defaults.recency_window_hours),
            topics_path: env_or("TOPICS_PATH", defaults.topics_path),
            history_path: env_or("HISTORY_PATH", defaults.history_path),
            http_timeout: defaults.http_timeout,
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
