use clap::Parser;
use newsroom::{
    AppConfig, Drafter, Evaluator, HttpDeliveryClient, NewsSource, OpenAiChatClient, Pipeline,
    ProcessedSet, Publisher, RetryController, RunOutcome, Selector,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "newsroom", about = "Autonomous news-to-post content pipeline")]
struct Args {
    /// Run continuously instead of once.
    #[arg(long = "loop")]
    run_loop: bool,

    /// Seconds between runs in loop mode.
    #[arg(long, default_value_t = 3600)]
    interval_secs: u64,

    /// Path to the topics file (overrides TOPICS_PATH).
    #[arg(long)]
    topics: Option<String>,

    /// Path to the publish history file (overrides HISTORY_PATH).
    #[arg(long)]
    history: Option<String>,
}

fn build_pipeline(config: &AppConfig) -> Pipeline {
    let chat = Arc::new(OpenAiChatClient::new(
        &config.llm_api_base,
        &config.llm_api_key,
        &config.llm_model,
        config.http_timeout,
    ));

    let history = Arc::new(ProcessedSet::load(&config.history_path));
    let topics = NewsSource::load_topics(&config.topics_path);
    if topics.is_empty() {
        warn!("No topics configured at {}; runs will end with NoNews", config.topics_path);
    }

    let source = Arc::new(NewsSource::new(
        config.recency_window_hours,
        config.http_timeout,
    ));
    let selector = Selector::new(chat.clone());
    let drafter = Drafter::new(chat.clone(), config.writer_target_length);
    let evaluator = Evaluator::new(chat, config.max_post_length);
    let controller = RetryController::new(drafter, evaluator, config.max_rounds);

    let delivery = Arc::new(HttpDeliveryClient::new(
        &config.post_api_url,
        &config.post_api_token,
        config.http_timeout,
    ));
    let publisher = Publisher::new(delivery, history.clone(), config.max_post_length);

    Pipeline::new(topics, source, selector, controller, publisher, history)
}

async fn run_once(pipeline: &Pipeline) {
    info!("Starting autonomous session");

    match pipeline.run().await {
        RunOutcome::Published(id) => info!("Session finished. Post published: {}", id),
        outcome => warn!("Session finished but nothing was published: {:?}", outcome),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(topics) = args.topics {
        config.topics_path = topics;
    }
    if let Some(history) = args.history {
        config.history_path = history;
    }

    let pipeline = build_pipeline(&config);

    if args.run_loop {
        info!("Starting daemon mode (interval {}s)", args.interval_secs);
        loop {
            run_once(&pipeline).await;
            info!("Sleeping for {}s", args.interval_secs);
            tokio::time::sleep(Duration::from_secs(args.interval_secs)).await;
        }
    } else {
        run_once(&pipeline).await;
    }

    Ok(())
}
