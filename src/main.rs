use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use digest_core::{load_config, ErrorReporter};
use reddit_client::{RateLimitConfig, RedditClient, RedditOAuth2Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "reddit_digest=info,collector=info,reddit_client=info";

#[derive(Debug, Parser)]
#[command(name = "reddit-digest")]
#[command(about = "Collect subreddit posts per timeframe into a JSON document")]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured output path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overrides the configured forum catalog; repeat to list several
    #[arg(short = 's', long = "subreddit")]
    subreddits: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if !cli.subreddits.is_empty() {
        config.subreddits = cli.subreddits;
    }

    tracing::info!(
        subreddits = ?config.subreddits,
        output = %config.output_path.display(),
        "Starting Reddit digest run"
    );

    let oauth = RedditOAuth2Config::new(
        config.reddit_client_id.clone(),
        config.reddit_client_secret.clone(),
        config.reddit_user_agent.clone(),
    );
    let mut client = RedditClient::new(
        oauth,
        RateLimitConfig::per_minute(config.requests_per_minute),
    )
    .context("building Reddit client")?;

    let reporter = ErrorReporter::new();

    if let Err(e) = client.authenticate().await {
        reporter.report_error(&e);
        return Err(e).context("authenticating with Reddit");
    }

    let result = collector::run(
        &client,
        &config.subreddits,
        &config.output_path,
        Utc::now(),
    )
    .await;

    client.api().log_metrics().await;

    match result {
        Ok(document) => {
            tracing::info!(
                records = document.total_records(),
                output = %config.output_path.display(),
                "Digest written"
            );
            Ok(())
        }
        Err(e) => {
            reporter.report_error(&e);
            Err(e).context("collecting posts")
        }
    }
}
