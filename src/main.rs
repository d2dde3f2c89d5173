//! Daily news sentiment run: binary entrypoint.
//! Fetches headlines for the configured tickers, scores them and writes
//! today's snapshot. Exits non-zero only when the snapshot cannot be written.

use anyhow::Context;
use chrono::Local;
use std::sync::Arc;

use ticker_news_sentiment::ingest::types::FeedProvider;
use ticker_news_sentiment::ingest::FetchPolicy;
use ticker_news_sentiment::metrics::Metrics;
use ticker_news_sentiment::pipeline::{http_providers, start_line};
use ticker_news_sentiment::{Lexicon, Pipeline, PipelineConfig, RunDate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    ticker_news_sentiment::init_tracing();

    let cfg = PipelineConfig::load_default().context("loading pipeline config")?;
    let metrics = Metrics::for_pipeline()?;
    let lexicon = Lexicon::finance_with(cfg.lexicon_overrides.clone());
    let providers: Vec<Arc<dyn FeedProvider>> = http_providers(&cfg)?;

    // The only wall-clock read of the run.
    let started = Local::now();
    let run = RunDate::new(started.date_naive(), cfg.retention_days);
    println!("{}", start_line(started.naive_local()));

    let pipeline = Pipeline {
        symbols: &cfg.tickers,
        providers: &providers,
        lexicon: &lexicon,
        policy: FetchPolicy::new(cfg.feed_timeout_secs, cfg.feed_retries),
        news_dir: &cfg.news_dir,
    };

    let outcome = pipeline.run(&run).await?;
    for line in outcome.report_lines() {
        println!("{line}");
    }

    tracing::debug!(target: "metrics", rendered = %metrics.render(), "run metrics");
    if let Some(path) = &cfg.metrics_file {
        // Not fatal: only the snapshot write decides the exit code.
        if let Err(e) = metrics.write_textfile(path) {
            tracing::warn!(target: "metrics", error = %e, path = %path.display(), "metrics export failed");
        }
    }
    Ok(())
}
