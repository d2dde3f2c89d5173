//! # Pipeline
//! One batch run: ingest every (symbol, source) pair → merge + dedup → score
//! → write the dated snapshot. Only the snapshot write can fail the run.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use metrics::gauge;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::merge_and_dedup;
use crate::clock::RunDate;
use crate::config::{PipelineConfig, TrackedSymbol};
use crate::ingest::providers::rss::RssFeedProvider;
use crate::ingest::types::{FeedProvider, FeedSource};
use crate::ingest::{ingest_all, FetchPolicy};
use crate::sentiment::{Lexicon, SentimentAnalyzer};
use crate::snapshot::{write_snapshot, LabelSummary};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Nothing survived filtering; no file was touched.
    NoArticles,
    Written {
        path: PathBuf,
        rows: usize,
        duplicates: usize,
        summary: LabelSummary,
    },
}

impl RunOutcome {
    /// Lines the batch binary prints once the run is over.
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            RunOutcome::NoArticles => vec!["No new articles found today.".to_string()],
            RunOutcome::Written {
                path,
                rows,
                summary,
                ..
            } => {
                let mut out = vec![
                    format!("Saved {rows} articles to {}", path.display()),
                    String::new(),
                    "=== Sentiment Summary ===".to_string(),
                ];
                out.extend(summary.lines());
                out
            }
        }
    }
}

/// Banner printed before any feed call.
pub fn start_line(started: NaiveDateTime) -> String {
    format!("Starting scraping at {}", started.format("%Y-%m-%d %H:%M:%S%.6f"))
}

/// Everything a run needs, borrowed from the caller.
pub struct Pipeline<'a> {
    pub symbols: &'a [TrackedSymbol],
    pub providers: &'a [Arc<dyn FeedProvider>],
    pub lexicon: &'a Lexicon,
    pub policy: FetchPolicy,
    pub news_dir: &'a Path,
}

impl<'a> Pipeline<'a> {
    pub async fn run(&self, run: &RunDate) -> Result<RunOutcome> {
        let batches = ingest_all(self.symbols, self.providers, run, &self.policy).await;
        let fetched: usize = batches.iter().map(|b| b.records.len()).sum();

        let (records, duplicates) = merge_and_dedup(batches);
        tracing::info!(
            target: "pipeline",
            fetched,
            kept = records.len(),
            duplicates,
            "ingest finished"
        );

        if records.is_empty() {
            gauge!("pipeline_last_run_rows").set(0.0);
            return Ok(RunOutcome::NoArticles);
        }

        let scored = SentimentAnalyzer::new(self.lexicon).score_records(records);
        let summary = LabelSummary::from_rows(&scored);
        let path = write_snapshot(self.news_dir, run, &scored).context("writing news snapshot")?;
        gauge!("pipeline_last_run_rows").set(scored.len() as f64);

        Ok(RunOutcome::Written {
            path,
            rows: scored.len(),
            duplicates,
            summary,
        })
    }
}

/// HTTP RSS providers for the three sources, in merge order.
pub fn http_providers(cfg: &PipelineConfig) -> Result<Vec<Arc<dyn FeedProvider>>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.feed_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building feed http client")?;

    Ok(FeedSource::ALL
        .into_iter()
        .map(|source| {
            Arc::new(RssFeedProvider::from_template(
                source,
                cfg.feeds.template_for(source),
                client.clone(),
            )) as Arc<dyn FeedProvider>
        })
        .collect())
}
