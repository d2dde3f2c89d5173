// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::clock::RunDate;
use crate::config::TrackedSymbol;
use crate::ingest::types::{
    ArticleRecord, FeedProvider, FeedQuery, FeedSource, FetchOutcome, RawEntry,
};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Raw entries returned by providers.");
        describe_counter!(
            "ingest_kept_total",
            "Entries kept after date resolution and window filtering."
        );
        describe_counter!(
            "ingest_window_dropped_total",
            "Entries older than the retention cutoff."
        );
        describe_counter!(
            "ingest_date_parse_errors_total",
            "Entries skipped because their publish timestamp did not parse."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Feed calls that failed or timed out after all retries."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Records removed as (headline, ticker) duplicates."
        );
        describe_histogram!("ingest_fetch_ms", "Feed call duration in milliseconds.");
    });
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parse a feed timestamp like `"Mon, 06 Jan 2025 14:30:00 GMT"` into its
/// calendar date as written (no zone conversion).
///
/// The weekday must be a valid abbreviation but is not checked against the
/// date. The zone must be a name (GMT, UTC, EST...); numeric offsets fail.
pub fn parse_published_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    let (weekday, rest) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("missing weekday in {raw:?}"))?;
    if !WEEKDAYS
        .iter()
        .any(|w| w.eq_ignore_ascii_case(weekday.trim()))
    {
        bail!("unknown weekday {weekday:?}");
    }
    let (stamp, zone) = rest
        .trim()
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| anyhow!("missing time zone in {raw:?}"))?;
    if zone.is_empty() || zone.len() > 5 || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        bail!("unsupported time zone {zone:?}");
    }
    let dt = NaiveDateTime::parse_from_str(stamp.trim(), "%d %b %Y %H:%M:%S")
        .with_context(|| format!("parsing timestamp {raw:?}"))?;
    Ok(dt.date())
}

/// Headline cleanup: every newline/tab becomes one space, then trim.
/// A missing title becomes the empty string.
pub fn normalize_headline(title: Option<&str>) -> String {
    match title {
        Some(t) => t.replace(['\n', '\t'], " ").trim().to_string(),
        None => String::new(),
    }
}

/// Turn one provider response into records for `ticker`.
///
/// Entries with an unparseable timestamp are logged and skipped; entries older
/// than the cutoff are dropped silently. Undated entries take `default_date`,
/// or the run date when none is given.
pub fn process_entries(
    entries: Vec<RawEntry>,
    ticker: &str,
    source: FeedSource,
    run: &RunDate,
    default_date: Option<NaiveDate>,
) -> Vec<ArticleRecord> {
    ensure_metrics_described();
    counter!("ingest_events_total").increment(entries.len() as u64);

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let date = match entry.published.as_deref() {
            Some(ts) => match parse_published_date(ts) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(
                        target: "ingest",
                        error = %e,
                        %ticker,
                        source = source.as_str(),
                        "skipping entry with bad publish date"
                    );
                    counter!("ingest_date_parse_errors_total").increment(1);
                    continue;
                }
            },
            None => default_date.unwrap_or(run.today),
        };

        if !run.keeps(date) {
            counter!("ingest_window_dropped_total").increment(1);
            continue;
        }

        out.push(ArticleRecord {
            date,
            headline: normalize_headline(entry.title.as_deref()),
            ticker: ticker.to_string(),
            source,
        });
    }

    counter!("ingest_kept_total").increment(out.len() as u64);
    out
}

/// Search query a source is given for a symbol.
pub fn query_for(symbol: &TrackedSymbol, source: FeedSource) -> FeedQuery {
    let text = match source {
        FeedSource::Google | FeedSource::Bing => format!("{} stock", symbol.name),
        FeedSource::Yahoo => symbol.ticker.clone(),
    };
    FeedQuery {
        ticker: symbol.ticker.clone(),
        text,
    }
}

/// Per-call timeout and bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub retries: u8,
    pub backoff_base: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            retries: 1,
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Longest single sleep between attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

impl FetchPolicy {
    pub fn new(timeout_secs: u64, retries: u8) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            retries,
            ..Self::default()
        }
    }

    /// Sleep before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `MAX_BACKOFF`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Call a provider under `policy`. Never returns an error: failures and
/// timeouts come back as `FetchOutcome::Failed`.
pub async fn fetch_with_policy(
    provider: &dyn FeedProvider,
    query: &FeedQuery,
    policy: &FetchPolicy,
) -> FetchOutcome {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let t0 = std::time::Instant::now();
        let res = tokio::time::timeout(policy.timeout, provider.fetch(query)).await;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let reason = match res {
            Ok(Ok(entries)) => return FetchOutcome::Fetched(entries),
            Ok(Err(e)) => format!("{e:#}"),
            Err(_) => format!("timed out after {:?}", policy.timeout),
        };

        if attempt > u32::from(policy.retries) {
            return FetchOutcome::Failed(reason);
        }
        tracing::debug!(
            target: "ingest",
            attempt,
            %reason,
            source = provider.source().as_str(),
            ticker = %query.ticker,
            "retrying feed call"
        );
        tokio::time::sleep(policy.backoff_for(attempt)).await;
    }
}

/// Records produced by one (symbol, source) pair.
#[derive(Debug, Clone)]
pub struct PairBatch {
    pub ticker: String,
    pub source: FeedSource,
    pub records: Vec<ArticleRecord>,
}

/// Fetch every (symbol, provider) pair concurrently and return the batches
/// in symbol-then-source order. A failed pair contributes an empty batch.
pub async fn ingest_all(
    symbols: &[TrackedSymbol],
    providers: &[Arc<dyn FeedProvider>],
    run: &RunDate,
    policy: &FetchPolicy,
) -> Vec<PairBatch> {
    ensure_metrics_described();

    let mut set = JoinSet::new();
    for (sym_idx, symbol) in symbols.iter().enumerate() {
        for (prov_idx, provider) in providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            let source = provider.source();
            let query = query_for(symbol, source);
            let run = *run;
            let policy = *policy;
            set.spawn(async move {
                let outcome = fetch_with_policy(provider.as_ref(), &query, &policy).await;
                let records = match outcome {
                    FetchOutcome::Fetched(entries) => {
                        let default_date = source.supplies_default_date().then_some(run.today);
                        process_entries(entries, &query.ticker, source, &run, default_date)
                    }
                    FetchOutcome::Failed(reason) => {
                        tracing::warn!(
                            target: "ingest",
                            ticker = %query.ticker,
                            source = source.as_str(),
                            %reason,
                            "feed call failed"
                        );
                        counter!("ingest_provider_errors_total").increment(1);
                        Vec::new()
                    }
                };
                (
                    (sym_idx, source, prov_idx),
                    PairBatch {
                        ticker: query.ticker,
                        source,
                        records,
                    },
                )
            });
        }
    }

    let mut done = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(item) => done.push(item),
            Err(e) => tracing::error!(target: "ingest", error = %e, "feed task aborted"),
        }
    }
    done.sort_by_key(|(key, _)| *key);
    done.into_iter().map(|(_, batch)| batch).collect()
}
