// tests/pipeline_e2e.rs
//
// Whole-run behaviour with in-memory feed providers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use ticker_news_sentiment::ingest::types::{FeedProvider, FeedQuery, FeedSource, RawEntry};
use ticker_news_sentiment::ingest::FetchPolicy;
use ticker_news_sentiment::pipeline::start_line;
use ticker_news_sentiment::snapshot::read_snapshot;
use ticker_news_sentiment::{
    Lexicon, Pipeline, RunDate, RunOutcome, SentimentLabel, TrackedSymbol,
};

enum Behaviour {
    Entries(Vec<RawEntry>),
    Fail,
    Hang,
}

struct StaticProvider {
    source: FeedSource,
    behaviour: Behaviour,
}

impl StaticProvider {
    fn arc(source: FeedSource, behaviour: Behaviour) -> Arc<dyn FeedProvider> {
        Arc::new(Self { source, behaviour })
    }
}

#[async_trait::async_trait]
impl FeedProvider for StaticProvider {
    async fn fetch(&self, _query: &FeedQuery) -> Result<Vec<RawEntry>> {
        match &self.behaviour {
            Behaviour::Entries(v) => Ok(v.clone()),
            Behaviour::Fail => Err(anyhow!("connection reset")),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }

    fn source(&self) -> FeedSource {
        self.source
    }
}

fn run_date() -> RunDate {
    RunDate::new(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(), 7)
}

fn fast_policy() -> FetchPolicy {
    FetchPolicy {
        timeout: Duration::from_millis(200),
        retries: 0,
        backoff_base: Duration::from_millis(1),
    }
}

async fn run_with(
    dir: &std::path::Path,
    symbols: &[TrackedSymbol],
    providers: &[Arc<dyn FeedProvider>],
) -> RunOutcome {
    let lexicon = Lexicon::finance();
    let pipeline = Pipeline {
        symbols,
        providers,
        lexicon: &lexicon,
        policy: fast_policy(),
        news_dir: dir,
    };
    pipeline.run(&run_date()).await.expect("run ok")
}

#[tokio::test]
async fn window_and_dedup_leave_one_positive_row() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = vec![TrackedSymbol::new("AAPL", "Apple")];
    let providers = vec![
        StaticProvider::arc(
            FeedSource::Google,
            Behaviour::Entries(vec![
                RawEntry::new(
                    "Apple surges on bullish outlook",
                    Some("Fri, 10 Jan 2025 09:00:00 GMT"),
                ),
                RawEntry::new(
                    "Apple slides after guidance",
                    Some("Tue, 31 Dec 2024 09:00:00 GMT"),
                ),
            ]),
        ),
        StaticProvider::arc(FeedSource::Bing, Behaviour::Entries(vec![])),
        StaticProvider::arc(
            FeedSource::Yahoo,
            Behaviour::Entries(vec![RawEntry::new("Apple surges on bullish outlook", None)]),
        ),
    ];

    let outcome = run_with(dir.path(), &symbols, &providers).await;
    let RunOutcome::Written {
        path,
        rows,
        duplicates,
        summary,
    } = outcome
    else {
        panic!("expected a snapshot, got {outcome:?}");
    };
    assert_eq!(rows, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(summary.count(SentimentLabel::Positive), 1);
    assert_eq!(path, dir.path().join("news_20250110.csv"));

    let back = read_snapshot(&path).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].ticker, "AAPL");
    assert_eq!(back[0].source, FeedSource::Google);
    assert_eq!(back[0].sentiment_label, SentimentLabel::Positive);
}

#[tokio::test]
async fn empty_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let news_dir = dir.path().join("raw_news");
    let symbols = vec![
        TrackedSymbol::new("AAPL", "Apple"),
        TrackedSymbol::new("MSFT", "Microsoft"),
    ];
    let providers = vec![
        StaticProvider::arc(FeedSource::Google, Behaviour::Entries(vec![])),
        StaticProvider::arc(
            FeedSource::Bing,
            Behaviour::Entries(vec![RawEntry::new(
                "Old news",
                Some("Mon, 02 Dec 2024 09:00:00 GMT"),
            )]),
        ),
        StaticProvider::arc(FeedSource::Yahoo, Behaviour::Fail),
    ];

    let outcome = run_with(&news_dir, &symbols, &providers).await;
    assert_eq!(outcome, RunOutcome::NoArticles);
    assert!(!news_dir.exists());
    assert_eq!(outcome.report_lines(), vec!["No new articles found today."]);
}

#[tokio::test]
async fn written_run_reports_path_count_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = vec![TrackedSymbol::new("MSFT", "Microsoft")];
    let providers = vec![StaticProvider::arc(
        FeedSource::Google,
        Behaviour::Entries(vec![
            RawEntry::new("Microsoft rally extends", None),
            RawEntry::new("Microsoft breakout ahead", None),
            RawEntry::new("Microsoft downgrade weighs", None),
        ]),
    )];

    let outcome = run_with(dir.path(), &symbols, &providers).await;
    let path = dir.path().join("news_20250110.csv");
    assert_eq!(
        outcome.report_lines(),
        vec![
            format!("Saved 3 articles to {}", path.display()),
            String::new(),
            "=== Sentiment Summary ===".to_string(),
            "positive  2".to_string(),
            "negative  1".to_string(),
        ]
    );
}

#[test]
fn start_banner_has_microseconds() {
    let started = NaiveDate::from_ymd_opt(2025, 1, 10)
        .unwrap()
        .and_hms_micro_opt(8, 0, 1, 123_456)
        .unwrap();
    assert_eq!(
        start_line(started),
        "Starting scraping at 2025-01-10 08:00:01.123456"
    );
}

#[tokio::test]
async fn failing_and_hanging_sources_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = vec![TrackedSymbol::new("TSLA", "Tesla")];
    let providers = vec![
        StaticProvider::arc(FeedSource::Google, Behaviour::Fail),
        StaticProvider::arc(FeedSource::Bing, Behaviour::Hang),
        StaticProvider::arc(
            FeedSource::Yahoo,
            Behaviour::Entries(vec![RawEntry::new("Tesla bankrupt rumors denied", None)]),
        ),
    ];

    let outcome = run_with(dir.path(), &symbols, &providers).await;
    match outcome {
        RunOutcome::Written { rows, .. } => assert_eq!(rows, 1),
        other => panic!("expected a snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_title_is_kept_as_neutral_row() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = vec![TrackedSymbol::new("META", "Meta")];
    let providers = vec![StaticProvider::arc(
        FeedSource::Google,
        Behaviour::Entries(vec![RawEntry {
            title: None,
            published: Some("Thu, 09 Jan 2025 10:00:00 GMT".into()),
        }]),
    )];

    let outcome = run_with(dir.path(), &symbols, &providers).await;
    let RunOutcome::Written { path, .. } = outcome else {
        panic!("expected a snapshot");
    };
    let back = read_snapshot(&path).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].headline, "");
    assert_eq!(back[0].compound, 0.0);
    assert_eq!(back[0].sentiment_label, SentimentLabel::Neutral);
}

#[tokio::test]
async fn same_day_rerun_overwrites_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = vec![TrackedSymbol::new("NVDA", "Nvidia")];

    let first = vec![StaticProvider::arc(
        FeedSource::Google,
        Behaviour::Entries(vec![
            RawEntry::new("Nvidia rally continues", None),
            RawEntry::new("Nvidia breakout above highs", None),
        ]),
    )];
    let second = vec![StaticProvider::arc(
        FeedSource::Google,
        Behaviour::Entries(vec![RawEntry::new("Nvidia downgrade weighs", None)]),
    )];

    run_with(dir.path(), &symbols, &first).await;
    let outcome = run_with(dir.path(), &symbols, &second).await;
    let RunOutcome::Written { path, .. } = outcome else {
        panic!("expected a snapshot");
    };

    let back = read_snapshot(&path).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].headline, "Nvidia downgrade weighs");
    assert_eq!(back[0].sentiment_label, SentimentLabel::Negative);
    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 1);
}

#[tokio::test]
async fn unwritable_snapshot_dir_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();

    let symbols = vec![TrackedSymbol::new("AMZN", "Amazon")];
    let providers = vec![StaticProvider::arc(
        FeedSource::Google,
        Behaviour::Entries(vec![RawEntry::new("Amazon upgrade lifts shares", None)]),
    )];
    let lexicon = Lexicon::finance();
    let pipeline = Pipeline {
        symbols: &symbols,
        providers: &providers,
        lexicon: &lexicon,
        policy: fast_policy(),
        news_dir: &blocker,
    };
    assert!(pipeline.run(&run_date()).await.is_err());
}
