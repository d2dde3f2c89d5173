// src/ingest/types.rs
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One feed item as handed over by a provider. Both fields may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    /// Raw textual timestamp, e.g. "Mon, 06 Jan 2025 14:30:00 GMT".
    pub published: Option<String>,
}

impl RawEntry {
    pub fn new(title: impl Into<String>, published: Option<&str>) -> Self {
        Self {
            title: Some(title.into()),
            published: published.map(str::to_string),
        }
    }
}

/// The fixed set of feed sources, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeedSource {
    #[serde(rename = "Google RSS")]
    Google,
    #[serde(rename = "Bing RSS")]
    Bing,
    #[serde(rename = "Yahoo RSS")]
    Yahoo,
}

impl FeedSource {
    /// Merge order used by the aggregator.
    pub const ALL: [FeedSource; 3] = [FeedSource::Google, FeedSource::Bing, FeedSource::Yahoo];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSource::Google => "Google RSS",
            FeedSource::Bing => "Bing RSS",
            FeedSource::Yahoo => "Yahoo RSS",
        }
    }

    /// Bing and Yahoo dates are not trusted; undated entries from them get the
    /// run date passed in explicitly by the caller.
    pub fn supplies_default_date(&self) -> bool {
        matches!(self, FeedSource::Bing | FeedSource::Yahoo)
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized, window-filtered headline for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub date: NaiveDate,
    pub headline: String,
    pub ticker: String,
    pub source: FeedSource,
}

/// What a provider is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub ticker: String,
    /// Free-text search, e.g. "Apple stock".
    pub text: String,
}

/// Result of one (symbol, source) call, never propagated as an error.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(Vec<RawEntry>),
    Failed(String),
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<RawEntry>>;
    fn source(&self) -> FeedSource;
}
