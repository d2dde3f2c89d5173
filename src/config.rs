// src/config.rs
//! Static run configuration: tracked tickers, retention window, output
//! directories, feed URL templates and domain lexicon overrides.
//!
//! TOML shape (every key optional):
//! ```toml
//! retention_days = 7
//! news_dir = "data/raw_news"
//! prices_dir = "data/stock_prices"
//! feed_timeout_secs = 15
//! feed_retries = 1
//! metrics_file = "data/metrics/pipeline.prom"
//!
//! [[tickers]]
//! ticker = "AAPL"
//! name = "Apple"
//!
//! [feeds]
//! google = "https://news.google.com/rss/search?q={query}&hl=en-US&gl=US&ceid=US:en"
//!
//! [lexicon_overrides]
//! "beat estimates" = 1.1
//! ```

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::clock::DEFAULT_RETENTION_DAYS;
use crate::ingest::types::FeedSource;

pub const ENV_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

/// Upper bounds accepted for the numeric run settings.
pub const MAX_RETENTION_DAYS: u32 = 3650;
pub const MAX_FEED_RETRIES: u8 = 5;
pub const MAX_FEED_TIMEOUT_SECS: u64 = 300;

static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").expect("ticker regex"));

/// A ticker the run collects headlines for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackedSymbol {
    pub ticker: String,
    /// Human name used in search queries ("Apple" for AAPL).
    pub name: String,
}

impl TrackedSymbol {
    pub fn new(ticker: &str, name: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
        }
    }
}

/// URL templates per feed source. `{query}` and `{ticker}` are substituted.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedTemplates {
    #[serde(default = "default_google_template")]
    pub google: String,
    #[serde(default = "default_bing_template")]
    pub bing: String,
    #[serde(default = "default_yahoo_template")]
    pub yahoo: String,
}

impl Default for FeedTemplates {
    fn default() -> Self {
        Self {
            google: default_google_template(),
            bing: default_bing_template(),
            yahoo: default_yahoo_template(),
        }
    }
}

impl FeedTemplates {
    pub fn template_for(&self, source: FeedSource) -> &str {
        match source {
            FeedSource::Google => &self.google,
            FeedSource::Bing => &self.bing,
            FeedSource::Yahoo => &self.yahoo,
        }
    }
}

fn default_google_template() -> String {
    "https://news.google.com/rss/search?q={query}&hl=en-US&gl=US&ceid=US:en".to_string()
}
fn default_bing_template() -> String {
    "https://www.bing.com/news/search?q={query}&format=rss".to_string()
}
fn default_yahoo_template() -> String {
    "https://feeds.finance.yahoo.com/rss/2.0/headline?s={ticker}&region=US&lang=en-US".to_string()
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}
fn default_news_dir() -> PathBuf {
    PathBuf::from("data/raw_news")
}
fn default_prices_dir() -> PathBuf {
    PathBuf::from("data/stock_prices")
}
fn default_feed_timeout_secs() -> u64 {
    15
}
fn default_feed_retries() -> u8 {
    1
}

fn default_tickers() -> Vec<TrackedSymbol> {
    [
        ("AAPL", "Apple"),
        ("GOOGL", "Google"),
        ("AMZN", "Amazon"),
        ("META", "Meta"),
        ("NFLX", "Netflix"),
        ("MSFT", "Microsoft"),
        ("NVDA", "Nvidia"),
        ("TSLA", "Tesla"),
    ]
    .into_iter()
    .map(|(t, n)| TrackedSymbol::new(t, n))
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_tickers")]
    pub tickers: Vec<TrackedSymbol>,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_news_dir")]
    pub news_dir: PathBuf,
    #[serde(default = "default_prices_dir")]
    pub prices_dir: PathBuf,
    #[serde(default = "default_feed_timeout_secs")]
    pub feed_timeout_secs: u64,
    /// Extra attempts after a failed feed call (0 = single attempt).
    #[serde(default = "default_feed_retries")]
    pub feed_retries: u8,
    #[serde(default)]
    pub feeds: FeedTemplates,
    /// Merged on top of the built-in domain lexicon table.
    #[serde(default)]
    pub lexicon_overrides: BTreeMap<String, f64>,
    /// Prometheus textfile written at the end of each run, if set.
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            retention_days: default_retention_days(),
            news_dir: default_news_dir(),
            prices_dir: default_prices_dir(),
            feed_timeout_secs: default_feed_timeout_secs(),
            feed_retries: default_feed_retries(),
            feeds: FeedTemplates::default(),
            lexicon_overrides: BTreeMap::new(),
            metrics_file: None,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: PipelineConfig = toml::from_str(s).context("parsing pipeline config")?;
        cfg.sanitize()?;
        Ok(cfg)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $PIPELINE_CONFIG_PATH
    /// 2) config/pipeline.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            return Self::load_from(&fallback);
        }
        Ok(Self::default())
    }

    fn sanitize(&mut self) -> Result<()> {
        if !(1..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
            bail!(
                "retention_days must be between 1 and {MAX_RETENTION_DAYS}, got {}",
                self.retention_days
            );
        }
        if self.feed_retries > MAX_FEED_RETRIES {
            bail!(
                "feed_retries must be at most {MAX_FEED_RETRIES}, got {}",
                self.feed_retries
            );
        }
        if !(1..=MAX_FEED_TIMEOUT_SECS).contains(&self.feed_timeout_secs) {
            bail!(
                "feed_timeout_secs must be between 1 and {MAX_FEED_TIMEOUT_SECS}, got {}",
                self.feed_timeout_secs
            );
        }
        let mut seen = HashSet::new();
        for sym in self.tickers.iter_mut() {
            sym.ticker = sym.ticker.trim().to_string();
            sym.name = sym.name.trim().to_string();
            if !TICKER_RE.is_match(&sym.ticker) {
                bail!("invalid ticker code {:?}", sym.ticker);
            }
            if sym.name.is_empty() {
                bail!("ticker {} has an empty name", sym.ticker);
            }
            if !seen.insert(sym.ticker.clone()) {
                bail!("duplicate ticker {}", sym.ticker);
            }
        }
        self.lexicon_overrides = std::mem::take(&mut self.lexicon_overrides)
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Ok(())
    }
}
