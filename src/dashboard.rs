//! # Dashboard data
//! Joins the latest news snapshot with the latest externally produced price
//! snapshot. Read-only: nothing here writes to disk.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::sentiment::ScoredArticle;
use crate::snapshot::{latest_csv, read_snapshot};

/// A row of the price snapshot; extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceRow {
    pub ticker: String,
    #[serde(default)]
    pub close: Option<f64>,
}

/// Mean compound for a ticker next to its close price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentPricePoint {
    pub ticker: String,
    pub compound: f64,
    pub close: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineRow {
    pub ticker: String,
    pub headline: String,
    pub compound: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardData {
    pub news_file: Option<PathBuf>,
    pub price_file: Option<PathBuf>,
    pub points: Vec<SentimentPricePoint>,
    pub headlines: Vec<HeadlineRow>,
}

pub fn read_prices(path: &Path) -> Result<Vec<PriceRow>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening price snapshot {}", path.display()))?;
    rdr.deserialize()
        .collect::<std::result::Result<Vec<PriceRow>, _>>()
        .with_context(|| format!("parsing price snapshot {}", path.display()))
}

/// Mean compound per ticker, ticker-ascending.
pub fn mean_compound_by_ticker(news: &[ScoredArticle]) -> BTreeMap<String, f64> {
    let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for a in news {
        let e = acc.entry(a.ticker.clone()).or_insert((0.0, 0));
        e.0 += a.compound;
        e.1 += 1;
    }
    acc.into_iter()
        .map(|(t, (sum, n))| (t, sum / n as f64))
        .collect()
}

/// Inner join of ticker means with price rows: one point per matching price
/// row, in ticker order.
pub fn join_prices(means: &BTreeMap<String, f64>, prices: &[PriceRow]) -> Vec<SentimentPricePoint> {
    means
        .iter()
        .flat_map(|(ticker, mean)| {
            prices
                .iter()
                .filter(move |p| &p.ticker == ticker)
                .map(move |p| SentimentPricePoint {
                    ticker: ticker.clone(),
                    compound: *mean,
                    close: p.close,
                })
        })
        .collect()
}

/// All headlines, most negative first.
pub fn headlines_by_compound(news: &[ScoredArticle]) -> Vec<HeadlineRow> {
    let mut rows: Vec<HeadlineRow> = news
        .iter()
        .map(|a| HeadlineRow {
            ticker: a.ticker.clone(),
            headline: a.headline.clone(),
            compound: a.compound,
        })
        .collect();
    rows.sort_by(|a, b| a.compound.total_cmp(&b.compound));
    rows
}

pub fn build(news: &[ScoredArticle], prices: &[PriceRow]) -> DashboardData {
    DashboardData {
        news_file: None,
        price_file: None,
        points: join_prices(&mean_compound_by_ticker(news), prices),
        headlines: headlines_by_compound(news),
    }
}

/// Load the newest snapshot from each directory and join them.
pub fn load_latest(news_dir: &Path, prices_dir: &Path) -> Result<DashboardData> {
    let news_file = latest_csv(news_dir)?
        .ok_or_else(|| anyhow!("no news snapshot in {}", news_dir.display()))?;
    let price_file = latest_csv(prices_dir)?
        .ok_or_else(|| anyhow!("no price snapshot in {}", prices_dir.display()))?;

    let news = read_snapshot(&news_file)?;
    let prices = read_prices(&price_file)?;
    tracing::info!(
        target: "dashboard",
        news = %news_file.display(),
        prices = %price_file.display(),
        rows = news.len(),
        "loaded snapshots"
    );

    Ok(DashboardData {
        news_file: Some(news_file),
        price_file: Some(price_file),
        ..build(&news, &prices)
    })
}
