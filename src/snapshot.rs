//! # Snapshot Writer
//! Persists one run as `news_<YYYYMMDD>.csv` and summarizes it by label.
//! The file is written next to its final path and renamed over it, so a
//! same-day rerun replaces the earlier snapshot as a whole.

use anyhow::{Context, Result};
use metrics::counter;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::clock::RunDate;
use crate::sentiment::{ScoredArticle, SentimentLabel};

/// Column order of every snapshot file.
pub const COLUMNS: [&str; 9] = [
    "date",
    "headline",
    "ticker",
    "source",
    "negative",
    "neutral",
    "positive",
    "compound",
    "sentiment_label",
];

/// `<dir>/news_<YYYYMMDD>.csv`
pub fn snapshot_path(dir: &Path, run: &RunDate) -> PathBuf {
    dir.join(format!("news_{}.csv", run.stamp()))
}

/// Write `rows` for `run` under `dir`, returning the final path.
pub fn write_snapshot(dir: &Path, run: &RunDate, rows: &[ScoredArticle]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating snapshot dir {}", dir.display()))?;

    let path = snapshot_path(dir, run);
    let tmp = path.with_extension("csv.tmp");

    let res = write_rows(&tmp, rows).and_then(|()| {
        fs::rename(&tmp, &path)
            .with_context(|| format!("moving snapshot into place at {}", path.display()))
    });
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res?;

    counter!("snapshot_rows_total").increment(rows.len() as u64);
    tracing::info!(target: "snapshot", path = %path.display(), rows = rows.len(), "snapshot written");
    Ok(path)
}

fn write_rows(path: &Path, rows: &[ScoredArticle]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    // Explicit header so an empty batch still yields a valid file.
    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("serializing row for {}", row.ticker))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Read a snapshot back.
pub fn read_snapshot(path: &Path) -> Result<Vec<ScoredArticle>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening snapshot {}", path.display()))?;
    rdr.deserialize()
        .collect::<std::result::Result<Vec<ScoredArticle>, _>>()
        .with_context(|| format!("parsing snapshot {}", path.display()))
}

/// Lexicographically greatest `*.csv` in `dir`, if any.
pub fn latest_csv(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
    };
    let mut csvs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("csv"))
        .collect();
    csvs.sort();
    Ok(csvs.pop())
}

/// Count of rows per label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSummary {
    counts: BTreeMap<SentimentLabel, usize>,
}

impl LabelSummary {
    pub fn from_rows(rows: &[ScoredArticle]) -> Self {
        let mut counts = BTreeMap::new();
        for r in rows {
            *counts.entry(r.sentiment_label).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn count(&self, label: SentimentLabel) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Labels present in the batch, most frequent first.
    pub fn lines(&self) -> Vec<String> {
        let mut v: Vec<(SentimentLabel, usize)> =
            self.counts.iter().map(|(k, v)| (*k, *v)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        v.into_iter().map(|(l, n)| format!("{l:<9} {n}")).collect()
    }
}
