//! # Aggregator
//! Concatenates per-pair batches (already in symbol-then-source order) and
//! keeps the first record for every `(headline, ticker)` key.

use std::collections::HashSet;

use metrics::counter;

use crate::ingest::types::ArticleRecord;
use crate::ingest::PairBatch;

/// Merge batches in the given order, then dedup. Returns the kept records and
/// the number of duplicates removed.
pub fn merge_and_dedup(batches: Vec<PairBatch>) -> (Vec<ArticleRecord>, usize) {
    let merged = batches.into_iter().flat_map(|b| b.records).collect();
    dedup_first_seen(merged)
}

/// First occurrence wins; relative order of survivors is preserved.
pub fn dedup_first_seen(records: Vec<ArticleRecord>) -> (Vec<ArticleRecord>, usize) {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(records.len());
    let mut keep = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for rec in records {
        if !seen.insert((rec.headline.clone(), rec.ticker.clone())) {
            dropped += 1;
            continue;
        }
        keep.push(rec);
    }

    counter!("ingest_dedup_total").increment(dropped as u64);
    (keep, dropped)
}
