//! Polarity lexicon: the general-purpose VADER word table (from the
//! `vader_sentiment` crate) with a finance-specific override table on top. Entries may be multi-word
//! phrases ("short squeeze"); the analyzer matches those before single words.
//!
//! Built once at startup and shared by reference; there is no mutation API
//! after construction.

use std::collections::{HashMap, HashSet};

/// Finance-specific weights applied over the general table.
pub const DOMAIN_OVERRIDES: [(&str, f64); 10] = [
    ("bullish", 1.5),
    ("bearish", -1.5),
    ("rally", 1.3),
    ("plummet", -1.7),
    ("dividend", 0.5),
    ("bankrupt", -2.0),
    ("breakout", 1.2),
    ("downgrade", -1.3),
    ("upgrade", 1.3),
    ("short squeeze", 1.4),
];

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, f64>,
    /// Lower-cased token sequences of the multi-word entries.
    phrases: HashSet<Vec<String>>,
    max_phrase_len: usize,
}

impl Lexicon {
    /// Build from `(term, weight)` pairs; later pairs override earlier ones.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut lex = Self::default();
        lex.extend(entries);
        lex
    }

    /// The general-purpose table without domain overrides. Emoticon entries
    /// that contain spaces are left out so they never form phrases.
    pub fn general() -> Self {
        Self::from_entries(
            vader_sentiment::LEXICON
                .iter()
                .filter(|(term, _)| !term.contains(char::is_whitespace))
                .map(|(term, weight)| (*term, *weight)),
        )
    }

    /// General table plus `DOMAIN_OVERRIDES`.
    pub fn finance() -> Self {
        let mut lex = Self::general();
        lex.extend(DOMAIN_OVERRIDES);
        lex
    }

    /// `finance()` plus caller-supplied overrides (e.g. from config).
    pub fn finance_with<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut lex = Self::finance();
        lex.extend(extra);
        lex
    }

    fn extend<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        for (term, weight) in entries {
            let parts: Vec<String> = term
                .as_ref()
                .split_whitespace()
                .map(str::to_lowercase)
                .collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() > 1 {
                self.max_phrase_len = self.max_phrase_len.max(parts.len());
                self.phrases.insert(parts.clone());
            }
            self.entries.insert(parts.join(" "), weight);
        }
    }

    /// Weight for an already lower-cased word or space-joined phrase.
    #[inline]
    pub fn get(&self, term: &str) -> Option<f64> {
        self.entries.get(term).copied()
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(term)
    }

    /// Length (in tokens) of the longest phrase starting at `lowered[i]`.
    pub fn phrase_len_at(&self, lowered: &[String], i: usize) -> Option<usize> {
        let longest = self.max_phrase_len.min(lowered.len().saturating_sub(i));
        (2..=longest)
            .rev()
            .find(|&n| self.phrases.contains(&lowered[i..i + n]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_overrides_take_precedence() {
        let general = Lexicon::general();
        let fin = Lexicon::finance();
        assert!(general.get("bullish").is_none());
        assert_eq!(fin.get("bullish"), Some(1.5));
        assert_eq!(fin.get("bankrupt"), Some(-2.0));
        assert_eq!(fin.get("short squeeze"), Some(1.4));
        assert!(fin.len() > general.len());
    }

    #[test]
    fn general_table_is_full_vader() {
        let general = Lexicon::general();
        assert!(general.len() > 7_000, "only {} entries", general.len());
        assert_eq!(general.get("nice"), Some(1.8));
        assert_eq!(general.get("good"), Some(1.9));
        assert!(general.get("hurts").is_some_and(|w| w < 0.0));
        assert!(general.phrases.is_empty());
    }

    #[test]
    fn phrases_are_found_longest_first() {
        let lex = Lexicon::from_entries([("short squeeze", 1.4), ("short squeeze rally", 2.0)]);
        let toks: Vec<String> = ["a", "short", "squeeze", "rally"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(lex.phrase_len_at(&toks, 1), Some(3));
        assert_eq!(lex.phrase_len_at(&toks, 0), None);
        assert_eq!(lex.phrase_len_at(&toks, 3), None);
    }

    #[test]
    fn config_overrides_apply_last() {
        let lex = Lexicon::finance_with([("Bullish", 0.2)]);
        assert_eq!(lex.get("bullish"), Some(0.2));
    }
}
