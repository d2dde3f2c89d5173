//! # Sentiment Scorer
//! Rule-based headline polarity in the VADER style: lexicon valence adjusted
//! by boosters, negation, ALL-CAPS emphasis, "but" shifts and `!`/`?`
//! emphasis, normalized into a compound score in `[-1, 1]`.
//!
//! Multi-word lexicon entries are merged into a single token before any
//! per-word rule runs, so "short squeeze" scores as one term.

pub mod lexicon;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ingest::types::{ArticleRecord, FeedSource};
pub use crate::sentiment::lexicon::{Lexicon, DOMAIN_OVERRIDES};

/// Compound at or above this is `positive`.
pub const POSITIVE_THRESHOLD: f64 = 0.1;
/// Compound at or below this is `negative`.
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
const NORMALIZE_ALPHA: f64 = 15.0;

static BOOSTERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let incr = [
        "absolutely", "amazingly", "awfully", "completely", "considerable", "considerably",
        "decidedly", "deeply", "enormous", "enormously", "entirely", "especially",
        "exceptional", "exceptionally", "extreme", "extremely", "fabulously", "fully",
        "greatly", "hella", "highly", "hugely", "incredible", "incredibly", "intensely",
        "major", "majorly", "more", "most", "particularly", "purely", "quite", "really",
        "remarkably", "so", "substantially", "thoroughly", "total", "totally", "tremendous",
        "tremendously", "uber", "unbelievably", "unusually", "utter", "utterly", "very",
    ];
    let decr = [
        "almost", "barely", "hardly", "kinda", "kindof", "kind-of", "less", "little",
        "marginal", "marginally", "occasional", "occasionally", "partly", "scarce",
        "scarcely", "slight", "slightly", "somewhat", "sorta", "sortof", "sort-of",
    ];
    incr.into_iter()
        .map(|w| (w, B_INCR))
        .chain(decr.into_iter().map(|w| (w, B_DECR)))
        .collect()
});

const NEGATE: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't",
    "aren't", "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt",
    "havent", "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't",
    "isn't", "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor", "not",
    "nothing", "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent", "oughtn't",
    "shan't", "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont", "wouldnt", "won't",
    "wouldn't", "rarely", "seldom", "despite",
];

/// Negative/neutral/positive fractions (summing to 1) plus the compound score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
    pub compound: f64,
}

impl PolarityScores {
    /// Scores of text with no tokens: fully neutral.
    pub const EMPTY: PolarityScores = PolarityScores {
        negative: 0.0,
        neutral: 1.0,
        positive: 0.0,
        compound: 0.0,
    };

    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_compound(self.compound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An article with its scores. Field order is the snapshot column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub date: NaiveDate,
    pub headline: String,
    pub ticker: String,
    pub source: FeedSource,
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
    pub compound: f64,
    pub sentiment_label: SentimentLabel,
}

impl ScoredArticle {
    pub fn new(rec: ArticleRecord, scores: PolarityScores) -> Self {
        Self {
            date: rec.date,
            headline: rec.headline,
            ticker: rec.ticker,
            source: rec.source,
            negative: scores.negative,
            neutral: scores.neutral,
            positive: scores.positive,
            compound: scores.compound,
            sentiment_label: scores.label(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    text: String,
    lower: String,
}

/// Stateless scorer over a borrowed lexicon.
#[derive(Debug, Clone, Copy)]
pub struct SentimentAnalyzer<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> SentimentAnalyzer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn score_records(&self, records: Vec<ArticleRecord>) -> Vec<ScoredArticle> {
        records
            .into_iter()
            .map(|rec| {
                let scores = self.polarity_scores(&rec.headline);
                ScoredArticle::new(rec, scores)
            })
            .collect()
    }

    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let tokens = self.tokenize(text);
        if tokens.is_empty() {
            return PolarityScores::EMPTY;
        }
        let lowered: Vec<&str> = tokens.iter().map(|t| t.lower.as_str()).collect();
        let cap_diff = allcap_differential(&tokens);

        let mut sentiments = Vec::with_capacity(tokens.len());
        for i in 0..tokens.len() {
            let lw = lowered[i];
            if BOOSTERS.contains_key(lw)
                || (lw == "kind" && lowered.get(i + 1).is_some_and(|n| *n == "of"))
            {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.valence_at(&tokens, &lowered, i, cap_diff));
        }

        but_check(&lowered, &mut sentiments);
        score_valence(&sentiments, text)
    }

    /// Whitespace split, edge punctuation stripped from words longer than two
    /// characters, then multi-word lexicon phrases merged into one token.
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let words: Vec<&str> = text.split_whitespace().map(strip_punc_if_word).collect();
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();

        let mut out = Vec::with_capacity(words.len());
        let mut i = 0;
        while i < words.len() {
            let n = self.lexicon.phrase_len_at(&lowered, i).unwrap_or(1);
            out.push(Token {
                text: words[i..i + n].join(" "),
                lower: lowered[i..i + n].join(" "),
            });
            i += n;
        }
        out
    }

    fn valence_at(&self, tokens: &[Token], lowered: &[&str], i: usize, cap_diff: bool) -> f64 {
        let lw = lowered[i];
        let Some(base) = self.lexicon.get(lw) else {
            return 0.0;
        };
        let mut valence = base;

        // "no" used as a determiner carries no valence of its own.
        if lw == "no" && lowered.get(i + 1).is_some_and(|n| self.lexicon.contains(n)) {
            valence = 0.0;
        }
        if (i > 0 && lowered[i - 1] == "no")
            || (i > 1 && lowered[i - 2] == "no")
            || (i > 2 && lowered[i - 3] == "no" && matches!(lowered[i - 1], "or" | "nor"))
        {
            valence = base * N_SCALAR;
        }

        if cap_diff && is_all_caps(&tokens[i].text) {
            valence += if valence > 0.0 { C_INCR } else { -C_INCR };
        }

        for start_i in 0..3 {
            if i > start_i && !self.lexicon.contains(lowered[i - (start_i + 1)]) {
                let prev = &tokens[i - (start_i + 1)];
                let mut s = scalar_inc_dec(prev, valence, cap_diff);
                if start_i == 1 && s != 0.0 {
                    s *= 0.95;
                }
                if start_i == 2 && s != 0.0 {
                    s *= 0.9;
                }
                valence += s;
                valence = negation_check(valence, lowered, start_i, i);
            }
        }

        self.least_check(valence, lowered, i)
    }

    fn least_check(&self, valence: f64, lowered: &[&str], i: usize) -> f64 {
        if i > 1 && lowered[i - 1] == "least" && !self.lexicon.contains(lowered[i - 1]) {
            if lowered[i - 2] != "at" && lowered[i - 2] != "very" {
                return valence * N_SCALAR;
            }
        } else if i > 0 && lowered[i - 1] == "least" && !self.lexicon.contains(lowered[i - 1]) {
            return valence * N_SCALAR;
        }
        valence
    }
}

fn strip_punc_if_word(token: &str) -> &str {
    let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
    if stripped.chars().count() <= 2 {
        token
    } else {
        stripped
    }
}

/// Python-style `isupper`: at least one cased char and no lowercase ones.
fn is_all_caps(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

/// `true` when some, but not all, tokens are ALL CAPS.
fn allcap_differential(tokens: &[Token]) -> bool {
    let caps = tokens.iter().filter(|t| is_all_caps(&t.text)).count();
    let diff = tokens.len() - caps;
    diff > 0 && diff < tokens.len()
}

fn is_negated(word: &str) -> bool {
    NEGATE.contains(&word) || word.contains("n't")
}

fn scalar_inc_dec(prev: &Token, valence: f64, cap_diff: bool) -> f64 {
    let Some(&base) = BOOSTERS.get(prev.lower.as_str()) else {
        return 0.0;
    };
    let mut scalar = if valence < 0.0 { -base } else { base };
    if cap_diff && is_all_caps(&prev.text) {
        scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
    }
    scalar
}

fn negation_check(valence: f64, lowered: &[&str], start_i: usize, i: usize) -> f64 {
    let so_this = |w: &str| w == "so" || w == "this";
    match start_i {
        0 => {
            if is_negated(lowered[i - 1]) {
                return valence * N_SCALAR;
            }
        }
        1 => {
            if lowered[i - 2] == "never" && so_this(lowered[i - 1]) {
                return valence * 1.25;
            } else if lowered[i - 2] == "without" && lowered[i - 1] == "doubt" {
                return valence;
            } else if is_negated(lowered[i - 2]) {
                return valence * N_SCALAR;
            }
        }
        2 => {
            if lowered[i - 3] == "never" && (so_this(lowered[i - 2]) || so_this(lowered[i - 1])) {
                return valence * 1.25;
            } else if lowered[i - 3] == "without"
                && (lowered[i - 2] == "doubt" || lowered[i - 1] == "doubt")
            {
                return valence;
            } else if is_negated(lowered[i - 3]) {
                return valence * N_SCALAR;
            }
        }
        _ => {}
    }
    valence
}

/// Sentiment before "but" is halved, after it is boosted by half.
fn but_check(lowered: &[&str], sentiments: &mut [f64]) {
    if let Some(bi) = lowered.iter().position(|w| *w == "but") {
        for (idx, s) in sentiments.iter_mut().enumerate() {
            if idx < bi {
                *s *= 0.5;
            } else if idx > bi {
                *s *= 1.5;
            }
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let ep = text.matches('!').count().min(4) as f64 * 0.292;
    let qm = text.matches('?').count();
    let qm_amp = match qm {
        0 | 1 => 0.0,
        2..=3 => qm as f64 * 0.18,
        _ => 0.96,
    };
    ep + qm_amp
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn score_valence(sentiments: &[f64], text: &str) -> PolarityScores {
    let punct = punctuation_emphasis(text);

    let mut sum_s: f64 = sentiments.iter().sum();
    if sum_s > 0.0 {
        sum_s += punct;
    } else if sum_s < 0.0 {
        sum_s -= punct;
    }
    let compound = round4(normalize(sum_s));

    let (mut pos_sum, mut neg_sum, mut neu_count) = (0.0f64, 0.0f64, 0.0f64);
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += punct;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= punct;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    PolarityScores {
        negative: (neg_sum / total).abs(),
        neutral: (neu_count / total).abs(),
        positive: (pos_sum / total).abs(),
        compound,
    }
}
