// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod api;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod sentiment;
pub mod snapshot;

// ---- Re-exports for stable public API ----
pub use crate::clock::RunDate;
pub use crate::config::{PipelineConfig, TrackedSymbol};
pub use crate::pipeline::{Pipeline, RunOutcome};
pub use crate::sentiment::{Lexicon, ScoredArticle, SentimentAnalyzer, SentimentLabel};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: `RUST_LOG` filter (default `info`), compact
/// output on stderr, or JSON when `LOG_FORMAT=json`. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
}
