// tests/pipeline_config.rs
use std::{env, fs};
use ticker_news_sentiment::config::{PipelineConfig, ENV_CONFIG_PATH};
use ticker_news_sentiment::ingest::types::FeedSource;
use ticker_news_sentiment::TrackedSymbol;

#[test]
fn full_document_parses() {
    let cfg = PipelineConfig::from_toml_str(
        r#"
retention_days = 3
news_dir = "out/news"
feed_retries = 0

[[tickers]]
ticker = "BRK.B"
name = "Berkshire Hathaway"

[feeds]
yahoo = "https://example.test/rss?s={ticker}"

[lexicon_overrides]
" Beat Estimates " = 1.1
"#,
    )
    .unwrap();
    assert_eq!(cfg.retention_days, 3);
    assert_eq!(cfg.feed_retries, 0);
    assert_eq!(cfg.feed_timeout_secs, 15);
    assert_eq!(cfg.news_dir.to_str(), Some("out/news"));
    assert_eq!(
        cfg.tickers,
        vec![TrackedSymbol::new("BRK.B", "Berkshire Hathaway")]
    );
    assert_eq!(
        cfg.feeds.template_for(FeedSource::Yahoo),
        "https://example.test/rss?s={ticker}"
    );
    assert!(cfg.feeds.template_for(FeedSource::Google).contains("{query}"));
    assert_eq!(cfg.lexicon_overrides.get("beat estimates"), Some(&1.1));
}

#[test]
fn rejects_invalid_documents() {
    assert!(PipelineConfig::from_toml_str("retention_days = 0").is_err());
    assert!(PipelineConfig::from_toml_str("retention_days = \"seven\"").is_err());
    let dup = r#"
[[tickers]]
ticker = "AAPL"
name = "Apple"
[[tickers]]
ticker = "AAPL"
name = "Apple again"
"#;
    assert!(PipelineConfig::from_toml_str(dup).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // keep the repo's own config/ out of the way
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // 1) nothing on disk: built-in defaults
    let cfg = PipelineConfig::load_default().unwrap();
    assert_eq!(cfg.tickers.len(), 8);

    // 2) ./config/pipeline.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/pipeline.toml"),
        "retention_days = 14\n",
    )
    .unwrap();
    assert_eq!(PipelineConfig::load_default().unwrap().retention_days, 14);

    // 3) env var wins
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, "retention_days = 2\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(PipelineConfig::load_default().unwrap().retention_days, 2);

    // 4) env var pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(PipelineConfig::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}
