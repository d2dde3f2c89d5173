//! Serves the joined news/price views as JSON. Reads snapshots, never writes.

use anyhow::Context;
use ticker_news_sentiment::api::{create_router, AppState};
use ticker_news_sentiment::dashboard::{self, DashboardData};
use ticker_news_sentiment::metrics::Metrics;
use ticker_news_sentiment::PipelineConfig;

const ENV_DASHBOARD_ADDR: &str = "DASHBOARD_ADDR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    ticker_news_sentiment::init_tracing();

    let cfg = PipelineConfig::load_default().context("loading pipeline config")?;
    let metrics = Metrics::for_dashboard()?;

    // Missing snapshots are not fatal; /admin/reload picks them up later.
    let data = dashboard::load_latest(&cfg.news_dir, &cfg.prices_dir).unwrap_or_else(|e| {
        tracing::warn!(target: "dashboard", error = %e, "starting without data");
        DashboardData::default()
    });

    let state = AppState::new(data, cfg.news_dir.clone(), cfg.prices_dir.clone());
    let app = create_router(state).merge(metrics.router());

    let addr = std::env::var(ENV_DASHBOARD_ADDR).unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(target: "dashboard", %addr, "listening");
    axum::serve(listener, app).await.context("dashboard server")?;
    Ok(())
}
