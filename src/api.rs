//! HTTP views over the joined dashboard data. Every route is read-only with
//! respect to snapshots; `/admin/reload` only re-reads the latest files.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use metrics::counter;
use tower_http::cors::CorsLayer;

use crate::dashboard::{self, DashboardData, HeadlineRow, SentimentPricePoint};

#[derive(Clone)]
pub struct AppState {
    data: Arc<RwLock<DashboardData>>,
    news_dir: PathBuf,
    prices_dir: PathBuf,
}

impl AppState {
    pub fn new(data: DashboardData, news_dir: PathBuf, prices_dir: PathBuf) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            news_dir,
            prices_dir,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/sentiment-vs-price", get(sentiment_vs_price))
        .route("/headlines", get(headlines))
        .route("/admin/reload", get(admin_reload))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn sentiment_vs_price(State(state): State<AppState>) -> Json<Vec<SentimentPricePoint>> {
    counter!("dashboard_requests_total", "view" => "sentiment-vs-price").increment(1);
    let guard = state.data.read().unwrap_or_else(|e| e.into_inner());
    Json(guard.points.clone())
}

#[derive(serde::Deserialize)]
struct HeadlinesQuery {
    ticker: Option<String>,
    limit: Option<usize>,
}

async fn headlines(
    State(state): State<AppState>,
    Query(q): Query<HeadlinesQuery>,
) -> Json<Vec<HeadlineRow>> {
    counter!("dashboard_requests_total", "view" => "headlines").increment(1);
    let guard = state.data.read().unwrap_or_else(|e| e.into_inner());
    let rows = guard
        .headlines
        .iter()
        .filter(|r| {
            q.ticker
                .as_deref()
                .map_or(true, |t| r.ticker.eq_ignore_ascii_case(t))
        })
        .take(q.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    Json(rows)
}

async fn admin_reload(State(state): State<AppState>) -> (StatusCode, String) {
    match dashboard::load_latest(&state.news_dir, &state.prices_dir) {
        Ok(fresh) => {
            let rows = fresh.headlines.len();
            match state.data.write() {
                Ok(mut w) => {
                    *w = fresh;
                    (StatusCode::OK, format!("reloaded {rows} headlines"))
                }
                Err(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed: lock poisoned".to_string(),
                ),
            }
        }
        Err(e) => {
            tracing::warn!(target: "dashboard", error = %e, "reload failed");
            (StatusCode::SERVICE_UNAVAILABLE, format!("reload failed: {e:#}"))
        }
    }
}
