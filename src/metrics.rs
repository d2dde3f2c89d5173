//! Prometheus recorder setup for both binaries. The batch run renders its
//! series to a textfile at the end; the dashboard serves its own on `/metrics`.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide recorder. Fails if one is already installed.
    fn install() -> Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    /// Recorder for a batch run, with the ingest/snapshot series described.
    pub fn for_pipeline() -> Result<Self> {
        let m = Self::install()?;
        describe_pipeline();
        Ok(m)
    }

    /// Recorder for the dashboard server.
    pub fn for_dashboard() -> Result<Self> {
        let m = Self::install()?;
        metrics::describe_counter!("dashboard_requests_total", "Dashboard view requests.");
        Ok(m)
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write the exposition text for a node-exporter style textfile collector.
    /// Goes through a temporary sibling so scrapers never see a partial file.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating metrics dir {}", dir.display()))?;
        }
        let tmp = path.with_extension("prom.tmp");
        fs::write(&tmp, self.render())
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("moving metrics to {}", path.display()))
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Descriptions for every series a pipeline run records.
pub fn describe_pipeline() {
    crate::ingest::ensure_metrics_described();
    metrics::describe_counter!("snapshot_rows_total", "Rows written to news snapshots.");
    metrics::describe_gauge!("pipeline_last_run_rows", "Rows written by the last run.");
}
