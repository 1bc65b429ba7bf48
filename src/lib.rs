//! procwatch -- process monitoring, anomaly scoring, and short-horizon forecasting.
//!
//! This crate provides the analytical backend behind a process-inspection
//! dashboard: a background sampler feeding a shared per-process history,
//! a snapshot anomaly scorer, and an on-demand forecast pipeline.

pub mod api;
pub mod classify;
pub mod collector;
pub mod config;
pub mod detect;
pub mod forecast;
pub mod monitor;

use crate::api::AppState;
use crate::collector::SystemCollector;
use crate::config::Config;
use crate::monitor::{HistoryStore, Sampler};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Start the procwatch daemon: background sampler + API server.
pub async fn serve(bind: &str, config: Config) -> Result<()> {
    let collector = Arc::new(SystemCollector::new());
    let store = HistoryStore::new(config.sampler.retention);

    // Background sampler runs for the daemon's lifetime, independent of any
    // request; the watch channel lets teardown stop it before draining reads.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sampler = Sampler::new(
        collector.clone(),
        store.clone(),
        Duration::from_secs(config.sampler.interval_secs),
    );
    let sampler_handle = tokio::spawn(sampler.run(shutdown_rx));

    let state = AppState::new(collector, store, config);
    let app = api::router(state);

    let addr: std::net::SocketAddr = bind.parse()?;
    tracing::info!(%addr, "procwatch listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    // Server loop ended: stop the sampler, then let it drain.
    let _ = shutdown_tx.send(true);
    let _ = sampler_handle.await;

    Ok(())
}
