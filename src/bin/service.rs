use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use report_sync::api::{HttpReportsApi, ReportsApi};
use report_sync::config::Config;
use report_sync::geo::{Geolocator, HttpGeolocator};
use report_sync::poller::PollingCoordinator;
use report_sync::state::{Action, AppState};
use report_sync::storage::{FileStore, KeyValueStore};
use report_sync::tracker::ReportTracker;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "report_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting report-sync");
    let cfg = Config::from_env()?;
    let timeout = Duration::from_millis(cfg.http_timeout_ms);

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&cfg.storage_dir));
    let reports_api: Arc<dyn ReportsApi> =
        Arc::new(HttpReportsApi::new(&cfg.api_base_url, timeout)?);
    let geolocator: Arc<dyn Geolocator> = Arc::new(HttpGeolocator::new(&cfg.geo_url, timeout)?);

    let mut tracker = ReportTracker::new(store.clone());
    tracker.load().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let coordinator = PollingCoordinator::new(
        store,
        reports_api,
        geolocator,
        Duration::from_millis(cfg.poll_interval_ms),
    );
    coordinator.set_dispatch(tx);
    coordinator.start_polling().await;

    // State loop: applies dispatched actions and lets the tracker observe
    // every reports update. The toast is the only user-facing surface here.
    let state_loop = tokio::spawn(async move {
        let mut app_state = AppState::default();
        while let Some(action) = rx.recv().await {
            let is_update = matches!(action, Action::UpdateReports(_));
            app_state.apply(action);
            if is_update {
                tracker.observe_reports(&app_state.reports).await;
                if let Some(toast) = tracker.take_toast() {
                    info!("toast: {}", toast);
                }
            }
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        _ = state_loop => {
            warn!("state loop exited unexpectedly");
        }
    }

    coordinator.stop_polling();
    Ok(())
}
