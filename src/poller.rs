use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::ReportsApi;
use crate::geo::{Coordinates, Geolocator};
use crate::models::{StoredMapLocation, StoredWallet};
use crate::state::{Action, Dispatch, ReportsUpdate};
use crate::storage::{keys, KeyValueStore};
use crate::transform::transform_response;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

struct Inner {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn ReportsApi>,
    geo: Arc<dyn Geolocator>,
    interval: Duration,
    dispatch: Mutex<Option<Dispatch>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    is_polling: AtomicBool,
    is_fetching_location: AtomicBool,
    is_fetching_reports: AtomicBool,
}

/// Drives the periodic report fetch cycle and exposes a manual trigger.
///
/// A manual cycle may overlap a timer cycle; that is tolerated. The fetching
/// flags are observability signals mirrored into dispatched actions, not
/// locks.
#[derive(Clone)]
pub struct PollingCoordinator {
    inner: Arc<Inner>,
}

impl PollingCoordinator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn ReportsApi>,
        geo: Arc<dyn Geolocator>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                api,
                geo,
                interval,
                dispatch: Mutex::new(None),
                timer: Mutex::new(None),
                is_polling: AtomicBool::new(false),
                is_fetching_location: AtomicBool::new(false),
                is_fetching_reports: AtomicBool::new(false),
            }),
        }
    }

    /// Wires the output channel used for lifecycle and result events.
    pub fn set_dispatch(&self, dispatch: Dispatch) {
        *lock(&self.inner.dispatch) = Some(dispatch);
    }

    pub fn is_polling(&self) -> bool {
        self.inner.is_polling.load(Ordering::SeqCst)
    }

    pub fn is_fetching_location(&self) -> bool {
        self.inner.is_fetching_location.load(Ordering::SeqCst)
    }

    pub fn is_fetching_reports(&self) -> bool {
        self.inner.is_fetching_reports.load(Ordering::SeqCst)
    }

    /// Runs one cycle immediately, then one every interval until
    /// `stop_polling`. No-op when a polling session is already active.
    pub async fn start_polling(&self) {
        if self.inner.is_polling.swap(true, Ordering::SeqCst) {
            debug!("polling already active, ignoring start");
            return;
        }
        info!("polling started, interval={:?}", self.inner.interval);

        // The timer handle must be in place before the initial cycle is
        // awaited, so a stop_polling that lands mid-cycle can cancel the
        // session instead of racing the spawn.
        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(coordinator.inner.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial cycle
            // runs in start_polling itself.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                coordinator.run_cycle().await;
            }
        });
        {
            let mut timer = lock(&self.inner.timer);
            if !self.inner.is_polling.load(Ordering::SeqCst) {
                // stop_polling won the race; the session is over.
                handle.abort();
                return;
            }
            *timer = Some(handle);
        }

        self.run_cycle().await;
    }

    /// Cancels the repeating timer. Idempotent; an in-flight cycle is not
    /// aborted and its dispatch will still land.
    pub fn stop_polling(&self) {
        let mut timer = lock(&self.inner.timer);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        if self.inner.is_polling.swap(false, Ordering::SeqCst) {
            info!("polling stopped");
        }
    }

    /// Runs exactly one cycle now, independent of the timer.
    pub async fn poll_now(&self) {
        self.run_cycle().await;
    }

    /// One fetch cycle: wallet gate, location resolve, reports fetch,
    /// dispatch. Every external call is caught here; nothing propagates out.
    async fn run_cycle(&self) {
        let Some(wallet_address) = self.read_wallet().await else {
            debug!("no wallet address yet, skipping reports fetch");
            return;
        };

        if let Some(last) = self.read_map_location().await {
            debug!(
                "last known map location: {:.4}, {:.4}",
                last.latitude, last.longitude
            );
        }

        self.set_fetching_location(true);
        let located = match self.inner.geo.get_location().await {
            Ok(coords) => coords,
            Err(e) => {
                error!("failed to resolve device location: {}", e);
                None
            }
        };
        // Reset exactly once per cycle, on every path out of the call above.
        self.set_fetching_location(false);
        let Some(Coordinates {
            latitude,
            longitude,
        }) = located
        else {
            warn!("no usable device location, skipping reports fetch");
            return;
        };

        self.set_fetching_reports(true);
        match self
            .inner
            .api
            .get_reports_by_latlon(latitude, longitude)
            .await
        {
            Ok(result) if result.ok => {
                let reports = transform_response(result.reports);
                info!("fetched {} reports near {:.4}, {:.4}", reports.len(), latitude, longitude);
                let update = ReportsUpdate {
                    total_reports: reports.len(),
                    reports,
                    last_updated: Utc::now(),
                    wallet_address,
                };
                self.dispatch(Action::UpdateReports(update));
            }
            Ok(result) => {
                error!(
                    "reports fetch rejected: {}",
                    result.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
            Err(e) => error!("reports fetch failed: {}", e),
        }
        self.set_fetching_reports(false);
    }

    async fn read_wallet(&self) -> Option<String> {
        let raw = match self.inner.store.get(keys::WALLET_ADDRESS).await {
            Ok(raw) => raw?,
            Err(e) => {
                error!("failed to read wallet entry: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<StoredWallet>(&raw) {
            Ok(wallet) if !wallet.address.is_empty() => Some(wallet.address),
            Ok(_) => None,
            Err(e) => {
                warn!("malformed wallet entry: {}", e);
                None
            }
        }
    }

    async fn read_map_location(&self) -> Option<StoredMapLocation> {
        match self.inner.store.get(keys::MAP_LOCATION).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("failed to read map location entry: {}", e);
                None
            }
        }
    }

    fn set_fetching_location(&self, fetching: bool) {
        self.inner
            .is_fetching_location
            .store(fetching, Ordering::SeqCst);
        self.dispatch(Action::SetFetchingLocation(fetching));
    }

    fn set_fetching_reports(&self, fetching: bool) {
        self.inner
            .is_fetching_reports
            .store(fetching, Ordering::SeqCst);
        self.dispatch(Action::SetFetchingReports(fetching));
    }

    fn dispatch(&self, action: Action) {
        match lock(&self.inner.dispatch).as_ref() {
            Some(tx) => {
                if tx.send(action).is_err() {
                    debug!("dispatch receiver dropped, action lost");
                }
            }
            None => debug!("no dispatch wired, dropping action"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|e| panic!("poller lock poisoned: {}", e))
}
