use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::models::{Report, ReportId};
use crate::storage::{keys, KeyValueStore};

/// Delay between surfacing the toast and persisting the freshly notified
/// IDs, so the set mutation lands after the current state flush.
const PERSIST_DELAY: Duration = Duration::from_millis(50);

/// Tracks which reports have already been surfaced (notified) or navigated
/// into (opened), persisting both sets independently. Detects newly arrived
/// reports whenever the observed reports list changes length and queues a
/// one-shot toast.
pub struct ReportTracker {
    store: Arc<dyn KeyValueStore>,
    notified: Vec<ReportId>,
    opened: Vec<ReportId>,
    is_loading: bool,
    has_initialized: bool,
    last_reports_len: Option<usize>,
    toast: Option<String>,
}

impl ReportTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            notified: Vec::new(),
            opened: Vec::new(),
            is_loading: true,
            has_initialized: false,
            last_reports_len: None,
            toast: None,
        }
    }

    /// Initial load of both persisted sets. Runs once; detection stays
    /// disabled until it completes. Each set loads independently, so a
    /// corrupted one never takes the other down with it.
    pub async fn load(&mut self) {
        self.notified = self.load_set(keys::NOTIFIED_REPORTS).await;
        self.opened = self.load_set(keys::OPENED_REPORTS).await;
        self.is_loading = false;
        self.has_initialized = true;
        debug!(
            "tracker loaded: {} notified, {} opened",
            self.notified.len(),
            self.opened.len()
        );
    }

    async fn load_set(&self, key: &str) -> Vec<ReportId> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("failed to load {}: {}", key, e);
                return Vec::new();
            }
        };
        if raw == "null" {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<ReportId>>(&raw) {
            Ok(ids) => ids,
            Err(e) => {
                error!("corrupted {} entry, resetting: {}", key, e);
                if let Err(e) = self.store.remove(key).await {
                    error!("failed to remove corrupted {}: {}", key, e);
                }
                Vec::new()
            }
        }
    }

    /// Reacts to the live reports list. Triggered on length change only;
    /// a same-length content replacement is deliberately ignored.
    pub async fn observe_reports(&mut self, reports: &[Report]) {
        if !self.has_initialized || self.is_loading {
            return;
        }
        if self.last_reports_len == Some(reports.len()) {
            return;
        }
        self.last_reports_len = Some(reports.len());

        let new_reports: Vec<&Report> = reports
            .iter()
            .filter(|r| !self.notified.contains(&r.id))
            .collect();
        if new_reports.is_empty() {
            return;
        }

        self.toast = Some(match new_reports.len() {
            1 => format!("New report: {}", new_reports[0].title),
            n => format!("{} new reports available", n),
        });
        info!("{} new report(s) detected", new_reports.len());

        let new_ids: Vec<ReportId> = new_reports.iter().map(|r| r.id.clone()).collect();
        // Defer the set mutation so the toast is observable before the
        // notified set churns. Accepted race window.
        tokio::time::sleep(PERSIST_DELAY).await;
        for id in new_ids {
            if !self.notified.contains(&id) {
                self.notified.push(id);
            }
        }
        self.persist_set(keys::NOTIFIED_REPORTS, &self.notified).await;
    }

    /// Marks a report as surfaced without waiting for detection (e.g. the
    /// user scrolled past it). Invalid IDs are rejected with a log.
    pub async fn mark_report_as_read(&mut self, id: &ReportId) {
        if !id.is_valid() {
            error!("refusing to mark invalid report id as read");
            return;
        }
        if self.notified.contains(id) {
            return;
        }
        self.notified.push(id.clone());
        self.persist_set(keys::NOTIFIED_REPORTS, &self.notified).await;
    }

    pub async fn mark_report_as_opened(&mut self, id: &ReportId) {
        if !id.is_valid() {
            error!("refusing to mark invalid report id as opened");
            return;
        }
        if self.opened.contains(id) {
            return;
        }
        self.opened.push(id.clone());
        self.persist_set(keys::OPENED_REPORTS, &self.opened).await;
    }

    pub fn is_new_report(&self, id: &ReportId) -> bool {
        !self.notified.contains(id)
    }

    pub fn is_report_opened(&self, id: &ReportId) -> bool {
        self.opened.contains(id)
    }

    pub async fn clear_read_reports(&mut self) {
        if let Err(e) = self.store.remove(keys::NOTIFIED_REPORTS).await {
            error!("failed to clear notified reports: {}", e);
        }
        self.notified.clear();
    }

    pub async fn clear_opened_reports(&mut self) {
        if let Err(e) = self.store.remove(keys::OPENED_REPORTS).await {
            error!("failed to clear opened reports: {}", e);
        }
        self.opened.clear();
    }

    /// One-shot consumption of the pending toast message.
    pub fn take_toast(&mut self) -> Option<String> {
        self.toast.take()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn notified_ids(&self) -> &[ReportId] {
        &self.notified
    }

    pub fn opened_ids(&self) -> &[ReportId] {
        &self.opened
    }

    /// Defensive persistence: blank IDs are dropped (with a warning) before
    /// the set is written. A failed write is logged and the in-memory set
    /// kept, so the next successful write converges.
    async fn persist_set(&self, key: &str, ids: &[ReportId]) {
        let kept: Vec<&ReportId> = ids.iter().filter(|id| id.is_valid()).collect();
        if kept.len() != ids.len() {
            warn!(
                "dropping {} invalid id(s) before persisting {}",
                ids.len() - kept.len(),
                key
            );
        }
        let encoded = match serde_json::to_string(&kept) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("failed to encode {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(key, &encoded).await {
            error!("failed to persist {}: {}", key, e);
        }
    }
}
