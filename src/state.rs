use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;

use crate::models::Report;

/// Payload of an `UpdateReports` action.
#[derive(Debug, Clone)]
pub struct ReportsUpdate {
    pub reports: Vec<Report>,
    pub last_updated: DateTime<Utc>,
    pub total_reports: usize,
    pub wallet_address: String,
}

/// Events the poller emits into application state.
#[derive(Debug, Clone)]
pub enum Action {
    SetFetchingLocation(bool),
    SetFetchingReports(bool),
    UpdateReports(ReportsUpdate),
}

/// Output channel handed to the poller; the receiving end drives the state
/// loop in main.
pub type Dispatch = UnboundedSender<Action>;

/// Reduced application state consumed by the UI layer and observed by the
/// report tracker.
#[derive(Debug, Default)]
pub struct AppState {
    pub reports: Vec<Report>,
    pub last_updated: Option<DateTime<Utc>>,
    pub total_reports: usize,
    pub wallet_address: Option<String>,
    pub is_fetching_location: bool,
    pub is_fetching_reports: bool,
}

impl AppState {
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SetFetchingLocation(flag) => self.is_fetching_location = flag,
            Action::SetFetchingReports(flag) => self.is_fetching_reports = flag,
            Action::UpdateReports(update) => {
                self.reports = update.reports;
                self.last_updated = Some(update.last_updated);
                self.total_reports = update.total_reports;
                self.wallet_address = Some(update.wallet_address);
            }
        }
    }
}
