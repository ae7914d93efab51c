//! Health signal for the read side.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::ingest::report::CycleReport;

/// Point-in-time view of scheduler health.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    /// End of the last cycle in which at least one feed was ingested.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Start of the most recent cycle.
    pub last_cycle_started_at: Option<DateTime<Utc>>,
    /// Most recent cycle-level or feed-level error.
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub cycles_run: u64,
    /// Cycles that aborted or in which every feed failed.
    pub cycles_failed: u64,
    pub ticks_skipped: u64,
    pub cycle_in_progress: bool,
    pub last_report: Option<CycleReport>,
}

impl HealthSnapshot {
    /// Whether a cycle completed within `max_age` of `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        self.last_success_at
            .map(|at| now - at <= max_age)
            .unwrap_or(false)
    }
}

/// Shared, cheaply cloneable health state.
#[derive(Debug, Clone, Default)]
pub struct HealthMonitor {
    inner: Arc<RwLock<HealthSnapshot>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> HealthSnapshot {
        self.inner.read().await.clone()
    }

    pub(crate) async fn cycle_started(&self, at: DateTime<Utc>) {
        let mut state = self.inner.write().await;
        state.cycle_in_progress = true;
        state.last_cycle_started_at = Some(at);
    }

    /// Record a cycle that ran. An interrupted cycle that dispatched nothing
    /// counts neither as a success nor as a failure.
    pub(crate) async fn cycle_finished(&self, report: CycleReport) {
        let mut state = self.inner.write().await;
        state.cycle_in_progress = false;
        state.cycles_run += 1;
        if report.feeds.iter().any(|f| f.is_success()) {
            state.last_success_at = Some(report.finished_at);
        } else if !report.feeds.is_empty() {
            state.cycles_failed += 1;
        }
        if let Some(failed) = report.feeds.iter().find(|f| !f.is_success()) {
            state.last_error = Some(format!(
                "{}: {}",
                failed.source_url,
                failed.error.as_deref().unwrap_or_default()
            ));
            state.last_error_at = Some(report.finished_at);
        }
        state.last_report = Some(report);
    }

    pub(crate) async fn cycle_failed(&self, error: String) {
        let mut state = self.inner.write().await;
        state.cycle_in_progress = false;
        state.cycles_run += 1;
        state.cycles_failed += 1;
        state.last_error = Some(error);
        state.last_error_at = Some(Utc::now());
    }

    pub(crate) async fn tick_skipped(&self) {
        self.inner.write().await.ticks_skipped += 1;
    }
}
