//! Periodic ingestion cycles.
//!
//! A tick starts a cycle unless the previous one is still running, in which
//! case the tick is skipped. Within a cycle feeds are handled by a bounded
//! pool of tasks.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex, OwnedMutexGuard, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::feed::FeedRegistry;
use crate::ingest::health::HealthMonitor;
use crate::ingest::pipeline::IngestPipeline;
use crate::ingest::report::{CycleReport, FeedOutcome};
use crate::Result;

/// Shortest tick period the scheduler accepts.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);
/// Longest tick period the scheduler accepts.
pub const MAX_INTERVAL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Scheduling state shared by a scheduler and its handles.
///
/// Each scheduler gets its own context, so tests can run several in
/// isolation.
#[derive(Clone)]
pub struct SchedulerContext {
    cycle_lock: Arc<Mutex<()>>,
    health: HealthMonitor,
    shutdown: Arc<watch::Sender<bool>>,
}

impl SchedulerContext {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            cycle_lock: Arc::new(Mutex::new(())),
            health: HealthMonitor::new(),
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// Handle that stops the scheduler.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Default for SchedulerContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests a graceful stop.
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Stop starting cycles and stop dispatching feeds in the running one.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Periodic ingestion scheduler.
#[derive(Clone)]
pub struct Scheduler {
    ctx: SchedulerContext,
    registry: Arc<FeedRegistry>,
    pipeline: Arc<IngestPipeline>,
    interval: Duration,
    max_concurrent: usize,
}

impl Scheduler {
    pub fn new(
        ctx: SchedulerContext,
        registry: Arc<FeedRegistry>,
        pipeline: Arc<IngestPipeline>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            ctx,
            registry,
            pipeline,
            interval: Duration::from_secs(config.fetch_interval_secs)
                .clamp(MIN_INTERVAL, MAX_INTERVAL),
            max_concurrent: config.max_concurrent_fetches.max(1),
        }
    }

    /// Override the tick interval, clamped to `MIN_INTERVAL..=MAX_INTERVAL`.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        self
    }

    pub fn context(&self) -> &SchedulerContext {
        &self.ctx
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.ctx.health
    }

    /// Run until shutdown is requested.
    ///
    /// The first cycle starts immediately. On shutdown, returns once the
    /// in-flight cycle (if any) has finished.
    pub async fn run(&self) {
        info!(
            "Scheduler started ({} feed(s), interval {:?})",
            self.registry.len(),
            self.interval
        );

        let mut shutdown = self.ctx.shutdown.subscribe();
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = timer.tick() => {
                    if self.ctx.is_shutdown() {
                        break;
                    }
                    if self.try_start_cycle().is_none() {
                        warn!("Previous cycle still running, skipping tick");
                        self.ctx.health.tick_skipped().await;
                    }
                }
                _ = shutdown.changed() => {}
            }
        }

        info!("Shutdown requested, waiting for in-flight cycle");
        let _idle = self.ctx.cycle_lock.lock().await;
        info!("Scheduler stopped");
    }

    /// Start a cycle in the background unless one is already running.
    pub fn try_start_cycle(&self) -> Option<JoinHandle<Result<CycleReport>>> {
        let guard = Arc::clone(&self.ctx.cycle_lock).try_lock_owned().ok()?;
        let scheduler = self.clone();
        Some(tokio::spawn(async move {
            scheduler.run_cycle_locked(guard).await
        }))
    }

    /// Run a cycle now, waiting for any in-flight cycle first.
    pub async fn run_cycle_now(&self) -> Result<CycleReport> {
        let guard = Arc::clone(&self.ctx.cycle_lock).lock_owned().await;
        self.run_cycle_locked(guard).await
    }

    async fn run_cycle_locked(&self, _guard: OwnedMutexGuard<()>) -> Result<CycleReport> {
        let started_at = Utc::now();
        self.ctx.health.cycle_started(started_at).await;
        info!("Cycle started ({} feed(s))", self.registry.len());

        if let Err(e) = self.pipeline.database().ping().await {
            error!("Cycle aborted, storage unreachable: {}", e);
            self.ctx.health.cycle_failed(e.to_string()).await;
            return Err(e);
        }

        let (feeds, interrupted) = self.dispatch_feeds().await;
        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            feeds,
            interrupted,
        };

        info!(
            "Cycle finished: {} new article(s), {} failed feed(s){}",
            report.inserted(),
            report.failed_feeds(),
            if interrupted { ", interrupted" } else { "" }
        );
        self.ctx.health.cycle_finished(report.clone()).await;
        Ok(report)
    }

    /// Hand feeds to the worker pool until done or shut down.
    async fn dispatch_feeds(&self) -> (Vec<FeedOutcome>, bool) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let mut interrupted = false;

        for (index, source) in self.registry.sources().iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            if self.ctx.is_shutdown() {
                info!("Shutdown requested, not dispatching remaining feeds");
                interrupted = true;
                break;
            }

            let pipeline = Arc::clone(&self.pipeline);
            let source = source.clone();
            tasks.spawn(async move {
                let _permit = permit;
                (index, pipeline.ingest_feed(&source).await)
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Feed task failed: {}", e),
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);
        debug!("{} feed(s) processed", outcomes.len());

        (outcomes.into_iter().map(|(_, o)| o).collect(), interrupted)
    }
}
