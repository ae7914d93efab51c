//! Scheduled ingestion of all registered feeds.

pub mod health;
pub mod pipeline;
pub mod report;
pub mod scheduler;

pub use health::{HealthMonitor, HealthSnapshot};
pub use pipeline::IngestPipeline;
pub use report::{CycleReport, FeedOutcome};
pub use scheduler::{Scheduler, SchedulerContext, ShutdownHandle};
