pub mod metrics;
pub mod planhat;
pub mod sync_job;
pub mod usage_report;

pub use planhat::PlanhatClient;
pub use sync_job::{JobOutcome, SyncJob};
pub use usage_report::UsageReportSource;
