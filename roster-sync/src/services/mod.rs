//! Sync services: feed client, reconciler, scheduled job

pub mod feed_client;
pub mod reconciler;
pub mod sync_job;

pub use feed_client::FeedClient;
pub use reconciler::{decide, map_team, Decision, Reconciler, SyncSummary};
pub use sync_job::{
    retry_with_backoff, spawn_schedule, RetryPolicy, SyncJob, SyncOutcome, SyncRunRecord,
};
