//! Scheduled sync job
//!
//! Wraps fetch + reconcile in a retry loop with exponential backoff and
//! records the outcome of every run. A failed run is logged and recorded;
//! it never takes the process down.
//!
//! **Backoff Strategy:**
//! - Initial delay: `initial_backoff` (default 2s)
//! - Multiplier: 2.0, capped at `max_backoff` (default 60s)
//! - Attempts: `max_attempts` (default 5)

use crate::db::TeamStore;
use crate::error::SyncError;
use crate::services::feed_client::FeedClient;
use crate::services::reconciler::{Reconciler, SyncSummary};
use chrono::{DateTime, Utc};
use roster_common::config::ScheduleSection;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Retry policy for failed runs
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (minimum 1)
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_schedule(&ScheduleSection::default())
    }
}

impl RetryPolicy {
    pub fn from_schedule(schedule: &ScheduleSection) -> Self {
        Self {
            max_attempts: schedule.max_attempts.max(1),
            initial_backoff: Duration::from_millis(schedule.initial_backoff_ms),
            max_backoff: Duration::from_millis(schedule.max_backoff_ms),
        }
    }

    /// Delay after failed attempt number `attempt` (1-based)
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Retry `operation` under `policy`
///
/// Returns the final result and the number of attempts made.
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> (Result<T, SyncError>, u32)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SyncError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return (Ok(value), attempt);
            }
            Err(err) if attempt >= max_attempts => {
                tracing::error!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Giving up: retry attempts exhausted"
                );
                return (Err(err), attempt);
            }
            Err(err) => {
                let backoff = policy.backoff_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Attempt failed, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Succeeded { summary: SyncSummary },
    Failed { error: String },
}

/// Record of one run, kept for status reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncRunRecord {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub attempts: u32,
    pub outcome: SyncOutcome,
}

impl SyncRunRecord {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Succeeded { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SyncOutcome::Failed { error } => Some(error),
            SyncOutcome::Succeeded { .. } => None,
        }
    }
}

/// Fetches the feed and reconciles it into the store, with retries
pub struct SyncJob {
    client: FeedClient,
    reconciler: Reconciler,
    store: Arc<dyn TeamStore>,
    policy: RetryPolicy,
    run_lock: Mutex<()>,
    last_run: RwLock<Option<SyncRunRecord>>,
}

impl SyncJob {
    pub fn new(
        client: FeedClient,
        reconciler: Reconciler,
        store: Arc<dyn TeamStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            reconciler,
            store,
            policy,
            run_lock: Mutex::new(()),
            last_run: RwLock::new(None),
        }
    }

    /// One attempt: fetch, then reconcile. No retries.
    pub async fn sync_once(&self) -> Result<SyncSummary, SyncError> {
        let document = self.client.fetch().await?;
        self.reconciler.reconcile(self.store.as_ref(), &document).await
    }

    /// Run with retries, waiting for any in-flight run to finish first
    pub async fn run(&self) -> SyncRunRecord {
        let _guard = self.run_lock.lock().await;
        self.run_locked().await
    }

    /// Run with retries unless a run is already in progress
    pub async fn try_run(&self) -> Option<SyncRunRecord> {
        let _guard = self.run_lock.try_lock().ok()?;
        Some(self.run_locked().await)
    }

    /// Most recent run, if any
    pub async fn last_run(&self) -> Option<SyncRunRecord> {
        self.last_run.read().await.clone()
    }

    async fn run_locked(&self) -> SyncRunRecord {
        let started_at = Utc::now();
        tracing::info!("Team sync starting");

        let (result, attempts) =
            retry_with_backoff("team sync", &self.policy, || self.sync_once()).await;

        let outcome = match result {
            Ok(summary) => {
                tracing::info!(
                    upserted = summary.upserted,
                    skipped = summary.skipped,
                    total = summary.total,
                    attempts,
                    "Team sync done"
                );
                SyncOutcome::Succeeded { summary }
            }
            Err(err) => {
                tracing::error!(attempts, error = %err, "Team sync failed");
                SyncOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        let record = SyncRunRecord {
            started_at,
            finished_at: Utc::now(),
            attempts,
            outcome,
        };

        *self.last_run.write().await = Some(record.clone());
        record
    }
}

/// Run `job` now and then every `interval` until the task is aborted
pub fn spawn_schedule(job: Arc<SyncJob>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            job.run().await;
        }
    })
}
