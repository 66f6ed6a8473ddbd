use anyhow::Result;
use chrono::{Duration, NaiveDate};
use tracing::debug;

use presswheel_store::TopicLockStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockStatus {
    Free,
    /// An active lock exists; the artifact it was created for.
    Locked { artifact_id: String },
}

impl LockStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

/// Oldest lock date still inside the rolling window.
pub fn lock_cutoff(today: NaiveDate, window_days: i64) -> NaiveDate {
    today - Duration::days(window_days)
}

/// Look for an active lock on `topic_hash`.
///
/// The hash must be computed with `ClusterData::topic_hash`, the same
/// fixed-precision form used when the lock was created.
pub async fn check_topic_lock(
    store: &dyn TopicLockStore,
    topic_hash: &str,
    window_days: i64,
    today: NaiveDate,
) -> Result<LockStatus> {
    let cutoff = lock_cutoff(today, window_days);
    let status = match store.find_active_lock(topic_hash, cutoff).await? {
        Some(lock) => LockStatus::Locked {
            artifact_id: lock.artifact_id,
        },
        None => LockStatus::Free,
    };
    debug!(topic_hash, %cutoff, locked = status.is_locked(), "Topic lock checked");
    Ok(status)
}
