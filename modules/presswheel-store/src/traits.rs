// Storage seams for the admission pipeline.
//
// WheelStore: the single round-robin cursor row, written with compare-and-swap.
// TopicLockStore: append-only exact-topic guards, read within a rolling window.
// ArtifactStore: the catalog view the duplicate checks read and admissions write.
//
// Implemented by PgStore (postgres) and MemoryStore (tests).

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use presswheel_common::{NewArtifact, RecentArtifact, TopicLock, VersionedWheel, WheelState};

// ---------------------------------------------------------------------------
// WheelStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait WheelStore: Send + Sync {
    /// Read the persisted cursor. `None` on first boot.
    async fn load_wheel(&self) -> Result<Option<VersionedWheel>>;

    /// Conditionally write the cursor.
    ///
    /// `expected_version` is the version returned by `load_wheel` (or `None`
    /// if no row existed). Returns `false` without writing when the stored
    /// row no longer matches, i.e. another run committed in between.
    async fn save_wheel(&self, state: &WheelState, expected_version: Option<i64>) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// TopicLockStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TopicLockStore: Send + Sync {
    /// Most recent lock for `topic_hash` with `date >= cutoff`.
    async fn find_active_lock(&self, topic_hash: &str, cutoff: NaiveDate)
        -> Result<Option<TopicLock>>;

    /// Append a lock unless one for the same hash is already active
    /// (`date >= cutoff`). Returns whether the lock was written.
    async fn create_lock(&self, lock: &TopicLock, cutoff: NaiveDate) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Artifacts created at or after `since`, newest first, at most `limit` rows.
    async fn recent_artifacts(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        published_only: bool,
    ) -> Result<Vec<RecentArtifact>>;

    async fn insert_artifact(&self, artifact: &NewArtifact) -> Result<()>;

    /// Flip `published` off for the given ids. Returns rows changed.
    async fn unpublish(&self, ids: &[String]) -> Result<u64>;
}

// ---------------------------------------------------------------------------
// Arc<S> blankets: lets tests share one store across seams for assertions
// ---------------------------------------------------------------------------

#[async_trait]
impl<S: WheelStore + ?Sized> WheelStore for Arc<S> {
    async fn load_wheel(&self) -> Result<Option<VersionedWheel>> {
        (**self).load_wheel().await
    }

    async fn save_wheel(&self, state: &WheelState, expected_version: Option<i64>) -> Result<bool> {
        (**self).save_wheel(state, expected_version).await
    }
}

#[async_trait]
impl<S: TopicLockStore + ?Sized> TopicLockStore for Arc<S> {
    async fn find_active_lock(
        &self,
        topic_hash: &str,
        cutoff: NaiveDate,
    ) -> Result<Option<TopicLock>> {
        (**self).find_active_lock(topic_hash, cutoff).await
    }

    async fn create_lock(&self, lock: &TopicLock, cutoff: NaiveDate) -> Result<bool> {
        (**self).create_lock(lock, cutoff).await
    }
}

#[async_trait]
impl<S: ArtifactStore + ?Sized> ArtifactStore for Arc<S> {
    async fn recent_artifacts(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        published_only: bool,
    ) -> Result<Vec<RecentArtifact>> {
        (**self).recent_artifacts(since, limit, published_only).await
    }

    async fn insert_artifact(&self, artifact: &NewArtifact) -> Result<()> {
        (**self).insert_artifact(artifact).await
    }

    async fn unpublish(&self, ids: &[String]) -> Result<u64> {
        (**self).unpublish(ids).await
    }
}
