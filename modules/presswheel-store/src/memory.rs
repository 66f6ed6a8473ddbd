//! MemoryStore: in-memory implementation of every storage seam.
//! Same conditional-write semantics as PgStore; no database required.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use presswheel_common::{NewArtifact, RecentArtifact, TopicLock, VersionedWheel, WheelState};

use crate::traits::{ArtifactStore, TopicLockStore, WheelStore};

#[derive(Default)]
pub struct MemoryStore {
    wheel: Mutex<Option<VersionedWheel>>,
    locks: Mutex<Vec<TopicLock>>,
    artifacts: Mutex<Vec<RecentArtifact>>,
    fail_wheel: AtomicBool,
    fail_locks: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a persisted cursor as if a previous run had committed it.
    pub fn with_wheel(self, state: WheelState) -> Self {
        *self.wheel.lock().unwrap() = Some(VersionedWheel { state, version: 1 });
        self
    }

    pub fn with_lock(self, lock: TopicLock) -> Self {
        self.locks.lock().unwrap().push(lock);
        self
    }

    pub fn with_artifact(self, artifact: RecentArtifact) -> Self {
        self.artifacts.lock().unwrap().push(artifact);
        self
    }

    /// Make every wheel_state read/write fail.
    pub fn fail_wheel(&self, fail: bool) {
        self.fail_wheel.store(fail, Ordering::SeqCst);
    }

    /// Make every topic_locks read/write fail.
    pub fn fail_locks(&self, fail: bool) {
        self.fail_locks.store(fail, Ordering::SeqCst);
    }

    // --- Test assertions ---

    pub fn wheel(&self) -> Option<VersionedWheel> {
        self.wheel.lock().unwrap().clone()
    }

    pub fn locks(&self) -> Vec<TopicLock> {
        self.locks.lock().unwrap().clone()
    }

    pub fn artifacts(&self) -> Vec<RecentArtifact> {
        self.artifacts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WheelStore for MemoryStore {
    async fn load_wheel(&self) -> Result<Option<VersionedWheel>> {
        if self.fail_wheel.load(Ordering::SeqCst) {
            bail!("MemoryStore: wheel_state unavailable");
        }
        Ok(self.wheel.lock().unwrap().clone())
    }

    async fn save_wheel(&self, state: &WheelState, expected_version: Option<i64>) -> Result<bool> {
        if self.fail_wheel.load(Ordering::SeqCst) {
            bail!("MemoryStore: wheel_state unavailable");
        }
        let mut wheel = self.wheel.lock().unwrap();
        let current = wheel.as_ref().map(|w| w.version);
        if current != expected_version {
            return Ok(false);
        }
        *wheel = Some(VersionedWheel {
            state: state.clone(),
            version: current.map_or(1, |v| v + 1),
        });
        Ok(true)
    }
}

#[async_trait]
impl TopicLockStore for MemoryStore {
    async fn find_active_lock(
        &self,
        topic_hash: &str,
        cutoff: NaiveDate,
    ) -> Result<Option<TopicLock>> {
        if self.fail_locks.load(Ordering::SeqCst) {
            bail!("MemoryStore: topic_locks unavailable");
        }
        Ok(self
            .locks
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.topic_hash == topic_hash && l.date >= cutoff)
            .max_by_key(|l| l.created_at)
            .cloned())
    }

    async fn create_lock(&self, lock: &TopicLock, cutoff: NaiveDate) -> Result<bool> {
        if self.fail_locks.load(Ordering::SeqCst) {
            bail!("MemoryStore: topic_locks unavailable");
        }
        let mut locks = self.locks.lock().unwrap();
        let blocked = locks.iter().any(|l| {
            l.topic_hash == lock.topic_hash && (l.date >= cutoff || l.date == lock.date)
        });
        if blocked {
            return Ok(false);
        }
        locks.push(lock.clone());
        Ok(true)
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn recent_artifacts(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        published_only: bool,
    ) -> Result<Vec<RecentArtifact>> {
        let mut rows: Vec<RecentArtifact> = self
            .artifacts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.created_at >= since && (!published_only || a.published))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert_artifact(&self, artifact: &NewArtifact) -> Result<()> {
        let mut artifacts = self.artifacts.lock().unwrap();
        if artifacts.iter().any(|a| a.id == artifact.id) {
            bail!("MemoryStore: duplicate artifact id {}", artifact.id);
        }
        artifacts.push(artifact.as_recent());
        Ok(())
    }

    async fn unpublish(&self, ids: &[String]) -> Result<u64> {
        let mut changed = 0;
        for a in self.artifacts.lock().unwrap().iter_mut() {
            if a.published && ids.contains(&a.id) {
                a.published = false;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
