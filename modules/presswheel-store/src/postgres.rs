//! PgStore: Postgres-backed persistence for the wheel cursor, topic locks,
//! and the artifact catalog.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::debug;

use presswheel_common::{
    NewArtifact, RecentArtifact, TopicLock, VersionedWheel, WheelState, WHEEL_STATE_KEY,
};

use crate::traits::{ArtifactStore, TopicLockStore, WheelStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("connecting to Postgres")?;
        Ok(Self::new(pool))
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("running presswheel migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct WheelRow {
    last_brand_index: i32,
    brands_order: Vec<String>,
    last_run_at: DateTime<Utc>,
    version: i64,
}

#[derive(sqlx::FromRow)]
struct LockRow {
    date: NaiveDate,
    topic_hash: String,
    artifact_id: String,
    created_at: DateTime<Utc>,
}

impl From<LockRow> for TopicLock {
    fn from(r: LockRow) -> Self {
        Self {
            date: r.date,
            topic_hash: r.topic_hash,
            artifact_id: r.artifact_id,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ArtifactRow {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    published: bool,
    view_count: i64,
    embedding: Option<Vec<f32>>,
    brand: String,
}

impl From<ArtifactRow> for RecentArtifact {
    fn from(r: ArtifactRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            created_at: r.created_at,
            published: r.published,
            view_count: r.view_count,
            embedding: r.embedding,
            brand: r.brand,
        }
    }
}

#[async_trait]
impl WheelStore for PgStore {
    async fn load_wheel(&self) -> Result<Option<VersionedWheel>> {
        let row = sqlx::query_as::<_, WheelRow>(
            r#"
            SELECT last_brand_index, brands_order, last_run_at, version
            FROM wheel_state
            WHERE id = $1
            "#,
        )
        .bind(WHEEL_STATE_KEY)
        .fetch_optional(&self.pool)
        .await
        .context("reading wheel_state")?;

        // A negative index is unusable; treat the row as absent.
        Ok(row.and_then(|r| {
            let idx = usize::try_from(r.last_brand_index).ok()?;
            Some(VersionedWheel {
                state: WheelState {
                    last_brand_index: idx,
                    last_run_at: r.last_run_at,
                    brands_order: r.brands_order,
                },
                version: r.version,
            })
        }))
    }

    async fn save_wheel(&self, state: &WheelState, expected_version: Option<i64>) -> Result<bool> {
        let index = i32::try_from(state.last_brand_index).context("brand index out of range")?;

        let result = match expected_version {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO wheel_state (id, last_brand_index, brands_order, last_run_at, version)
                    VALUES ($1, $2, $3, $4, 1)
                    ON CONFLICT (id) DO NOTHING
                    "#,
                )
                .bind(WHEEL_STATE_KEY)
                .bind(index)
                .bind(&state.brands_order)
                .bind(state.last_run_at)
                .execute(&self.pool)
                .await
            }
            Some(version) => {
                sqlx::query(
                    r#"
                    UPDATE wheel_state
                    SET last_brand_index = $2,
                        brands_order = $3,
                        last_run_at = $4,
                        version = version + 1
                    WHERE id = $1 AND version = $5
                    "#,
                )
                .bind(WHEEL_STATE_KEY)
                .bind(index)
                .bind(&state.brands_order)
                .bind(state.last_run_at)
                .bind(version)
                .execute(&self.pool)
                .await
            }
        }
        .context("writing wheel_state")?;

        let written = result.rows_affected() == 1;
        debug!(written, ?expected_version, "wheel_state conditional write");
        Ok(written)
    }
}

#[async_trait]
impl TopicLockStore for PgStore {
    async fn find_active_lock(
        &self,
        topic_hash: &str,
        cutoff: NaiveDate,
    ) -> Result<Option<TopicLock>> {
        let row = sqlx::query_as::<_, LockRow>(
            r#"
            SELECT date, topic_hash, artifact_id, created_at
            FROM topic_locks
            WHERE topic_hash = $1 AND date >= $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(topic_hash)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await
        .context("reading topic_locks")?;

        Ok(row.map(TopicLock::from))
    }

    async fn create_lock(&self, lock: &TopicLock, cutoff: NaiveDate) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("opening topic lock transaction")?;

        // Serialize writers per hash. The primary key only covers same-date
        // collisions; this covers locks on adjacent dates within the window.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&lock.topic_hash)
            .execute(&mut *tx)
            .await
            .context("acquiring topic advisory lock")?;

        let result = sqlx::query(
            r#"
            INSERT INTO topic_locks (date, topic_hash, artifact_id, created_at)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM topic_locks WHERE topic_hash = $2 AND date >= $5
            )
            ON CONFLICT (date, topic_hash) DO NOTHING
            "#,
        )
        .bind(lock.date)
        .bind(&lock.topic_hash)
        .bind(&lock.artifact_id)
        .bind(lock.created_at)
        .bind(cutoff)
        .execute(&mut *tx)
        .await
        .context("writing topic_locks")?;

        tx.commit().await.context("committing topic lock")?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl ArtifactStore for PgStore {
    async fn recent_artifacts(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        published_only: bool,
    ) -> Result<Vec<RecentArtifact>> {
        let rows = sqlx::query_as::<_, ArtifactRow>(
            r#"
            SELECT id, title, created_at, published, view_count, embedding, brand
            FROM artifacts
            WHERE created_at >= $1 AND ($3 = FALSE OR published)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit as i64)
        .bind(published_only)
        .fetch_all(&self.pool)
        .await
        .context("reading recent artifacts")?;

        Ok(rows.into_iter().map(RecentArtifact::from).collect())
    }

    async fn insert_artifact(&self, artifact: &NewArtifact) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO artifacts
                (id, brand, title, body, topic_hash, confidence, embedding, published, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&artifact.id)
        .bind(&artifact.brand)
        .bind(&artifact.title)
        .bind(&artifact.body)
        .bind(&artifact.topic_hash)
        .bind(i16::from(artifact.confidence))
        .bind(&artifact.embedding)
        .bind(artifact.published)
        .bind(artifact.created_at)
        .execute(&self.pool)
        .await
        .context("inserting artifact")?;
        Ok(())
    }

    async fn unpublish(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            UPDATE artifacts SET published = FALSE
            WHERE id = ANY($1) AND published
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .context("unpublishing artifacts")?;
        Ok(result.rows_affected())
    }
}
