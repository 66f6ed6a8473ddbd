//! Integration tests for PgStore.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::{Duration, Utc};
use presswheel_common::{NewArtifact, TopicLock, WheelState};
use presswheel_store::{ArtifactStore, PgStore, TopicLockStore, WheelStore};
use sqlx::PgPool;

/// Get a migrated store on a clean database, or skip if no test DB is available.
async fn test_store() -> Option<PgStore> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let store = PgStore::new(pool);
    store.migrate().await.ok()?;

    // Clean slate for each test
    sqlx::query("TRUNCATE wheel_state, topic_locks, artifacts")
        .execute(store.pool())
        .await
        .ok()?;

    Some(store)
}

fn wheel(idx: usize, brands: &[&str]) -> WheelState {
    WheelState {
        last_brand_index: idx,
        last_run_at: Utc::now(),
        brands_order: brands.iter().map(|b| b.to_string()).collect(),
    }
}

fn artifact(id: &str, published: bool, age: Duration) -> NewArtifact {
    NewArtifact {
        id: id.to_string(),
        brand: "A".into(),
        title: format!("Title {id}"),
        body: "body".into(),
        topic_hash: format!("hash-{id}"),
        confidence: 92,
        embedding: Some(vec![0.1, 0.2, 0.3]),
        published,
        created_at: Utc::now() - age,
    }
}

#[tokio::test]
async fn wheel_state_round_trip_with_cas() {
    let Some(store) = test_store().await else {
        return;
    };

    assert!(store.load_wheel().await.unwrap().is_none());
    assert!(store.save_wheel(&wheel(2, &["A", "B", "C"]), None).await.unwrap());
    assert!(!store.save_wheel(&wheel(0, &["A", "B", "C"]), None).await.unwrap());

    let loaded = store.load_wheel().await.unwrap().unwrap();
    assert_eq!(loaded.state.last_brand_index, 2);
    assert_eq!(loaded.state.brands_order, vec!["A", "B", "C"]);

    assert!(store
        .save_wheel(&wheel(0, &["A", "B", "C"]), Some(loaded.version))
        .await
        .unwrap());
    // Stale version: another run already advanced the cursor.
    assert!(!store
        .save_wheel(&wheel(1, &["A", "B", "C"]), Some(loaded.version))
        .await
        .unwrap());
    assert_eq!(store.load_wheel().await.unwrap().unwrap().state.last_brand_index, 0);
}

#[tokio::test]
async fn topic_lock_is_exclusive_within_window() {
    let Some(store) = test_store().await else {
        return;
    };
    let now = Utc::now();
    let cutoff = (now - Duration::days(2)).date_naive();

    assert!(store.find_active_lock("h1", cutoff).await.unwrap().is_none());
    assert!(store
        .create_lock(&TopicLock::new("h1", "art-1", now), cutoff)
        .await
        .unwrap());
    assert!(!store
        .create_lock(&TopicLock::new("h1", "art-2", now), cutoff)
        .await
        .unwrap());

    let lock = store.find_active_lock("h1", cutoff).await.unwrap().unwrap();
    assert_eq!(lock.artifact_id, "art-1");
}

#[tokio::test]
async fn expired_lock_does_not_block() {
    let Some(store) = test_store().await else {
        return;
    };
    let now = Utc::now();
    let cutoff = (now - Duration::days(2)).date_naive();

    assert!(store
        .create_lock(&TopicLock::new("h2", "old", now - Duration::days(5)), cutoff)
        .await
        .unwrap());
    assert!(store.find_active_lock("h2", cutoff).await.unwrap().is_none());
    assert!(store
        .create_lock(&TopicLock::new("h2", "new", now), cutoff)
        .await
        .unwrap());
}

#[tokio::test]
async fn recent_artifacts_window_order_and_unpublish() {
    let Some(store) = test_store().await else {
        return;
    };

    store.insert_artifact(&artifact("old", true, Duration::days(4))).await.unwrap();
    store.insert_artifact(&artifact("a", true, Duration::hours(3))).await.unwrap();
    store.insert_artifact(&artifact("b", false, Duration::hours(2))).await.unwrap();
    store.insert_artifact(&artifact("c", true, Duration::hours(1))).await.unwrap();

    let since = Utc::now() - Duration::days(2);
    let all = store.recent_artifacts(since, 100, false).await.unwrap();
    let ids: Vec<_> = all.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
    assert_eq!(all[0].embedding.as_deref(), Some(&[0.1f32, 0.2, 0.3][..]));

    let published = store.recent_artifacts(since, 100, true).await.unwrap();
    assert_eq!(published.len(), 2);

    let changed = store.unpublish(&["a".to_string(), "b".to_string()]).await.unwrap();
    assert_eq!(changed, 1);
    let published = store.recent_artifacts(since, 100, true).await.unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, "c");
}

#[tokio::test]
async fn concurrent_locks_on_adjacent_dates_admit_one() {
    let Some(store) = test_store().await else {
        return;
    };
    let now = Utc::now();
    let yesterday = now - Duration::days(1);
    let cutoff = (now - Duration::days(2)).date_naive();

    for round in 0..10 {
        let hash = format!("straddle-{round}");
        let late = TopicLock::new(hash.as_str(), "run-late", now);
        let early = TopicLock::new(hash.as_str(), "run-early", yesterday);

        let (a, b) = tokio::join!(
            store.create_lock(&late, cutoff),
            store.create_lock(&early, cutoff)
        );
        let written = [a.unwrap(), b.unwrap()];
        assert_eq!(
            written.iter().filter(|w| **w).count(),
            1,
            "exactly one writer may lock {hash}"
        );
    }
}
