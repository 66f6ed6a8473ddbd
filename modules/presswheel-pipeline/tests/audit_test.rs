use chrono::{Duration, Utc};

use presswheel_common::{RecentArtifact, Tunables};
use presswheel_pipeline::testing::recent_artifact;
use presswheel_pipeline::{run_audit, AuditMode};
use presswheel_store::MemoryStore;

fn embedded(id: &str, hours_ago: i64, embedding: Vec<f32>) -> RecentArtifact {
    RecentArtifact {
        embedding: Some(embedding),
        ..recent_artifact(id, &format!("Story {id}"), Utc::now() - Duration::hours(hours_ago))
    }
}

/// Two tight pairs, one loosely related story, plus rows the audit must ignore.
fn catalog() -> MemoryStore {
    let mut unpublished = embedded("hidden", 6, vec![1.0, 0.0, 0.0]);
    unpublished.published = false;

    MemoryStore::new()
        .with_artifact(embedded("a1", 5, vec![1.0, 0.0, 0.0]))
        .with_artifact(embedded("a2", 4, vec![0.99, 0.05, 0.0]))
        .with_artifact(embedded("b1", 3, vec![0.0, 1.0, 0.0]))
        .with_artifact(embedded("b2", 2, vec![0.0, 0.98, 0.1]))
        .with_artifact(embedded("e", 1, vec![0.75, 0.66, 0.0]))
        .with_artifact(unpublished)
        .with_artifact(embedded("old", 24 * 10, vec![1.0, 0.0, 0.0]))
        .with_artifact(recent_artifact("no-embedding", "Story", Utc::now()))
}

#[tokio::test]
async fn near_duplicate_dry_run_reports_without_unpublishing() {
    let store = catalog();
    let report = run_audit(&store, &Tunables::default(), AuditMode::NearDuplicate, false)
        .await
        .unwrap();

    assert_eq!(report.scanned, 6);
    assert_eq!(report.threshold, 0.90);
    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups[0].keep_id, "a1");
    assert_eq!(report.groups[0].unpublish_ids, vec!["a2"]);
    assert_eq!(report.groups[1].keep_id, "b1");
    assert_eq!(report.groups[1].unpublish_ids, vec!["b2"]);
    assert!(report.groups.iter().all(|g| g.max_similarity >= 0.90));
    assert_eq!(report.flagged(), 2);
    assert_eq!(report.unpublished, 0);

    assert!(store.artifacts().iter().filter(|a| a.id != "hidden").all(|a| a.published));
}

#[tokio::test]
async fn apply_unpublishes_everything_but_the_keeper() {
    let store = catalog();
    let report = run_audit(&store, &Tunables::default(), AuditMode::NearDuplicate, true)
        .await
        .unwrap();
    assert!(report.applied);
    assert_eq!(report.unpublished, 2);

    let published: Vec<String> = store
        .artifacts()
        .into_iter()
        .filter(|a| a.published)
        .map(|a| a.id)
        .collect();
    assert!(published.contains(&"a1".to_string()));
    assert!(published.contains(&"b1".to_string()));
    assert!(!published.contains(&"a2".to_string()));
    assert!(!published.contains(&"b2".to_string()));

    // A second sweep finds nothing left to flag.
    let again = run_audit(&store, &Tunables::default(), AuditMode::NearDuplicate, true)
        .await
        .unwrap();
    assert!(again.groups.is_empty());
    assert_eq!(again.unpublished, 0);
}

#[tokio::test]
async fn topic_overlap_uses_the_looser_threshold() {
    let store = catalog();
    let report = run_audit(&store, &Tunables::default(), AuditMode::TopicOverlap, false)
        .await
        .unwrap();

    assert_eq!(report.threshold, 0.70);
    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups[0].keep_id, "a1");
    assert_eq!(report.groups[0].unpublish_ids, vec!["a2", "e"]);
    assert_eq!(report.groups[1].unpublish_ids, vec!["b2"]);
}

#[tokio::test]
async fn audit_window_and_limit_bound_the_scan() {
    let store = catalog();
    let tunables = Tunables {
        semantic_audit_limit: 2,
        ..Tunables::default()
    };
    let report = run_audit(&store, &tunables, AuditMode::NearDuplicate, false)
        .await
        .unwrap();

    // Newest two published rows: "no-embedding" and "e".
    assert_eq!(report.scanned, 2);
    assert!(report.groups.is_empty());
}
