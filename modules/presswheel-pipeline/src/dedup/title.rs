use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use presswheel_common::{title_similarity, RecentArtifact};
use presswheel_store::ArtifactStore;

#[derive(Debug, Clone, PartialEq)]
pub struct TitleMatch {
    pub artifact_id: String,
    pub similarity: f64,
}

/// Case and whitespace differences are not title differences.
fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First artifact in `recent` whose title scores at or above `threshold`.
///
/// `recent` is expected newest first, so the most recent qualifying
/// duplicate wins. First match, not best match.
pub fn find_similar_title(
    candidate: &str,
    recent: &[RecentArtifact],
    threshold: f64,
) -> Option<TitleMatch> {
    let candidate = normalize_title(candidate);
    recent.iter().find_map(|a| {
        let similarity = title_similarity(&candidate, &normalize_title(&a.title));
        (similarity >= threshold).then(|| TitleMatch {
            artifact_id: a.id.clone(),
            similarity,
        })
    })
}

/// Recent-artifact window for one run, newest first and capped.
///
/// Loaded once at run start; admissions made during the run are pushed to
/// the front so later picks are checked against them too.
pub struct RecentHistory {
    artifacts: Vec<RecentArtifact>,
    limit: usize,
}

impl RecentHistory {
    pub fn new(mut artifacts: Vec<RecentArtifact>, limit: usize) -> Self {
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        artifacts.truncate(limit);
        Self { artifacts, limit }
    }

    pub async fn load(
        store: &dyn ArtifactStore,
        now: DateTime<Utc>,
        window_days: i64,
        limit: usize,
    ) -> Result<Self> {
        let since = now - Duration::days(window_days);
        let artifacts = store.recent_artifacts(since, limit, false).await?;
        debug!(loaded = artifacts.len(), %since, "Recent artifact window loaded");
        Ok(Self::new(artifacts, limit))
    }

    pub fn find_similar_title(&self, candidate: &str, threshold: f64) -> Option<TitleMatch> {
        find_similar_title(candidate, &self.artifacts, threshold)
    }

    pub fn record(&mut self, artifact: RecentArtifact) {
        self.artifacts.insert(0, artifact);
        self.artifacts.truncate(self.limit);
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
