//! Semantic duplicate audit.
//!
//! Offline sweep over the recent published catalog. Not part of the per-run
//! admission path: it reuses the similarity kernel to find near-duplicate
//! groups, keeps the earliest artifact of each, and optionally unpublishes
//! the rest.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;

use presswheel_common::{PressWheelError, Tunables};
use presswheel_store::ArtifactStore;

use crate::dedup::{group_duplicates, DuplicateGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// Same story told twice.
    NearDuplicate,
    /// Looser: overlapping keywords/topic.
    TopicOverlap,
}

impl AuditMode {
    pub fn threshold(&self, tunables: &Tunables) -> f64 {
        match self {
            Self::NearDuplicate => tunables.semantic_duplicate_threshold,
            Self::TopicOverlap => tunables.topic_overlap_threshold,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub mode: AuditMode,
    pub threshold: f64,
    pub scanned: usize,
    pub groups: Vec<DuplicateGroup>,
    /// Rows actually flipped to unpublished. Zero unless applied.
    pub unpublished: u64,
    pub applied: bool,
}

impl AuditReport {
    pub fn flagged(&self) -> usize {
        self.groups.iter().map(|g| g.unpublish_ids.len()).sum()
    }
}

pub async fn run_audit(
    store: &dyn ArtifactStore,
    tunables: &Tunables,
    mode: AuditMode,
    apply: bool,
) -> Result<AuditReport, PressWheelError> {
    let since = Utc::now() - Duration::days(tunables.semantic_audit_window_days);
    let artifacts = store
        .recent_artifacts(since, tunables.semantic_audit_limit, true)
        .await
        .map_err(|e| PressWheelError::persistence("loading artifacts for audit", e))?;

    let threshold = mode.threshold(tunables);
    let groups = group_duplicates(&artifacts, threshold);

    let mut report = AuditReport {
        mode,
        threshold,
        scanned: artifacts.len(),
        groups,
        unpublished: 0,
        applied: apply,
    };

    info!(
        ?mode,
        threshold,
        scanned = report.scanned,
        groups = report.groups.len(),
        flagged = report.flagged(),
        "Semantic audit complete"
    );

    if apply && report.flagged() > 0 {
        let ids: Vec<String> = report
            .groups
            .iter()
            .flat_map(|g| g.unpublish_ids.iter().cloned())
            .collect();
        report.unpublished = store
            .unpublish(&ids)
            .await
            .map_err(|e| PressWheelError::persistence("unpublishing duplicates", e))?;
        info!(unpublished = report.unpublished, "Duplicates unpublished");
    }

    Ok(report)
}
