use std::fmt;

use crate::gate::GateReason;

/// Why a pick was passed over without admitting anything. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Active topic lock, from the store or admitted earlier this run.
    TopicLocked { artifact_id: String },
    /// Candidate title too close to a recent artifact.
    SimilarTitle { artifact_id: String, similarity: f64 },
    /// Generation collaborator failed for this cluster.
    GenerationFailed,
    /// Gate said review or reject.
    Gate(GateReason),
    /// Another writer locked the topic between the check and the admission.
    LockRace,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopicLocked { artifact_id } => write!(f, "topic locked by {artifact_id}"),
            Self::SimilarTitle {
                artifact_id,
                similarity,
            } => write!(f, "title similar to {artifact_id} ({similarity:.3})"),
            Self::GenerationFailed => write!(f, "generation failed"),
            Self::Gate(reason) => write!(f, "gate: {reason}"),
            Self::LockRace => write!(f, "topic locked concurrently"),
        }
    }
}

/// What happened to one wheel pick, in processing order.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    Admitted { artifact_id: String },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickRecord {
    pub brand: String,
    pub cluster_index: usize,
    pub round: u32,
    pub outcome: PickOutcome,
}

/// Stats from one orchestrator run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub scheduled: u64,
    pub attempted: u64,
    pub admitted: u64,
    pub skipped_topic_lock: u64,
    pub skipped_similar_title: u64,
    pub skipped_lock_race: u64,
    pub generation_failures: u64,
    pub held_for_review: u64,
    pub rejected: u64,
    pub supply_exhausted: bool,
    pub stopped_by_budget: bool,
    pub cursor_committed: bool,
    pub picks: Vec<PickRecord>,
}

impl RunStats {
    pub fn admitted_ids(&self) -> Vec<&str> {
        self.picks
            .iter()
            .filter_map(|p| match &p.outcome {
                PickOutcome::Admitted { artifact_id } => Some(artifact_id.as_str()),
                PickOutcome::Skipped(_) => None,
            })
            .collect()
    }

    pub(crate) fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::TopicLocked { .. } => self.skipped_topic_lock += 1,
            SkipReason::SimilarTitle { .. } => self.skipped_similar_title += 1,
            SkipReason::GenerationFailed => self.generation_failures += 1,
            SkipReason::Gate(GateReason::NeedsManualReview) => self.held_for_review += 1,
            SkipReason::Gate(_) => self.rejected += 1,
            SkipReason::LockRace => self.skipped_lock_race += 1,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scheduled={} attempted={} admitted={} skipped(topic_lock={} similar_title={} lock_race={}) generation_failures={} held_for_review={} rejected={} supply_exhausted={} stopped_by_budget={} cursor_committed={}",
            self.scheduled,
            self.attempted,
            self.admitted,
            self.skipped_topic_lock,
            self.skipped_similar_title,
            self.skipped_lock_race,
            self.generation_failures,
            self.held_for_review,
            self.rejected,
            self.supply_exhausted,
            self.stopped_by_budget,
            self.cursor_committed,
        )
    }
}
