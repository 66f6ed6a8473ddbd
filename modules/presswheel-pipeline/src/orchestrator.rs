use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use presswheel_common::{
    BrandGroup, ClusterData, NewArtifact, PressWheelError, TopicLock, Tunables,
};
use presswheel_store::{ArtifactStore, TopicLockStore, WheelStore};

use crate::budget::RunBudget;
use crate::dedup::{check_topic_lock, lock_cutoff, LockStatus, RecentHistory};
use crate::gate;
use crate::traits::{ArticleGenerator, ClusterSupply};
use crate::types::{PickOutcome, PickRecord, RunStats, SkipReason};
use crate::wheel::{FairnessWheel, WheelPick, WheelPlan};

/// Everything a run talks to.
pub struct PipelineDeps {
    pub wheel: Arc<dyn WheelStore>,
    pub locks: Arc<dyn TopicLockStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub supply: Arc<dyn ClusterSupply>,
    pub generator: Arc<dyn ArticleGenerator>,
}

impl PipelineDeps {
    /// All three storage seams served by one store.
    pub fn from_store<S>(
        store: Arc<S>,
        supply: Arc<dyn ClusterSupply>,
        generator: Arc<dyn ArticleGenerator>,
    ) -> Self
    where
        S: WheelStore + TopicLockStore + ArtifactStore + 'static,
    {
        Self {
            wheel: store.clone(),
            locks: store.clone(),
            artifacts: store,
            supply,
            generator,
        }
    }
}

/// Per-run scratch state that is never persisted.
struct RunContext {
    today: NaiveDate,
    lock_cutoff: NaiveDate,
    history: RecentHistory,
    /// Topic hashes admitted this run, with the artifact they produced.
    admitted_hashes: HashMap<String, String>,
}

/// One invocation: resume wheel, admit what passes, commit cursor.
pub struct Orchestrator {
    deps: PipelineDeps,
    tunables: Tunables,
}

impl Orchestrator {
    pub fn new(deps: PipelineDeps, tunables: Tunables) -> Self {
        Self { deps, tunables }
    }

    /// Run once under `budget`. The wheel cursor is committed before
    /// returning whenever a plan was made, including early stops and errors.
    pub async fn run(&self, budget: &RunBudget) -> Result<RunStats, PressWheelError> {
        let now = Utc::now();

        let groups = self
            .deps
            .supply
            .brand_groups()
            .await
            .map_err(PressWheelError::supply)?;

        let previous = self
            .deps
            .wheel
            .load_wheel()
            .await
            .map_err(|e| PressWheelError::persistence("loading wheel state", e))?;

        let plan = FairnessWheel::new(self.tunables.max_articles_per_brand).plan(
            &groups,
            previous.as_ref().map(|w| &w.state),
            self.tunables.target_count,
            now,
        );

        let mut stats = RunStats {
            scheduled: plan.picks.len() as u64,
            supply_exhausted: plan.exhausted,
            ..Default::default()
        };

        let result = self.process(&groups, &plan, budget, now, &mut stats).await;

        // Always commit, even when processing failed part-way.
        match self.commit(&plan, previous.map(|w| w.version)).await {
            Ok(committed) => stats.cursor_committed = committed,
            Err(e) if result.is_err() => {
                warn!(error = %e, "Failed to commit wheel cursor after run failure");
            }
            Err(e) => return Err(e),
        }
        result?;

        info!("Run complete. {stats}");
        Ok(stats)
    }

    async fn process(
        &self,
        groups: &[BrandGroup],
        plan: &WheelPlan,
        budget: &RunBudget,
        now: DateTime<Utc>,
        stats: &mut RunStats,
    ) -> Result<(), PressWheelError> {
        let t = &self.tunables;
        let today = now.date_naive();
        let history = RecentHistory::load(
            self.deps.artifacts.as_ref(),
            now,
            t.title_similarity_window_days,
            t.title_similarity_scan_limit,
        )
        .await
        .map_err(|e| PressWheelError::persistence("loading recent artifacts", e))?;

        let mut ctx = RunContext {
            today,
            lock_cutoff: lock_cutoff(today, t.topic_lock_window_days),
            history,
            admitted_hashes: HashMap::new(),
        };

        for pick in &plan.picks {
            if !budget.has_room() {
                stats.stopped_by_budget = true;
                info!(
                    remaining_secs = budget.remaining().as_secs(),
                    processed = stats.picks.len(),
                    "Budget nearly exhausted, stopping early"
                );
                break;
            }

            let cluster = &groups[pick.brand_index].clusters[pick.cluster_index];
            let outcome = self.process_pick(pick, cluster, &mut ctx, stats).await?;

            match &outcome {
                PickOutcome::Admitted { artifact_id } => {
                    stats.admitted += 1;
                    info!(
                        brand = pick.brand.as_str(),
                        round = pick.round,
                        artifact_id = artifact_id.as_str(),
                        "Artifact admitted"
                    );
                }
                PickOutcome::Skipped(reason) => {
                    stats.record_skip(reason);
                    info!(
                        brand = pick.brand.as_str(),
                        round = pick.round,
                        headline = cluster.headline(),
                        reason = %reason,
                        "Pick skipped"
                    );
                }
            }

            stats.picks.push(PickRecord {
                brand: pick.brand.clone(),
                cluster_index: pick.cluster_index,
                round: pick.round,
                outcome,
            });
        }

        Ok(())
    }

    async fn process_pick(
        &self,
        pick: &WheelPick,
        cluster: &ClusterData,
        ctx: &mut RunContext,
        stats: &mut RunStats,
    ) -> Result<PickOutcome, PressWheelError> {
        let t = &self.tunables;
        let topic_hash = cluster.topic_hash();

        // --- Duplicate checks, both required to pass ---

        if let Some(artifact_id) = ctx.admitted_hashes.get(&topic_hash) {
            return Ok(PickOutcome::Skipped(SkipReason::TopicLocked {
                artifact_id: artifact_id.clone(),
            }));
        }

        let status = check_topic_lock(
            self.deps.locks.as_ref(),
            &topic_hash,
            t.topic_lock_window_days,
            ctx.today,
        )
        .await
        .map_err(|e| PressWheelError::persistence("checking topic lock", e))?;
        if let LockStatus::Locked { artifact_id } = status {
            return Ok(PickOutcome::Skipped(SkipReason::TopicLocked { artifact_id }));
        }

        let headline = cluster.headline();
        if !headline.trim().is_empty() {
            if let Some(m) = ctx
                .history
                .find_similar_title(headline, t.title_similarity_threshold)
            {
                return Ok(PickOutcome::Skipped(SkipReason::SimilarTitle {
                    artifact_id: m.artifact_id,
                    similarity: m.similarity,
                }));
            }
        }

        // --- Generation ---

        stats.attempted += 1;
        let generated = match self.deps.generator.generate(&pick.brand, cluster).await {
            Ok(g) if g.confidence_in_range() => g,
            Ok(g) => {
                warn!(
                    brand = pick.brand.as_str(),
                    confidence = g.confidence,
                    "Generator returned confidence out of range"
                );
                return Ok(PickOutcome::Skipped(SkipReason::GenerationFailed));
            }
            Err(e) => {
                warn!(brand = pick.brand.as_str(), error = %e, "Generation failed");
                return Ok(PickOutcome::Skipped(SkipReason::GenerationFailed));
            }
        };

        // --- Admission gate ---

        let outcome = gate::evaluate(&generated.quality, generated.confidence);
        info!(
            brand = pick.brand.as_str(),
            confidence = generated.confidence,
            verdict = ?outcome.verdict,
            reason = %outcome.reason,
            "Gate decision"
        );
        if !outcome.is_accept() {
            return Ok(PickOutcome::Skipped(SkipReason::Gate(outcome.reason)));
        }

        // --- Admit: lock first, then catalog ---

        let created_at = Utc::now();
        let artifact_id = Uuid::new_v4().to_string();
        let lock = TopicLock::new(topic_hash.clone(), artifact_id.clone(), created_at);

        let locked = self
            .deps
            .locks
            .create_lock(&lock, ctx.lock_cutoff)
            .await
            .map_err(|e| PressWheelError::persistence("creating topic lock", e))?;
        if !locked {
            return Ok(PickOutcome::Skipped(SkipReason::LockRace));
        }

        let artifact = NewArtifact {
            id: artifact_id.clone(),
            brand: pick.brand.clone(),
            title: generated.title,
            body: generated.body,
            topic_hash: topic_hash.clone(),
            confidence: generated.confidence,
            embedding: generated.embedding,
            published: true,
            created_at,
        };
        self.deps
            .artifacts
            .insert_artifact(&artifact)
            .await
            .map_err(|e| PressWheelError::persistence("inserting artifact", e))?;

        ctx.history.record(artifact.as_recent());
        ctx.admitted_hashes.insert(topic_hash, artifact_id.clone());

        Ok(PickOutcome::Admitted { artifact_id })
    }

    /// Conditionally persist the cursor the plan computed.
    /// Returns false when there was nothing to write or another run got there first.
    async fn commit(
        &self,
        plan: &WheelPlan,
        expected_version: Option<i64>,
    ) -> Result<bool, PressWheelError> {
        let Some(state) = &plan.next_state else {
            return Ok(false);
        };

        let written = self
            .deps
            .wheel
            .save_wheel(state, expected_version)
            .await
            .map_err(|e| PressWheelError::persistence("saving wheel state", e))?;

        if written {
            info!(
                last_brand_index = state.last_brand_index,
                brands = state.brands_order.len(),
                "Wheel cursor committed"
            );
        } else {
            warn!(
                last_brand_index = state.last_brand_index,
                ?expected_version,
                "Wheel cursor changed by another run, not overwriting"
            );
        }
        Ok(written)
    }
}
