use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use presswheel_common::{brands_order, BrandGroup, WheelState};

/// One cluster chosen by the wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelPick {
    pub brand: String,
    pub brand_index: usize,
    pub cluster_index: usize,
    /// 1-based pass number over the brand list, counted from the resume index.
    pub round: u32,
}

/// Outcome of one scheduling pass.
#[derive(Debug, Clone)]
pub struct WheelPlan {
    pub picks: Vec<WheelPick>,
    /// Brand index the pass started at.
    pub start_index: usize,
    /// Cursor to persist. `None` when there are no brands (nothing to point at).
    pub next_state: Option<WheelState>,
    /// Every brand was skipped for a full pass before the target was reached.
    pub exhausted: bool,
}

/// Resumable round-robin over brand groups.
///
/// Pure: the persisted cursor comes in, the cursor to persist goes out.
/// Per-brand usage is tracked only for the duration of one plan.
pub struct FairnessWheel {
    max_per_brand: usize,
}

impl FairnessWheel {
    pub fn new(max_per_brand: usize) -> Self {
        Self { max_per_brand }
    }

    /// Where this run starts. Resumes one past the last visited brand when the
    /// persisted brand order matches exactly; any disagreement discards the cursor.
    pub fn resume_index(previous: Option<&WheelState>, brands: &[String]) -> usize {
        let n = brands.len();
        match previous {
            Some(prev) if n > 0 && prev.brands_order == brands && prev.last_brand_index < n => {
                (prev.last_brand_index + 1) % n
            }
            Some(_) => {
                info!("Brand order changed since last run, restarting wheel at 0");
                0
            }
            None => 0,
        }
    }

    /// Collect up to `target` picks, visiting brands in order from the resume index.
    pub fn plan(
        &self,
        groups: &[BrandGroup],
        previous: Option<&WheelState>,
        target: usize,
        now: DateTime<Utc>,
    ) -> WheelPlan {
        let brands = brands_order(groups);
        let n = brands.len();
        if n == 0 {
            return WheelPlan {
                picks: Vec::new(),
                start_index: 0,
                next_state: None,
                exhausted: true,
            };
        }

        let start_index = Self::resume_index(previous, &brands);
        let mut used_count = vec![0usize; n];
        let mut used_clusters: Vec<HashSet<usize>> = vec![HashSet::new(); n];
        let mut picks = Vec::with_capacity(target);

        let mut current = start_index;
        let mut steps = 0usize;
        let mut consecutive_skips = 0usize;

        while picks.len() < target && consecutive_skips < n {
            let group = &groups[current];
            let next_cluster = if used_count[current] < self.max_per_brand {
                (0..group.clusters.len()).find(|i| !used_clusters[current].contains(i))
            } else {
                None
            };

            match next_cluster {
                Some(cluster_index) => {
                    used_clusters[current].insert(cluster_index);
                    used_count[current] += 1;
                    consecutive_skips = 0;
                    picks.push(WheelPick {
                        brand: group.brand.clone(),
                        brand_index: current,
                        cluster_index,
                        round: (steps / n) as u32 + 1,
                    });
                }
                None => {
                    debug!(brand = group.brand.as_str(), "No eligible cluster, skipping brand");
                    consecutive_skips += 1;
                }
            }

            current = (current + 1) % n;
            steps += 1;
        }

        let exhausted = picks.len() < target;
        let last_brand_index = (current + n - 1) % n;

        info!(
            start_index,
            last_brand_index,
            picks = picks.len(),
            target,
            exhausted,
            "Wheel plan computed"
        );

        WheelPlan {
            picks,
            start_index,
            next_state: Some(WheelState {
                last_brand_index,
                last_run_at: now,
                brands_order: brands,
            }),
            exhausted,
        }
    }
}
