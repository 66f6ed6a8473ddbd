use std::time::Duration;

use tokio::time::Instant;

/// Wall-clock budget for one invocation.
///
/// The deadline is set by the invocation environment; this only decides
/// whether another generation attempt still fits before it.
pub struct RunBudget {
    started: Instant,
    total: Duration,
    per_item: Duration,
}

impl RunBudget {
    pub fn new(total: Duration, per_item: Duration) -> Self {
        Self::started_at(Instant::now(), total, per_item)
    }

    /// Budget whose clock began at `started`, so startup I/O done before the
    /// run (connecting, migrating) counts against the same deadline.
    pub fn started_at(started: Instant, total: Duration, per_item: Duration) -> Self {
        Self {
            started,
            total,
            per_item,
        }
    }

    pub fn from_secs(total_secs: u64, per_item_secs: u64) -> Self {
        Self::new(
            Duration::from_secs(total_secs),
            Duration::from_secs(per_item_secs),
        )
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.elapsed())
    }

    /// True if one more attempt at the estimated per-item cost still fits.
    pub fn has_room(&self) -> bool {
        self.remaining() >= self.per_item
    }
}
