pub mod audit;
pub mod budget;
pub mod dedup;
pub mod gate;
pub mod generator;
pub mod orchestrator;
pub mod supply;
pub mod traits;
pub mod types;
pub mod wheel;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use audit::{run_audit, AuditMode, AuditReport};
pub use budget::RunBudget;
pub use orchestrator::{Orchestrator, PipelineDeps};
pub use types::{PickOutcome, PickRecord, RunStats, SkipReason};
