//! Persistence for the admission pipeline.
//!
//! Three record types live here: the wheel cursor, topic locks, and the
//! artifact catalog view. Each has a trait so the pipeline can run against
//! Postgres in production and `MemoryStore` in tests.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use traits::{ArtifactStore, TopicLockStore, WheelStore};
