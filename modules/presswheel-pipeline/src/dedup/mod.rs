//! Duplicate detection. Three independent checks over the shared similarity
//! kernel; any one of them can reject a cluster.
//!
//! - `topic_lock`: exact re-topic guard keyed by the centroid hash.
//! - `title`: fuzzy title match against a recent window.
//! - `semantic`: all-pairs embedding sweep grouped with union-find (audit path).

pub mod semantic;
pub mod title;
pub mod topic_lock;

pub use semantic::{designate_keeper, group_duplicates, DuplicateGroup, UnionFind};
pub use title::{find_similar_title, RecentHistory, TitleMatch};
pub use topic_lock::{check_topic_lock, lock_cutoff, LockStatus};
