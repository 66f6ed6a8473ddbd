pub mod types;
pub mod config;
pub mod error;
pub mod hash;
pub mod similarity;

pub use types::*;
pub use config::{Config, Tunables};
pub use error::PressWheelError;
pub use hash::{centroid_hash, items_hash};
pub use similarity::{cosine_similarity, title_similarity};
