use thiserror::Error;

/// Run-level failures. Soft skips (duplicates, gate rejections, per-pick
/// generation failures) are not errors and never surface here.
#[derive(Error, Debug)]
pub enum PressWheelError {
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cluster supply error: {0}")]
    Supply(String),
}

impl PressWheelError {
    /// Wrap a store failure with what was being attempted.
    pub fn persistence(action: &str, err: anyhow::Error) -> Self {
        Self::Persistence(format!("{action}: {err:#}"))
    }

    pub fn supply(err: anyhow::Error) -> Self {
        Self::Supply(format!("{err:#}"))
    }
}
