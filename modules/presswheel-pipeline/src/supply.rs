use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use presswheel_common::BrandGroup;

use crate::traits::ClusterSupply;

/// Reads the ordered brand groups the upstream clustering job wrote as JSON.
pub struct JsonFileSupply {
    path: PathBuf,
}

impl JsonFileSupply {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ClusterSupply for JsonFileSupply {
    async fn brand_groups(&self) -> Result<Vec<BrandGroup>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading cluster supply {}", self.path.display()))?;
        let groups: Vec<BrandGroup> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing cluster supply {}", self.path.display()))?;

        let clusters: usize = groups.iter().map(|g| g.clusters.len()).sum();
        info!(brands = groups.len(), clusters, "Cluster supply loaded");
        Ok(groups)
    }
}
