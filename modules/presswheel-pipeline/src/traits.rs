// Collaborator seams for the orchestrator.
//
// ClusterSupply: ordered brand groups produced upstream for this run.
// ArticleGenerator: turns one cluster into content plus self-reported quality.
//
// Production adapters live in `supply` and `generator`; test doubles in `testing`.

use anyhow::Result;
use async_trait::async_trait;

use presswheel_common::{BrandGroup, ClusterData, GeneratedArtifact};

#[async_trait]
pub trait ClusterSupply: Send + Sync {
    /// Brand groups in a stable order. The order drives wheel fairness.
    async fn brand_groups(&self) -> Result<Vec<BrandGroup>>;
}

#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    /// One generation attempt. An `Err` is a per-pick failure: skip, no lock.
    async fn generate(&self, brand: &str, cluster: &ClusterData) -> Result<GeneratedArtifact>;
}
