// Test doubles for the admission pipeline.
//
// - StaticSupply (ClusterSupply): fixed brand groups
// - FailingSupply (ClusterSupply): upstream unavailable
// - MockGenerator (ArticleGenerator): headline→scripted response, records calls
//
// Plus builders for clusters, groups and artifacts.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use presswheel_common::{
    BrandGroup, ClusterData, GeneratedArtifact, QualityChecks, RecentArtifact, SourceItem,
};

use crate::traits::{ArticleGenerator, ClusterSupply};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A single-item cluster. The item URL is derived from the headline so
/// centroid-less clusters still hash distinctly.
pub fn cluster(headline: &str, centroid: Option<Vec<f32>>) -> ClusterData {
    ClusterData {
        items: vec![SourceItem {
            title: headline.to_string(),
            url: format!("https://news.test/{}", headline.replace(' ', "-").to_lowercase()),
            summary: None,
            published_at: None,
        }],
        centroid,
        size: 1,
        similarity: 1.0,
    }
}

pub fn brand_group(brand: &str, headlines: &[&str]) -> BrandGroup {
    BrandGroup {
        brand: brand.to_string(),
        clusters: headlines.iter().map(|h| cluster(h, None)).collect(),
    }
}

pub fn clean_checks() -> QualityChecks {
    QualityChecks {
        has_data: true,
        has_sources: true,
        has_banned_words: false,
        has_unverified_claims: false,
        structure_valid: true,
    }
}

/// A generation result that clears the gate as "high quality".
pub fn passing_artifact(title: &str) -> GeneratedArtifact {
    GeneratedArtifact {
        title: title.to_string(),
        body: format!("Body for {title}"),
        embedding: None,
        quality: clean_checks(),
        confidence: 95,
    }
}

pub fn recent_artifact(id: &str, title: &str, created_at: DateTime<Utc>) -> RecentArtifact {
    RecentArtifact {
        id: id.to_string(),
        title: title.to_string(),
        created_at,
        published: true,
        view_count: 0,
        embedding: None,
        brand: "test".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Supplies
// ---------------------------------------------------------------------------

pub struct StaticSupply {
    groups: Vec<BrandGroup>,
}

impl StaticSupply {
    pub fn new(groups: Vec<BrandGroup>) -> Self {
        Self { groups }
    }
}

#[async_trait]
impl ClusterSupply for StaticSupply {
    async fn brand_groups(&self) -> Result<Vec<BrandGroup>> {
        Ok(self.groups.clone())
    }
}

pub struct FailingSupply;

#[async_trait]
impl ClusterSupply for FailingSupply {
    async fn brand_groups(&self) -> Result<Vec<BrandGroup>> {
        bail!("FailingSupply: upstream clusters unavailable")
    }
}

// ---------------------------------------------------------------------------
// MockGenerator
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum MockResponse {
    Generate(GeneratedArtifact),
    Fail(String),
}

/// Headline-keyed generator. Unregistered headlines get `passing_artifact`.
/// Builder pattern: `.on()`, `.failing_on()`, `.with_delay()`.
pub struct MockGenerator {
    responses: HashMap<String, MockResponse>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, headline: &str, artifact: GeneratedArtifact) -> Self {
        self.responses
            .insert(headline.to_string(), MockResponse::Generate(artifact));
        self
    }

    pub fn failing_on(mut self, headline: &str) -> Self {
        self.responses.insert(
            headline.to_string(),
            MockResponse::Fail(format!("MockGenerator: scripted failure for {headline}")),
        );
        self
    }

    /// Sleep this long per call (use with a paused tokio clock).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Headlines generated so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleGenerator for MockGenerator {
    async fn generate(&self, _brand: &str, cluster: &ClusterData) -> Result<GeneratedArtifact> {
        let headline = cluster.headline().to_string();
        self.calls.lock().unwrap().push(headline.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(&headline) {
            Some(MockResponse::Generate(artifact)) => Ok(artifact.clone()),
            Some(MockResponse::Fail(msg)) => bail!("{msg}"),
            None => {
                let mut artifact = passing_artifact(&headline);
                artifact.embedding = cluster.centroid.clone();
                Ok(artifact)
            }
        }
    }
}
