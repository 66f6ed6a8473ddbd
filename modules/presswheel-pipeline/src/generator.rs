use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use presswheel_common::{ClusterData, GeneratedArtifact};

use crate::traits::ArticleGenerator;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Generation collaborator reached over HTTP.
///
/// POSTs `{brand, cluster}` as JSON and expects a `GeneratedArtifact` back.
/// Retries, if any, are the endpoint's business.
pub struct HttpGenerator {
    url: String,
    token: Option<String>,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    brand: &'a str,
    cluster: &'a ClusterData,
}

impl HttpGenerator {
    pub fn new(url: &str, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            url: url.to_string(),
            token,
            http,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ArticleGenerator for HttpGenerator {
    async fn generate(&self, brand: &str, cluster: &ClusterData) -> Result<GeneratedArtifact> {
        debug!(brand, headline = cluster.headline(), "Generation request");

        let response = self
            .http
            .post(&self.url)
            .headers(self.headers()?)
            .json(&GenerateRequest { brand, cluster })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Generator error ({}): {}", status, error_text));
        }

        Ok(response.json().await?)
    }
}
