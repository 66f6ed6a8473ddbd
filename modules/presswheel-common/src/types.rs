use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::hash::{centroid_hash, items_hash};

/// Key of the single `wheel_state` row.
pub const WHEEL_STATE_KEY: &str = "wheel-cursor";

/// Upper bound of a generation confidence score.
pub const MAX_CONFIDENCE: u8 = 100;

// --- Cluster supply ---

/// One upstream feed item inside a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// A candidate topic: source items grouped upstream, with their centroid embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterData {
    pub items: Vec<SourceItem>,
    #[serde(default)]
    pub centroid: Option<Vec<f32>>,
    #[serde(default)]
    pub size: usize,
    #[serde(default)]
    pub similarity: f64,
}

impl ClusterData {
    /// Title of the lead item. Used as the candidate title for fuzzy-title checks.
    pub fn headline(&self) -> &str {
        self.items.first().map(|i| i.title.as_str()).unwrap_or("")
    }

    /// Content-addressed duplicate key for this cluster.
    ///
    /// Hashes the centroid at fixed precision. Clusters without a usable
    /// centroid (missing, empty, or with a NaN/infinite component) fall back
    /// to hashing their item URLs/titles so every admitted artifact can still
    /// be locked.
    pub fn topic_hash(&self) -> String {
        match self.centroid.as_deref() {
            Some(c) if !c.is_empty() && c.iter().all(|v| v.is_finite()) => centroid_hash(c),
            _ => items_hash(&self.items),
        }
    }
}

/// A named partition of candidate clusters. Ordering of groups drives fairness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandGroup {
    pub brand: String,
    #[serde(default)]
    pub clusters: Vec<ClusterData>,
}

/// Brand names in supply order; the cache-validity token for the wheel cursor.
pub fn brands_order(groups: &[BrandGroup]) -> Vec<String> {
    groups.iter().map(|g| g.brand.clone()).collect()
}

// --- Persisted state ---

/// Round-robin cursor persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelState {
    pub last_brand_index: usize,
    pub last_run_at: DateTime<Utc>,
    pub brands_order: Vec<String>,
}

/// A wheel state as read from the store, with the version used for the
/// conditional write at commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedWheel {
    pub state: WheelState,
    pub version: i64,
}

/// Exact-topic guard row. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicLock {
    pub date: NaiveDate,
    pub topic_hash: String,
    pub artifact_id: String,
    pub created_at: DateTime<Utc>,
}

impl TopicLock {
    pub fn new(topic_hash: impl Into<String>, artifact_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            date: now.date_naive(),
            topic_hash: topic_hash.into(),
            artifact_id: artifact_id.into(),
            created_at: now,
        }
    }
}

/// Read view over stored output, windowed by creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentArtifact {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub published: bool,
    pub view_count: i64,
    pub embedding: Option<Vec<f32>>,
    pub brand: String,
}

/// An admitted artifact about to be written to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArtifact {
    pub id: String,
    pub brand: String,
    pub title: String,
    pub body: String,
    pub topic_hash: String,
    pub confidence: u8,
    pub embedding: Option<Vec<f32>>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl NewArtifact {
    pub fn as_recent(&self) -> RecentArtifact {
        RecentArtifact {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            published: self.published,
            view_count: 0,
            embedding: self.embedding.clone(),
            brand: self.brand.clone(),
        }
    }
}

// --- Generation collaborator ---

/// Self-reported quality signals from the generation collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityChecks {
    pub has_data: bool,
    pub has_sources: bool,
    pub has_banned_words: bool,
    pub has_unverified_claims: bool,
    pub structure_valid: bool,
}

/// Output of one generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    pub quality: QualityChecks,
    /// 0..=100. Anything larger is refused at decode time.
    #[serde(deserialize_with = "confidence_score")]
    pub confidence: u8,
}

impl GeneratedArtifact {
    pub fn confidence_in_range(&self) -> bool {
        self.confidence <= MAX_CONFIDENCE
    }
}

fn confidence_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let score = u8::deserialize(deserializer)?;
    if score > MAX_CONFIDENCE {
        return Err(de::Error::custom(format!(
            "confidence {score} is outside 0..={MAX_CONFIDENCE}"
        )));
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str) -> SourceItem {
        SourceItem {
            title: title.to_string(),
            url: url.to_string(),
            summary: None,
            published_at: None,
        }
    }

    #[test]
    fn headline_is_first_item_title() {
        let cluster = ClusterData {
            items: vec![item("Lead story", "https://a"), item("Second", "https://b")],
            centroid: None,
            size: 2,
            similarity: 0.8,
        };
        assert_eq!(cluster.headline(), "Lead story");
    }

    #[test]
    fn headline_empty_without_items() {
        let cluster = ClusterData {
            items: vec![],
            centroid: None,
            size: 0,
            similarity: 0.0,
        };
        assert_eq!(cluster.headline(), "");
    }

    #[test]
    fn topic_hash_prefers_centroid() {
        let mut cluster = ClusterData {
            items: vec![item("Lead story", "https://a")],
            centroid: Some(vec![0.1, 0.2, 0.3]),
            size: 1,
            similarity: 1.0,
        };
        let with_centroid = cluster.topic_hash();
        assert_eq!(with_centroid, centroid_hash(&[0.1, 0.2, 0.3]));

        cluster.centroid = Some(vec![]);
        assert_eq!(cluster.topic_hash(), items_hash(&cluster.items));
    }

    #[test]
    fn cluster_deserializes_with_missing_optionals() {
        let json = r#"{"items":[{"title":"Only title"}]}"#;
        let cluster: ClusterData = serde_json::from_str(json).unwrap();
        assert_eq!(cluster.headline(), "Only title");
        assert!(cluster.centroid.is_none());
        assert_eq!(cluster.size, 0);
    }

    #[test]
    fn lock_date_is_utc_day_of_creation() {
        let now = "2026-03-04T23:59:00Z".parse::<DateTime<Utc>>().unwrap();
        let lock = TopicLock::new("abc", "art-1", now);
        assert_eq!(lock.date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
    }

    #[test]
    fn topic_hash_ignores_non_finite_centroid() {
        let items = vec![item("Lead story", "https://a")];
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let cluster = ClusterData {
                items: items.clone(),
                centroid: Some(vec![0.1, bad]),
                size: 1,
                similarity: 1.0,
            };
            assert_eq!(cluster.topic_hash(), items_hash(&items));
            assert_ne!(cluster.topic_hash(), centroid_hash(&[0.1, 0.0]));
        }
    }

    fn generated_json(confidence: u32) -> String {
        format!(
            r#"{{"title":"t","body":"b","quality":{{"has_data":true,"has_sources":true,"has_banned_words":false,"has_unverified_claims":false,"structure_valid":true}},"confidence":{confidence}}}"#
        )
    }

    #[test]
    fn generated_confidence_accepts_full_range() {
        for c in [0, 70, 100] {
            let g: GeneratedArtifact = serde_json::from_str(&generated_json(c)).unwrap();
            assert_eq!(u32::from(g.confidence), c);
            assert!(g.confidence_in_range());
        }
    }

    #[test]
    fn generated_confidence_over_100_is_refused() {
        for c in [101, 250, 255, 1000] {
            let err = serde_json::from_str::<GeneratedArtifact>(&generated_json(c)).unwrap_err();
            if c <= 255 {
                assert!(err.to_string().contains("outside 0..=100"), "{err}");
            }
        }
    }
}
