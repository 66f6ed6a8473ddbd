//! Topic hashing.
//!
//! A topic hash must be reproducible across runs: the same centroid has to
//! produce the same key at check time and at lock-creation time. Components
//! are quantized to a fixed number of decimal places before hashing so float
//! jitter below that precision does not change the key.

use sha2::{Digest, Sha256};

use crate::types::SourceItem;

/// Decimal places kept per centroid component.
pub const CENTROID_HASH_PRECISION: i32 = 6;

/// SHA-256 over the fixed-precision centroid, hex encoded.
pub fn centroid_hash(centroid: &[f32]) -> String {
    let scale = 10f64.powi(CENTROID_HASH_PRECISION);
    let mut hasher = Sha256::new();
    hasher.update(b"centroid:");
    for (i, v) in centroid.iter().enumerate() {
        if i > 0 {
            hasher.update(b",");
        }
        // Integer quantization sidesteps "-0.000000" vs "0.000000".
        let q = (f64::from(*v) * scale).round() as i64;
        hasher.update(q.to_string().as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fallback key for clusters without a centroid: hash of the sorted item
/// URLs (titles where a URL is missing).
pub fn items_hash(items: &[SourceItem]) -> String {
    let mut keys: Vec<&str> = items
        .iter()
        .map(|i| if i.url.is_empty() { i.title.as_str() } else { i.url.as_str() })
        .collect();
    keys.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(b"items:");
    // Length-prefixed so no key boundary can be forged from key contents.
    for key in keys {
        hasher.update((key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
    }
    hex::encode(hasher.finalize())
}
