// Similarity kernel shared by every duplicate check. Pure functions, no I/O.

/// Normalized edit-distance similarity in [0, 1]:
/// `1 - levenshtein(a, b) / max(len(a), len(b))`, counted in chars.
/// Two empty strings are identical (1.0).
pub fn title_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Cosine similarity in [-1, 1].
///
/// Returns 0.0 when either vector is empty, the lengths differ, or either
/// norm is zero. Callers treat 0.0 as "cannot compare", not "distinct".
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}
