//! Vector similarity utilities.
//!
//! Pure-Rust exhaustive nearest-neighbour search:
//! - Cosine similarity
//! - Stable top-k ranking of embedding records

use agentloom_core::embedding::{EmbeddingRecord, ScoredRecord};
use std::cmp::Ordering;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 for empty or mismatched-length vectors and when either has
/// zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0) as f32
}

/// Score every record against `query` and keep the best `k`.
///
/// Sorting is stable: records with equal scores keep their input order,
/// so callers passing records in insertion order get deterministic ties.
/// A record whose score is not a number (non-finite vector components)
/// ranks below every other record with score `-inf`.
pub fn rank_by_similarity(records: Vec<EmbeddingRecord>, query: &[f32], k: usize) -> Vec<ScoredRecord> {
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredRecord> = records
        .into_iter()
        .map(|record| {
            let score = cosine_similarity(&record.vector, query);
            let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
            ScoredRecord { record, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            content: content.into(),
            vector,
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn cosine_empty_vectors() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // [1,1] · [1,0] = 1, |[1,1]| = sqrt(2), |[1,0]| = 1
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn ranks_by_similarity() {
        let records = vec![
            record("a", vec![0.0, 1.0, 0.0]), // orthogonal = 0
            record("b", vec![1.0, 0.0, 0.0]), // identical = 1
            record("c", vec![0.5, 0.5, 0.0]), // partial ≈ 0.707
        ];

        let results = rank_by_similarity(records, &[1.0, 0.0, 0.0], 10);
        let order: Vec<&str> = results.iter().map(|r| r.record.content.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            record("first", vec![2.0, 0.0]),
            record("second", vec![1.0, 0.0]),
            record("third", vec![3.0, 0.0]),
        ];
        let results = rank_by_similarity(records, &[1.0, 0.0], 3);
        let order: Vec<&str> = results.iter().map(|r| r.record.content.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn respects_k() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("e{i}"), vec![1.0, i as f32 * 0.1]))
            .collect();
        assert_eq!(rank_by_similarity(records.clone(), &[1.0, 0.0], 3).len(), 3);
        assert!(rank_by_similarity(records, &[1.0, 0.0], 0).is_empty());
    }

    #[test]
    fn non_finite_vectors_rank_last() {
        let records: Vec<_> = (0..40)
            .map(|i| {
                let vector = if i % 3 == 0 {
                    vec![f32::INFINITY, 1.0]
                } else {
                    vec![1.0, i as f32 * 0.01]
                };
                record(&format!("e{i}"), vector)
            })
            .collect();

        let results = rank_by_similarity(records, &[1.0, 0.0], 40);
        assert_eq!(results.len(), 40);
        assert!(results.iter().all(|r| !r.score.is_nan()));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        // 14 of the 40 records carry an infinite component
        assert!(results[..26].iter().all(|r| r.score.is_finite()));
        assert!(results[26..].iter().all(|r| r.score == f32::NEG_INFINITY));
        assert_eq!(results[0].record.content, "e1");
    }

    #[test]
    fn mismatched_dimensions_score_zero() {
        let records = vec![record("short", vec![1.0]), record("match", vec![0.0, 1.0])];
        let results = rank_by_similarity(records, &[0.0, 1.0], 2);
        assert_eq!(results[0].record.content, "match");
        assert_eq!(results[1].score, 0.0);
    }
}
