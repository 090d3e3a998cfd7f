//! Similarity functions. Callers check dimensions first.

use defraud_config::DistanceMetric;

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// Cosine similarity in [-1, 1]; zero vectors score 0.
#[inline]
pub fn cosine_with_norms(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[inline]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Higher is closer, for either metric. Norms are only read for cosine.
pub fn similarity(metric: DistanceMetric, a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    match metric {
        DistanceMetric::Cosine => cosine_with_norms(a, norm_a, b, norm_b),
        DistanceMetric::L2 => 1.0 / (1.0 + l2_distance(a, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        similarity(DistanceMetric::Cosine, a, norm(a), b, norm(b))
    }

    fn l2(a: &[f32], b: &[f32]) -> f32 {
        similarity(DistanceMetric::L2, a, norm(a), b, norm(b))
    }

    #[test]
    fn test_cosine() {
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_l2_similarity_transform() {
        assert!((l2_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert!((l2(&[0.0, 0.0], &[3.0, 4.0]) - 1.0 / 6.0).abs() < 1e-6);
        assert_eq!(l2(&[1.0], &[1.0]), 1.0);
    }
}
