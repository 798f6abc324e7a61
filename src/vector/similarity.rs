//! Distance and similarity conversions.
//!
//! Both conversions assume unit-normalized embeddings, for which
//! `cos = 1 - d²/2` relates L2 distance `d` to cosine similarity.
//!
//! Two conversions coexist. The audience matcher uses the exact relation and
//! rescales cosine from [-1, 1] to [0, 1]. The question-to-ad selector drops
//! the `/2` (`cos = 1 - d²`) before the same rescale, which scores every
//! non-zero distance lower than the matcher would. Its threshold was tuned
//! against that curve, so the two are kept apart rather than unified.

use super::Score;

/// Euclidean distance between two vectors of equal length
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Computes cosine similarity between two vectors.
///
/// # Returns
/// * Cosine similarity in range [-1, 1], where 1 is most similar
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Scale a vector to unit length in place; zero vectors are left untouched
pub fn normalize(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for val in vector.iter_mut() {
            *val /= magnitude;
        }
    }
}

/// A distance the formulas can use: present, finite and non-negative
fn usable(distance: Option<f32>) -> Option<f32> {
    distance.filter(|d| d.is_finite() && *d >= 0.0)
}

/// Physician match score: `((1 - d²/2) + 1) / 2`.
///
/// Distance 0 maps to 1 and distance 2 (opposite unit vectors) maps to 0.
/// Larger distances, only possible for non-normalized vectors, saturate at 0.
/// A missing distance is never a perfect match: it scores 0.
pub fn physician_similarity(distance: Option<f32>) -> Score {
    match usable(distance) {
        Some(d) => {
            let cosine = 1.0 - d * d / 2.0;
            Score::saturating((cosine + 1.0) / 2.0)
        }
        None => Score::zero(),
    }
}

/// Question-to-category score: `((1 - d²) + 1) / 2`.
///
/// Unbounded below: distances above √2 give negative values, which simply
/// fail the selector threshold. A missing distance scores 0.
pub fn question_similarity(distance: Option<f32>) -> f32 {
    match usable(distance) {
        Some(d) => {
            let cosine = 1.0 - d * d;
            (cosine + 1.0) / 2.0
        }
        None => 0.0,
    }
}
