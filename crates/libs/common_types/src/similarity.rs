//! Cosine similarity between face embeddings.
//!
//! Everything here is pure `f64` arithmetic on slices, so the same functions
//! score stored 512-dimensional embeddings and the small hand-written vectors
//! used in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("dimension mismatch: left vector has {left} values, right vector has {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("cosine similarity is undefined for a zero-magnitude vector")]
    DegenerateVector,
}

/// Dot product of `a` and `b` divided by the product of their magnitudes.
///
/// # Errors
///
/// * `DimensionMismatch` when the slices differ in length.
/// * `DegenerateVector` when either slice is empty or has magnitude zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let scale_a = max_abs(a);
    let scale_b = max_abs(b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return Err(SimilarityError::DegenerateVector);
    }

    // Accumulating on values scaled into [-1, 1] keeps the squared norms away
    // from overflow and underflow. The largest component contributes exactly 1,
    // so both norms are at least 1.
    let (dot, norm_a, norm_b) = a
        .iter()
        .map(|x| x / scale_a)
        .zip(b.iter().map(|y| y / scale_b))
        .fold((0.0_f64, 0.0_f64, 0.0_f64), |(dot, na, nb), (x, y)| {
            (x.mul_add(y, dot), x.mul_add(x, na), y.mul_add(y, nb))
        });

    // Rounding can push |score| a hair past 1 for parallel vectors.
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |max, v| max.max(v.abs()))
}

/// `1 - cosine_similarity(a, b)`, in `[0, 2]`. Smaller is more similar.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> Result<f64, SimilarityError> {
    cosine_similarity(a, b).map(|similarity| 1.0 - similarity)
}

/// Maps a cosine similarity in `[-1, 1]` onto a display percentage in `[0, 100]`.
#[must_use]
pub fn to_percentage(score: f64) -> u8 {
    ((score + 1.0) / 2.0 * 100.0).round().clamp(0.0, 100.0) as u8
}

/// A similarity score together with its rounded display percentage.
///
/// `score` is kept unrounded for ranking; `percentage` is only for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Similarity {
    pub score: f64,
    pub percentage: u8,
}

impl Similarity {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        Self {
            score,
            percentage: to_percentage(score),
        }
    }

    pub fn between(a: &[f64], b: &[f64]) -> Result<Self, SimilarityError> {
        cosine_similarity(a, b).map(Self::from_score)
    }
}
