use crate::similarity::{SimilarityError, cosine_similarity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;
use std::str::FromStr;
use thiserror::Error;

/// Number of values in every face embedding produced by the inference service.
pub const EMBEDDING_DIM: usize = 512;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("invalid embedding shape: expected {expected} values, got {actual}")]
    InvalidEmbeddingShape { expected: usize, actual: usize },

    #[error("embedding value at index {index} is not a finite number")]
    NonFiniteValue { index: usize },

    #[error("embedding has zero magnitude, so it has no direction to compare")]
    ZeroMagnitude,

    #[error("malformed embedding literal: {0}")]
    MalformedLiteral(String),
}

/// A face descriptor: exactly [`EMBEDDING_DIM`] finite `f64` values, not all zero.
///
/// The value is immutable once constructed. Every way of building one
/// (`new`, `parse_literal`, serde) runs the same checks, so a held
/// `Embedding` always has a defined cosine similarity to any other.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Embedding(Box<[f64; EMBEDDING_DIM]>);

impl Embedding {
    pub fn new(values: Vec<f64>) -> Result<Self, EmbeddingError> {
        validate_values(&values)?;
        if values.iter().all(|v| *v == 0.0) {
            return Err(EmbeddingError::ZeroMagnitude);
        }
        let actual = values.len();
        let values: Box<[f64; EMBEDDING_DIM]> =
            values
                .into_boxed_slice()
                .try_into()
                .map_err(|_| EmbeddingError::InvalidEmbeddingShape {
                    expected: EMBEDDING_DIM,
                    actual,
                })?;
        Ok(Self(values))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.0.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Cosine similarity against another embedding, in `[-1, 1]`.
    pub fn similarity(&self, other: &Self) -> Result<f64, SimilarityError> {
        cosine_similarity(self.as_slice(), other.as_slice())
    }

    /// Serialize as the bracketed literal understood by pgvector: `[v1,v2,...,v512]`.
    #[must_use]
    pub fn to_literal(&self) -> String {
        format_literal(self.as_slice())
    }

    /// Parse the bracketed literal produced by [`Embedding::to_literal`] or by postgres
    /// when a `vector` column is cast to text. Together with `to_literal` this is
    /// the only encoding embeddings cross the database boundary in.
    pub fn parse_literal(literal: &str) -> Result<Self, EmbeddingError> {
        let inner = literal
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| EmbeddingError::MalformedLiteral("missing brackets".to_string()))?;
        if inner.trim().is_empty() {
            return Self::new(Vec::new());
        }

        let values = inner
            .split(',')
            .map(|part| {
                part.trim().parse::<f64>().map_err(|e| {
                    EmbeddingError::MalformedLiteral(format!("'{}': {e}", part.trim()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(values)
    }
}

/// Checks a raw sequence against the embedding invariants without taking ownership.
pub fn validate_values(values: &[f64]) -> Result<(), EmbeddingError> {
    if values.len() != EMBEDDING_DIM {
        return Err(EmbeddingError::InvalidEmbeddingShape {
            expected: EMBEDDING_DIM,
            actual: values.len(),
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(EmbeddingError::NonFiniteValue { index });
    }
    Ok(())
}

/// Bracketed, comma separated literal of any float slice.
#[must_use]
pub fn format_literal(values: &[f64]) -> String {
    let mut literal = String::with_capacity(values.len() * 12 + 2);
    literal.push('[');
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            literal.push(',');
        }
        // Writing into a String cannot fail.
        let _ = write!(literal, "{value}");
    }
    literal.push(']');
    literal
}

impl TryFrom<Vec<f64>> for Embedding {
    type Error = EmbeddingError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Embedding> for Vec<f64> {
    fn from(embedding: Embedding) -> Self {
        embedding.to_vec()
    }
}

impl AsRef<[f64]> for Embedding {
    fn as_ref(&self) -> &[f64] {
        self.as_slice()
    }
}

impl FromStr for Embedding {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_literal(s)
    }
}

impl fmt::Display for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

impl fmt::Debug for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedding")
            .field("dim", &EMBEDDING_DIM)
            .field("head", &&self.0[..4])
            .field("magnitude", &self.magnitude())
            .finish()
    }
}
