//! Distance metrics for vector similarity.
//!
//! All metrics return a distance where **lower is better** (more similar).
//! Accumulation happens in f64; the result is narrowed to f32. Operands must
//! have equal dimensions.

use crate::error::{Result, VectorDbError};
use crate::record::VectorRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance metric used for vector similarity computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean (L2) distance: `sqrt(sum((a - b)^2))`. Range: [0, ∞).
    Euclidean,
    /// Cosine distance: `1 - cosine_similarity`, clamped. Range: [0, 2].
    Cosine,
    /// Negative dot product: `-dot(a, b)`. Lower = higher similarity.
    DotProduct,
    /// Manhattan (L1) distance: `sum(|a - b|)`. Range: [0, ∞).
    Manhattan,
}

impl DistanceMetric {
    /// Computes the distance between two records.
    ///
    /// Fails with an invalid-dimension error when the operands disagree.
    pub fn distance(&self, a: &VectorRecord, b: &VectorRecord) -> Result<f32> {
        if a.dimension() != b.dimension() {
            return Err(VectorDbError::InvalidDimension {
                expected: a.dimension(),
                got: b.dimension(),
            });
        }

        let d = match self {
            DistanceMetric::Euclidean => {
                let sum: f64 = a
                    .values
                    .iter()
                    .zip(&b.values)
                    .map(|(&x, &y)| {
                        let diff = (x - y) as f64;
                        diff * diff
                    })
                    .sum();
                sum.sqrt()
            }
            DistanceMetric::Cosine => {
                let mut dot = 0.0f64;
                let mut norm_a = 0.0f64;
                let mut norm_b = 0.0f64;
                for (&x, &y) in a.values.iter().zip(&b.values) {
                    dot += (x as f64) * (y as f64);
                    norm_a += (x as f64) * (x as f64);
                    norm_b += (y as f64) * (y as f64);
                }
                if norm_a == 0.0 || norm_b == 0.0 {
                    // A zero vector has no direction; treat as maximally distant.
                    return Ok(1.0);
                }
                let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
                1.0 - similarity
            }
            DistanceMetric::DotProduct => {
                let dot: f64 = a
                    .values
                    .iter()
                    .zip(&b.values)
                    .map(|(&x, &y)| (x as f64) * (y as f64))
                    .sum();
                -dot
            }
            DistanceMetric::Manhattan => a
                .values
                .iter()
                .zip(&b.values)
                .map(|(&x, &y)| ((x - y) as f64).abs())
                .sum(),
        };

        Ok(d as f32)
    }

    /// The canonical lowercase tag for this metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::DotProduct => "dotproduct",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = VectorDbError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "cosine" => Ok(DistanceMetric::Cosine),
            "dotproduct" => Ok(DistanceMetric::DotProduct),
            "manhattan" => Ok(DistanceMetric::Manhattan),
            other => Err(VectorDbError::UnknownMetric(other.to_string())),
        }
    }
}
