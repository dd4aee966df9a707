//! Embedding vectors as produced by the external embedding producers.

use serde::{Deserialize, Serialize};

/// A fixed-length embedding vector assigned to a node.
///
/// The engine treats the producer as a black box and consumes only the
/// numeric values. An all-zero vector is *degenerate*: it carries no
/// similarity signal and every pairwise computation involving it is defined
/// away from zero-norm geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// Vector components.
    pub vector: Vec<f32>,

    /// Dimension of the vector.
    pub dimension: usize,
}

impl EmbeddingVector {
    /// Creates a new embedding vector.
    pub fn new(vector: Vec<f32>) -> Self {
        let dimension = vector.len();
        Self { vector, dimension }
    }

    /// Creates an all-zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            vector: vec![0.0; dimension],
            dimension,
        }
    }

    /// Whether the vector carries no signal (every component is zero).
    pub fn is_degenerate(&self) -> bool {
        self.vector.iter().all(|v| *v == 0.0)
    }

    /// Euclidean distance to another vector.
    ///
    /// Mismatched dimensions are treated as infinitely far apart.
    pub fn euclidean_distance(&self, other: &EmbeddingVector) -> f64 {
        if self.dimension != other.dimension {
            return f64::INFINITY;
        }

        self.vector
            .iter()
            .zip(other.vector.iter())
            .map(|(a, b)| {
                let d = (*a - *b) as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Normalizes the vector to unit magnitude.
    pub fn normalize(&mut self) {
        let norm: f32 = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut self.vector {
                *value /= norm;
            }
        }
    }
}
