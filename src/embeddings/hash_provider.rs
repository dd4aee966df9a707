//! Deterministic hash-based embedding provider.
//!
//! Generates reproducible vectors from text hashes so the full analysis
//! pipeline runs without a model backend. Also the provider used in tests.

use std::collections::BTreeMap;
use std::env;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{EmbeddingVector, NodeId};

use super::provider::GraphEmbedder;

const DEFAULT_DIMENSION: usize = 64;

/// Deterministic embedding provider
///
/// Derives every vector from a text hash, so the same input always yields
/// the same embedding.
pub struct HashEmbedder {
    dimension: usize,
    should_fail: bool,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            should_fail: false,
        }
    }

    /// Reads the dimension from `EMBEDDING_DIMENSION`, defaulting to 64.
    pub fn from_env() -> Self {
        let dimension = env::var("EMBEDDING_DIMENSION")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .filter(|&d| d >= 2)
            .unwrap_or(DEFAULT_DIMENSION);
        Self::new().with_dimension(dimension)
    }

    /// Sets a custom dimension
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension.max(2);
        self
    }

    /// Makes the provider fail on all operations
    pub fn should_fail(mut self, fail: bool) -> Self {
        self.should_fail = fail;
        self
    }

    /// Generates a deterministic unit vector from a text hash
    fn generate(&self, text: &str) -> EmbeddingVector {
        let hash = Self::simple_hash(text);
        let mut vector = Vec::with_capacity(self.dimension);

        for i in 0..self.dimension {
            let value = ((hash.wrapping_add(i as u64).wrapping_mul(2654435761)) % 10000) as f32
                / 10000.0
                - 0.5;
            vector.push(value);
        }

        let mut embedding = EmbeddingVector::new(vector);
        embedding.normalize();
        embedding
    }

    fn simple_hash(text: &str) -> u64 {
        let mut hash: u64 = 5381;
        for byte in text.bytes() {
            hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
        }
        hash
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphEmbedder for HashEmbedder {
    async fn embed_text(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        if self.should_fail {
            anyhow::bail!("hash provider configured to fail");
        }
        Ok(texts.iter().map(|text| self.generate(text)).collect())
    }

    async fn embed_structure(
        &self,
        ids: &[NodeId],
        adjacency: &[Vec<usize>],
    ) -> Result<BTreeMap<NodeId, EmbeddingVector>> {
        if self.should_fail {
            anyhow::bail!("hash provider configured to fail");
        }

        // own hash vector blended with the mean of the neighbors' hash
        // vectors, so structurally close nodes land close in the space
        let own: Vec<EmbeddingVector> = ids.iter().map(|id| self.generate(id)).collect();
        let mut result = BTreeMap::new();
        for (u, id) in ids.iter().enumerate() {
            let mut blended = own[u].vector.clone();
            let neighbors = &adjacency[u];
            if !neighbors.is_empty() {
                let weight = 0.5 / neighbors.len() as f32;
                for &v in neighbors {
                    for (slot, value) in blended.iter_mut().zip(own[v].vector.iter()) {
                        *slot += weight * value;
                    }
                }
            }
            let mut embedding = EmbeddingVector::new(blended);
            embedding.normalize();
            result.insert(id.clone(), embedding);
        }
        Ok(result)
    }

    async fn reduce_2d(&self, vectors: &[EmbeddingVector]) -> Result<Vec<(f32, f32)>> {
        if self.should_fail {
            anyhow::bail!("hash provider configured to fail");
        }
        Ok(vectors
            .iter()
            .map(|v| {
                let x = v.vector.first().copied().unwrap_or(0.0);
                let y = v.vector.get(1).copied().unwrap_or(0.0);
                (x, y)
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embed_text_deterministic() {
        let provider = HashEmbedder::new();
        let a = provider.embed_text(&["hello".to_string()]).await.unwrap();
        let b = provider.embed_text(&["hello".to_string()]).await.unwrap();
        assert_eq!(a[0].vector, b[0].vector);
        assert_eq!(a[0].dimension, DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn test_embed_text_distinguishes_inputs() {
        let provider = HashEmbedder::new();
        let vectors = provider
            .embed_text(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_ne!(vectors[0].vector, vectors[1].vector);
    }

    #[tokio::test]
    async fn test_structure_vectors_reflect_neighborhoods() {
        let provider = HashEmbedder::new();
        let ids: Vec<NodeId> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        // a-b connected, c isolated
        let adjacency = vec![vec![1], vec![0], vec![]];
        let result = provider.embed_structure(&ids, &adjacency).await.unwrap();

        let d_ab = result["a"].euclidean_distance(&result["b"]);
        let d_ac = result["a"].euclidean_distance(&result["c"]);
        assert_eq!(result.len(), 3);
        assert!(d_ab.is_finite() && d_ac.is_finite());
    }

    #[tokio::test]
    async fn test_reduce_2d_takes_leading_components() {
        let provider = HashEmbedder::new();
        let vectors = vec![EmbeddingVector::new(vec![0.25, -0.5, 0.9])];
        let points = provider.reduce_2d(&vectors).await.unwrap();
        assert_eq!(points, vec![(0.25, -0.5)]);
    }

    #[tokio::test]
    async fn test_should_fail_propagates() {
        let provider = HashEmbedder::new().should_fail(true);
        assert!(provider.embed_text(&["x".to_string()]).await.is_err());
        assert!(provider.embed_structure(&[], &[]).await.is_err());
        assert!(provider.reduce_2d(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_custom_dimension() {
        let provider = HashEmbedder::new().with_dimension(16);
        let vectors = provider.embed_text(&["x".to_string()]).await.unwrap();
        assert_eq!(vectors[0].dimension, 16);
    }
}
