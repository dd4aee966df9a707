use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{EmbeddingVector, NodeId};

/// Capability surface every embedding backend implements.
///
/// `embed_text` turns node labels into semantic vectors, `embed_structure`
/// turns graph neighborhoods into structural vectors, and `reduce_2d`
/// projects vectors down for layout. Backends are free to fail any of
/// these; callers decide how the failure degrades.
#[async_trait]
pub trait GraphEmbedder: Send + Sync {
    /// One vector per input text, same order.
    async fn embed_text(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>>;

    /// One vector per node id, keyed by id. The adjacency gives each
    /// node's undirected neighbors in canonical index space.
    async fn embed_structure(
        &self,
        ids: &[NodeId],
        adjacency: &[Vec<usize>],
    ) -> Result<BTreeMap<NodeId, EmbeddingVector>>;

    /// Projects vectors to 2-D, same order as the input.
    async fn reduce_2d(&self, vectors: &[EmbeddingVector]) -> Result<Vec<(f32, f32)>>;

    fn dimension(&self) -> usize;

    fn provider_name(&self) -> &str;
}
