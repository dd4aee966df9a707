pub mod edge;
pub mod embedding;

pub use edge::EdgeRecord;
pub use embedding::EmbeddingVector;

/// Caller-supplied opaque node identifier, compared by value.
pub type NodeId = String;
