//! Embedding providers: the capability trait plus the deterministic
//! hash-based implementation used by default and in tests.

pub mod hash_provider;
pub mod provider;

pub use hash_provider::HashEmbedder;
pub use provider::GraphEmbedder;
