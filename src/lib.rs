//! GraphLens: structural and semantic analysis for directed graphs.
//!
//! Validates edge lists against node definitions, computes classical
//! graph metrics, detects chains and cycles, and layers an embedding
//! pipeline on top: similarity proposals, threshold sweeps, clustered
//! heatmaps, cross-space correlation and 2-D layouts. Exposed over a
//! small HTTP API.

pub mod api;
pub mod embeddings;
pub mod engine;
pub mod models;
