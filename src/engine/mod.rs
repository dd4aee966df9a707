//! Analysis engine: validation, graph construction, metrics, structure
//! detection and the embedding pipeline, orchestrated into one report.

pub mod config;
pub mod correlation;
pub mod graph;
pub mod heatmap;
pub mod metrics;
pub mod report;
pub mod similarity;
pub mod structure;
pub mod validator;

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::{debug, info};

use crate::embeddings::GraphEmbedder;
use crate::models::{EdgeRecord, EmbeddingVector, NodeId};

pub use config::EngineConfig;
pub use report::{AnalysisReport, Computed, EmbeddingAnalysis, Point2D};

use correlation::cross_embedding_correlation;
use graph::DirectedGraph;
use heatmap::build_heatmap;
use metrics::compute_metrics;
use similarity::{proposed_edges, threshold_sweep, EmbeddingSet};
use structure::detect_structure;
use validator::validate;

const MIN_LAYOUT_NODES: usize = 3;

/// A normalized analysis request: node attribute map, edge list, and any
/// warnings collected while normalizing the raw payload.
pub struct AnalysisInput {
    pub nodes: HashMap<NodeId, Value>,
    pub edges: Vec<EdgeRecord>,
    pub warnings: Vec<String>,
}

/// Runs the full pipeline over one input.
///
/// Sections are isolated: an embedding failure degrades that section to
/// an error value instead of failing the run.
pub async fn run_full_analysis(
    input: AnalysisInput,
    embedder: &dyn GraphEmbedder,
    config: &EngineConfig,
) -> AnalysisReport {
    let (mut validation, valid_edges) = validate(&input.nodes, &input.edges, config);
    let (graph, build_warnings) = DirectedGraph::build(&input.nodes, &valid_edges);

    // payload-normalization warnings first, then validator and builder ones
    let mut warnings = input.warnings;
    warnings.append(&mut validation.warnings);
    warnings.extend(build_warnings);
    validation.warnings = warnings;

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        errors = validation.errors.len(),
        "analyzing graph"
    );

    let graph_metrics = compute_metrics(&graph);
    let structure = detect_structure(&graph, config.cycle_cap);

    let embedding_analysis =
        Computed::from_result(analyze_embeddings(&graph, embedder, config).await);

    AnalysisReport {
        validation,
        graph_metrics,
        structure,
        embedding_analysis,
    }
}

/// The embedding half of the pipeline: semantic vectors from labels,
/// structural vectors from the topology, sweep, proposals, heatmap,
/// cross-space correlation and the 2-D layout.
async fn analyze_embeddings(
    graph: &DirectedGraph,
    embedder: &dyn GraphEmbedder,
    config: &EngineConfig,
) -> Result<EmbeddingAnalysis, String> {
    let labels: Vec<String> = graph.labels().to_vec();
    let vectors = embedder
        .embed_text(&labels)
        .await
        .map_err(|e| format!("text embedding failed: {}", e))?;
    debug!(
        count = vectors.len(),
        provider = embedder.provider_name(),
        "embedded node labels"
    );

    let semantic: BTreeMap<NodeId, EmbeddingVector> = graph
        .ids()
        .iter()
        .cloned()
        .zip(vectors.iter().cloned())
        .collect();
    // graph ids are already sorted, so set order matches graph order
    let set = EmbeddingSet::new(graph.ids().iter().cloned().zip(vectors).collect());

    let sweep = threshold_sweep(&set, config.sweep_steps);
    let proposed = proposed_edges(&set, graph, config.fixed_threshold);
    let heatmap = Computed::from_result(build_heatmap(&set, graph.labels()));

    let structural = structural_embeddings(graph, embedder).await;
    let correlation = cross_embedding_correlation(&semantic, &structural);

    let layout_2d = layout_2d(&set, embedder).await;

    Ok(EmbeddingAnalysis {
        num_nodes_embedded: set.len(),
        threshold_sweep: sweep,
        proposed_edges: proposed,
        heatmap,
        cross_embedding_correlation: correlation,
        layout_2d,
    })
}

/// Structural vectors for every node; a backend failure degrades to
/// zero vectors, whose pairs the correlation discards as degenerate,
/// yielding its not-enough-data outcome.
async fn structural_embeddings(
    graph: &DirectedGraph,
    embedder: &dyn GraphEmbedder,
) -> BTreeMap<NodeId, EmbeddingVector> {
    let adjacency: Vec<Vec<usize>> = graph
        .undirected_adjacency()
        .into_iter()
        .map(|set| set.into_iter().collect())
        .collect();
    match embedder.embed_structure(graph.ids(), &adjacency).await {
        Ok(map) => map,
        Err(error) => {
            tracing::warn!(%error, "structural embedding failed, falling back to zero vectors");
            let dim = embedder.dimension();
            graph
                .ids()
                .iter()
                .map(|id| (id.clone(), EmbeddingVector::zeros(dim)))
                .collect()
        }
    }
}

/// 2-D layout over the embeddings that carry signal; degenerate vectors
/// are excluded from both the reduction input and the coordinate keys.
async fn layout_2d(
    set: &EmbeddingSet,
    embedder: &dyn GraphEmbedder,
) -> Computed<BTreeMap<NodeId, Point2D>> {
    let kept: Vec<usize> = (0..set.len()).filter(|&i| !set.is_degenerate(i)).collect();
    if kept.len() < MIN_LAYOUT_NODES {
        return Computed::Failed {
            error: format!(
                "not enough valid embeddings for 2-D layout (need {}, got {})",
                MIN_LAYOUT_NODES,
                kept.len()
            ),
        };
    }

    let vectors: Vec<EmbeddingVector> = kept
        .iter()
        .map(|&i| set.vectors()[i].clone())
        .collect();
    match embedder.reduce_2d(&vectors).await {
        Ok(points) => Computed::Value(
            kept.iter()
                .map(|&i| set.ids()[i].clone())
                .zip(points.into_iter().map(|(x, y)| Point2D { x, y }))
                .collect(),
        ),
        Err(error) => Computed::Failed {
            error: format!("2-D reduction failed: {}", error),
        },
    }
}
