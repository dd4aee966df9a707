//! The analysis report envelope and the section-isolation wrapper.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::NodeId;

use super::correlation::Correlation;
use super::heatmap::HeatmapData;
use super::metrics::GraphMetrics;
use super::similarity::{ProposedEdge, ThresholdSweep};
use super::structure::StructureReport;
use super::validator::ValidationReport;

/// A report section that either resolved or failed on its own: a failure
/// serializes as `{"error": "..."}` in place of the value, leaving the
/// rest of the report intact.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Computed<T> {
    Value(T),
    Failed { error: String },
}

impl<T> Computed<T> {
    pub fn from_result(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => Computed::Value(value),
            Err(error) => Computed::Failed { error },
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Computed::Value(value) => Some(value),
            Computed::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Computed::Failed { .. })
    }
}

/// A point in the 2-D layout.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

/// The embedding-derived section of the report.
#[derive(Debug, Serialize)]
pub struct EmbeddingAnalysis {
    pub num_nodes_embedded: usize,
    pub threshold_sweep: ThresholdSweep,
    pub proposed_edges: Vec<ProposedEdge>,
    pub heatmap: Computed<HeatmapData>,
    pub cross_embedding_correlation: Correlation,
    pub layout_2d: Computed<BTreeMap<NodeId, Point2D>>,
}

/// Everything a single analysis run produces.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub validation: ValidationReport,
    pub graph_metrics: GraphMetrics,
    pub structure: StructureReport,
    pub embedding_analysis: Computed<EmbeddingAnalysis>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_computed_value_serializes_transparently() {
        let computed: Computed<Vec<u32>> = Computed::Value(vec![1, 2]);
        assert_eq!(serde_json::to_value(&computed).unwrap(), json!([1, 2]));
        assert!(!computed.is_failed());
        assert_eq!(computed.value(), Some(&vec![1, 2]));
    }

    #[test]
    fn test_computed_failure_serializes_as_error_object() {
        let computed: Computed<Vec<u32>> = Computed::from_result(Err("boom".into()));
        assert_eq!(
            serde_json::to_value(&computed).unwrap(),
            json!({ "error": "boom" })
        );
        assert!(computed.is_failed());
        assert!(computed.value().is_none());
    }
}
