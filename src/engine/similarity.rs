//! Embedding similarity: pairwise scores, proposed edges and the
//! threshold sweep over similarity graphs.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Serialize;

use crate::models::{EmbeddingVector, NodeId};

use super::graph::DirectedGraph;
use super::metrics::{average_clustering, connected_components};

/// Maps a euclidean distance onto (0, 1]. Degenerate distances (negative,
/// NaN or infinite) score 0.
pub fn similarity_from_distance(distance: f64) -> f64 {
    if distance.is_finite() && distance >= 0.0 {
        1.0 / (1.0 + distance)
    } else {
        0.0
    }
}

/// Node embeddings aligned to the canonical sorted-id order.
pub struct EmbeddingSet {
    ids: Vec<NodeId>,
    vectors: Vec<EmbeddingVector>,
    degenerate: Vec<bool>,
}

impl EmbeddingSet {
    /// Builds the set from (id, vector) pairs; entries are re-sorted by id
    /// so indexes line up with [`DirectedGraph`] node indexes.
    pub fn new(mut entries: Vec<(NodeId, EmbeddingVector)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let (ids, vectors): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let degenerate = vectors.iter().map(EmbeddingVector::is_degenerate).collect();
        Self {
            ids,
            vectors,
            degenerate,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn vectors(&self) -> &[EmbeddingVector] {
        &self.vectors
    }

    pub fn is_degenerate(&self, index: usize) -> bool {
        self.degenerate[index]
    }

    /// Number of vectors that carry signal.
    pub fn non_degenerate_count(&self) -> usize {
        self.degenerate.iter().filter(|d| !**d).count()
    }

    /// Distance between two entries; +inf when either side is degenerate.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        if self.degenerate[i] || self.degenerate[j] {
            f64::INFINITY
        } else {
            self.vectors[i].euclidean_distance(&self.vectors[j])
        }
    }

    pub fn similarity(&self, i: usize, j: usize) -> f64 {
        similarity_from_distance(self.distance(i, j))
    }

    /// All unordered pair similarities, (i, j, score) with i < j.
    pub fn pairwise_similarities(&self) -> Vec<(usize, usize, f64)> {
        let n = self.len();
        (0..n)
            .into_par_iter()
            .flat_map_iter(|i| (i + 1..n).map(move |j| (i, j)))
            .map(|(i, j)| (i, j, self.similarity(i, j)))
            .collect()
    }
}

/// A semantically close pair not already connected in the graph.
#[derive(Debug, Clone, Serialize)]
pub struct ProposedEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub similarity: f64,
}

/// Pairs scoring at or above `threshold` with no existing edge between
/// them in either direction. Ordered by (i, j) of the canonical index.
pub fn proposed_edges(
    embeddings: &EmbeddingSet,
    graph: &DirectedGraph,
    threshold: f64,
) -> Vec<ProposedEdge> {
    embeddings
        .pairwise_similarities()
        .into_iter()
        .filter(|&(_, _, score)| score >= threshold)
        .filter_map(|(i, j, score)| {
            let (a, b) = (&embeddings.ids()[i], &embeddings.ids()[j]);
            let (gi, gj) = (graph.index_of(a)?, graph.index_of(b)?);
            if graph.has_undirected_edge(gi, gj) {
                return None;
            }
            Some(ProposedEdge {
                source: a.clone(),
                target: b.clone(),
                similarity: score,
            })
        })
        .collect()
}

/// Structural profile of the similarity graph at each sweep threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdSweep {
    pub thresholds: Vec<f64>,
    pub density: Vec<f64>,
    pub clustering: Vec<f64>,
    pub avg_degree: Vec<f64>,
    pub num_components: Vec<usize>,
}

/// Sweeps thresholds evenly spaced over [0, 1] and profiles the
/// undirected similarity graph induced at each one.
pub fn threshold_sweep(embeddings: &EmbeddingSet, steps: usize) -> ThresholdSweep {
    let steps = steps.max(2);
    let thresholds: Vec<f64> = (0..steps)
        .map(|k| k as f64 / (steps - 1) as f64)
        .collect();

    let n = embeddings.len();
    let pairs = embeddings.pairwise_similarities();

    let profiles: Vec<(f64, f64, f64, usize)> = thresholds
        .par_iter()
        .map(|&threshold| {
            if n == 0 {
                return (0.0, 0.0, 0.0, 0);
            }
            if n == 1 {
                return (0.0, 0.0, 0.0, 1);
            }

            let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
            let mut edges = 0usize;
            for &(i, j, score) in &pairs {
                if score >= threshold {
                    adjacency[i].insert(j);
                    adjacency[j].insert(i);
                    edges += 1;
                }
            }

            let density = 2.0 * edges as f64 / (n as f64 * (n - 1) as f64);
            let avg_degree = 2.0 * edges as f64 / n as f64;
            let clustering = average_clustering(&adjacency);
            let components = connected_components(&adjacency).len();
            (density, clustering, avg_degree, components)
        })
        .collect();

    let mut sweep = ThresholdSweep {
        thresholds,
        density: Vec::with_capacity(steps),
        clustering: Vec::with_capacity(steps),
        avg_degree: Vec::with_capacity(steps),
        num_components: Vec::with_capacity(steps),
    };
    for (density, clustering, avg_degree, components) in profiles {
        sweep.density.push(density);
        sweep.clustering.push(clustering);
        sweep.avg_degree.push(avg_degree);
        sweep.num_components.push(components);
    }
    sweep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EdgeRecord;
    use serde_json::json;
    use std::collections::HashMap;

    fn set(entries: &[(&str, &[f32])]) -> EmbeddingSet {
        EmbeddingSet::new(
            entries
                .iter()
                .map(|(id, v)| (id.to_string(), EmbeddingVector::new(v.to_vec())))
                .collect(),
        )
    }

    #[test]
    fn test_similarity_from_distance() {
        assert!((similarity_from_distance(0.0) - 1.0).abs() < 1e-9);
        assert!((similarity_from_distance(1.0) - 0.5).abs() < 1e-9);
        assert_eq!(similarity_from_distance(f64::INFINITY), 0.0);
        assert_eq!(similarity_from_distance(f64::NAN), 0.0);
        assert_eq!(similarity_from_distance(-1.0), 0.0);
    }

    #[test]
    fn test_entries_sorted_into_canonical_order() {
        let set = set(&[("b", &[1.0]), ("a", &[0.0])]);
        assert_eq!(set.ids(), ["a", "b"]);
        assert!((set.vectors()[1].vector[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_vector_scores_zero() {
        let set = set(&[("a", &[0.0, 0.0]), ("b", &[1.0, 0.0])]);
        assert!(set.is_degenerate(0));
        assert_eq!(set.distance(0, 1), f64::INFINITY);
        assert_eq!(set.similarity(0, 1), 0.0);
        assert_eq!(set.non_degenerate_count(), 1);
    }

    #[test]
    fn test_pairwise_covers_all_unordered_pairs() {
        let set = set(&[("a", &[0.0]), ("b", &[1.0]), ("c", &[2.0])]);
        let mut pairs = set.pairwise_similarities();
        pairs.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].0, pairs[0].1), (0, 1));
        assert!((pairs[0].2 - 0.5).abs() < 1e-6);
        assert!((pairs[1].2 - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_proposed_edges_skip_existing_connections() {
        let nodes: HashMap<NodeId, serde_json::Value> = ["a", "b", "c"]
            .iter()
            .map(|id| (id.to_string(), json!({})))
            .collect();
        let edges = vec![EdgeRecord::new("a", "b")];
        let (graph, _) = DirectedGraph::build(&nodes, &edges);

        // everything is maximally similar, but a-b already exists
        let set = set(&[("a", &[1.0]), ("b", &[1.0]), ("c", &[1.0])]);
        let proposed = proposed_edges(&set, &graph, 0.9);

        let pairs: Vec<(&str, &str)> = proposed
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "c"), ("b", "c")]);
        assert!((proposed[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sweep_thresholds_span_unit_interval() {
        let set = set(&[("a", &[0.0]), ("b", &[1.0])]);
        let sweep = threshold_sweep(&set, 21);
        assert_eq!(sweep.thresholds.len(), 21);
        assert_eq!(sweep.thresholds[0], 0.0);
        assert!((sweep.thresholds[20] - 1.0).abs() < 1e-9);
        assert!((sweep.thresholds[1] - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_sweep_profiles_densify_then_thin() {
        // a and b are close (sim 0.5), c is far from both
        let set = set(&[("a", &[0.0]), ("b", &[1.0]), ("c", &[10.0])]);
        let sweep = threshold_sweep(&set, 21);

        // at threshold 0 every pair connects
        assert!((sweep.density[0] - 1.0).abs() < 1e-9);
        assert_eq!(sweep.num_components[0], 1);
        // at threshold 1 nothing connects
        assert_eq!(sweep.density[20], 0.0);
        assert_eq!(sweep.num_components[20], 3);
        // at 0.5 only the a-b edge survives
        let mid = sweep
            .thresholds
            .iter()
            .position(|&t| (t - 0.5).abs() < 1e-9)
            .unwrap();
        assert!((sweep.density[mid] - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(sweep.num_components[mid], 2);
    }

    #[test]
    fn test_sweep_degenerate_sizes() {
        let empty = EmbeddingSet::new(Vec::new());
        let sweep = threshold_sweep(&empty, 21);
        assert!(sweep.density.iter().all(|&d| d == 0.0));
        assert!(sweep.num_components.iter().all(|&c| c == 0));

        let single = set(&[("only", &[1.0])]);
        let sweep = threshold_sweep(&single, 21);
        assert!(sweep.num_components.iter().all(|&c| c == 1));
    }
}
