//! Directed graph materialization with a stable node index.
//!
//! Every downstream computation (metrics, structure detection, similarity,
//! heatmap ordering) enumerates nodes and node pairs through the index built
//! here, so identical input always yields identical results regardless of
//! payload key order.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::models::{EdgeRecord, NodeId};

/// A directed graph over a fixed, sorted node index.
///
/// Edges are deduplicated by ordered (source, target) pair; self-loops are
/// permitted and counted separately.
#[derive(Debug, Clone)]
pub struct DirectedGraph {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    labels: Vec<String>,
    successors: Vec<BTreeSet<usize>>,
    predecessors: Vec<BTreeSet<usize>>,
    edge_count: usize,
    self_loop_count: usize,
}

impl DirectedGraph {
    /// Materializes a graph from the raw node mapping and the validator's
    /// valid-edge list.
    ///
    /// Node indices are assigned by sorted id order. A node whose attribute
    /// value is not an object falls back to its id as the display label and
    /// is reported as a warning, never a failure. Edges whose endpoints are
    /// missing from the node mapping are skipped; the validator is expected
    /// to have filtered those already.
    pub fn build(nodes: &HashMap<NodeId, Value>, valid_edges: &[EdgeRecord]) -> (Self, Vec<String>) {
        let mut ids: Vec<NodeId> = nodes.keys().cloned().collect();
        ids.sort();

        let index: HashMap<NodeId, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut warnings = Vec::new();
        let labels: Vec<String> = ids
            .iter()
            .map(|id| match nodes.get(id) {
                Some(Value::Object(attrs)) => attrs
                    .get("label")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| id.clone()),
                _ => {
                    warnings.push(format!(
                        "Node '{}' has invalid data format, using default attributes.",
                        id
                    ));
                    id.clone()
                }
            })
            .collect();

        let n = ids.len();
        let mut graph = Self {
            ids,
            index,
            labels,
            successors: vec![BTreeSet::new(); n],
            predecessors: vec![BTreeSet::new(); n],
            edge_count: 0,
            self_loop_count: 0,
        };

        for edge in valid_edges {
            let (Some(&s), Some(&t)) = (graph.index.get(&edge.source), graph.index.get(&edge.target))
            else {
                continue;
            };
            if graph.successors[s].insert(t) {
                graph.predecessors[t].insert(s);
                graph.edge_count += 1;
                if s == t {
                    graph.self_loop_count += 1;
                }
            }
        }

        (graph, warnings)
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn self_loop_count(&self) -> usize {
        self.self_loop_count
    }

    /// Node ids in canonical index order.
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Display labels in canonical index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn id(&self, idx: usize) -> &NodeId {
        &self.ids[idx]
    }

    pub fn label(&self, idx: usize) -> &str {
        &self.labels[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn successors(&self, idx: usize) -> &BTreeSet<usize> {
        &self.successors[idx]
    }

    pub fn predecessors(&self, idx: usize) -> &BTreeSet<usize> {
        &self.predecessors[idx]
    }

    pub fn out_degree(&self, idx: usize) -> usize {
        self.successors[idx].len()
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.predecessors[idx].len()
    }

    pub fn has_edge(&self, source: usize, target: usize) -> bool {
        self.successors[source].contains(&target)
    }

    /// Whether an edge exists between the pair in either direction.
    pub fn has_undirected_edge(&self, a: usize, b: usize) -> bool {
        self.has_edge(a, b) || self.has_edge(b, a)
    }

    /// Undirected projection as index-keyed neighbor sets, self-loops
    /// excluded. Used for clustering, connectivity and path lengths.
    pub fn undirected_adjacency(&self) -> Vec<BTreeSet<usize>> {
        let n = self.node_count();
        let mut adjacency = vec![BTreeSet::new(); n];
        for u in 0..n {
            for &v in &self.successors[u] {
                if u != v {
                    adjacency[u].insert(v);
                    adjacency[v].insert(u);
                }
            }
        }
        adjacency
    }
}
