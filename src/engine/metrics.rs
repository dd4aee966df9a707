//! Classical graph metrics over the directed graph.
//!
//! Centrality and connectivity computations degrade gracefully: 0/1-node
//! graphs resolve to defined empty values, and a metric that fails (e.g. a
//! power iteration that never converges) is reported as an error value on
//! that metric alone.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;

use crate::models::NodeId;

use super::graph::DirectedGraph;
use super::report::Computed;

const EIGENVECTOR_MAX_ITER: usize = 100;
const EIGENVECTOR_TOL: f64 = 1e-6;

/// The graph-metrics section of the analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct GraphMetrics {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub avg_in_degree: f64,
    pub avg_out_degree: f64,
    pub density: f64,
    pub avg_clustering: f64,
    pub num_self_loops: usize,

    pub degree_centrality: Computed<BTreeMap<NodeId, f64>>,
    pub betweenness_centrality: Computed<BTreeMap<NodeId, f64>>,
    pub closeness_centrality: Computed<BTreeMap<NodeId, f64>>,
    pub eigenvector_centrality: Computed<BTreeMap<NodeId, f64>>,

    pub is_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_components: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest_component_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest_component_avg_shortest_path: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest_component_diameter: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_shortest_path: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter: Option<usize>,
}

/// Computes every metric of the section.
pub fn compute_metrics(graph: &DirectedGraph) -> GraphMetrics {
    let n = graph.node_count();
    let m = graph.edge_count();
    let undirected = graph.undirected_adjacency();

    let (avg_degree, density) = if n > 0 {
        let avg = m as f64 / n as f64;
        let density = if n > 1 {
            m as f64 / (n as f64 * (n - 1) as f64)
        } else {
            0.0
        };
        (avg, density)
    } else {
        (0.0, 0.0)
    };

    let degree_centrality = Computed::Value(degree_centrality(graph));
    let betweenness_centrality = Computed::Value(betweenness_centrality(graph));
    let closeness_centrality = Computed::Value(closeness_centrality(graph));
    let eigenvector_centrality = if n > 1 {
        Computed::from_result(
            eigenvector_centrality(graph)
                .map(|values| index_map(graph, &values)),
        )
    } else {
        Computed::Value(BTreeMap::new())
    };

    let mut metrics = GraphMetrics {
        num_nodes: n,
        num_edges: m,
        avg_in_degree: avg_degree,
        avg_out_degree: avg_degree,
        density,
        avg_clustering: average_clustering(&undirected),
        num_self_loops: graph.self_loop_count(),
        degree_centrality,
        betweenness_centrality,
        closeness_centrality,
        eigenvector_centrality,
        is_connected: true,
        num_components: None,
        largest_component_size: None,
        largest_component_avg_shortest_path: None,
        largest_component_diameter: None,
        avg_shortest_path: None,
        diameter: None,
    };

    let components = connected_components(&undirected);
    if n == 0 {
        metrics.num_components = Some(0);
        metrics.avg_shortest_path = Some(0.0);
        metrics.diameter = Some(0);
    } else if components.len() == 1 {
        let (avg, diameter) = path_lengths(&undirected, &components[0]);
        metrics.avg_shortest_path = Some(avg);
        metrics.diameter = Some(diameter);
    } else {
        metrics.is_connected = false;
        metrics.num_components = Some(components.len());
        if let Some(largest) = components.iter().max_by_key(|c| c.len()) {
            metrics.largest_component_size = Some(largest.len());
            let (avg, diameter) = path_lengths(&undirected, largest);
            metrics.largest_component_avg_shortest_path = Some(avg);
            metrics.largest_component_diameter = Some(diameter);
        }
    }

    metrics
}

fn index_map(graph: &DirectedGraph, values: &[f64]) -> BTreeMap<NodeId, f64> {
    graph
        .ids()
        .iter()
        .zip(values.iter())
        .map(|(id, v)| (id.clone(), *v))
        .collect()
}

/// Total-degree centrality, (in + out) / (n - 1); a lone node scores its
/// raw degree.
fn degree_centrality(graph: &DirectedGraph) -> BTreeMap<NodeId, f64> {
    let n = graph.node_count();
    let factor = if n > 1 { 1.0 / (n - 1) as f64 } else { 1.0 };
    let values: Vec<f64> = (0..n)
        .map(|u| (graph.in_degree(u) + graph.out_degree(u)) as f64 * factor)
        .collect();
    index_map(graph, &values)
}

/// Brandes betweenness on the directed graph, normalized, endpoints
/// excluded. Empty for fewer than 2 nodes.
fn betweenness_centrality(graph: &DirectedGraph) -> BTreeMap<NodeId, f64> {
    let n = graph.node_count();
    if n < 2 {
        return BTreeMap::new();
    }

    let mut centrality = vec![0.0f64; n];
    for s in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![-1i64; n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in graph.successors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for value in &mut centrality {
            *value *= scale;
        }
    }

    index_map(graph, &centrality)
}

/// Closeness over incoming shortest-path distances with the
/// Wasserman-Faust reachability scaling. Empty for fewer than 2 nodes.
fn closeness_centrality(graph: &DirectedGraph) -> BTreeMap<NodeId, f64> {
    let n = graph.node_count();
    if n < 2 {
        return BTreeMap::new();
    }

    // distances measured along predecessors: d(v, u) for all v that reach u
    let incoming: Vec<BTreeSet<usize>> = (0..n).map(|u| graph.predecessors(u).clone()).collect();

    let values: Vec<f64> = (0..n)
        .map(|u| {
            let dist = bfs_distances(&incoming, u);
            let reached: Vec<i64> = dist.iter().copied().filter(|&d| d >= 0).collect();
            let total: i64 = reached.iter().sum();
            if total > 0 {
                let r = reached.len() as f64; // includes u itself at distance 0
                ((r - 1.0) / total as f64) * ((r - 1.0) / (n - 1) as f64)
            } else {
                0.0
            }
        })
        .collect();

    index_map(graph, &values)
}

/// Eigenvector centrality by power iteration on (A^T + I), L2-normalized
/// each round. Fails when the iteration does not converge.
fn eigenvector_centrality(graph: &DirectedGraph) -> Result<Vec<f64>, String> {
    let n = graph.node_count();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut x = vec![1.0 / n as f64; n];
    for _ in 0..EIGENVECTOR_MAX_ITER {
        let xlast = x.clone();
        let mut xnew = xlast.clone();
        for u in 0..n {
            for &v in graph.successors(u) {
                xnew[v] += xlast[u];
            }
        }

        let norm = xnew.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        for value in &mut xnew {
            *value /= norm;
        }

        let diff: f64 = xnew
            .iter()
            .zip(xlast.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        x = xnew;
        if diff < n as f64 * EIGENVECTOR_TOL {
            return Ok(x);
        }
    }

    Err(format!(
        "power iteration failed to converge within {} iterations",
        EIGENVECTOR_MAX_ITER
    ))
}

/// Average clustering coefficient over index-keyed undirected adjacency.
/// Nodes with degree < 2 contribute 0. Also used by the threshold sweep.
pub(crate) fn average_clustering(adjacency: &[BTreeSet<usize>]) -> f64 {
    let n = adjacency.len();
    if n == 0 {
        return 0.0;
    }

    let mut total = 0.0;
    for neighbors in adjacency {
        let k = neighbors.len();
        if k < 2 {
            continue;
        }
        let neighbors: Vec<usize> = neighbors.iter().copied().collect();
        let mut links = 0usize;
        for (i, &a) in neighbors.iter().enumerate() {
            for &b in &neighbors[i + 1..] {
                if adjacency[a].contains(&b) {
                    links += 1;
                }
            }
        }
        total += 2.0 * links as f64 / (k * (k - 1)) as f64;
    }

    total / n as f64
}

/// Connected components of an undirected adjacency, each sorted by index.
pub(crate) fn connected_components(adjacency: &[BTreeSet<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut seen = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if seen[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(u) = queue.pop_front() {
            component.push(u);
            for &v in &adjacency[u] {
                if !seen[v] {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }

    components
}

/// BFS distances from `source`; unreachable nodes get -1.
pub(crate) fn bfs_distances(adjacency: &[BTreeSet<usize>], source: usize) -> Vec<i64> {
    let mut dist = vec![-1i64; adjacency.len()];
    dist[source] = 0;
    let mut queue = VecDeque::from([source]);
    while let Some(u) = queue.pop_front() {
        for &v in &adjacency[u] {
            if dist[v] < 0 {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
        }
    }
    dist
}

/// Average shortest path length and diameter within one connected
/// component. A singleton component resolves to (0, 0).
fn path_lengths(adjacency: &[BTreeSet<usize>], component: &[usize]) -> (f64, usize) {
    let k = component.len();
    if k < 2 {
        return (0.0, 0);
    }

    let mut total = 0i64;
    let mut diameter = 0i64;
    for &u in component {
        let dist = bfs_distances(adjacency, u);
        for &v in component {
            if v != u && dist[v] > 0 {
                total += dist[v];
                diameter = diameter.max(dist[v]);
            }
        }
    }

    let pairs = (k * (k - 1)) as f64;
    (total as f64 / pairs, diameter as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EdgeRecord;
    use serde_json::json;
    use std::collections::HashMap;

    fn build(ids: &[&str], edges: &[(&str, &str)]) -> DirectedGraph {
        let nodes: HashMap<NodeId, serde_json::Value> =
            ids.iter().map(|id| (id.to_string(), json!({}))).collect();
        let edges: Vec<EdgeRecord> = edges
            .iter()
            .map(|(s, t)| EdgeRecord::new(*s, *t))
            .collect();
        DirectedGraph::build(&nodes, &edges).0
    }

    #[test]
    fn test_empty_graph_resolves_to_zeros() {
        let graph = build(&[], &[]);
        let metrics = compute_metrics(&graph);

        assert_eq!(metrics.num_nodes, 0);
        assert_eq!(metrics.num_edges, 0);
        assert_eq!(metrics.avg_in_degree, 0.0);
        assert_eq!(metrics.density, 0.0);
        assert_eq!(metrics.avg_clustering, 0.0);
        assert!(metrics.is_connected);
        assert_eq!(metrics.num_components, Some(0));
        assert_eq!(metrics.avg_shortest_path, Some(0.0));
        assert_eq!(metrics.diameter, Some(0));
        assert_eq!(metrics.degree_centrality.value().map(BTreeMap::len), Some(0));
    }

    #[test]
    fn test_single_node_graph() {
        let graph = build(&["a"], &[]);
        let metrics = compute_metrics(&graph);

        assert!(metrics.is_connected);
        assert_eq!(metrics.avg_shortest_path, Some(0.0));
        assert_eq!(metrics.diameter, Some(0));
        // centralities requiring >= 2 nodes degrade to empty
        assert_eq!(
            metrics.betweenness_centrality.value().map(BTreeMap::len),
            Some(0)
        );
        assert_eq!(
            metrics.closeness_centrality.value().map(BTreeMap::len),
            Some(0)
        );
    }

    #[test]
    fn test_example_path_graph_metrics() {
        // three-node directed path A -> B -> C
        let graph = build(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let metrics = compute_metrics(&graph);

        assert_eq!(metrics.num_nodes, 3);
        assert_eq!(metrics.num_edges, 2);
        assert!((metrics.density - 2.0 / 6.0).abs() < 1e-9);
        assert!((metrics.avg_in_degree - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.num_self_loops, 0);
        assert!(metrics.is_connected);
        // path graph: distances 1,1,2 in both directions over 6 ordered pairs
        assert!((metrics.avg_shortest_path.unwrap() - 8.0 / 6.0).abs() < 1e-9);
        assert_eq!(metrics.diameter, Some(2));
    }

    #[test]
    fn test_degree_centrality_path() {
        let graph = build(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let metrics = compute_metrics(&graph);
        let dc = metrics.degree_centrality.value().unwrap();

        assert!((dc["A"] - 0.5).abs() < 1e-9);
        assert!((dc["B"] - 1.0).abs() < 1e-9);
        assert!((dc["C"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_betweenness_middle_of_path() {
        let graph = build(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let metrics = compute_metrics(&graph);
        let bc = metrics.betweenness_centrality.value().unwrap();

        // B lies on the single A->C shortest path; scale 1/((n-1)(n-2)) = 1/2
        assert!((bc["B"] - 0.5).abs() < 1e-9);
        assert!(bc["A"].abs() < 1e-9);
        assert!(bc["C"].abs() < 1e-9);
    }

    #[test]
    fn test_closeness_incoming_distances() {
        let graph = build(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let metrics = compute_metrics(&graph);
        let cc = metrics.closeness_centrality.value().unwrap();

        // nothing reaches A
        assert!(cc["A"].abs() < 1e-9);
        // only A reaches B at distance 1: (1/1) * (1/2)
        assert!((cc["B"] - 0.5).abs() < 1e-9);
        // A and B reach C with distances 2 and 1: (2/3) * (2/2)
        assert!((cc["C"] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_eigenvector_converges_on_cycle() {
        let graph = build(&["x", "y", "z"], &[("x", "y"), ("y", "z"), ("z", "x")]);
        let metrics = compute_metrics(&graph);
        let ec = metrics.eigenvector_centrality.value().expect("converged");

        // symmetric cycle: all nodes equal, L2-normalized
        let expected = 1.0 / 3.0f64.sqrt();
        for value in ec.values() {
            assert!((value - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_clustering_triangle() {
        let graph = build(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
        );
        let metrics = compute_metrics(&graph);
        // the undirected projection is a triangle: clustering 1 everywhere
        assert!((metrics.avg_clustering - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disconnected_components() {
        let graph = build(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("d", "e")],
        );
        let metrics = compute_metrics(&graph);

        assert!(!metrics.is_connected);
        assert_eq!(metrics.num_components, Some(2));
        assert_eq!(metrics.largest_component_size, Some(3));
        assert_eq!(metrics.largest_component_diameter, Some(2));
        assert!(metrics.avg_shortest_path.is_none());
        assert!(metrics.diameter.is_none());
    }

    #[test]
    fn test_self_loop_counted_not_clustered() {
        let graph = build(&["a", "b"], &[("a", "a"), ("a", "b")]);
        let metrics = compute_metrics(&graph);
        assert_eq!(metrics.num_self_loops, 1);
        assert_eq!(metrics.num_edges, 2);
        assert!(metrics.is_connected);
    }
}
