//! Similarity heatmap with hierarchical-clustering row order.

use serde::Serialize;
use tracing::warn;

use crate::models::NodeId;

use super::similarity::{similarity_from_distance, EmbeddingSet};

/// Reordered similarity matrix ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapData {
    pub matrix: Vec<Vec<f64>>,
    pub ids: Vec<NodeId>,
    pub labels: Vec<String>,
}

/// Builds the heatmap: pairwise similarities reordered so that
/// average-linkage cluster neighbors sit next to each other.
pub fn build_heatmap(embeddings: &EmbeddingSet, labels: &[String]) -> Result<HeatmapData, String> {
    let n = embeddings.len();
    if n < 2 {
        return Err(format!(
            "heatmap requires at least 2 embedded nodes, got {}",
            n
        ));
    }

    // condensed distances; degenerate pairs come back as +inf
    let mut distances = vec![vec![0.0f64; n]; n];
    let mut max_finite = 0.0f64;
    let mut infinite = 0usize;
    for i in 0..n {
        for j in i + 1..n {
            let d = embeddings.distance(i, j);
            if d.is_finite() {
                max_finite = max_finite.max(d);
            } else {
                infinite += 1;
            }
            distances[i][j] = d;
            distances[j][i] = d;
        }
    }

    if infinite > 0 {
        // substitute a sentinel far beyond every real distance so the
        // linkage still orders the degenerate rows to the outside
        let sentinel = 10.0 * if max_finite > 0.0 { max_finite } else { 1.0 };
        warn!(
            pairs = infinite,
            sentinel, "replacing non-finite heatmap distances"
        );
        for row in &mut distances {
            for value in row.iter_mut() {
                if !value.is_finite() {
                    *value = sentinel;
                }
            }
        }
    }

    let order = average_linkage_leaf_order(&distances);

    let mut matrix = vec![vec![0.0f64; n]; n];
    for (row, &i) in order.iter().enumerate() {
        for (col, &j) in order.iter().enumerate() {
            matrix[row][col] = if i == j {
                1.0
            } else {
                similarity_from_distance(distances[i][j])
            };
        }
    }

    Ok(HeatmapData {
        matrix,
        ids: order.iter().map(|&i| embeddings.ids()[i].clone()).collect(),
        labels: order.iter().map(|&i| labels[i].clone()).collect(),
    })
}

/// Leaf order of an average-linkage agglomerative clustering over the
/// given distance matrix. At every step the closest pair of clusters
/// merges (ties break toward the smallest indexes) and the merged leaf
/// list is the left cluster's leaves followed by the right's.
fn average_linkage_leaf_order(distances: &[Vec<f64>]) -> Vec<usize> {
    let n = distances.len();

    struct Cluster {
        leaves: Vec<usize>,
        active: bool,
    }

    let mut clusters: Vec<Cluster> = (0..n)
        .map(|i| Cluster {
            leaves: vec![i],
            active: true,
        })
        .collect();
    // inter-cluster average distances, updated with the Lance-Williams
    // rule for average linkage
    let mut dist: Vec<Vec<f64>> = distances.to_vec();

    for _ in 1..n {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if !clusters[i].active {
                continue;
            }
            for j in i + 1..n {
                if !clusters[j].active {
                    continue;
                }
                let d = dist[i][j];
                if best.map_or(true, |(_, _, bd)| d < bd) {
                    best = Some((i, j, d));
                }
            }
        }
        let Some((i, j, _)) = best else { break };

        let si = clusters[i].leaves.len() as f64;
        let sj = clusters[j].leaves.len() as f64;
        for k in 0..n {
            if k != i && k != j && clusters[k].active {
                let merged = (si * dist[i][k] + sj * dist[j][k]) / (si + sj);
                dist[i][k] = merged;
                dist[k][i] = merged;
            }
        }

        let right = std::mem::take(&mut clusters[j].leaves);
        clusters[j].active = false;
        clusters[i].leaves.extend(right);
    }

    clusters
        .into_iter()
        .find(|c| c.active)
        .map(|c| c.leaves)
        .unwrap_or_default()
}
