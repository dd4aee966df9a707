//! Input validation: endpoint references, duplicates, unreferenced nodes.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::models::{EdgeRecord, NodeId};

use super::config::EngineConfig;

/// Error record for an edge with one or both endpoints undefined.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeIssue {
    pub edge: EdgeRecord,
    pub issues: Vec<String>,
}

/// A directed (source, target) pair appearing more than once among valid
/// edges, with its total occurrence count.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DuplicateEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub count: usize,
}

/// The validation section of the analysis report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<EdgeIssue>,
    pub warnings: Vec<String>,
    pub duplicate_directed: Vec<DuplicateEdge>,
    pub unreferenced_nodes: Vec<NodeId>,
}

/// Validates the raw node mapping and edge list.
///
/// Returns the validation report and the list of valid edges (both endpoints
/// defined). Edges with an invalid endpoint never count toward duplicate or
/// unreferenced-node analysis. Total on empty input.
pub fn validate(
    nodes: &HashMap<NodeId, Value>,
    edges: &[EdgeRecord],
    config: &EngineConfig,
) -> (ValidationReport, Vec<EdgeRecord>) {
    let mut defined: Vec<&str> = nodes.keys().map(String::as_str).collect();
    defined.sort_unstable();

    let mut report = ValidationReport::default();
    let mut valid_edges = Vec::new();
    let mut referenced: HashSet<&str> = HashSet::new();

    for edge in edges {
        let mut issues = Vec::new();
        if !nodes.contains_key(&edge.source) {
            issues.push(reference_issue("source", &edge.source, &defined, config));
        }
        if !nodes.contains_key(&edge.target) {
            issues.push(reference_issue("target", &edge.target, &defined, config));
        }

        if issues.is_empty() {
            referenced.insert(edge.source.as_str());
            referenced.insert(edge.target.as_str());
            valid_edges.push(edge.clone());
        } else {
            report.errors.push(EdgeIssue {
                edge: edge.clone(),
                issues,
            });
        }
    }

    // Duplicate directed pairs, reported once each in first-seen order.
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    for edge in &valid_edges {
        *counts.entry(edge.directed_key()).or_insert(0) += 1;
    }
    let mut reported: HashSet<(&str, &str)> = HashSet::new();
    for edge in &valid_edges {
        let key = edge.directed_key();
        if counts.get(&key).copied().unwrap_or(0) > 1 && reported.insert(key) {
            report.duplicate_directed.push(DuplicateEdge {
                source: key.0.to_string(),
                target: key.1.to_string(),
                count: counts[&key],
            });
        }
    }

    let mut unreferenced: Vec<NodeId> = defined
        .iter()
        .filter(|id| !referenced.contains(*id))
        .map(|id| id.to_string())
        .collect();
    unreferenced.sort();
    report.unreferenced_nodes = unreferenced;

    (report, valid_edges)
}

fn reference_issue(role: &str, id: &str, defined: &[&str], config: &EngineConfig) -> String {
    let matches = close_matches(id, defined, config.suggestion_cutoff, config.max_suggestions);
    let suggestion = if matches.is_empty() {
        String::new()
    } else {
        format!(" Did you mean: {}?", matches.join(", "))
    };
    format!("Edge {} '{}' not defined.{}", role, id, suggestion)
}

/// Fuzzy matches against defined node ids, best first, capped at `limit`.
pub fn close_matches(query: &str, candidates: &[&str], cutoff: f64, limit: usize) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .filter_map(|candidate| {
            let score = levenshtein_similarity(query, candidate);
            (score >= cutoff).then_some((score, *candidate))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Normalized edit-similarity ratio in [0, 1].
fn levenshtein_similarity(s1: &str, s2: &str) -> f64 {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    if len1 == 0 && len2 == 0 {
        return 1.0;
    }
    if len1 == 0 || len2 == 0 {
        return 0.0;
    }

    let max_len = len1.max(len2);
    let distance = levenshtein_distance(s1, s2);

    1.0 - (distance as f64 / max_len as f64)
}

fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let v1: Vec<char> = s1.chars().collect();
    let v2: Vec<char> = s2.chars().collect();
    let len1 = v1.len();
    let len2 = v2.len();

    let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = usize::from(v1[i - 1] != v2[j - 1]);
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[len1][len2]
}
