//! API request/response types and payload normalization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::AnalysisInput;
use crate::models::{EdgeRecord, NodeId};

/// Raw analysis request. Both fields accept flexible shapes, which
/// normalization straightens out.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub nodes: Option<Value>,
    #[serde(default)]
    pub edges: Option<Value>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub embedding_provider: String,
    pub version: String,
}

/// Normalizes the raw payload into an [`AnalysisInput`].
///
/// `nodes` may be an object keyed by id or a list of objects carrying an
/// `id` (or `name`) field. `edges` must be a list; each entry is an object
/// with `source`/`target` (aliases `from`/`to`) or a `[source, target]`
/// pair, with an optional `label`. Numeric ids are stringified. Entries
/// that cannot be normalized are skipped with a warning.
pub fn parse_graph_payload(request: AnalyzeRequest) -> Result<AnalysisInput, String> {
    if request.nodes.is_none() && request.edges.is_none() {
        return Err("Missing 'nodes' or 'edges' in request body".to_string());
    }

    let mut warnings = Vec::new();
    let nodes = parse_nodes(request.nodes, &mut warnings)?;
    let edges = parse_edges(request.edges, &mut warnings)?;

    Ok(AnalysisInput {
        nodes,
        edges,
        warnings,
    })
}

fn parse_nodes(
    raw: Option<Value>,
    warnings: &mut Vec<String>,
) -> Result<HashMap<NodeId, Value>, String> {
    let mut nodes = HashMap::new();
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (id, attrs) in map {
                nodes.insert(id, attrs);
            }
        }
        Some(Value::Array(items)) => {
            for (position, item) in items.into_iter().enumerate() {
                let Value::Object(ref obj) = item else {
                    warnings.push(format!(
                        "Node entry {} is not an object, skipping.",
                        position
                    ));
                    continue;
                };
                let id = obj.get("id").or_else(|| obj.get("name")).and_then(coerce_id);
                match id {
                    Some(id) => {
                        nodes.insert(id, item);
                    }
                    None => warnings.push(format!(
                        "Node entry {} has no usable 'id' or 'name', skipping.",
                        position
                    )),
                }
            }
        }
        Some(_) => return Err("'nodes' must be an object or a list".to_string()),
    }
    Ok(nodes)
}

fn parse_edges(
    raw: Option<Value>,
    warnings: &mut Vec<String>,
) -> Result<Vec<EdgeRecord>, String> {
    let mut edges = Vec::new();
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (position, item) in items.into_iter().enumerate() {
                match normalize_edge(&item) {
                    Some(edge) => edges.push(edge),
                    None => warnings.push(format!(
                        "Edge entry {} is missing a source or target, skipping.",
                        position
                    )),
                }
            }
        }
        Some(_) => return Err("'edges' must be a list".to_string()),
    }
    Ok(edges)
}

fn normalize_edge(item: &Value) -> Option<EdgeRecord> {
    match item {
        Value::Object(obj) => {
            let source = obj.get("source").or_else(|| obj.get("from")).and_then(coerce_id)?;
            let target = obj.get("target").or_else(|| obj.get("to")).and_then(coerce_id)?;
            let edge = EdgeRecord::new(source, target);
            Some(match obj.get("label").and_then(coerce_id) {
                Some(label) => edge.with_label(label),
                None => edge,
            })
        }
        Value::Array(pair) if pair.len() >= 2 => {
            let source = coerce_id(&pair[0])?;
            let target = coerce_id(&pair[1])?;
            let edge = EdgeRecord::new(source, target);
            Some(match pair.get(2).and_then(coerce_id) {
                Some(label) => edge.with_label(label),
                None => edge,
            })
        }
        _ => None,
    }
}

/// Strings pass through, numbers stringify, everything else is unusable.
fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
