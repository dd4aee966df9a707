//! Pearson correlation between two embedding spaces' distance profiles.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{EmbeddingVector, NodeId};

/// Outcome of the cross-embedding comparison. Serializes either as a
/// bare coefficient or as `{"not_applicable": "<reason>"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Correlation {
    Coefficient(f64),
    NotApplicable { not_applicable: NaReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NaReason {
    InsufficientOverlap,
    NotEnoughData,
    ZeroVariance,
    NotANumber,
}

/// Correlates pairwise distances measured in two embedding spaces over
/// the nodes both spaces cover.
///
/// A degenerate (all-zero) vector has no defined distance to anything, so
/// any pair touching one counts as infinitely far apart; pairs where
/// either side's distance is non-finite are discarded before the
/// coefficient is computed.
pub fn cross_embedding_correlation(
    a: &BTreeMap<NodeId, EmbeddingVector>,
    b: &BTreeMap<NodeId, EmbeddingVector>,
) -> Correlation {
    let common: Vec<&NodeId> = a.keys().filter(|id| b.contains_key(*id)).collect();
    if common.len() < 2 {
        return Correlation::NotApplicable {
            not_applicable: NaReason::InsufficientOverlap,
        };
    }

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (i, id_i) in common.iter().enumerate() {
        for id_j in &common[i + 1..] {
            let da = pair_distance(&a[*id_i], &a[*id_j]);
            let db = pair_distance(&b[*id_i], &b[*id_j]);
            if da.is_finite() && db.is_finite() {
                xs.push(da);
                ys.push(db);
            }
        }
    }

    if xs.len() < 2 {
        return Correlation::NotApplicable {
            not_applicable: NaReason::NotEnoughData,
        };
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let var_x = xs.iter().map(|x| (x - mean_x).powi(2)).sum::<f64>() / n;
    let var_y = ys.iter().map(|y| (y - mean_y).powi(2)).sum::<f64>() / n;
    let std_x = var_x.sqrt();
    let std_y = var_y.sqrt();

    if std_x <= 1e-6 || std_y <= 1e-6 {
        return Correlation::NotApplicable {
            not_applicable: NaReason::ZeroVariance,
        };
    }

    let covariance = xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>()
        / n;
    let coefficient = covariance / (std_x * std_y);

    if coefficient.is_nan() {
        return Correlation::NotApplicable {
            not_applicable: NaReason::NotANumber,
        };
    }

    Correlation::Coefficient(coefficient.clamp(-1.0, 1.0))
}

fn pair_distance(a: &EmbeddingVector, b: &EmbeddingVector) -> f64 {
    if a.is_degenerate() || b.is_degenerate() {
        f64::INFINITY
    } else {
        a.euclidean_distance(b)
    }
}
