//! Distance ranking and context assembly.
//!
//! Records are ranked by squared Euclidean distance to the query vector.
//! The square root is never taken: the value is a monotonic proxy for the
//! true distance, good for ordering but not for reporting.

use crate::error::{DocqaError, Result};
use crate::models::{EmbeddingRecord, RankedMatch};

/// `sum((a[i] - b[i])^2)` over paired components.
///
/// Fails with [`DocqaError::DimensionMismatch`] when the lengths differ.
pub fn squared_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(DocqaError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum())
}

/// Rank `records` by ascending distance to `query`.
///
/// The sort is stable: equal distances keep their insertion order.
pub fn rank(query: &[f64], records: &[EmbeddingRecord]) -> Result<Vec<RankedMatch>> {
    let mut ranked = records
        .iter()
        .map(|record| {
            squared_distance(query, &record.vector).map(|distance| RankedMatch {
                record: record.clone(),
                distance,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(ranked)
}

/// The first `n` matches of `ranked`.
///
/// Fails with [`DocqaError::InsufficientData`] instead of truncating when
/// fewer than `n` matches exist.
pub fn top_n(ranked: &[RankedMatch], n: usize) -> Result<&[RankedMatch]> {
    if n > ranked.len() {
        return Err(DocqaError::InsufficientData {
            requested: n,
            available: ranked.len(),
        });
    }
    Ok(&ranked[..n])
}

/// Concatenate matches into the prompt context, best match first.
pub fn build_context(matches: &[RankedMatch]) -> String {
    let mut context = String::new();
    for m in matches {
        context.push_str(&format!(
            "File: {}\nContent from row {} to row {}:\n{}\n\n",
            m.record.source_id, m.record.range_start, m.record.range_end, m.record.text
        ));
    }
    context
}
