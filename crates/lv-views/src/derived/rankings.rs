//! Ranking panel rows

use std::cmp::Ordering;

use ahash::AHashSet;
use serde::Serialize;

use lv_core::SortMode;

use super::{Entry, Metrics};

/// One row of the ranking panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    /// 1-based position
    pub rank: usize,
    pub key: String,
    pub entity: String,
    pub region: String,
    /// The metric selected by the sort mode
    pub metric: Option<f64>,
    pub metrics: Metrics,
    /// Whether the row passes the current filters
    pub active: bool,
}

/// Rank every entry with a defined focus value by the sort metric,
/// descending. Undefined metrics go last; ties go by entity name.
pub fn rankings(entries: &[Entry<'_>], active: &AHashSet<&str>, mode: SortMode, limit: usize) -> Vec<RankingRow> {
    let mut candidates: Vec<&Entry<'_>> = entries.iter().filter(|e| e.metrics.focus_value.is_some()).collect();
    candidates.sort_by(|a, b| {
        compare_desc(a.metrics.get(mode), b.metrics.get(mode))
            .then_with(|| a.entity.cmp(b.entity))
            .then_with(|| a.key.cmp(b.key))
    });

    candidates
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, entry)| RankingRow {
            rank: idx + 1,
            key: entry.key.to_string(),
            entity: entry.entity.to_string(),
            region: entry.region.to_string(),
            metric: entry.metrics.get(mode),
            metrics: entry.metrics,
            active: active.contains(entry.key),
        })
        .collect()
}

fn compare_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
