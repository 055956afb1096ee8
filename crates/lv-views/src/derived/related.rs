//! Countries nearest the selection

use ahash::AHashSet;

use super::Entry;

/// Active entries closest to the selection's focus value, nearest first,
/// never including the selection itself. Ties go by entity name.
pub fn related_set(entries: &[Entry<'_>], active: &AHashSet<&str>, selected: &str, count: usize) -> Vec<String> {
    let Some(anchor) = entries
        .iter()
        .find(|e| e.key == selected)
        .and_then(|e| e.metrics.focus_value)
    else {
        return Vec::new();
    };

    let mut candidates: Vec<(f64, &Entry<'_>)> = entries
        .iter()
        .filter(|e| e.key != selected && active.contains(e.key))
        .filter_map(|e| e.metrics.focus_value.map(|v| ((v - anchor).abs(), e)))
        .collect();
    candidates.sort_by(|(da, a), (db, b)| {
        da.total_cmp(db)
            .then_with(|| a.entity.cmp(b.entity))
            .then_with(|| a.key.cmp(b.key))
    });

    candidates
        .into_iter()
        .take(count)
        .map(|(_, e)| e.key.to_string())
        .collect()
}
