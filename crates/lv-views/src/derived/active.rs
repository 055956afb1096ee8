//! Filter pass producing the active set

use lv_core::InteractionState;

use super::Entry;

/// A country is active when its focus value is defined and inside the value
/// range, its name starts with the prefix (ignoring case), and its region is
/// enabled.
pub fn is_active(entry: &Entry<'_>, state: &InteractionState, prefix_lower: &str) -> bool {
    let Some(value) = entry.metrics.focus_value else {
        return false;
    };
    value >= state.value_min()
        && value <= state.value_max()
        && entry.entity.to_lowercase().starts_with(prefix_lower)
        && state.regions_enabled().contains(entry.region)
}

/// Keys of the active entries, in entry order
pub fn active_set(entries: &[Entry<'_>], state: &InteractionState) -> Vec<String> {
    let prefix = state.name_prefix().to_lowercase();
    entries
        .iter()
        .filter(|entry| is_active(entry, state, &prefix))
        .map(|entry| entry.key.to_string())
        .collect()
}
