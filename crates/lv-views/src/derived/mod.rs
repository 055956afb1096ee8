//! Derived view data
//!
//! Everything the views render is a pure function of the data index and the
//! interaction state. `derive` never fails: inputs are clamped by the state
//! before they get here, and an empty dataset yields empty structures (with
//! the bins still present, all at zero).

pub mod active;
pub mod bins;
pub mod layout;
pub mod metrics;
pub mod rankings;
pub mod related;

pub use bins::Bin;
pub use layout::{LayoutPoint, RelaxParams};
pub use metrics::{Metrics, MetricsCache};
pub use rankings::RankingRow;

use ahash::AHashSet;
use serde::Serialize;

use lv_core::{InteractionState, ModelConfig, Representation};
use lv_data::DataIndex;

use layout::LayoutItem;

/// One country as seen by the derivation passes
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    pub key: &'a str,
    pub entity: &'a str,
    pub region: &'a str,
    pub metrics: Metrics,
}

/// Tooltip data for the hovered country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverDetail {
    pub key: String,
    pub entity: String,
    pub region: String,
    pub metrics: Metrics,
    pub active: bool,
}

/// The five derived structures plus the hover detail
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedModel {
    pub active: Vec<String>,
    pub related: Vec<String>,
    pub rankings: Vec<RankingRow>,
    pub bins: Vec<Bin>,
    pub layout: Vec<LayoutPoint>,
    pub hover: Option<HoverDetail>,
}

impl DerivedModel {
    pub fn is_active(&self, key: &str) -> bool {
        self.active.iter().any(|k| k == key)
    }
}

/// Compute every derived structure for `state`
pub fn derive(
    index: &DataIndex,
    state: &InteractionState,
    config: &ModelConfig,
    cache: &mut MetricsCache,
) -> DerivedModel {
    let metrics = cache.get(index, state.focus_year(), state.window());
    let entries: Vec<Entry<'_>> = index
        .countries()
        .map(|series| Entry {
            key: series.key(),
            entity: &series.entity,
            region: index.region_of(series.key()),
            metrics: metrics.get(series.key()).copied().unwrap_or_default(),
        })
        .collect();

    let active = active::active_set(&entries, state);
    let active_keys: AHashSet<&str> = active.iter().map(String::as_str).collect();
    let domain = config.domain();

    let related = match state.selected_key() {
        Some(selected) if active_keys.contains(selected) => {
            related::related_set(&entries, &active_keys, selected, config.related_count)
        }
        _ => Vec::new(),
    };

    let rankings = rankings::rankings(&entries, &active_keys, state.sort_mode(), config.ranking_limit);
    let bins = bins::bins(&entries, &active_keys, state.show_context(), &domain, config.bin_count);

    let items: Vec<LayoutItem<'_>> = entries
        .iter()
        .filter_map(|entry| {
            let value = entry.metrics.focus_value?;
            let is_active = active_keys.contains(entry.key);
            (is_active || state.show_context()).then_some(LayoutItem {
                key: entry.key,
                value,
                growth: entry.metrics.growth,
                active: is_active,
            })
        })
        .collect();
    let detail = state.detail_level().index();
    let layout = match state.representation() {
        Representation::Distribution => layout::swarm_layout(&items, &domain, &config.layout, detail),
        Representation::Scatter => layout::scatter_layout(&items, &domain, &config.layout, detail),
    };

    let hover = state.hovered_key().and_then(|key| {
        entries.iter().find(|e| e.key == key).map(|entry| HoverDetail {
            key: entry.key.to_string(),
            entity: entry.entity.to_string(),
            region: entry.region.to_string(),
            metrics: entry.metrics,
            active: active_keys.contains(entry.key),
        })
    });

    DerivedModel {
        active,
        related,
        rankings,
        bins,
        layout,
        hover,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv_core::{FilterSettings, SortMode, StateBounds, ValueDomain};
    use lv_data::{CountrySeries, RegionMap};

    /// A(10) B(12) C(50) D(11) at the focus year 2000
    fn index() -> DataIndex {
        let mut regions = RegionMap::new();
        regions.insert(Some("AAA"), None, "North");
        regions.insert(Some("BBB"), None, "North");
        regions.insert(Some("CCC"), None, "South");
        regions.insert(Some("DDD"), None, "South");
        DataIndex::from_parts(
            [
                CountrySeries::new("Alpha", "AAA", [(1990, 4.0), (2000, 10.0)]),
                CountrySeries::new("Bravo", "BBB", [(1990, 12.0), (2000, 12.0)]),
                CountrySeries::new("Charlie", "CCC", [(1990, 20.0), (2000, 50.0)]),
                CountrySeries::new("Delta", "DDD", [(1990, 13.0), (2000, 11.0)]),
                CountrySeries::new("Echo", "EEE", [(1990, 7.0)]),
            ],
            &regions,
        )
    }

    fn setup() -> (DataIndex, StateBounds, InteractionState) {
        let index = index();
        let bounds = index.bounds(ValueDomain::default());
        let state = InteractionState::new(&bounds);
        (index, bounds, state)
    }

    fn config(related_count: usize) -> ModelConfig {
        ModelConfig {
            related_count,
            ..ModelConfig::default()
        }
    }

    fn run(index: &DataIndex, state: &InteractionState, config: &ModelConfig) -> DerivedModel {
        derive(index, state, config, &mut MetricsCache::new())
    }

    #[test]
    fn test_active_set_excludes_undefined_focus() {
        let (index, _, state) = setup();
        let model = run(&index, &state, &config(5));
        assert_eq!(model.active, vec!["AAA", "BBB", "CCC", "DDD"]);
    }

    #[test]
    fn test_related_closest_first() {
        let (index, _, mut state) = setup();
        state.toggle_selection("AAA");
        let model = run(&index, &state, &config(2));
        assert_eq!(model.related, vec!["DDD", "BBB"]);
    }

    #[test]
    fn test_related_respects_filters() {
        let (index, bounds, mut state) = setup();
        state.toggle_selection("AAA");
        let mut filter = state.filter();
        filter.regions_enabled.remove("South");
        state.set_filter(filter, &bounds);
        let model = run(&index, &state, &config(5));
        assert_eq!(model.related, vec!["BBB"]);
    }

    #[test]
    fn test_filters() {
        let (index, bounds, mut state) = setup();
        state.set_filter(
            FilterSettings {
                value_min: 10.5,
                value_max: 60.0,
                name_prefix: "c".into(),
                regions_enabled: bounds.regions.clone(),
                show_context: false,
            },
            &bounds,
        );
        let model = run(&index, &state, &config(5));
        assert_eq!(model.active, vec!["CCC"]);
        assert_eq!(model.layout.len(), 1);
        assert!(model.layout.iter().all(|p| p.active));
    }

    #[test]
    fn test_rankings_by_growth() {
        let (index, _, mut state) = setup();
        state.set_sort_mode(SortMode::Growth);
        let model = run(&index, &state, &config(5));
        let order: Vec<_> = model.rankings.iter().map(|r| r.key.as_str()).collect();
        // growth: C 30, A 6, B 0, D -2; E has no focus value
        assert_eq!(order, vec!["CCC", "AAA", "BBB", "DDD"]);
        assert_eq!(model.rankings[0].rank, 1);
        assert_eq!(model.rankings[0].metric, Some(30.0));
    }

    #[test]
    fn test_rankings_tie_break_and_limit() {
        let index = DataIndex::from_parts(
            [
                CountrySeries::new("Zulu", "ZZZ", [(2000, 5.0)]),
                CountrySeries::new("Kilo", "KKK", [(2000, 5.0)]),
                CountrySeries::new("Mike", "MMM", [(2000, 9.0)]),
            ],
            &RegionMap::new(),
        );
        let bounds = index.bounds(ValueDomain::default());
        let state = InteractionState::new(&bounds);
        let config = ModelConfig {
            ranking_limit: 2,
            ..ModelConfig::default()
        };
        let model = run(&index, &state, &config);
        let order: Vec<_> = model.rankings.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(order, vec!["MMM", "KKK"]);
    }

    #[test]
    fn test_bins_count_every_defined_value() {
        let (index, bounds, mut state) = setup();
        let mut filter = state.filter();
        filter.name_prefix = "zzz".into();
        filter.show_context = false;
        state.set_filter(filter, &bounds);
        let model = run(&index, &state, &config(5));
        assert_eq!(model.bins.len(), 20);
        assert_eq!(model.bins.iter().map(|b| b.total_count).sum::<usize>(), 4);
        assert_eq!(model.bins.iter().map(|b| b.active_count).sum::<usize>(), 0);
        assert!(model.bins.iter().all(|b| b.members.is_empty()));
        // 50 sits at the start of bin 10
        assert_eq!(model.bins[10].total_count, 1);
    }

    #[test]
    fn test_context_members() {
        let (index, bounds, mut state) = setup();
        let mut filter = state.filter();
        filter.name_prefix = "a".into();
        state.set_filter(filter, &bounds);
        let model = run(&index, &state, &config(5));
        let members: usize = model.bins.iter().map(|b| b.members.len()).sum();
        assert_eq!(members, 4);
        assert_eq!(model.layout.len(), 4);
        assert_eq!(model.layout.iter().filter(|p| p.active).count(), 1);
    }

    #[test]
    fn test_empty_dataset() {
        let index = DataIndex::default();
        let bounds = index.bounds(ValueDomain::default());
        let state = InteractionState::new(&bounds);
        let model = run(&index, &state, &config(5));
        assert!(model.active.is_empty());
        assert!(model.rankings.is_empty());
        assert!(model.layout.is_empty());
        assert_eq!(model.bins.len(), 20);
        assert!(model.bins.iter().all(|b| b.total_count == 0));
    }

    #[test]
    fn test_idempotent() {
        let (index, _, mut state) = setup();
        state.toggle_selection("BBB");
        let config = config(3);
        let mut cache = MetricsCache::new();
        let first = derive(&index, &state, &config, &mut cache);
        let second = derive(&index, &state, &config, &mut cache);
        assert_eq!(first, second);
        assert_eq!(first, run(&index, &state, &config));
    }

    #[test]
    fn test_hover_detail() {
        let (index, _, mut state) = setup();
        state.set_hovered(Some("CCC".into()));
        let model = run(&index, &state, &config(5));
        let hover = model.hover.unwrap();
        assert_eq!(hover.entity, "Charlie");
        assert_eq!(hover.region, "South");
        assert_eq!(hover.metrics.focus_value, Some(50.0));
        assert!(hover.active);
    }
}
