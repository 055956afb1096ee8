//! Per-country metrics over the time window

use ahash::AHashMap;
use serde::Serialize;

use lv_core::{SortMode, YearWindow};
use lv_data::{CountrySeries, DataIndex};

/// Metrics of one country for a focus year and window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    /// Value at the focus year
    pub focus_value: Option<f64>,
    /// Last in-window value minus the first
    pub growth: Option<f64>,
    /// Population standard deviation of the in-window values
    pub volatility: Option<f64>,
}

impl Metrics {
    pub fn compute(series: &CountrySeries, focus_year: i32, window: &YearWindow) -> Self {
        let points = series.points_in(window);
        let growth = match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some(last.1 - first.1),
            _ => None,
        };
        let values: Vec<f64> = points.iter().map(|&(_, v)| v).collect();
        Self {
            focus_value: series.value_at(focus_year),
            growth,
            volatility: population_std_dev(&values),
        }
    }

    /// The metric a sort mode orders by
    pub fn get(&self, mode: SortMode) -> Option<f64> {
        match mode {
            SortMode::Value => self.focus_value,
            SortMode::Growth => self.growth,
            SortMode::Volatility => self.volatility,
        }
    }
}

/// Population standard deviation, `None` for no values
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Metrics of every country, recomputed only when the focus year or the
/// window changes
#[derive(Debug, Default)]
pub struct MetricsCache {
    key: Option<(i32, YearWindow)>,
    metrics: AHashMap<String, Metrics>,
    misses: u64,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, index: &DataIndex, focus_year: i32, window: YearWindow) -> &AHashMap<String, Metrics> {
        if self.key != Some((focus_year, window)) {
            self.metrics = index
                .countries()
                .map(|series| (series.key().to_string(), Metrics::compute(series, focus_year, &window)))
                .collect();
            self.key = Some((focus_year, window));
            self.misses += 1;
        }
        &self.metrics
    }

    /// How many times the metrics were computed from scratch
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.metrics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lv_data::RegionMap;

    fn series() -> CountrySeries {
        CountrySeries::new("Norway", "NOR", [(1990, 2.0), (1995, 4.0), (2000, 4.0), (2005, 6.0)])
    }

    #[test]
    fn test_compute() {
        let metrics = Metrics::compute(&series(), 2000, &YearWindow::new(1990, 2000));
        assert_eq!(metrics.focus_value, Some(4.0));
        assert_eq!(metrics.growth, Some(2.0));
        // values 2, 4, 4: mean 10/3
        assert_relative_eq!(metrics.volatility.unwrap(), (8.0f64 / 9.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_single_point_and_empty_window() {
        let metrics = Metrics::compute(&series(), 2005, &YearWindow::new(2005, 2005));
        assert_eq!(metrics.growth, Some(0.0));
        assert_eq!(metrics.volatility, Some(0.0));

        let metrics = Metrics::compute(&series(), 2010, &YearWindow::new(2006, 2010));
        assert_eq!(metrics, Metrics::default());
    }

    #[test]
    fn test_get_by_sort_mode() {
        let metrics = Metrics {
            focus_value: Some(1.0),
            growth: Some(2.0),
            volatility: None,
        };
        assert_eq!(metrics.get(SortMode::Value), Some(1.0));
        assert_eq!(metrics.get(SortMode::Growth), Some(2.0));
        assert_eq!(metrics.get(SortMode::Volatility), None);
    }

    #[test]
    fn test_cache_recomputes_on_window_change_only() {
        let index = DataIndex::from_parts([series()], &RegionMap::new());
        let mut cache = MetricsCache::new();
        let window = YearWindow::new(1990, 2005);
        cache.get(&index, 2005, window);
        cache.get(&index, 2005, window);
        assert_eq!(cache.misses(), 1);
        let metrics = cache.get(&index, 2000, window);
        assert_eq!(metrics["NOR"].focus_value, Some(4.0));
        assert_eq!(cache.misses(), 2);
    }
}
