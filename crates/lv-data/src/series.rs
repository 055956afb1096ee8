//! Per-country time series

use serde::Serialize;

use lv_core::YearWindow;

/// Values of one country, ordered by year. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySeries {
    pub entity: String,
    pub code: String,
    points: Vec<(i32, f64)>,
}

impl CountrySeries {
    /// Build a series. Points are sorted by year; for duplicate years the
    /// last one given wins, and non-finite values are dropped.
    pub fn new(entity: impl Into<String>, code: impl Into<String>, points: impl IntoIterator<Item = (i32, f64)>) -> Self {
        let mut by_year = std::collections::BTreeMap::new();
        for (year, value) in points {
            if value.is_finite() {
                by_year.insert(year, value);
            }
        }
        Self {
            entity: entity.into(),
            code: code.into(),
            points: by_year.into_iter().collect(),
        }
    }

    /// Lookup key of the country
    pub fn key(&self) -> &str {
        &self.code
    }

    pub fn points(&self) -> &[(i32, f64)] {
        &self.points
    }

    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&year, |&(y, _)| y)
            .ok()
            .map(|idx| self.points[idx].1)
    }

    /// Points whose year falls inside `window`
    pub fn points_in(&self, window: &YearWindow) -> &[(i32, f64)] {
        let start = self.points.partition_point(|&(y, _)| y < window.start);
        let end = self.points.partition_point(|&(y, _)| y <= window.end);
        &self.points[start..end.max(start)]
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
