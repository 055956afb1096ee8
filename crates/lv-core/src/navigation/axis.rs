//! Ordered set of the years present in the dataset

use serde::{Deserialize, Serialize};

use super::YearWindow;

/// Sorted, de-duplicated years. Every year the interaction state holds is
/// snapped onto this axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearAxis {
    years: Vec<i32>,
}

impl YearAxis {
    pub fn new(years: impl IntoIterator<Item = i32>) -> Self {
        let mut years: Vec<i32> = years.into_iter().collect();
        years.sort_unstable();
        years.dedup();
        Self { years }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn first(&self) -> Option<i32> {
        self.years.first().copied()
    }

    pub fn last(&self) -> Option<i32> {
        self.years.last().copied()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years.binary_search(&year).is_ok()
    }

    /// Nearest real year. Ties resolve to the earlier year.
    pub fn snap(&self, year: i32) -> Option<i32> {
        match self.years.binary_search(&year) {
            Ok(idx) => Some(self.years[idx]),
            Err(0) => self.first(),
            Err(idx) if idx == self.years.len() => self.last(),
            Err(idx) => {
                let lower = self.years[idx - 1];
                let upper = self.years[idx];
                if year - lower <= upper - year {
                    Some(lower)
                } else {
                    Some(upper)
                }
            }
        }
    }

    /// The window covering every year, or `0..=0` on an empty axis
    pub fn full_window(&self) -> YearWindow {
        YearWindow::new(self.first().unwrap_or(0), self.last().unwrap_or(0))
    }

    /// Order, snap and clamp a requested window onto the axis
    pub fn clamp_window(&self, start: i32, end: i32) -> YearWindow {
        let requested = YearWindow::new(start, end);
        // Snapping is monotone, so the snapped bounds stay ordered
        YearWindow::new(
            self.snap(requested.start).unwrap_or(0),
            self.snap(requested.end).unwrap_or(0),
        )
    }

    /// Snap a year and pull it inside `window`. The window bounds are real
    /// years, so the result always is too.
    pub fn clamp_into(&self, year: i32, window: &YearWindow) -> i32 {
        match self.snap(year) {
            Some(snapped) => window.clamp(snapped),
            None => 0,
        }
    }
}
