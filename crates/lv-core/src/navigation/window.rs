use serde::{Deserialize, Serialize};

/// An inclusive range of years, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct YearWindow {
    pub start: i32,
    pub end: i32,
}

impl YearWindow {
    /// Create a window, ordering the bounds if they arrive reversed
    pub fn new(start: i32, end: i32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Pull a year inside the window
    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.start, self.end)
    }
}
