//! Tokens that stand for an absent cell

use serde::{Deserialize, Serialize};

/// Cells matching one of these tokens are treated as missing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingValues {
    pub tokens: Vec<String>,

    /// Match tokens regardless of case
    pub ignore_case: bool,
}

impl Default for MissingValues {
    fn default() -> Self {
        Self {
            tokens: ["", "-", "N/A", "NA", "null", "None", "NaN"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            ignore_case: true,
        }
    }
}

impl MissingValues {
    /// Whether a cell counts as missing. Surrounding whitespace is ignored.
    pub fn is_missing(&self, cell: &str) -> bool {
        let cell = cell.trim();
        self.tokens.iter().any(|token| {
            if self.ignore_case {
                cell.eq_ignore_ascii_case(token)
            } else {
                cell == token
            }
        })
    }

    /// The trimmed cell, or `None` when it is missing
    pub fn present<'a>(&self, cell: Option<&'a str>) -> Option<&'a str> {
        cell.map(str::trim).filter(|c| !self.is_missing(c))
    }
}
