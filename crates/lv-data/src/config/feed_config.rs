//! Column layout of the two input feeds

use serde::{Deserialize, Serialize};

use super::missing_values::MissingValues;

/// Where to find things in the time-series and region feeds. Column names
/// are matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub entity_column: String,
    pub code_column: String,
    pub year_column: String,

    /// Value column of the time-series feed. When unset, the first column
    /// that is not entity, code or year is used.
    pub value_column: Option<String>,

    /// Region label column of the region feed. When unset, the last column
    /// that is not entity, code or year is used.
    pub region_column: Option<String>,

    /// Codes with these prefixes name aggregates (continents, income
    /// groups), not countries
    pub aggregate_prefixes: Vec<String>,

    pub missing: MissingValues,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            entity_column: "Entity".to_string(),
            code_column: "Code".to_string(),
            year_column: "Year".to_string(),
            value_column: None,
            region_column: None,
            aggregate_prefixes: vec!["OWID_".to_string()],
            missing: MissingValues::default(),
        }
    }
}

impl FeedConfig {
    /// Normalized country code, or `None` for blank and aggregate codes
    pub fn country_code(&self, raw: Option<&str>) -> Option<String> {
        let code = self.missing.present(raw)?.to_ascii_uppercase();
        let is_aggregate = self
            .aggregate_prefixes
            .iter()
            .any(|prefix| code.starts_with(&prefix.to_ascii_uppercase()));
        if is_aggregate {
            None
        } else {
            Some(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code() {
        let config = FeedConfig::default();
        assert_eq!(config.country_code(Some(" nor ")), Some("NOR".to_string()));
        assert_eq!(config.country_code(Some("OWID_WRL")), None);
        assert_eq!(config.country_code(Some("owid_eur")), None);
        assert_eq!(config.country_code(Some("")), None);
        assert_eq!(config.country_code(None), None);
    }
}
