//! Region classification

use ahash::AHashMap;

/// Label of countries the region feed does not classify
pub const UNKNOWN_REGION: &str = "Unknown";

/// Country code or name to region label. Codes are matched upper-cased,
/// names lower-cased.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    by_code: AHashMap<String, String>,
    by_name: AHashMap<String, String>,
    countries: usize,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: Option<&str>, name: Option<&str>, region: &str) {
        let new_code = code.map(|code| {
            self.by_code
                .insert(code.trim().to_ascii_uppercase(), region.to_string())
                .is_none()
        });
        let new_name = name.map(|name| {
            self.by_name
                .insert(name.trim().to_lowercase(), region.to_string())
                .is_none()
        });
        // A country is identified by its code when it has one
        if new_code.or(new_name) == Some(true) {
            self.countries += 1;
        }
    }

    /// Region of a country, by code first and name second
    pub fn region_of(&self, code: &str, name: &str) -> &str {
        self.by_code
            .get(&code.trim().to_ascii_uppercase())
            .or_else(|| self.by_name.get(&name.trim().to_lowercase()))
            .map(String::as_str)
            .unwrap_or(UNKNOWN_REGION)
    }

    /// Number of distinct countries classified
    pub fn len(&self) -> usize {
        self.countries
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty() && self.by_name.is_empty()
    }
}
