//! Immutable index over the loaded dataset

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use ahash::AHashMap;
use indexmap::IndexMap;
use tracing::info;

use lv_core::{StateBounds, ValueDomain, YearAxis};

use crate::sources::{read_regions, read_series, SeriesRow};
use crate::{CountrySeries, FeedConfig, LoadError, RegionMap};

/// Countries keyed by upper-cased code, iterated in entity name order, plus
/// the year axis and each country's region.
#[derive(Debug, Clone, Default)]
pub struct DataIndex {
    countries: IndexMap<String, CountrySeries>,
    regions: AHashMap<String, String>,
    names: AHashMap<String, String>,
    axis: YearAxis,
}

impl DataIndex {
    /// Load both feeds. Fails only when a feed cannot be read at all.
    pub fn load<S: Read, R: Read>(series: S, regions: R, config: &FeedConfig) -> Result<Self, LoadError> {
        let rows = read_series(series, config)?;
        let regions = read_regions(regions, config)?;
        Ok(Self::from_rows(rows, &regions))
    }

    /// Load both feeds from files
    pub fn load_paths(
        series_path: impl AsRef<Path>,
        region_path: impl AsRef<Path>,
        config: &FeedConfig,
    ) -> Result<Self, LoadError> {
        let series = BufReader::new(File::open(series_path.as_ref())?);
        let regions = BufReader::new(File::open(region_path.as_ref())?);
        Self::load(series, regions, config)
    }

    fn from_rows(rows: Vec<SeriesRow>, regions: &RegionMap) -> Self {
        let mut grouped: BTreeMap<String, (String, Vec<(i32, f64)>)> = BTreeMap::new();
        for row in rows {
            let entry = grouped.entry(row.code).or_insert_with(|| (row.entity, Vec::new()));
            entry.1.push((row.year, row.value));
        }
        let series = grouped
            .into_iter()
            .map(|(code, (entity, points))| CountrySeries::new(entity, code, points));
        Self::from_parts(series, regions)
    }

    /// Build an index from already parsed series. Series without any point
    /// are skipped; a repeated code keeps the first series.
    pub fn from_parts(series: impl IntoIterator<Item = CountrySeries>, regions: &RegionMap) -> Self {
        let mut all: Vec<CountrySeries> = series.into_iter().filter(|s| !s.is_empty()).collect();
        all.sort_by(|a, b| a.entity.cmp(&b.entity).then_with(|| a.code.cmp(&b.code)));

        let mut index = DataIndex::default();
        let mut years = Vec::new();
        for mut country in all {
            country.code = country.code.trim().to_ascii_uppercase();
            if index.countries.contains_key(&country.code) {
                continue;
            }
            years.extend(country.points().iter().map(|&(year, _)| year));
            index
                .regions
                .insert(country.code.clone(), regions.region_of(&country.code, &country.entity).to_string());
            index.names.insert(country.entity.to_lowercase(), country.code.clone());
            index.countries.insert(country.code.clone(), country);
        }
        index.axis = YearAxis::new(years);

        info!(
            "Indexed {} countries over {} years",
            index.countries.len(),
            index.axis.len()
        );
        index
    }

    /// Canonical key for a code or an entity name, matched case-insensitively
    pub fn resolve_key(&self, key: &str) -> Option<&str> {
        let code = key.trim().to_ascii_uppercase();
        if let Some((key, _)) = self.countries.get_key_value(&code) {
            return Some(key.as_str());
        }
        self.names.get(&key.trim().to_lowercase()).map(String::as_str)
    }

    pub fn country_by_key(&self, key: &str) -> Option<&CountrySeries> {
        self.resolve_key(key).and_then(|k| self.countries.get(k))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.resolve_key(key).is_some()
    }

    pub fn years(&self) -> &YearAxis {
        &self.axis
    }

    /// Region label of a country; unknown keys and unclassified countries
    /// are `"Unknown"`
    pub fn region_of(&self, key: &str) -> &str {
        self.resolve_key(key)
            .and_then(|k| self.regions.get(k))
            .map(String::as_str)
            .unwrap_or(crate::UNKNOWN_REGION)
    }

    /// Every region label some country carries
    pub fn regions(&self) -> BTreeSet<String> {
        self.regions.values().cloned().collect()
    }

    /// Countries in entity name order
    pub fn countries(&self) -> impl Iterator<Item = &CountrySeries> {
        self.countries.values()
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// What the interaction state needs to keep its invariants
    pub fn bounds(&self, domain: ValueDomain) -> StateBounds {
        StateBounds {
            axis: self.axis.clone(),
            domain,
            regions: self.regions(),
        }
    }
}
