//! Region classification feed: `(code or entity) -> region label`

use std::io::Read;

use tracing::{debug, info};

use super::{reader, Columns};
use crate::{FeedConfig, LoadError, RegionMap};

const FEED: &str = "region";

/// Read the region classification. Either a code or an entity column must
/// exist. Rows without a label, or with neither a code nor a name, are
/// dropped.
pub fn read_regions<R: Read>(input: R, config: &FeedConfig) -> Result<RegionMap, LoadError> {
    let mut csv_reader = reader(input);
    let columns = Columns::new(csv_reader.headers()?);

    let code_idx = columns.find(&config.code_column);
    let entity_idx = columns.find(&config.entity_column);
    if code_idx.is_none() && entity_idx.is_none() {
        return Err(LoadError::MissingColumn {
            feed: FEED,
            column: config.code_column.clone(),
        });
    }
    let year_idx = columns.find(&config.year_column);
    let region_idx = match &config.region_column {
        Some(name) => columns.find(name).ok_or_else(|| LoadError::MissingColumn {
            feed: FEED,
            column: name.clone(),
        })?,
        None => (0..columns.len())
            .rev()
            .find(|idx| ![code_idx, entity_idx, year_idx].contains(&Some(*idx)))
            .ok_or(LoadError::NoValueColumn { feed: FEED })?,
    };

    let missing = &config.missing;
    let mut regions = RegionMap::new();
    let mut dropped = 0usize;
    for record in csv_reader.records() {
        let Ok(record) = record else {
            dropped += 1;
            continue;
        };
        let code = code_idx.and_then(|idx| missing.present(record.get(idx)));
        let name = entity_idx.and_then(|idx| missing.present(record.get(idx)));
        let region = missing.present(record.get(region_idx));
        match region {
            Some(region) if code.is_some() || name.is_some() => regions.insert(code, name, region),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} unusable rows from the {} feed", dropped, FEED);
    }
    info!("Read {} region assignments", regions.len());
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNKNOWN_REGION;

    #[test]
    fn test_reads_regions() {
        let csv = "\
Entity,Code,Year,World region
Norway,NOR,2023,Europe
Kenya,,2023,Africa
Nowhere,XXX,2023,
";
        let regions = read_regions(csv.as_bytes(), &FeedConfig::default()).unwrap();
        assert_eq!(regions.region_of("NOR", "Norway"), "Europe");
        assert_eq!(regions.region_of("KEN", "Kenya"), "Africa");
        assert_eq!(regions.region_of("XXX", "Nowhere"), UNKNOWN_REGION);
    }

    #[test]
    fn test_entity_only_feed() {
        let csv = "Entity,Region\nChad,Africa\n";
        let regions = read_regions(csv.as_bytes(), &FeedConfig::default()).unwrap();
        assert_eq!(regions.region_of("TCD", "chad"), "Africa");
    }

    #[test]
    fn test_requires_a_key_column() {
        let csv = "Country,Region\nChad,Africa\n";
        assert!(matches!(
            read_regions(csv.as_bytes(), &FeedConfig::default()),
            Err(LoadError::MissingColumn { .. })
        ));
    }
}
