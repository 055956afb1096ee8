//! Time-series feed: one row per `(code, entity, year) -> value`

use std::io::Read;

use tracing::{debug, info};

use super::{reader, Columns};
use crate::{FeedConfig, LoadError};

const FEED: &str = "time-series";

/// One well-formed observation
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub code: String,
    pub entity: String,
    pub year: i32,
    pub value: f64,
}

/// Read every well-formed row. Rows with a missing or unparsable year or
/// value, an aggregate or blank code, or broken encoding are dropped.
pub fn read_series<R: Read>(input: R, config: &FeedConfig) -> Result<Vec<SeriesRow>, LoadError> {
    let mut csv_reader = reader(input);
    let columns = Columns::new(csv_reader.headers()?);

    let entity_idx = require(&columns, &config.entity_column)?;
    let code_idx = require(&columns, &config.code_column)?;
    let year_idx = require(&columns, &config.year_column)?;
    let value_idx = match &config.value_column {
        Some(name) => require(&columns, name)?,
        None => (0..columns.len())
            .find(|idx| ![entity_idx, code_idx, year_idx].contains(idx))
            .ok_or(LoadError::NoValueColumn { feed: FEED })?,
    };

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in csv_reader.records() {
        let Ok(record) = record else {
            dropped += 1;
            continue;
        };
        let missing = &config.missing;
        let row = (|| {
            let code = config.country_code(record.get(code_idx))?;
            let entity = missing.present(record.get(entity_idx))?.to_string();
            let year = missing.present(record.get(year_idx))?.parse::<i32>().ok()?;
            let value = missing.present(record.get(value_idx))?.parse::<f64>().ok()?;
            value.is_finite().then_some(SeriesRow {
                code,
                entity,
                year,
                value,
            })
        })();
        match row {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} malformed or aggregate rows from the {} feed", dropped, FEED);
    }
    info!("Read {} rows from the {} feed", rows.len(), FEED);
    Ok(rows)
}

fn require(columns: &Columns, name: &str) -> Result<usize, LoadError> {
    columns.find(name).ok_or_else(|| LoadError::MissingColumn {
        feed: FEED,
        column: name.to_string(),
    })
}
