//! CSV readers for the two input feeds

pub mod region_feed;
pub mod series_feed;

pub use region_feed::read_regions;
pub use series_feed::{read_series, SeriesRow};

use csv::StringRecord;

/// Case-insensitive header lookup
pub(crate) struct Columns {
    names: Vec<String>,
}

impl Columns {
    pub fn new(headers: &StringRecord) -> Self {
        Self {
            names: headers.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        let name = name.trim().to_lowercase();
        self.names.iter().position(|n| *n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

pub(crate) fn reader<R: std::io::Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}
