//! Dataset loading and indexing for the linked views
//!
//! Reads the time-series feed and the region classification feed, drops
//! malformed rows, and exposes the result as an immutable [`DataIndex`].

pub mod config;
pub mod index;
pub mod regions;
pub mod series;
pub mod sources;

use thiserror::Error;

// Re-exports
pub use config::{FeedConfig, MissingValues};
pub use index::DataIndex;
pub use regions::{RegionMap, UNKNOWN_REGION};
pub use series::CountrySeries;

/// A feed that could not be read at all. Bad rows never produce this; they
/// are dropped while reading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("{feed} feed has no '{column}' column")]
    MissingColumn { feed: &'static str, column: String },

    #[error("{feed} feed has no value column")]
    NoValueColumn { feed: &'static str },
}

impl From<csv::Error> for LoadError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => LoadError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => LoadError::Csv(error.to_string()),
        }
    }
}
