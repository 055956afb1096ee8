//! Feed configuration

pub mod feed_config;
pub mod missing_values;

pub use feed_config::*;
pub use missing_values::*;
