//! Error taxonomy for the pipeline
//!
//! Only configuration and precondition failures are errors. Per-record data
//! quality problems are logged and skipped, and empty inputs produce empty
//! outputs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoError {
    /// Invalid setting such as a non-positive timeout or an unparseable top_k
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Aggregation requested over a column the input does not carry
    #[error("column not found in input: {0}")]
    MissingColumn(String),

    /// Event timestamp missing or not anchored to an explicit offset
    #[error("invalid event timestamp: {0}")]
    Timestamp(String),
}

pub type Result<T> = std::result::Result<T, RecoError>;
