use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The reading store could not serve a read or write.
    #[error("Data fetch failed: {0}")]
    DataFetch(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange { start: DateTime<Utc>, end: DateTime<Utc> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures caused by the backing store, timeouts included.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Error::DataFetch(_) | Error::Timeout { .. })
    }
}
