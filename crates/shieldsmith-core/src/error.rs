use shieldsmith_cache::CacheError;
use thiserror::Error;

/// All the ways a badge run can go wrong
///
/// Most of these never stop a run: the reconciler logs them and carries on.
/// Only a failed aggregation with nothing usable to report is fatal.
#[derive(Error, Debug)]
pub enum Error {
    /// The thing definitely does not exist. Safe to remember.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limits, 5xx, dropped connections. Never cached.
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Cache is corrupt: {0}")]
    CorruptCache(String),

    #[error("Could not persist cache: {0}")]
    WriteFailure(String),

    #[error("Repository host unavailable: {0}")]
    HostUnavailable(String),

    #[error("Aggregation failed: {0}")]
    AggregationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<CacheError> for Error {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Corrupt { .. } => Error::CorruptCache(err.to_string()),
            CacheError::WriteFailure { .. } => Error::WriteFailure(err.to_string()),
            CacheError::Serialize(e) => Error::SerializationError(e),
            CacheError::Io(e) => Error::IoError(e),
        }
    }
}
