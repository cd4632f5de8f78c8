//! Error types for source readers and the pipeline driver.
//!
//! The aggregation core never fails: malformed records are skipped. Everything
//! here originates outside `process_chunk`, either while choosing a reader for
//! a source descriptor (configuration errors, raised before any I/O) or while
//! the chosen reader fetches data (I/O errors, surfaced to the caller).

use thiserror::Error;

/// Convenience alias for results produced by source readers.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot determine ingestion layer for source: {0}")]
    UnrecognizedSource(String),

    #[error("invalid object storage location '{location}': {reason}")]
    InvalidObjectLocation { location: String, reason: String },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("object '{0}' is not valid UTF-8")]
    Encoding(String),
}

impl SourceError {
    /// True for errors raised while selecting a reader, before any ingestion.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedSource(_) | Self::InvalidObjectLocation { .. }
        )
    }
}
