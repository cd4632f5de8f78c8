//! Source readers: producers of raw-record batches.
//!
//! Three interchangeable readers share one capability: open a source
//! descriptor, then pull batches of at most `batch_size` records until the
//! source is exhausted. Which reader handles a descriptor is decided by
//! [`detect_source_kind`]; [`SourceReader`] dispatches to it.

use std::path::Path;

use reqwest::Url;
use serde_json::Value;

use crate::config::IngestConfig;
use crate::error::{SourceError, SourceResult};
use crate::models::{Batch, RawRecord};

mod file;
mod http;
mod s3;

pub use file::FileReader;
pub use http::HttpReader;
pub use s3::{parse_object_location, ObjectStoreReader};

// ---

/// File extensions treated as local line-delimited JSON files.
pub const FILE_EXTENSIONS: &[&str] = &["json", "jsonl", "txt", "csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Http,
    ObjectStorage,
}

/// Choose the reader kind for a source descriptor.
///
/// - `http://` / `https://` URLs go to the HTTP reader
/// - `s3://bucket/key` goes to the object storage reader
/// - existing files, or paths with a known extension, go to the file reader
///
/// Anything else is a configuration error.
pub fn detect_source_kind(descriptor: &str) -> SourceResult<SourceKind> {
    // ---
    if let Ok(url) = Url::parse(descriptor) {
        match url.scheme() {
            "http" | "https" => return Ok(SourceKind::Http),
            "s3" => return Ok(SourceKind::ObjectStorage),
            _ => {}
        }
    }

    let path = Path::new(descriptor);
    let known_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FILE_EXTENSIONS.contains(&ext));

    if known_extension || path.is_file() {
        return Ok(SourceKind::File);
    }

    Err(SourceError::UnrecognizedSource(descriptor.to_string()))
}

/// A reader for one of the supported source kinds.
#[derive(Debug)]
pub enum SourceReader {
    File(FileReader),
    Http(HttpReader),
    ObjectStore(ObjectStoreReader),
}

impl SourceReader {
    // ---
    /// Select and open the reader for `descriptor`.
    ///
    /// Unrecognized descriptors fail before any I/O is attempted.
    pub async fn open(descriptor: &str, config: &IngestConfig) -> SourceResult<Self> {
        // ---
        let kind = detect_source_kind(descriptor)?;
        tracing::debug!("Source '{}' detected as {:?}", descriptor, kind);

        let reader = match kind {
            SourceKind::File => Self::File(FileReader::open(descriptor, config.batch_size).await?),
            SourceKind::Http => Self::Http(HttpReader::new(descriptor, config)?),
            SourceKind::ObjectStorage => Self::ObjectStore(ObjectStoreReader::new(descriptor, config)?),
        };
        Ok(reader)
    }

    pub fn kind(&self) -> SourceKind {
        // ---
        match self {
            Self::File(_) => SourceKind::File,
            Self::Http(_) => SourceKind::Http,
            Self::ObjectStore(_) => SourceKind::ObjectStorage,
        }
    }

    /// Next batch of records, or `None` once the source is exhausted.
    ///
    /// Returned batches are never empty.
    pub async fn next_batch(&mut self) -> SourceResult<Option<Batch>> {
        // ---
        match self {
            Self::File(reader) => reader.next_batch().await,
            Self::Http(reader) => reader.next_batch().await,
            Self::ObjectStore(reader) => reader.next_batch().await,
        }
    }
}

/// Decode one line of a JSON-lines source.
///
/// Blank lines are skipped quietly; malformed JSON and non-object values are
/// skipped with a warning.
pub(crate) fn decode_record_line(line: &str, origin: &str, line_no: usize) -> Option<RawRecord> {
    // ---
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(record)) => Some(record),
        Ok(other) => {
            tracing::warn!(
                "Skipping non-object JSON value at {}:{}: {}",
                origin,
                line_no,
                other
            );
            None
        }
        Err(e) => {
            tracing::warn!("Error parsing JSON at {}:{}: {} - {}", origin, line_no, e, line);
            None
        }
    }
}
