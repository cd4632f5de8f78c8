//! Object storage reader for JSONL blobs in S3-compatible stores.
//!
//! Descriptors look like `s3://bucket/path/to/object.jsonl`. A custom endpoint
//! (for example a LocalStack container) can be configured, in which case
//! plain HTTP is allowed and requests use path-style addressing.

use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use reqwest::Url;

use super::decode_record_line;
use crate::config::IngestConfig;
use crate::error::{SourceError, SourceResult};
use crate::models::Batch;

// ---

/// Split an `s3://bucket/key` descriptor into bucket and object path.
///
/// The key is percent-decoded once, so `s3://b/my%20file.jsonl` and
/// `s3://b/my file.jsonl` name the same object.
pub fn parse_object_location(descriptor: &str) -> SourceResult<(String, ObjectPath)> {
    // ---
    let invalid = |reason: &str| SourceError::InvalidObjectLocation {
        location: descriptor.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(descriptor).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "s3" {
        return Err(invalid("expected an s3:// URL"));
    }

    let bucket = url.host_str().unwrap_or_default();
    if bucket.is_empty() {
        return Err(invalid("missing bucket name"));
    }
    let key = ObjectPath::from_url_path(url.path()).map_err(|e| invalid(&e.to_string()))?;
    if key.as_ref().is_empty() {
        return Err(invalid("missing object key"));
    }

    Ok((bucket.to_string(), key))
}

#[derive(Debug)]
pub struct ObjectStoreReader {
    location: String,
    store: AmazonS3,
    key: ObjectPath,
    batch_size: usize,
    lines: Option<std::vec::IntoIter<String>>,
    line_no: usize,
}

impl ObjectStoreReader {
    // ---
    /// Configure a reader for `descriptor`. The object is fetched on the
    /// first call to [`next_batch`](Self::next_batch).
    pub fn new(descriptor: &str, config: &IngestConfig) -> SourceResult<Self> {
        // ---
        let (bucket, key) = parse_object_location(descriptor)?;

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&bucket)
            .with_region(&config.s3_region)
            .with_access_key_id(&config.s3_access_key_id)
            .with_secret_access_key(&config.s3_secret_access_key);
        if let Some(endpoint) = &config.s3_endpoint {
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }

        Ok(Self {
            location: descriptor.to_string(),
            store: builder.build()?,
            key,
            batch_size: config.batch_size.max(1),
            lines: None,
            line_no: 0,
        })
    }

    pub async fn next_batch(&mut self) -> SourceResult<Option<Batch>> {
        // ---
        if self.lines.is_none() {
            self.lines = Some(self.fetch_lines().await?.into_iter());
        }
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        let mut batch = Batch::new();
        while batch.len() < self.batch_size {
            let Some(line) = lines.next() else {
                break;
            };
            self.line_no += 1;

            if let Some(record) = decode_record_line(&line, &self.location, self.line_no) {
                batch.push(record);
            }
        }

        Ok((!batch.is_empty()).then_some(batch))
    }

    async fn fetch_lines(&self) -> SourceResult<Vec<String>> {
        // ---
        tracing::debug!("Fetching object {}", self.location);

        let bytes = self.store.get(&self.key).await?.bytes().await?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| SourceError::Encoding(self.location.clone()))?;

        tracing::info!(
            "Fetched {} bytes from {}",
            text.len(),
            self.location
        );
        Ok(text.lines().map(str::to_string).collect())
    }
}
