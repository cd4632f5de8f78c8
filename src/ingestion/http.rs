//! Paginated HTTP API reader.
//!
//! Pages are requested as `GET <source>?page=N` starting at 1. A page body
//! is either a JSON array of records or an object carrying the array under
//! `results`; an empty or missing array ends pagination.

use std::collections::VecDeque;
use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::config::IngestConfig;
use crate::error::{SourceError, SourceResult};
use crate::models::{Batch, RawRecord};

// ---

#[derive(Debug)]
pub struct HttpReader {
    client: Client,
    base_url: Url,
    batch_size: usize,
    max_pages: u32,
    page_count: u32,
    pending: VecDeque<RawRecord>,
    exhausted: bool,
}

impl HttpReader {
    // ---
    /// Build a reader for `source`. No request is sent until the first batch
    /// is pulled.
    pub fn new(source: &str, config: &IngestConfig) -> SourceResult<Self> {
        // ---
        let base_url = Url::parse(source)
            .map_err(|_| SourceError::UnrecognizedSource(source.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|source_err| SourceError::Http {
                url: source.to_string(),
                source: source_err,
            })?;

        Ok(Self {
            client,
            base_url,
            batch_size: config.batch_size.max(1),
            max_pages: config.api_max_pages,
            page_count: 0,
            pending: VecDeque::new(),
            exhausted: false,
        })
    }

    pub async fn next_batch(&mut self) -> SourceResult<Option<Batch>> {
        // ---
        while self.pending.len() < self.batch_size && !self.exhausted {
            self.fetch_next_page().await?;
        }

        if self.pending.is_empty() {
            return Ok(None);
        }
        let take = self.batch_size.min(self.pending.len());
        Ok(Some(self.pending.drain(..take).collect()))
    }

    /// Fetch one page into the pending buffer, marking the reader exhausted
    /// when the API has no more data or the page limit is hit.
    async fn fetch_next_page(&mut self) -> SourceResult<()> {
        // ---
        if self.page_count >= self.max_pages {
            tracing::debug!(
                "Hit page limit of {}, stopping pagination at {}",
                self.max_pages,
                self.base_url
            );
            self.exhausted = true;
            return Ok(());
        }
        self.page_count += 1;

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("page", &self.page_count.to_string());

        tracing::debug!("Fetching page {} from: {}", self.page_count, url);

        let http_error = |source: reqwest::Error| SourceError::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_error)?;
        let body: Value = response.json().await.map_err(http_error)?;

        let items = match body {
            Value::Array(items) => items,
            Value::Object(mut page) => match page.remove("results") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        if items.is_empty() {
            tracing::info!(
                "No more pages after page {}, stopping pagination",
                self.page_count
            );
            self.exhausted = true;
            return Ok(());
        }

        tracing::debug!("Page {} returned {} items", self.page_count, items.len());
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(record) => self.pending.push_back(record),
                other => tracing::warn!(
                    "Skipping non-object item {} on page {}: {}",
                    i,
                    self.page_count,
                    other
                ),
            }
        }
        Ok(())
    }
}
