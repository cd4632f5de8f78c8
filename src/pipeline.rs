//! Pipeline driver: feeds source batches into one [`Aggregator`].
//!
//! Two modes are offered. Batch mode drains the source and returns the final
//! snapshot. Streaming mode hands back a [`SnapshotStream`] that yields the
//! cumulative snapshot after every batch, so dashboards can show partial
//! results while a large source is still being read.
//!
//! Batches are pulled one at a time and fully folded before the next one is
//! requested; the reader can never run ahead of the aggregator.

use crate::aggregator::Aggregator;
use crate::config::IngestConfig;
use crate::error::SourceResult;
use crate::ingestion::SourceReader;
use crate::models::Snapshot;

// ---

/// Summarize `source` in one pass and return the final snapshot.
///
/// Unrecognized descriptors fail before any I/O; reader failures abort the
/// run and are returned as-is.
pub async fn process_pipeline(source: &str, config: &IngestConfig) -> SourceResult<Snapshot> {
    // ---
    let reader = SourceReader::open(source, config).await?;
    SnapshotStream::from_reader(reader).drain().await
}

/// Open `source` for streaming summarization.
///
/// Nothing is read until the first call to [`SnapshotStream::next`].
pub async fn process_pipeline_streaming(
    source: &str,
    config: &IngestConfig,
) -> SourceResult<SnapshotStream> {
    // ---
    let reader = SourceReader::open(source, config).await?;
    Ok(SnapshotStream::from_reader(reader))
}

/// Lazy, finite sequence of cumulative snapshots, one per source batch.
///
/// Not restartable: once it returns `None`, or after it yields an error, it
/// stays finished.
#[derive(Debug)]
pub struct SnapshotStream {
    reader: SourceReader,
    aggregator: Aggregator,
    batches: usize,
    finished: bool,
}

impl SnapshotStream {
    // ---
    pub fn from_reader(reader: SourceReader) -> Self {
        // ---
        Self {
            reader,
            aggregator: Aggregator::new(),
            batches: 0,
            finished: false,
        }
    }

    /// Fold the next batch and return the snapshot of everything folded so far.
    pub async fn next(&mut self) -> Option<SourceResult<Snapshot>> {
        // ---
        if self.finished {
            return None;
        }

        match self.reader.next_batch().await {
            Ok(Some(batch)) => {
                self.batches += 1;
                self.aggregator.process_chunk(&batch);
                tracing::debug!(
                    "Folded batch {} ({} records), {} sensors tracked",
                    self.batches,
                    batch.len(),
                    self.aggregator.sensor_count()
                );
                Some(Ok(self.aggregator.get_results()))
            }
            Ok(None) => {
                tracing::info!("Source exhausted after {} batches", self.batches);
                self.finished = true;
                None
            }
            Err(e) => {
                tracing::error!("Source failed after {} batches: {}", self.batches, e);
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    /// Fold every remaining batch and return the final snapshot.
    pub async fn drain(mut self) -> SourceResult<Snapshot> {
        // ---
        while !self.finished {
            match self.reader.next_batch().await {
                Ok(Some(batch)) => {
                    self.batches += 1;
                    self.aggregator.process_chunk(&batch);
                }
                Ok(None) => self.finished = true,
                Err(e) => {
                    tracing::error!("Source failed after {} batches: {}", self.batches, e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Pipeline complete: {} batches, {} sensors",
            self.batches,
            self.aggregator.sensor_count()
        );
        Ok(self.aggregator.get_results())
    }

    /// Number of batches folded so far.
    pub fn batches_processed(&self) -> usize {
        self.batches
    }

    /// Snapshot of everything folded so far, without pulling another batch.
    pub fn current(&self) -> Snapshot {
        self.aggregator.get_results()
    }
}
