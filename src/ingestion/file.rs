//! Local newline-delimited JSON file reader.

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use super::decode_record_line;
use crate::error::{SourceError, SourceResult};
use crate::models::Batch;

// ---

/// Reads a JSONL file incrementally, one batch at a time.
#[derive(Debug)]
pub struct FileReader {
    path: String,
    lines: Lines<BufReader<File>>,
    batch_size: usize,
    line_no: usize,
}

impl FileReader {
    // ---
    pub async fn open(path: &str, batch_size: usize) -> SourceResult<Self> {
        // ---
        let file = File::open(path).await.map_err(|source| SourceError::Io {
            path: path.to_string(),
            source,
        })?;
        tracing::debug!("Opened '{}' for reading", path);

        Ok(Self {
            path: path.to_string(),
            lines: BufReader::new(file).lines(),
            batch_size: batch_size.max(1),
            line_no: 0,
        })
    }

    pub async fn next_batch(&mut self) -> SourceResult<Option<Batch>> {
        // ---
        let mut batch = Batch::new();

        while batch.len() < self.batch_size {
            let line = self.lines.next_line().await.map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
            let Some(line) = line else {
                break;
            };
            self.line_no += 1;

            if let Some(record) = decode_record_line(&line, &self.path, self.line_no) {
                batch.push(record);
            }
        }

        if batch.is_empty() {
            tracing::debug!("Finished '{}' after {} lines", self.path, self.line_no);
            return Ok(None);
        }
        Ok(Some(batch))
    }
}
