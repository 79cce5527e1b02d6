use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::errors::Result;
use crate::sink::TableSink;
use crate::source::ChunkReader;
use crate::telemetry::LoadMetrics;

/// Where the loader is in the first-chunk schema lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No chunk seen yet; the next one triggers the schema replace.
    AwaitingFirstChunk,
    /// Table materialized; remaining chunks are append-only.
    Streaming,
}

/// Summary returned after a completed load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub metrics: LoadMetrics,
    pub elapsed_seconds: f64,
}

/// Moves an entire tabular source into a destination table one chunk at a
/// time: the first chunk replaces the table with its zero-row column
/// structure, then every chunk (including the first) is appended.
///
/// Errors propagate immediately with no retry and no rollback. The table
/// is destroyed and recreated on the very first chunk, so a mid-stream
/// failure leaves a partially loaded table behind.
pub struct ChunkedTableLoader<S> {
    sink: S,
    table: String,
    state: LoadState,
    metrics: LoadMetrics,
}

impl<S: TableSink> ChunkedTableLoader<S> {
    pub fn new(sink: S, table: impl Into<String>) -> Self {
        Self {
            sink,
            table: table.into(),
            state: LoadState::AwaitingFirstChunk,
            metrics: LoadMetrics::default(),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn metrics(&self) -> &LoadMetrics {
        &self.metrics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drains the reader, writing every chunk in source order. A source
    /// with no data rows leaves the destination untouched.
    ///
    /// Every run starts a fresh replace-then-append lifecycle, so reusing
    /// a loader with a new reader cannot skip the schema replace.
    pub async fn run(&mut self, source: &mut ChunkReader) -> Result<LoadReport> {
        let started = Instant::now();
        self.state = LoadState::AwaitingFirstChunk;

        while let Some(chunk) = source.next_chunk()? {
            match self.state {
                LoadState::AwaitingFirstChunk => {
                    self.sink.replace(&self.table, chunk.columns()).await?;
                    self.metrics.table_replaces += 1;
                    self.state = LoadState::Streaming;
                }
                LoadState::Streaming => {}
            }

            let written = self.sink.append(&self.table, &chunk).await?;
            self.metrics.appends += 1;
            self.metrics.chunks_loaded += 1;
            self.metrics.rows_loaded += written;

            info!(
                "Loaded chunk {} ({} rows, {} total) into '{}'",
                self.metrics.chunks_loaded,
                chunk.num_rows(),
                self.metrics.rows_loaded,
                self.table
            );
        }

        let report = LoadReport {
            table: self.table.clone(),
            metrics: self.metrics.clone(),
            elapsed_seconds: started.elapsed().as_secs_f64(),
        };
        info!(
            "Load complete: {} rows in {} chunks into '{}'",
            report.metrics.rows_loaded, report.metrics.chunks_loaded, report.table
        );
        Ok(report)
    }
}
