use std::io::Read;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord};

use crate::errors::Result;
use crate::schema::{Column, LoadSpec};
use crate::source::Chunk;

/// Forward-only reader that decodes a CSV stream into bounded chunks.
///
/// The header row is consumed on construction and resolved against the
/// [`LoadSpec`] to fix each column's type for the rest of the run. One
/// reader makes exactly one pass over its input; re-running a load means
/// opening the source again.
pub struct ChunkReader {
    reader: csv::Reader<Box<dyn Read + Send>>,
    columns: Arc<[Column]>,
    chunk_size: usize,
}

impl std::fmt::Debug for ChunkReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkReader")
            .field("columns", &self.columns)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl ChunkReader {
    pub fn new(input: Box<dyn Read + Send>, spec: &LoadSpec) -> Result<Self> {
        spec.validate()?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);
        let headers = reader.headers()?.clone();

        let columns: Vec<Column> = headers
            .iter()
            .map(|name| Column {
                name: name.to_string(),
                data_type: spec.effective_type(name),
            })
            .collect();

        Ok(Self {
            reader,
            columns: Arc::from(columns),
            chunk_size: spec.chunk_size,
        })
    }

    /// Column structure resolved from the source header.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Reads the next chunk of at most `chunk_size` rows. Returns `None`
    /// once the source is exhausted; a header-only source yields no chunks.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        let mut rows = Vec::new();
        let mut record = StringRecord::new();

        while rows.len() < self.chunk_size {
            if !self.reader.read_record(&mut record)? {
                break;
            }

            let mut row = Vec::with_capacity(self.columns.len());
            for (idx, column) in self.columns.iter().enumerate() {
                let raw = record.get(idx).unwrap_or("");
                row.push(column.data_type.coerce(&column.name, raw)?);
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(Chunk {
            columns: Arc::clone(&self.columns),
            rows,
        }))
    }
}
