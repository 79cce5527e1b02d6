pub mod config;
pub mod errors;
pub mod loader;
pub mod schema;
pub mod sink;
pub mod source;
pub mod telemetry;

pub use config::{IngestConfig, PgConfig};
pub use errors::{IngestError, Result};
pub use loader::{ChunkedTableLoader, LoadReport, LoadState};
pub use schema::{Column, ColumnType, LoadSpec, SqlValue, TableSchema};
pub use sink::{PostgresSink, TableSink};
pub use source::{Chunk, ChunkReader, SourceLocator};
