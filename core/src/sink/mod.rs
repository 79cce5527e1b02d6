pub mod postgres;

use crate::errors::DatabaseError;
use crate::schema::Column;
use crate::source::Chunk;

pub use postgres::PostgresSink;

/// The destination seam of the pipeline. The production implementation is
/// [`PostgresSink`]; tests substitute an in-memory table.
#[allow(async_fn_in_trait)]
pub trait TableSink {
    /// Drops `table` if it exists and recreates it with `columns`'
    /// structure and zero rows, destroying any prior contents.
    async fn replace(&mut self, table: &str, columns: &[Column]) -> Result<(), DatabaseError>;

    /// Appends the chunk's rows to `table`; returns the number written.
    async fn append(&mut self, table: &str, chunk: &Chunk) -> Result<u64, DatabaseError>;
}

impl<T: TableSink> TableSink for &mut T {
    async fn replace(&mut self, table: &str, columns: &[Column]) -> Result<(), DatabaseError> {
        (**self).replace(table, columns).await
    }

    async fn append(&mut self, table: &str, chunk: &Chunk) -> Result<u64, DatabaseError> {
        (**self).append(table, chunk).await
    }
}
