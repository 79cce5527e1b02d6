use std::io::{Cursor, Read};

use csvload_core::errors::DatabaseError;
use csvload_core::loader::ChunkedTableLoader;
use csvload_core::schema::{Column, ColumnType, LoadSpec, SqlValue, TableSchema};
use csvload_core::sink::TableSink;
use csvload_core::source::{self, Chunk, ChunkReader, SourceLocator};

/// In-memory destination table, tracking every sink call.
#[derive(Default)]
struct MemorySink {
    columns: Vec<Column>,
    rows: Vec<Vec<SqlValue>>,
    replaces: usize,
    append_sizes: Vec<usize>,
}

impl TableSink for MemorySink {
    async fn replace(&mut self, _table: &str, columns: &[Column]) -> Result<(), DatabaseError> {
        self.columns = columns.to_vec();
        self.rows.clear();
        self.replaces += 1;
        Ok(())
    }

    async fn append(&mut self, _table: &str, chunk: &Chunk) -> Result<u64, DatabaseError> {
        self.append_sizes.push(chunk.num_rows());
        self.rows.extend(chunk.rows.iter().cloned());
        Ok(chunk.num_rows() as u64)
    }
}

/// Accepts the first `appends_before_failure` appends, then fails every
/// later one, keeping whatever was already written.
struct FlakySink {
    inner: MemorySink,
    appends_before_failure: usize,
    append_attempts: usize,
}

impl FlakySink {
    fn failing_after(appends_before_failure: usize) -> Self {
        Self {
            inner: MemorySink::default(),
            appends_before_failure,
            append_attempts: 0,
        }
    }
}

impl TableSink for FlakySink {
    async fn replace(&mut self, table: &str, columns: &[Column]) -> Result<(), DatabaseError> {
        self.inner.replace(table, columns).await
    }

    async fn append(&mut self, table: &str, chunk: &Chunk) -> Result<u64, DatabaseError> {
        self.append_attempts += 1;
        if self.append_attempts > self.appends_before_failure {
            return Err(DatabaseError::Append {
                table: table.to_string(),
                reason: "connection reset by peer".to_string(),
            });
        }
        self.inner.append(table, chunk).await
    }
}

fn zone_spec(chunk_size: usize) -> LoadSpec {
    LoadSpec::new(
        TableSchema::new()
            .with("LocationID", ColumnType::Int64)
            .with("Borough", ColumnType::Text),
        chunk_size,
    )
}

fn reader_over(data: &str, spec: &LoadSpec) -> ChunkReader {
    let input: Box<dyn Read + Send> = Box::new(Cursor::new(data.as_bytes().to_vec()));
    ChunkReader::new(input, spec).unwrap()
}

const FIVE_ZONES: &str = "LocationID,Borough\n\
                          1,EWR\n\
                          2,Queens\n\
                          3,Bronx\n\
                          4,Manhattan\n\
                          5,Staten Island\n";

#[tokio::test]
async fn chunk_size_is_invisible_in_the_result() {
    for chunk_size in [1, 2, 3, 5, 100] {
        let mut sink = MemorySink::default();
        let mut loader = ChunkedTableLoader::new(&mut sink, "taxi_zone_lookup");
        let mut reader = reader_over(FIVE_ZONES, &zone_spec(chunk_size));

        let report = loader.run(&mut reader).await.unwrap();

        assert_eq!(report.metrics.rows_loaded, 5, "chunk size {chunk_size}");
        assert_eq!(sink.rows.len(), 5, "chunk size {chunk_size}");
    }
}

#[tokio::test]
async fn destination_preserves_source_row_order() {
    let mut sink = MemorySink::default();
    let mut loader = ChunkedTableLoader::new(&mut sink, "taxi_zone_lookup");
    let mut reader = reader_over(FIVE_ZONES, &zone_spec(2));

    loader.run(&mut reader).await.unwrap();

    let ids: Vec<&SqlValue> = sink.rows.iter().map(|row| &row[0]).collect();
    assert_eq!(
        ids,
        vec![
            &SqlValue::Int(1),
            &SqlValue::Int(2),
            &SqlValue::Int(3),
            &SqlValue::Int(4),
            &SqlValue::Int(5)
        ]
    );
}

#[tokio::test]
async fn rerun_replaces_rather_than_doubles() {
    let mut sink = MemorySink::default();

    for _ in 0..2 {
        let mut loader = ChunkedTableLoader::new(&mut sink, "taxi_zone_lookup");
        let mut reader = reader_over(FIVE_ZONES, &zone_spec(2));
        loader.run(&mut reader).await.unwrap();
    }

    assert_eq!(sink.rows.len(), 5);
    assert_eq!(sink.replaces, 2);
}

#[tokio::test]
async fn missing_local_source_fails_before_any_sink_work() {
    let spec = zone_spec(2);
    let locator = SourceLocator::parse("/no/such/zones.csv");

    let err = source::open(&locator, &spec).await.unwrap_err();
    assert!(err.is_source_missing());
}

#[tokio::test]
async fn three_rows_chunk_two_is_one_replace_two_appends() {
    let mut sink = MemorySink::default();
    let mut loader = ChunkedTableLoader::new(&mut sink, "taxi_zone_lookup");
    let mut reader = reader_over("LocationID,Borough\n1,EWR\n2,Queens\n3,Bronx\n", &zone_spec(2));

    let report = loader.run(&mut reader).await.unwrap();

    assert_eq!(sink.replaces, 1);
    assert_eq!(sink.append_sizes, vec![2, 1]);
    assert_eq!(sink.rows.len(), 3);
    assert_eq!(report.metrics.chunks_loaded, 2);
    assert_eq!(report.metrics.appends, 2);
}

#[tokio::test]
async fn empty_nullable_int_loads_as_null() {
    let mut sink = MemorySink::default();
    let mut loader = ChunkedTableLoader::new(&mut sink, "taxi_zone_lookup");
    let mut reader = reader_over("LocationID,Borough\n,EWR\n2,Queens\n", &zone_spec(10));

    loader.run(&mut reader).await.unwrap();

    assert_eq!(sink.rows[0][0], SqlValue::Null);
    assert_eq!(sink.rows[1][0], SqlValue::Int(2));
}

#[tokio::test]
async fn append_failure_surfaces_unchanged_and_keeps_partial_load() {
    let mut sink = FlakySink::failing_after(1);
    let mut loader = ChunkedTableLoader::new(&mut sink, "taxi_zone_lookup");
    let mut reader = reader_over(FIVE_ZONES, &zone_spec(2));

    let err = loader.run(&mut reader).await.unwrap_err();

    // The sink's error comes back as-is, no retry in between.
    match err {
        csvload_core::IngestError::Database(DatabaseError::Append { table, reason }) => {
            assert_eq!(table, "taxi_zone_lookup");
            assert_eq!(reason, "connection reset by peer");
        }
        other => panic!("Expected Append error, got {:?}", other),
    }
    assert_eq!(sink.append_attempts, 2);

    // No rollback: the first chunk's rows stay behind.
    assert_eq!(sink.inner.replaces, 1);
    assert_eq!(sink.inner.rows.len(), 2);
    assert_eq!(sink.inner.rows[0][0], SqlValue::Int(1));
    assert_eq!(sink.inner.rows[1][0], SqlValue::Int(2));
}

#[tokio::test]
async fn replace_discards_prior_table_contents() {
    let mut sink = MemorySink::default();

    // Seed the "previous run's" contents directly.
    sink.rows.push(vec![
        SqlValue::Int(99),
        SqlValue::Text("Stale".to_string()),
    ]);

    let mut loader = ChunkedTableLoader::new(&mut sink, "taxi_zone_lookup");
    let mut reader = reader_over("LocationID,Borough\n1,EWR\n", &zone_spec(10));
    loader.run(&mut reader).await.unwrap();

    assert_eq!(sink.rows.len(), 1);
    assert_eq!(sink.rows[0][0], SqlValue::Int(1));
}
