use bytes::{Bytes, BytesMut};
use futures::{SinkExt, pin_mut};
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, CopyInSink, NoTls};
use tracing::{debug, error};

use crate::config::PgConfig;
use crate::errors::DatabaseError;
use crate::schema::{Column, SqlValue, quote_ident};
use crate::sink::TableSink;
use crate::source::Chunk;

/// Flush the COPY buffer to the server once it grows past this.
const COPY_BUFFER_BYTES: usize = 64 * 1024;

/// Writes chunks to a PostgreSQL table over a single, unshared connection
/// held for the duration of the run.
pub struct PostgresSink {
    client: Client,
}

impl PostgresSink {
    pub async fn connect(config: &PgConfig) -> Result<Self, DatabaseError> {
        let (client, connection) = tokio_postgres::connect(&config.connection_string(), NoTls)
            .await
            .map_err(|e| DatabaseError::Connection {
                reason: e.to_string(),
            })?;

        // The connection object drives the socket; it runs until the client
        // is dropped at the end of the process.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Postgres connection error: {}", e);
            }
        });

        Ok(Self { client })
    }
}

impl TableSink for PostgresSink {
    async fn replace(&mut self, table: &str, columns: &[Column]) -> Result<(), DatabaseError> {
        let statement = replace_statement(table, columns);
        debug!("Replacing table: {}", statement);

        self.client
            .batch_execute(&statement)
            .await
            .map_err(|e| DatabaseError::TableReplace {
                table: table.to_string(),
                reason: e.to_string(),
            })
    }

    async fn append(&mut self, table: &str, chunk: &Chunk) -> Result<u64, DatabaseError> {
        let statement = copy_statement(table, chunk.columns());
        let sink: CopyInSink<Bytes> = self
            .client
            .copy_in(&statement)
            .await
            .map_err(|e| classify(table, e))?;
        pin_mut!(sink);

        let mut buf = BytesMut::new();
        for row in &chunk.rows {
            encode_row(&mut buf, row);
            if buf.len() >= COPY_BUFFER_BYTES {
                sink.send(buf.split().freeze())
                    .await
                    .map_err(|e| classify(table, e))?;
            }
        }
        if !buf.is_empty() {
            sink.send(buf.split().freeze())
                .await
                .map_err(|e| classify(table, e))?;
        }

        sink.finish().await.map_err(|e| classify(table, e))
    }
}

/// Maps a destination-side failure onto the error taxonomy: column and
/// type errors become schema mismatches, everything else a plain append
/// failure.
fn classify(table: &str, err: tokio_postgres::Error) -> DatabaseError {
    const SCHEMA_STATES: [SqlState; 4] = [
        SqlState::UNDEFINED_COLUMN,
        SqlState::DATATYPE_MISMATCH,
        SqlState::INVALID_TEXT_REPRESENTATION,
        SqlState::NUMERIC_VALUE_OUT_OF_RANGE,
    ];

    if err.code().is_some_and(|code| SCHEMA_STATES.contains(code)) {
        DatabaseError::SchemaMismatch {
            table: table.to_string(),
            reason: err.to_string(),
        }
    } else {
        DatabaseError::Append {
            table: table.to_string(),
            reason: err.to_string(),
        }
    }
}

fn replace_statement(table: &str, columns: &[Column]) -> String {
    let table = quote_ident(table);
    let column_defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.data_type.sql_type()))
        .collect();
    format!(
        "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({})",
        column_defs.join(", ")
    )
}

fn copy_statement(table: &str, columns: &[Column]) -> String {
    let column_list: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
    format!(
        "COPY {} ({}) FROM STDIN",
        quote_ident(table),
        column_list.join(", ")
    )
}

/// Encodes one row in COPY text format: tab-separated fields, `\N` for
/// null, newline-terminated.
fn encode_row(buf: &mut BytesMut, row: &[SqlValue]) {
    for (idx, value) in row.iter().enumerate() {
        if idx > 0 {
            buf.extend_from_slice(b"\t");
        }
        encode_value(buf, value);
    }
    buf.extend_from_slice(b"\n");
}

fn encode_value(buf: &mut BytesMut, value: &SqlValue) {
    match value {
        SqlValue::Null => buf.extend_from_slice(b"\\N"),
        SqlValue::Int(v) => buf.extend_from_slice(v.to_string().as_bytes()),
        SqlValue::Float(v) => {
            if v.is_nan() {
                buf.extend_from_slice(b"NaN");
            } else if v.is_infinite() {
                buf.extend_from_slice(if *v > 0.0 { b"Infinity" } else { b"-Infinity" });
            } else {
                buf.extend_from_slice(v.to_string().as_bytes());
            }
        }
        SqlValue::Text(v) => encode_text(buf, v),
        SqlValue::Timestamp(ts) => {
            buf.extend_from_slice(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string().as_bytes());
        }
    }
}

fn encode_text(buf: &mut BytesMut, text: &str) {
    for byte in text.bytes() {
        match byte {
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            other => buf.extend_from_slice(&[other]),
        }
    }
}
