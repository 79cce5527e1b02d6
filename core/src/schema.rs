use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Semantic type of one source column. Every variant is nullable: an empty
/// CSV field always coerces to [`SqlValue::Null`], never a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int64,
    Float64,
    Text,
    Timestamp,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "BIGINT",
            ColumnType::Float64 => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    /// Coerces one raw CSV field into a typed value.
    pub fn coerce(&self, column: &str, raw: &str) -> Result<SqlValue, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(SqlValue::Null);
        }

        match self {
            ColumnType::Int64 => trimmed
                .parse::<i64>()
                .map(SqlValue::Int)
                .map_err(|e| field_error(column, raw, e.to_string())),
            ColumnType::Float64 => trimmed
                .parse::<f64>()
                .map(SqlValue::Float)
                .map_err(|e| field_error(column, raw, e.to_string())),
            ColumnType::Text => Ok(SqlValue::Text(raw.to_string())),
            ColumnType::Timestamp => parse_timestamp(trimmed)
                .map(SqlValue::Timestamp)
                .ok_or_else(|| field_error(column, raw, "unrecognized timestamp format".into())),
        }
    }
}

fn field_error(column: &str, value: &str, reason: String) -> ParseError {
    ParseError::Field {
        column: column.to_string(),
        value: value.to_string(),
        reason,
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// One decoded field value, ready to be written to the destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
}

/// Ordered column name -> type mapping, declared statically per dataset
/// and passed into the loader as explicit configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TableSchema {
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, data_type: ColumnType) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            data_type,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.data_type)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Everything the reader needs to decode one dataset: the declared schema,
/// the columns to parse as timestamps, and the maximum chunk size.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadSpec {
    pub schema: TableSchema,
    pub parse_dates: Vec<String>,
    pub chunk_size: usize,
}

impl LoadSpec {
    pub fn new(schema: TableSchema, chunk_size: usize) -> Self {
        Self {
            schema,
            parse_dates: Vec::new(),
            chunk_size,
        }
    }

    pub fn parse_dates(mut self, columns: &[&str]) -> Self {
        self.parse_dates = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Resolves the type used to decode a source column: the declared
    /// schema entry, a timestamp for `parse_dates` columns, and text for
    /// everything else (default inference; accepted, not validated).
    pub fn effective_type(&self, column: &str) -> ColumnType {
        if let Some(data_type) = self.schema.get(column) {
            return data_type;
        }
        if self.parse_dates.iter().any(|c| c == column) {
            return ColumnType::Timestamp;
        }
        ColumnType::Text
    }

    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        if self.chunk_size == 0 {
            return Err(crate::errors::ConfigError::ValidationFailed {
                reason: "chunk size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Double-quotes an SQL identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
