use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to load configuration from {path}: {error}")]
    LoadFailed {
        path: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source file not found: {path}")]
    NotFound { path: String },

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {reason}")]
    Connection { reason: String },

    #[error("Failed to replace table {table}: {reason}")]
    TableReplace { table: String, reason: String },

    #[error("Failed to append to table {table}: {reason}")]
    Append { table: String, reason: String },

    #[error("Chunk is incompatible with table {table}: {reason}")]
    SchemaMismatch { table: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed CSV input: {reason}")]
    Csv { reason: String },

    #[error("Failed to parse column {column} value {value:?}: {reason}")]
    Field {
        column: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Parse(ParseError::Csv {
            reason: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for IngestError {
    fn from(err: serde_yaml::Error) -> Self {
        IngestError::Config(ConfigError::Invalid {
            message: err.to_string(),
        })
    }
}

impl IngestError {
    /// True for the pre-flight failure raised before any network or
    /// database work when a local source path does not exist.
    pub fn is_source_missing(&self) -> bool {
        matches!(self, IngestError::Source(SourceError::NotFound { .. }))
    }

    /// True when a later chunk's columns were rejected by the table
    /// materialized from the first chunk.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            IngestError::Database(DatabaseError::SchemaMismatch { .. })
        )
    }
}
