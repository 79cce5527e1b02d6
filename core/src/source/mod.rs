pub mod http;
pub mod reader;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use flate2::read::GzDecoder;
use tracing::info;

use crate::errors::{Result, SourceError};
use crate::schema::{Column, LoadSpec, SqlValue};

pub use reader::ChunkReader;

/// Where a tabular source lives. Anything starting with `http://` or
/// `https://` is remote; everything else is a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    Local(PathBuf),
    Remote(String),
}

impl SourceLocator {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            SourceLocator::Remote(raw.to_string())
        } else {
            SourceLocator::Local(PathBuf::from(raw))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocator::Remote(_))
    }

    fn is_gzip(&self) -> bool {
        match self {
            SourceLocator::Local(path) => {
                path.extension().is_some_and(|ext| ext == "gz")
            }
            SourceLocator::Remote(url) => url.ends_with(".gz"),
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Local(path) => write!(f, "{}", path.display()),
            SourceLocator::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// One bounded batch of decoded rows, created by the reader and consumed
/// exactly once by the sink.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub columns: Arc<[Column]>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Chunk {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// Opens the source and returns a chunk reader over it.
///
/// For a local path the existence check runs before anything else, so a
/// missing file fails without any network or database work. Remote sources
/// are streamed to an anonymous temp file first, then read like a local
/// file. Names ending in `.gz` are decompressed transparently.
pub async fn open(locator: &SourceLocator, spec: &LoadSpec) -> Result<ChunkReader> {
    let raw: Box<dyn Read + Send> = match locator {
        SourceLocator::Local(path) => {
            if !path.exists() {
                return Err(SourceError::NotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            info!("Reading from local file: {}", path.display());
            Box::new(File::open(path)?)
        }
        SourceLocator::Remote(url) => Box::new(http::fetch(url).await?),
    };

    let input: Box<dyn Read + Send> = if locator.is_gzip() {
        Box::new(GzDecoder::new(raw))
    } else {
        raw
    };

    ChunkReader::new(input, spec)
}
