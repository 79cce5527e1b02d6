use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

use futures::StreamExt;
use tracing::info;

use crate::errors::{Result, SourceError};

fn fetch_error(url: &str, reason: impl ToString) -> SourceError {
    SourceError::Fetch {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Streams a remote source into an anonymous temp file and returns it
/// rewound to the start. The file is unlinked by the OS when dropped, so
/// nothing is left behind after the run.
pub async fn fetch(url: &str) -> Result<File> {
    info!("Downloading source: {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| fetch_error(url, e))?
        .error_for_status()
        .map_err(|e| fetch_error(url, e))?;

    let mut file = tempfile::tempfile()?;
    let mut stream = response.bytes_stream();
    let mut bytes_fetched: u64 = 0;

    while let Some(part) = stream.next().await {
        let part = part.map_err(|e| fetch_error(url, e))?;
        file.write_all(&part)?;
        bytes_fetched += part.len() as u64;
    }

    file.flush()?;
    file.seek(SeekFrom::Start(0))?;

    info!("Downloaded {} bytes from {}", bytes_fetched, url);
    Ok(file)
}
