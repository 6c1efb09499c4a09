// src/services/fetch.rs
use log::{error, info};
use reqwest::Client;
use std::path::Path;

use crate::error::{PipelineError, Result};

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Download (or read, for a local path) one source CSV as text.
pub async fn fetch_source(client: &Client, source: &str) -> Result<String> {
    let text = if is_remote(source) {
        info!("Fetching CSV from URL: {}", source);
        client
            .get(source)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?
    } else {
        info!("Reading CSV from file: {}", source);
        tokio::fs::read_to_string(Path::new(source)).await?
    };

    if text.trim().is_empty() {
        error!("Source {} returned no data", source);
        return Err(PipelineError::Config(format!(
            "source {} is unreachable or returned an empty body",
            source
        )));
    }

    info!("Fetched {} bytes from {}", text.len(), source);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn remote_sources_are_detected() {
        assert!(is_remote("https://example.org/a.csv"));
        assert!(is_remote("http://example.org/a.csv"));
        assert!(!is_remote("fixtures/a.csv"));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Province/State,Country/Region,Lat,Long,1/22/20").unwrap();
        let client = Client::new();
        let text = fetch_source(&client, file.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(text.starts_with("Province/State"));
    }

    #[tokio::test]
    async fn empty_source_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        let client = Client::new();
        let err = fetch_source(&client, file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let client = Client::new();
        let err = fetch_source(&client, "/nonexistent/confirmed.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
