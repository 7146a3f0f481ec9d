//! Torrent daemon client
//!
//! Typed wrapper over the daemon's HTTP API: adding torrents, listing
//! torrents and files, lifecycle actions and status snapshots. Every call
//! is a fresh round trip over a pooled connection; no caching, no retries.
//! Failures propagate to the caller, which owns any retry policy.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{FileStatus, Torrent, TorrentFile, TorrentStatus};

/// Errors surfaced by the daemon client
#[derive(Error, Debug)]
pub enum DaemonError {
    /// The daemon answered with an error body (HTTP status >= 400)
    #[error("daemon error: {0}")]
    Remote(String),

    /// The request never produced a valid daemon response
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Reading a local .torrent file failed
    #[error("could not read torrent file: {0}")]
    TorrentFile(#[from] std::io::Error),
}

/// Error body shape used by the daemon for all failure responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the torrent daemon
pub struct DaemonClient {
    base_url: String,
    client: reqwest::Client,
}

impl DaemonClient {
    /// Create a client for a daemon at `host:port`
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_base_url(format!("http://{}:{}", host, port))
    }

    /// Create a client with a full base URL (also used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    // -------------------------------------------------------------------------
    // Adding torrents
    // -------------------------------------------------------------------------

    /// Add a torrent by magnet URI
    pub async fn add_magnet(&self, uri: &str) -> Result<(), DaemonError> {
        self.get("/add/magnet", &[("uri", uri)]).await?;
        Ok(())
    }

    /// Add a torrent by uploading a local .torrent file
    pub async fn add_torrent(&self, path: &Path) -> Result<(), DaemonError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.torrent".to_string());
        let form = reqwest::multipart::Form::new()
            .part("torrent", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(format!("{}/add/torrent", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Self::validate(response).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Torrent listing and lifecycle
    // -------------------------------------------------------------------------

    /// List all torrents, optionally with embedded status
    pub async fn torrents(&self, status: bool) -> Result<Vec<Torrent>, DaemonError> {
        let response = self.get("/torrents", &[("status", bool_str(status))]).await?;
        Ok(response.json().await?)
    }

    pub async fn pause_torrent(&self, info_hash: &str) -> Result<(), DaemonError> {
        self.get(&format!("/torrents/{}/pause", info_hash), &[]).await?;
        Ok(())
    }

    pub async fn resume_torrent(&self, info_hash: &str) -> Result<(), DaemonError> {
        self.get(&format!("/torrents/{}/resume", info_hash), &[]).await?;
        Ok(())
    }

    /// Ask the daemon to download every file of the torrent
    pub async fn download_torrent(&self, info_hash: &str) -> Result<(), DaemonError> {
        self.get(&format!("/torrents/{}/download", info_hash), &[]).await?;
        Ok(())
    }

    /// Stop downloading the torrent (keeps it registered)
    pub async fn stop_torrent(&self, info_hash: &str) -> Result<(), DaemonError> {
        self.get(&format!("/torrents/{}/stop", info_hash), &[]).await?;
        Ok(())
    }

    /// Remove the torrent, optionally deleting downloaded data
    pub async fn remove_torrent(&self, info_hash: &str, delete: bool) -> Result<(), DaemonError> {
        self.get(
            &format!("/torrents/{}/remove", info_hash),
            &[("delete", bool_str(delete))],
        )
        .await?;
        Ok(())
    }

    /// Fresh status snapshot for a torrent
    pub async fn torrent_status(&self, info_hash: &str) -> Result<TorrentStatus, DaemonError> {
        let response = self.get(&format!("/torrents/{}/status", info_hash), &[]).await?;
        Ok(response.json().await?)
    }

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    /// List the files of a torrent, optionally with embedded status
    pub async fn files(&self, info_hash: &str, status: bool) -> Result<Vec<TorrentFile>, DaemonError> {
        let response = self
            .get(
                &format!("/torrents/{}/files", info_hash),
                &[("status", bool_str(status))],
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Fresh status snapshot for a single file
    pub async fn file_status(&self, info_hash: &str, file_id: u64) -> Result<FileStatus, DaemonError> {
        let response = self
            .get(&format!("/torrents/{}/files/{}/status", info_hash, file_id), &[])
            .await?;
        Ok(response.json().await?)
    }

    /// Start downloading a file; with `buffer` the daemon prioritizes the
    /// buffering window and reports `buffering_progress`
    pub async fn download_file(
        &self,
        info_hash: &str,
        file_id: u64,
        buffer: bool,
    ) -> Result<(), DaemonError> {
        self.get(
            &format!("/torrents/{}/files/{}/download", info_hash, file_id),
            &[("buffer", bool_str(buffer))],
        )
        .await?;
        Ok(())
    }

    /// Stop downloading a file
    pub async fn stop_file(&self, info_hash: &str, file_id: u64) -> Result<(), DaemonError> {
        self.get(&format!("/torrents/{}/files/{}/stop", info_hash, file_id), &[])
            .await?;
        Ok(())
    }

    /// Content URL for a file, playable directly as a stream source
    pub fn serve_url(&self, info_hash: &str, file_id: u64) -> String {
        format!("{}/torrents/{}/files/{}/serve", self.base_url, info_hash, file_id)
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, DaemonError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        Self::validate(response).await
    }

    /// Surface the daemon's structured error body for any failure status
    async fn validate(response: reqwest::Response) -> Result<reqwest::Response, DaemonError> {
        let status = response.status();
        if status.as_u16() >= 400 {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => format!("HTTP {}", status),
            };
            return Err(DaemonError::Remote(message));
        }
        Ok(response)
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_url() {
        let client = DaemonClient::new("localhost", 8080);
        assert_eq!(
            client.serve_url("abc123", 2),
            "http://localhost:8080/torrents/abc123/files/2/serve"
        );
    }

    #[test]
    fn test_bool_str() {
        assert_eq!(bool_str(true), "true");
        assert_eq!(bool_str(false), "false");
    }
}
