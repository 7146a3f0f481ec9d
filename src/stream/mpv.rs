//! mpv player adapter
//!
//! Spawns mpv on a stream URL and observes it through the JSON IPC socket
//! (`--input-ipc-server`). Each query opens a short-lived connection; a
//! dead socket or an exited process reads as "inactive".

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::stream::playback::Player;

/// Errors from launching mpv
#[derive(Debug, Error)]
pub enum MpvError {
    #[error("player '{0}' not found. Install mpv first.")]
    NotFound(String),
    #[error("failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
}

/// Response line from the mpv IPC socket
#[derive(Debug, Deserialize)]
struct IpcResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    request_id: Option<u64>,
}

/// A running mpv instance playing one stream URL.
pub struct MpvPlayer {
    child: Mutex<Child>,
    socket_path: PathBuf,
}

impl MpvPlayer {
    /// Spawn mpv on `url` with an IPC socket for observation.
    pub fn spawn(binary: &str, url: &str) -> Result<Self, MpvError> {
        let socket_path =
            std::env::temp_dir().join(format!("swarmplay-mpv-{}.sock", std::process::id()));
        // A stale socket from a previous run would confuse mpv
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new(binary);
        cmd.arg(url)
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg("--force-window=immediate")
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MpvError::NotFound(binary.to_string())
            } else {
                MpvError::StartFailed(e)
            }
        })?;
        debug!(url, socket = %socket_path.display(), "spawned mpv");

        Ok(Self {
            child: Mutex::new(child),
            socket_path,
        })
    }

    /// Check whether the player binary is reachable on PATH
    pub async fn is_available(binary: &str) -> bool {
        Command::new("which")
            .arg(binary)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn process_exited(&self) -> bool {
        match self.child.lock() {
            Ok(mut child) => matches!(child.try_wait(), Ok(Some(_)) | Err(_)),
            Err(_) => true,
        }
    }

    /// Query one property over a fresh IPC connection. `None` means the
    /// property is unavailable or the socket is gone.
    async fn get_property(&self, name: &str) -> Option<Value> {
        let query = async {
            let stream = UnixStream::connect(&self.socket_path).await.ok()?;
            let (read_half, mut write_half) = stream.into_split();

            let mut request = json!({"command": ["get_property", name], "request_id": 1})
                .to_string();
            request.push('\n');
            write_half.write_all(request.as_bytes()).await.ok()?;

            // The socket also carries unsolicited events; skip until our
            // request id comes back
            let mut lines = BufReader::new(read_half).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Ok(response) = serde_json::from_str::<IpcResponse>(&line) {
                    if response.request_id == Some(1) {
                        if response.error.as_deref() == Some("success") {
                            return response.data;
                        }
                        return None;
                    }
                }
            }
            None
        };
        tokio::time::timeout(Duration::from_millis(500), query)
            .await
            .ok()
            .flatten()
    }
}

#[async_trait]
impl Player for MpvPlayer {
    async fn is_active(&self) -> bool {
        if self.process_exited() {
            return false;
        }
        matches!(self.get_property("path").await, Some(value) if !value.is_null())
    }

    async fn is_paused(&self) -> bool {
        self.get_property("pause").await == Some(Value::Bool(true))
    }

    async fn is_playing(&self) -> bool {
        self.get_property("pause").await == Some(Value::Bool(false))
    }

    async fn playing_file(&self) -> Option<String> {
        self.get_property("path")
            .await
            .and_then(|v| v.as_str().map(String::from))
    }
}
