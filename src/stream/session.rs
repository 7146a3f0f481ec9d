//! Stream session orchestration
//!
//! Ties the pieces together for the embedding UI layer: buffer a file,
//! then hand the serve URL to mpv and supervise playback with the paused
//! status overlay attached. Buffering and playback never overlap for the
//! same request; cancellation and timeout end the session before any
//! player is spawned.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::api::DaemonClient;
use crate::models::status_summary;
use crate::stream::buffering::{BufferingMonitor, BufferingOutcome, ProgressSink};
use crate::stream::mpv::MpvPlayer;
use crate::stream::overlay::{Overlay, OverlayController, StatusText};
use crate::stream::playback::{AbortFlag, PlaybackSupervisor};

/// User notice shown when the buffering timeout elapses
pub const BUFFERING_TIMEOUT_NOTICE: &str = "Buffering timed out";

/// Live torrent summary for the overlay, fetched fresh on every refresh.
struct DaemonStatusText {
    client: Arc<DaemonClient>,
    info_hash: String,
    display_name: String,
}

#[async_trait]
impl StatusText for DaemonStatusText {
    async fn status_text(&self) -> Result<String> {
        let status = self.client.torrent_status(&self.info_hash).await?;
        Ok(status_summary(&status, &self.display_name))
    }
}

/// One user-facing streaming session against the daemon.
pub struct StreamSession {
    client: Arc<DaemonClient>,
    overlay: Arc<dyn Overlay>,
    abort: AbortFlag,
    player_binary: String,
    show_status_overlay: bool,
}

impl StreamSession {
    pub fn new(client: Arc<DaemonClient>, overlay: Arc<dyn Overlay>, abort: AbortFlag) -> Self {
        Self {
            client,
            overlay,
            abort,
            player_binary: "mpv".to_string(),
            show_status_overlay: true,
        }
    }

    pub fn with_player_binary(mut self, binary: impl Into<String>) -> Self {
        self.player_binary = binary.into();
        self
    }

    /// Disable the paused status overlay (user preference)
    pub fn with_status_overlay(mut self, enabled: bool) -> Self {
        self.show_status_overlay = enabled;
        self
    }

    /// Buffer a file and, once ready, start and supervise playback.
    ///
    /// Cancellation returns silently; a timeout emits one notice through
    /// `notify` and returns. Playback starts only on the ready path.
    pub async fn buffer_and_play(
        &self,
        info_hash: &str,
        file_id: u64,
        display_name: &str,
        timeout_secs: u64,
        sink: &mut dyn ProgressSink,
        notify: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<()> {
        let monitor = BufferingMonitor::new(Duration::from_secs(timeout_secs));
        match monitor.run(&self.client, info_hash, file_id, sink).await? {
            BufferingOutcome::Ready => {
                let handler = self.status_text_handler(info_hash, display_name);
                let url = self.client.serve_url(info_hash, file_id);
                self.supervise_playback(&url, handler).await
            }
            BufferingOutcome::Cancelled => Ok(()),
            BufferingOutcome::TimedOut => {
                notify(BUFFERING_TIMEOUT_NOTICE);
                Ok(())
            }
        }
    }

    /// Spawn the player on `url` and supervise its lifecycle until it
    /// stops or the session is aborted.
    pub async fn supervise_playback(
        &self,
        url: &str,
        text_handler: Option<Arc<dyn StatusText>>,
    ) -> Result<()> {
        info!(url, "starting playback");
        let player = MpvPlayer::spawn(&self.player_binary, url)?;
        let mut controller = OverlayController::new(self.overlay.clone(), text_handler);
        PlaybackSupervisor::new()
            .handle_events(&player, Some(url), &mut controller, &self.abort)
            .await?;
        Ok(())
    }

    /// Overlay text handler for a torrent, or `None` when the user turned
    /// the status overlay off.
    pub fn status_text_handler(
        &self,
        info_hash: &str,
        display_name: &str,
    ) -> Option<Arc<dyn StatusText>> {
        if !self.show_status_overlay {
            return None;
        }
        Some(Arc::new(DaemonStatusText {
            client: self.client.clone(),
            info_hash: info_hash.to_string(),
            display_name: display_name.to_string(),
        }))
    }
}
