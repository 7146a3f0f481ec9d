//! CLI command handlers
//!
//! Implements every subcommand against the daemon client. Each handler
//! takes its parsed arguments plus the Output helper and returns a
//! semantic exit code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{DaemonClient, DaemonError};
use crate::cli::{
    AddCmd, ExitCode, FileTarget, FilesCmd, Output, PlayCmd, RemoveCmd, StatusCmd, TorrentTarget,
    TorrentsCmd,
};
use crate::config::Config;
use crate::stream::{AbortFlag, Overlay, ProgressSink, StreamSession};

/// Map a daemon failure to its exit code
fn daemon_exit_code(err: &DaemonError) -> ExitCode {
    match err {
        DaemonError::Remote(_) => ExitCode::DaemonRejected,
        DaemonError::Transport(_) => ExitCode::NetworkError,
        DaemonError::TorrentFile(_) => ExitCode::InvalidArgs,
    }
}

// =============================================================================
// Add Command
// =============================================================================

pub async fn add_cmd(cmd: AddCmd, client: &DaemonClient, output: &Output) -> ExitCode {
    let result = if cmd.is_magnet() {
        output.info("Adding magnet...");
        client.add_magnet(&cmd.source).await
    } else {
        output.info(format!("Uploading {}...", cmd.source));
        client.add_torrent(&cmd.torrent_path()).await
    };

    match result {
        Ok(()) => {
            output.line("Added");
            ExitCode::Success
        }
        Err(e) => {
            let code = daemon_exit_code(&e);
            output.error(format!("Add failed: {}", e), code)
        }
    }
}

// =============================================================================
// Listing Commands
// =============================================================================

pub async fn torrents_cmd(cmd: TorrentsCmd, client: &DaemonClient, output: &Output) -> ExitCode {
    match client.torrents(!cmd.no_status).await {
        Ok(torrents) => {
            if output.json {
                if let Err(e) = output.print(&torrents) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            } else if torrents.is_empty() {
                output.line("No torrents");
            } else {
                for torrent in &torrents {
                    output.line(format!("{}  {}", torrent.info_hash, torrent));
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            let code = daemon_exit_code(&e);
            output.error(format!("Listing failed: {}", e), code)
        }
    }
}

pub async fn files_cmd(cmd: FilesCmd, client: &DaemonClient, output: &Output) -> ExitCode {
    match client.files(&cmd.info_hash, !cmd.no_status).await {
        Ok(files) => {
            if output.json {
                if let Err(e) = output.print(&files) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            } else {
                for file in &files {
                    let marker = if file.media_kind().is_playable() { "▶" } else { " " };
                    output.line(format!("{:>4} {} {}", file.id, marker, file));
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            let code = daemon_exit_code(&e);
            output.error(format!("Listing failed: {}", e), code)
        }
    }
}

// =============================================================================
// Torrent Lifecycle Commands
// =============================================================================

/// Which lifecycle action to run against a torrent
pub enum TorrentAction {
    Pause,
    Resume,
    Download,
    Stop,
}

pub async fn torrent_action_cmd(
    action: TorrentAction,
    cmd: TorrentTarget,
    client: &DaemonClient,
    output: &Output,
) -> ExitCode {
    let (label, result) = match action {
        TorrentAction::Pause => ("Paused", client.pause_torrent(&cmd.info_hash).await),
        TorrentAction::Resume => ("Resumed", client.resume_torrent(&cmd.info_hash).await),
        TorrentAction::Download => ("Downloading", client.download_torrent(&cmd.info_hash).await),
        TorrentAction::Stop => ("Stopped", client.stop_torrent(&cmd.info_hash).await),
    };
    match result {
        Ok(()) => {
            output.line(label);
            ExitCode::Success
        }
        Err(e) => {
            let code = daemon_exit_code(&e);
            output.error(format!("Action failed: {}", e), code)
        }
    }
}

pub async fn remove_cmd(cmd: RemoveCmd, client: &DaemonClient, output: &Output) -> ExitCode {
    match client.remove_torrent(&cmd.info_hash, !cmd.keep_data).await {
        Ok(()) => {
            output.line("Removed");
            ExitCode::Success
        }
        Err(e) => {
            let code = daemon_exit_code(&e);
            output.error(format!("Remove failed: {}", e), code)
        }
    }
}

// =============================================================================
// Status Command
// =============================================================================

pub async fn status_cmd(cmd: StatusCmd, client: &DaemonClient, output: &Output) -> ExitCode {
    let result = match cmd.file {
        Some(file_id) => match client.file_status(&cmd.info_hash, file_id).await {
            Ok(status) => output.print(&status),
            Err(e) => {
                let code = daemon_exit_code(&e);
                return output.error(format!("Status failed: {}", e), code);
            }
        },
        None => match client.torrent_status(&cmd.info_hash).await {
            Ok(status) => output.print(&status),
            Err(e) => {
                let code = daemon_exit_code(&e);
                return output.error(format!("Status failed: {}", e), code);
            }
        },
    };
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// File Commands
// =============================================================================

pub async fn file_download_cmd(cmd: FileTarget, client: &DaemonClient, output: &Output) -> ExitCode {
    match client.download_file(&cmd.info_hash, cmd.file_id, false).await {
        Ok(()) => {
            output.line("Downloading");
            ExitCode::Success
        }
        Err(e) => {
            let code = daemon_exit_code(&e);
            output.error(format!("Action failed: {}", e), code)
        }
    }
}

pub async fn file_stop_cmd(cmd: FileTarget, client: &DaemonClient, output: &Output) -> ExitCode {
    match client.stop_file(&cmd.info_hash, cmd.file_id).await {
        Ok(()) => {
            output.line("Stopped");
            ExitCode::Success
        }
        Err(e) => {
            let code = daemon_exit_code(&e);
            output.error(format!("Action failed: {}", e), code)
        }
    }
}

pub fn url_cmd(cmd: FileTarget, client: &DaemonClient, output: &Output) -> ExitCode {
    let url = client.serve_url(&cmd.info_hash, cmd.file_id);
    if output.json {
        match output.print(&serde_json::json!({ "url": url })) {
            Ok(()) => ExitCode::Success,
            Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
        }
    } else {
        println!("{}", url);
        ExitCode::Success
    }
}

// =============================================================================
// Play Command
// =============================================================================

/// Buffering progress rendered as an indicatif bar. Ctrl-C flips the
/// shared flag, which the monitor observes as cancellation.
struct BarSink {
    bar: ProgressBar,
    cancelled: AbortFlag,
}

impl BarSink {
    fn new(cancelled: AbortFlag) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar, cancelled }
    }
}

impl ProgressSink for BarSink {
    fn update(&mut self, percent: u8, title: &str, detail: &str) {
        self.bar.set_position(u64::from(percent));
        self.bar.set_message(format!("{} | {}", title, detail));
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.is_set()
    }

    fn close(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Paused status overlay for the terminal: prints the summary to stderr
/// while "shown".
struct ConsoleOverlay {
    shown: AtomicBool,
}

impl ConsoleOverlay {
    fn new() -> Self {
        Self {
            shown: AtomicBool::new(false),
        }
    }
}

impl Overlay for ConsoleOverlay {
    fn show(&self) {
        self.shown.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.shown.store(false, Ordering::SeqCst);
    }

    fn set_text(&self, text: &str) {
        if self.is_shown() {
            eprintln!("⏸ {}", text.replace('\n', " | "));
        }
    }

    fn is_shown(&self) -> bool {
        self.shown.load(Ordering::SeqCst)
    }
}

pub async fn play_cmd(
    cmd: PlayCmd,
    client: DaemonClient,
    config: &Config,
    output: &Output,
) -> ExitCode {
    let client = Arc::new(client);

    // Resolve the display name from the file listing unless given
    let display_name = match cmd.name {
        Some(name) => name,
        None => match client.files(&cmd.info_hash, false).await {
            Ok(files) => files
                .into_iter()
                .find(|f| f.id == cmd.file_id)
                .map(|f| f.name)
                .unwrap_or_else(|| format!("file {}", cmd.file_id)),
            Err(e) => {
                let code = daemon_exit_code(&e);
                return output.error(format!("Listing failed: {}", e), code);
            }
        },
    };

    let timeout = cmd.timeout.unwrap_or(config.buffering_timeout_secs);
    let abort = AbortFlag::new();
    {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort.set();
            }
        });
    }

    let show_overlay = config.show_status_overlay && !cmd.no_overlay;
    let session = StreamSession::new(client, Arc::new(ConsoleOverlay::new()), abort.clone())
        .with_player_binary(config.player_binary.as_str())
        .with_status_overlay(show_overlay);

    output.info(format!("Buffering {}...", display_name));
    let mut sink = BarSink::new(abort.clone());
    let notify = |msg: &str| eprintln!("{}", msg);

    match session
        .buffer_and_play(&cmd.info_hash, cmd.file_id, &display_name, timeout, &mut sink, &notify)
        .await
    {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            if let Some(daemon_err) = e.downcast_ref::<DaemonError>() {
                let code = daemon_exit_code(daemon_err);
                return output.error(format!("Session failed: {}", e), code);
            }
            output.error(format!("Playback failed: {}", e), ExitCode::PlaybackFailed)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_overlay_tracks_visibility() {
        let overlay = ConsoleOverlay::new();
        assert!(!overlay.is_shown());
        overlay.show();
        assert!(overlay.is_shown());
        overlay.hide();
        assert!(!overlay.is_shown());
    }

    #[test]
    fn test_bar_sink_reports_cancellation() {
        let flag = AbortFlag::new();
        let sink = BarSink::new(flag.clone());
        assert!(!sink.is_cancelled());
        flag.set();
        assert!(sink.is_cancelled());
    }

    #[test]
    fn test_daemon_exit_codes() {
        assert_eq!(
            daemon_exit_code(&DaemonError::Remote("nope".into())),
            ExitCode::DaemonRejected
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(
            daemon_exit_code(&DaemonError::TorrentFile(io)),
            ExitCode::InvalidArgs
        );
    }
}
