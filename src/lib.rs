//! swarmplay - terminal client for a local torrent-streaming daemon
//!
//! Browse, add and stream torrents through a daemon reachable over HTTP.
//! swarmplay carries no torrent engine of its own; it is a navigation
//! layer, a polling REST client and a thin wrapper around an external
//! media player.
//!
//! # Modules
//!
//! - `models` - Wire snapshots and formatting helpers
//! - `api` - Daemon HTTP client
//! - `stream` - Buffering, playback supervision, status overlay
//! - `config` - TOML configuration
//! - `cli` / `commands` - Scriptable command surface
//! - `app` / `ui` - Interactive TUI

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod stream;
pub mod ui;

// Re-export commonly used types
pub use api::{DaemonClient, DaemonError};
pub use config::Config;
pub use models::{
    sizeof_fmt, status_summary, FileStatus, MediaKind, Torrent, TorrentFile, TorrentState,
    TorrentStatus,
};
pub use stream::{
    AbortFlag, BufferingMonitor, BufferingOutcome, Overlay, OverlayController, PlaybackSupervisor,
    Player, PlayerError, PlayerEvents, ProgressSink, RateEstimator, StatusText, StreamSession,
    TextOverlay,
};
