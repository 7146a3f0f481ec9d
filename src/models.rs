//! Data structures and types for swarmplay
//!
//! Contains the wire-level snapshots returned by the torrent daemon plus
//! the shared formatting helpers built on top of them:
//! - **Torrent / TorrentFile**: identity + metadata with optional status
//! - **TorrentStatus / FileStatus**: immutable status snapshots
//! - **TorrentState**: integer state code to human label mapping
//! - Formatting: human-readable sizes and the playback status summary

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Status Snapshots
// =============================================================================

/// Point-in-time status of a torrent, as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentStatus {
    pub active_time: u64,
    pub all_time_download: u64,
    pub all_time_upload: u64,
    pub download_rate: u64,
    pub finished_time: u64,
    pub has_metadata: bool,
    pub paused: bool,
    pub peers: u32,
    pub peers_total: u32,
    pub progress: f64,
    pub seeders: u32,
    pub seeders_total: u32,
    pub seeding_time: u64,
    pub state: i64,
    pub total: u64,
    pub total_done: u64,
    pub total_wanted: u64,
    pub total_wanted_done: u64,
    pub upload_rate: u64,
}

impl TorrentStatus {
    /// Decoded state label for this snapshot
    pub fn state_label(&self) -> TorrentState {
        TorrentState::from_code(self.state)
    }

    /// Whether every byte of the torrent is wanted (a full download)
    pub fn is_full_download(&self) -> bool {
        self.total == self.total_wanted
    }
}

/// Point-in-time status of a single file within a torrent.
///
/// `buffering_progress` tracks the initial buffering window only and is
/// distinct from `progress`, which covers the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStatus {
    pub total: u64,
    pub total_done: u64,
    pub buffering_progress: f64,
    pub priority: u8,
    pub progress: f64,
    pub state: i64,
}

impl FileStatus {
    pub fn state_label(&self) -> TorrentState {
        TorrentState::from_code(self.state)
    }

    /// Priority 0 means the daemon is not fetching this file
    pub fn is_downloading(&self) -> bool {
        self.priority != 0
    }
}

// =============================================================================
// Torrent / File Identity
// =============================================================================

/// A torrent known to the daemon. `status` is omitted when a listing is
/// requested without embedded status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Torrent {
    pub info_hash: String,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub status: Option<TorrentStatus>,
}

impl fmt::Display for Torrent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            Some(s) => write!(f, "{} [{} {:.2}%]", self.name, s.state_label(), s.progress),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A file within a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentFile {
    pub id: u64,
    pub length: u64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub status: Option<FileStatus>,
}

impl TorrentFile {
    /// Classify this file by extension
    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_name(&self.name)
    }
}

impl fmt::Display for TorrentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, sizeof_fmt(self.length as f64))
    }
}

// =============================================================================
// State Codes
// =============================================================================

/// Torrent/file state decoded from the daemon's integer state code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorrentState {
    Queued,
    Checking,
    FindingMetadata,
    Downloading,
    Finished,
    Seeding,
    Allocating,
    CheckingResumeData,
    Paused,
    Buffering,
    Unknown,
}

impl TorrentState {
    /// Map a daemon state code to its label. Codes outside 0..=9 are
    /// reported as `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TorrentState::Queued,
            1 => TorrentState::Checking,
            2 => TorrentState::FindingMetadata,
            3 => TorrentState::Downloading,
            4 => TorrentState::Finished,
            5 => TorrentState::Seeding,
            6 => TorrentState::Allocating,
            7 => TorrentState::CheckingResumeData,
            8 => TorrentState::Paused,
            9 => TorrentState::Buffering,
            _ => TorrentState::Unknown,
        }
    }
}

impl fmt::Display for TorrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TorrentState::Queued => write!(f, "Queued"),
            TorrentState::Checking => write!(f, "Checking"),
            TorrentState::FindingMetadata => write!(f, "Finding metadata"),
            TorrentState::Downloading => write!(f, "Downloading"),
            TorrentState::Finished => write!(f, "Finished"),
            TorrentState::Seeding => write!(f, "Seeding"),
            TorrentState::Allocating => write!(f, "Allocating"),
            TorrentState::CheckingResumeData => write!(f, "Checking resume data"),
            TorrentState::Paused => write!(f, "Paused"),
            TorrentState::Buffering => write!(f, "Buffering"),
            TorrentState::Unknown => write!(f, "Unknown"),
        }
    }
}

// =============================================================================
// Media Kind
// =============================================================================

/// Rough media classification by file extension, used to decide which
/// listed files get a play action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
    Other,
}

const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts", "m2ts", "ogv",
];

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "aac", "m4a", "wma", "opus"];

impl MediaKind {
    /// Classify a file name by its extension (case-insensitive)
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return MediaKind::Other,
        };
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Audio
        } else {
            MediaKind::Other
        }
    }

    /// Whether a local player can be handed this file
    pub fn is_playable(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }
}

// =============================================================================
// Formatting Helpers
// =============================================================================

/// Render a byte count with decimal prefixes and two decimal places:
/// `999.00B`, `1.00kB`, `1.00MB`, ... up to `YB` for anything beyond zetta.
pub fn sizeof_fmt(num: f64) -> String {
    const DIVISOR: f64 = 1000.0;
    let mut num = num;
    for unit in ["", "k", "M", "G", "T", "P", "E", "Z"] {
        if num.abs() < DIVISOR {
            return format!("{:.2}{}B", num, unit);
        }
        num /= DIVISOR;
    }
    format!("{:.2}YB", num)
}

/// Multi-line torrent summary shown in the paused-playback overlay:
/// state and overall progress, transfer rates, seeder and peer counts,
/// and the display name.
pub fn status_summary(status: &TorrentStatus, name: &str) -> String {
    format!(
        "{} ({:.2}%)\nD:{}/s U:{}/s S:{}/{} P:{}/{}\n{}",
        status.state_label(),
        status.progress,
        sizeof_fmt(status.download_rate as f64),
        sizeof_fmt(status.upload_rate as f64),
        status.seeders,
        status.seeders_total,
        status.peers,
        status.peers_total,
        name
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
