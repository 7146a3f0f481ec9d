//! CLI - Command line interface for swarmplay
//!
//! Every TUI action is scriptable: adding torrents, lifecycle actions,
//! status snapshots and the buffer-and-play flow are all subcommands.
//! Output is JSON-parseable with `--json` (default on non-TTY).
//!
//! # Examples
//!
//! ```bash
//! swarmplay add "magnet:?xt=urn:btih:..."
//! swarmplay torrents --json
//! swarmplay play 0123456789abcdef 0
//! swarmplay status 0123456789abcdef --file 0
//! ```

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Could not reach the daemon
    NetworkError = 3,
    /// The daemon rejected the request
    DaemonRejected = 4,
    /// Playback failed to start or crashed
    PlaybackFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// swarmplay - terminal client for a local torrent-streaming daemon
///
/// Run without arguments to launch the interactive TUI.
/// Use subcommands for automation and scripting.
#[derive(Parser, Debug)]
#[command(
    name = "swarmplay",
    version,
    about = "Terminal client for a local torrent-streaming daemon",
    long_about = "Browse, add and stream torrents through a local torrent-streaming \
                  daemon.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  swarmplay                              Launch interactive TUI\n\
                  swarmplay add \"magnet:?xt=...\"          Add a torrent\n\
                  swarmplay torrents --json              List torrents as JSON\n\
                  swarmplay play <info-hash> <file-id>   Buffer a file and play it"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Daemon host (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Daemon port (overrides config)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a torrent by magnet URI or .torrent file path
    #[command(visible_alias = "a")]
    Add(AddCmd),

    /// List torrents known to the daemon
    #[command(visible_alias = "ls")]
    Torrents(TorrentsCmd),

    /// List the files of a torrent
    #[command(visible_alias = "f")]
    Files(FilesCmd),

    /// Pause a torrent
    Pause(TorrentTarget),

    /// Resume a paused torrent
    Resume(TorrentTarget),

    /// Download every file of a torrent
    Download(TorrentTarget),

    /// Stop downloading a torrent
    Stop(TorrentTarget),

    /// Remove a torrent from the daemon
    #[command(visible_alias = "rm")]
    Remove(RemoveCmd),

    /// Status snapshot for a torrent or one of its files
    #[command(visible_alias = "st")]
    Status(StatusCmd),

    /// Start downloading a single file
    FileDownload(FileTarget),

    /// Stop downloading a single file
    FileStop(FileTarget),

    /// Buffer a file, then play it
    #[command(visible_alias = "p")]
    Play(PlayCmd),

    /// Print the daemon's stream URL for a file
    Url(FileTarget),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Add a torrent by magnet URI or local .torrent file
#[derive(Args, Debug)]
pub struct AddCmd {
    /// Magnet URI, or path to a .torrent file
    #[arg(required = true)]
    pub source: String,
}

impl AddCmd {
    /// Whether the source looks like a magnet URI rather than a file path
    pub fn is_magnet(&self) -> bool {
        self.source.starts_with("magnet:")
    }

    pub fn torrent_path(&self) -> PathBuf {
        PathBuf::from(&self.source)
    }
}

/// List torrents
#[derive(Args, Debug)]
pub struct TorrentsCmd {
    /// Skip per-torrent status (faster on large lists)
    #[arg(long)]
    pub no_status: bool,
}

/// List files of a torrent
#[derive(Args, Debug)]
pub struct FilesCmd {
    /// Torrent info-hash
    #[arg(required = true)]
    pub info_hash: String,

    /// Skip per-file status
    #[arg(long)]
    pub no_status: bool,
}

/// A torrent lifecycle action target
#[derive(Args, Debug)]
pub struct TorrentTarget {
    /// Torrent info-hash
    #[arg(required = true)]
    pub info_hash: String,
}

/// Remove a torrent
#[derive(Args, Debug)]
pub struct RemoveCmd {
    /// Torrent info-hash
    #[arg(required = true)]
    pub info_hash: String,

    /// Keep downloaded data on disk
    #[arg(long)]
    pub keep_data: bool,
}

/// Status snapshot
#[derive(Args, Debug)]
pub struct StatusCmd {
    /// Torrent info-hash
    #[arg(required = true)]
    pub info_hash: String,

    /// File id for a file-level snapshot instead of the torrent's
    #[arg(long, short = 'f')]
    pub file: Option<u64>,
}

/// A single-file action target
#[derive(Args, Debug)]
pub struct FileTarget {
    /// Torrent info-hash
    #[arg(required = true)]
    pub info_hash: String,

    /// File id within the torrent
    #[arg(required = true)]
    pub file_id: u64,
}

/// Buffer a file and play it
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Torrent info-hash
    #[arg(required = true)]
    pub info_hash: String,

    /// File id within the torrent
    #[arg(required = true)]
    pub file_id: u64,

    /// Display name shown in the status overlay (defaults to file name)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Buffering timeout in seconds, 0 disables (overrides config)
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,

    /// Disable the paused status overlay
    #[arg(long)]
    pub no_overlay: bool,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// JSON output wrapper with status
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput {
                data: Some(data),
                error: None,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        Ok(())
    }

    /// Print a plain line (text mode only)
    pub fn line(&self, msg: impl std::fmt::Display) {
        if !self.json {
            println!("{}", msg);
        }
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()> {
                data: None,
                error: Some(msg),
            };
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet and JSON modes)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
