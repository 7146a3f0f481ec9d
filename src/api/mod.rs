//! API client for the torrent daemon
//!
//! Everything the app knows about torrents comes through this HTTP
//! surface; swarmplay itself carries no torrent engine.

pub mod daemon;

pub use daemon::{DaemonClient, DaemonError};
