//! Configuration management for swarmplay
//!
//! Handles config file loading/saving.
//! Config is stored at ~/.config/swarmplay/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host of the torrent daemon
    pub daemon_host: String,
    /// Port of the torrent daemon
    pub daemon_port: u16,
    /// Buffering session timeout in seconds; 0 disables the timeout
    pub buffering_timeout_secs: u64,
    /// Show the live status overlay while playback is paused
    pub show_status_overlay: bool,
    /// Player binary used for playback
    pub player_binary: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_host: "localhost".to_string(),
            daemon_port: 65220,
            buffering_timeout_secs: 60,
            show_status_overlay: true,
            player_binary: "mpv".to_string(),
        }
    }
}

impl Config {
    /// Get config file path (~/.config/swarmplay/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("swarmplay").join("config.toml"))
    }

    /// Load config from file, or return defaults if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }
}
