//! Terminal UI components
//!
//! Built with ratatui. Keyboard-first navigation throughout.

pub mod files;
pub mod theme;
pub mod torrents;
pub mod transfer;

pub use theme::Theme;
