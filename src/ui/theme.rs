//! Color theme for the swarmplay TUI
//!
//! A restrained deep-sea palette; style helpers keep the screens
//! consistent without sprinkling raw colors through render code.

use ratatui::style::{Color, Modifier, Style};

/// Palette and style helpers
pub struct Theme;

impl Theme {
    /// Background: near-black blue
    pub const BACKGROUND: Color = Color::Rgb(0x10, 0x14, 0x1c);

    /// Primary: sea green
    pub const PRIMARY: Color = Color::Rgb(0x2e, 0xc2, 0x7e);

    /// Accent: pale amber
    pub const ACCENT: Color = Color::Rgb(0xe8, 0xc0, 0x6a);

    /// Text: soft white
    pub const TEXT: Color = Color::Rgb(0xd8, 0xdc, 0xe2);

    /// Dim: muted slate
    pub const DIM: Color = Color::Rgb(0x4a, 0x52, 0x60);

    /// Error: coral red
    pub const ERROR: Color = Color::Rgb(0xe8, 0x5a, 0x5a);

    /// Border: muted sea green
    pub const BORDER: Color = Color::Rgb(0x1e, 0x6e, 0x50);

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(Self::DIM)
    }

    /// Selected list row
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Panel titles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent() -> Style {
        Style::default().fg(Self::ACCENT)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR).add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    /// Key hints in the footer
    pub fn keybind() -> Style {
        Style::default()
            .fg(Self::BACKGROUND)
            .bg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }
}
