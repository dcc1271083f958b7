//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Utilization at or above this percentage is shown as a warning.
pub const WARNING_PERCENT: f64 = 60.0;

/// Utilization at or above this percentage is shown as critical.
pub const CRITICAL_PERCENT: f64 = 80.0;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Gauge color at or above [`WARNING_PERCENT`].
    pub warning: Color,
    /// Gauge color at or above [`CRITICAL_PERCENT`].
    pub critical: Color,
    /// Gauge color below [`WARNING_PERCENT`].
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for sparklines.
    pub trend: Color,
    /// Style for card titles and overlay headings.
    pub header: Style,
    /// Border style of the focused card.
    pub focused: Style,
    /// Style for "Loading…" and "Not available" placeholders.
    pub placeholder: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            trend: Color::LightBlue,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            focused: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            placeholder: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            trend: Color::Blue,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            focused: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            placeholder: Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Gauge color for a utilization percentage.
    pub fn gauge_color(&self, percent: f64) -> Color {
        if percent >= CRITICAL_PERCENT {
            self.critical
        } else if percent >= WARNING_PERCENT {
            self.warning
        } else {
            self.healthy
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
