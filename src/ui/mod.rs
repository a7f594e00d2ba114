//! UI rendering module for pocketfeed
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod comments;
pub mod dashboard;
pub mod feed;
pub mod help_overlay;
pub mod library;
pub mod overlays;
pub mod widgets;

pub use comments::render as render_comments;
pub use dashboard::render as render_dashboard;
pub use feed::render as render_feed;
pub use help_overlay::render as render_help_overlay;
pub use library::render as render_library;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::engagement::{Notice, NoticeKind};

/// Color palette shared by all screens
pub(crate) mod colors {
    use ratatui::style::Color;

    /// Titles and section headers
    pub const HEADER: Color = Color::Cyan;
    pub const PRIMARY: Color = Color::White;
    /// Secondary/dimmed text
    pub const SECONDARY: Color = Color::Gray;
    pub const MUTED: Color = Color::DarkGray;
    /// Selected row marker and key hints
    pub const SELECTED: Color = Color::Yellow;
    pub const LIKED: Color = Color::Green;
    pub const DISLIKED: Color = Color::Red;
    pub const SAVED: Color = Color::Magenta;
    pub const ERROR: Color = Color::LightRed;
}

/// Status line for the last action's notice
pub(crate) fn notice_line(notice: &Notice) -> Line<'static> {
    let color = match notice.kind {
        NoticeKind::Error => colors::ERROR,
        NoticeKind::Info => colors::SECONDARY,
        kind if kind.is_positive() => colors::LIKED,
        _ => colors::SELECTED,
    };
    Line::from(Span::styled(
        format!(" {}", notice.message),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Rect of `width` x `height` centered in `area`, clipped to it
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width - width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Collects the rendered buffer as one string
#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    buffer.content().iter().map(|cell| cell.symbol()).collect()
}
