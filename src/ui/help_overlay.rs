//! Help overlay showing all keybindings

use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{centered_rect, colors};

/// Renders the help overlay on top of the current view
pub fn render(frame: &mut Frame) {
    let area = centered_rect(56, 26, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        heading("Reading"),
        help_line("↑/k, ↓/j", "Move selection up/down"),
        help_line("Tab, 1-5", "Switch home section"),
        help_line("n / p", "Next / previous page"),
        help_line("Enter", "Open article"),
        Line::from(""),
        heading("Engagement"),
        help_line("l / d / s", "Like / dislike / save"),
        help_line("c", "Comments (Ctrl+R reply, Del delete)"),
        help_line("S", "Share links"),
        help_line("f", "Add or remove a friend by id"),
        Line::from(""),
        heading("Views"),
        help_line("t", "Topic menu"),
        help_line("h", "Home"),
        help_line("D", "Dashboard"),
        help_line("L", "Library (Tab switch list, x remove)"),
        help_line("r", "Refresh feeds"),
        help_line("Esc", "Go back / Close"),
        help_line("q", "Quit application"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(colors::MUTED),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));

    frame.render_widget(
        Paragraph::new(lines).block(block).alignment(Alignment::Left),
        area,
    );
}

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

/// Creates a help line with key and description
fn help_line(key: &str, description: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), Style::default().fg(colors::SELECTED)),
        Span::raw(description.to_string()),
    ])
}
