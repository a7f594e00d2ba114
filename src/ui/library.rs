//! Library screen: the saved, liked and disliked lists

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::{colors, notice_line};
use crate::actions::{ActionKind, ActionRecord};
use crate::app::{App, AppState, LIBRARY_KINDS};
use crate::comments::relative_time;

fn tab_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Save => "Saved",
        ActionKind::Like => "Liked",
        ActionKind::Dislike => "Disliked",
    }
}

/// Renders the library list selected by the app state
pub fn render(frame: &mut Frame, app: &App) {
    let AppState::Library(kind) = app.state else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(1), // List tabs
            Constraint::Min(3),    // Entries
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let separator = "─".repeat((chunks[0].width as usize).saturating_sub(2));
    let title = vec![
        Line::from(vec![
            Span::styled(
                "LIBRARY",
                Style::default()
                    .fg(colors::HEADER)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} articles", app.library.len()),
                Style::default().fg(colors::SECONDARY),
            ),
        ]),
        Line::from(Span::styled(separator, Style::default().fg(colors::MUTED))),
    ];
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let selected = LIBRARY_KINDS.iter().position(|k| *k == kind).unwrap_or(0);
    let tabs = Tabs::new(LIBRARY_KINDS.iter().map(|k| tab_label(*k)))
        .select(selected)
        .style(Style::default().fg(colors::SECONDARY))
        .highlight_style(
            Style::default()
                .fg(colors::SELECTED)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, chunks[1]);

    render_entries(frame, app, kind, chunks[2]);
    if let Some(notice) = &app.notice {
        frame.render_widget(Paragraph::new(notice_line(notice)), chunks[3]);
    }

    let hints = Line::from(vec![
        Span::styled(" Tab", Style::default().fg(colors::SELECTED)),
        Span::styled(" switch list ", Style::default().fg(colors::MUTED)),
        Span::styled(" x", Style::default().fg(colors::SELECTED)),
        Span::styled(" remove ", Style::default().fg(colors::MUTED)),
        Span::styled(" Enter", Style::default().fg(colors::SELECTED)),
        Span::styled(" open ", Style::default().fg(colors::MUTED)),
        Span::styled(" Esc", Style::default().fg(colors::SELECTED)),
        Span::styled(" home ", Style::default().fg(colors::MUTED)),
    ]);
    frame.render_widget(Paragraph::new(hints), chunks[4]);
}

fn render_entries(frame: &mut Frame, app: &App, kind: ActionKind, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(colors::MUTED));

    if app.library.is_empty() {
        let message = format!("No {} articles yet.", tab_label(kind).to_lowercase());
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(colors::MUTED))).block(block),
            area,
        );
        return;
    }

    let visible = (area.height.saturating_sub(1) / 2).max(1) as usize;
    let offset = app.selected_index.saturating_sub(visible - 1);

    let mut lines = Vec::new();
    for (i, record) in app.library.iter().enumerate().skip(offset).take(visible) {
        lines.extend(entry_lines(app, record, i == app.selected_index));
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn entry_lines(app: &App, record: &ActionRecord, selected: bool) -> [Line<'static>; 2] {
    let marker = if selected { "▸ " } else { "  " };
    let title_style = if selected {
        Style::default()
            .fg(colors::SELECTED)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors::PRIMARY)
    };
    let title = Line::from(vec![
        Span::styled(marker, Style::default().fg(colors::SELECTED)),
        Span::styled(record.article.title.clone(), title_style),
    ]);

    let mut meta = vec![Span::raw("    ")];
    if let Some(source) = record.article.source_name() {
        meta.push(Span::styled(
            format!("{}  ", source),
            Style::default().fg(colors::HEADER),
        ));
    }
    meta.push(Span::styled(
        format!(
            "{} ({})",
            relative_time(record.action_timestamp, app.now()),
            record.action_timestamp.format("%b %d, %Y")
        ),
        Style::default().fg(colors::MUTED),
    ));

    [title, Line::from(meta)]
}
