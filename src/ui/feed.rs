//! Feed screen rendering
//!
//! Renders the home page with its section tabs and the single-topic feed.
//! Both share the article list, the status line and the key hints.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use super::{colors, notice_line};
use crate::actions::Reaction;
use crate::app::{App, AppState, Section};
use crate::comments::relative_time;
use crate::data::{display_name, Article};

/// Renders the home page or the tag feed, depending on the app state
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(1), // Section tabs or topic name
            Constraint::Min(3),    // Articles
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    render_title(frame, app, chunks[0]);
    render_subheader(frame, app, chunks[1]);
    render_articles(frame, app, chunks[2]);
    if let Some(notice) = &app.notice {
        frame.render_widget(Paragraph::new(notice_line(notice)), chunks[3]);
    }
    render_hints(frame, chunks[4]);
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let (page, pages) = match app.state {
        AppState::Tag(_) => (app.tag_page, app.tag_pages()),
        _ => (app.headlines_page, app.headlines_pages()),
    };
    let separator = "─".repeat((area.width as usize).saturating_sub(2));

    let mut title = vec![
        Span::styled(
            "POCKETFEED",
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            app.now().format("%a %b %d").to_string(),
            Style::default().fg(colors::PRIMARY),
        ),
    ];
    if pages > 0 {
        title.push(Span::raw("  "));
        title.push(Span::styled(
            format!("Page {}/{}", page, pages),
            Style::default().fg(colors::SECONDARY),
        ));
    }

    let lines = vec![
        Line::from(title),
        Line::from(Span::styled(separator, Style::default().fg(colors::MUTED))),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_subheader(frame: &mut Frame, app: &App, area: Rect) {
    match app.state {
        AppState::Tag(tag) => {
            let line = Line::from(vec![
                Span::styled("# ", Style::default().fg(colors::MUTED)),
                Span::styled(
                    display_name(tag),
                    Style::default()
                        .fg(colors::HEADER)
                        .add_modifier(Modifier::BOLD),
                ),
            ]);
            frame.render_widget(Paragraph::new(line), area);
        }
        _ => {
            let titles: Vec<String> = Section::all()
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{} {}", i + 1, s.label()))
                .collect();
            let selected = Section::all()
                .iter()
                .position(|s| *s == app.section)
                .unwrap_or(0);
            let tabs = Tabs::new(titles)
                .select(selected)
                .style(Style::default().fg(colors::SECONDARY))
                .highlight_style(
                    Style::default()
                        .fg(colors::SELECTED)
                        .add_modifier(Modifier::BOLD),
                );
            frame.render_widget(tabs, area);
        }
    }
}

fn render_articles(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(colors::MUTED));

    let for_you = app.state == AppState::Home && app.section == Section::ForYou;
    let error = if for_you {
        app.for_you_error.as_ref()
    } else {
        app.feed_error.as_ref()
    };
    if let Some(message) = error {
        let paragraph = Paragraph::new(Span::styled(
            message.clone(),
            Style::default().fg(colors::ERROR),
        ))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let articles = app.visible_articles();
    if articles.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            "No articles yet. Press r to refresh.",
            Style::default().fg(colors::MUTED),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Two lines per article; scroll so the selection stays visible
    let visible = (area.height.saturating_sub(1) / 2).max(1) as usize;
    let offset = app.selected_index.saturating_sub(visible - 1);

    let mut lines = Vec::new();
    for (i, article) in articles.iter().enumerate().skip(offset).take(visible) {
        lines.extend(article_lines(app, article, i == app.selected_index));
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn article_lines(app: &App, article: &Article, selected: bool) -> [Line<'static>; 2] {
    let id = article.identity();
    let actions = app.engagement.actions();

    let marker = if selected { "▸ " } else { "  " };
    let title_style = if selected {
        Style::default()
            .fg(colors::SELECTED)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors::PRIMARY)
    };

    let mut title = vec![
        Span::styled(marker, Style::default().fg(colors::SELECTED)),
        Span::styled(article.title.clone(), title_style),
    ];
    match actions.reaction(&id) {
        Reaction::Liked => title.push(Span::styled(" ♥", Style::default().fg(colors::LIKED))),
        Reaction::Disliked => {
            title.push(Span::styled(" ✗", Style::default().fg(colors::DISLIKED)))
        }
        Reaction::Neutral => {}
    }
    if actions.is_saved(&id) {
        title.push(Span::styled(" ★", Style::default().fg(colors::SAVED)));
    }

    let mut meta = vec![Span::raw("    ")];
    if let Some(source) = article.source_name() {
        meta.push(Span::styled(
            source.to_string(),
            Style::default().fg(colors::HEADER),
        ));
    }
    if let Some(published) = article.published() {
        meta.push(Span::styled(
            format!("  {}", relative_time(published, app.now())),
            Style::default().fg(colors::MUTED),
        ));
    }
    let comments = app.engagement.comments().comments(&id).len();
    if comments > 0 {
        meta.push(Span::styled(
            format!("  {} comment{}", comments, if comments == 1 { "" } else { "s" }),
            Style::default().fg(colors::SECONDARY),
        ));
    }

    [Line::from(title), Line::from(meta)]
}

fn render_hints(frame: &mut Frame, area: Rect) {
    let hints = [
        ("l", "like"),
        ("d", "dislike"),
        ("s", "save"),
        ("c", "comments"),
        ("S", "share"),
        ("t", "topics"),
        ("D", "dashboard"),
        ("?", "help"),
    ];
    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(
            format!(" {}", key),
            Style::default().fg(colors::SELECTED),
        ));
        spans.push(Span::styled(
            format!(" {} ", label),
            Style::default().fg(colors::MUTED),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
