//! Comments overlay
//!
//! Lists the comments of one article above an input line. The selected
//! comment is the target of reply and delete.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{centered_rect, colors};
use crate::app::App;
use crate::comments::{relative_time, MAX_COMMENT_CHARS};

/// Renders the comments overlay for the article in `app.comment_article`
pub fn render(frame: &mut Frame, app: &App) {
    let Some(article) = &app.comment_article else {
        return;
    };
    let area = centered_rect(70, 20, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Comments ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Article title
            Constraint::Min(3),    // Comments
            Constraint::Length(1), // Validation message
            Constraint::Length(3), // Input
            Constraint::Length(1), // Key hints
        ])
        .split(inner);

    let title = Paragraph::new(Span::styled(
        article.title.clone(),
        Style::default()
            .fg(colors::PRIMARY)
            .add_modifier(Modifier::BOLD),
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(title, chunks[0]);

    let comments = app.open_comments();
    let now = app.now();
    let lines: Vec<Line> = if comments.is_empty() {
        vec![Line::from(Span::styled(
            "No comments yet. Be the first!",
            Style::default().fg(colors::MUTED),
        ))]
    } else {
        comments
            .iter()
            .enumerate()
            .map(|(i, comment)| {
                let selected = i == app.comment_index;
                Line::from(vec![
                    Span::styled(
                        if selected { "▸ " } else { "  " },
                        Style::default().fg(colors::SELECTED),
                    ),
                    Span::styled(
                        comment.username.clone(),
                        Style::default()
                            .fg(colors::HEADER)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {}  ", relative_time(comment.timestamp, now)),
                        Style::default().fg(colors::MUTED),
                    ),
                    Span::styled(comment.text.clone(), Style::default().fg(colors::PRIMARY)),
                ])
            })
            .collect()
    };
    let scroll = app.comment_index.saturating_sub(chunks[1].height.saturating_sub(1) as usize);
    frame.render_widget(
        Paragraph::new(lines).scroll((scroll as u16, 0)),
        chunks[1],
    );

    if let Some(error) = &app.comment_error {
        frame.render_widget(
            Paragraph::new(Span::styled(
                error.clone(),
                Style::default().fg(colors::ERROR),
            )),
            chunks[2],
        );
    }

    let count = app.comment_input.trim().chars().count();
    let input = Paragraph::new(format!("{}▏", app.comment_input))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {}/{} ", count, MAX_COMMENT_CHARS))
                .border_style(Style::default().fg(colors::SECONDARY)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(input, chunks[3]);

    frame.render_widget(
        Paragraph::new(Span::styled(
            " Enter post  ↑/↓ select  Ctrl+R reply  Del delete  Esc close",
            Style::default().fg(colors::MUTED),
        )),
        chunks[4],
    );
}
