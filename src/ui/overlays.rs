//! Small modal overlays: topic menu, friend prompt and share links

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{centered_rect, colors};
use crate::app::App;
use crate::data::{display_name, TAG_VOCABULARY};

fn overlay_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER))
}

/// Renders the topic menu with the highlighted entry
pub fn render_tag_menu(frame: &mut Frame, app: &App) {
    let height = TAG_VOCABULARY.len() as u16 + 4;
    let area = centered_rect(32, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = TAG_VOCABULARY
        .iter()
        .enumerate()
        .map(|(i, tag)| {
            if i == app.tag_menu_index {
                Line::from(Span::styled(
                    format!("▸ {}", display_name(tag)),
                    Style::default()
                        .fg(colors::SELECTED)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(
                    format!("  {}", display_name(tag)),
                    Style::default().fg(colors::PRIMARY),
                ))
            }
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter open  Esc close",
        Style::default().fg(colors::MUTED),
    )));

    frame.render_widget(Paragraph::new(lines).block(overlay_block(" Topics ")), area);
}

/// Renders the prompt for a friend's user id
pub fn render_friend_prompt(frame: &mut Frame, app: &App) {
    let area = centered_rect(40, 5, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(vec![
            Span::styled("User id: ", Style::default().fg(colors::SECONDARY)),
            Span::styled(
                format!("{}▏", app.friend_input),
                Style::default().fg(colors::PRIMARY),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter add/remove  Esc cancel",
            Style::default().fg(colors::MUTED),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block(" Friend ")), area);
}

/// Renders the share links of the selected article
pub fn render_share(frame: &mut Frame, app: &App) {
    let Some(links) = &app.share_links else {
        return;
    };
    let area = centered_rect(76, 12, frame.area());
    frame.render_widget(Clear, area);

    let entry = |label: &'static str, url: &str| {
        Line::from(vec![
            Span::styled(format!("{:<10}", label), Style::default().fg(colors::SELECTED)),
            Span::styled(url.to_string(), Style::default().fg(colors::PRIMARY)),
        ])
    };
    let lines = vec![
        entry("Facebook", &links.facebook),
        entry("LinkedIn", &links.linkedin),
        entry("Email", &links.email),
        entry("Link", &links.link),
        Line::from(""),
        Line::from(Span::styled(
            "Esc close",
            Style::default().fg(colors::MUTED),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(overlay_block(" Share "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
