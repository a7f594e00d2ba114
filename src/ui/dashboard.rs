//! Dashboard screen rendering
//!
//! Shows the overview counters, favourite topics and publications, the
//! reading trend with a monthly sparkline and the latest activity.

use chrono::Datelike;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::widgets::ReadsSparkline;
use super::{colors, notice_line};
use crate::app::App;
use crate::comments::relative_time;
use crate::dashboard::{Dashboard, EngagementStats, Trend};
use crate::data::display_name;

/// Width of a full topic bar
const BAR_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let Some(dashboard) = &app.dashboard else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(4), // Overview
            Constraint::Min(7),    // Topics and publications
            Constraint::Length(5), // Reading trend
            Constraint::Length(7), // Recent activity
            Constraint::Length(1), // Notice / hints
        ])
        .split(area);

    let title = vec![
        Line::from(vec![
            Span::styled(
                "DASHBOARD",
                Style::default()
                    .fg(colors::HEADER)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                app.now().format("%B %Y").to_string(),
                Style::default().fg(colors::PRIMARY),
            ),
        ]),
        Line::from(Span::styled(
            "─".repeat((area.width as usize).saturating_sub(2)),
            Style::default().fg(colors::MUTED),
        )),
    ];
    frame.render_widget(Paragraph::new(title), chunks[0]);

    render_overview(frame, dashboard, chunks[1]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    render_topics(frame, dashboard, columns[0]);
    render_publications(frame, app, dashboard, columns[1]);

    render_engagement(frame, &dashboard.engagement, app, chunks[3]);
    render_recent(frame, app, dashboard, chunks[4]);

    let footer = match &app.notice {
        Some(notice) => notice_line(notice),
        None => Line::from(Span::styled(
            " f friends  h home  t topics  Esc back  q quit",
            Style::default().fg(colors::MUTED),
        )),
    };
    frame.render_widget(Paragraph::new(footer), chunks[5]);
}

fn section_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::TOP)
        .border_style(Style::default().fg(colors::MUTED))
}

fn stat(label: &str, value: impl ToString) -> Vec<Span<'static>> {
    vec![
        Span::styled(
            format!("{:>4} ", value.to_string()),
            Style::default()
                .fg(colors::SELECTED)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{:<14}", label), Style::default().fg(colors::SECONDARY)),
    ]
}

fn render_overview(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let o = &dashboard.overview;
    let lines = vec![
        Line::from(
            [
                stat("Profile views", o.profile_views),
                stat("Likes", o.likes),
                stat("Dislikes", o.dislikes),
                stat("Saves", o.saves),
            ]
            .concat(),
        ),
        Line::from(
            [
                stat("Comments", o.comments),
                stat("Shares", o.shares),
                stat("Collections", o.collections),
                stat("Friends", o.friends),
            ]
            .concat(),
        ),
    ];
    frame.render_widget(Paragraph::new(lines).block(section_block(" Overview ")), area);
}

fn render_topics(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let lines: Vec<Line> = if dashboard.topics.is_empty() {
        vec![Line::from(Span::styled(
            "Like some stories to see your topics",
            Style::default().fg(colors::MUTED),
        ))]
    } else {
        dashboard
            .topics
            .iter()
            .map(|topic| {
                let filled = (topic.percentage as usize * BAR_WIDTH).div_ceil(100);
                Line::from(vec![
                    Span::styled(
                        format!("{:<17}", display_name(topic.tag)),
                        Style::default().fg(colors::PRIMARY),
                    ),
                    Span::styled("█".repeat(filled), Style::default().fg(colors::LIKED)),
                    Span::styled(
                        format!(" {}%", topic.percentage),
                        Style::default().fg(colors::SECONDARY),
                    ),
                ])
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines).block(section_block(" Top topics ")), area);
}

fn render_publications(frame: &mut Frame, app: &App, dashboard: &Dashboard, area: Rect) {
    let mut lines: Vec<Line> = dashboard
        .publications
        .iter()
        .enumerate()
        .map(|(i, (name, count))| {
            Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(colors::MUTED)),
                Span::styled(name.clone(), Style::default().fg(colors::PRIMARY)),
                Span::styled(format!(" ({})", count), Style::default().fg(colors::SECONDARY)),
            ])
        })
        .collect();
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No publications yet",
            Style::default().fg(colors::MUTED),
        )));
    }

    let friends = app.engagement.friends().friends();
    if !friends.is_empty() {
        let ids: Vec<String> = friends.iter().map(u32::to_string).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Friends: ", Style::default().fg(colors::HEADER)),
            Span::styled(ids.join(", "), Style::default().fg(colors::PRIMARY)),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines).block(section_block(" Top publications ")),
        area,
    );
}

fn render_engagement(frame: &mut Frame, stats: &EngagementStats, app: &App, area: Rect) {
    let block = section_block(" Reading ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (arrow, color, direction) = match stats.trend {
        Trend::Up => ("▲", colors::LIKED, "more"),
        Trend::Down => ("▼", colors::DISLIKED, "fewer"),
        Trend::Flat => ("=", colors::SECONDARY, "more"),
    };
    let plural = if stats.avg_diff == 1 { "" } else { "s" };
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} reads this year", stats.year_total),
                Style::default().fg(colors::PRIMARY),
            ),
            Span::styled(
                format!("  {} this month  ", stats.current_month),
                Style::default().fg(colors::SECONDARY),
            ),
            Span::styled(
                format!(
                    "{} {} {} read{} per day than last month",
                    arrow, stats.avg_diff, direction, plural
                ),
                Style::default().fg(color),
            ),
        ]),
        Line::from(Span::styled(
            "J F M A M J J A S O N D",
            Style::default().fg(colors::MUTED),
        )),
    ];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(Paragraph::new(lines[0].clone()), rows[0]);
    frame.render_widget(
        ReadsSparkline::new(&stats.monthly).current(app.now().month0() as usize),
        rows[1],
    );
    frame.render_widget(Paragraph::new(lines[1].clone()), rows[2]);
}

fn render_recent(frame: &mut Frame, app: &App, dashboard: &Dashboard, area: Rect) {
    let now = app.now();
    let lines: Vec<Line> = if dashboard.recent.is_empty() {
        vec![Line::from(Span::styled(
            "No recent activity",
            Style::default().fg(colors::MUTED),
        ))]
    } else {
        dashboard
            .recent
            .iter()
            .map(|event| {
                Line::from(vec![
                    Span::styled(
                        format!("{} ", event.kind.verb()),
                        Style::default().fg(colors::SELECTED),
                    ),
                    Span::styled(event.article_title.clone(), Style::default().fg(colors::PRIMARY)),
                    Span::styled(
                        format!("  {}", relative_time(event.timestamp, now)),
                        Style::default().fg(colors::MUTED),
                    ),
                ])
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(lines).block(section_block(" Recent activity ")),
        area,
    );
}
