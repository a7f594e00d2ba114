//! Dashboard statistics
//!
//! Everything here is derived from persisted engagement records at the time
//! the dashboard is opened; nothing is stored back.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::actions::ActionKind;
use crate::activity::ActivityEvent;
use crate::data::{infer_tag, Article, TAG_VOCABULARY};
use crate::engagement::Engagement;
use crate::friends::CURRENT_USER_ID;

/// Number of topics listed
pub const TOP_TOPICS: usize = 5;
/// Number of publications listed
pub const TOP_PUBLICATIONS: usize = 3;
/// Number of activity events listed
pub const RECENT_ACTIVITY: usize = 5;

/// Headline counts of the current user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overview {
    pub profile_views: u64,
    pub likes: usize,
    pub dislikes: usize,
    pub saves: usize,
    pub comments: usize,
    pub shares: u64,
    pub collections: u64,
    pub friends: usize,
}

/// Share of likes falling on one topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicShare {
    pub tag: &'static str,
    pub count: usize,
    /// Rounded percentage of all topic-matched likes
    pub percentage: u32,
}

/// Liked topics ordered by count, ties in vocabulary order
pub fn top_topics<'a, I>(liked: I) -> Vec<TopicShare>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut counts = vec![0usize; TAG_VOCABULARY.len()];
    for article in liked {
        if let Some(tag) = infer_tag(article, TAG_VOCABULARY) {
            if let Some(index) = TAG_VOCABULARY.iter().position(|t| *t == tag) {
                counts[index] += 1;
            }
        }
    }

    let total: usize = counts.iter().sum();
    let mut topics: Vec<TopicShare> = TAG_VOCABULARY
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(tag, count)| TopicShare {
            tag: *tag,
            count,
            percentage: rounded_percentage(count, total),
        })
        .collect();
    topics.sort_by(|a, b| b.count.cmp(&a.count));
    topics.truncate(TOP_TOPICS);
    topics
}

/// `part / total` as a percentage rounded half up
fn rounded_percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * part + total) / (2 * total)) as u32
}

/// Most frequent source names, ties in first-seen order
pub fn top_publications<'a, I>(articles: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    for name in articles.into_iter().filter_map(Article::source_name) {
        match counts.iter_mut().find(|(n, _)| n == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_PUBLICATIONS);
    counts
}

/// Direction of reading activity compared with the previous month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Reading statistics for the current year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementStats {
    pub year_total: u64,
    pub current_month: u64,
    /// Reads per calendar month, January first
    pub monthly: [u64; 12],
    /// Whole-number difference in average reads per day against last month
    pub avg_diff: u64,
    pub trend: Trend,
}

/// Computes reading statistics at `now`
///
/// Only reads from the current year count. In January there is no previous
/// month in the year, so the difference is always zero.
pub fn engagement_stats(reads: &[DateTime<Utc>], now: DateTime<Utc>) -> EngagementStats {
    let mut monthly = [0u64; 12];
    for read in reads.iter().filter(|r| r.year() == now.year()) {
        monthly[read.month0() as usize] += 1;
    }

    let month = now.month0() as usize;
    let current_avg = monthly[month] as f64 / days_in_month(now.year(), now.month()) as f64;
    let previous_avg = if month == 0 {
        current_avg
    } else {
        monthly[month - 1] as f64 / days_in_month(now.year(), now.month() - 1) as f64
    };

    let diff = current_avg - previous_avg;
    let trend = if diff > 0.0 {
        Trend::Up
    } else if diff < 0.0 {
        Trend::Down
    } else {
        Trend::Flat
    };

    EngagementStats {
        year_total: monthly.iter().sum(),
        current_month: monthly[month],
        monthly,
        avg_diff: diff.abs().ceil() as u64,
        trend,
    }
}

fn days_in_month(year: i32, month: u32) -> i64 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days(),
        _ => 30,
    }
}

/// Everything shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub overview: Overview,
    pub topics: Vec<TopicShare>,
    pub publications: Vec<(String, usize)>,
    pub engagement: EngagementStats,
    pub recent: Vec<ActivityEvent>,
}

impl Dashboard {
    pub fn build(engagement: &Engagement, now: DateTime<Utc>) -> Self {
        let actions = engagement.actions();
        let counters = engagement.counters();

        let overview = Overview {
            profile_views: counters.profile_views(CURRENT_USER_ID),
            likes: actions.count(ActionKind::Like),
            dislikes: actions.count(ActionKind::Dislike),
            saves: actions.count(ActionKind::Save),
            comments: engagement.comments().all().len(),
            shares: counters.shares(),
            collections: counters.collections(),
            friends: engagement.friends().friends().len(),
        };

        let liked = actions.records(ActionKind::Like).iter().map(|r| &r.article);
        let saved = actions.records(ActionKind::Save).iter().map(|r| &r.article);

        Self {
            overview,
            topics: top_topics(liked.clone()),
            publications: top_publications(liked.chain(saved)),
            engagement: engagement_stats(&counters.reads(), now),
            recent: engagement.activity().latest(RECENT_ACTIVITY),
        }
    }
}
