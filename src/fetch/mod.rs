//! Rate-limited, cached article fetching
//!
//! Combines the response cache, a minimum-interval throttle and the news API
//! transport into the feeds shown by the reader.

pub mod feeds;
mod rate_limit;

pub use feeds::{FeedPartitions, Headlines, NewsFeeds};
pub use rate_limit::{RateLimiter, DEFAULT_MIN_DELAY};
