//! Names of persisted keys
//!
//! Cache namespaces are prefixes; the remaining keys are fixed or suffixed
//! with an article or user id.

/// Cache namespace for headline responses
pub const NEWS_CACHE_PREFIX: &str = "news_";
/// Cache namespace for tag feed responses
pub const TAG_CACHE_PREFIX: &str = "tag_";
/// Cache namespace for recommended feed responses
pub const RECOMMENDED_CACHE_PREFIX: &str = "rec_";

pub const LIKED_ARTICLES: &str = "likedArticles";
pub const DISLIKED_ARTICLES: &str = "dislikedArticles";
pub const SAVED_ARTICLES: &str = "savedArticles";

pub const ALL_COMMENTS: &str = "allComments";
pub const RECENT_ACTIONS: &str = "recentActions";

pub const SHARES_COUNT: &str = "sharesCount";
pub const COLLECTIONS_COUNT: &str = "collectionsCount";
pub const ARTICLE_READS: &str = "articleReads";

/// Key holding the comments of one article
pub fn comments(article_id: &str) -> String {
    format!("comments_{}", article_id)
}

/// Key holding the profile view counter of one user
pub fn profile_views(user_id: u32) -> String {
    format!("profileViewsCount_{}", user_id)
}

/// Key holding the friend list of one user
pub fn friends_list(user_id: u32) -> String {
    format!("friendsList_{}", user_id)
}
