//! Curated article feeds
//!
//! Three feeds share one fetch path: cache lookup, throttle, API call, cache
//! write. Headlines are split into the fixed home-page sections, tag feeds
//! search one topic, and the recommended feed searches the topics inferred
//! from the user's liked articles.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::RateLimiter;
use crate::cache::CacheStore;
use crate::data::{
    infer_tags, Article, FeedKind, FetchError, HeadlinesParams, NewsRequest, NewsResponse,
    NewsTransport, SearchParams, TAG_VOCABULARY,
};

/// Articles requested per headlines page
pub const HEADLINES_PAGE_SIZE: u32 = 20;
/// Articles requested per tag page
pub const TAG_PAGE_SIZE: u32 = 9;
/// Articles in the recommended feed
pub const RECOMMENDED_PAGE_SIZE: u32 = 3;
/// Country used for headlines unless configured otherwise
pub const DEFAULT_COUNTRY: &str = "us";
/// Query always included in, and used as fallback for, recommendations
pub const FALLBACK_QUERY: &str = "news";
/// Longest URL-encoded recommendation query sent as-is
pub const MAX_ENCODED_QUERY_LEN: usize = 500;
/// Sort order of recommendation searches
const RELEVANCY: &str = "relevancy";

/// Home-page sections cut from a headlines page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPartitions {
    /// Articles 0..3
    pub recommended: Vec<Article>,
    /// Articles 3..6
    pub popular: Vec<Article>,
    /// Articles 8..14
    pub worthy: Vec<Article>,
    /// Articles 0..12
    pub pocket_hits: Vec<Article>,
}

impl FeedPartitions {
    /// Slices `articles` into sections; short lists yield short sections
    pub fn from_articles(articles: &[Article]) -> Self {
        Self {
            recommended: slice(articles, 0, 3),
            popular: slice(articles, 3, 6),
            worthy: slice(articles, 8, 14),
            pocket_hits: slice(articles, 0, 12),
        }
    }
}

fn slice(articles: &[Article], start: usize, end: usize) -> Vec<Article> {
    let len = articles.len();
    articles[start.min(len)..end.min(len)].to_vec()
}

/// A page of top headlines with its home-page sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headlines {
    pub articles: Vec<Article>,
    pub total_results: u64,
    pub partitions: FeedPartitions,
}

impl Headlines {
    fn from_response(response: NewsResponse) -> Self {
        let partitions = FeedPartitions::from_articles(&response.articles);
        Self {
            articles: response.articles,
            total_results: response.total_results,
            partitions,
        }
    }
}

/// Number of pages needed for `total_results`
pub fn page_count(total_results: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_results.div_ceil(u64::from(page_size))
}

/// Builds the search query for recommendations from inferred tags
///
/// The tags plus "news" are deduplicated, sorted and joined with `OR`. If the
/// URL-encoded result is too long, only the first three tags plus "news" are
/// kept, in their original order.
pub fn recommendation_query(tags: &[&str]) -> String {
    let mut all: BTreeSet<&str> = tags.iter().copied().collect();
    all.insert(FALLBACK_QUERY);
    let query = all.into_iter().collect::<Vec<_>>().join(" OR ");

    if urlencoding::encode(&query).len() <= MAX_ENCODED_QUERY_LEN {
        return query;
    }

    let mut top: Vec<&str> = Vec::new();
    for tag in tags.iter().take(3) {
        if !top.contains(tag) {
            top.push(tag);
        }
    }
    if !top.contains(&FALLBACK_QUERY) {
        top.push(FALLBACK_QUERY);
    }
    top.join(" OR ")
}

/// Fetches the headline, tag and recommended feeds
pub struct NewsFeeds {
    transport: Arc<dyn NewsTransport>,
    cache: CacheStore,
    limiter: Arc<RateLimiter>,
    country: String,
}

impl NewsFeeds {
    pub fn new(
        transport: Arc<dyn NewsTransport>,
        cache: CacheStore,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            transport,
            cache,
            limiter,
            country: DEFAULT_COUNTRY.to_string(),
        }
    }

    /// Use another country for headlines
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Fetches one page of top headlines
    ///
    /// # Returns
    /// * `Ok(Headlines)` - articles with their home-page sections
    /// * `Err(FetchError::NoArticles)` - if the API returned an empty page
    /// * `Err(FetchError)` - if the request failed
    pub async fn headlines(&self, page: u32, query: &str) -> Result<Headlines, FetchError> {
        let request = NewsRequest::TopHeadlines(HeadlinesParams {
            country: self.country.clone(),
            page,
            page_size: HEADLINES_PAGE_SIZE,
            q: query.to_string(),
        });

        let response = self.fetch_non_empty(FeedKind::Headlines, &request).await?;
        Ok(Headlines::from_response(response))
    }

    /// Fetches one page of articles for a topic tag
    pub async fn tagged(&self, tag: &str, page: u32) -> Result<NewsResponse, FetchError> {
        let request = NewsRequest::Everything(SearchParams {
            page,
            page_size: TAG_PAGE_SIZE,
            q: tag.to_string(),
            sort_by: None,
        });

        let mut response = self.fetch_non_empty(FeedKind::Tagged, &request).await?;
        response.articles.truncate(TAG_PAGE_SIZE as usize);
        Ok(response)
    }

    /// Fetches articles matching the topics of `liked` articles
    ///
    /// When the topic search yields too few articles, a plain "news" search
    /// tops the list up; failures of that second search are logged and
    /// ignored.
    pub async fn recommended(
        &self,
        liked: &[Article],
        page: u32,
    ) -> Result<NewsResponse, FetchError> {
        let tags = infer_tags(liked, TAG_VOCABULARY);
        let wanted = RECOMMENDED_PAGE_SIZE as usize;
        let request = NewsRequest::Everything(SearchParams {
            page,
            page_size: RECOMMENDED_PAGE_SIZE,
            q: recommendation_query(&tags),
            sort_by: Some(RELEVANCY.to_string()),
        });

        if let Some(cached) = self.cached(FeedKind::Recommended, &request, wanted) {
            return Ok(cached);
        }

        let primary = self.request(&request).await?;
        let total_results = primary.total_results;
        let mut articles = primary.articles;

        if articles.len() < wanted {
            let fallback = NewsRequest::Everything(SearchParams {
                page: 1,
                page_size: RECOMMENDED_PAGE_SIZE,
                q: FALLBACK_QUERY.to_string(),
                sort_by: Some(RELEVANCY.to_string()),
            });
            match self.request(&fallback).await {
                Ok(extra) => {
                    for article in extra.articles {
                        let id = article.identity();
                        if !articles.iter().any(|a| a.identity() == id) {
                            articles.push(article);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Fallback recommendation search failed"),
            }
        }
        articles.truncate(wanted);

        let response = NewsResponse {
            articles,
            total_results,
        };
        self.store(FeedKind::Recommended, &request, &response);
        Ok(response)
    }

    /// Removes every cached response of all three feeds
    pub fn clear_caches(&self) -> usize {
        [FeedKind::Headlines, FeedKind::Tagged, FeedKind::Recommended]
            .into_iter()
            .map(|kind| match self.cache.clear(kind.namespace()) {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "Failed to clear cache");
                    0
                }
            })
            .sum()
    }

    /// Cache-first fetch that rejects empty pages and only caches non-empty ones
    async fn fetch_non_empty(
        &self,
        kind: FeedKind,
        request: &NewsRequest,
    ) -> Result<NewsResponse, FetchError> {
        if let Some(cached) = self.cached(kind, request, 1) {
            return Ok(cached);
        }

        let response = self.request(request).await?;
        if response.articles.is_empty() {
            return Err(FetchError::NoArticles);
        }
        self.store(kind, request, &response);
        Ok(response)
    }

    /// Cached response holding at least `min_articles` articles
    fn cached(&self, kind: FeedKind, request: &NewsRequest, min_articles: usize) -> Option<NewsResponse> {
        let cached: NewsResponse = self.cache.get(kind.namespace(), request)?;
        if cached.articles.len() < min_articles {
            debug!(found = cached.articles.len(), "Cached page too short, refetching");
            return None;
        }
        Some(cached)
    }

    /// Throttled network call
    ///
    /// A 429 answer adds a cool-down of twice the minimum delay before the
    /// error is returned.
    async fn request(&self, request: &NewsRequest) -> Result<NewsResponse, FetchError> {
        self.limiter.throttle().await;

        match self.transport.fetch(request).await {
            Ok(response) => {
                self.limiter.record_fetch();
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "Article fetch failed");
                if e.is_rate_limited() {
                    self.limiter.cool_down().await;
                }
                Err(e)
            }
        }
    }

    fn store(&self, kind: FeedKind, request: &NewsRequest, response: &NewsResponse) {
        if let Err(e) = self.cache.set(kind.namespace(), request, response) {
            warn!(error = %e, "Failed to cache response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::clock::ManualClock;
    use crate::data::news_api::RATE_LIMIT_MESSAGE;
    use crate::storage::Storage;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Transport answering from a scripted queue and recording requests
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<NewsResponse, FetchError>>>,
        requests: Mutex<Vec<NewsRequest>>,
    }

    impl ScriptedTransport {
        fn reply(self, reply: Result<NewsResponse, FetchError>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        fn requests(&self) -> Vec<NewsRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NewsTransport for ScriptedTransport {
        async fn fetch(&self, request: &NewsRequest) -> Result<NewsResponse, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::NoArticles))
        }
    }

    fn articles(prefix: &str, n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| Article::new(format!("https://{}.example/{}", prefix, i), format!("{} {}", prefix, i)))
            .collect()
    }

    fn page(prefix: &str, n: usize) -> NewsResponse {
        NewsResponse {
            articles: articles(prefix, n),
            total_results: n as u64,
        }
    }

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            reason: "test".to_string(),
        }
    }

    fn feeds_with(transport: ScriptedTransport) -> (NewsFeeds, Arc<ScriptedTransport>, Storage) {
        let transport = Arc::new(transport);
        let storage = Storage::in_memory();
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()));
        let cache = CacheStore::new(storage.clone(), clock, CacheConfig::default());
        let feeds = NewsFeeds::new(transport.clone(), cache, Arc::new(RateLimiter::default()));
        (feeds, transport, storage)
    }

    #[test]
    fn test_partitions_of_twenty_articles() {
        let list = articles("a", 20);
        let parts = FeedPartitions::from_articles(&list);

        assert_eq!(parts.recommended, list[0..3].to_vec());
        assert_eq!(parts.popular, list[3..6].to_vec());
        assert_eq!(parts.worthy, list[8..14].to_vec());
        assert_eq!(parts.pocket_hits, list[0..12].to_vec());
    }

    #[test]
    fn test_partitions_of_short_list() {
        let list = articles("a", 10);
        let parts = FeedPartitions::from_articles(&list);

        assert_eq!(parts.recommended.len(), 3);
        assert_eq!(parts.popular.len(), 3);
        assert_eq!(parts.worthy, list[8..10].to_vec());
        assert_eq!(parts.pocket_hits.len(), 10);

        let tiny = FeedPartitions::from_articles(&articles("b", 2));
        assert_eq!(tiny.recommended.len(), 2);
        assert!(tiny.popular.is_empty());
        assert!(tiny.worthy.is_empty());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(38, 9), 5);
        assert_eq!(page_count(10, 0), 0);
    }

    #[test]
    fn test_recommendation_query_sorted_with_news() {
        assert_eq!(recommendation_query(&[]), "news");
        assert_eq!(
            recommendation_query(&["travel", "business", "travel"]),
            "business OR news OR travel"
        );
    }

    #[test]
    fn test_recommendation_query_trims_when_too_long() {
        let long: Vec<String> = (0..40).map(|i| format!("topic-number-{:02}", i)).collect();
        let tags: Vec<&str> = long.iter().map(String::as_str).collect();

        let query = recommendation_query(&tags);

        assert_eq!(query, "topic-number-00 OR topic-number-01 OR topic-number-02 OR news");
    }

    #[tokio::test(start_paused = true)]
    async fn test_headlines_scenario_fills_sections_and_cache() {
        let (feeds, transport, storage) = feeds_with(ScriptedTransport::default().reply(Ok(page("h", 20))));

        let headlines = feeds.headlines(1, "").await.expect("Should fetch");

        assert_eq!(headlines.articles.len(), 20);
        assert_eq!(headlines.partitions.recommended.len(), 3);
        assert_eq!(headlines.partitions.popular.len(), 3);
        assert_eq!(headlines.partitions.worthy.len(), 6);
        assert_eq!(headlines.partitions.pocket_hits.len(), 12);
        assert_eq!(
            storage.keys_with_prefix("news_"),
            vec![r#"news_{"country":"us","page":1,"pageSize":20,"q":""}"#.to_string()]
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_network_and_throttle() {
        let (feeds, transport, _storage) = feeds_with(ScriptedTransport::default().reply(Ok(page("h", 20))));
        feeds.headlines(1, "").await.unwrap();

        let start = Instant::now();
        let again = feeds.headlines(1, "").await.expect("Should hit cache");

        assert_eq!(again.articles.len(), 20);
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_network_call_is_throttled() {
        let (feeds, transport, _storage) = feeds_with(
            ScriptedTransport::default()
                .reply(Ok(page("h", 20)))
                .reply(Ok(page("h2", 20))),
        );

        let start = Instant::now();
        feeds.headlines(1, "").await.unwrap();
        feeds.headlines(2, "").await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_headlines_are_not_cached() {
        let (feeds, _transport, storage) = feeds_with(ScriptedTransport::default().reply(Ok(page("h", 0))));

        let result = feeds.headlines(1, "").await;

        assert!(matches!(result, Err(FetchError::NoArticles)));
        assert!(storage.keys_with_prefix("news_").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_fetch_cools_down() {
        let (feeds, transport, _storage) = feeds_with(
            ScriptedTransport::default()
                .reply(Err(status(429)))
                .reply(Ok(page("h", 20))),
        );

        let start = Instant::now();
        let error = feeds.headlines(1, "").await.unwrap_err();
        assert_eq!(error.user_message(FeedKind::Headlines), RATE_LIMIT_MESSAGE);

        feeds.headlines(1, "").await.expect("Retry should succeed");

        // The retry could not go out before twice the base delay elapsed
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_not_retried() {
        let (feeds, transport, _storage) = feeds_with(ScriptedTransport::default().reply(Err(status(401))));

        let error = feeds.tagged("travel", 1).await.unwrap_err();

        assert_eq!(error.status(), Some(401));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tagged_uses_search_endpoint_and_truncates() {
        let (feeds, transport, storage) = feeds_with(ScriptedTransport::default().reply(Ok(page("t", 12))));

        let result = feeds.tagged("travel", 2).await.unwrap();

        assert_eq!(result.articles.len(), 9);
        assert_eq!(
            transport.requests(),
            vec![NewsRequest::Everything(SearchParams {
                page: 2,
                page_size: 9,
                q: "travel".to_string(),
                sort_by: None,
            })]
        );
        assert_eq!(storage.keys_with_prefix("tag_").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recommended_queries_liked_topics() {
        let (feeds, transport, _storage) = feeds_with(ScriptedTransport::default().reply(Ok(page("r", 3))));
        let liked = vec![
            Article::new("https://x.example/travel-guide", "Guide"),
            Article::new("https://x.example/1", "Gaming today"),
        ];

        let result = feeds.recommended(&liked, 1).await.unwrap();

        assert_eq!(result.articles.len(), 3);
        assert_eq!(
            transport.requests(),
            vec![NewsRequest::Everything(SearchParams {
                page: 1,
                page_size: 3,
                q: "gaming OR news OR travel".to_string(),
                sort_by: Some("relevancy".to_string()),
            })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recommended_tops_up_from_fallback() {
        let (feeds, transport, storage) = feeds_with(
            ScriptedTransport::default()
                .reply(Ok(page("r", 1)))
                .reply(Ok(page("fallback", 5))),
        );

        let result = feeds.recommended(&[], 4).await.unwrap();

        assert_eq!(result.articles.len(), 3);
        assert_eq!(result.articles[0].url, "https://r.example/0");
        assert_eq!(result.articles[1].url, "https://fallback.example/0");
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].query(), "news");
        assert_eq!(storage.keys_with_prefix("rec_").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recommended_swallows_fallback_failure() {
        let (feeds, _transport, _storage) = feeds_with(
            ScriptedTransport::default()
                .reply(Ok(page("r", 1)))
                .reply(Err(status(500))),
        );

        let result = feeds.recommended(&[], 1).await.unwrap();

        assert_eq!(result.articles.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_cached_recommendations_are_refetched() {
        let (feeds, transport, _storage) = feeds_with(
            ScriptedTransport::default()
                .reply(Ok(page("r", 1)))
                .reply(Err(status(500)))
                .reply(Ok(page("r2", 3))),
        );

        feeds.recommended(&[], 1).await.unwrap();
        let second = feeds.recommended(&[], 1).await.unwrap();

        assert_eq!(second.articles.len(), 3);
        assert_eq!(transport.requests().len(), 3);

        // Now a full page is cached
        feeds.recommended(&[], 1).await.unwrap();
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_caches_empties_all_namespaces() {
        let (feeds, _transport, storage) = feeds_with(
            ScriptedTransport::default()
                .reply(Ok(page("h", 20)))
                .reply(Ok(page("t", 9))),
        );
        feeds.headlines(1, "").await.unwrap();
        feeds.tagged("food", 1).await.unwrap();
        storage.store("savedArticles", &Vec::<Article>::new()).unwrap();

        assert_eq!(feeds.clear_caches(), 2);
        assert!(storage.keys_with_prefix("news_").is_empty());
        assert!(storage.keys_with_prefix("tag_").is_empty());
        assert!(storage.contains("savedArticles"));
    }
}
