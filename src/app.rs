//! Application state management for pocketfeed
//!
//! This module contains the main application state, handling keyboard input,
//! feed loading, and state transitions between the different views.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tracing::warn;

use crate::actions::{ActionKind, ActionRecord};
use crate::cli::{StartView, StartupConfig};
use crate::clock::Clock;
use crate::comments::{input_hint, reply_prefix, Comment};
use crate::dashboard::Dashboard;
use crate::data::{Article, FeedKind, FetchError, NewsResponse, TAG_VOCABULARY};
use crate::engagement::{Engagement, Notice};
use crate::fetch::feeds::{page_count, HEADLINES_PAGE_SIZE, TAG_PAGE_SIZE};
use crate::fetch::{Headlines, NewsFeeds};
use crate::share::ShareLinks;

/// Application state enum representing the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching feeds
    Loading,
    /// Home page with the curated sections
    Home,
    /// Feed of a single topic
    Tag(&'static str),
    /// Engagement statistics
    Dashboard,
    /// Saved, liked or disliked articles
    Library(ActionKind),
}

/// Library tabs in display order
pub const LIBRARY_KINDS: [ActionKind; 3] =
    [ActionKind::Save, ActionKind::Like, ActionKind::Dislike];

fn cycle_library(kind: ActionKind, forward: bool) -> ActionKind {
    let n = LIBRARY_KINDS.len();
    let i = LIBRARY_KINDS.iter().position(|k| *k == kind).unwrap_or(0);
    let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
    LIBRARY_KINDS[next]
}

/// Where keystrokes go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Choosing a topic from the tag menu
    TagMenu,
    /// Comments overlay with the input line focused
    Comment,
    /// Typing a user id to add or remove as friend
    Friend,
    /// Share links overlay
    Share,
}

/// Sections of the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    PocketHits,
    Recommended,
    Popular,
    Worthy,
    ForYou,
}

impl Section {
    pub fn all() -> &'static [Section] {
        &[
            Section::PocketHits,
            Section::Recommended,
            Section::Popular,
            Section::Worthy,
            Section::ForYou,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::PocketHits => "Pocket Hits",
            Section::Recommended => "Recommended",
            Section::Popular => "Popular",
            Section::Worthy => "Worthy",
            Section::ForYou => "For You",
        }
    }

    fn index(self) -> usize {
        Section::all().iter().position(|s| *s == self).unwrap_or(0)
    }

    fn next(self) -> Section {
        let all = Section::all();
        all[(self.index() + 1) % all.len()]
    }

    fn previous(self) -> Section {
        let all = Section::all();
        all[(self.index() + all.len() - 1) % all.len()]
    }
}

/// Network work requested by a key press, run by the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Load {
    Home,
    Tag(&'static str),
    /// Recommendations only, after the liked set changed
    Recommended,
    /// Drop caches and reload the current feed
    Refresh,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    pub input_mode: InputMode,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Selected home section
    pub section: Section,
    /// Index of the selected article in the visible list
    pub selected_index: usize,
    /// Latest headlines page
    pub headlines: Option<Headlines>,
    pub headlines_page: u32,
    /// Recommendations from liked topics
    pub for_you: Vec<Article>,
    pub for_you_error: Option<String>,
    /// Likes changed since recommendations were fetched
    for_you_stale: bool,
    pub tag_articles: Vec<Article>,
    pub tag_total: u64,
    pub tag_page: u32,
    /// Highlighted entry of the tag menu
    pub tag_menu_index: usize,
    /// Message shown in place of the current feed
    pub feed_error: Option<String>,
    /// Feedback for the last action
    pub notice: Option<Notice>,
    /// Article whose comments are open
    pub comment_article: Option<Article>,
    pub comment_input: String,
    pub comment_error: Option<String>,
    /// Selected comment in the overlay
    pub comment_index: usize,
    pub friend_input: String,
    pub share_links: Option<ShareLinks>,
    pub dashboard: Option<Dashboard>,
    /// Snapshot of the open library list, newest first
    pub library: Vec<ActionRecord>,
    /// Load to run on the next loop iteration
    pub pending: Option<Load>,
    pub engagement: Engagement,
    /// View to open once the first load finishes
    start_view: StartView,
    feeds: NewsFeeds,
    clock: Arc<dyn Clock>,
}

impl App {
    /// Creates a new App that starts on the home page
    pub fn new(feeds: NewsFeeds, engagement: Engagement, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: AppState::Loading,
            input_mode: InputMode::Normal,
            should_quit: false,
            show_help: false,
            section: Section::PocketHits,
            selected_index: 0,
            headlines: None,
            headlines_page: 1,
            for_you: Vec::new(),
            for_you_error: None,
            for_you_stale: false,
            tag_articles: Vec::new(),
            tag_total: 0,
            tag_page: 1,
            tag_menu_index: 0,
            feed_error: None,
            notice: None,
            comment_article: None,
            comment_input: String::new(),
            comment_error: None,
            comment_index: 0,
            friend_input: String::new(),
            share_links: None,
            dashboard: None,
            library: Vec::new(),
            pending: Some(Load::Home),
            engagement,
            start_view: StartView::Home,
            feeds,
            clock,
        }
    }

    /// Creates a new App that opens the view chosen on the command line
    pub fn with_startup_config(
        config: StartupConfig,
        feeds: NewsFeeds,
        engagement: Engagement,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut app = Self::new(feeds, engagement, clock);
        app.start_view = config.view;
        app.pending = Some(match config.view {
            StartView::Tag(tag) => Load::Tag(tag),
            StartView::Home | StartView::Dashboard => Load::Home,
        });
        app
    }

    /// Articles of the visible list
    pub fn visible_articles(&self) -> &[Article] {
        match self.state {
            AppState::Home => match (self.section, &self.headlines) {
                (Section::ForYou, _) => &self.for_you,
                (_, None) => &[],
                (Section::PocketHits, Some(h)) => &h.partitions.pocket_hits,
                (Section::Recommended, Some(h)) => &h.partitions.recommended,
                (Section::Popular, Some(h)) => &h.partitions.popular,
                (Section::Worthy, Some(h)) => &h.partitions.worthy,
            },
            AppState::Tag(_) => &self.tag_articles,
            AppState::Loading | AppState::Dashboard | AppState::Library(_) => &[],
        }
    }

    pub fn selected_article(&self) -> Option<&Article> {
        match self.state {
            AppState::Library(_) => self.library.get(self.selected_index).map(|r| &r.article),
            _ => self.visible_articles().get(self.selected_index),
        }
    }

    /// Length of the list the selection moves in
    fn list_len(&self) -> usize {
        match self.state {
            AppState::Library(_) => self.library.len(),
            _ => self.visible_articles().len(),
        }
    }

    /// Topic being browsed, attached to likes
    pub fn current_tag(&self) -> Option<&'static str> {
        match self.state {
            AppState::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Comments of the article whose overlay is open
    pub fn open_comments(&self) -> Vec<Comment> {
        self.comment_article
            .as_ref()
            .map(|a| self.engagement.comments().comments(&a.identity()))
            .unwrap_or_default()
    }

    pub fn headlines_pages(&self) -> u64 {
        self.headlines
            .as_ref()
            .map(|h| page_count(h.total_results, HEADLINES_PAGE_SIZE))
            .unwrap_or(0)
    }

    pub fn tag_pages(&self) -> u64 {
        page_count(self.tag_total, TAG_PAGE_SIZE)
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Runs the pending load, if any
    pub async fn process_pending(&mut self) {
        let Some(load) = self.pending.take() else {
            return;
        };

        match load {
            Load::Home => self.load_home().await,
            Load::Tag(tag) => self.load_tag(tag).await,
            Load::Recommended => self.load_recommended().await,
            Load::Refresh => {
                self.feeds.clear_caches();
                match self.state {
                    AppState::Tag(tag) => self.load_tag(tag).await,
                    _ => self.load_home().await,
                }
            }
        }

        if self.state == AppState::Loading {
            self.state = match self.start_view {
                StartView::Tag(tag) => AppState::Tag(tag),
                StartView::Home => AppState::Home,
                StartView::Dashboard => {
                    self.open_dashboard();
                    AppState::Dashboard
                }
            };
            self.start_view = StartView::Home;
        }
    }

    /// Loads headlines and recommendations together
    async fn load_home(&mut self) {
        let liked = self.engagement.actions().articles(ActionKind::Like);
        let (headlines, recommended) = futures::join!(
            self.feeds.headlines(self.headlines_page, ""),
            self.feeds.recommended(&liked, 1)
        );

        match headlines {
            Ok(headlines) => {
                self.headlines = Some(headlines);
                self.feed_error = None;
            }
            Err(e) => {
                self.headlines = None;
                self.feed_error = Some(e.user_message(FeedKind::Headlines));
            }
        }
        self.apply_recommended(recommended);

        if self.state != AppState::Loading {
            self.state = AppState::Home;
        }
        self.clamp_selection();
    }

    /// Refetches the For You list from the current likes
    async fn load_recommended(&mut self) {
        let liked = self.engagement.actions().articles(ActionKind::Like);
        let recommended = self.feeds.recommended(&liked, 1).await;
        self.apply_recommended(recommended);
        self.clamp_selection();
    }

    fn apply_recommended(&mut self, recommended: Result<NewsResponse, FetchError>) {
        self.for_you_stale = false;
        match recommended {
            Ok(response) => {
                self.for_you = response.articles;
                self.for_you_error = None;
            }
            Err(e) => {
                self.for_you.clear();
                self.for_you_error = Some(e.user_message(FeedKind::Recommended));
            }
        }
    }

    async fn load_tag(&mut self, tag: &'static str) {
        match self.feeds.tagged(tag, self.tag_page).await {
            Ok(response) => {
                self.tag_articles = response.articles;
                self.tag_total = response.total_results;
                self.feed_error = None;
            }
            Err(e) => {
                self.tag_articles.clear();
                self.tag_total = 0;
                self.feed_error = Some(e.user_message(FeedKind::Tagged));
            }
        }

        if self.state != AppState::Loading {
            self.state = AppState::Tag(tag);
        }
        self.clamp_selection();
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`: Quit the application
    /// - `Up`/`k`, `Down`/`j`: Move selection
    /// - `Tab`/`Shift+Tab`, `1`-`5`: Switch home section
    /// - `l`/`d`/`s`: Like, dislike, save the selected article
    /// - `c`: Open comments, `S`: Share, `Enter`: Open article
    /// - `n`/`p`: Next/previous page
    /// - `t`: Tag menu, `h`: Home, `D`: Dashboard, `f`: Add or remove friend
    /// - `L`: Library, where `Tab` switches list and `x` removes the entry
    /// - `r`: Refresh, `?`: Help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.input_mode {
            InputMode::Normal => {}
            InputMode::TagMenu => {
                self.handle_tag_menu_key(key_event);
                return;
            }
            InputMode::Comment => {
                self.handle_comment_key(key_event);
                return;
            }
            InputMode::Friend => {
                self.handle_friend_key(key_event);
                return;
            }
            InputMode::Share => {
                if matches!(key_event.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.share_links = None;
                    self.input_mode = InputMode::Normal;
                }
                return;
            }
        }

        if self.state == AppState::Loading {
            // Only quit is allowed during loading
            if key_event.code == KeyCode::Char('q') {
                self.should_quit = true;
            }
            return;
        }

        // Keys shared by every view
        match key_event.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                return;
            }
            KeyCode::Char('t') => {
                self.input_mode = InputMode::TagMenu;
                return;
            }
            KeyCode::Char('D') => {
                self.open_dashboard();
                self.state = AppState::Dashboard;
                return;
            }
            KeyCode::Char('L') => {
                self.open_library(ActionKind::Save);
                return;
            }
            KeyCode::Char('f') => {
                self.friend_input.clear();
                self.input_mode = InputMode::Friend;
                return;
            }
            KeyCode::Char('h') if self.state != AppState::Home => {
                self.go_home();
                return;
            }
            _ => {}
        }

        match self.state {
            AppState::Dashboard => {
                if key_event.code == KeyCode::Esc {
                    self.go_home();
                }
            }
            AppState::Home | AppState::Tag(_) => self.handle_feed_key(key_event),
            AppState::Library(kind) => self.handle_library_key(kind, key_event),
            AppState::Loading => {}
        }
    }

    fn handle_library_key(&mut self, kind: ActionKind, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection_down(),
            KeyCode::Tab => self.open_library(cycle_library(kind, true)),
            KeyCode::BackTab => self.open_library(cycle_library(kind, false)),
            KeyCode::Char('x') | KeyCode::Delete => match kind {
                ActionKind::Like => self.like_selected(),
                ActionKind::Dislike => self.dislike_selected(),
                ActionKind::Save => self.save_selected(),
            },
            KeyCode::Char('l') => self.like_selected(),
            KeyCode::Char('d') => self.dislike_selected(),
            KeyCode::Char('s') => self.save_selected(),
            KeyCode::Char('S') => self.share_selected(),
            KeyCode::Char('c') => self.open_comments_overlay(),
            KeyCode::Enter => self.read_selected(),
            KeyCode::Esc => self.go_home(),
            _ => {}
        }
    }

    fn handle_feed_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection_down(),
            KeyCode::Tab if self.state == AppState::Home => {
                self.section = self.section.next();
                self.selected_index = 0;
            }
            KeyCode::BackTab if self.state == AppState::Home => {
                self.section = self.section.previous();
                self.selected_index = 0;
            }
            KeyCode::Char(c @ '1'..='5') if self.state == AppState::Home => {
                let index = (c as usize) - ('1' as usize);
                self.section = Section::all()[index];
                self.selected_index = 0;
            }
            KeyCode::Char('l') => self.like_selected(),
            KeyCode::Char('d') => self.dislike_selected(),
            KeyCode::Char('s') => self.save_selected(),
            KeyCode::Char('S') => self.share_selected(),
            KeyCode::Char('c') => self.open_comments_overlay(),
            KeyCode::Enter => self.read_selected(),
            KeyCode::Char('n') => self.next_page(),
            KeyCode::Char('p') => self.previous_page(),
            KeyCode::Char('r') => self.pending = Some(Load::Refresh),
            KeyCode::Esc if self.state != AppState::Home => self.go_home(),
            KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_tag_menu_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.tag_menu_index = self
                    .tag_menu_index
                    .checked_sub(1)
                    .unwrap_or(TAG_VOCABULARY.len() - 1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.tag_menu_index = (self.tag_menu_index + 1) % TAG_VOCABULARY.len();
            }
            KeyCode::Enter => {
                let tag = TAG_VOCABULARY[self.tag_menu_index];
                self.input_mode = InputMode::Normal;
                self.tag_page = 1;
                self.selected_index = 0;
                self.state = AppState::Tag(tag);
                self.pending = Some(Load::Tag(tag));
            }
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('t') => {
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    fn handle_comment_key(&mut self, key_event: KeyEvent) {
        let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
        match key_event.code {
            KeyCode::Esc => self.close_comments_overlay(),
            KeyCode::Enter => self.post_comment(),
            KeyCode::Backspace => {
                self.comment_input.pop();
                self.update_comment_hint();
            }
            KeyCode::Up => self.comment_index = self.comment_index.saturating_sub(1),
            KeyCode::Down => {
                let count = self.open_comments().len();
                if self.comment_index + 1 < count {
                    self.comment_index += 1;
                }
            }
            KeyCode::Char('r') if ctrl => {
                if let Some(comment) = self.open_comments().get(self.comment_index) {
                    self.comment_input = reply_prefix(&comment.username);
                }
            }
            KeyCode::Delete => self.delete_selected_comment(),
            KeyCode::Char(c) if !ctrl => {
                self.comment_input.push(c);
                self.update_comment_hint();
            }
            _ => {}
        }
    }

    fn handle_friend_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.friend_input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.friend_input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() && self.friend_input.len() < 9 => {
                self.friend_input.push(c);
            }
            KeyCode::Enter => {
                if let Ok(id) = self.friend_input.parse::<u32>() {
                    self.notice = match self.engagement.toggle_friend(id) {
                        Ok(Some(notice)) => Some(notice),
                        Ok(None) => Some(Notice::info("You cannot add yourself as a friend.")),
                        Err(e) => Some(Notice::error(e.to_string())),
                    };
                    self.refresh_dashboard();
                }
                self.friend_input.clear();
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    fn go_home(&mut self) {
        self.state = AppState::Home;
        self.selected_index = 0;
        self.feed_error = None;
        if self.headlines.is_none() {
            self.pending = Some(Load::Home);
        } else if self.for_you_stale {
            self.pending = Some(Load::Recommended);
        }
    }

    fn open_library(&mut self, kind: ActionKind) {
        self.state = AppState::Library(kind);
        self.selected_index = 0;
        self.refresh_library();
    }

    /// Re-reads the open library list after its set changed
    fn refresh_library(&mut self) {
        if let AppState::Library(kind) = self.state {
            self.library = self
                .engagement
                .actions()
                .records(kind)
                .iter()
                .rev()
                .cloned()
                .collect();
            self.clamp_selection();
        }
    }

    /// Recommendations follow the liked set; refetch now on the home page
    fn likes_changed(&mut self) {
        if self.state == AppState::Home {
            if self.pending.is_none() {
                self.pending = Some(Load::Recommended);
            }
        } else {
            self.for_you_stale = true;
        }
    }

    fn open_dashboard(&mut self) {
        if let Err(e) = self.engagement.view_profile() {
            warn!(error = %e, "Failed to record profile view");
        }
        self.dashboard = Some(Dashboard::build(&self.engagement, self.clock.now()));
    }

    fn refresh_dashboard(&mut self) {
        if self.state == AppState::Dashboard {
            self.dashboard = Some(Dashboard::build(&self.engagement, self.clock.now()));
        }
    }

    fn like_selected(&mut self) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        let tag = self.current_tag();
        let notice = match self.engagement.like(&article, tag) {
            Ok(notice) => {
                self.likes_changed();
                notice
            }
            Err(e) => Notice::error(e.to_string()),
        };
        self.notice = Some(notice);
        self.refresh_library();
    }

    fn dislike_selected(&mut self) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        let notice = match self.engagement.dislike(&article) {
            Ok(notice) => {
                self.likes_changed();
                notice
            }
            Err(e) => Notice::error(e.to_string()),
        };
        self.notice = Some(notice);
        self.refresh_library();
    }

    fn save_selected(&mut self) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        self.notice = Some(
            self.engagement
                .save(&article)
                .unwrap_or_else(|e| Notice::error(e.to_string())),
        );
        self.refresh_library();
    }

    fn share_selected(&mut self) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        match self.engagement.share(&article) {
            Ok(links) => {
                self.share_links = Some(links);
                self.input_mode = InputMode::Share;
            }
            Err(e) => self.notice = Some(Notice::error(e.to_string())),
        }
    }

    fn read_selected(&mut self) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        self.notice = Some(match self.engagement.read(&article) {
            Ok(_) => Notice::info(article.url.clone()),
            Err(e) => Notice::error(e.to_string()),
        });
    }

    fn open_comments_overlay(&mut self) {
        if let Some(article) = self.selected_article().cloned() {
            self.comment_article = Some(article);
            self.comment_input.clear();
            self.comment_error = None;
            self.comment_index = 0;
            self.input_mode = InputMode::Comment;
        }
    }

    fn close_comments_overlay(&mut self) {
        self.comment_article = None;
        self.comment_input.clear();
        self.comment_error = None;
        self.input_mode = InputMode::Normal;
    }

    fn post_comment(&mut self) {
        let Some(article) = self.comment_article.clone() else {
            return;
        };
        match self.engagement.comment(&article, &self.comment_input) {
            Ok(_) => {
                self.comment_input.clear();
                self.comment_error = None;
                self.comment_index = self.open_comments().len().saturating_sub(1);
            }
            Err(e) => self.comment_error = Some(e.to_string()),
        }
    }

    fn delete_selected_comment(&mut self) {
        let Some(article) = self.comment_article.clone() else {
            return;
        };
        let Some(comment) = self.open_comments().get(self.comment_index).cloned() else {
            return;
        };
        if let Err(e) = self.engagement.delete_comment(&article, comment.id) {
            self.comment_error = Some(e.to_string());
            return;
        }
        self.comment_index = self.comment_index.min(self.open_comments().len().saturating_sub(1));
    }

    fn update_comment_hint(&mut self) {
        self.comment_error = input_hint(&self.comment_input).map(str::to_string);
    }

    fn next_page(&mut self) {
        match self.state {
            AppState::Home if u64::from(self.headlines_page) < self.headlines_pages() => {
                self.headlines_page += 1;
                self.selected_index = 0;
                self.pending = Some(Load::Home);
            }
            AppState::Tag(tag) if u64::from(self.tag_page) < self.tag_pages() => {
                self.tag_page += 1;
                self.selected_index = 0;
                self.pending = Some(Load::Tag(tag));
            }
            _ => {}
        }
    }

    fn previous_page(&mut self) {
        match self.state {
            AppState::Home if self.headlines_page > 1 => {
                self.headlines_page -= 1;
                self.selected_index = 0;
                self.pending = Some(Load::Home);
            }
            AppState::Tag(tag) if self.tag_page > 1 => {
                self.tag_page -= 1;
                self.selected_index = 0;
                self.pending = Some(Load::Tag(tag));
            }
            _ => {}
        }
    }

    /// Moves selection up, wrapping to the bottom
    fn move_selection_up(&mut self) {
        let count = self.list_len();
        if count == 0 {
            return;
        }
        self.selected_index = if self.selected_index == 0 {
            count - 1
        } else {
            self.selected_index - 1
        };
    }

    /// Moves selection down, wrapping to the top
    fn move_selection_down(&mut self) {
        let count = self.list_len();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn clamp_selection(&mut self) {
        let count = self.list_len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::actions::Reaction;
    use crate::cache::{CacheConfig, CacheStore};
    use crate::clock::ManualClock;
    use crate::data::{FetchError, NewsRequest, NewsResponse, NewsTransport};
    use crate::fetch::RateLimiter;
    use crate::storage::Storage;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use crossterm::event::KeyEventKind;

    /// Transport answering every request with numbered articles
    pub(crate) struct StubTransport;

    #[async_trait]
    impl NewsTransport for StubTransport {
        async fn fetch(&self, request: &NewsRequest) -> Result<NewsResponse, FetchError> {
            let n = request.page_size() as usize;
            let host = match request.query() {
                "" => "top",
                q => q,
            };
            let articles = (0..n)
                .map(|i| {
                    Article::new(
                        format!("https://{}.example/{}", host, i),
                        format!("Story {}", i),
                    )
                })
                .collect();
            Ok(NewsResponse {
                articles,
                total_results: 45,
            })
        }
    }

    /// Transport that always fails with the given status
    struct FailingTransport(u16);

    #[async_trait]
    impl NewsTransport for FailingTransport {
        async fn fetch(&self, _request: &NewsRequest) -> Result<NewsResponse, FetchError> {
            Err(FetchError::Status {
                status: self.0,
                reason: "test".to_string(),
            })
        }
    }

    pub(crate) fn test_app_with(transport: Arc<dyn NewsTransport>) -> App {
        let storage = Storage::in_memory();
        let clock: Arc<dyn Clock> =
            Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()));
        let cache = CacheStore::new(storage.clone(), clock.clone(), CacheConfig::default());
        let feeds = NewsFeeds::new(transport, cache, Arc::new(RateLimiter::default()));
        App::new(feeds, Engagement::load(storage, clock.clone()), clock)
    }

    pub(crate) fn test_app() -> App {
        test_app_with(Arc::new(StubTransport))
    }

    /// App already showing the home page with loaded headlines
    pub(crate) async fn loaded_app() -> App {
        let mut app = test_app();
        app.process_pending().await;
        app
    }

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::empty(),
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::empty(),
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key_event(KeyCode::Char(c))
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key_event(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let app = test_app();
        assert_eq!(app.state, AppState::Loading);
        assert_eq!(app.pending, Some(Load::Home));
    }

    #[test]
    fn test_keys_ignored_during_loading() {
        let mut app = test_app();

        app.handle_key(key_event(KeyCode::Down));
        app.handle_key(key_event(KeyCode::Char('l')));
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.state, AppState::Loading);

        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_fills_home_sections() {
        let app = loaded_app().await;

        assert_eq!(app.state, AppState::Home);
        assert_eq!(app.visible_articles().len(), 12);
        assert_eq!(app.for_you.len(), 3);
        assert_eq!(app.headlines_pages(), 3);
        assert!(app.pending.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_section_switching() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.section, Section::Recommended);
        assert_eq!(app.visible_articles().len(), 3);

        app.handle_key(key_event(KeyCode::Char('4')));
        assert_eq!(app.section, Section::Worthy);
        assert_eq!(app.visible_articles().len(), 6);

        app.handle_key(key_event(KeyCode::BackTab));
        assert_eq!(app.section, Section::Popular);

        app.handle_key(key_event(KeyCode::Char('5')));
        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.section, Section::PocketHits);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_wraps() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Up));
        assert_eq!(app.selected_index, 11);
        app.handle_key(key_event(KeyCode::Char('j')));
        assert_eq!(app.selected_index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_then_dislike_selected() {
        let mut app = loaded_app().await;
        let id = app.selected_article().unwrap().identity();

        app.handle_key(key_event(KeyCode::Char('l')));
        assert_eq!(app.engagement.actions().reaction(&id), Reaction::Liked);
        assert_eq!(
            app.notice.as_ref().unwrap().message,
            "We'll recommend more stories like this"
        );

        app.handle_key(key_event(KeyCode::Char('d')));
        assert_eq!(app.engagement.actions().reaction(&id), Reaction::Disliked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_in_tag_feed_records_tag() {
        let mut app = loaded_app().await;
        app.handle_key(key_event(KeyCode::Char('t')));
        assert_eq!(app.input_mode, InputMode::TagMenu);
        app.handle_key(key_event(KeyCode::Down));
        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.pending, Some(Load::Tag("career")));

        app.process_pending().await;
        assert_eq!(app.state, AppState::Tag("career"));
        assert_eq!(app.visible_articles().len(), 9);

        app.handle_key(key_event(KeyCode::Char('l')));
        let record = &app.engagement.actions().records(ActionKind::Like)[0];
        assert_eq!(record.tag.as_deref(), Some("career"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tag_paging() {
        let mut app = loaded_app().await;
        app.handle_key(key_event(KeyCode::Char('t')));
        app.handle_key(key_event(KeyCode::Enter));
        app.process_pending().await;
        assert_eq!(app.tag_pages(), 5);

        app.handle_key(key_event(KeyCode::Char('p')));
        assert!(app.pending.is_none());

        app.handle_key(key_event(KeyCode::Char('n')));
        assert_eq!(app.tag_page, 2);
        assert_eq!(app.pending, Some(Load::Tag("business")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_comment_overlay_posts_and_validates() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Char('c')));
        assert_eq!(app.input_mode, InputMode::Comment);

        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.comment_error.as_deref(), Some("Comment cannot be empty."));
        assert!(app.open_comments().is_empty());

        type_text(&mut app, "Good one");
        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.open_comments().len(), 1);
        assert!(app.comment_input.is_empty());

        app.handle_key(ctrl('r'));
        assert_eq!(app.comment_input, "@TEAM15 ");

        app.handle_key(key_event(KeyCode::Delete));
        assert!(app.open_comments().is_empty());

        app.handle_key(key_event(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.comment_article.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_comment_keys_do_not_trigger_actions() {
        let mut app = loaded_app().await;
        app.handle_key(key_event(KeyCode::Char('c')));

        type_text(&mut app, "lqd");

        assert!(!app.should_quit);
        assert_eq!(app.comment_input, "lqd");
        assert_eq!(app.engagement.actions().count(ActionKind::Like), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_friend_input_toggles_friend() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Char('f')));
        type_text(&mut app, "7x");
        assert_eq!(app.friend_input, "7");
        app.handle_key(key_event(KeyCode::Enter));

        assert_eq!(app.engagement.friends().friends(), vec![7]);
        assert_eq!(app.notice.as_ref().unwrap().message, "You have added a new friend!");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_opens_links_overlay() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Char('S')));

        assert_eq!(app.input_mode, InputMode::Share);
        assert!(app.share_links.is_some());
        assert_eq!(app.engagement.counters().shares(), 1);

        app.handle_key(key_event(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.share_links.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_records_read() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Enter));

        assert_eq!(app.engagement.counters().reads().len(), 1);
        assert_eq!(app.notice.as_ref().unwrap().message, "https://top.example/0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_and_back() {
        let mut app = loaded_app().await;
        app.handle_key(key_event(KeyCode::Char('l')));

        app.handle_key(key_event(KeyCode::Char('D')));
        assert_eq!(app.state, AppState::Dashboard);
        let dashboard = app.dashboard.as_ref().unwrap();
        assert_eq!(dashboard.overview.likes, 1);
        assert_eq!(dashboard.overview.profile_views, 1);

        app.handle_key(key_event(KeyCode::Esc));
        assert_eq!(app.state, AppState::Home);
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_in_dashboard() {
        let mut app = test_app();
        app.start_view = StartView::Dashboard;

        app.process_pending().await;

        assert_eq!(app.state, AppState::Dashboard);
        assert!(app.dashboard.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_requests_reload() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Char('r')));
        assert_eq!(app.pending, Some(Load::Refresh));

        app.process_pending().await;
        assert_eq!(app.state, AppState::Home);
        assert_eq!(app.visible_articles().len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_is_shown() {
        let mut app = test_app_with(Arc::new(FailingTransport(401)));

        app.process_pending().await;

        assert_eq!(app.state, AppState::Home);
        assert_eq!(app.feed_error.as_deref(), Some("API key is invalid or expired."));
        assert!(app.visible_articles().is_empty());
        app.handle_key(key_event(KeyCode::Char('l')));
        assert!(app.notice.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_on_home_refetches_recommendations() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Char('l')));
        assert_eq!(app.pending, Some(Load::Recommended));

        let guide = Article::new("https://news.example/travel-guide", "Guide");
        app.engagement.like(&guide, None).unwrap();
        app.process_pending().await;

        assert!(app.pending.is_none());
        assert_eq!(app.state, AppState::Home);
        assert_eq!(app.for_you.len(), 3);
        assert!(app.for_you[0].url.starts_with("https://news OR travel.example/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_elsewhere_refetches_on_return_home() {
        let mut app = loaded_app().await;
        app.handle_key(key_event(KeyCode::Char('t')));
        app.handle_key(key_event(KeyCode::Enter));
        app.process_pending().await;

        app.handle_key(key_event(KeyCode::Char('l')));
        assert!(app.pending.is_none());

        app.handle_key(key_event(KeyCode::Char('h')));
        assert_eq!(app.pending, Some(Load::Recommended));
        app.process_pending().await;
        assert_eq!(app.for_you.len(), 3);

        app.handle_key(key_event(KeyCode::Char('t')));
        app.handle_key(key_event(KeyCode::Esc));
        app.handle_key(key_event(KeyCode::Char('D')));
        app.handle_key(key_event(KeyCode::Char('h')));
        assert!(app.pending.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_library_lists_newest_first() {
        let mut app = loaded_app().await;
        app.handle_key(key_event(KeyCode::Char('s')));
        app.handle_key(key_event(KeyCode::Down));
        app.handle_key(key_event(KeyCode::Char('s')));

        app.handle_key(key_event(KeyCode::Char('L')));

        assert_eq!(app.state, AppState::Library(ActionKind::Save));
        let titles: Vec<&str> = app.library.iter().map(|r| r.article.title.as_str()).collect();
        assert_eq!(titles, vec!["Story 1", "Story 0"]);
        assert_eq!(app.selected_article().unwrap().title, "Story 1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_library_removes_entry_in_place() {
        let mut app = loaded_app().await;
        app.handle_key(key_event(KeyCode::Char('s')));
        app.handle_key(key_event(KeyCode::Down));
        app.handle_key(key_event(KeyCode::Char('s')));
        app.handle_key(key_event(KeyCode::Char('L')));
        app.handle_key(key_event(KeyCode::Down));

        app.handle_key(key_event(KeyCode::Char('x')));

        assert_eq!(app.state, AppState::Library(ActionKind::Save));
        assert_eq!(app.library.len(), 1);
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.selected_article().unwrap().title, "Story 1");
        assert_eq!(app.engagement.actions().count(ActionKind::Save), 1);

        app.handle_key(key_event(KeyCode::Char('x')));
        assert!(app.library.is_empty());
        assert!(app.selected_article().is_none());
        app.handle_key(key_event(KeyCode::Char('x')));
        assert_eq!(app.engagement.actions().count(ActionKind::Save), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_library_tabs_cycle_lists() {
        let mut app = loaded_app().await;
        app.handle_key(key_event(KeyCode::Char('l')));
        app.handle_key(key_event(KeyCode::Char('L')));
        assert!(app.library.is_empty());

        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.state, AppState::Library(ActionKind::Like));
        assert_eq!(app.library.len(), 1);
        assert_eq!(app.library[0].tag.as_deref(), Some("unknown"));

        app.handle_key(key_event(KeyCode::Char('d')));
        assert!(app.library.is_empty());
        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.state, AppState::Library(ActionKind::Dislike));
        assert_eq!(app.library.len(), 1);

        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.state, AppState::Library(ActionKind::Save));
        app.handle_key(key_event(KeyCode::BackTab));
        assert_eq!(app.state, AppState::Library(ActionKind::Dislike));

        app.handle_key(key_event(KeyCode::Esc));
        assert_eq!(app.state, AppState::Home);
    }

    #[tokio::test(start_paused = true)]
    async fn test_help_overlay_intercepts_keys() {
        let mut app = loaded_app().await;

        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_key(key_event(KeyCode::Char('l')));
        assert_eq!(app.engagement.actions().count(ActionKind::Like), 0);

        app.handle_key(key_event(KeyCode::Esc));
        assert!(!app.show_help);
    }
}
