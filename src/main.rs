//! pocketfeed - read news from the terminal
//!
//! A terminal UI application that shows curated news feeds, lets the reader
//! like, save, comment and share articles, and summarizes reading habits on
//! a dashboard.

use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pocketfeed::app::{App, AppState, InputMode};
use pocketfeed::cache::CacheStore;
use pocketfeed::cli::{Cli, StartupConfig};
use pocketfeed::clock::{Clock, SystemClock};
use pocketfeed::config::{Config, LOG_VAR};
use pocketfeed::data::NewsApiClient;
use pocketfeed::engagement::Engagement;
use pocketfeed::fetch::{NewsFeeds, RateLimiter};
use pocketfeed::storage::{FileStore, Storage};
use pocketfeed::ui;

/// Log file written inside the data directory
const LOG_FILE: &str = "pocketfeed.log";

/// Sets up a panic hook that restores the terminal before printing the panic message.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Sends tracing output to the log file; the terminal belongs to the UI
fn init_logging(data_dir: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_VAR)
        .unwrap_or_else(|_| EnvFilter::new("pocketfeed=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match data_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))?;
            let _ = builder.with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(io::sink).try_init();
        }
    }
    Ok(())
}

fn open_storage(config: &Config) -> Result<Storage, Box<dyn std::error::Error>> {
    if config.ephemeral {
        return Ok(Storage::in_memory());
    }
    let store = match &config.data_dir {
        Some(dir) => FileStore::open(dir)?,
        None => FileStore::open_default()?,
    };
    info!(dir = %store.data_dir().display(), "Using file store");
    Ok(Storage::new(store))
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match app.state {
        AppState::Loading => render_loading(frame),
        AppState::Home | AppState::Tag(_) => ui::render_feed(frame, app),
        AppState::Dashboard => ui::render_dashboard(frame, app),
        AppState::Library(_) => ui::render_library(frame, app),
    }

    match app.input_mode {
        InputMode::Normal => {}
        InputMode::TagMenu => ui::overlays::render_tag_menu(frame, app),
        InputMode::Comment => ui::render_comments(frame, app),
        InputMode::Friend => ui::overlays::render_friend_prompt(frame, app),
        InputMode::Share => ui::overlays::render_share(frame, app),
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Renders a loading message while feeds are being fetched
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    let loading_text = Paragraph::new("Loading stories...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Reject bad arguments before the terminal is taken over
    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let config = Config::from_env().with_cli(&cli);
    init_logging(config.log_dir().as_deref())?;
    if config.api_key.is_none() {
        warn!("No API key configured, requests will be rejected");
    }

    let storage = open_storage(&config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let client = NewsApiClient::new(config.api_key.clone()).with_base_url(config.base_url.clone());
    let cache = CacheStore::new(storage.clone(), clock.clone(), config.cache);
    let feeds = NewsFeeds::new(
        Arc::new(client),
        cache,
        Arc::new(RateLimiter::new(config.min_delay)),
    )
    .with_country(config.country.clone());

    if startup.clear_cache {
        let removed = feeds.clear_caches();
        info!(removed, "Cleared cached responses");
    }

    let engagement = Engagement::load(storage, clock.clone());
    let mut app = App::with_startup_config(startup, feeds, engagement, clock);

    setup_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|f| render_ui(f, &app))?;

        if app.pending.is_some() {
            app.process_pending().await;
            continue;
        }

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    info!("Exiting");

    Ok(())
}
