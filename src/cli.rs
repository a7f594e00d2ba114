//! Command-line interface parsing for pocketfeed
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into the view the reader opens in.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::data::TAG_VOCABULARY;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified tag is not part of the topic vocabulary
    #[error("Invalid tag: '{0}'. Valid tags: {}", TAG_VOCABULARY.join(", "))]
    InvalidTag(String),
}

/// pocketfeed - read, like and save news from the terminal
#[derive(Parser, Debug)]
#[command(name = "pocketfeed")]
#[command(about = "Terminal news reader with likes, saves and a reading dashboard")]
#[command(version)]
pub struct Cli {
    /// NewsAPI key used for all requests
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Two-letter country code for top headlines
    #[arg(long, value_name = "CC")]
    pub country: Option<String>,

    /// Open directly in the feed of one topic
    ///
    /// Examples:
    ///   pocketfeed --tag travel
    ///   pocketfeed --tag self-improvement
    #[arg(long, value_name = "TAG", conflicts_with = "dashboard")]
    pub tag: Option<String>,

    /// Open directly in the dashboard
    #[arg(long)]
    pub dashboard: bool,

    /// Directory holding the store file and log
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Drop all cached API responses before starting
    #[arg(long)]
    pub clear_cache: bool,

    /// Keep everything in memory for this session only
    #[arg(long)]
    pub ephemeral: bool,
}

/// View shown first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartView {
    #[default]
    Home,
    Tag(&'static str),
    Dashboard,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub view: StartView,
    pub clear_cache: bool,
}

/// Parses a tag argument against the topic vocabulary, ignoring case
pub fn parse_tag_arg(s: &str) -> Result<&'static str, CliError> {
    let wanted = s.trim().to_lowercase();
    TAG_VOCABULARY
        .iter()
        .copied()
        .find(|tag| *tag == wanted)
        .ok_or_else(|| CliError::InvalidTag(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an unknown tag was specified
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let view = match (&cli.tag, cli.dashboard) {
            (Some(tag), _) => StartView::Tag(parse_tag_arg(tag)?),
            (None, true) => StartView::Dashboard,
            (None, false) => StartView::Home,
        };
        Ok(StartupConfig {
            view,
            clear_cache: cli.clear_cache,
        })
    }
}
