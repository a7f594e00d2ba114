//! Runtime configuration
//!
//! Settings start from built-in defaults, are overridden by environment
//! variables and finally by command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::cli::Cli;
use crate::data::news_api::NEWS_API_BASE_URL;
use crate::fetch::feeds::DEFAULT_COUNTRY;
use crate::fetch::DEFAULT_MIN_DELAY;
use crate::storage::FileStore;

pub const API_KEY_VAR: &str = "NEWSAPI_KEY";
pub const BASE_URL_VAR: &str = "POCKETFEED_BASE_URL";
pub const COUNTRY_VAR: &str = "POCKETFEED_COUNTRY";
/// Filter directives for the log file
pub const LOG_VAR: &str = "POCKETFEED_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub country: String,
    /// Explicit data directory; the platform default is used when unset
    pub data_dir: Option<PathBuf>,
    /// Keep all state in memory
    pub ephemeral: bool,
    pub cache: CacheConfig,
    pub min_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: NEWS_API_BASE_URL.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            data_dir: None,
            ephemeral: false,
            cache: CacheConfig::default(),
            min_delay: DEFAULT_MIN_DELAY,
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup`; empty values are ignored
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(key) = var(API_KEY_VAR) {
            config.api_key = Some(key);
        }
        if let Some(url) = var(BASE_URL_VAR) {
            config.base_url = url;
        }
        if let Some(country) = var(COUNTRY_VAR) {
            config.country = country.to_lowercase();
        }
        config
    }

    /// Applies command-line overrides
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(key) = cli.api_key.as_ref().filter(|k| !k.is_empty()) {
            self.api_key = Some(key.clone());
        }
        if let Some(country) = &cli.country {
            self.country = country.to_lowercase();
        }
        if let Some(dir) = &cli.data_dir {
            self.data_dir = Some(dir.clone());
        }
        self.ephemeral |= cli.ephemeral;
        self
    }

    /// Directory for the store file and log
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(FileStore::default_dir)
    }

    /// Where the log file goes; ephemeral runs write nothing to disk
    pub fn log_dir(&self) -> Option<PathBuf> {
        if self.ephemeral {
            None
        } else {
            self.resolved_data_dir()
        }
    }
}
