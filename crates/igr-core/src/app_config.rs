use std::net::SocketAddr;
use std::path::PathBuf;

use crate::types::MatchMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Entry page of the valuation portal, without the district query.
    pub base_url: String,
    pub headless: bool,
    pub browser_pool_size: usize,
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout_ms: u64,
    pub element_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Pause after a dropdown change while the portal posts back.
    pub postback_settle_ms: u64,
    /// Polls spent waiting for a grid page to change after a pager click.
    pub page_change_retries: u32,
    /// Polls spent waiting for the detail textarea after a row click.
    pub detail_poll_attempts: u32,
    pub max_pages: usize,
    pub match_mode: MatchMode,
    pub translate_admin: bool,
    pub translate_primary_url: Option<String>,
    pub translate_secondary_url: Option<String>,
    pub translate_timeout_secs: u64,
    pub translate_max_retries: u32,
}
